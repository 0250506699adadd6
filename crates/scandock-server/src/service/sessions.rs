//! In-memory scan session registry.
//!
//! Multi-page scans accumulate here between the first page and the final
//! assemble step. Sessions are process-local: a restart forgets them, and the
//! scratch files they left behind are removed by the next expiry sweep.

use std::path::PathBuf;
use std::sync::Arc;

use dashmap::DashMap;
use jiff::{SignedDuration, Timestamp};
use scandock_core::document::Page;
use scandock_core::scan::{ScanOptions, ScannedImage};
use scandock_core::{Error, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString, IntoStaticStr};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::service::SessionConfig;

/// Tracing target for session lifecycle events.
const TRACING_TARGET: &str = "scandock_server::service::sessions";

/// Lifecycle state of a scan session.
///
/// A closed session is represented by absence from the store; lookups of a
/// closed id report not-found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[derive(AsRefStr, Display, EnumString, IntoStaticStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SessionStatus {
    /// Accepting page scans.
    Active,
    /// Being assembled into a document; no further mutation accepted.
    Finalizing,
}

/// A multi-page scan session and its accumulated pages.
#[derive(Debug, Clone)]
pub struct ScanSession {
    /// Unique session identifier.
    pub session_id: Uuid,
    /// Current lifecycle state.
    pub status: SessionStatus,
    /// Scan options applied to every page in this session.
    pub options: ScanOptions,
    /// Pages in exact append order.
    pub pages: Vec<Page>,
    /// When the session was opened.
    pub created_at: Timestamp,
    /// Last time a request touched this session.
    pub last_activity: Timestamp,
}

impl ScanSession {
    fn new(options: ScanOptions) -> Self {
        let now = Timestamp::now();
        Self {
            session_id: Uuid::now_v7(),
            status: SessionStatus::Active,
            options,
            pages: Vec::new(),
            created_at: now,
            last_activity: now,
        }
    }
}

/// Concurrency-safe registry of in-flight scan sessions.
///
/// Sessions live behind a sharded map with a per-session mutex: operations on
/// different sessions never contend, while appends and finalization on the
/// same session serialize. Lock discipline: the `Arc` is cloned out of the
/// map guard and locked afterwards, so no map shard stays locked across an
/// await point.
#[derive(Debug, Clone)]
pub struct SessionStore {
    sessions: Arc<DashMap<Uuid, Arc<Mutex<ScanSession>>>>,
    scratch_root: PathBuf,
    config: SessionConfig,
}

impl SessionStore {
    /// Creates an empty store writing page files under `scratch_root`.
    pub fn new(config: SessionConfig, scratch_root: PathBuf) -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
            scratch_root,
            config,
        }
    }

    fn entry(&self, session_id: Uuid) -> Result<Arc<Mutex<ScanSession>>> {
        self.sessions
            .get(&session_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(Error::session_not_found)
    }

    /// Directory holding this session's page files.
    pub fn session_dir(&self, session_id: Uuid) -> PathBuf {
        self.scratch_root.join(session_id.to_string())
    }

    /// Opens a new session and creates its scratch directory.
    pub async fn create(&self, options: ScanOptions) -> Result<ScanSession> {
        let session = ScanSession::new(options);
        let session_id = session.session_id;

        tokio::fs::create_dir_all(self.session_dir(session_id))
            .await
            .map_err(|e| {
                Error::io()
                    .with_message("failed to create session scratch directory")
                    .with_source(e)
            })?;

        let snapshot = session.clone();
        self.sessions
            .insert(session_id, Arc::new(Mutex::new(session)));
        tracing::debug!(target: TRACING_TARGET, session_id = %session_id, "session opened");
        Ok(snapshot)
    }

    /// Returns a point-in-time copy of the session.
    pub async fn snapshot(&self, session_id: Uuid) -> Result<ScanSession> {
        let entry = self.entry(session_id)?;
        let session = entry.lock().await;
        Ok(session.clone())
    }

    /// Writes a scanned image into the session and assigns its page number.
    ///
    /// The file write happens under the session lock, which is what makes
    /// page numbers unique and consecutive under concurrent appends. Returns
    /// the new page's number together with the session's page count.
    pub async fn append_scanned(
        &self,
        session_id: Uuid,
        image: ScannedImage,
    ) -> Result<(u32, u32)> {
        let entry = self.entry(session_id)?;
        let mut session = entry.lock().await;

        if session.status != SessionStatus::Active {
            return Err(Error::session_closed());
        }
        if session.pages.len() as u32 >= self.config.max_pages {
            return Err(Error::invalid_input().with_message(format!(
                "session page limit of {} reached",
                self.config.max_pages
            )));
        }

        let number = session.pages.len() as u32 + 1;
        let path = self
            .session_dir(session_id)
            .join(format!("page-{number:03}.{}", image.format.extension()));

        tokio::fs::write(&path, &image.bytes).await.map_err(|e| {
            Error::io()
                .with_message("failed to write page file")
                .with_source(e)
        })?;

        session.pages.push(Page {
            number,
            path,
            byte_len: image.bytes.len() as u64,
            format: image.format,
        });
        session.last_activity = Timestamp::now();

        let total = session.pages.len() as u32;
        tracing::debug!(
            target: TRACING_TARGET,
            session_id = %session_id,
            page_number = number,
            "page appended"
        );
        Ok((number, total))
    }

    /// Flips the session to `finalizing` and returns its page snapshot.
    ///
    /// The caller owns the outcome: [`complete_finalize`] removes the entry
    /// on success, [`abort_finalize`] reverts it on failure. A session that
    /// is already finalizing reports `session_closed`.
    ///
    /// [`complete_finalize`]: Self::complete_finalize
    /// [`abort_finalize`]: Self::abort_finalize
    pub async fn begin_finalize(&self, session_id: Uuid) -> Result<ScanSession> {
        let entry = self.entry(session_id)?;
        let mut session = entry.lock().await;

        if session.status != SessionStatus::Active {
            return Err(Error::session_closed());
        }
        session.status = SessionStatus::Finalizing;
        session.last_activity = Timestamp::now();
        Ok(session.clone())
    }

    /// Reverts a failed finalize back to `active` with pages intact.
    pub async fn abort_finalize(&self, session_id: Uuid) {
        if let Ok(entry) = self.entry(session_id) {
            let mut session = entry.lock().await;
            if session.status == SessionStatus::Finalizing {
                session.status = SessionStatus::Active;
                session.last_activity = Timestamp::now();
            }
        }
    }

    /// Removes a successfully finalized session and its scratch directory.
    pub async fn complete_finalize(&self, session_id: Uuid) {
        self.sessions.remove(&session_id);
        self.remove_scratch(session_id).await;
        tracing::debug!(target: TRACING_TARGET, session_id = %session_id, "session finalized");
    }

    /// Cancels a session, removing it together with its page files.
    ///
    /// Returns the discarded session for reporting. A session that is
    /// mid-finalize cannot be cancelled.
    pub async fn close(&self, session_id: Uuid) -> Result<ScanSession> {
        let entry = self.entry(session_id)?;
        let snapshot = {
            let mut session = entry.lock().await;
            if session.status != SessionStatus::Active {
                return Err(Error::session_closed());
            }
            // Claim the session so a racing append fails instead of writing
            // into a directory about to be deleted.
            session.status = SessionStatus::Finalizing;
            session.clone()
        };

        self.sessions.remove(&session_id);
        self.remove_scratch(session_id).await;
        tracing::debug!(
            target: TRACING_TARGET,
            session_id = %session_id,
            pages = snapshot.pages.len(),
            "session cancelled"
        );
        Ok(snapshot)
    }

    async fn remove_scratch(&self, session_id: Uuid) {
        let dir = self.session_dir(session_id);
        if let Err(error) = tokio::fs::remove_dir_all(&dir).await
            && error.kind() != std::io::ErrorKind::NotFound
        {
            tracing::warn!(
                target: TRACING_TARGET,
                session_id = %session_id,
                error = %error,
                "failed to remove session scratch directory"
            );
        }
    }

    /// Removes sessions idle longer than the configured timeout.
    ///
    /// Sessions whose mutex is currently held, or that are mid-finalize, are
    /// skipped and picked up by a later sweep. Returns the number of
    /// sessions expired.
    pub async fn expire_idle(&self) -> usize {
        let idle_limit = SignedDuration::from_secs(self.config.idle_timeout as i64);
        let now = Timestamp::now();

        let mut candidates = Vec::new();
        for entry in self.sessions.iter() {
            let Ok(session) = entry.value().try_lock() else {
                continue;
            };
            if session.status == SessionStatus::Active
                && now.duration_since(session.last_activity) >= idle_limit
            {
                candidates.push(*entry.key());
            }
        }

        let mut removed = 0;
        for session_id in candidates {
            let Some(entry) = self.sessions.get(&session_id).map(|e| e.value().clone()) else {
                continue;
            };
            {
                // Re-check under the lock in case activity arrived after the
                // scan pass.
                let Ok(mut session) = entry.try_lock() else {
                    continue;
                };
                if session.status != SessionStatus::Active
                    || now.duration_since(session.last_activity) < idle_limit
                {
                    continue;
                }
                session.status = SessionStatus::Finalizing;
            }
            self.sessions.remove(&session_id);
            self.remove_scratch(session_id).await;
            removed += 1;
        }

        if removed > 0 {
            tracing::info!(
                target: TRACING_TARGET,
                expired = removed,
                "expired idle scan sessions"
            );
        }
        removed
    }

    /// Removes scratch entries with no backing session.
    ///
    /// Orphans appear when the process dies between creating a scratch
    /// directory and cleaning it up. Entries younger than the idle timeout
    /// are left alone, which protects in-flight work that lives outside the
    /// session table. Returns the number of entries removed.
    pub async fn sweep_orphans(&self) -> usize {
        let idle_limit = self.config.idle_timeout();
        let now = std::time::SystemTime::now();

        let mut dir = match tokio::fs::read_dir(&self.scratch_root).await {
            Ok(dir) => dir,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return 0,
            Err(error) => {
                tracing::warn!(
                    target: TRACING_TARGET,
                    error = %error,
                    "failed to read scratch root"
                );
                return 0;
            }
        };

        let mut removed = 0;
        while let Ok(Some(entry)) = dir.next_entry().await {
            if let Some(session_id) = entry.file_name().to_str().and_then(|s| s.parse().ok())
                && self.sessions.contains_key(&session_id)
            {
                continue;
            }

            let modified = entry.metadata().await.ok().and_then(|m| m.modified().ok());
            let Some(age) = modified.and_then(|m| now.duration_since(m).ok()) else {
                continue;
            };
            if age < idle_limit {
                continue;
            }

            let path = entry.path();
            let result = match entry.file_type().await {
                Ok(kind) if kind.is_dir() => tokio::fs::remove_dir_all(&path).await,
                Ok(_) => tokio::fs::remove_file(&path).await,
                Err(_) => continue,
            };
            match result {
                Ok(()) => removed += 1,
                Err(error) if error.kind() == std::io::ErrorKind::NotFound => {}
                Err(error) => {
                    tracing::warn!(
                        target: TRACING_TARGET,
                        path = %path.display(),
                        error = %error,
                        "failed to remove orphaned scratch entry"
                    );
                }
            }
        }

        if removed > 0 {
            tracing::info!(
                target: TRACING_TARGET,
                removed,
                "removed orphaned scratch entries"
            );
        }
        removed
    }

    /// Spawns the periodic expiry sweep as a background task.
    pub fn spawn_sweeper(&self) -> tokio::task::JoinHandle<()> {
        let store = self.clone();
        let period = self.config.sweep_interval();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                store.expire_idle().await;
                store.sweep_orphans().await;
            }
        })
    }

    /// Number of sessions currently tracked.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether any sessions are tracked.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use scandock_core::ErrorKind;
    use scandock_core::document::PageFormat;

    use super::*;

    fn store(dir: &std::path::Path, config: SessionConfig) -> SessionStore {
        SessionStore::new(config, dir.to_path_buf())
    }

    fn jpeg_image(marker: u8) -> ScannedImage {
        ScannedImage {
            bytes: Bytes::from(vec![0xFF, 0xD8, 0xFF, 0xDB, marker]),
            format: PageFormat::Jpeg,
        }
    }

    #[tokio::test]
    async fn create_and_snapshot() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let store = store(dir.path(), SessionConfig::default());

        let session = store.create(ScanOptions::default()).await?;
        assert_eq!(session.status, SessionStatus::Active);
        assert!(session.pages.is_empty());
        assert!(store.session_dir(session.session_id).is_dir());

        let snapshot = store.snapshot(session.session_id).await?;
        assert_eq!(snapshot.session_id, session.session_id);
        Ok(())
    }

    #[tokio::test]
    async fn appends_preserve_order() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let store = store(dir.path(), SessionConfig::default());
        let session = store.create(ScanOptions::default()).await?;

        for marker in 0..3 {
            let (number, total) = store
                .append_scanned(session.session_id, jpeg_image(marker))
                .await?;
            assert_eq!(number, u32::from(marker) + 1);
            assert_eq!(total, number);
        }

        let snapshot = store.snapshot(session.session_id).await?;
        let numbers: Vec<u32> = snapshot.pages.iter().map(|p| p.number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert!(snapshot.pages[0].path.ends_with("page-001.jpg"));
        assert!(snapshot.pages[2].path.ends_with("page-003.jpg"));
        for page in &snapshot.pages {
            assert!(page.path.is_file());
        }
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn concurrent_appends_get_unique_consecutive_numbers() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let store = store(dir.path(), SessionConfig::default());
        let session = store.create(ScanOptions::default()).await?;

        let mut handles = Vec::new();
        for marker in 0..10u8 {
            let store = store.clone();
            let session_id = session.session_id;
            handles.push(tokio::spawn(async move {
                store.append_scanned(session_id, jpeg_image(marker)).await
            }));
        }

        let mut numbers = Vec::new();
        for handle in handles {
            let (number, _) = handle.await??;
            numbers.push(number);
        }
        numbers.sort_unstable();
        assert_eq!(numbers, (1..=10).collect::<Vec<u32>>());

        let snapshot = store.snapshot(session.session_id).await?;
        assert_eq!(snapshot.pages.len(), 10);
        Ok(())
    }

    #[tokio::test]
    async fn append_to_unknown_session_reports_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path(), SessionConfig::default());

        let error = store
            .append_scanned(Uuid::now_v7(), jpeg_image(0))
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::SessionNotFound);
    }

    #[tokio::test]
    async fn finalizing_session_rejects_appends_until_aborted() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let store = store(dir.path(), SessionConfig::default());
        let session = store.create(ScanOptions::default()).await?;

        store.begin_finalize(session.session_id).await?;
        let error = store
            .append_scanned(session.session_id, jpeg_image(0))
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::SessionClosed);

        // A second finalize attempt is rejected while the first is running.
        let error = store.begin_finalize(session.session_id).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::SessionClosed);

        store.abort_finalize(session.session_id).await;
        let (number, _) = store
            .append_scanned(session.session_id, jpeg_image(1))
            .await?;
        assert_eq!(number, 1);
        Ok(())
    }

    #[tokio::test]
    async fn complete_finalize_removes_session_and_scratch() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let store = store(dir.path(), SessionConfig::default());
        let session = store.create(ScanOptions::default()).await?;
        store
            .append_scanned(session.session_id, jpeg_image(0))
            .await?;

        store.begin_finalize(session.session_id).await?;
        store.complete_finalize(session.session_id).await;

        let error = store.snapshot(session.session_id).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::SessionNotFound);
        assert!(!store.session_dir(session.session_id).exists());
        Ok(())
    }

    #[tokio::test]
    async fn close_discards_pages() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let store = store(dir.path(), SessionConfig::default());
        let session = store.create(ScanOptions::default()).await?;
        store
            .append_scanned(session.session_id, jpeg_image(0))
            .await?;
        store
            .append_scanned(session.session_id, jpeg_image(1))
            .await?;

        let discarded = store.close(session.session_id).await?;
        assert_eq!(discarded.pages.len(), 2);
        assert!(!store.session_dir(session.session_id).exists());

        let error = store.close(session.session_id).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::SessionNotFound);
        Ok(())
    }

    #[tokio::test]
    async fn page_limit_is_enforced() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let config = SessionConfig {
            max_pages: 2,
            ..SessionConfig::default()
        };
        let store = store(dir.path(), config);
        let session = store.create(ScanOptions::default()).await?;

        store
            .append_scanned(session.session_id, jpeg_image(0))
            .await?;
        store
            .append_scanned(session.session_id, jpeg_image(1))
            .await?;
        let error = store
            .append_scanned(session.session_id, jpeg_image(2))
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::InvalidInput);
        Ok(())
    }

    #[tokio::test]
    async fn idle_sessions_expire() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let config = SessionConfig {
            idle_timeout: 0,
            ..SessionConfig::default()
        };
        let store = store(dir.path(), config);
        let session = store.create(ScanOptions::default()).await?;
        store
            .append_scanned(session.session_id, jpeg_image(0))
            .await?;

        assert_eq!(store.expire_idle().await, 1);
        assert!(store.is_empty());
        assert!(!store.session_dir(session.session_id).exists());
        Ok(())
    }

    #[tokio::test]
    async fn finalizing_sessions_are_not_expired() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let config = SessionConfig {
            idle_timeout: 0,
            ..SessionConfig::default()
        };
        let store = store(dir.path(), config);
        let session = store.create(ScanOptions::default()).await?;
        store.begin_finalize(session.session_id).await?;

        assert_eq!(store.expire_idle().await, 0);
        assert_eq!(store.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn orphaned_scratch_entries_are_swept() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let config = SessionConfig {
            idle_timeout: 0,
            ..SessionConfig::default()
        };
        let store = store(dir.path(), config);
        let session = store.create(ScanOptions::default()).await?;

        // A directory from a previous run and a stray file.
        let stray_dir = store.session_dir(Uuid::now_v7());
        tokio::fs::create_dir_all(&stray_dir).await?;
        let stray_file = dir.path().join("leftover.tmp");
        tokio::fs::write(&stray_file, b"half-written").await?;

        assert_eq!(store.sweep_orphans().await, 2);
        assert!(!stray_dir.exists());
        assert!(!stray_file.exists());

        // The tracked session's directory stays, even at a zero idle limit.
        assert!(store.session_dir(session.session_id).is_dir());
        Ok(())
    }
}
