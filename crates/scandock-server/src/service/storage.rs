//! Categorized document storage on the local filesystem.
//!
//! Documents are plain PDF files under `<storage_root>/<category>/`; there is
//! no database. The directory tree is the catalog: listings read it back, and
//! name uniqueness comes from `create_new` on the final path.

use std::path::{Path, PathBuf};

use jiff::Timestamp;
use scandock_core::document::{Document, OcrStatus};
use scandock_core::{Error, Result};

use crate::service::StorageConfig;

/// Tracing target for storage operations.
const TRACING_TARGET: &str = "scandock_server::service::storage";

/// Upper bound on collision suffix attempts per stored document.
const MAX_NAME_ATTEMPTS: u32 = 100;

/// A stored document as seen by directory listings.
///
/// Listings are reconstructed from the filesystem, so only file-level
/// metadata is available; page count and OCR outcome are not persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredEntry {
    /// File name within the category directory.
    pub file_name: String,
    /// Category directory the file lives under.
    pub category: String,
    /// File length in bytes.
    pub byte_len: u64,
    /// Last modification time of the file.
    pub modified_at: Timestamp,
}

/// A stored document resolved for download.
#[derive(Debug, Clone)]
pub struct DocumentFile {
    /// Sanitized file name.
    pub file_name: String,
    /// Absolute location of the file.
    pub path: PathBuf,
    /// File length in bytes.
    pub byte_len: u64,
}

/// Filesystem-backed store for finished documents.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    config: StorageConfig,
}

impl DocumentStore {
    /// Opens the store, creating the storage root, each configured category
    /// directory, and the scratch area.
    pub async fn new(config: &StorageConfig) -> Result<Self> {
        for category in &config.categories {
            let dir = config.storage_root.join(category);
            tokio::fs::create_dir_all(&dir).await.map_err(|e| {
                Error::io()
                    .with_message(format!(
                        "failed to create category directory {}",
                        dir.display()
                    ))
                    .with_source(e)
            })?;
        }
        tokio::fs::create_dir_all(config.scratch_root())
            .await
            .map_err(|e| {
                Error::io()
                    .with_message("failed to create scratch directory")
                    .with_source(e)
            })?;

        Ok(Self {
            config: config.clone(),
        })
    }

    /// Root directory for finished documents.
    pub fn root(&self) -> &Path {
        &self.config.storage_root
    }

    /// Scratch directory for in-flight pipeline files.
    pub fn scratch_root(&self) -> PathBuf {
        self.config.scratch_root()
    }

    /// Whether categories outside the configured set are accepted.
    pub fn allows_ad_hoc(&self) -> bool {
        self.config.allow_ad_hoc_categories
    }

    /// Validates a category name against the configured set.
    ///
    /// With ad hoc categories enabled any safe directory name is accepted;
    /// its directory materializes on first store.
    pub fn validate_category(&self, category: &str) -> Result<String> {
        let category = category.trim();
        if self.config.categories.iter().any(|c| c == category) {
            return Ok(category.to_owned());
        }
        if self.config.allow_ad_hoc_categories && is_safe_component(category) {
            return Ok(category.to_owned());
        }
        Err(Error::invalid_category().with_message(format!("no such category: {category}")))
    }

    /// Files a draft PDF under the category, resolving name collisions.
    ///
    /// The draft is copied, never moved, so the caller's scratch cleanup
    /// still holds a copy if this write fails partway.
    pub async fn store(
        &self,
        draft: &Path,
        category: &str,
        file_name: Option<&str>,
        page_count: u32,
        ocr_status: OcrStatus,
    ) -> Result<Document> {
        let category = self.validate_category(category)?;
        let created_at = Timestamp::now();
        let file_name = match file_name {
            Some(name) => sanitize_file_name(name)?,
            None => default_file_name(created_at),
        };

        let dir = self.config.storage_root.join(&category);
        tokio::fs::create_dir_all(&dir).await.map_err(|e| {
            Error::io()
                .with_message(format!(
                    "failed to create category directory {}",
                    dir.display()
                ))
                .with_source(e)
        })?;

        let (path, file_name) = self.reserve(&dir, &file_name).await?;
        let byte_len = match tokio::fs::copy(draft, &path).await {
            Ok(len) => len,
            Err(e) => {
                // Leave no empty reservation behind.
                let _ = tokio::fs::remove_file(&path).await;
                return Err(Error::io()
                    .with_message("failed to write document")
                    .with_source(e));
            }
        };

        tracing::info!(
            target: TRACING_TARGET,
            category = category.as_str(),
            file_name = file_name.as_str(),
            pages = page_count,
            bytes = byte_len,
            "document stored"
        );

        Ok(Document {
            file_name,
            path,
            category,
            page_count,
            ocr_status,
            byte_len,
            created_at,
        })
    }

    /// Reserves a unique file path under the category directory.
    ///
    /// `create_new` makes the reservation atomic; on collision the stem gets
    /// `-2`, `-3`, … suffixes up to a bounded attempt count, then the store
    /// reports `storage_exhausted`.
    async fn reserve(&self, dir: &Path, file_name: &str) -> Result<(PathBuf, String)> {
        let (stem, extension) = match file_name.rsplit_once('.') {
            Some((stem, extension)) => (stem, extension),
            None => (file_name, "pdf"),
        };

        for attempt in 1..=MAX_NAME_ATTEMPTS {
            let candidate = if attempt == 1 {
                format!("{stem}.{extension}")
            } else {
                format!("{stem}-{attempt}.{extension}")
            };
            let path = dir.join(&candidate);

            match tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(_) => return Ok((path, candidate)),
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
                Err(e) => {
                    return Err(Error::io()
                        .with_message("failed to reserve document file")
                        .with_source(e));
                }
            }
        }

        Err(Error::storage_exhausted().with_message(format!(
            "no free name for {file_name} after {MAX_NAME_ATTEMPTS} attempts"
        )))
    }

    /// Lists stored documents, newest first, optionally filtered by
    /// category.
    pub async fn list(&self, category: Option<&str>) -> Result<Vec<StoredEntry>> {
        let categories = match category {
            Some(filter) => vec![self.validate_category(filter)?],
            None => self.categories().await?,
        };

        let mut entries = Vec::new();
        for category in categories {
            let dir = self.config.storage_root.join(&category);
            let mut reader = match tokio::fs::read_dir(&dir).await {
                Ok(reader) => reader,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => {
                    return Err(Error::io()
                        .with_message(format!("failed to read category {category}"))
                        .with_source(e));
                }
            };

            while let Some(entry) = reader.next_entry().await.map_err(|e| {
                Error::io()
                    .with_message(format!("failed to read category {category}"))
                    .with_source(e)
            })? {
                let name = entry.file_name();
                let Some(name) = name.to_str() else { continue };
                if name.starts_with('.') {
                    continue;
                }
                let Ok(metadata) = entry.metadata().await else {
                    continue;
                };
                if !metadata.is_file() {
                    continue;
                }

                let modified_at = metadata
                    .modified()
                    .ok()
                    .and_then(|t| Timestamp::try_from(t).ok())
                    .unwrap_or(Timestamp::UNIX_EPOCH);
                entries.push(StoredEntry {
                    file_name: name.to_owned(),
                    category: category.clone(),
                    byte_len: metadata.len(),
                    modified_at,
                });
            }
        }

        entries.sort_by(|a, b| {
            b.modified_at
                .cmp(&a.modified_at)
                .then_with(|| a.file_name.cmp(&b.file_name))
        });
        Ok(entries)
    }

    /// Category names: the configured set plus, when ad hoc categories are
    /// enabled, every directory already present under the root.
    pub async fn categories(&self) -> Result<Vec<String>> {
        let mut categories = self.config.categories.clone();
        if !self.config.allow_ad_hoc_categories {
            return Ok(categories);
        }

        let mut reader = tokio::fs::read_dir(&self.config.storage_root)
            .await
            .map_err(|e| {
                Error::io()
                    .with_message("failed to read storage root")
                    .with_source(e)
            })?;

        let mut extras = Vec::new();
        while let Some(entry) = reader.next_entry().await.map_err(|e| {
            Error::io()
                .with_message("failed to read storage root")
                .with_source(e)
        })? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if name.starts_with('.') || categories.iter().any(|c| c == name) {
                continue;
            }
            if entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false) {
                extras.push(name.to_owned());
            }
        }

        extras.sort_unstable();
        categories.extend(extras);
        Ok(categories)
    }

    /// Resolves a stored document for download.
    ///
    /// Returns `None` when no such document exists. Inputs go through the
    /// same validation as at store time, so traversal never escapes the
    /// root.
    pub async fn open(&self, category: &str, file_name: &str) -> Result<Option<DocumentFile>> {
        let category = self.validate_category(category)?;
        let file_name = sanitize_file_name(file_name)?;
        let path = self.config.storage_root.join(&category).join(&file_name);

        match tokio::fs::metadata(&path).await {
            Ok(metadata) if metadata.is_file() => Ok(Some(DocumentFile {
                file_name,
                path,
                byte_len: metadata.len(),
            })),
            Ok(_) => Ok(None),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::io()
                .with_message("failed to stat document")
                .with_source(e)),
        }
    }
}

/// A safe single path component: no separators, no leading dot, ASCII
/// letters, digits, `-`, `_` and `.` only.
fn is_safe_component(name: &str) -> bool {
    if name.is_empty() || name.len() > 64 || name.starts_with('.') {
        return false;
    }
    name.chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

/// Sanitizes a client-supplied file name into a safe `.pdf` name.
///
/// Path separators and `..` are rejected outright; whitespace becomes `_`
/// and characters outside the safe set are dropped. A name with nothing
/// usable left is rejected rather than silently replaced.
fn sanitize_file_name(input: &str) -> Result<String> {
    let trimmed = input.trim();
    if trimmed.contains(['/', '\\']) || trimmed.contains("..") {
        return Err(
            Error::invalid_input().with_message("file name must not contain path separators")
        );
    }

    let mut name: String = trimmed
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        .collect();
    while name.starts_with('.') {
        name.remove(0);
    }
    // Pure ASCII at this point, truncation cannot split a character.
    name.truncate(128);

    if name.to_ascii_lowercase().ends_with(".pdf") {
        name.truncate(name.len() - 4);
    }
    if name.is_empty() {
        return Err(Error::invalid_input().with_message("file name has no usable characters"));
    }
    Ok(format!("{name}.pdf"))
}

/// Canonical name for documents stored without an explicit name.
fn default_file_name(now: Timestamp) -> String {
    format!("scan-{}.pdf", now.strftime("%Y%m%d-%H%M%S"))
}
