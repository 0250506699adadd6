//! Request types for HTTP handlers.

mod documents;
mod paths;
mod scans;
mod sessions;

pub use documents::*;
pub use paths::*;
pub use scans::*;
pub use sessions::*;
