//! Response types for HTTP handlers.

mod documents;
mod error_response;
mod monitors;
mod printers;
mod sessions;
mod webhooks;

pub use documents::*;
pub use error_response::*;
pub use monitors::*;
pub use printers::*;
pub use sessions::*;
pub use webhooks::*;
