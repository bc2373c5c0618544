pub mod error;
pub mod types;
pub mod version;

pub use error::ExtError;
pub use types::{CallbackState, DuplicatePolicy};
pub use version::{version_check, SemVer};
