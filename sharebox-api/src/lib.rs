pub mod error;
pub use error::{ApiError, ApiErrorKind};

pub mod serde;
pub mod files;

#[cfg(feature = "client")]
pub mod client;
