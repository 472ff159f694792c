pub mod cancel;
pub mod config;
pub mod errors;
pub mod format;
pub mod permissions;
pub mod safety;

pub use cancel::CancelToken;
pub use errors::{ReclaimError, Result};
