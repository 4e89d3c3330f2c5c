//! Types and constants shared by every Nexus crate.

pub mod constants;
pub mod error;
pub mod types;

pub use error::FetchError;
pub use types::*;
