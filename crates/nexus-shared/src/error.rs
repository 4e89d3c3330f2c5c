use thiserror::Error;

/// Failure of a (simulated) data fetch. Stores capture it as state; it never
/// escapes a fetch call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("{0}")]
    Unavailable(String),

    #[error("Fetch cancelled")]
    Cancelled,
}
