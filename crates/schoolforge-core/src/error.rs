use thiserror::Error;

/// Core error type shared across Schoolforge crates.
#[derive(Debug, Error)]
pub enum Error {
    /// The run configuration violates a precondition.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Catch-all error for unexpected failures.
    #[error("other error: {0}")]
    Other(String),
}

/// Convenience alias for results returned by Schoolforge crates.
pub type Result<T> = std::result::Result<T, Error>;
