//! Error types for the Turnstile library.

use thiserror::Error;

/// Main error type for Turnstile operations.
#[derive(Error, Debug)]
pub enum TurnstileError {
    /// Configuration-related errors, raised at construction time
    #[error("Configuration error: {0}")]
    Config(String),

    /// Shared-store errors (distributed backend only)
    #[error("Store error: {0}")]
    Store(#[from] redis::RedisError),

    /// A shared-store call exceeded its configured timeout
    #[error("Store call timed out after {0:?}")]
    StoreTimeout(std::time::Duration),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Turnstile operations.
pub type Result<T> = std::result::Result<T, TurnstileError>;
