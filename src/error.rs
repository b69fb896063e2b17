//! Error types for the build relay.

/// Top-level error type for the relay.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// Upstream HTTP request failed, timed out, or returned a non-success status.
    #[error("request to {url} failed: {cause}")]
    Request {
        /// Target URL of the failed request.
        url: String,
        /// Underlying transport, status, or decode failure.
        cause: String,
    },

    /// Upstream responded but the payload lacked a required value.
    #[error("poll error: {0}")]
    Poll(String),

    /// Local state file could not be read or written.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// Building or delivering a command reply failed.
    #[error("command error: {0}")]
    Command(String),

    /// Registering slash commands with Discord failed.
    #[error("registration error: {0}")]
    Registration(String),

    /// Discord REST or gateway error.
    #[error("discord error: {0}")]
    Discord(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, RelayError>;
