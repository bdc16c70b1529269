use thiserror::Error;

/// Failures from the HTTP layer.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Config error: {0}")]
    Config(String),
    #[error("Unable to reach the server: {0}")]
    Network(String),
    /// Non-2xx response whose body was valid JSON.
    #[error("Request failed ({status}): {}", .message.as_deref().unwrap_or("no message"))]
    Rejected { status: u16, message: Option<String> },
    /// Body could not be decoded, on either a success or an error status.
    #[error("Response error: {0}")]
    Parse(String),
}

/// Failures from the persistent token store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage file is corrupt: {0}")]
    Corrupt(String),
}

/// Errors surfaced by session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Login or registration rejected by the server.
    #[error("{0}")]
    Auth(String),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("failed to persist token: {0}")]
    Store(#[from] StoreError),
}
