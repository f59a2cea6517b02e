// crates/bizclass-server/src/error.rs
// Standardized error types for bizclass

use thiserror::Error;

/// Main error type for the classifier library
#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("ML service returned {status}: {body}")]
    MlStatus { status: u16, body: String },

    #[error("ML service timed out after {0}ms")]
    MlTimeout(u64),

    #[error("DNS resolution failed: {0}")]
    Dns(String),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("circuit open for {0}")]
    CircuitOpen(String),

    #[error("store error: {0}")]
    Store(String),

    #[error("task cancelled")]
    Cancelled,

    #[error("configuration error: {0}")]
    Config(String),

    #[error("internal invariant violated: {0}")]
    Internal(String),

    #[error("unknown error: {0}")]
    Other(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

/// Convenience type alias for Result using ClassifierError
pub type Result<T> = std::result::Result<T, ClassifierError>;

impl ClassifierError {
    /// Convert to user-facing string for HTTP boundaries
    pub fn to_user_string(&self) -> String {
        self.to_string()
    }
}

impl From<String> for ClassifierError {
    fn from(s: String) -> Self {
        ClassifierError::Other(s)
    }
}

impl From<tokio::task::JoinError> for ClassifierError {
    fn from(err: tokio::task::JoinError) -> Self {
        if err.is_cancelled() {
            ClassifierError::Cancelled
        } else {
            ClassifierError::Internal(err.to_string())
        }
    }
}

impl From<ClassifierError> for String {
    fn from(err: ClassifierError) -> Self {
        err.to_string()
    }
}
