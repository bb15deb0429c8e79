//! Error types for ToxGuard

/// Result type alias using ToxGuard's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for ToxGuard operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Model construction, weight loading, or forward/backward failures
    #[error("model error: {0}")]
    Model(String),

    /// Tokenizer loading or encoding failures
    #[error("tokenizer error: {0}")]
    Tokenizer(String),

    /// Dataset shape or content errors
    #[error("data error: {0}")]
    Data(String),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// Outbound HTTP errors
    #[error("http error: {0}")]
    Http(String),

    /// Network/IO errors
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV reading/writing errors
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// Serialization errors
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic internal errors
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new model error
    pub fn model(msg: impl Into<String>) -> Self {
        Self::Model(msg.into())
    }

    /// Create a new tokenizer error
    pub fn tokenizer(msg: impl Into<String>) -> Self {
        Self::Tokenizer(msg.into())
    }

    /// Create a new data error
    pub fn data(msg: impl Into<String>) -> Self {
        Self::Data(msg.into())
    }

    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Create a new internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
