use thiserror::Error;

/// Central error type for item pipelines
#[derive(Error, Debug)]
pub enum FlowError {
    // ============================================================================
    // Data Errors
    // ============================================================================
    #[error("Source error: {0}")]
    Source(String),

    #[error("Stage '{stage}' failed: {message}")]
    Stage { stage: String, message: String },

    #[error("Consumer error: {0}")]
    Consumer(String),

    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Builder pattern validation error
    #[error("Builder error: {0}")]
    BuilderError(String),

    // ============================================================================
    // Generic/System Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Mutex lock error")]
    LockError,

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    GenericError(String),
}

impl FlowError {
    /// Build a stage failure tagged with the stage name
    pub fn stage(stage: impl Into<String>, message: impl Into<String>) -> Self {
        FlowError::Stage {
            stage: stage.into(),
            message: message.into(),
        }
    }
}

// Implement conversion from PoisonError for Mutex locks
impl<T> From<std::sync::PoisonError<T>> for FlowError {
    fn from(_: std::sync::PoisonError<T>) -> Self {
        FlowError::LockError
    }
}

impl From<String> for FlowError {
    fn from(err: String) -> Self {
        FlowError::GenericError(err)
    }
}

impl From<&str> for FlowError {
    fn from(err: &str) -> Self {
        FlowError::GenericError(err.to_string())
    }
}

// Helper type alias for Results
pub type FlowResult<T> = Result<T, FlowError>;
