use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unsupported file type for {file_name}: {media_type}")]
    UnsupportedMediaType { file_name: String, media_type: String },

    #[error("Upload of {total} bytes exceeds the {limit} byte limit")]
    BatchTooLarge { total: u64, limit: u64 },

    #[error("{0}")]
    Auth(String),

    #[error("Not signed in")]
    NotAuthenticated,

    #[error("No documents have been uploaded")]
    NoDocuments,

    #[error("An upload is already in progress")]
    UploadInProgress,

    #[error("Backend returned {status}: {body}")]
    UnexpectedStatus { status: StatusCode, body: String },

    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(anyhow::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(anyhow::Error::new(err))
    }
}

impl AppError {
    /// Local failures that were caught before anything went over the wire.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            AppError::Validation(_)
                | AppError::InvalidInput(_)
                | AppError::UnsupportedMediaType { .. }
                | AppError::BatchTooLarge { .. }
        )
    }

    /// Network failures, timeouts and non-success responses.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            AppError::Transport(_) | AppError::UnexpectedStatus { .. } | AppError::Decode(_)
        )
    }
}
