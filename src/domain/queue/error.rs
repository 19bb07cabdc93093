use crate::error::AppError;

/// Rejections raised before any unit runs; unit failures go into the report instead
#[derive(Debug, thiserror::Error)]
pub enum QueueServiceError {
    #[error("invalid input: {0}")]
    Invalid(String),
}

impl From<QueueServiceError> for AppError {
    fn from(err: QueueServiceError) -> Self {
        match err {
            QueueServiceError::Invalid(msg) => AppError::BadRequest(msg),
        }
    }
}
