use crate::store::StoreError;
use thiserror::Error;

/// Notice board errors
#[derive(Debug, Error)]
pub enum NoticeError {
    #[error("Notice not found: {0}")]
    NotFound(String),

    #[error("Notice is not a poll: {0}")]
    NotAPoll(String),

    #[error("Invalid option index: {0}")]
    InvalidOption(String),

    #[error("Vote lost the commit race too many times, try again")]
    TransientConflict,

    #[error("Storage error: {0}")]
    Storage(StoreError),
}

impl From<StoreError> for NoticeError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict => NoticeError::TransientConflict,
            other => NoticeError::Storage(other),
        }
    }
}

pub type NoticeResult<T> = Result<T, NoticeError>;
