use crate::slots::SlotName;
use crate::store::StoreError;
use thiserror::Error;

/// Order ledger errors
///
/// The first three are the caller-facing taxonomy and must stay distinct:
/// "closed" and "already ordered" are permanent facts, `TransientConflict`
/// means the whole action may be retried.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Ordering closed: {next_slot} slot opens later")]
    OutsideOrderingWindow {
        next_slot: SlotName,
        /// Unix millis when ordering resumes
        opens_at: i64,
    },

    #[error("Already ordered in the {0} slot today")]
    AlreadyOrderedThisSlot(SlotName),

    #[error("Order lost the commit race too many times, try again")]
    TransientConflict,

    #[error("Storage error: {0}")]
    Storage(StoreError),
}

/// 冲突重试耗尽归类为 TransientConflict，其余存储错误原样向上传递
impl From<StoreError> for LedgerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict => LedgerError::TransientConflict,
            other => LedgerError::Storage(other),
        }
    }
}

pub type LedgerResult<T> = Result<T, LedgerError>;
