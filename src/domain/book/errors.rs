//! Book Context - Errors

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChapterError {
    #[error("chapter text is empty: {0}")]
    EmptyText(String),

    #[error("sample rate must be greater than zero")]
    InvalidSampleRate,

    #[error("sample rate mismatch: expected {expected} Hz, got {actual} Hz")]
    SampleRateMismatch { expected: u32, actual: u32 },
}
