//! 应用层错误定义
//!
//! 片段级、章节级失败在编排器内部吸收，只有这里的错误会向上传播

use thiserror::Error;

use crate::application::ports::{MuxError, StorageError};
use crate::domain::{ChapterError, TimelineError};

/// 应用层错误
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// 输入没有任何章节
    #[error("No chapters to synthesize")]
    NoChapters,

    /// 所有章节都被跳过
    #[error("No audio was generated for any of the {total} chapters")]
    NoAudioProduced { total: usize },

    /// 章节产物读写失败
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// 混流失败
    #[error("Muxing error: {0}")]
    Muxing(#[from] MuxError),

    /// 时间线计算失败
    #[error("Timeline error: {0}")]
    Timeline(#[from] TimelineError),

    /// 章节音频无效
    #[error("Invalid chapter audio: {0}")]
    InvalidAudio(#[from] ChapterError),
}

impl ApplicationError {
    /// 是否只影响单个章节（驱动器记录后继续处理下一章）
    pub fn is_chapter_local(&self) -> bool {
        matches!(self, Self::Storage(_) | Self::InvalidAudio(_))
    }
}
