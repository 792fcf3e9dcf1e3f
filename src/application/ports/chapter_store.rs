//! Chapter Store Port - 章节音频产物存储
//!
//! 每个成功合成的章节对应一个产物，产物存在即表示该章节已完成（断点续传标记）

use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

use crate::domain::{ChapterAudio, ChapterIndex, ContentHash};

/// 存储错误
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("IO error: {0}")]
    IoError(String),

    #[error("Invalid artifact {path}: {reason}")]
    InvalidArtifact { path: String, reason: String },
}

/// 已落盘的章节产物
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterArtifact {
    pub chapter_index: ChapterIndex,
    /// 音频文件路径
    pub audio_path: PathBuf,
    /// 写入时的章节内容哈希；旧产物没有清单时为 None
    pub content_hash: Option<ContentHash>,
    pub sample_rate: u32,
    pub sample_count: u64,
    pub duration_ms: u64,
}

/// Chapter Store Port
#[async_trait]
pub trait ChapterStorePort: Send + Sync {
    /// 章节音频文件路径（零填充索引命名）
    fn artifact_path(&self, chapter_index: ChapterIndex) -> PathBuf;

    /// 查找已完成的章节产物
    ///
    /// 不存在或内容哈希不匹配时返回 None
    async fn find_completed(
        &self,
        chapter_index: ChapterIndex,
        content_hash: &ContentHash,
    ) -> Result<Option<ChapterArtifact>, StorageError>;

    /// 保存章节音频，写入完成后才对 `find_completed` 可见
    async fn save(
        &self,
        audio: &ChapterAudio,
        content_hash: &ContentHash,
    ) -> Result<ChapterArtifact, StorageError>;

    /// 删除全部章节产物，返回删除的章节数
    async fn purge(&self) -> Result<u64, StorageError>;
}
