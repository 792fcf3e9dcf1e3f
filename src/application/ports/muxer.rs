//! Muxer Port - 外部混流工具抽象

use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

/// 混流错误（对整次运行是致命的）
#[derive(Debug, Error)]
pub enum MuxError {
    #[error("Failed to launch muxer: {0}")]
    Spawn(String),

    #[error("Muxer exited with code {code:?}: {stderr}")]
    Failed { code: Option<i32>, stderr: String },

    #[error("IO error: {0}")]
    IoError(String),
}

/// 混流请求
#[derive(Debug, Clone)]
pub struct MuxRequest {
    /// 按输出顺序排列的章节音频
    pub audio_paths: Vec<PathBuf>,
    /// `;FFMETADATA1` 元数据文本
    pub metadata: String,
    /// concat 列表文本
    pub concat_list: String,
    /// 最终输出文件
    pub output_path: PathBuf,
}

/// Muxer Port
#[async_trait]
pub trait MuxerPort: Send + Sync {
    /// 拼接音频并写入章节元数据，返回输出路径
    async fn mux(&self, request: &MuxRequest) -> Result<PathBuf, MuxError>;
}
