//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（TtsEngine、ChapterStore、Muxer）
//! - commands: 单章节合成与整书流水线命令及处理器
//! - error: 应用层错误定义

pub mod commands;
pub mod error;
pub mod ports;

// Re-exports
pub use commands::{
    handlers::{BuildAudiobookConfig, BuildAudiobookHandler, SynthesisConfig, SynthesizeChapterHandler},
    BuildAudiobook, BuildAudiobookResponse, ChapterOutcome, SkipReason, SynthesisResult,
    SynthesizeChapter,
};

pub use error::ApplicationError;

pub use ports::{
    ChapterArtifact, ChapterStorePort, MuxError, MuxRequest, MuxerPort, StorageError,
    SynthesisRequest, SynthesizedAudio, TtsEnginePort, TtsError, VoiceParams,
};
