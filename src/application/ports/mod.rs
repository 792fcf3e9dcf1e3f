//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod chapter_store;
mod muxer;
mod tts_engine;

pub use chapter_store::{ChapterArtifact, ChapterStorePort, StorageError};
pub use muxer::{MuxError, MuxRequest, MuxerPort};
pub use tts_engine::{SynthesisRequest, SynthesizedAudio, TtsEnginePort, TtsError, VoiceParams};
