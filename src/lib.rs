//! Voxbook - 章节文本转有声书
//!
//! 架构设计: DDD + Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Book Context: 章节、片段、章节音频、章节标记
//! - 文本分割、章节时间线、元数据渲染（纯函数）
//!
//! 应用层 (application/):
//! - Ports: TtsEngine, ChapterStore, Muxer
//! - Commands: SynthesizeChapter（单章编排）、BuildAudiobook（整书流水线）
//!
//! 基础设施层 (infrastructure/):
//! - Adapters: HTTP / Fake TTS Client, WAV Codec, File Chapter Store, FFmpeg Muxer

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
