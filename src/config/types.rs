//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;
use std::path::PathBuf;

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// 书籍输入输出
    #[serde(default)]
    pub book: BookConfig,

    /// TTS 引擎配置
    #[serde(default)]
    pub tts: TtsConfig,

    /// 合成调度配置
    #[serde(default)]
    pub synthesis: SynthesisSettings,

    /// 章节产物存储配置
    #[serde(default)]
    pub storage: StorageConfig,

    /// 混流配置
    #[serde(default)]
    pub muxer: MuxerConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

/// 书籍配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookConfig {
    /// 章节 JSON 文件（`[{"title": ..., "text": ...}]`）
    #[serde(default)]
    pub chapters_path: PathBuf,

    /// 书名，未设置时取章节文件名
    #[serde(default)]
    pub title: Option<String>,

    /// 作者，可为空
    #[serde(default)]
    pub author: String,

    /// 输出文件，未设置时为章节文件同名 `.m4b`
    #[serde(default)]
    pub output_path: Option<PathBuf>,
}

impl BookConfig {
    /// 实际使用的书名
    pub fn resolved_title(&self) -> String {
        match &self.title {
            Some(title) if !title.trim().is_empty() => title.clone(),
            _ => self
                .chapters_path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default(),
        }
    }

    /// 实际使用的输出路径
    pub fn resolved_output_path(&self) -> PathBuf {
        self.output_path
            .clone()
            .unwrap_or_else(|| self.chapters_path.with_extension("m4b"))
    }
}

/// TTS 引擎类型
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TtsEngineKind {
    /// 远程 HTTP 服务
    #[default]
    Http,
    /// 离线正弦音，试运行用
    Fake,
}

/// TTS 引擎配置
#[derive(Debug, Clone, Deserialize)]
pub struct TtsConfig {
    #[serde(default)]
    pub engine: TtsEngineKind,

    /// TTS 服务基础 URL
    #[serde(default = "default_tts_url")]
    pub url: String,

    /// 请求超时时间（秒）
    #[serde(default = "default_tts_timeout")]
    pub timeout_secs: u64,

    /// 最大重试次数
    #[serde(default)]
    pub max_retries: u32,

    /// 说话人
    #[serde(default = "default_speaker")]
    pub speaker: String,

    /// 目标语言
    #[serde(default = "default_language")]
    pub language: String,

    /// 风格指令，空字符串表示不使用
    #[serde(default)]
    pub instruct: String,
}

fn default_tts_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_tts_timeout() -> u64 {
    120
}

fn default_speaker() -> String {
    "Aiden".to_string()
}

fn default_language() -> String {
    "Auto".to_string()
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            engine: TtsEngineKind::default(),
            url: default_tts_url(),
            timeout_secs: default_tts_timeout(),
            max_retries: 0,
            speaker: default_speaker(),
            language: default_language(),
            instruct: String::new(),
        }
    }
}

impl TtsConfig {
    pub fn instruct(&self) -> Option<String> {
        let instruct = self.instruct.trim();
        (!instruct.is_empty()).then(|| instruct.to_string())
    }
}

/// 合成调度配置
#[derive(Debug, Clone, Deserialize)]
pub struct SynthesisSettings {
    /// 片段最大字符数
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,

    /// 并发引擎调用数，1 为顺序执行
    #[serde(default = "default_one")]
    pub workers: usize,

    /// 每次引擎调用的片段数
    #[serde(default = "default_one")]
    pub batch_size: usize,

    /// 单次引擎调用超时（秒）
    #[serde(default = "default_segment_timeout")]
    pub segment_timeout_secs: u64,
}

fn default_max_chars() -> usize {
    500
}

fn default_one() -> usize {
    1
}

fn default_segment_timeout() -> u64 {
    300
}

impl Default for SynthesisSettings {
    fn default() -> Self {
        Self {
            max_chars: default_max_chars(),
            workers: default_one(),
            batch_size: default_one(),
            segment_timeout_secs: default_segment_timeout(),
        }
    }
}

/// 存储配置
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// 章节产物工作目录
    #[serde(default = "default_work_dir")]
    pub work_dir: PathBuf,

    /// 混流成功后保留章节产物
    #[serde(default)]
    pub keep_intermediates: bool,

    /// 续传时校验章节内容哈希
    #[serde(default = "default_true")]
    pub verify_content_hash: bool,
}

fn default_work_dir() -> PathBuf {
    PathBuf::from("data/chapters")
}

fn default_true() -> bool {
    true
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            work_dir: default_work_dir(),
            keep_intermediates: false,
            verify_content_hash: default_true(),
        }
    }
}

/// 混流配置
#[derive(Debug, Clone, Deserialize)]
pub struct MuxerConfig {
    /// ffmpeg 可执行文件
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: PathBuf,

    /// AAC 码率
    #[serde(default = "default_bitrate")]
    pub bitrate: String,
}

fn default_ffmpeg_path() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_bitrate() -> String {
    "64k".to_string()
}

impl Default for MuxerConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            bitrate: default_bitrate(),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否启用 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}
