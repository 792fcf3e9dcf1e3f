//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（voxbook.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::{AppConfig, TtsEngineKind};

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["voxbook", "voxbook.local"];

/// 加载应用配置
///
/// 按优先级从高到低合并配置：
/// 1. 环境变量（前缀 `VOXBOOK_`，层级分隔符 `__`）
/// 2. 配置文件（voxbook.toml 或 voxbook.local.toml）
/// 3. 默认值
///
/// # 环境变量示例
/// - `VOXBOOK_BOOK__CHAPTERS_PATH=books/moby_dick.json`
/// - `VOXBOOK_TTS__URL=http://tts-server:8000`
/// - `VOXBOOK_SYNTHESIS__WORKERS=4`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 首先设置默认值（最低优先级）
    builder = builder
        .set_default("tts.engine", "http")?
        .set_default("tts.url", "http://localhost:8000")?
        .set_default("tts.timeout_secs", 120)?
        .set_default("tts.max_retries", 0)?
        .set_default("tts.speaker", "Aiden")?
        .set_default("tts.language", "Auto")?
        .set_default("tts.instruct", "")?
        .set_default("synthesis.max_chars", 500)?
        .set_default("synthesis.workers", 1)?
        .set_default("synthesis.batch_size", 1)?
        .set_default("synthesis.segment_timeout_secs", 300)?
        .set_default("storage.work_dir", "data/chapters")?
        .set_default("storage.keep_intermediates", false)?
        .set_default("storage.verify_content_hash", true)?
        .set_default("muxer.ffmpeg_path", "ffmpeg")?
        .set_default("muxer.bitrate", "64k")?
        .set_default("log.level", "info")?
        .set_default("log.json", false)?;

    // 2. 添加配置文件（如果存在）
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 添加环境变量（最高优先级）
    // 例如: VOXBOOK_TTS__URL=http://tts-server:8000
    builder = builder.add_source(
        Environment::with_prefix("VOXBOOK")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;

    let app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
pub fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    let fail = |msg: &str| Err(ConfigError::ValidationError(msg.to_string()));

    if config.book.chapters_path.as_os_str().is_empty() {
        return fail("book.chapters_path must be set");
    }

    if config.tts.engine == TtsEngineKind::Http && config.tts.url.trim().is_empty() {
        return fail("TTS URL cannot be empty for the http engine");
    }

    if config.synthesis.max_chars == 0 {
        return fail("synthesis.max_chars must be greater than 0");
    }

    if config.synthesis.workers == 0 {
        return fail("synthesis.workers must be at least 1");
    }

    if config.synthesis.batch_size == 0 {
        return fail("synthesis.batch_size must be at least 1");
    }

    if config.synthesis.segment_timeout_secs == 0 {
        return fail("synthesis.segment_timeout_secs must be greater than 0");
    }

    if config.muxer.bitrate.trim().is_empty() {
        return fail("muxer.bitrate cannot be empty");
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Chapters: {}", config.book.chapters_path.display());
    tracing::info!("Title: {}", config.book.resolved_title());
    tracing::info!("Output: {}", config.book.resolved_output_path().display());
    tracing::info!("TTS Engine: {:?}", config.tts.engine);
    if config.tts.engine == TtsEngineKind::Http {
        tracing::info!("TTS URL: {}", config.tts.url);
        tracing::info!("TTS Timeout: {}s (retries: {})", config.tts.timeout_secs, config.tts.max_retries);
    }
    tracing::info!("Voice: {} / {}", config.tts.speaker, config.tts.language);
    tracing::info!(
        "Segments: max {} chars, {} worker(s), batch size {}",
        config.synthesis.max_chars,
        config.synthesis.workers,
        config.synthesis.batch_size
    );
    tracing::info!("Work Directory: {}", config.storage.work_dir.display());
    tracing::info!("Keep Intermediates: {}", config.storage.keep_intermediates);
    tracing::info!("FFmpeg: {} ({})", config.muxer.ffmpeg_path.display(), config.muxer.bitrate);
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn valid_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.book.chapters_path = PathBuf::from("book.json");
        config
    }

    #[test]
    fn test_validation_passes_for_valid_config() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn test_validation_requires_chapters_path() {
        assert!(validate_config(&AppConfig::default()).is_err());
    }

    #[test]
    fn test_validation_error_for_zero_limits() {
        let mut config = valid_config();
        config.synthesis.max_chars = 0;
        assert!(validate_config(&config).is_err());

        let mut config = valid_config();
        config.synthesis.workers = 0;
        assert!(validate_config(&config).is_err());

        let mut config = valid_config();
        config.synthesis.batch_size = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_empty_tts_url_only_matters_for_http() {
        let mut config = valid_config();
        config.tts.url = String::new();
        assert!(validate_config(&config).is_err());

        config.tts.engine = TtsEngineKind::Fake;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validation_error_for_empty_bitrate() {
        let mut config = valid_config();
        config.muxer.bitrate = " ".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_load_from_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("voxbook.toml");
        std::fs::write(
            &path,
            r#"
[book]
chapters_path = "books/novel.json"
author = "Anon"

[tts]
engine = "fake"

[synthesis]
workers = 4
batch_size = 2
"#,
        )
        .unwrap();

        let config = load_config_from_path(Some(&path)).unwrap();
        assert_eq!(config.book.chapters_path, PathBuf::from("books/novel.json"));
        assert_eq!(config.book.author, "Anon");
        assert_eq!(config.tts.engine, TtsEngineKind::Fake);
        assert_eq!(config.synthesis.workers, 4);
        assert_eq!(config.synthesis.batch_size, 2);
        assert_eq!(config.synthesis.max_chars, 500);
        assert_eq!(config.muxer.bitrate, "64k");
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("voxbook.toml");
        std::fs::write(&path, "[book]\nchapters_path = \"b.json\"\n[synthesis]\nworkers = 0\n").unwrap();

        let err = load_config_from_path(Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }
}
