//! Voxbook - 章节文本转有声书
//!
//! 用法: `voxbook [config.toml]`
//!
//! 读取外部提取器生成的章节 JSON，逐章合成语音，最后混流为带章节标记的 M4B。

use anyhow::Context;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use voxbook::application::{
    BuildAudiobook, BuildAudiobookConfig, BuildAudiobookHandler, SynthesisConfig,
    SynthesizeChapterHandler, TtsEnginePort, VoiceParams,
};
use voxbook::config::{load_config, load_config_from_path, print_config, AppConfig, TtsEngineKind};
use voxbook::domain::{Chapter, SegmentConfig};
use voxbook::infrastructure::adapters::{
    FakeTtsClient, FfmpegMuxer, FfmpegMuxerConfig, FileChapterStore, HttpTtsClient,
    HttpTtsClientConfig,
};

/// 章节 JSON 中的一项
#[derive(Debug, Deserialize)]
struct ChapterDto {
    title: String,
    text: String,
}

/// 读取章节列表，丢弃正文为空的章节
async fn read_chapters(path: &Path) -> anyhow::Result<Vec<Chapter>> {
    let raw = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read chapters from {}", path.display()))?;
    let items: Vec<ChapterDto> = serde_json::from_slice(&raw)
        .with_context(|| format!("Invalid chapters JSON in {}", path.display()))?;

    let mut chapters = Vec::with_capacity(items.len());
    for item in items {
        match Chapter::new(item.title, item.text) {
            Ok(chapter) => chapters.push(chapter),
            Err(e) => tracing::warn!(error = %e, "Dropping chapter from input"),
        }
    }
    Ok(chapters)
}

fn build_engine(config: &AppConfig) -> anyhow::Result<Arc<dyn TtsEnginePort>> {
    let engine: Arc<dyn TtsEnginePort> = match config.tts.engine {
        TtsEngineKind::Http => {
            let client_config = HttpTtsClientConfig::new(&config.tts.url)
                .with_timeout(config.tts.timeout_secs)
                .with_retries(config.tts.max_retries);
            Arc::new(HttpTtsClient::new(client_config)?)
        }
        TtsEngineKind::Fake => Arc::new(FakeTtsClient::with_defaults()),
    };
    Ok(engine)
}

fn init_tracing(config: &AppConfig) {
    let log_filter = format!("{},voxbook={}", config.log.level, config.log.level);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter));

    if config.log.json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = match config_path.as_deref() {
        Some(path) => load_config_from_path(Some(path)),
        None => load_config(),
    }
    .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    init_tracing(&config);

    tracing::info!("Voxbook - 章节文本转有声书");
    print_config(&config);

    let chapters = read_chapters(&config.book.chapters_path).await?;
    tracing::info!(chapters = chapters.len(), "Loaded chapters");

    let engine = build_engine(&config)?;
    let store = Arc::new(
        FileChapterStore::new(&config.storage.work_dir, config.storage.verify_content_hash).await?,
    );
    let muxer = Arc::new(FfmpegMuxer::new(FfmpegMuxerConfig {
        ffmpeg_path: config.muxer.ffmpeg_path.clone(),
        bitrate: config.muxer.bitrate.clone(),
        ..Default::default()
    }));

    let synthesizer = SynthesizeChapterHandler::new(
        engine,
        store.clone(),
        SynthesisConfig {
            segment: SegmentConfig::with_max_chars(config.synthesis.max_chars),
            workers: config.synthesis.workers,
            batch_size: config.synthesis.batch_size,
            call_timeout: Duration::from_secs(config.synthesis.segment_timeout_secs),
        },
    );
    let handler = BuildAudiobookHandler::new(
        synthesizer,
        store,
        muxer,
        BuildAudiobookConfig {
            keep_intermediates: config.storage.keep_intermediates,
        },
    );

    let command = BuildAudiobook {
        chapters,
        voice: VoiceParams {
            speaker: config.tts.speaker.clone(),
            language: config.tts.language.clone(),
            instruct: config.tts.instruct(),
        },
        book_title: config.book.resolved_title(),
        book_author: config.book.author.clone(),
        output_path: config.book.resolved_output_path(),
    };

    let response = handler.handle(command).await?;

    tracing::info!(
        output = %response.output_path.display(),
        chapters = response.markers.len(),
        synthesized = response.synthesized,
        resumed = response.resumed,
        skipped = response.skipped.len(),
        "Done"
    );
    if !response.skipped.is_empty() {
        let skipped: Vec<String> = response.skipped.iter().map(|i| (i.value() + 1).to_string()).collect();
        tracing::warn!("Chapters missing from the audiobook: {}", skipped.join(", "));
    }

    Ok(())
}
