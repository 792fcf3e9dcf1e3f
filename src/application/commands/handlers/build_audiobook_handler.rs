//! BuildAudiobook Handler - 整书流水线
//!
//! 逐章合成（章节之间顺序执行），用同一个已过滤的产物列表生成章节标记、
//! 元数据和 concat 列表，最后交给混流器。

use std::path::PathBuf;
use std::sync::Arc;

use crate::application::commands::handlers::SynthesizeChapterHandler;
use crate::application::commands::{
    BuildAudiobook, BuildAudiobookResponse, ChapterOutcome, SynthesizeChapter,
};
use crate::application::error::ApplicationError;
use crate::application::ports::{ChapterArtifact, ChapterStorePort, MuxRequest, MuxerPort};
use crate::domain::{compute_markers, render_concat_list, render_ffmetadata, ChapterIndex};

/// 流水线配置
#[derive(Debug, Clone, Default)]
pub struct BuildAudiobookConfig {
    /// 混流成功后是否保留章节产物
    pub keep_intermediates: bool,
}

/// BuildAudiobook Handler
pub struct BuildAudiobookHandler {
    synthesizer: SynthesizeChapterHandler,
    store: Arc<dyn ChapterStorePort>,
    muxer: Arc<dyn MuxerPort>,
    config: BuildAudiobookConfig,
}

impl BuildAudiobookHandler {
    pub fn new(
        synthesizer: SynthesizeChapterHandler,
        store: Arc<dyn ChapterStorePort>,
        muxer: Arc<dyn MuxerPort>,
        config: BuildAudiobookConfig,
    ) -> Self {
        Self {
            synthesizer,
            store,
            muxer,
            config,
        }
    }

    pub async fn handle(&self, command: BuildAudiobook) -> Result<BuildAudiobookResponse, ApplicationError> {
        let total = command.chapters.len();
        if total == 0 {
            return Err(ApplicationError::NoChapters);
        }

        if !self.synthesizer.engine_healthy().await {
            tracing::warn!("TTS engine reports unhealthy, continuing anyway");
        }

        // 输出顺序 = 原始章节顺序去掉被跳过的章节
        let mut emitted: Vec<(ChapterArtifact, String, PathBuf)> = Vec::with_capacity(total);
        let mut skipped: Vec<ChapterIndex> = Vec::new();
        let mut synthesized = 0usize;
        let mut resumed = 0usize;

        for (i, chapter) in command.chapters.into_iter().enumerate() {
            let chapter_index = ChapterIndex::new(i);
            let title = chapter.title().to_string();

            tracing::info!(
                "Chapter {}/{} '{}' ({} chars)",
                i + 1,
                total,
                title.chars().take(40).collect::<String>(),
                chapter.text().chars().count()
            );

            let outcome = self
                .synthesizer
                .handle(SynthesizeChapter {
                    chapter_index,
                    chapter,
                    voice: command.voice.clone(),
                })
                .await;

            let (artifact, fresh) = match outcome {
                Ok(ChapterOutcome::Synthesized { artifact, .. }) => (artifact, true),
                Ok(ChapterOutcome::Resumed(artifact)) => (artifact, false),
                Ok(ChapterOutcome::Skipped { reason, .. }) => {
                    tracing::warn!(chapter_index = %chapter_index, reason = %reason, "Chapter skipped");
                    skipped.push(chapter_index);
                    continue;
                }
                Err(e) if e.is_chapter_local() => {
                    tracing::error!(chapter_index = %chapter_index, error = %e, "Chapter failed, skipping");
                    skipped.push(chapter_index);
                    continue;
                }
                Err(e) => return Err(e),
            };

            // concat 列表需要绝对路径，无法解析的产物只影响本章
            let audio_path = match tokio::fs::canonicalize(&artifact.audio_path).await {
                Ok(path) => path,
                Err(e) => {
                    tracing::error!(
                        chapter_index = %chapter_index,
                        path = %artifact.audio_path.display(),
                        error = %e,
                        "Chapter artifact unreadable, skipping"
                    );
                    skipped.push(chapter_index);
                    continue;
                }
            };

            if fresh {
                synthesized += 1;
            } else {
                resumed += 1;
            }
            emitted.push((artifact, title, audio_path));
        }

        if emitted.is_empty() {
            return Err(ApplicationError::NoAudioProduced { total });
        }

        let durations: Vec<u64> = emitted.iter().map(|(a, _, _)| a.duration_ms).collect();
        let titles: Vec<&str> = emitted.iter().map(|(_, t, _)| t.as_str()).collect();
        let markers = compute_markers(&durations, &titles)?;
        let metadata = render_ffmetadata(&command.book_title, &command.book_author, &markers);

        let audio_paths: Vec<PathBuf> = emitted.into_iter().map(|(_, _, path)| path).collect();
        let concat_list = render_concat_list(&audio_paths);

        let request = MuxRequest {
            audio_paths,
            metadata,
            concat_list,
            output_path: command.output_path,
        };

        tracing::info!(
            chapters = markers.len(),
            skipped = skipped.len(),
            output = %request.output_path.display(),
            "Muxing audiobook"
        );
        let output_path = self.muxer.mux(&request).await?;

        if !self.config.keep_intermediates {
            match self.store.purge().await {
                Ok(removed) => tracing::debug!(removed, "Removed chapter artifacts"),
                Err(e) => tracing::warn!(error = %e, "Failed to remove chapter artifacts"),
            }
        }

        tracing::info!(
            output = %output_path.display(),
            synthesized,
            resumed,
            skipped = skipped.len(),
            "Audiobook written"
        );

        Ok(BuildAudiobookResponse {
            output_path,
            markers,
            synthesized,
            resumed,
            skipped,
        })
    }
}
