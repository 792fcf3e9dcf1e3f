//! SynthesizeChapter Handler - 单章节合成编排
//!
//! 流程：断点续传检查 → 分段 → 分批派发（有界并发）→ 按片段顺序归位 → 拼接落盘
//!
//! 并发完成顺序不影响输出顺序：每个结果携带 segment_order，写入固定长度的槽位数组，
//! 全部批次结束后才按槽位顺序读取。并发数由 semaphore 限制。

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::application::commands::{ChapterOutcome, SkipReason, SynthesisResult, SynthesizeChapter};
use crate::application::error::ApplicationError;
use crate::application::ports::{
    ChapterStorePort, SynthesisRequest, TtsEnginePort, TtsError, VoiceParams,
};
use crate::domain::{segment_text, ChapterAudio, ChapterIndex, ContentHash, SegmentConfig, TextSegment};

/// 合成配置
#[derive(Debug, Clone)]
pub struct SynthesisConfig {
    pub segment: SegmentConfig,
    /// 同时进行中的引擎调用数，1 表示顺序执行
    pub workers: usize,
    /// 每次引擎调用包含的片段数
    pub batch_size: usize,
    /// 单次引擎调用超时
    pub call_timeout: Duration,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            segment: SegmentConfig::default(),
            workers: 1,
            batch_size: 1,
            call_timeout: Duration::from_secs(300),
        }
    }
}

/// 一个批次的派发结果
struct BatchReport {
    orders: Vec<usize>,
    result: Result<Vec<SynthesisResult>, TtsError>,
}

impl BatchReport {
    fn failed(batch: &[TextSegment], error: TtsError) -> Self {
        Self {
            orders: batch.iter().map(TextSegment::order).collect(),
            result: Err(error),
        }
    }
}

/// SynthesizeChapter Handler
pub struct SynthesizeChapterHandler {
    engine: Arc<dyn TtsEnginePort>,
    store: Arc<dyn ChapterStorePort>,
    config: SynthesisConfig,
}

impl SynthesizeChapterHandler {
    pub fn new(
        engine: Arc<dyn TtsEnginePort>,
        store: Arc<dyn ChapterStorePort>,
        config: SynthesisConfig,
    ) -> Self {
        Self {
            engine,
            store,
            config,
        }
    }

    /// 引擎是否可用
    pub async fn engine_healthy(&self) -> bool {
        self.engine.health_check().await
    }

    pub async fn handle(&self, command: SynthesizeChapter) -> Result<ChapterOutcome, ApplicationError> {
        let chapter_index = command.chapter_index;
        let content_hash = ContentHash::of_text(command.chapter.text());

        // 已完成的章节直接复用，不重新分段也不重新合成
        if let Some(artifact) = self.store.find_completed(chapter_index, &content_hash).await? {
            tracing::info!(
                chapter_index = %chapter_index,
                path = %artifact.audio_path.display(),
                "Chapter already synthesized, resuming"
            );
            return Ok(ChapterOutcome::Resumed(artifact));
        }

        let segments = segment_text(command.chapter.text(), &self.config.segment);
        if segments.is_empty() {
            tracing::warn!(chapter_index = %chapter_index, "Chapter has no text segments, skipping");
            return Ok(ChapterOutcome::Skipped {
                chapter_index,
                reason: SkipReason::NoSegments,
            });
        }

        let results = self
            .dispatch(chapter_index, &segments, &command.voice)
            .await;

        let total = segments.len();
        let parts = Self::collect_in_order(chapter_index, results);
        if parts.is_empty() {
            tracing::warn!(
                chapter_index = %chapter_index,
                segments = total,
                "No audio produced for chapter, skipping"
            );
            return Ok(ChapterOutcome::Skipped {
                chapter_index,
                reason: SkipReason::AllSegmentsFailed { segments: total },
            });
        }

        let missing_segments = total - parts.len();
        if missing_segments > 0 {
            tracing::warn!(
                chapter_index = %chapter_index,
                missing = missing_segments,
                segments = total,
                "Chapter degraded, continuing with the segments that succeeded"
            );
        }

        let audio = ChapterAudio::concat(
            chapter_index,
            parts.into_iter().map(|r| (r.samples, r.sample_rate)),
        )?;
        let artifact = self.store.save(&audio, &content_hash).await?;

        tracing::info!(
            chapter_index = %chapter_index,
            path = %artifact.audio_path.display(),
            seconds = artifact.duration_ms as f64 / 1000.0,
            "Chapter saved"
        );

        Ok(ChapterOutcome::Synthesized {
            artifact,
            missing_segments,
        })
    }

    /// 分批派发，返回按片段顺序排列的槽位，失败的片段为 None
    async fn dispatch(
        &self,
        chapter_index: ChapterIndex,
        segments: &[TextSegment],
        voice: &VoiceParams,
    ) -> Vec<Option<SynthesisResult>> {
        // 引擎不支持原生批量时逐段派发，超时只作用于单次调用
        let batch_size = if self.engine.supports_batching() {
            self.config.batch_size.max(1)
        } else {
            if self.config.batch_size > 1 {
                tracing::debug!(
                    chapter_index = %chapter_index,
                    batch_size = self.config.batch_size,
                    "Engine has no native batching, dispatching per segment"
                );
            }
            1
        };
        let batch_count = segments.len().div_ceil(batch_size);

        // 使用 semaphore 控制并发
        let semaphore = Arc::new(Semaphore::new(self.config.workers.max(1)));
        let mut tasks = JoinSet::new();

        for batch in segments.chunks(batch_size) {
            let permit = semaphore.clone().acquire_owned().await;
            let engine = self.engine.clone();
            let batch = batch.to_vec();
            let voice = voice.clone();
            let call_timeout = self.config.call_timeout;

            tasks.spawn(async move {
                let _permit = match permit {
                    Ok(permit) => permit, // 持有 permit 直到调用结束
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to acquire semaphore permit");
                        return BatchReport::failed(&batch, TtsError::ServiceError(e.to_string()));
                    }
                };
                Self::run_batch(engine, batch, voice, call_timeout).await
            });
        }

        // 全部批次结束后才读取槽位
        let mut slots: Vec<Option<SynthesisResult>> = (0..segments.len()).map(|_| None).collect();
        let mut finished = 0usize;

        while let Some(joined) = tasks.join_next().await {
            finished += 1;
            let report = match joined {
                Ok(report) => report,
                Err(e) => {
                    tracing::error!(chapter_index = %chapter_index, error = %e, "Batch task aborted");
                    continue;
                }
            };
            let first = report.orders.first().copied().unwrap_or_default();
            let last = report.orders.last().copied().unwrap_or_default();

            match report.result {
                Ok(results) => {
                    tracing::debug!(
                        chapter_index = %chapter_index,
                        first_segment = first,
                        last_segment = last,
                        progress = %format!("{}/{}", finished, batch_count),
                        "Batch synthesized"
                    );
                    for result in results {
                        let slot = &mut slots[result.segment_order];
                        debug_assert!(slot.is_none(), "segment written twice");
                        *slot = Some(result);
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        chapter_index = %chapter_index,
                        first_segment = first,
                        last_segment = last,
                        error = %e,
                        "TTS failed on batch, skipping its segments"
                    );
                }
            }
        }

        slots
    }

    /// 执行一次引擎调用，超时视为失败
    async fn run_batch(
        engine: Arc<dyn TtsEnginePort>,
        batch: Vec<TextSegment>,
        voice: VoiceParams,
        call_timeout: Duration,
    ) -> BatchReport {
        let orders: Vec<usize> = batch.iter().map(TextSegment::order).collect();
        let requests = batch
            .into_iter()
            .map(|segment| SynthesisRequest {
                text: segment.content().to_string(),
                voice: voice.clone(),
            })
            .collect();

        let result = match tokio::time::timeout(call_timeout, engine.synthesize_batch(requests)).await {
            Ok(result) => result,
            Err(_) => Err(TtsError::Timeout),
        };

        let result = result.and_then(|clips| {
            if clips.len() != orders.len() {
                return Err(TtsError::BatchSizeMismatch {
                    sent: orders.len(),
                    received: clips.len(),
                });
            }
            Ok(orders
                .iter()
                .zip(clips)
                .map(|(&segment_order, clip)| SynthesisResult {
                    segment_order,
                    samples: clip.samples,
                    sample_rate: clip.sample_rate,
                })
                .collect())
        });

        BatchReport { orders, result }
    }

    /// 按槽位顺序收集成功结果
    ///
    /// 采样率以第一个成功片段为准，不一致的片段丢弃
    fn collect_in_order(
        chapter_index: ChapterIndex,
        slots: Vec<Option<SynthesisResult>>,
    ) -> Vec<SynthesisResult> {
        let mut expected_rate: Option<u32> = None;
        let mut parts = Vec::with_capacity(slots.len());

        for result in slots.into_iter().flatten() {
            match expected_rate {
                None if result.sample_rate == 0 => {
                    tracing::warn!(
                        chapter_index = %chapter_index,
                        segment = result.segment_order,
                        "Segment reported a zero sample rate, dropping"
                    );
                    continue;
                }
                None => expected_rate = Some(result.sample_rate),
                Some(rate) if rate != result.sample_rate => {
                    tracing::warn!(
                        chapter_index = %chapter_index,
                        segment = result.segment_order,
                        expected = rate,
                        actual = result.sample_rate,
                        "Sample rate mismatch, dropping segment"
                    );
                    continue;
                }
                Some(_) => {}
            }
            parts.push(result);
        }

        parts
    }
}
