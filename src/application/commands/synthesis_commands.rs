//! Synthesis Commands - 单章节合成命令

use crate::application::ports::{ChapterArtifact, VoiceParams};
use crate::domain::{Chapter, ChapterIndex};

/// 合成单个章节
#[derive(Debug, Clone)]
pub struct SynthesizeChapter {
    pub chapter_index: ChapterIndex,
    pub chapter: Chapter,
    pub voice: VoiceParams,
}

/// 片段合成结果，按 segment_order 放回原位
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisResult {
    pub segment_order: usize,
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

/// 章节被跳过的原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// 分段后没有任何文本
    NoSegments,
    /// 所有片段均合成失败
    AllSegmentsFailed { segments: usize },
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoSegments => write!(f, "no text segments"),
            Self::AllSegmentsFailed { segments } => {
                write!(f, "all {} segments failed", segments)
            }
        }
    }
}

/// 单章节合成结果
#[derive(Debug, Clone, PartialEq)]
pub enum ChapterOutcome {
    /// 本次运行合成（可能缺少部分片段）
    Synthesized {
        artifact: ChapterArtifact,
        missing_segments: usize,
    },
    /// 复用之前运行的产物
    Resumed(ChapterArtifact),
    /// 没有产生音频，不输出、不计入章节标记
    Skipped {
        chapter_index: ChapterIndex,
        reason: SkipReason,
    },
}

impl ChapterOutcome {
    pub fn artifact(&self) -> Option<&ChapterArtifact> {
        match self {
            Self::Synthesized { artifact, .. } | Self::Resumed(artifact) => Some(artifact),
            Self::Skipped { .. } => None,
        }
    }
}
