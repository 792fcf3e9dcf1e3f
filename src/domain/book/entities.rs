//! Book Context - Entities

use serde::{Deserialize, Serialize};

use super::{ChapterError, ChapterIndex};

/// 章节 - 外部抽取器产出的只读输入
///
/// 不变量:
/// - text 不可为空
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    title: String,
    text: String,
}

impl Chapter {
    pub fn new(title: impl Into<String>, text: impl Into<String>) -> Result<Self, ChapterError> {
        let title = title.into();
        let text = text.into();
        if text.trim().is_empty() {
            return Err(ChapterError::EmptyText(title));
        }
        Ok(Self { title, text })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// 文本片段 - 单次合成调用的文本单位
///
/// 不变量:
/// - order 在章节内唯一且有序
/// - 字符数不超过配置上限，无法再分割的子句除外
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextSegment {
    order: usize,
    content: String,
}

impl TextSegment {
    pub fn new(order: usize, content: String) -> Self {
        Self { order, content }
    }

    pub fn order(&self) -> usize {
        self.order
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// 字符数（按 Unicode 标量计）
    pub fn char_len(&self) -> usize {
        self.content.chars().count()
    }
}

/// 章节音频 - 片段音频按顺序首尾拼接后的结果
#[derive(Debug, Clone, PartialEq)]
pub struct ChapterAudio {
    chapter_index: ChapterIndex,
    samples: Vec<f32>,
    sample_rate: u32,
}

impl ChapterAudio {
    pub fn new(
        chapter_index: ChapterIndex,
        samples: Vec<f32>,
        sample_rate: u32,
    ) -> Result<Self, ChapterError> {
        if sample_rate == 0 {
            return Err(ChapterError::InvalidSampleRate);
        }
        Ok(Self {
            chapter_index,
            samples,
            sample_rate,
        })
    }

    /// 按顺序拼接多段采样（不重采样、不交叉淡化）
    ///
    /// 所有片段的采样率必须一致
    pub fn concat(
        chapter_index: ChapterIndex,
        parts: impl IntoIterator<Item = (Vec<f32>, u32)>,
    ) -> Result<Self, ChapterError> {
        let mut samples = Vec::new();
        let mut rate: Option<u32> = None;
        for (part, part_rate) in parts {
            match rate {
                None => rate = Some(part_rate),
                Some(expected) if expected != part_rate => {
                    return Err(ChapterError::SampleRateMismatch {
                        expected,
                        actual: part_rate,
                    });
                }
                Some(_) => {}
            }
            samples.extend(part);
        }
        Self::new(chapter_index, samples, rate.unwrap_or(0))
    }

    pub fn chapter_index(&self) -> ChapterIndex {
        self.chapter_index
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn sample_count(&self) -> u64 {
        self.samples.len() as u64
    }

    /// 时长（毫秒，向下取整）
    pub fn duration_ms(&self) -> u64 {
        self.sample_count() * 1000 / self.sample_rate as u64
    }
}

/// 章节标记 - 章节在最终音轨中的起止时间（毫秒）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterMarker {
    pub title: String,
    pub start_ms: u64,
    pub end_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chapter_rejects_blank_text() {
        assert!(Chapter::new("序章", "").is_err());
        assert!(Chapter::new("序章", "  \n ").is_err());
        let chapter = Chapter::new("序章", "正文。").unwrap();
        assert_eq!(chapter.title(), "序章");
        assert_eq!(chapter.text(), "正文。");
    }

    #[test]
    fn test_duration_from_samples() {
        let audio = ChapterAudio::new(ChapterIndex::new(0), vec![0.0; 24_000 * 3], 24_000).unwrap();
        assert_eq!(audio.duration_ms(), 3000);

        let empty = ChapterAudio::new(ChapterIndex::new(1), Vec::new(), 16_000).unwrap();
        assert_eq!(empty.duration_ms(), 0);
    }

    #[test]
    fn test_concat_preserves_part_order() {
        let audio = ChapterAudio::concat(
            ChapterIndex::new(2),
            vec![(vec![0.1, 0.2], 8000), (vec![0.3], 8000), (vec![0.4, 0.5], 8000)],
        )
        .unwrap();
        assert_eq!(audio.samples(), &[0.1, 0.2, 0.3, 0.4, 0.5]);
        assert_eq!(audio.sample_rate(), 8000);
    }

    #[test]
    fn test_concat_rejects_mixed_sample_rates() {
        let err = ChapterAudio::concat(
            ChapterIndex::new(0),
            vec![(vec![0.0], 24_000), (vec![0.0], 16_000)],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ChapterError::SampleRateMismatch {
                expected: 24_000,
                actual: 16_000
            }
        ));
    }

    #[test]
    fn test_concat_of_nothing_is_invalid() {
        assert!(ChapterAudio::concat(ChapterIndex::new(0), Vec::new()).is_err());
    }
}
