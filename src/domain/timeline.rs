//! 章节时间线
//!
//! 按最终输出顺序累加章节时长，得到首尾相接的章节标记

use thiserror::Error;

use super::book::ChapterMarker;

#[derive(Debug, Error)]
pub enum TimelineError {
    #[error("chapter durations ({durations}) and titles ({titles}) must have the same length")]
    LengthMismatch { durations: usize, titles: usize },
}

/// 计算章节标记
///
/// `durations_ms` 与 `titles` 必须来自同一个已过滤（跳过失败章节）且保持顺序的列表，
/// 被跳过的章节既不产生标记也不产生空隙
pub fn compute_markers<S: AsRef<str>>(
    durations_ms: &[u64],
    titles: &[S],
) -> Result<Vec<ChapterMarker>, TimelineError> {
    if durations_ms.len() != titles.len() {
        return Err(TimelineError::LengthMismatch {
            durations: durations_ms.len(),
            titles: titles.len(),
        });
    }

    let mut cursor = 0u64;
    let markers = durations_ms
        .iter()
        .zip(titles)
        .map(|(&duration, title)| {
            let marker = ChapterMarker {
                title: title.as_ref().to_string(),
                start_ms: cursor,
                end_ms: cursor + duration,
            };
            cursor = marker.end_ms;
            marker
        })
        .collect();

    Ok(markers)
}
