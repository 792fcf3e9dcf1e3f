//! Domain Layer - 领域层
//!
//! Book Context 以及纯函数组件:
//! - 文本分割器
//! - 章节时间线
//! - 章节元数据 / concat 列表渲染

pub mod book;

mod ffmetadata;
mod text_segmenter;
mod timeline;

pub use book::{Chapter, ChapterAudio, ChapterError, ChapterIndex, ChapterMarker, ContentHash, TextSegment};
pub use ffmetadata::{escape_concat_path, escape_ffmetadata, render_concat_list, render_ffmetadata};
pub use text_segmenter::{
    segment_text, BoundaryRule, SegmentConfig, CLAUSE_RULE, DEFAULT_MAX_CHARS, SENTENCE_RULE,
};
pub use timeline::{compute_markers, TimelineError};
