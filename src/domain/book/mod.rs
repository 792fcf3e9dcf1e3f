//! Book Context - 有声书限界上下文
//!
//! 职责:
//! - 章节输入实体
//! - 文本片段、章节音频、章节标记
//! - 章节索引与内容哈希（断点续传 key）

mod entities;
mod errors;
mod value_objects;

pub use entities::{Chapter, ChapterAudio, ChapterMarker, TextSegment};
pub use errors::ChapterError;
pub use value_objects::{ChapterIndex, ContentHash};
