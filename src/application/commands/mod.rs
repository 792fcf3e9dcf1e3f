//! Commands - 用例命令及处理器

mod audiobook_commands;
mod synthesis_commands;

pub mod handlers;

pub use audiobook_commands::{BuildAudiobook, BuildAudiobookResponse};
pub use synthesis_commands::{ChapterOutcome, SkipReason, SynthesisResult, SynthesizeChapter};
