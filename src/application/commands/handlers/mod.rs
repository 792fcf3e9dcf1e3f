//! Command Handlers 实现

mod build_audiobook_handler;
mod synthesize_chapter_handler;

#[cfg(test)]
pub(crate) mod testing;

pub use build_audiobook_handler::{BuildAudiobookConfig, BuildAudiobookHandler};
pub use synthesize_chapter_handler::{SynthesisConfig, SynthesizeChapterHandler};
