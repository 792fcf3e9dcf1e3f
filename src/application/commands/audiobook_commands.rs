//! Audiobook Commands - 整书流水线命令

use std::path::PathBuf;

use crate::application::ports::VoiceParams;
use crate::domain::{Chapter, ChapterIndex, ChapterMarker};

/// 把章节列表合成为一个带章节标记的音频文件
#[derive(Debug, Clone)]
pub struct BuildAudiobook {
    pub chapters: Vec<Chapter>,
    pub voice: VoiceParams,
    pub book_title: String,
    pub book_author: String,
    pub output_path: PathBuf,
}

/// 流水线执行结果
#[derive(Debug, Clone)]
pub struct BuildAudiobookResponse {
    pub output_path: PathBuf,
    pub markers: Vec<ChapterMarker>,
    /// 本次合成的章节数
    pub synthesized: usize,
    /// 复用的章节数
    pub resumed: usize,
    /// 被跳过的章节
    pub skipped: Vec<ChapterIndex>,
}
