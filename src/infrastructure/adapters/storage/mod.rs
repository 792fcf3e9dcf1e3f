//! Storage Adapter - 章节产物存储

mod file_chapter_store;

pub use file_chapter_store::FileChapterStore;
