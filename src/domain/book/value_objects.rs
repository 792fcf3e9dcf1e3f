//! Book Context - Value Objects

use serde::{Deserialize, Serialize};

/// 章节索引（在原始章节列表中的位置）
///
/// 产物文件名由索引零填充生成，目录按名称排序即可还原章节顺序
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ChapterIndex(usize);

impl ChapterIndex {
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn value(&self) -> usize {
        self.0
    }

    /// 产物文件名主干，例如 `chapter_0007`
    pub fn artifact_stem(&self) -> String {
        format!("chapter_{:04}", self.0)
    }
}

impl std::fmt::Display for ChapterIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 章节文本的内容哈希
///
/// 与章节索引一起构成断点续传的幂等 key，源文本变化后旧产物不再被视为完成
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash(String);

impl ContentHash {
    pub fn of_text(text: &str) -> Self {
        Self(format!("{:x}", md5::compute(text.as_bytes())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ContentHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_stem_is_zero_padded() {
        assert_eq!(ChapterIndex::new(0).artifact_stem(), "chapter_0000");
        assert_eq!(ChapterIndex::new(42).artifact_stem(), "chapter_0042");
        assert_eq!(ChapterIndex::new(12345).artifact_stem(), "chapter_12345");
    }

    #[test]
    fn test_artifact_stems_sort_by_index() {
        let mut stems: Vec<String> = [10, 2, 0, 1]
            .iter()
            .map(|&i| ChapterIndex::new(i).artifact_stem())
            .collect();
        stems.sort();
        assert_eq!(
            stems,
            vec!["chapter_0000", "chapter_0001", "chapter_0002", "chapter_0010"]
        );
    }

    #[test]
    fn test_content_hash_tracks_text() {
        let a = ContentHash::of_text("第一章");
        let b = ContentHash::of_text("第一章");
        let c = ContentHash::of_text("第一章 修订");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.as_str().len(), 32);
    }
}
