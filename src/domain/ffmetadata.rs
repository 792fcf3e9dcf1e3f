//! 混流器输入渲染
//!
//! - `;FFMETADATA1` 章节元数据
//! - concat 列表（`file '<path>'`）

use std::path::Path;

use super::book::ChapterMarker;

/// 转义元数据自由文本字段
///
/// `\ = ; # \n` 每个字符前加反斜杠，单次从左到右扫描
pub fn escape_ffmetadata(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '\\' | '=' | ';' | '#' | '\n') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// 渲染章节元数据文本
///
/// 作者为空时省略 `artist` 行；时间基为 1/1000（毫秒）
pub fn render_ffmetadata(book_title: &str, book_author: &str, markers: &[ChapterMarker]) -> String {
    let mut out = String::from(";FFMETADATA1\n");
    out.push_str(&format!("title={}\n", escape_ffmetadata(book_title)));
    if !book_author.is_empty() {
        out.push_str(&format!("artist={}\n", escape_ffmetadata(book_author)));
    }
    out.push('\n');

    for marker in markers {
        out.push_str("[CHAPTER]\n");
        out.push_str("TIMEBASE=1/1000\n");
        out.push_str(&format!("START={}\n", marker.start_ms));
        out.push_str(&format!("END={}\n", marker.end_ms));
        out.push_str(&format!("title={}\n\n", escape_ffmetadata(&marker.title)));
    }

    out
}

/// 转义 concat 列表中的路径：`'` 变为 `'\''`
pub fn escape_concat_path(path: &str) -> String {
    path.replace('\'', r"'\''")
}

/// 渲染 concat 列表，每个音频一行，顺序即输出顺序
///
/// 路径应为绝对路径
pub fn render_concat_list<P: AsRef<Path>>(paths: &[P]) -> String {
    let mut out = String::new();
    for path in paths {
        let path = path.as_ref().to_string_lossy();
        out.push_str(&format!("file '{}'\n", escape_concat_path(&path)));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn marker(title: &str, start_ms: u64, end_ms: u64) -> ChapterMarker {
        ChapterMarker {
            title: title.to_string(),
            start_ms,
            end_ms,
        }
    }

    #[test]
    fn test_escape_each_special_char() {
        assert_eq!(escape_ffmetadata("a=b"), r"a\=b");
        assert_eq!(escape_ffmetadata("a;b"), r"a\;b");
        assert_eq!(escape_ffmetadata("a#b"), r"a\#b");
        assert_eq!(escape_ffmetadata(r"a\b"), r"a\\b");
        assert_eq!(escape_ffmetadata("a\nb"), "a\\\nb");
        assert_eq!(escape_ffmetadata("plain 标题"), "plain 标题");
    }

    #[test]
    fn test_escape_single_pass() {
        // 反斜杠只转义一次，不会对新插入的反斜杠再次转义
        assert_eq!(escape_ffmetadata(r"\="), r"\\\=");
        assert_eq!(escape_ffmetadata(";;"), r"\;\;");
    }

    #[test]
    fn test_escaped_field_has_no_bare_specials() {
        let escaped = escape_ffmetadata("Part 1; #2 = \\ end\nnext");
        let mut chars = escaped.chars();
        while let Some(ch) = chars.next() {
            if ch == '\\' {
                let next = chars.next().unwrap();
                assert!(matches!(next, '\\' | '=' | ';' | '#' | '\n'));
            } else {
                assert!(!matches!(ch, '=' | ';' | '#' | '\n'), "bare {:?}", ch);
            }
        }
    }

    #[test]
    fn test_render_full_document() {
        let markers = vec![marker("Chapter 1", 0, 10_000), marker("Chapter 2", 10_000, 15_000)];
        let text = render_ffmetadata("My Book", "Jane Doe", &markers);

        let expected = ";FFMETADATA1\n\
                        title=My Book\n\
                        artist=Jane Doe\n\
                        \n\
                        [CHAPTER]\n\
                        TIMEBASE=1/1000\n\
                        START=0\n\
                        END=10000\n\
                        title=Chapter 1\n\
                        \n\
                        [CHAPTER]\n\
                        TIMEBASE=1/1000\n\
                        START=10000\n\
                        END=15000\n\
                        title=Chapter 2\n\
                        \n";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_render_omits_empty_author() {
        let text = render_ffmetadata("Book", "", &[]);
        assert_eq!(text, ";FFMETADATA1\ntitle=Book\n\n");
        assert!(!text.contains("artist="));
    }

    #[test]
    fn test_render_escapes_titles() {
        let text = render_ffmetadata("A=B", "X;Y", &[marker("#1\nIntro", 0, 1)]);
        assert!(text.contains("title=A\\=B\n"));
        assert!(text.contains("artist=X\\;Y\n"));
        assert!(text.contains("title=\\#1\\\nIntro\n"));
    }

    #[test]
    fn test_concat_list_escapes_quotes() {
        let paths = vec![
            PathBuf::from("/work/chapter_0000.wav"),
            PathBuf::from("/work/it's here/chapter_0002.wav"),
        ];
        let list = render_concat_list(&paths);
        assert_eq!(
            list,
            "file '/work/chapter_0000.wav'\nfile '/work/it'\\''s here/chapter_0002.wav'\n"
        );
    }
}
