//! 文本分割器
//!
//! 把章节正文切成长度受限的片段，每个片段对应一次合成调用。
//!
//! 切分分两级：
//! 1. 句子级：句末标点（`.!?。！？`）后跟空白处切开
//! 2. 子句级：单句超长时，在子句标点（`,;:，；：`）后跟空白处再切
//!
//! 相邻单位用单个空格拼接，拼接后的字符数不超过 `max_chars`。
//! 没有可切分点的超长子句整体输出，不截断内容。

use super::book::TextSegment;

/// 默认片段最大字符数
pub const DEFAULT_MAX_CHARS: usize = 500;

/// 切分规则：一组边界标点，标点后必须跟空白才算边界
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundaryRule {
    pub name: &'static str,
    pub terminals: &'static [char],
}

impl BoundaryRule {
    #[inline]
    fn is_terminal(&self, ch: char) -> bool {
        self.terminals.contains(&ch)
    }
}

/// 句子级边界
pub const SENTENCE_RULE: BoundaryRule = BoundaryRule {
    name: "sentence",
    terminals: &['.', '!', '?', '。', '！', '？'],
};

/// 子句级边界
pub const CLAUSE_RULE: BoundaryRule = BoundaryRule {
    name: "clause",
    terminals: &[',', ';', ':', '，', '；', '：'],
};

/// 文本分割配置
#[derive(Debug, Clone)]
pub struct SegmentConfig {
    /// 片段最大字符数
    pub max_chars: usize,
    pub sentence_rule: BoundaryRule,
    pub clause_rule: BoundaryRule,
}

impl SegmentConfig {
    pub fn with_max_chars(max_chars: usize) -> Self {
        Self {
            max_chars,
            ..Default::default()
        }
    }
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            max_chars: DEFAULT_MAX_CHARS,
            sentence_rule: SENTENCE_RULE,
            clause_rule: CLAUSE_RULE,
        }
    }
}

/// 按规则切分（边界标点保留在前一单位末尾，边界后的空白丢弃）
fn split_units<'a>(text: &'a str, rule: &BoundaryRule) -> Vec<&'a str> {
    let mut units = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((pos, ch)) = chars.next() {
        if !rule.is_terminal(ch) {
            continue;
        }

        let end = pos + ch.len_utf8();
        let mut next_start = end;
        while let Some(&(p, c)) = chars.peek() {
            if !c.is_whitespace() {
                break;
            }
            next_start = p + c.len_utf8();
            chars.next();
        }

        if next_start > end {
            units.push(&text[start..end]);
            start = next_start;
        }
    }
    units.push(&text[start..]);

    units
        .into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// 累积缓冲区：装不下下一个单位时先输出当前缓冲
struct Accumulator<'a> {
    max_chars: usize,
    buffer: Vec<&'a str>,
    length: usize,
    segments: Vec<String>,
}

impl<'a> Accumulator<'a> {
    fn new(max_chars: usize) -> Self {
        Self {
            max_chars,
            buffer: Vec::new(),
            length: 0,
            segments: Vec::new(),
        }
    }

    fn push(&mut self, unit: &'a str) {
        let unit_len = unit.chars().count();
        if !self.buffer.is_empty() && self.length + 1 + unit_len > self.max_chars {
            self.flush();
        }
        self.length += if self.buffer.is_empty() {
            unit_len
        } else {
            1 + unit_len
        };
        self.buffer.push(unit);
    }

    fn flush(&mut self) {
        if self.buffer.is_empty() {
            return;
        }
        self.segments.push(self.buffer.join(" "));
        self.buffer.clear();
        self.length = 0;
    }

    fn finish(mut self) -> Vec<String> {
        self.flush();
        self.segments
    }
}

/// 对章节正文进行分段
///
/// 纯函数，结果只取决于输入，可重复执行（断点续传依赖这一点）
pub fn segment_text(text: &str, config: &SegmentConfig) -> Vec<TextSegment> {
    let mut acc = Accumulator::new(config.max_chars);

    for sentence in split_units(text, &config.sentence_rule) {
        if sentence.chars().count() <= config.max_chars {
            acc.push(sentence);
            continue;
        }

        // 超长句：先清空缓冲，再按子句累积
        acc.flush();
        for clause in split_units(sentence, &config.clause_rule) {
            acc.push(clause);
        }
    }

    acc.finish()
        .into_iter()
        .enumerate()
        .map(|(order, content)| TextSegment::new(order, content))
        .collect()
}
