use regex::Regex;
use std::sync::OnceLock;

/// Char-indexed view over a document. Every position handled by the chunkers is
/// a char offset; byte offsets only appear when slicing or running a regex.
pub(crate) struct CharText<'a> {
    text: &'a str,
    chars: Vec<char>,
    // byte offset of each char, plus text.len() as a sentinel
    offsets: Vec<usize>,
}

impl<'a> CharText<'a> {
    pub(crate) fn new(text: &'a str) -> Self {
        let mut chars = Vec::with_capacity(text.len());
        let mut offsets = Vec::with_capacity(text.len() + 1);
        for (byte, ch) in text.char_indices() {
            chars.push(ch);
            offsets.push(byte);
        }
        offsets.push(text.len());
        Self { text, chars, offsets }
    }

    pub(crate) fn len(&self) -> usize {
        self.chars.len()
    }

    pub(crate) fn slice(&self, start: usize, end: usize) -> &'a str {
        &self.text[self.offsets[start]..self.offsets[end]]
    }

    pub(crate) fn char_at(&self, i: usize) -> char {
        self.chars[i]
    }

    /// Char index of a byte offset that lies on a char boundary.
    pub(crate) fn char_index(&self, byte: usize) -> usize {
        self.offsets.binary_search(&byte).unwrap_or_else(|i| i)
    }

    /// Narrow `[start, end)` so it neither starts nor ends with whitespace.
    /// Returns `None` when nothing but whitespace is left.
    pub(crate) fn trim(&self, mut start: usize, mut end: usize) -> Option<(usize, usize)> {
        while start < end && self.chars[start].is_whitespace() {
            start += 1;
        }
        while end > start && self.chars[end - 1].is_whitespace() {
            end -= 1;
        }
        (start < end).then_some((start, end))
    }

    /// Spans of `[start, end)` separated by `'\n'`, newline chars excluded.
    pub(crate) fn lines(&self, start: usize, end: usize) -> Vec<(usize, usize)> {
        let mut spans = Vec::new();
        let mut line_start = start;
        for i in start..end {
            if self.chars[i] == '\n' {
                spans.push((line_start, i));
                line_start = i + 1;
            }
        }
        spans.push((line_start, end));
        spans
    }

    /// Char end positions of every match of `re` inside `[start, end)`.
    pub(crate) fn match_ends(&self, re: &Regex, start: usize, end: usize) -> Vec<usize> {
        let base = self.offsets[start];
        re.find_iter(self.slice(start, end))
            .map(|m| self.char_index(base + m.end()))
            .collect()
    }
}

/// `.`, `!` or `?` followed by optional closing punctuation and whitespace.
pub(crate) fn sentence_end_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"[.!?][\s"')\]}]*"#).unwrap_or_else(|e| unreachable!("static regex: {e}")))
}

/// Terminal punctuation followed by at least one whitespace char.
pub(crate) fn sentence_gap_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[.!?]\s+").unwrap_or_else(|e| unreachable!("static regex: {e}")))
}

/// A blank line: two newlines with only whitespace between them.
pub(crate) fn blank_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n\s*\n").unwrap_or_else(|e| unreachable!("static regex: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slices_by_char_not_byte() {
        let t = CharText::new("héllo wörld");
        assert_eq!(t.len(), 11);
        assert_eq!(t.slice(1, 5), "éllo");
        assert_eq!(t.slice(6, 11), "wörld");
    }

    #[test]
    fn trim_skips_whitespace_only_spans() {
        let t = CharText::new("  ab \n ");
        assert_eq!(t.trim(0, 7), Some((2, 4)));
        assert_eq!(t.trim(4, 7), None);
    }

    #[test]
    fn lines_cover_the_whole_range() {
        let t = CharText::new("a\nbc\n\nd");
        assert_eq!(t.lines(0, t.len()), vec![(0, 1), (2, 4), (5, 5), (6, 7)]);
    }

    #[test]
    fn match_ends_are_char_positions() {
        let t = CharText::new("Ünïcode. Next!");
        let ends = t.match_ends(sentence_end_re(), 0, t.len());
        assert_eq!(ends, vec![9, 14]);
    }
}
