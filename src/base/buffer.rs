use super::Span;

/// Immutable source text plus a derived line-start index.
///
/// Built once per buffer version and replaced wholesale when the text
/// changes; nothing in this type is ever mutated in place. Offsets are
/// character offsets, lines are 1-based. A trailing newline produces a
/// final empty line, so every offset (including `len_chars()`) maps to
/// some line.
///
/// Note: construction is O(n) in the text size; callers are expected to
/// hold on to the buffer rather than rebuilding it per query.
#[derive(Debug)]
pub struct SourceBuffer {
    text: String,
    chars: Vec<char>,
    /// Character offset of the start of each 1-based line.
    line_starts: Vec<usize>,
    /// Line contents without their terminating newline.
    lines: Vec<String>,
}

impl SourceBuffer {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let chars: Vec<char> = text.chars().collect();
        let lines: Vec<String> = text.split('\n').map(str::to_string).collect();
        let mut line_starts = Vec::with_capacity(lines.len());
        let mut offset = 0;
        for line in &lines {
            line_starts.push(offset);
            offset += line.chars().count() + 1;
        }
        Self {
            text,
            chars,
            line_starts,
            lines,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn chars(&self) -> &[char] {
        &self.chars
    }

    pub fn len_chars(&self) -> usize {
        self.chars.len()
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Content of the 1-based line `n`, without its newline.
    pub fn line(&self, n: usize) -> &str {
        &self.lines[n - 1]
    }

    /// The 1-based line containing `offset`.
    ///
    /// Offsets at or past the end of the buffer clamp to the last line.
    pub fn line_of_offset(&self, offset: usize) -> usize {
        let idx = self.line_starts.partition_point(|&start| start <= offset);
        idx.max(1)
    }

    /// Character offset of the start of line `n`.
    pub fn line_start(&self, n: usize) -> usize {
        self.line_starts[n - 1]
    }

    /// Character offset of the end of line `n` (its newline, or EOF).
    pub fn line_end(&self, n: usize) -> usize {
        self.line_starts[n - 1] + self.lines[n - 1].chars().count()
    }

    /// The text covered by `span`, as a fresh string.
    pub fn slice(&self, span: Span) -> String {
        self.chars[span.start.min(self.chars.len())..span.end.min(self.chars.len())]
            .iter()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_starts() {
        let buf = SourceBuffer::new("def f():\n    pass\n");
        assert_eq!(buf.line_count(), 3);
        assert_eq!(buf.line(1), "def f():");
        assert_eq!(buf.line(2), "    pass");
        assert_eq!(buf.line(3), "");
        assert_eq!(buf.line_start(1), 0);
        assert_eq!(buf.line_start(2), 9);
        assert_eq!(buf.line_end(1), 8);
    }

    #[test]
    fn test_line_of_offset() {
        let buf = SourceBuffer::new("a\nbb\nccc");
        assert_eq!(buf.line_of_offset(0), 1);
        assert_eq!(buf.line_of_offset(1), 1); // the newline itself
        assert_eq!(buf.line_of_offset(2), 2);
        assert_eq!(buf.line_of_offset(4), 2);
        assert_eq!(buf.line_of_offset(5), 3);
        assert_eq!(buf.line_of_offset(7), 3);
        // Past the end clamps to the last line.
        assert_eq!(buf.line_of_offset(100), 3);
    }

    #[test]
    fn test_empty_buffer_has_one_line() {
        let buf = SourceBuffer::new("");
        assert_eq!(buf.line_count(), 1);
        assert_eq!(buf.line(1), "");
        assert_eq!(buf.line_of_offset(0), 1);
    }

    #[test]
    fn test_slice_clamps_to_buffer() {
        let buf = SourceBuffer::new("abc");
        assert_eq!(buf.slice(Span::new(1, 3)), "bc");
        assert_eq!(buf.slice(Span::new(1, 10)), "bc");
    }
}
