//! Grouping of physical lines into logical statements.
//!
//! Two cooperating strategies, used together:
//!
//! 1. [`block_start`] - a cheap indentation/keyword heuristic that
//!    scans upward for the nearest plausible block opener, bounding
//!    where the exact pass has to start;
//! 2. [`LogicalLineFinder`] - the exact pass, which tokenizes from
//!    that bound and groups lines between statement-terminating
//!    newlines. When tokenization reports inconsistent indentation at
//!    line L, the block start is recomputed anchored at L and the pass
//!    retried, up to [`RETRY_BUDGET`] attempts; exhaustion propagates
//!    the structural error (no fallback guessing).
//!
//! [`CachedLogicalLines`] memoizes the full-buffer result as two
//! boolean arrays indexed by line number; it lives and dies with the
//! buffer version it was computed from.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::base::{ParseError, SourceBuffer};
use crate::text::tokens::{self, TokKind, count_line_indents};

/// How many times the exact pass may recompute its block start before
/// giving up. A safety valve, not a guarantee.
pub const RETRY_BUDGET: usize = 5;

static BLOCK_START_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(((def|class|if|elif|except|for|while|with)\s)|((try|else|finally|except)\s*:))")
        .expect("block start pattern is valid")
});

/// Approximate start line of the block containing `lineno`: the
/// nearest line at or above it matching a block-opening pattern with
/// indentation at most `maximum_indents`.
///
/// A block keyword inside a comprehension or generator expression
/// (`[x for x in y if ...]`) is not a real block start; candidates
/// starting with `if`/`for` are rejected when a forward bracket-balance
/// scan over the next few lines goes negative.
pub fn block_start(buf: &SourceBuffer, lineno: usize, maximum_indents: usize) -> usize {
    'candidates: for i in (1..=lineno.min(buf.line_count())).rev() {
        let line = buf.line(i);
        if !BLOCK_START_PATTERN.is_match(line) || count_line_indents(line) > maximum_indents {
            continue;
        }
        let stripped = line.trim_start();
        if (i > 1 && stripped.starts_with("if")) || stripped.starts_with("for") {
            let mut bracs = 0i32;
            for j in i..=(i + 4).min(buf.line_count()) {
                for c in buf.line(j).chars() {
                    if c == '#' {
                        break;
                    }
                    if matches!(c, '[' | '(') {
                        bracs += 1;
                    }
                    if matches!(c, ')' | ']') {
                        bracs -= 1;
                        if bracs < 0 {
                            break;
                        }
                    }
                }
                if bracs < 0 {
                    continue 'candidates;
                }
            }
        }
        return i;
    }
    1
}

/// Exact logical-line grouping via tokenization.
pub struct LogicalLineFinder<'a> {
    buf: &'a SourceBuffer,
}

impl<'a> LogicalLineFinder<'a> {
    pub fn new(buf: &'a SourceBuffer) -> Self {
        Self { buf }
    }

    /// The inclusive `(start, end)` line region of the logical line
    /// containing `line_number`.
    pub fn logical_line_in(&self, line_number: usize) -> Result<(usize, usize), ParseError> {
        let mut indents = count_line_indents(self.buf.line(line_number));
        let mut tries = 0;
        loop {
            let start = block_start(self.buf, line_number, indents);
            match self.block_logical_line(start, line_number) {
                Ok(region) => return Ok(region),
                Err(err) if err.is_retriable() => {
                    tries += 1;
                    if tries == RETRY_BUDGET {
                        return Err(err);
                    }
                    let lineno = (err.line + start - 1).min(self.buf.line_count());
                    indents = count_line_indents(self.buf.line(lineno));
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// All logical regions of the buffer, in order. Tolerant: a
    /// tokenization failure closes the final region at the failure
    /// point instead of propagating.
    pub fn regions(&self) -> Vec<(usize, usize)> {
        let lines: Vec<&str> = (1..=self.buf.line_count()).map(|n| self.buf.line(n)).collect();
        let tokenized = tokens::tokenize_lines(&lines);
        let mut result = Vec::new();
        let mut last_end = 1;
        for tok in &tokenized.tokens {
            if tok.kind == TokKind::Newline {
                let start = self.first_non_blank(last_end);
                if start <= tok.line {
                    result.push((start, tok.line));
                }
                last_end = tok.line + 1;
            }
        }
        result
    }

    fn block_logical_line(
        &self,
        block_start: usize,
        line_number: usize,
    ) -> Result<(usize, usize), ParseError> {
        let lines: Vec<&str> = (block_start..=self.buf.line_count())
            .map(|n| self.buf.line(n))
            .collect();
        let shifted = line_number - block_start + 1;
        let (start, end) = self.calculate_logical(&tokens::tokenize_lines(&lines), shifted)?;
        let real_start = self.first_non_blank(start + block_start - 1);
        let real_end = match end {
            Some(end) => end + block_start - 1,
            None => self.buf.line_count(),
        };
        Ok((real_start, real_end))
    }

    /// Find the region (relative to the tokenized slice) containing
    /// `line_number`. Non-structural tokenization errors truncate the
    /// region at the failure line, mirroring how an unterminated
    /// statement at EOF still gets a best-effort region.
    fn calculate_logical(
        &self,
        tokenized: &tokens::Tokenized,
        line_number: usize,
    ) -> Result<(usize, Option<usize>), ParseError> {
        let mut last_end = 1;
        for tok in &tokenized.tokens {
            if tok.kind == TokKind::Newline {
                if line_number <= tok.line {
                    return Ok((last_end, Some(tok.line)));
                }
                last_end = tok.line + 1;
            }
        }
        match &tokenized.error {
            Some(err) if err.is_retriable() => Err(err.clone()),
            Some(err) => Ok((last_end, Some(err.line))),
            None => Ok((last_end, None)),
        }
    }

    fn first_non_blank(&self, line_number: usize) -> usize {
        let mut current = line_number.max(1);
        while current < self.buf.line_count() {
            let line = self.buf.line(current).trim();
            if !line.is_empty() && !line.starts_with('#') {
                return current;
            }
            current += 1;
        }
        current
    }
}

/// Memoized logical-line index for one buffer version: two boolean
/// arrays, `starts[line]` and `ends[line]`, 1-based.
#[derive(Debug)]
pub struct CachedLogicalLines {
    starts: Vec<bool>,
    ends: Vec<bool>,
}

impl CachedLogicalLines {
    pub fn new(buf: &SourceBuffer) -> Self {
        let mut starts = vec![false; buf.line_count() + 1];
        let mut ends = vec![false; buf.line_count() + 1];
        for (start, end) in LogicalLineFinder::new(buf).regions() {
            if start < starts.len() {
                starts[start] = true;
            }
            if end < ends.len() {
                ends[end] = true;
            }
        }
        Self { starts, ends }
    }

    /// The inclusive region of the logical line containing
    /// `line_number`, walking the start array backward (or, for blank
    /// prefix lines before any start, forward).
    pub fn logical_line_in(&self, line_number: usize) -> (usize, usize) {
        let line_number = line_number.min(self.starts.len() - 1);
        let mut start = line_number;
        while start > 0 && !self.starts[start] {
            start -= 1;
        }
        if start == 0 {
            match (line_number..self.starts.len()).find(|&n| self.starts[n]) {
                Some(next) => start = next,
                None => return (line_number, line_number),
            }
        }
        let end = (start..self.ends.len())
            .find(|&n| self.ends[n])
            .unwrap_or(start);
        (start, end)
    }

    /// Logical-line start lines in `[start_line, end_line)`.
    pub fn starts_between(
        &self,
        start_line: usize,
        end_line: usize,
    ) -> impl Iterator<Item = usize> + '_ {
        (start_line..end_line.min(self.starts.len())).filter(|&n| self.starts[n])
    }

    pub fn is_logical_start(&self, line_number: usize) -> bool {
        self.starts.get(line_number).copied().unwrap_or(false)
    }

    pub fn is_logical_end(&self, line_number: usize) -> bool {
        self.ends.get(line_number).copied().unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regions_partition_simple_module() {
        let buf = SourceBuffer::new("a = 1\nb = 2\n\nc = 3\n");
        let finder = LogicalLineFinder::new(&buf);
        assert_eq!(finder.regions(), vec![(1, 1), (2, 2), (4, 4)]);
    }

    #[test]
    fn test_regions_multi_line_statement() {
        let buf = SourceBuffer::new("x = f(1,\n      2,\n      3)\ny = 2\n");
        let finder = LogicalLineFinder::new(&buf);
        assert_eq!(finder.regions(), vec![(1, 3), (4, 4)]);
    }

    #[test]
    fn test_regions_no_gaps_no_overlaps() {
        let text = "def f(a,\n      b):\n    x = (a +\n         b)\n    return x\n";
        let buf = SourceBuffer::new(text);
        let regions = LogicalLineFinder::new(&buf).regions();
        assert_eq!(regions, vec![(1, 2), (3, 4), (5, 5)]);
        // Each non-blank line falls in exactly one region.
        for line in 1..=5 {
            let count = regions
                .iter()
                .filter(|(s, e)| *s <= line && line <= *e)
                .count();
            assert_eq!(count, 1, "line {line}");
        }
    }

    #[test]
    fn test_logical_line_in_continuation() {
        let buf = SourceBuffer::new("a = 1\nx = f(1,\n      2)\nb = 2\n");
        let finder = LogicalLineFinder::new(&buf);
        assert_eq!(finder.logical_line_in(2).unwrap(), (2, 3));
        assert_eq!(finder.logical_line_in(3).unwrap(), (2, 3));
        assert_eq!(finder.logical_line_in(4).unwrap(), (4, 4));
    }

    #[test]
    fn test_block_start_finds_enclosing_def() {
        let text = "def f():\n    a = 1\n    b = 2\n";
        let buf = SourceBuffer::new(text);
        assert_eq!(block_start(&buf, 3, 4), 1);
    }

    #[test]
    fn test_block_start_ignores_comprehension_keywords() {
        let text =
            "def f():\n    xs = [x\n          for x in ys\n          if x]\n    return xs\n";
        let buf = SourceBuffer::new(text);
        // Neither the `for` nor the `if` inside the comprehension is a
        // real block start.
        assert_eq!(block_start(&buf, 5, 4), 1);
    }

    #[test]
    fn test_cached_lines_match_finder() {
        let text = "a = 1\nx = f(1,\n      2)\nb = 2\n";
        let buf = SourceBuffer::new(text);
        let cached = CachedLogicalLines::new(&buf);
        assert_eq!(cached.logical_line_in(3), (2, 3));
        assert!(cached.is_logical_start(2));
        assert!(cached.is_logical_end(3));
        assert!(!cached.is_logical_start(3));
        let starts: Vec<usize> = cached.starts_between(1, 5).collect();
        assert_eq!(starts, vec![1, 2, 4]);
    }

    #[test]
    fn test_blank_line_maps_forward_to_next_start() {
        let buf = SourceBuffer::new("\n\na = 1\n");
        let cached = CachedLogicalLines::new(&buf);
        assert_eq!(cached.logical_line_in(1), (3, 3));
    }

    #[test]
    fn test_retry_budget_exhaustion_propagates() {
        // Inconsistent dedent that no block-start recomputation fixes.
        let text = "if x:\n        a = 1\n      b = 2\n";
        let buf = SourceBuffer::new(text);
        let finder = LogicalLineFinder::new(&buf);
        let err = finder.logical_line_in(3).unwrap_err();
        assert!(err.is_retriable());
    }
}
