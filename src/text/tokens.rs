//! Indentation-sensitive tokenizer for Python-shaped source.
//!
//! Produces the token stream the logical-line segmenter and the
//! statement parser consume. Newlines inside bracket groups and after
//! `\` continuations are non-logical ([`TokKind::Nl`]); a statement is
//! terminated only by a logical [`TokKind::Newline`]. Indentation is
//! tracked with an indent stack; a dedent that matches no enclosing
//! level is the structural error the segmenter retries on.
//!
//! Tokenization is tolerant: on error the tokens scanned so far are
//! kept alongside the error, because the segmenter wants the partial
//! stream (a region ending at the failure point) while strict parsing
//! wants the error itself.

use crate::base::{ParseError, ParseErrorKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokKind {
    Name,
    Number,
    Str,
    Op,
    /// Logical end of statement.
    Newline,
    /// Non-logical newline (blank line, inside brackets, continuation).
    Nl,
    Indent,
    Dedent,
    Comment,
    EndMarker,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokKind,
    pub text: String,
    /// 1-based line the token starts on, relative to the tokenized
    /// slice of lines.
    pub line: usize,
}

impl Token {
    fn new(kind: TokKind, text: impl Into<String>, line: usize) -> Self {
        Self {
            kind,
            text: text.into(),
            line,
        }
    }

    pub fn is(&self, kind: TokKind, text: &str) -> bool {
        self.kind == kind && self.text == text
    }
}

/// Result of tokenizing: all tokens up to the first error, if any.
#[derive(Debug)]
pub struct Tokenized {
    pub tokens: Vec<Token>,
    pub error: Option<ParseError>,
}

impl Tokenized {
    pub fn into_result(self) -> Result<Vec<Token>, ParseError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.tokens),
        }
    }
}

/// Number of indentation columns at the start of `line` (tab = 8).
pub fn count_line_indents(line: &str) -> usize {
    let mut indents = 0;
    for c in line.chars() {
        match c {
            ' ' => indents += 1,
            '\t' => indents += 8,
            _ => return indents,
        }
    }
    // An all-whitespace line has no indentation of its own.
    0
}

// Longest first so e.g. `**=` wins over `**` and `*`.
const MULTI_OPS: &[&str] = &[
    "**=", "//=", ">>=", "<<=", "...", "==", "!=", "<=", ">=", "->", "+=", "-=", "*=", "/=", "%=",
    "&=", "|=", "^=", "**", "//", "<<", ">>",
];

pub fn tokenize(text: &str) -> Tokenized {
    let lines: Vec<&str> = text.split('\n').collect();
    tokenize_lines(&lines)
}

/// Tokenize a slice of physical lines (without trailing newlines).
pub fn tokenize_lines(lines: &[&str]) -> Tokenized {
    let mut tokenizer = Tokenizer::new(lines);
    tokenizer.run()
}

struct Tokenizer<'a> {
    lines: &'a [&'a str],
    tokens: Vec<Token>,
    indents: Vec<usize>,
    depth: usize,
    /// Set when the previous physical line ended in `\`.
    continuation: bool,
    /// Whether the current logical line has produced any real token.
    had_content: bool,
}

impl<'a> Tokenizer<'a> {
    fn new(lines: &'a [&'a str]) -> Self {
        Self {
            lines,
            tokens: Vec::new(),
            indents: vec![0],
            depth: 0,
            continuation: false,
            had_content: false,
        }
    }

    fn run(&mut self) -> Tokenized {
        let mut lineno = 0;
        while lineno < self.lines.len() {
            match self.line(lineno) {
                Ok(next) => lineno = next,
                Err(err) => {
                    return Tokenized {
                        tokens: std::mem::take(&mut self.tokens),
                        error: Some(err),
                    };
                }
            }
        }
        let last = self.lines.len();
        if self.had_content || self.continuation {
            // EOF inside a statement: close it so consumers see an end.
            self.tokens.push(Token::new(TokKind::Newline, "", last));
        }
        let error = if self.depth > 0 {
            Some(ParseError::new(ParseErrorKind::UnmatchedBracket, last))
        } else {
            None
        };
        while self.indents.len() > 1 {
            self.indents.pop();
            self.tokens.push(Token::new(TokKind::Dedent, "", last));
        }
        self.tokens.push(Token::new(TokKind::EndMarker, "", last));
        Tokenized {
            tokens: std::mem::take(&mut self.tokens),
            error,
        }
    }

    /// Tokenize the physical line at index `lineno` (and any further
    /// lines a triple-quoted string spans); returns the next index.
    fn line(&mut self, lineno: usize) -> Result<usize, ParseError> {
        let line = self.lines[lineno];
        let display_line = lineno + 1;
        let fresh_statement = self.depth == 0 && !self.continuation;
        self.continuation = false;

        let trimmed = line.trim_start();
        if fresh_statement {
            if trimmed.is_empty() || trimmed.starts_with('#') {
                if !trimmed.is_empty() {
                    self.tokens
                        .push(Token::new(TokKind::Comment, trimmed, display_line));
                }
                self.tokens.push(Token::new(TokKind::Nl, "", display_line));
                return Ok(lineno + 1);
            }
            self.handle_indent(count_line_indents(line), display_line)?;
            self.had_content = false;
        }

        let chars: Vec<char> = line.chars().collect();
        let mut i = chars
            .iter()
            .position(|c| !matches!(c, ' ' | '\t'))
            .unwrap_or(chars.len());

        while i < chars.len() {
            let c = chars[i];
            match c {
                ' ' | '\t' => i += 1,
                '#' => {
                    let text: String = chars[i..].iter().collect();
                    self.tokens.push(Token::new(TokKind::Comment, text, display_line));
                    break;
                }
                '\\' if i + 1 == chars.len() => {
                    self.continuation = true;
                    i += 1;
                }
                '\'' | '"' => {
                    let (tok, after, next) = self.string(lineno, &chars, i)?;
                    self.tokens.push(tok);
                    self.had_content = true;
                    if next != lineno {
                        // Triple-quoted string consumed further lines;
                        // resume tokenizing there.
                        return self.resume_after_string(next, after);
                    }
                    i = after;
                }
                _ if unicode_ident::is_xid_start(c) || c == '_' => {
                    let start = i;
                    while i < chars.len() && unicode_ident::is_xid_continue(chars[i]) {
                        i += 1;
                    }
                    let text: String = chars[start..i].iter().collect();
                    self.tokens.push(Token::new(TokKind::Name, text, display_line));
                    self.had_content = true;
                }
                _ if c.is_ascii_digit() => {
                    let start = i;
                    while i < chars.len()
                        && (chars[i].is_ascii_alphanumeric() || chars[i] == '.' || chars[i] == '_')
                    {
                        i += 1;
                    }
                    let text: String = chars[start..i].iter().collect();
                    self.tokens.push(Token::new(TokKind::Number, text, display_line));
                    self.had_content = true;
                }
                '(' | '[' | '{' => {
                    self.depth += 1;
                    self.tokens.push(Token::new(TokKind::Op, c.to_string(), display_line));
                    self.had_content = true;
                    i += 1;
                }
                ')' | ']' | '}' => {
                    if self.depth == 0 {
                        return Err(ParseError::new(
                            ParseErrorKind::UnmatchedBracket,
                            display_line,
                        ));
                    }
                    self.depth -= 1;
                    self.tokens.push(Token::new(TokKind::Op, c.to_string(), display_line));
                    self.had_content = true;
                    i += 1;
                }
                _ => {
                    let rest: String = chars[i..].iter().collect();
                    let op = MULTI_OPS
                        .iter()
                        .find(|op| rest.starts_with(**op))
                        .map(|op| op.to_string())
                        .unwrap_or_else(|| c.to_string());
                    i += op.chars().count();
                    self.tokens.push(Token::new(TokKind::Op, op, display_line));
                    self.had_content = true;
                }
            }
        }

        self.end_of_physical_line(display_line);
        Ok(lineno + 1)
    }

    fn end_of_physical_line(&mut self, display_line: usize) {
        if self.depth == 0 && !self.continuation && self.had_content {
            self.tokens.push(Token::new(TokKind::Newline, "", display_line));
            self.had_content = false;
        } else {
            self.tokens.push(Token::new(TokKind::Nl, "", display_line));
        }
    }

    /// Continue tokenizing line `lineno` from char column `col` after a
    /// multi-line string ended there.
    fn resume_after_string(&mut self, lineno: usize, col: usize) -> Result<usize, ParseError> {
        let chars: Vec<char> = self.lines[lineno].chars().collect();
        let display_line = lineno + 1;
        let mut i = col;
        while i < chars.len() {
            match chars[i] {
                ' ' | '\t' => i += 1,
                _ => break,
            }
        }
        if i < chars.len() {
            // Re-tokenize the remainder as a synthetic line; indent
            // handling is skipped because we are mid-statement.
            let rest: String = chars[i..].iter().collect();
            let rest_lines = [rest.as_str()];
            let mut inner = Tokenizer::new(&rest_lines);
            inner.depth = self.depth;
            inner.had_content = true;
            inner.indents = vec![0];
            let result = inner.run();
            let inner_continuation = inner.continuation;
            self.depth = inner.depth;
            for tok in result.tokens {
                match tok.kind {
                    TokKind::EndMarker | TokKind::Dedent => {}
                    TokKind::Newline | TokKind::Nl => {}
                    _ => self
                        .tokens
                        .push(Token::new(tok.kind, tok.text, display_line)),
                }
            }
            if let Some(err) = result.error {
                return Err(ParseError::new(err.kind, display_line));
            }
            self.continuation = inner_continuation;
        }
        self.had_content = true;
        self.end_of_physical_line(display_line);
        Ok(lineno + 1)
    }

    /// Scan a string literal starting at `chars[start]` on `lineno`.
    /// Returns the token, the char column after it, and the line it
    /// ended on (differs for triple-quoted strings).
    fn string(
        &mut self,
        lineno: usize,
        chars: &[char],
        start: usize,
    ) -> Result<(Token, usize, usize), ParseError> {
        let quote = chars[start];
        let display_line = lineno + 1;
        let triple = chars.len() >= start + 3
            && chars[start + 1] == quote
            && chars[start + 2] == quote;
        if !triple {
            let mut i = start + 1;
            while i < chars.len() {
                if chars[i] == '\\' {
                    i += 2;
                    continue;
                }
                if chars[i] == quote {
                    let text: String = chars[start..=i].iter().collect();
                    return Ok((Token::new(TokKind::Str, text, display_line), i + 1, lineno));
                }
                i += 1;
            }
            return Err(ParseError::new(
                ParseErrorKind::UnterminatedString,
                display_line,
            ));
        }
        // Triple-quoted: may span physical lines.
        let closer: String = std::iter::repeat(quote).take(3).collect();
        let mut text = String::new();
        let mut current_line = lineno;
        let mut current: Vec<char> = chars[start..].to_vec();
        let mut skip = 3; // past the opening quotes
        loop {
            let line_str: String = current.iter().collect();
            if let Some(pos) = find_unescaped(&line_str, &closer, skip) {
                text.push_str(&line_str[..pos + 3]);
                let consumed_chars = line_str[..pos + 3].chars().count();
                let col = if current_line == lineno {
                    start + consumed_chars
                } else {
                    consumed_chars
                };
                return Ok((
                    Token::new(TokKind::Str, text, display_line),
                    col,
                    current_line,
                ));
            }
            text.push_str(&line_str);
            text.push('\n');
            self.tokens
                .push(Token::new(TokKind::Nl, "", current_line + 1));
            current_line += 1;
            if current_line >= self.lines.len() {
                return Err(ParseError::new(
                    ParseErrorKind::UnterminatedString,
                    current_line,
                ));
            }
            current = self.lines[current_line].chars().collect();
            skip = 0;
        }
    }

    fn handle_indent(&mut self, indent: usize, display_line: usize) -> Result<(), ParseError> {
        let top = *self.indents.last().unwrap_or(&0);
        if indent > top {
            self.indents.push(indent);
            self.tokens.push(Token::new(TokKind::Indent, "", display_line));
        } else if indent < top {
            while let Some(&level) = self.indents.last() {
                if level <= indent {
                    break;
                }
                self.indents.pop();
                self.tokens.push(Token::new(TokKind::Dedent, "", display_line));
            }
            if *self.indents.last().unwrap_or(&0) != indent {
                return Err(ParseError::new(
                    ParseErrorKind::InconsistentIndentation,
                    display_line,
                ));
            }
        }
        Ok(())
    }
}

/// Byte position of `closer` in `line` at or after byte `skip`,
/// ignoring occurrences preceded by a backslash.
fn find_unescaped(line: &str, closer: &str, skip: usize) -> Option<usize> {
    let mut from = skip.min(line.len());
    while let Some(rel) = line[from..].find(closer) {
        let pos = from + rel;
        if pos == 0 || !line[..pos].ends_with('\\') {
            return Some(pos);
        }
        from = pos + 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(text: &str) -> Vec<TokKind> {
        tokenize(text).tokens.iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_simple_statement_ends_in_newline() {
        let toks = tokenize("a = 1").tokens;
        assert!(toks.iter().any(|t| t.is(TokKind::Name, "a")));
        assert!(toks.iter().any(|t| t.kind == TokKind::Newline));
        assert_eq!(toks.last().unwrap().kind, TokKind::EndMarker);
    }

    #[test]
    fn test_newline_suppressed_inside_brackets() {
        let text = "f(a,\n  b)\nx = 1\n";
        let toks = tokenize(text).tokens;
        let newlines: Vec<usize> = toks
            .iter()
            .filter(|t| t.kind == TokKind::Newline)
            .map(|t| t.line)
            .collect();
        assert_eq!(newlines, vec![2, 3]);
    }

    #[test]
    fn test_backslash_continuation() {
        let text = "a = 1 + \\\n    2\n";
        let toks = tokenize(text).tokens;
        let newlines: Vec<usize> = toks
            .iter()
            .filter(|t| t.kind == TokKind::Newline)
            .map(|t| t.line)
            .collect();
        assert_eq!(newlines, vec![2]);
    }

    #[test]
    fn test_indent_dedent() {
        let text = "def f():\n    a = 1\nb = 2\n";
        let k = kinds(text);
        assert!(k.contains(&TokKind::Indent));
        assert!(k.contains(&TokKind::Dedent));
    }

    #[test]
    fn test_inconsistent_dedent_is_structural_error() {
        let text = "if x:\n        a = 1\n    b = 2\n";
        let result = tokenize(text);
        let err = result.error.expect("expected indentation error");
        assert_eq!(err.kind, ParseErrorKind::InconsistentIndentation);
        assert_eq!(err.line, 3);
    }

    #[test]
    fn test_triple_quoted_string_spans_lines() {
        let text = "s = '''line1\nline2'''\nx = 1\n";
        let toks = tokenize(text).tokens;
        let string_tok = toks.iter().find(|t| t.kind == TokKind::Str).unwrap();
        assert!(string_tok.text.contains("line1"));
        assert!(string_tok.text.contains("line2"));
        let newlines: Vec<usize> = toks
            .iter()
            .filter(|t| t.kind == TokKind::Newline)
            .map(|t| t.line)
            .collect();
        assert_eq!(newlines, vec![2, 3]);
    }

    #[test]
    fn test_unterminated_string_reports_line() {
        let result = tokenize("a = 'oops\n");
        let err = result.error.expect("expected error");
        assert_eq!(err.kind, ParseErrorKind::UnterminatedString);
        assert_eq!(err.line, 1);
    }

    #[test]
    fn test_unmatched_bracket_at_eof() {
        let result = tokenize("f(a\n");
        let err = result.error.expect("expected error");
        assert_eq!(err.kind, ParseErrorKind::UnmatchedBracket);
        // Tokens scanned before the failure survive for partial use.
        assert!(result.tokens.iter().any(|t| t.is(TokKind::Name, "f")));
    }

    #[test]
    fn test_multichar_operators() {
        let toks = tokenize("a **= 2\n").tokens;
        assert!(toks.iter().any(|t| t.is(TokKind::Op, "**=")));
    }

    #[test]
    fn test_comment_only_line_is_not_logical() {
        let text = "# header\na = 1\n";
        let toks = tokenize(text).tokens;
        let newlines: Vec<usize> = toks
            .iter()
            .filter(|t| t.kind == TokKind::Newline)
            .map(|t| t.line)
            .collect();
        assert_eq!(newlines, vec![2]);
    }

    #[test]
    fn test_count_line_indents() {
        assert_eq!(count_line_indents("    a"), 4);
        assert_eq!(count_line_indents("\ta"), 8);
        assert_eq!(count_line_indents("a"), 0);
        assert_eq!(count_line_indents("   "), 0);
    }
}
