//! Offset-to-span navigation over raw source text.
//!
//! [`Worder`] answers "what word / atom / primary expression is at this
//! offset" with local backward and forward scans, never a full parse.
//! That makes it usable on syntactically incomplete code, at the price
//! of being heuristic: string contents are skipped by matching quote
//! characters, brackets by balance counting, and line continuations
//! (`\` before a newline) are transparent to the non-space scans.
//!
//! All scans clamp at the buffer bounds; malformed input (unterminated
//! strings, unbalanced brackets at EOF) degrades to empty or truncated
//! spans, never a panic.

use crate::base::{SourceBuffer, Span};

fn is_id_char(c: char) -> bool {
    unicode_ident::is_xid_continue(c)
}

/// Lexical offset navigator over one buffer version.
pub struct Worder<'a> {
    buf: &'a SourceBuffer,
    chars: &'a [char],
}

impl<'a> Worder<'a> {
    pub fn new(buf: &'a SourceBuffer) -> Self {
        Self {
            buf,
            chars: buf.chars(),
        }
    }

    // ========================================================================
    // Low-level scans. Signed offsets internally: the backward scans
    // naturally run off the left edge and the callers expect -1 there.
    // ========================================================================

    fn at(&self, offset: isize) -> char {
        self.chars[offset as usize]
    }

    fn is_id(&self, offset: isize) -> bool {
        offset >= 0 && (offset as usize) < self.chars.len() && is_id_char(self.at(offset))
    }

    fn find_word_start(&self, offset: isize) -> isize {
        let mut current = offset;
        while current >= 0 && self.is_id(current) {
            current -= 1;
        }
        current + 1
    }

    /// Inclusive offset of the last word character at or after `offset`.
    fn find_word_end(&self, offset: isize) -> isize {
        let mut current = offset + 1;
        while (current as usize) < self.chars.len() && self.is_id(current) {
            current += 1;
        }
        current - 1
    }

    /// Last offset at or before `offset` holding a non-space character,
    /// treating a `\` line continuation as just more whitespace.
    fn find_last_non_space_char(&self, offset: isize) -> isize {
        if offset <= 0 {
            return 0;
        }
        let mut current = offset.min(self.chars.len() as isize - 1);
        while current >= 0 && matches!(self.at(current), ' ' | '\t' | '\n') {
            while current >= 0 && matches!(self.at(current), ' ' | '\t') {
                current -= 1;
            }
            if current >= 0 && self.at(current) == '\n' {
                current -= 1;
                if current >= 0 && self.at(current) == '\\' {
                    current -= 1;
                }
            }
        }
        current
    }

    /// First offset at or after `offset` holding a non-space character.
    fn find_first_non_space_char(&self, offset: usize) -> usize {
        let len = self.chars.len();
        if offset >= len {
            return len;
        }
        let mut current = offset;
        while current < len && matches!(self.chars[current], ' ' | '\t' | '\n') {
            while current < len && matches!(self.chars[current], ' ' | '\t' | '\n') {
                current += 1;
            }
            if current + 1 < len && self.chars[current] == '\\' {
                current += 2;
            }
        }
        current
    }

    /// Snap offsets that touch an identifier onto it. Offsets touching
    /// no identifier (or exactly between two) are left alone.
    fn fixed_offset(&self, offset: usize) -> isize {
        let len = self.chars.len() as isize;
        let offset = offset as isize;
        if offset >= len {
            return len - 1;
        }
        if !self.is_id(offset) {
            if offset > 0 && self.is_id(offset - 1) {
                return offset - 1;
            }
            if offset < len - 1 && self.is_id(offset + 1) {
                return offset + 1;
            }
        }
        offset
    }

    /// Start of the string literal whose closing quote is at `offset`.
    /// Clamps at the buffer start if the opener is missing.
    fn find_string_start(&self, offset: isize) -> isize {
        let kind = self.at(offset);
        let mut current = offset - 1;
        while current > 0 && self.at(current) != kind {
            current -= 1;
        }
        current.max(0)
    }

    /// Opening bracket matching the closer at `offset`, skipping over
    /// the primaries between them.
    fn find_parens_start(&self, offset: isize) -> isize {
        let mut current = self.find_last_non_space_char(offset - 1);
        while current >= 0 && !matches!(self.at(current), '[' | '(' | '{') {
            if !matches!(self.at(current), ':' | ',') {
                current = self.find_primary_start_from(current);
            }
            current = self.find_last_non_space_char(current - 1);
        }
        current
    }

    fn find_atom_start(&self, offset: isize) -> isize {
        let old_offset = offset;
        let mut offset = offset;
        if matches!(self.at(offset), '\n' | '\t' | ' ') {
            offset = self.find_last_non_space_char(offset);
        }
        match self.at(offset) {
            '\'' | '"' => self.find_string_start(offset),
            ')' | ']' | '}' => self.find_parens_start(offset),
            _ if self.is_id(offset) => self.find_word_start(offset),
            _ => old_offset,
        }
    }

    /// Start of the trailing chain element (word, string, or bracketed
    /// group with optional call prefix) ending at `offset`.
    fn find_primary_without_dot_start(&self, offset: isize) -> isize {
        let mut last_parens = offset;
        let mut current = self.find_last_non_space_char(offset);
        while current > 0 && matches!(self.at(current), ')' | ']' | '}') {
            last_parens = self.find_parens_start(current);
            current = self.find_last_non_space_char(last_parens - 1);
        }
        if last_parens >= 0 && self.at(last_parens) == '(' && self.is_id(current) {
            // A call: keep consuming the callee chain.
            return self.find_primary_without_dot_start(current);
        }
        if current > 0 && matches!(self.at(current), '\'' | '"') {
            self.find_string_start(current)
        } else if current > 0 && self.is_id(current) {
            self.find_word_start(current)
        } else {
            last_parens
        }
    }

    /// Start of the dotted primary expression ending at `offset`.
    fn find_primary_start_from(&self, offset: isize) -> isize {
        let mut offset = offset;
        if offset >= self.chars.len() as isize {
            offset = self.chars.len() as isize - 1;
        }
        if offset < 0 {
            return 0;
        }
        let mut current = offset + 1;
        if self.at(offset) != '.' {
            current = self.find_primary_without_dot_start(offset);
        }
        while current > 0 && self.at(self.find_last_non_space_char(current - 1)) == '.' {
            let dot_position = self.find_last_non_space_char(current - 1);
            current = self.find_primary_without_dot_start(dot_position - 1);
            if !self.is_id(current) {
                break;
            }
        }
        current.max(0)
    }

    fn line_start_of(&self, offset: isize) -> isize {
        let mut offset = offset.clamp(0, self.chars.len() as isize - 1);
        while offset > 0 && self.at(offset) != '\n' {
            offset -= 1;
        }
        offset.max(0)
    }

    fn line_end_of(&self, offset: isize) -> isize {
        let mut offset = offset.max(0);
        while (offset as usize) < self.chars.len() && self.at(offset) != '\n' {
            offset += 1;
        }
        offset
    }

    fn slice(&self, start: isize, end: isize) -> String {
        let len = self.chars.len() as isize;
        let start = start.clamp(0, len) as usize;
        let end = end.clamp(0, len) as usize;
        if start >= end {
            return String::new();
        }
        self.chars[start..end].iter().collect()
    }

    /// Last occurrence of `needle` strictly before `end`.
    fn rindex(&self, needle: &str, end: usize) -> Option<usize> {
        let needle: Vec<char> = needle.chars().collect();
        let end = end.min(self.chars.len());
        if needle.len() > end {
            return None;
        }
        (0..=end - needle.len()).rev().find(|&i| self.chars[i..i + needle.len()] == needle[..])
    }

    /// First occurrence of `needle` at or after `from`.
    fn index(&self, needle: &str, from: usize) -> Option<usize> {
        let needle: Vec<char> = needle.chars().collect();
        if needle.len() > self.chars.len() {
            return None;
        }
        (from..=self.chars.len() - needle.len())
            .find(|&i| self.chars[i..i + needle.len()] == needle[..])
    }

    // ========================================================================
    // Word and primary extraction
    // ========================================================================

    /// Span of the identifier at `offset`.
    ///
    /// Every interior offset of an identifier yields the same span.
    /// Offsets touching exactly one identifier snap onto it; offsets
    /// touching none yield an empty span.
    pub fn word_range(&self, offset: usize) -> Span {
        if self.chars.is_empty() {
            return Span::empty(0);
        }
        let fixed = self.fixed_offset(offset);
        if !self.is_id(fixed) {
            return Span::empty(offset.min(self.chars.len()));
        }
        let start = self.find_word_start(fixed);
        let end = self.find_word_end(fixed) + 1;
        Span::new(start as usize, end as usize)
    }

    pub fn word_at(&self, offset: usize) -> String {
        self.buf.slice(self.word_range(offset))
    }

    /// The identifier ending exactly at `offset`.
    pub fn word_before(&self, offset: usize) -> String {
        if offset == 0 {
            return String::new();
        }
        let start = self.find_word_start(offset as isize - 1);
        self.slice(start, offset as isize)
    }

    /// Start offset of the primary expression (dotted chain of atoms
    /// with call/subscript suffixes) ending at `offset`.
    pub fn primary_start(&self, offset: usize) -> usize {
        self.find_primary_start_from(offset as isize) as usize
    }

    /// Span of the primary expression at `offset`.
    pub fn primary_range(&self, offset: usize) -> Span {
        if self.chars.is_empty() {
            return Span::empty(0);
        }
        let fixed = self.fixed_offset(offset);
        let start = self.find_primary_start_from(fixed).max(0);
        let end = self.find_word_end(fixed) + 1;
        Span::new(start as usize, (end.max(start)) as usize)
    }

    /// The primary expression at `offset` as trimmed text, e.g.
    /// `a.b(c)[0]`.
    pub fn primary_at(&self, offset: usize) -> String {
        self.buf.slice(self.primary_range(offset)).trim().to_string()
    }

    /// Split the primary expression ending just before `offset` into
    /// `(prefix_expr, partial_word, partial_start)`; `foo.bar.ba|`
    /// yields `("foo.bar", "ba", start_of_ba)`. Used for prefix-based
    /// completion.
    pub fn split_primary_before(&self, offset: usize) -> (String, String, usize) {
        if offset == 0 {
            return (String::new(), String::new(), 0);
        }
        let end = offset as isize - 1;
        let mut word_start = self.find_atom_start(end);
        let mut real_start = self.find_primary_start_from(end);
        if self.slice(word_start, offset as isize).trim().is_empty() {
            word_start = end;
        }
        if self.slice(real_start, word_start).trim().is_empty() {
            real_start = word_start;
        }
        if real_start == word_start && word_start == end && !self.is_id(end) {
            return (String::new(), String::new(), offset);
        }
        if real_start == word_start {
            return (
                String::new(),
                self.slice(word_start, offset as isize),
                word_start as usize,
            );
        }
        if self.at(end) == '.' {
            return (self.slice(real_start, end), String::new(), offset);
        }
        let mut last_dot_position = word_start;
        if self.at(word_start) != '.' {
            last_dot_position = self.find_last_non_space_char(word_start - 1);
        }
        let last_char_position = self.find_last_non_space_char(last_dot_position - 1);
        (
            self.slice(real_start, last_char_position + 1),
            self.slice(word_start, offset as isize),
            word_start as usize,
        )
    }

    // ========================================================================
    // Classification predicates. Local scans bounded by statement or
    // line boundaries, never a parse.
    // ========================================================================

    /// End of the name list of an `import`/`from ... import` clause
    /// starting at `start`. An unmatched `(` clamps to the buffer end.
    fn find_import_pair_end(&self, start: usize) -> usize {
        let next_char = self.find_first_non_space_char(start);
        if next_char < self.chars.len() && self.chars[next_char] == '(' {
            match self.index(")", next_char) {
                Some(close) => close + 1,
                None => self.chars.len(),
            }
        } else {
            let mut current = next_char;
            while current < self.chars.len() {
                if self.chars[current] == '\n' {
                    break;
                }
                if self.chars[current] == '\\' {
                    current += 1;
                }
                current += 1;
            }
            current
        }
    }

    pub fn is_import_statement(&self, offset: usize) -> bool {
        match self.rindex("import ", offset) {
            Some(last_import) => self.find_import_pair_end(last_import + 7) >= offset,
            None => false,
        }
    }

    pub fn is_from_statement(&self, offset: usize) -> bool {
        let Some(last_from) = self.rindex("from ", offset) else {
            return false;
        };
        let Some(from_import) = self.index(" import ", last_from) else {
            return false;
        };
        self.find_import_pair_end(from_import + 8) >= offset
    }

    /// Is `offset` on the module name between `from` and `import`?
    pub fn is_from_statement_module(&self, offset: usize) -> bool {
        if offset + 1 >= self.chars.len() {
            return false;
        }
        let stmt_start = self.find_primary_start_from(offset as isize);
        let line_start = self.line_start_of(stmt_start);
        let prev_word = self.slice(line_start, stmt_start);
        prev_word.trim() == "from"
    }

    /// Is `offset` on one of the names after `from X import`?
    pub fn is_name_after_from_import(&self, offset: usize) -> bool {
        let Some(last_from) = self.rindex("from ", offset) else {
            return false;
        };
        let Some(from_import) = self.index(" import ", last_from) else {
            return false;
        };
        let from_names = from_import + 8;
        if from_names >= offset {
            return false;
        }
        self.find_import_pair_end(from_names) >= offset
    }

    /// Is `offset` on the keyword name of a `f(name=value)` argument?
    pub fn is_function_keyword_parameter(&self, offset: usize) -> bool {
        let word_end = self.find_word_end(offset as isize);
        if word_end as usize + 1 == self.chars.len() {
            return false;
        }
        let next_char = self.find_first_non_space_char(word_end as usize + 1);
        if next_char + 2 >= self.chars.len()
            || self.chars[next_char] != '='
            || self.chars[next_char + 1] == '='
        {
            return false;
        }
        let word_start = self.find_word_start(offset as isize);
        let prev_char = self.find_last_non_space_char(word_start - 1);
        prev_char >= 1 && matches!(self.at(prev_char), ',' | '(')
    }

    /// Is `offset` inside the argument parens of a call, positioned
    /// where a keyword could start (right after `(` or `,`)?
    pub fn is_on_function_call_keyword(&self, offset: usize, stop_searching: usize) -> bool {
        let mut current = offset as isize;
        if self.is_id(current) {
            current = self.find_word_start(current) - 1;
        }
        current = self.find_last_non_space_char(current);
        if current <= stop_searching as isize || !matches!(self.at(current), '(' | ',') {
            return false;
        }
        let parens_start = self.find_parens_start_from_inside(offset, stop_searching);
        stop_searching < parens_start
    }

    /// Offset of the `(` enclosing `offset`, found by backward balance
    /// counting; stops at `stop_searching`.
    pub fn find_parens_start_from_inside(&self, offset: usize, stop_searching: usize) -> usize {
        let mut current = offset.min(self.chars.len().saturating_sub(1));
        let mut opens = 1;
        while current > stop_searching {
            if self.chars[current] == '(' {
                opens -= 1;
            }
            if opens == 0 {
                break;
            }
            if self.chars[current] == ')' {
                opens += 1;
            }
            current -= 1;
        }
        current
    }

    /// Is `offset` on the name in a `def name(...)` / `class name(...)`
    /// header?
    pub fn is_class_or_function_header_name(&self, offset: usize) -> bool {
        let word_start = self.find_word_start(offset as isize - 1);
        let line_start = self.line_start_of(word_start);
        let prev_word = self.slice(line_start, word_start);
        matches!(prev_word.trim(), "def" | "class")
    }

    /// Is the word at `offset` immediately followed by `(` (a call
    /// site, not a definition header)?
    pub fn is_called(&self, offset: usize) -> bool {
        let word_end = self.find_word_end(offset as isize) as usize + 1;
        let next_char = self.find_first_non_space_char(word_end);
        next_char < self.chars.len()
            && self.chars[next_char] == '('
            && !self.is_class_or_function_header_name(offset)
    }

    /// The assignment operator following the word at `offset`, if any
    /// (`=`, `+=`, `//=`, ...). Comparison `==` is not an assignment.
    pub fn assignment_kind(&self, offset: usize) -> String {
        let word_end = self.find_word_end(offset as isize);
        let next_char = self.find_first_non_space_char(word_end as usize + 1);
        let mut current = next_char as isize;
        while (current as usize) + 1 < self.chars.len()
            && (self.at(current) != '=' || self.chars[current as usize + 1] == '=')
            && current < next_char as isize + 3
        {
            current += 1;
        }
        self.slice(next_char as isize, current + 1)
    }

    pub fn is_assigned_here(&self, offset: usize) -> bool {
        matches!(
            self.assignment_kind(offset).as_str(),
            "=" | "-=" | "+=" | "*=" | "/=" | "%=" | "**=" | ">>=" | "<<=" | "&=" | "^=" | "|="
        )
    }

    /// Is `offset` on a plain name alone at the start of a logical
    /// line and followed by `=` (a class-attribute style assignment)?
    pub fn is_name_assigned_in_class_body(&self, offset: usize) -> bool {
        let word_start = self.find_word_start(offset as isize - 1);
        let word_end = self.find_word_end(offset as isize - 1) + 1;
        if self.slice(word_start, word_end).contains('.') {
            return false;
        }
        let line_start = self.line_start_of(word_start);
        let line = self.slice(line_start, word_start);
        line.trim().is_empty() && self.is_followed_by_equals(word_end)
    }

    fn is_followed_by_equals(&self, offset: isize) -> bool {
        let mut offset = offset;
        while (offset as usize) < self.chars.len() && matches!(self.at(offset), ' ' | '\\') {
            if self.at(offset) == '\\' {
                offset = self.line_end_of(offset);
            }
            offset += 1;
        }
        (offset as usize) + 1 < self.chars.len()
            && self.at(offset) == '='
            && self.chars[offset as usize + 1] != '='
    }

    /// Span of the argument parens following the called or defined
    /// name at `offset`, or `None` if the name is not followed by `(`.
    pub fn word_parens_range(&self, offset: usize) -> Option<Span> {
        if !self.is_called(offset) && !self.is_class_or_function_header_name(offset) {
            return None;
        }
        let end = self.find_word_end(offset as isize);
        let start_parens = self.index("(", end as usize)?;
        let mut index = start_parens;
        let mut open_count = 0i32;
        while index < self.chars.len() {
            if self.chars[index] == '(' {
                open_count += 1;
            }
            if self.chars[index] == ')' {
                open_count -= 1;
            }
            if open_count == 0 {
                return Some(Span::new(start_parens, index + 1));
            }
            index += 1;
        }
        Some(Span::new(start_parens, index))
    }
}
