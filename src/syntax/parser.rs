//! Tolerant statement-level parser.
//!
//! Consumes the token stream and produces the coarse AST in
//! [`crate::syntax::ast`]. Tolerant by construction: constructs the
//! analyses do not model degrade to [`Expr::Unknown`] (keeping any
//! recognized subexpressions), and a statement that cannot be parsed is
//! skipped to its logical end rather than aborting the module. Only
//! malformed def/class headers are recorded as errors, and only the
//! first error is kept; strict callers decide whether it is fatal.
//!
//! Compound statements that do not open a scope (`if`, `while`, `with`,
//! `try`) are flattened: the header expression survives as a plain
//! expression statement (call sites in a condition still matter) and
//! the suite's statements become siblings, since bindings inside them
//! belong to the enclosing scope anyway. `for` keeps its header because
//! the loop target binds a name.

use crate::base::{ParseError, ParseErrorKind};
use crate::syntax::ast::{ClassDef, Expr, FunctionDef, ImportName, Param, Stmt, StmtKind};
use crate::text::tokens::{self, TokKind, Token};

/// Result of parsing: statements plus the first error, if any.
#[derive(Debug)]
pub struct Parsed {
    pub stmts: Vec<Stmt>,
    pub error: Option<ParseError>,
}

impl Parsed {
    pub fn into_result(self) -> Result<Vec<Stmt>, ParseError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.stmts),
        }
    }
}

pub fn parse_module(text: &str) -> Parsed {
    let tokenized = tokens::tokenize(text);
    let toks: Vec<Token> = tokenized
        .tokens
        .into_iter()
        .filter(|t| !matches!(t.kind, TokKind::Comment | TokKind::Nl))
        .collect();
    let mut parser = Parser {
        toks,
        pos: 0,
        last_line: 1,
        error: tokenized.error,
        end: Token {
            kind: TokKind::EndMarker,
            text: String::new(),
            line: 0,
        },
    };
    let stmts = parser.module_statements();
    Parsed {
        stmts,
        error: parser.error,
    }
}

const KEYWORD_OPS: &[&str] = &[
    "and", "or", "not", "in", "is", "if", "else", "for", "lambda", "await", "yield",
];

const PASSTHROUGH_KEYWORDS: &[&str] =
    &["if", "elif", "else", "while", "with", "try", "except", "finally"];

fn is_aug_op(text: &str) -> bool {
    matches!(
        text,
        "+=" | "-=" | "*=" | "/=" | "//=" | "%=" | "**=" | ">>=" | "<<=" | "&=" | "|=" | "^="
    )
}

struct Parser {
    toks: Vec<Token>,
    pos: usize,
    last_line: usize,
    error: Option<ParseError>,
    end: Token,
}

impl Parser {
    // ------------------------------------------------------------------
    // Token cursor
    // ------------------------------------------------------------------

    fn peek(&self) -> &Token {
        self.toks.get(self.pos).unwrap_or(&self.end)
    }

    fn peek2(&self) -> &Token {
        self.toks.get(self.pos + 1).unwrap_or(&self.end)
    }

    fn bump(&mut self) -> Token {
        let tok = self.peek().clone();
        if tok.kind != TokKind::EndMarker {
            self.last_line = tok.line;
            self.pos += 1;
        }
        tok
    }

    fn at_end(&self) -> bool {
        self.peek().kind == TokKind::EndMarker
    }

    fn at_op(&self, text: &str) -> bool {
        self.peek().is(TokKind::Op, text)
    }

    fn at_name(&self, text: &str) -> bool {
        self.peek().is(TokKind::Name, text)
    }

    fn eat_op(&mut self, text: &str) -> bool {
        if self.at_op(text) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn note_error(&mut self, kind: ParseErrorKind, line: usize) {
        if self.error.is_none() {
            self.error = Some(ParseError::new(kind, line));
        }
    }

    /// Skip the rest of the current logical line, including its
    /// terminating newline.
    fn skip_to_newline(&mut self) {
        while !self.at_end() {
            if self.bump().kind == TokKind::Newline {
                return;
            }
        }
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    /// Top level: stray indentation tokens left behind by a degraded
    /// parse are skipped instead of ending the module.
    fn module_statements(&mut self) -> Vec<Stmt> {
        let mut out = Vec::new();
        while !self.at_end() {
            match self.peek().kind {
                TokKind::Newline | TokKind::Indent | TokKind::Dedent => {
                    self.bump();
                }
                _ => out.extend(self.statement()),
            }
        }
        out
    }

    /// Statements until a dedent or the end of input.
    fn statements(&mut self) -> Vec<Stmt> {
        let mut out = Vec::new();
        loop {
            match self.peek().kind {
                TokKind::EndMarker | TokKind::Dedent => break,
                TokKind::Newline | TokKind::Indent => {
                    self.bump();
                }
                _ => out.extend(self.statement()),
            }
        }
        out
    }

    fn statement(&mut self) -> Vec<Stmt> {
        let tok = self.peek();
        match tok.kind {
            TokKind::Name => match tok.text.as_str() {
                "def" => self.function_def().into_iter().collect(),
                "class" => self.class_def().into_iter().collect(),
                "import" => self.import_stmt(),
                "from" => self.from_import(),
                "return" => self.return_stmt(),
                "for" => self.for_stmt(),
                "pass" | "break" | "continue" => {
                    self.skip_to_newline();
                    Vec::new()
                }
                "global" | "nonlocal" | "del" | "assert" | "raise" => {
                    // Keep any expressions for the call-site walk.
                    let start_line = self.peek().line;
                    self.bump();
                    let value = self.testlist(false);
                    self.end_simple_statement();
                    vec![Stmt {
                        kind: StmtKind::Expr(value),
                        start_line,
                        end_line: self.last_line,
                    }]
                }
                kw if PASSTHROUGH_KEYWORDS.contains(&kw) => self.passthrough_compound(),
                _ => self.simple_statements(),
            },
            TokKind::Op if tok.text == "@" => {
                // Decorator: not modeled.
                self.skip_to_newline();
                Vec::new()
            }
            _ => self.simple_statements(),
        }
    }

    /// `;`-separated simple statements up to the logical newline.
    fn simple_statements(&mut self) -> Vec<Stmt> {
        let mut out = Vec::new();
        loop {
            out.push(self.expr_statement());
            if self.eat_op(";") {
                if matches!(self.peek().kind, TokKind::Newline | TokKind::EndMarker) {
                    break;
                }
                continue;
            }
            break;
        }
        self.end_simple_statement();
        out
    }

    /// Consume through the statement's newline, skipping any leftover
    /// tokens a degraded parse did not consume.
    fn end_simple_statement(&mut self) {
        while !self.at_end() {
            match self.peek().kind {
                TokKind::Newline => {
                    self.bump();
                    return;
                }
                TokKind::Dedent | TokKind::Indent => return,
                _ => {
                    self.bump();
                }
            }
        }
    }

    fn expr_statement(&mut self) -> Stmt {
        let start_line = self.peek().line;
        let first = self.testlist(false);
        let kind = if self.at_op("=") {
            let mut parts = vec![first];
            while self.eat_op("=") {
                parts.push(self.testlist(false));
            }
            let value = parts.pop().unwrap_or_else(Expr::unknown);
            StmtKind::Assign {
                targets: parts,
                aug_op: None,
                value,
            }
        } else if self.peek().kind == TokKind::Op && is_aug_op(&self.peek().text) {
            let op = self.bump().text;
            let value = self.testlist(false);
            StmtKind::Assign {
                targets: vec![first],
                aug_op: Some(op.trim_end_matches('=').to_string()),
                value,
            }
        } else {
            StmtKind::Expr(first)
        };
        Stmt {
            kind,
            start_line,
            end_line: self.last_line.max(start_line),
        }
    }

    fn function_def(&mut self) -> Option<Stmt> {
        let start_line = self.peek().line;
        self.bump(); // def
        if self.peek().kind != TokKind::Name {
            self.note_error(ParseErrorKind::MalformedStatement, start_line);
            self.skip_to_newline();
            return None;
        }
        let name = self.bump().text;
        let params = if self.eat_op("(") {
            self.param_list()
        } else {
            self.note_error(ParseErrorKind::MalformedStatement, start_line);
            Vec::new()
        };
        if self.eat_op("->") {
            // Return annotation, discarded.
            self.expr(false);
        }
        if !self.eat_op(":") {
            self.note_error(ParseErrorKind::MalformedStatement, start_line);
        }
        let body = self.suite();
        let end_line = body.last().map(|s| s.end_line).unwrap_or(start_line);
        Some(Stmt {
            kind: StmtKind::FunctionDef(FunctionDef { name, params, body }),
            start_line,
            end_line,
        })
    }

    fn param_list(&mut self) -> Vec<Param> {
        let mut params = Vec::new();
        while !self.at_op(")") && !self.at_end() && self.peek().kind != TokKind::Newline {
            if self.eat_op("**") {
                if self.peek().kind == TokKind::Name {
                    let name = self.bump().text;
                    params.push(Param {
                        name,
                        default: None,
                        star: false,
                        double_star: true,
                    });
                }
            } else if self.eat_op("*") {
                // Bare `*` is a keyword-only marker.
                if self.peek().kind == TokKind::Name {
                    let name = self.bump().text;
                    params.push(Param {
                        name,
                        default: None,
                        star: true,
                        double_star: false,
                    });
                }
            } else if self.peek().kind == TokKind::Name {
                let name = self.bump().text;
                if self.eat_op(":") {
                    // Annotation, discarded.
                    self.expr(false);
                }
                let default = if self.eat_op("=") {
                    Some(self.expr(false))
                } else {
                    None
                };
                params.push(Param {
                    name,
                    default,
                    star: false,
                    double_star: false,
                });
            } else if !self.eat_op(",") && !self.eat_op("/") {
                self.bump();
            }
            self.eat_op(",");
        }
        self.eat_op(")");
        params
    }

    fn class_def(&mut self) -> Option<Stmt> {
        let start_line = self.peek().line;
        self.bump(); // class
        if self.peek().kind != TokKind::Name {
            self.note_error(ParseErrorKind::MalformedStatement, start_line);
            self.skip_to_newline();
            return None;
        }
        let name = self.bump().text;
        let mut bases = Vec::new();
        if self.eat_op("(") {
            while !self.at_op(")") && !self.at_end() && self.peek().kind != TokKind::Newline {
                if self.peek().kind == TokKind::Name && self.peek2().is(TokKind::Op, "=") {
                    // Keyword argument such as `metaclass=`, discarded.
                    self.bump();
                    self.bump();
                    self.expr(false);
                } else {
                    bases.push(self.expr(false));
                }
                if !self.eat_op(",") {
                    break;
                }
            }
            self.eat_op(")");
        }
        if !self.eat_op(":") {
            self.note_error(ParseErrorKind::MalformedStatement, start_line);
        }
        let body = self.suite();
        let end_line = body.last().map(|s| s.end_line).unwrap_or(start_line);
        Some(Stmt {
            kind: StmtKind::ClassDef(ClassDef { name, bases, body }),
            start_line,
            end_line,
        })
    }

    fn import_stmt(&mut self) -> Vec<Stmt> {
        let start_line = self.peek().line;
        self.bump(); // import
        let mut names = Vec::new();
        loop {
            let Some(name) = self.dotted_name() else { break };
            let alias = self.as_alias();
            names.push(ImportName { name, alias });
            if !self.eat_op(",") {
                break;
            }
        }
        self.end_simple_statement();
        vec![Stmt {
            kind: StmtKind::Import { names },
            start_line,
            end_line: self.last_line,
        }]
    }

    fn from_import(&mut self) -> Vec<Stmt> {
        let start_line = self.peek().line;
        self.bump(); // from
        let mut level = 0;
        loop {
            if self.eat_op(".") {
                level += 1;
            } else if self.eat_op("...") {
                level += 3;
            } else {
                break;
            }
        }
        let module = if self.peek().kind == TokKind::Name && !self.at_name("import") {
            self.dotted_name().unwrap_or_default()
        } else {
            String::new()
        };
        if self.at_name("import") {
            self.bump();
        } else {
            self.note_error(ParseErrorKind::MalformedStatement, start_line);
            self.skip_to_newline();
            return Vec::new();
        }
        let mut names = Vec::new();
        if self.eat_op("*") {
            names.push(ImportName {
                name: "*".to_string(),
                alias: None,
            });
        } else {
            let parenthesized = self.eat_op("(");
            while self.peek().kind == TokKind::Name {
                let name = self.bump().text;
                let alias = self.as_alias();
                names.push(ImportName { name, alias });
                if !self.eat_op(",") {
                    break;
                }
            }
            if parenthesized {
                self.eat_op(")");
            }
        }
        self.end_simple_statement();
        vec![Stmt {
            kind: StmtKind::FromImport {
                module,
                level,
                names,
            },
            start_line,
            end_line: self.last_line,
        }]
    }

    fn as_alias(&mut self) -> Option<String> {
        if self.at_name("as") {
            self.bump();
            if self.peek().kind == TokKind::Name {
                return Some(self.bump().text);
            }
        }
        None
    }

    fn dotted_name(&mut self) -> Option<String> {
        if self.peek().kind != TokKind::Name {
            return None;
        }
        let mut name = self.bump().text;
        while self.at_op(".") && self.peek2().kind == TokKind::Name {
            self.bump();
            name.push('.');
            name.push_str(&self.bump().text);
        }
        Some(name)
    }

    fn return_stmt(&mut self) -> Vec<Stmt> {
        let start_line = self.peek().line;
        self.bump(); // return
        let value = if matches!(
            self.peek().kind,
            TokKind::Newline | TokKind::Dedent | TokKind::EndMarker
        ) || self.at_op(";")
        {
            None
        } else {
            Some(self.testlist(false))
        };
        self.end_simple_statement();
        vec![Stmt {
            kind: StmtKind::Return(value),
            start_line,
            end_line: self.last_line,
        }]
    }

    fn for_stmt(&mut self) -> Vec<Stmt> {
        let start_line = self.peek().line;
        self.bump(); // for
        let target = self.testlist(true);
        if self.at_name("in") {
            self.bump();
        }
        let iter = self.testlist(false);
        if !self.eat_op(":") {
            self.skip_to_newline();
        }
        let header = Stmt {
            kind: StmtKind::For { target, iter },
            start_line,
            end_line: self.last_line,
        };
        let mut out = vec![header];
        out.extend(self.suite());
        out
    }

    /// A compound statement whose header binds nothing: keep the
    /// header expression as a sibling statement, then splice the
    /// suite's statements into the current level.
    fn passthrough_compound(&mut self) -> Vec<Stmt> {
        let start_line = self.peek().line;
        self.bump(); // keyword
        let mut out = Vec::new();
        if !self.at_op(":") && self.peek().kind != TokKind::Newline {
            let header = self.testlist(false);
            let keep = match &header {
                Expr::Unknown(parts) => !parts.is_empty(),
                _ => true,
            };
            if keep {
                out.push(Stmt {
                    kind: StmtKind::Expr(header),
                    start_line,
                    end_line: self.last_line.max(start_line),
                });
            }
        }
        if !self.eat_op(":") {
            // Malformed header: drop anything left before the suite.
            loop {
                match self.peek().kind {
                    TokKind::Newline | TokKind::EndMarker | TokKind::Dedent => break,
                    TokKind::Op if self.at_op(":") => {
                        self.bump();
                        break;
                    }
                    _ => {
                        self.bump();
                    }
                }
            }
        }
        out.extend(self.suite());
        out
    }

    /// A suite: `NEWLINE INDENT stmts DEDENT`, or inline simple
    /// statements on the header line.
    fn suite(&mut self) -> Vec<Stmt> {
        if self.peek().kind == TokKind::Newline {
            self.bump();
            if self.peek().kind == TokKind::Indent {
                self.bump();
                let stmts = self.statements();
                if self.peek().kind == TokKind::Dedent {
                    self.bump();
                }
                return stmts;
            }
            return Vec::new();
        }
        if matches!(self.peek().kind, TokKind::EndMarker | TokKind::Dedent) {
            return Vec::new();
        }
        self.simple_statements()
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    /// A comma-separated expression list; more than one element makes
    /// a tuple. `stop_in` terminates at the keyword `in` (loop
    /// headers).
    fn testlist(&mut self, stop_in: bool) -> Expr {
        let mut items = vec![self.expr(stop_in)];
        while self.at_op(",") {
            self.bump();
            if self.at_expr_terminator(stop_in) {
                // Trailing comma still makes a tuple.
                return Expr::Tuple(items);
            }
            items.push(self.expr(stop_in));
        }
        if items.len() == 1 {
            items.pop().unwrap_or_else(Expr::unknown)
        } else {
            Expr::Tuple(items)
        }
    }

    fn at_expr_terminator(&self, stop_in: bool) -> bool {
        let tok = self.peek();
        match tok.kind {
            TokKind::Newline | TokKind::Indent | TokKind::Dedent | TokKind::EndMarker => true,
            TokKind::Op => {
                matches!(tok.text.as_str(), "," | ";" | ":" | ")" | "]" | "}" | "=")
                    || is_aug_op(&tok.text)
            }
            TokKind::Name => stop_in && tok.text == "in",
            _ => false,
        }
    }

    /// One expression: a sequence of primaries and operators. A lone
    /// primary is returned as-is; anything with operators degrades to
    /// [`Expr::Unknown`] holding the primaries found inside it.
    fn expr(&mut self, stop_in: bool) -> Expr {
        let mut parts = Vec::new();
        let mut saw_op = false;
        loop {
            if self.at_expr_terminator(stop_in) {
                break;
            }
            let tok = self.peek();
            match tok.kind {
                TokKind::Name if KEYWORD_OPS.contains(&tok.text.as_str()) => {
                    self.bump();
                    saw_op = true;
                }
                TokKind::Name | TokKind::Number | TokKind::Str => {
                    parts.push(self.primary());
                }
                TokKind::Op if matches!(tok.text.as_str(), "(" | "[" | "{") => {
                    parts.push(self.primary());
                }
                TokKind::Op => {
                    self.bump();
                    saw_op = true;
                }
                _ => break,
            }
        }
        if parts.len() == 1 && !saw_op {
            parts.pop().unwrap_or_else(Expr::unknown)
        } else {
            Expr::Unknown(parts)
        }
    }

    /// An atom followed by `.name`, call and subscript trailers.
    fn primary(&mut self) -> Expr {
        let mut expr = self.atom();
        loop {
            if self.at_op(".") && self.peek2().kind == TokKind::Name {
                self.bump();
                let attr = self.bump().text;
                expr = Expr::Attribute {
                    value: Box::new(expr),
                    attr,
                };
            } else if self.at_op("(") {
                self.bump();
                expr = self.call(expr);
            } else if self.at_op("[") {
                self.bump();
                let index = self.subscript_index();
                expr = Expr::Subscript {
                    value: Box::new(expr),
                    index: Box::new(index),
                };
            } else {
                return expr;
            }
        }
    }

    fn atom(&mut self) -> Expr {
        let tok = self.peek();
        match tok.kind {
            TokKind::Name => Expr::Name(self.bump().text),
            TokKind::Number => Expr::Num(self.bump().text),
            TokKind::Str => {
                let text = self.bump().text;
                // Adjacent literals concatenate.
                while self.peek().kind == TokKind::Str {
                    self.bump();
                }
                Expr::Str(text)
            }
            TokKind::Op if tok.text == "(" => {
                self.bump();
                if self.at_op(")") {
                    self.bump();
                    return Expr::Tuple(Vec::new());
                }
                let inner = self.testlist(false);
                self.skip_until_close(")");
                inner
            }
            TokKind::Op if tok.text == "[" => {
                self.bump();
                let items = self.bracket_soup("]");
                Expr::Unknown(items)
            }
            TokKind::Op if tok.text == "{" => {
                self.bump();
                let items = self.bracket_soup("}");
                Expr::Unknown(items)
            }
            _ => {
                self.bump();
                Expr::unknown()
            }
        }
    }

    fn call(&mut self, func: Expr) -> Expr {
        let mut args = Vec::new();
        let mut keywords = Vec::new();
        let mut star_args = None;
        let mut kw_args = None;
        while !self.at_op(")") && !self.at_end() && self.peek().kind != TokKind::Newline {
            if self.eat_op("**") {
                kw_args = Some(Box::new(self.expr(false)));
            } else if self.eat_op("*") {
                star_args = Some(Box::new(self.expr(false)));
            } else if self.peek().kind == TokKind::Name && self.peek2().is(TokKind::Op, "=") {
                let name = self.bump().text;
                self.bump();
                keywords.push((name, self.expr(false)));
            } else {
                args.push(self.expr(false));
            }
            if !self.eat_op(",") {
                break;
            }
        }
        self.skip_until_close(")");
        Expr::Call {
            func: Box::new(func),
            args,
            keywords,
            star_args,
            kw_args,
        }
    }

    /// The `[...]` content of a subscript: a plain index, a tuple
    /// index, or (with colons) an unmodeled slice.
    fn subscript_index(&mut self) -> Expr {
        let mut items = Vec::new();
        let mut saw_colon = false;
        while !self.at_op("]") && !self.at_end() && self.peek().kind != TokKind::Newline {
            if self.eat_op(":") {
                saw_colon = true;
                continue;
            }
            if self.eat_op(",") {
                continue;
            }
            if self.at_expr_terminator(false) {
                break;
            }
            items.push(self.expr(false));
        }
        self.skip_until_close("]");
        if saw_colon {
            Expr::Unknown(items)
        } else if items.len() == 1 {
            items.pop().unwrap_or_else(Expr::unknown)
        } else if items.is_empty() {
            Expr::unknown()
        } else {
            Expr::Tuple(items)
        }
    }

    /// Expressions inside a list or dict display, separators dropped.
    fn bracket_soup(&mut self, close: &str) -> Vec<Expr> {
        let mut items = Vec::new();
        while !self.at_op(close) && !self.at_end() && self.peek().kind != TokKind::Newline {
            if self.eat_op(",") || self.eat_op(":") || self.eat_op("*") || self.eat_op("**") {
                continue;
            }
            if self.at_expr_terminator(false) {
                self.bump();
                continue;
            }
            items.push(self.expr(false));
        }
        self.skip_until_close(close);
        items
    }

    fn skip_until_close(&mut self, close: &str) {
        while !self.at_end() && self.peek().kind != TokKind::Newline {
            if self.eat_op(close) {
                return;
            }
            self.bump();
        }
    }
}
