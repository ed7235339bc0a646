//! Statement-level AST for scope construction and call-site analysis.
//!
//! Deliberately coarse: expressions the analyses never look inside
//! collapse to [`Expr::Unknown`], which still carries its embedded
//! subexpressions so call sites buried in arithmetic are not lost.

/// A statement with the 1-based line range it covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub start_line: usize,
    pub end_line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StmtKind {
    FunctionDef(FunctionDef),
    ClassDef(ClassDef),
    Assign {
        /// Chained targets of `a = b = value`, or the single target of
        /// an augmented assignment.
        targets: Vec<Expr>,
        /// The operator of an augmented assignment (`+=`, `-=`, ...),
        /// without the trailing `=`. `None` for plain assignment.
        aug_op: Option<String>,
        value: Expr,
    },
    Import {
        names: Vec<ImportName>,
    },
    FromImport {
        /// Dotted module path after the relative dots; empty for
        /// `from . import x`.
        module: String,
        /// Count of leading dots.
        level: usize,
        names: Vec<ImportName>,
    },
    Return(Option<Expr>),
    /// Loop header; the body statements follow as siblings since loops
    /// do not open a scope.
    For {
        target: Expr,
        iter: Expr,
    },
    Expr(Expr),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionDef {
    pub name: String,
    pub params: Vec<Param>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassDef {
    pub name: String,
    pub bases: Vec<Expr>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: String,
    pub default: Option<Expr>,
    /// `*args`-style parameter.
    pub star: bool,
    /// `**kwargs`-style parameter.
    pub double_star: bool,
}

impl Param {
    pub fn plain(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default: None,
            star: false,
            double_star: false,
        }
    }
}

/// One imported name with its optional `as` alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportName {
    pub name: String,
    pub alias: Option<String>,
}

impl ImportName {
    /// The name the import binds in the importing scope: the alias if
    /// present, else the first component of the dotted path.
    pub fn bound_name(&self) -> &str {
        match &self.alias {
            Some(alias) => alias,
            None => self.name.split('.').next().unwrap_or(&self.name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Name(String),
    Attribute {
        value: Box<Expr>,
        attr: String,
    },
    Call {
        func: Box<Expr>,
        args: Vec<Expr>,
        keywords: Vec<(String, Expr)>,
        star_args: Option<Box<Expr>>,
        kw_args: Option<Box<Expr>>,
    },
    Subscript {
        value: Box<Expr>,
        index: Box<Expr>,
    },
    Str(String),
    Num(String),
    Tuple(Vec<Expr>),
    /// A construct the parser does not model; holds any
    /// subexpressions that were recognized inside it.
    Unknown(Vec<Expr>),
}

impl Expr {
    pub fn unknown() -> Self {
        Expr::Unknown(Vec::new())
    }

    /// Child expressions, for generic walks.
    pub fn children(&self) -> Vec<&Expr> {
        match self {
            Expr::Name(_) | Expr::Str(_) | Expr::Num(_) => Vec::new(),
            Expr::Attribute { value, .. } => vec![value],
            Expr::Call {
                func,
                args,
                keywords,
                star_args,
                kw_args,
            } => {
                let mut out: Vec<&Expr> = vec![func];
                out.extend(args.iter());
                out.extend(keywords.iter().map(|(_, e)| e));
                if let Some(e) = star_args {
                    out.push(e);
                }
                if let Some(e) = kw_args {
                    out.push(e);
                }
                out
            }
            Expr::Subscript { value, index } => vec![value, index],
            Expr::Tuple(items) | Expr::Unknown(items) => items.iter().collect(),
        }
    }
}

impl Stmt {
    /// Expressions appearing directly in this statement (not in nested
    /// def/class bodies).
    pub fn exprs(&self) -> Vec<&Expr> {
        match &self.kind {
            StmtKind::FunctionDef(def) => def
                .params
                .iter()
                .filter_map(|p| p.default.as_ref())
                .collect(),
            StmtKind::ClassDef(def) => def.bases.iter().collect(),
            StmtKind::Assign { targets, value, .. } => {
                let mut out: Vec<&Expr> = targets.iter().collect();
                out.push(value);
                out
            }
            StmtKind::Import { .. } | StmtKind::FromImport { .. } => Vec::new(),
            StmtKind::Return(value) => value.iter().collect(),
            StmtKind::For { target, iter } => vec![target, iter],
            StmtKind::Expr(expr) => vec![expr],
        }
    }
}
