//! Offset-based name resolution over one module snapshot.
//!
//! [`ScopeNameFinder`] combines the lexical scans of
//! [`Worder`](crate::text::worder::Worder) with the scope tree to
//! answer "what does the name at this offset refer to". Resolution is
//! read-only; failure to resolve is `None`, never an error.
//!
//! Candidate interpretations are tried in a fixed priority order:
//! keyword-argument name, class-body assignment, def/class header
//! name, `from`-statement module, then ordinary primary-expression
//! lookup through the scope chain with a builtin fallback.

use tracing::trace;

use crate::semantic::builtins;
use crate::semantic::module::Module;
use crate::semantic::object::{Binding, BoundObject, Callee, Definition, ObjectId, PyObject};
use crate::semantic::scope::{ScopeId, ScopeKind};
use crate::syntax::ast::StmtKind;
use crate::text::worder::Worder;

pub struct ScopeNameFinder<'a> {
    module: &'a Module,
    worder: Worder<'a>,
}

impl<'a> ScopeNameFinder<'a> {
    pub fn new(module: &'a Module) -> Self {
        Self {
            module,
            worder: Worder::new(&module.buffer),
        }
    }

    /// The primary expression at `offset` and what it resolves to.
    /// Either side may be `None`: an offset on no identifier has no
    /// name, and a name the analysis cannot see through has no
    /// binding. The special-cased positions (keyword arguments,
    /// class-body and header names, `from` modules) report the bare
    /// word; everything else reports the dotted chain.
    pub fn resolve_offset(&self, offset: usize) -> (Option<String>, Option<Binding>) {
        let word = self.worder.word_at(offset);
        if word.is_empty() {
            return (None, None);
        }

        if self.worder.is_function_keyword_parameter(offset) {
            let binding = self.keyword_parameter(offset, &word);
            trace!("[RESOLVE] keyword-param name={} found={}", word, binding.is_some());
            return (Some(word), binding);
        }

        let line = self.module.buffer.line_of_offset(offset);
        let scope = self.module.scopes.inner_scope_for_line(line);

        if self.worder.is_name_assigned_in_class_body(offset)
            && self.module.scopes.get(scope).kind == ScopeKind::Class
        {
            let binding = self.module.scopes.get(scope).binding(&word).cloned();
            return (Some(word), binding);
        }

        if self.worder.is_class_or_function_header_name(offset) {
            // The header name binds in the scope *enclosing* the def.
            let header_scope = if self.module.scopes.get(scope).name == word {
                self.module.scopes.get(scope).parent.unwrap_or(scope)
            } else {
                scope
            };
            let binding = self.module.scopes.get(header_scope).binding(&word).cloned();
            return (Some(word), binding);
        }

        if self.worder.is_from_statement_module(offset) {
            let primary = self.worder.primary_at(offset);
            let level = self.relative_level(self.worder.primary_range(offset).start);
            return (
                Some(word),
                Some(Binding {
                    object: BoundObject::DeferredModule {
                        name: primary,
                        level,
                    },
                    definition: Definition::External,
                }),
            );
        }

        let primary = self.worder.primary_at(offset);
        let binding = self
            .resolve_primary(&primary, scope)
            .or_else(|| self.from_import_name(offset, line, &word));
        trace!(
            "[RESOLVE] primary={} scope={} found={}",
            primary,
            self.module.scopes.get(scope).name,
            binding.is_some()
        );
        // The full dotted chain, not just the word under the offset:
        // `c.b` resolved at `b` reports `c.b`.
        (Some(primary), binding)
    }

    /// The call target at `offset`, normalized: a function, a class
    /// used as constructor, or an object called through `__call__`.
    pub fn enclosing_function(&self, offset: usize) -> Option<Callee> {
        let (_, binding) = self.resolve_offset(offset);
        self.callee_of(&binding?)
    }

    pub fn callee_of(&self, binding: &Binding) -> Option<Callee> {
        let BoundObject::Local(id) = binding.object else {
            return None;
        };
        match self.module.objects.get(id) {
            PyObject::Function { .. } => Some(Callee::Function { function: id }),
            PyObject::Class { attributes, .. } => {
                let init = attributes.get("__init__").and_then(|b| match b.object {
                    BoundObject::Local(f)
                        if matches!(self.module.objects.get(f), PyObject::Function { .. }) =>
                    {
                        Some(f)
                    }
                    _ => None,
                });
                Some(Callee::Initializer { class: id, init })
            }
            PyObject::Module { .. } => None,
            PyObject::Unknown => None,
        }
        .or_else(|| self.call_attribute(id))
    }

    fn call_attribute(&self, id: ObjectId) -> Option<Callee> {
        let attrs = self.module.objects.get(id).attributes()?;
        let call = attrs.get("__call__")?;
        match call.object {
            BoundObject::Local(f)
                if matches!(self.module.objects.get(f), PyObject::Function { .. }) =>
            {
                Some(Callee::CallAttribute {
                    object: id,
                    function: f,
                })
            }
            _ => None,
        }
    }

    /// Resolve a dotted primary expression starting from `scope`.
    pub fn resolve_primary(&self, primary: &str, scope: ScopeId) -> Option<Binding> {
        let components = split_chain(primary);
        let (head, rest) = components.split_first()?;
        if head.has_suffix {
            // A call or subscript result: nothing static to say.
            return None;
        }
        let mut binding = self.lookup(scope, &head.name)?;

        // `self.attr` inside a method reaches the class attributes.
        if !rest.is_empty() && binding.object == BoundObject::Unknown {
            if let Some(class) = self.method_instance_class(scope, &head.name) {
                binding = Binding {
                    object: BoundObject::Local(class),
                    definition: binding.definition,
                };
            }
        }

        for component in rest {
            if component.has_suffix {
                return None;
            }
            let BoundObject::Local(id) = binding.object else {
                // Deferred modules need a workspace to look inside.
                return None;
            };
            let attrs = self.module.objects.get(id).attributes()?;
            binding = attrs.get(&component.name)?.clone();
        }
        Some(binding)
    }

    /// Walk the scope chain, skipping class scopes other than the
    /// starting one (class bodies are invisible to nested functions),
    /// then fall back to the builtin table.
    fn lookup(&self, start: ScopeId, name: &str) -> Option<Binding> {
        for (i, id) in self.module.scopes.chain(start).enumerate() {
            let scope = self.module.scopes.get(id);
            if i > 0 && scope.kind == ScopeKind::Class {
                continue;
            }
            if let Some(binding) = scope.binding(name) {
                return Some(binding.clone());
            }
        }
        builtins::lookup(name).map(|b| Binding::builtin(b.name))
    }

    /// If `name` is the instance parameter of the method whose scope
    /// chain starts at `start`, the class it belongs to.
    fn method_instance_class(&self, start: ScopeId, name: &str) -> Option<ObjectId> {
        for id in self.module.scopes.chain(start) {
            let scope = self.module.scopes.get(id);
            if scope.kind != ScopeKind::Function {
                continue;
            }
            let function = scope.object?;
            let PyObject::Function {
                params, is_method, ..
            } = self.module.objects.get(function)
            else {
                continue;
            };
            if !is_method || params.first().map(|p| p.name.as_str()) != Some(name) {
                return None;
            }
            let parent = scope.parent?;
            return self.module.scopes.get(parent).object;
        }
        None
    }

    /// Resolve the keyword name in `f(name=value)` to the formal
    /// parameter binding of the called function.
    fn keyword_parameter(&self, offset: usize, word: &str) -> Option<Binding> {
        let parens = self.worder.find_parens_start_from_inside(offset, 0);
        if parens == 0 && self.module.buffer.chars().first() != Some(&'(') {
            return None;
        }
        let line = self.module.buffer.line_of_offset(parens);
        let scope = self.module.scopes.inner_scope_for_line(line);
        let primary = self.worder.primary_at(parens.saturating_sub(1));
        let binding = self.resolve_primary(&primary, scope)?;
        let callee = self.callee_of(&binding)?;
        let function = callee.target_function()?;
        let function_scope = self.scope_of_object(function)?;
        self.module
            .scopes
            .get(function_scope)
            .binding(word)
            .cloned()
    }

    fn scope_of_object(&self, object: ObjectId) -> Option<ScopeId> {
        self.module
            .scopes
            .iter()
            .find(|(_, s)| s.object == Some(object))
            .map(|(id, _)| id)
    }

    /// A name used inside this module's own `from ... import` clause
    /// resolves through the named module.
    fn from_import_name(&self, offset: usize, line: usize, word: &str) -> Option<Binding> {
        if !self.worder.is_name_after_from_import(offset) {
            return None;
        }
        let scope = self.module.scopes.inner_scope_for_line(line);
        for id in self.module.scopes.chain(scope) {
            for stmt in &self.module.scopes.get(id).stmts {
                let StmtKind::FromImport {
                    module,
                    level,
                    names,
                } = &stmt.kind
                else {
                    continue;
                };
                if !(stmt.start_line <= line && line <= stmt.end_line) {
                    continue;
                }
                if names.iter().any(|n| n.name == word) {
                    return Some(Binding {
                        object: BoundObject::DeferredImported {
                            module: module.clone(),
                            level: *level,
                            name: word.to_string(),
                        },
                        definition: Definition::External,
                    });
                }
            }
        }
        None
    }

    /// Count the relative-import dots immediately before a module name
    /// starting at `start`.
    fn relative_level(&self, start: usize) -> usize {
        let chars = self.module.buffer.chars();
        let mut level = 0;
        let mut i = start;
        while i > 0 && chars[i - 1] == '.' {
            level += 1;
            i -= 1;
        }
        level
    }
}

struct ChainComponent {
    name: String,
    /// Whether the component carried a call or subscript suffix.
    has_suffix: bool,
}

/// Split a primary expression on top-level dots, outside strings and
/// bracket groups.
fn split_chain(primary: &str) -> Vec<ChainComponent> {
    let mut components = Vec::new();
    let mut name = String::new();
    let mut has_suffix = false;
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for c in primary.chars() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '\'' | '"' => quote = Some(c),
            '(' | '[' | '{' => {
                depth += 1;
                has_suffix = true;
            }
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            '.' if depth == 0 => {
                components.push(ChainComponent {
                    name: std::mem::take(&mut name),
                    has_suffix,
                });
                has_suffix = false;
            }
            _ if depth == 0 && !c.is_whitespace() => name.push(c),
            _ => {}
        }
    }
    components.push(ChainComponent { name, has_suffix });
    components
}
