//! Construction of a [`Module`] snapshot from parsed statements.
//!
//! One pass over the statement tree: def/class statements open nested
//! scopes, assignments and imports create bindings, and `self.attr`
//! assignments inside methods add instance attributes to the enclosing
//! class. The resulting scope tree and object arena are immutable.

use tracing::trace;

use crate::base::{ParseError, SourceBuffer};
use crate::semantic::module::Module;
use crate::semantic::object::{Binding, BoundObject, Definition, ObjectArena, ObjectId, PyObject};
use crate::semantic::scope::{ScopeArena, ScopeId, ScopeKind};
use crate::syntax::ast::{Expr, Stmt, StmtKind};
use crate::syntax::parser;

/// Parse `text` and build the module snapshot. The parse error, if
/// any, is returned alongside the (degraded) snapshot so callers can
/// decide whether it is fatal.
pub fn build_module(name: &str, resource: &str, text: &str) -> (Module, Option<ParseError>) {
    let parsed = parser::parse_module(text);
    let buffer = SourceBuffer::new(text);
    let mut builder = Builder {
        scopes: ScopeArena::new(),
        objects: ObjectArena::new(),
        resource,
    };
    let root_object = builder.objects.alloc(PyObject::Module {
        name: name.to_string(),
        attributes: Default::default(),
    });
    let root = builder
        .scopes
        .alloc(ScopeKind::Module, name, None, 1, buffer.line_count());
    builder.scopes.get_mut(root).object = Some(root_object);
    builder.walk(&parsed.stmts, root, None);

    let attributes = builder.scopes.get(root).bindings.clone();
    if let PyObject::Module {
        attributes: attrs, ..
    } = builder.objects.get_mut(root_object)
    {
        *attrs = attributes;
    }
    trace!(
        "[BUILD] module={} scopes={} objects={} degraded={}",
        name,
        builder.scopes.len(),
        builder.objects.len(),
        parsed.error.is_some()
    );

    let degraded = parsed.error.is_some();
    let module = Module::new(
        name.to_string(),
        resource.to_string(),
        buffer,
        builder.scopes,
        builder.objects,
        root_object,
        degraded,
    );
    (module, parsed.error)
}

/// Class context threaded through method bodies: the class object and
/// the method's first parameter name (usually `self`).
#[derive(Clone, Copy)]
struct ClassCtx<'a> {
    class: ObjectId,
    self_name: Option<&'a str>,
}

struct Builder<'a> {
    scopes: ScopeArena,
    objects: ObjectArena,
    resource: &'a str,
}

impl<'a> Builder<'a> {
    fn walk(&mut self, stmts: &[Stmt], scope: ScopeId, ctx: Option<ClassCtx<'_>>) {
        self.scopes.get_mut(scope).stmts = stmts.to_vec();
        for stmt in stmts {
            match &stmt.kind {
                StmtKind::FunctionDef(def) => self.function_def(stmt, def, scope, ctx),
                StmtKind::ClassDef(def) => self.class_def(stmt, def, scope),
                StmtKind::Assign { targets, .. } => {
                    for target in targets {
                        self.bind_target(target, scope, stmt.start_line, ctx);
                    }
                }
                StmtKind::Import { names } => {
                    for name in names {
                        let deferred = match &name.alias {
                            Some(_) => name.name.clone(),
                            // `import a.b` binds `a` to module a.
                            None => name.bound_name().to_string(),
                        };
                        self.scopes.get_mut(scope).bindings.insert(
                            name.bound_name().to_string(),
                            Binding {
                                object: BoundObject::DeferredModule {
                                    name: deferred,
                                    level: 0,
                                },
                                definition: Definition::Location {
                                    resource: self.resource.to_string(),
                                    line: stmt.start_line,
                                },
                            },
                        );
                    }
                }
                StmtKind::FromImport {
                    module,
                    level,
                    names,
                } => {
                    for name in names {
                        if name.name == "*" {
                            continue;
                        }
                        self.scopes.get_mut(scope).bindings.insert(
                            name.bound_name().to_string(),
                            Binding {
                                object: BoundObject::DeferredImported {
                                    module: module.clone(),
                                    level: *level,
                                    name: name.name.clone(),
                                },
                                definition: Definition::Location {
                                    resource: self.resource.to_string(),
                                    line: stmt.start_line,
                                },
                            },
                        );
                    }
                }
                StmtKind::For { target, .. } => {
                    self.bind_target(target, scope, stmt.start_line, ctx);
                }
                StmtKind::Return(_) | StmtKind::Expr(_) => {}
            }
        }
    }

    fn function_def(
        &mut self,
        stmt: &Stmt,
        def: &crate::syntax::ast::FunctionDef,
        scope: ScopeId,
        ctx: Option<ClassCtx<'_>>,
    ) {
        let in_class_body = self.scopes.get(scope).kind == ScopeKind::Class;
        let function = self.objects.alloc(PyObject::Function {
            name: def.name.clone(),
            params: def.params.clone(),
            is_method: in_class_body,
        });
        self.scopes.get_mut(scope).bindings.insert(
            def.name.clone(),
            Binding::local(function, self.resource, stmt.start_line),
        );
        let child = self.scopes.alloc(
            ScopeKind::Function,
            def.name.clone(),
            Some(scope),
            stmt.start_line,
            stmt.end_line,
        );
        self.scopes.get_mut(child).object = Some(function);
        for param in &def.params {
            self.scopes.get_mut(child).bindings.insert(
                param.name.clone(),
                Binding::unknown(self.resource, stmt.start_line),
            );
        }
        // Inside a class body the method's first parameter names the
        // instance; `self.attr = ...` in its body defines a class
        // attribute.
        let inner_ctx = if in_class_body {
            self.scopes.get(scope).object.map(|class| ClassCtx {
                class,
                self_name: def.params.first().map(|p| p.name.as_str()),
            })
        } else {
            ctx
        };
        self.walk(&def.body, child, inner_ctx);
    }

    fn class_def(&mut self, stmt: &Stmt, def: &crate::syntax::ast::ClassDef, scope: ScopeId) {
        let bases = def.bases.iter().filter_map(base_name).collect();
        let class = self.objects.alloc(PyObject::Class {
            name: def.name.clone(),
            bases,
            attributes: Default::default(),
        });
        self.scopes.get_mut(scope).bindings.insert(
            def.name.clone(),
            Binding::local(class, self.resource, stmt.start_line),
        );
        let child = self.scopes.alloc(
            ScopeKind::Class,
            def.name.clone(),
            Some(scope),
            stmt.start_line,
            stmt.end_line,
        );
        self.scopes.get_mut(child).object = Some(class);
        self.walk(&def.body, child, None);

        // Class-body bindings become attributes, overriding any
        // instance attributes the method walk collected first.
        let body_bindings = self.scopes.get(child).bindings.clone();
        if let PyObject::Class { attributes, .. } = self.objects.get_mut(class) {
            for (name, binding) in body_bindings {
                attributes.insert(name, binding);
            }
        }
    }

    fn bind_target(
        &mut self,
        target: &Expr,
        scope: ScopeId,
        line: usize,
        ctx: Option<ClassCtx<'_>>,
    ) {
        match target {
            Expr::Name(name) => {
                self.scopes
                    .get_mut(scope)
                    .bindings
                    .insert(name.clone(), Binding::unknown(self.resource, line));
            }
            Expr::Tuple(items) => {
                for item in items {
                    self.bind_target(item, scope, line, ctx);
                }
            }
            Expr::Attribute { value, attr } => {
                let Some(ctx) = ctx else { return };
                let Expr::Name(base) = value.as_ref() else {
                    return;
                };
                if ctx.self_name != Some(base.as_str()) {
                    return;
                }
                let binding = Binding::unknown(self.resource, line);
                if let PyObject::Class { attributes, .. } = self.objects.get_mut(ctx.class) {
                    // Class-body definitions win over instance ones.
                    attributes.entry(attr.clone()).or_insert(binding);
                }
            }
            // Subscript targets bind nothing; the call-site walk turns
            // them into `__setitem__` observations.
            _ => {}
        }
    }
}

fn base_name(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Name(name) => Some(name.clone()),
        Expr::Attribute { value, attr } => base_name(value).map(|v| format!("{v}.{attr}")),
        _ => None,
    }
}
