//! Lexical scopes and the BuildScopes pass.
//!
//! Scopes live in an id-indexed arena: each [`Scope`] stores its parent as
//! an optional [`ScopeId`], so the parent chain is walkable without owning
//! back-references. The arena is built once, top-down, and is read-only for
//! every later pass.
//!
//! BuildScopes attaches a scope to every normalized node:
//!
//! - Each top-level section gets its own *global* scope holding every
//!   top-level declaration — minus the section's own binding when the
//!   section is a value definition or call, so value positions cannot
//!   reference themselves or be referenced before definition. Functions
//!   keep their own binding and may recurse.
//! - A function body opens a child scope holding the function binding and
//!   all parameters.
//! - Inside a block, each definition chains a new child scope, widening the
//!   visible set for *subsequent* siblings only.
//!
//! The pass records no diagnostics; BindingCheck reads its output.

use ql_base::Symbol;
use ql_language::ast::{Block, Expr, ExprKind, FuncDef, ItemKind, NodeId, Stmt, StmtKind};

use crate::context::AnalysisContext;

/// Index of a scope in the [`ScopeArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(pub u32);

/// What kind of declaration introduced a binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    FuncParameter,
    Function,
    Definition,
}

/// A name introduced into a scope, tagged with its declaring node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopeBinding {
    pub name: Symbol,
    pub node: NodeId,
    pub kind: BindingKind,
}

/// One lexical scope.
#[derive(Debug)]
pub struct Scope {
    pub parent: Option<ScopeId>,
    pub children: Vec<ScopeId>,
    pub is_global: bool,
    pub bindings: Vec<ScopeBinding>,
}

/// All scopes of one compilation, indexed by [`ScopeId`].
#[derive(Debug, Default)]
pub struct ScopeArena {
    scopes: Vec<Scope>,
}

impl ScopeArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a scope and links it under its parent.
    pub fn new_scope(&mut self, parent: Option<ScopeId>, is_global: bool) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(Scope {
            parent,
            children: Vec::new(),
            is_global,
            bindings: Vec::new(),
        });
        if let Some(parent) = parent {
            self.scopes[parent.0 as usize].children.push(id);
        }
        id
    }

    pub fn get(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.0 as usize]
    }

    pub fn add_binding(&mut self, id: ScopeId, binding: ScopeBinding) {
        self.scopes[id.0 as usize].bindings.push(binding);
    }

    /// Resolves `name` by walking the parent chain from `id`.
    pub fn in_scope(&self, id: ScopeId, name: Symbol) -> Option<ScopeBinding> {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let scope = self.get(current);
            if let Some(binding) = scope.bindings.iter().find(|b| b.name == name) {
                return Some(*binding);
            }
            cursor = scope.parent;
        }
        None
    }

    /// `true` when a binding visible from `id` has the same name as `node`'s
    /// binding but belongs to an earlier declaration.
    ///
    /// Only earlier declarations count: checks run at each declaration as if
    /// later bindings did not exist yet, so one shadowing pair yields one
    /// report, at the later site.
    pub fn already_declared(&self, id: ScopeId, name: Symbol, node: NodeId) -> bool {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let scope = self.get(current);
            if scope
                .bindings
                .iter()
                .any(|b| b.name == name && b.node != node && b.node < node)
            {
                return true;
            }
            cursor = scope.parent;
        }
        false
    }

    /// All names visible from `id`, innermost first. Used for suggestions.
    pub fn visible_names(&self, id: ScopeId) -> Vec<Symbol> {
        let mut names = Vec::new();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let scope = self.get(current);
            for binding in &scope.bindings {
                if !names.contains(&binding.name) {
                    names.push(binding.name);
                }
            }
            cursor = scope.parent;
        }
        names
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }
}

/// Attaches a scope to every normalized node. See the module docs for the
/// scoping rules.
pub fn build_scopes(ctx: &mut AnalysisContext) {
    let top_level = std::mem::take(&mut ctx.top_level);

    // Top-level declarations, in source order.
    let decls: Vec<(usize, Symbol, NodeId, BindingKind)> = top_level
        .sections
        .iter()
        .enumerate()
        .filter_map(|(index, item)| {
            let (name, node) = item.declared_name()?;
            let kind = match &item.kind {
                ItemKind::Func(_) => BindingKind::Function,
                _ => BindingKind::Definition,
            };
            Some((index, name, node, kind))
        })
        .collect();

    for (index, item) in top_level.sections.iter().enumerate() {
        let is_function = matches!(item.kind, ItemKind::Func(_));
        let global = ctx.scopes.new_scope(None, true);
        for (decl_index, name, node, kind) in &decls {
            if *decl_index == index && !is_function {
                continue;
            }
            ctx.scopes.add_binding(
                global,
                ScopeBinding {
                    name: *name,
                    node: *node,
                    kind: *kind,
                },
            );
        }

        ctx.scope_of.insert(item.id, global);
        match &item.kind {
            ItemKind::Func(func) => visit_func(ctx, func, global),
            ItemKind::Def(stmt) | ItemKind::Call(stmt) => visit_stmt_shallow(ctx, stmt, global),
            ItemKind::Incomplete => {}
        }
    }

    ctx.top_level = top_level;
}

fn visit_func(ctx: &mut AnalysisContext, func: &FuncDef, global: ScopeId) {
    ctx.scope_of.insert(func.id, global);

    let body_scope = ctx.scopes.new_scope(Some(global), false);
    ctx.scopes.add_binding(
        body_scope,
        ScopeBinding {
            name: func.name,
            node: func.id,
            kind: BindingKind::Function,
        },
    );
    for param in &func.params {
        ctx.scope_of.insert(param.id, body_scope);
        ctx.scopes.add_binding(
            body_scope,
            ScopeBinding {
                name: param.name,
                node: param.id,
                kind: BindingKind::FuncParameter,
            },
        );
    }

    visit_block(ctx, &func.body, body_scope);
}

/// Visits a top-level definition or call without opening a child scope.
fn visit_stmt_shallow(ctx: &mut AnalysisContext, stmt: &Stmt, scope: ScopeId) {
    ctx.scope_of.insert(stmt.id, scope);
    match &stmt.kind {
        StmtKind::Definition { value, .. } | StmtKind::Call(value) => {
            visit_expr(ctx, value, scope)
        }
        // Other statement kinds do not occur at the top level.
        _ => {}
    }
}

fn visit_block(ctx: &mut AnalysisContext, block: &Block, parent: ScopeId) {
    let mut current = ctx.scopes.new_scope(Some(parent), false);
    ctx.scope_of.insert(block.id, current);

    for stmt in &block.stmts {
        ctx.scope_of.insert(stmt.id, current);
        match &stmt.kind {
            StmtKind::Definition { name, value, .. } => {
                visit_expr(ctx, value, current);
                // Widen the in-scope set for subsequent siblings only.
                let widened = ctx.scopes.new_scope(Some(current), false);
                ctx.scopes.add_binding(
                    widened,
                    ScopeBinding {
                        name: *name,
                        node: stmt.id,
                        kind: BindingKind::Definition,
                    },
                );
                current = widened;
            }
            StmtKind::Assignment { value, .. } => visit_expr(ctx, value, current),
            StmtKind::Return { value } => visit_expr(ctx, value, current),
            StmtKind::If {
                condition,
                then_block,
                else_block,
                ..
            } => {
                visit_expr(ctx, condition, current);
                visit_block(ctx, then_block, current);
                if let Some(else_block) = else_block {
                    visit_block(ctx, else_block, current);
                }
            }
            StmtKind::Call(expr) => visit_expr(ctx, expr, current),
            StmtKind::Incomplete => {}
        }
    }
}

fn visit_expr(ctx: &mut AnalysisContext, expr: &Expr, scope: ScopeId) {
    ctx.scope_of.insert(expr.id, scope);
    match &expr.kind {
        ExprKind::Unary { operand, .. } => visit_expr(ctx, operand, scope),
        ExprKind::Binary { lhs, rhs, .. } => {
            visit_expr(ctx, lhs, scope);
            visit_expr(ctx, rhs, scope);
        }
        ExprKind::Call { args, .. } => {
            for arg in args {
                visit_expr(ctx, arg, scope);
            }
        }
        ExprKind::Identifier(_)
        | ExprKind::Boolean(_)
        | ExprKind::Number(_)
        | ExprKind::Incomplete => {}
    }
}

/// Visits every node of an [`Item`] and asserts it has a scope. Test helper
/// for the scope-totality invariant.
#[cfg(test)]
pub(crate) fn assert_scoped(ctx: &AnalysisContext, item: &ql_language::ast::Item) {
    fn check_expr(ctx: &AnalysisContext, expr: &Expr) {
        assert!(ctx.scope_of(expr.id).is_some(), "expr without scope");
        match &expr.kind {
            ExprKind::Unary { operand, .. } => check_expr(ctx, operand),
            ExprKind::Binary { lhs, rhs, .. } => {
                check_expr(ctx, lhs);
                check_expr(ctx, rhs);
            }
            ExprKind::Call { args, .. } => args.iter().for_each(|a| check_expr(ctx, a)),
            _ => {}
        }
    }
    fn check_block(ctx: &AnalysisContext, block: &Block) {
        assert!(ctx.scope_of(block.id).is_some(), "block without scope");
        for stmt in &block.stmts {
            assert!(ctx.scope_of(stmt.id).is_some(), "stmt without scope");
            match &stmt.kind {
                StmtKind::Definition { value, .. }
                | StmtKind::Assignment { value, .. }
                | StmtKind::Return { value }
                | StmtKind::Call(value) => check_expr(ctx, value),
                StmtKind::If {
                    condition,
                    then_block,
                    else_block,
                    ..
                } => {
                    check_expr(ctx, condition);
                    check_block(ctx, then_block);
                    if let Some(else_block) = else_block {
                        check_block(ctx, else_block);
                    }
                }
                StmtKind::Incomplete => {}
            }
        }
    }

    assert!(ctx.scope_of(item.id).is_some(), "item without scope");
    match &item.kind {
        ItemKind::Func(func) => {
            assert!(ctx.scope_of(func.id).is_some());
            for param in &func.params {
                assert!(ctx.scope_of(param.id).is_some());
            }
            check_block(ctx, &func.body);
        }
        ItemKind::Def(stmt) | ItemKind::Call(stmt) => {
            assert!(ctx.scope_of(stmt.id).is_some());
        }
        ItemKind::Incomplete => {}
    }
}
