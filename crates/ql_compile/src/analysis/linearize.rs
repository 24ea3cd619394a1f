//! AST linearization: hoist compound arithmetic into fresh bindings.
//!
//! After this pass, every compound arithmetic sub-expression has been
//! replaced by an immutable `tmp_$N$` definition introduced immediately
//! before its use. Boolean compounds (`&&`, `||`, and unary operators) are
//! deliberately left in expression form: their value comes from control
//! flow, and the FIR short-circuit lowering expands them into branches that
//! skip the right operand when the left decides.
//!
//! # Binding policy
//!
//! - identifiers and literals are *safe to bind* and produce no bindings;
//! - an arithmetic binary whose linearized operands are both safe is bound
//!   to a fresh temporary, and the temporary's name replaces it;
//! - boolean binaries linearize their children in a restricted context
//!   (arithmetic inside an operand still binds, calls do not — hoisting a
//!   call out of a short-circuit operand would evaluate it eagerly) and are
//!   never bound themselves;
//! - unary operators linearize their operand and stay in expression form;
//! - a call is bound only where calls may be hoisted and all of its
//!   arguments were safe; otherwise it passes through.
//!
//! Anything unsafe "spoils" its parent: the parent stays inline too.
//!
//! Fresh temporaries get their types registered in the context's type cache
//! and symbol table, so later passes still see a fully typed tree.

use ql_base::Interner;
use ql_language::ast::{
    Block, Expr, ExprKind, Item, ItemKind, Stmt, StmtKind, TopLevel,
};

use crate::context::AnalysisContext;

/// Runs linearization over the whole program.
pub fn linearize(ctx: &mut AnalysisContext, interner: &mut Interner) {
    let top_level = std::mem::take(&mut ctx.top_level);
    let mut lin = Linearizer { ctx, interner };

    let mut sections = Vec::with_capacity(top_level.sections.len());
    for item in top_level.sections {
        match item.kind {
            ItemKind::Func(mut func) => {
                func.body = lin.block(func.body);
                sections.push(Item {
                    id: item.id,
                    span: item.span,
                    kind: ItemKind::Func(func),
                });
            }
            ItemKind::Def(stmt) => {
                let (binds, stmt) = lin.stmt(stmt);
                lin.push_top_level_binds(&mut sections, binds);
                sections.push(Item {
                    id: item.id,
                    span: item.span,
                    kind: ItemKind::Def(stmt),
                });
            }
            ItemKind::Call(stmt) => {
                let (binds, stmt) = lin.stmt(stmt);
                lin.push_top_level_binds(&mut sections, binds);
                sections.push(Item {
                    id: item.id,
                    span: item.span,
                    kind: ItemKind::Call(stmt),
                });
            }
            ItemKind::Incomplete => sections.push(item),
        }
    }

    lin.ctx.top_level = TopLevel { sections };
}

struct Linearizer<'c, 'i> {
    ctx: &'c mut AnalysisContext,
    interner: &'i mut Interner,
}

impl Linearizer<'_, '_> {
    fn push_top_level_binds(&mut self, sections: &mut Vec<Item>, binds: Vec<Stmt>) {
        for bind in binds {
            let id = self.ctx.ids.fresh();
            sections.push(Item {
                id,
                span: bind.span,
                kind: ItemKind::Def(bind),
            });
        }
    }

    fn block(&mut self, block: Block) -> Block {
        let mut stmts = Vec::with_capacity(block.stmts.len());
        for stmt in block.stmts {
            let (binds, stmt) = self.stmt(stmt);
            stmts.extend(binds);
            stmts.push(stmt);
        }
        Block {
            id: block.id,
            stmts,
        }
    }

    /// Linearizes one statement, returning the hoisted definitions that must
    /// precede it.
    fn stmt(&mut self, stmt: Stmt) -> (Vec<Stmt>, Stmt) {
        let mut binds = Vec::new();
        let kind = match stmt.kind {
            StmtKind::Definition {
                name,
                annotation,
                value,
                immutable,
            } => {
                let (value, _) = self.expr(value, true, &mut binds);
                StmtKind::Definition {
                    name,
                    annotation,
                    value,
                    immutable,
                }
            }
            StmtKind::Assignment { target, value } => {
                let (value, _) = self.expr(value, true, &mut binds);
                StmtKind::Assignment { target, value }
            }
            StmtKind::Return { value } => {
                let (value, _) = self.expr(value, true, &mut binds);
                StmtKind::Return { value }
            }
            StmtKind::If {
                condition,
                then_block,
                else_block,
                desugared_from,
            } => {
                // Conditions are boolean context: calls stay put.
                let (condition, _) = self.expr(condition, false, &mut binds);
                StmtKind::If {
                    condition,
                    then_block: self.block(then_block),
                    else_block: else_block.map(|b| self.block(b)),
                    desugared_from,
                }
            }
            StmtKind::Call(expr) => {
                // The call is the statement; only its arguments linearize.
                match expr.kind {
                    ExprKind::Call { callee, args } => {
                        let args = args
                            .into_iter()
                            .map(|arg| self.expr(arg, true, &mut binds).0)
                            .collect();
                        StmtKind::Call(Expr {
                            id: expr.id,
                            span: expr.span,
                            kind: ExprKind::Call { callee, args },
                        })
                    }
                    other => StmtKind::Call(Expr {
                        id: expr.id,
                        span: expr.span,
                        kind: other,
                    }),
                }
            }
            StmtKind::Incomplete => StmtKind::Incomplete,
        };
        (
            binds,
            Stmt {
                id: stmt.id,
                span: stmt.span,
                kind,
            },
        )
    }

    /// Linearizes one expression. Returns the rewritten expression and
    /// whether it is safe to bind.
    fn expr(&mut self, expr: Expr, allow_calls: bool, binds: &mut Vec<Stmt>) -> (Expr, bool) {
        match expr.kind {
            ExprKind::Identifier(_) | ExprKind::Boolean(_) | ExprKind::Number(_) => (expr, true),
            ExprKind::Incomplete => (expr, false),
            ExprKind::Unary { op, operand } => {
                let (operand, _) = self.expr(*operand, false, binds);
                (
                    Expr {
                        id: expr.id,
                        span: expr.span,
                        kind: ExprKind::Unary {
                            op,
                            operand: Box::new(operand),
                        },
                    },
                    false,
                )
            }
            ExprKind::Binary { op, lhs, rhs } if op.is_arithmetic() => {
                let (lhs, lhs_safe) = self.expr(*lhs, allow_calls, binds);
                let (rhs, rhs_safe) = self.expr(*rhs, allow_calls, binds);
                let rebuilt = Expr {
                    id: expr.id,
                    span: expr.span,
                    kind: ExprKind::Binary {
                        op,
                        lhs: Box::new(lhs),
                        rhs: Box::new(rhs),
                    },
                };
                if lhs_safe && rhs_safe {
                    (self.bind(rebuilt, binds), true)
                } else {
                    (rebuilt, false)
                }
            }
            ExprKind::Binary { op, lhs, rhs } => {
                // Boolean operator: operands restrict call hoisting.
                let (lhs, _) = self.expr(*lhs, false, binds);
                let (rhs, _) = self.expr(*rhs, false, binds);
                (
                    Expr {
                        id: expr.id,
                        span: expr.span,
                        kind: ExprKind::Binary {
                            op,
                            lhs: Box::new(lhs),
                            rhs: Box::new(rhs),
                        },
                    },
                    false,
                )
            }
            ExprKind::Call { callee, args } => {
                let mut all_safe = true;
                let args: Vec<Expr> = args
                    .into_iter()
                    .map(|arg| {
                        let (arg, safe) = self.expr(arg, allow_calls, binds);
                        all_safe &= safe;
                        arg
                    })
                    .collect();
                let rebuilt = Expr {
                    id: expr.id,
                    span: expr.span,
                    kind: ExprKind::Call { callee, args },
                };
                if allow_calls && all_safe {
                    (self.bind(rebuilt, binds), true)
                } else {
                    (rebuilt, false)
                }
            }
        }
    }

    /// Hoists `value` into a fresh immutable definition and returns the
    /// identifier that replaces it.
    fn bind(&mut self, value: Expr, binds: &mut Vec<Stmt>) -> Expr {
        let ty = self.ctx.type_of(value.id).cloned();
        let name = self.ctx.gensym.fresh(self.interner, "tmp");
        let def_id = self.ctx.ids.fresh();
        let ident_id = self.ctx.ids.fresh();
        if let Some(ty) = ty {
            self.ctx.set_type(ident_id, ty.clone());
            self.ctx.symbols.assign_type_of(def_id, ty);
        }
        let span = value.span;
        binds.push(Stmt {
            id: def_id,
            span,
            kind: StmtKind::Definition {
                name,
                annotation: None,
                value,
                immutable: true,
            },
        });
        Expr {
            id: ident_id,
            span,
            kind: ExprKind::Identifier(name),
        }
    }
}
