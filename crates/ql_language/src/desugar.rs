//! Lowering from the raw AST to the normalized AST.
//!
//! Desugaring is a pure structural rewrite; it records no diagnostics.
//! Three things change shape:
//!
//! - **Attributes**: `@main func …` becomes a [`FuncDef`] with
//!   `is_entry = true`; `@never` and unattributed functions get `false`.
//! - **Multi-arm ifs**: the parser's collapsed
//!   `if c₁ … else if c₂ … else E` list becomes a right-nested chain of
//!   strictly binary [`StmtKind::If`] nodes. Every derived inner if records
//!   the outermost if's id in `desugared_from`, which FIR generation later
//!   uses to share a single join block across the chain.
//! - **Definitions**: `let` and `var` collapse into
//!   [`StmtKind::Definition`] with an `immutable` flag.
//!
//! Incomplete raw nodes map to incomplete normalized nodes, so downstream
//! passes can keep short-circuiting on damaged subtrees.

use crate::ast::raw::{
    Attribute, RawBlock, RawExpr, RawExprKind, RawFuncDef, RawItemKind, RawStmt, RawStmtKind,
    RawTopLevel,
};
use crate::ast::{
    Block, Expr, ExprKind, FuncDef, FuncParam, Item, ItemKind, NodeIdGen, Stmt, StmtKind, TopLevel,
};

/// Desugars a raw program. Fresh node ids continue the parser's sequence so
/// identities stay unique across both trees.
pub fn desugar(raw: &RawTopLevel<'_>, ids: &mut NodeIdGen) -> TopLevel {
    let sections = raw
        .sections
        .iter()
        .map(|item| {
            let id = ids.fresh();
            let kind = match &item.kind {
                RawItemKind::FuncDef(func) => ItemKind::Func(desugar_func(func, false, ids)),
                RawItemKind::Attributed { attribute, func } => {
                    let is_entry = matches!(attribute, Attribute::Main);
                    ItemKind::Func(desugar_func(func, is_entry, ids))
                }
                RawItemKind::Def(stmt) => ItemKind::Def(desugar_stmt(stmt, ids)),
                RawItemKind::Call(stmt) => ItemKind::Call(desugar_stmt(stmt, ids)),
                RawItemKind::Incomplete => ItemKind::Incomplete,
            };
            Item {
                id,
                span: item.span,
                kind,
            }
        })
        .collect();

    TopLevel { sections }
}

fn desugar_func(func: &RawFuncDef<'_>, is_entry: bool, ids: &mut NodeIdGen) -> FuncDef {
    FuncDef {
        id: ids.fresh(),
        span: func.span,
        name: func.name,
        params: func
            .params
            .iter()
            .map(|p| FuncParam {
                id: ids.fresh(),
                name: p.name,
                annotation: p.annotation.clone(),
                span: p.span,
            })
            .collect(),
        return_type: func.return_type.clone(),
        body: desugar_block(func.body, ids),
        is_entry,
    }
}

fn desugar_block(block: &RawBlock<'_>, ids: &mut NodeIdGen) -> Block {
    Block {
        id: ids.fresh(),
        stmts: block.stmts.iter().map(|s| desugar_stmt(s, ids)).collect(),
    }
}

fn desugar_stmt(stmt: &RawStmt<'_>, ids: &mut NodeIdGen) -> Stmt {
    let kind = match &stmt.kind {
        RawStmtKind::LetDef {
            name,
            annotation,
            value,
        } => StmtKind::Definition {
            name: *name,
            annotation: annotation.clone(),
            value: desugar_expr(value, ids),
            immutable: true,
        },
        RawStmtKind::VarDef {
            name,
            annotation,
            value,
        } => StmtKind::Definition {
            name: *name,
            annotation: annotation.clone(),
            value: desugar_expr(value, ids),
            immutable: false,
        },
        RawStmtKind::Assignment { target, value } => StmtKind::Assignment {
            target: *target,
            value: desugar_expr(value, ids),
        },
        RawStmtKind::Return { value } => StmtKind::Return {
            value: desugar_expr(value, ids),
        },
        RawStmtKind::If { arms, else_branch } => {
            return desugar_if(stmt, arms, *else_branch, ids);
        }
        RawStmtKind::Call { expr } => StmtKind::Call(desugar_expr(expr, ids)),
        RawStmtKind::Incomplete => StmtKind::Incomplete,
    };
    Stmt {
        id: ids.fresh(),
        span: stmt.span,
        kind,
    }
}

/// Rebuilds a multi-arm if as a right-nested binary chain.
///
/// For arms `[(c₁,b₁), …, (cₙ,bₙ)]` and else branch `E`, the innermost if is
/// `If(cₙ, bₙ, E)`; working outward, each earlier arm wraps the previous
/// result as the sole statement of its else block. The outermost if keeps
/// `desugared_from = None`; every derived inner if records the outermost id.
fn desugar_if(
    stmt: &RawStmt<'_>,
    arms: &[(&RawExpr<'_>, &RawBlock<'_>)],
    else_branch: Option<&RawBlock<'_>>,
    ids: &mut NodeIdGen,
) -> Stmt {
    debug_assert!(!arms.is_empty(), "the parser never builds an armless if");

    // Allocate the outermost id first so inner ifs can reference it.
    let outer_id = ids.fresh();

    let mut else_block = else_branch.map(|b| desugar_block(b, ids));

    // Fold the arms inside-out; index 0 becomes the outermost if.
    for (index, (cond, body)) in arms.iter().enumerate().rev() {
        let condition = desugar_expr(cond, ids);
        let then_block = desugar_block(body, ids);

        if index == 0 {
            return Stmt {
                id: outer_id,
                span: stmt.span,
                kind: StmtKind::If {
                    condition,
                    then_block,
                    else_block,
                    desugared_from: None,
                },
            };
        }

        let inner = Stmt {
            id: ids.fresh(),
            span: cond.span.merge(body.span),
            kind: StmtKind::If {
                condition,
                then_block,
                else_block,
                desugared_from: Some(outer_id),
            },
        };
        else_block = Some(Block {
            id: ids.fresh(),
            stmts: vec![inner],
        });
    }

    unreachable!("arm 0 returns from the loop")
}

fn desugar_expr(expr: &RawExpr<'_>, ids: &mut NodeIdGen) -> Expr {
    let kind = match &expr.kind {
        RawExprKind::Identifier(sym) => ExprKind::Identifier(*sym),
        RawExprKind::Boolean(value) => ExprKind::Boolean(*value),
        RawExprKind::Number(value) => ExprKind::Number(*value),
        RawExprKind::Unary { op, operand } => ExprKind::Unary {
            op: *op,
            operand: Box::new(desugar_expr(operand, ids)),
        },
        RawExprKind::Binary { op, lhs, rhs } => ExprKind::Binary {
            op: *op,
            lhs: Box::new(desugar_expr(lhs, ids)),
            rhs: Box::new(desugar_expr(rhs, ids)),
        },
        RawExprKind::FuncApp { callee, args } => ExprKind::Call {
            callee: *callee,
            args: args.iter().map(|a| desugar_expr(a, ids)).collect(),
        },
        RawExprKind::Incomplete => ExprKind::Incomplete,
    };
    Expr {
        id: ids.fresh(),
        span: expr.span,
        kind,
    }
}
