//! Typecheck: operator, call, assignment, and return rules.
//!
//! Expression types are memoized per node id in the context's type cache,
//! which later passes (linearization, boolean value lowering) read back.
//! Definition types are registered through the symbol table as they are
//! computed, in source order, so a definition can use every declaration
//! typed before it plus any function.
//!
//! # Type rules
//!
//! | Construct | Rule |
//! |-----------|------|
//! | number literal | `Int` |
//! | boolean literal | `Bool` |
//! | `+ - *` | `Int × Int → Int` |
//! | `&& \|\|` | `Bool × Bool → Bool` |
//! | `! -` (unary) | `Bool → Bool` |
//! | call | arity and positional argument types; result is the declared return |
//! | definition | annotation, when present, must match the value |
//! | assignment | value must match the target's declared type |
//! | return | must match the declared return type; `Void` functions return nothing |
//! | if condition | `Bool` |
//!
//! Both unary operators typecheck against `Bool` — including `-`, which is
//! lexically numeric negation. This mirrors the language's defined
//! semantics; see the `neg_operator_requires_bool_operand` test.
//!
//! A non-`Void` function must contain at least one syntactic `return`.

use ql_base::{Diagnostics, Interner};
use ql_language::ast::{
    Block, Expr, ExprKind, FuncDef, ItemKind, NodeId, Stmt, StmtKind, TypeName,
};

use crate::context::AnalysisContext;
use crate::error::SemanticErrorKind;

/// Runs the typechecker over the whole program.
pub fn typecheck(ctx: &mut AnalysisContext, interner: &Interner, diagnostics: &mut Diagnostics) {
    let top_level = std::mem::take(&mut ctx.top_level);

    for item in &top_level.sections {
        if item.any_incomplete() {
            continue;
        }
        match &item.kind {
            ItemKind::Func(func) => check_func(ctx, interner, diagnostics, func),
            ItemKind::Def(stmt) | ItemKind::Call(stmt) => {
                check_stmt(ctx, interner, diagnostics, stmt, None)
            }
            ItemKind::Incomplete => {}
        }
    }

    ctx.top_level = top_level;
}

fn check_func(
    ctx: &mut AnalysisContext,
    interner: &Interner,
    diagnostics: &mut Diagnostics,
    func: &FuncDef,
) {
    check_block(ctx, interner, diagnostics, &func.body, func);

    if func.return_type != TypeName::Void && !block_contains_return(&func.body) {
        diagnostics.push(
            SemanticErrorKind::MissingReturn { name: func.name }
                .to_diagnostic(interner, func.span),
        );
    }
}

fn check_block(
    ctx: &mut AnalysisContext,
    interner: &Interner,
    diagnostics: &mut Diagnostics,
    block: &Block,
    func: &FuncDef,
) {
    for stmt in &block.stmts {
        check_stmt(ctx, interner, diagnostics, stmt, Some(func));
    }
}

fn check_stmt(
    ctx: &mut AnalysisContext,
    interner: &Interner,
    diagnostics: &mut Diagnostics,
    stmt: &Stmt,
    func: Option<&FuncDef>,
) {
    match &stmt.kind {
        StmtKind::Definition {
            name,
            annotation,
            value,
            ..
        } => {
            let value_type = check_expr(ctx, interner, diagnostics, value);
            if let (Some(annotated), Some(found)) = (annotation, &value_type) {
                if annotated != found {
                    diagnostics.push(
                        SemanticErrorKind::DefinitionTypeMismatch {
                            name: *name,
                            annotated: annotated.clone(),
                            found: found.clone(),
                        }
                        .to_diagnostic(interner, stmt.span),
                    );
                }
            }
            // The annotation wins when both are present.
            if let Some(ty) = annotation.clone().or(value_type) {
                ctx.symbols.assign_type_of(stmt.id, ty);
            }
        }
        StmtKind::Assignment { target, value } => {
            let value_type = check_expr(ctx, interner, diagnostics, value);
            let target_type = resolve_name_type(ctx, stmt.id, *target);
            if let (Some(expected), Some(found)) = (target_type, value_type) {
                if expected != found {
                    diagnostics.push(
                        SemanticErrorKind::AssignmentTypeMismatch {
                            name: *target,
                            expected,
                            found,
                        }
                        .to_diagnostic(interner, stmt.span),
                    );
                }
            }
        }
        StmtKind::Return { value } => {
            let value_type = check_expr(ctx, interner, diagnostics, value);
            if let Some(func) = func {
                if func.return_type == TypeName::Void {
                    diagnostics.push(
                        SemanticErrorKind::VoidFunctionReturnsValue
                            .to_diagnostic(interner, stmt.span),
                    );
                } else if let Some(found) = value_type {
                    if found != func.return_type {
                        diagnostics.push(
                            SemanticErrorKind::ReturnTypeMismatch {
                                expected: func.return_type.clone(),
                                found,
                            }
                            .to_diagnostic(interner, stmt.span),
                        );
                    }
                }
            }
        }
        StmtKind::If {
            condition,
            then_block,
            else_block,
            ..
        } => {
            let cond_type = check_expr(ctx, interner, diagnostics, condition);
            if let Some(found) = cond_type {
                if found != TypeName::Bool {
                    diagnostics.push(
                        SemanticErrorKind::IfConditionNotBool { found }
                            .to_diagnostic(interner, condition.span),
                    );
                }
            }
            if let Some(func) = func {
                check_block(ctx, interner, diagnostics, then_block, func);
                if let Some(else_block) = else_block {
                    check_block(ctx, interner, diagnostics, else_block, func);
                }
            }
        }
        StmtKind::Call(expr) => {
            check_expr(ctx, interner, diagnostics, expr);
        }
        StmtKind::Incomplete => {}
    }
}

/// Types one expression, memoizing into the context's type cache.
fn check_expr(
    ctx: &mut AnalysisContext,
    interner: &Interner,
    diagnostics: &mut Diagnostics,
    expr: &Expr,
) -> Option<TypeName> {
    if let Some(cached) = ctx.type_of(expr.id) {
        return Some(cached.clone());
    }

    let ty = match &expr.kind {
        ExprKind::Number(_) => Some(TypeName::Int),
        ExprKind::Boolean(_) => Some(TypeName::Bool),
        ExprKind::Identifier(name) => {
            let resolved = resolve_name_type(ctx, expr.id, *name);
            if resolved.is_none() {
                diagnostics.push(
                    SemanticErrorKind::DefinedLater { name: *name }
                        .to_diagnostic(interner, expr.span),
                );
            }
            resolved
        }
        ExprKind::Unary { op, operand } => {
            let operand_type = check_expr(ctx, interner, diagnostics, operand);
            if let Some(found) = operand_type {
                if found != TypeName::Bool {
                    diagnostics.push(
                        SemanticErrorKind::OperandTypeMismatch {
                            operator: op.symbol(),
                            expected: TypeName::Bool,
                            found,
                        }
                        .to_diagnostic(interner, operand.span),
                    );
                }
            }
            Some(TypeName::Bool)
        }
        ExprKind::Binary { op, lhs, rhs } => {
            let (expected, result) = if op.is_arithmetic() {
                (TypeName::Int, TypeName::Int)
            } else {
                (TypeName::Bool, TypeName::Bool)
            };
            for side in [lhs.as_ref(), rhs.as_ref()] {
                let side_type = check_expr(ctx, interner, diagnostics, side);
                if let Some(found) = side_type {
                    if found != expected {
                        diagnostics.push(
                            SemanticErrorKind::OperandTypeMismatch {
                                operator: op.symbol(),
                                expected: expected.clone(),
                                found,
                            }
                            .to_diagnostic(interner, side.span),
                        );
                    }
                }
            }
            Some(result)
        }
        ExprKind::Call { callee, args } => {
            let arg_types: Vec<Option<TypeName>> = args
                .iter()
                .map(|arg| check_expr(ctx, interner, diagnostics, arg))
                .collect();

            match ctx.symbols.lookup(*callee).cloned() {
                Some(info) => match info.params {
                    Some(params) => {
                        if params.len() != args.len() {
                            diagnostics.push(
                                SemanticErrorKind::ArityMismatch {
                                    name: *callee,
                                    expected: params.len(),
                                    found: args.len(),
                                }
                                .to_diagnostic(interner, expr.span),
                            );
                        } else {
                            for (position, ((_, expected), found)) in
                                params.iter().zip(arg_types.iter()).enumerate()
                            {
                                if let Some(found) = found {
                                    if found != expected {
                                        diagnostics.push(
                                            SemanticErrorKind::ArgumentTypeMismatch {
                                                name: *callee,
                                                position,
                                                expected: expected.clone(),
                                                found: found.clone(),
                                            }
                                            .to_diagnostic(interner, args[position].span),
                                        );
                                    }
                                }
                            }
                        }
                        match info.ty {
                            Some(TypeName::Arrow(_, ret)) => Some(*ret),
                            _ => None,
                        }
                    }
                    None => {
                        diagnostics.push(
                            SemanticErrorKind::NotAFunction { name: *callee }
                                .to_diagnostic(interner, expr.span),
                        );
                        None
                    }
                },
                None => {
                    diagnostics.push(
                        SemanticErrorKind::NotAFunction { name: *callee }
                            .to_diagnostic(interner, expr.span),
                    );
                    None
                }
            }
        }
        ExprKind::Incomplete => None,
    };

    if let Some(ty) = &ty {
        ctx.set_type(expr.id, ty.clone());
    }
    ty
}

/// Resolves a name at a node to its declaration's type, via the node's
/// scope.
fn resolve_name_type(
    ctx: &AnalysisContext,
    at: NodeId,
    name: ql_base::Symbol,
) -> Option<TypeName> {
    let scope = ctx.scope_of(at)?;
    let binding = ctx.scopes.in_scope(scope, name)?;
    ctx.symbols.type_of_decl(binding.node).cloned()
}

/// `true` when the block contains a `return` anywhere, syntactically.
fn block_contains_return(block: &Block) -> bool {
    block.stmts.iter().any(stmt_contains_return)
}

fn stmt_contains_return(stmt: &Stmt) -> bool {
    match &stmt.kind {
        StmtKind::Return { .. } => true,
        StmtKind::If {
            then_block,
            else_block,
            ..
        } => {
            block_contains_return(then_block)
                || else_block.as_ref().map(block_contains_return).unwrap_or(false)
        }
        _ => false,
    }
}
