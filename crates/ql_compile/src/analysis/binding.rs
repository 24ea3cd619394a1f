//! BindingCheck: name resolution errors.
//!
//! Reports, in one traversal:
//!
//! - identifier expressions whose name is not in scope,
//! - calls to names not in scope,
//! - declarations shadowing an earlier visible binding,
//! - duplicate parameter names within one function.
//!
//! Unresolved names get a "did you mean" suggestion when a visible name is
//! within edit distance two. Incomplete subtrees are skipped entirely; the
//! parser already reported them.

use ql_base::{Diagnostics, Interner, Span, Symbol};
use ql_language::ast::{Block, Expr, ExprKind, FuncDef, ItemKind, Stmt, StmtKind};

use crate::analysis::scopes::ScopeId;
use crate::context::AnalysisContext;
use crate::error::SemanticErrorKind;
use crate::suggest::find_similar;

/// Runs the check over the whole program.
pub fn check_bindings(ctx: &AnalysisContext, interner: &Interner, diagnostics: &mut Diagnostics) {
    for item in &ctx.top_level.sections {
        if item.any_incomplete() {
            continue;
        }
        match &item.kind {
            ItemKind::Func(func) => check_func(ctx, interner, diagnostics, func),
            ItemKind::Def(stmt) | ItemKind::Call(stmt) => {
                check_stmt(ctx, interner, diagnostics, stmt)
            }
            ItemKind::Incomplete => {}
        }
    }
}

fn check_func(
    ctx: &AnalysisContext,
    interner: &Interner,
    diagnostics: &mut Diagnostics,
    func: &FuncDef,
) {
    // Duplicate parameters are a dedicated error, not shadowing.
    let mut seen: Vec<Symbol> = Vec::new();
    for param in &func.params {
        if seen.contains(&param.name) {
            diagnostics.push(
                SemanticErrorKind::ParameterNamesNotUnique { name: param.name }
                    .to_diagnostic(interner, param.span),
            );
        } else {
            seen.push(param.name);
        }
    }

    check_declaration(ctx, interner, diagnostics, func.name, func.id, func.span);
    check_block(ctx, interner, diagnostics, &func.body);
}

fn check_block(
    ctx: &AnalysisContext,
    interner: &Interner,
    diagnostics: &mut Diagnostics,
    block: &Block,
) {
    for stmt in &block.stmts {
        check_stmt(ctx, interner, diagnostics, stmt);
    }
}

fn check_stmt(
    ctx: &AnalysisContext,
    interner: &Interner,
    diagnostics: &mut Diagnostics,
    stmt: &Stmt,
) {
    if stmt.any_incomplete() {
        return;
    }
    match &stmt.kind {
        StmtKind::Definition { name, value, .. } => {
            check_declaration(ctx, interner, diagnostics, *name, stmt.id, stmt.span);
            check_expr(ctx, interner, diagnostics, value);
        }
        StmtKind::Assignment { target, value } => {
            if let Some(scope) = ctx.scope_of(stmt.id) {
                if ctx.scopes.in_scope(scope, *target).is_none() {
                    report_unbound(ctx, interner, diagnostics, *target, scope, stmt.span, false);
                }
            }
            check_expr(ctx, interner, diagnostics, value);
        }
        StmtKind::Return { value } => check_expr(ctx, interner, diagnostics, value),
        StmtKind::If {
            condition,
            then_block,
            else_block,
            ..
        } => {
            check_expr(ctx, interner, diagnostics, condition);
            check_block(ctx, interner, diagnostics, then_block);
            if let Some(else_block) = else_block {
                check_block(ctx, interner, diagnostics, else_block);
            }
        }
        StmtKind::Call(expr) => check_expr(ctx, interner, diagnostics, expr),
        StmtKind::Incomplete => {}
    }
}

/// Shadowing check at a declaration site.
fn check_declaration(
    ctx: &AnalysisContext,
    interner: &Interner,
    diagnostics: &mut Diagnostics,
    name: Symbol,
    node: ql_language::ast::NodeId,
    span: Span,
) {
    if let Some(scope) = ctx.scope_of(node) {
        if ctx.scopes.already_declared(scope, name, node) {
            diagnostics
                .push(SemanticErrorKind::Shadowing { name }.to_diagnostic(interner, span));
        }
    }
}

fn check_expr(
    ctx: &AnalysisContext,
    interner: &Interner,
    diagnostics: &mut Diagnostics,
    expr: &Expr,
) {
    match &expr.kind {
        ExprKind::Identifier(name) => {
            if let Some(scope) = ctx.scope_of(expr.id) {
                if ctx.scopes.in_scope(scope, *name).is_none() {
                    report_unbound(ctx, interner, diagnostics, *name, scope, expr.span, false);
                }
            }
        }
        ExprKind::Call { callee, args } => {
            if let Some(scope) = ctx.scope_of(expr.id) {
                if ctx.scopes.in_scope(scope, *callee).is_none() {
                    report_unbound(ctx, interner, diagnostics, *callee, scope, expr.span, true);
                }
            }
            for arg in args {
                check_expr(ctx, interner, diagnostics, arg);
            }
        }
        ExprKind::Unary { operand, .. } => check_expr(ctx, interner, diagnostics, operand),
        ExprKind::Binary { lhs, rhs, .. } => {
            check_expr(ctx, interner, diagnostics, lhs);
            check_expr(ctx, interner, diagnostics, rhs);
        }
        ExprKind::Boolean(_) | ExprKind::Number(_) | ExprKind::Incomplete => {}
    }
}

fn report_unbound(
    ctx: &AnalysisContext,
    interner: &Interner,
    diagnostics: &mut Diagnostics,
    name: Symbol,
    scope: ScopeId,
    span: Span,
    is_call: bool,
) {
    let visible = ctx.scopes.visible_names(scope);
    let suggestion = find_similar(
        interner.resolve(name),
        visible.iter().map(|s| interner.resolve(*s)),
        2,
    )
    .and_then(|text| interner.lookup(text));

    let kind = if is_call {
        SemanticErrorKind::FunctionNotFound { name, suggestion }
    } else {
        SemanticErrorKind::IdentifierUnbound { name, suggestion }
    };
    diagnostics.push(kind.to_diagnostic(interner, span));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::analyze_bindings;

    fn codes(diagnostics: &Diagnostics) -> Vec<&'static str> {
        diagnostics.iter().map(|d| d.code).collect()
    }

    #[test]
    fn resolved_program_reports_nothing() {
        let (_, _, diagnostics) = analyze_bindings(
            "func add(a: Int, b: Int) -> Int { return a + b; } let s = add(1, 2);",
        );
        assert!(!diagnostics.has_errors());
    }

    #[test]
    fn top_level_redefinition_reports_one_shadowing() {
        let (_, _, diagnostics) = analyze_bindings("var x = 1; let x = 2;");
        assert_eq!(codes(&diagnostics), ["shadowing"]);
    }

    #[test]
    fn duplicate_parameters_report_parameter_names_not_unique() {
        let (_, _, diagnostics) =
            analyze_bindings("func f(x: Int, x: Bool) -> Int { return x; }");
        assert_eq!(codes(&diagnostics), ["parameter-names-not-unique"]);
    }

    #[test]
    fn unbound_identifier_is_reported() {
        let (_, _, diagnostics) = analyze_bindings("let x = missing;");
        assert_eq!(codes(&diagnostics), ["identifier-unbound"]);
    }

    #[test]
    fn unbound_call_reports_function_not_found() {
        let (_, _, diagnostics) = analyze_bindings("let x = missing();");
        assert_eq!(codes(&diagnostics), ["function-not-found"]);
    }

    #[test]
    fn near_miss_gets_a_suggestion() {
        let (_, _, diagnostics) = analyze_bindings(
            "func f() -> Int { let counter = 1; return countr; }",
        );
        assert_eq!(codes(&diagnostics), ["identifier-unbound"]);
        let message = &diagnostics.entries()[0].message;
        assert!(message.contains("did you mean 'counter'"), "{message}");
    }

    #[test]
    fn local_shadowing_of_parameter_is_reported() {
        let (_, _, diagnostics) =
            analyze_bindings("func f(x: Int) -> Int { let x = 2; return x; }");
        assert_eq!(codes(&diagnostics), ["shadowing"]);
    }

    #[test]
    fn reference_before_definition_in_value_position_is_unbound() {
        let (_, _, diagnostics) = analyze_bindings("let a = b; let b = 1;");
        // `a`'s global scope excludes nothing but itself, so `b` resolves;
        // scoping allows it, and the typechecker rejects it later.
        assert!(!diagnostics.has_errors());
    }

    #[test]
    fn assignment_to_unbound_target_is_reported() {
        let (_, _, diagnostics) =
            analyze_bindings("func f() -> Int { y = 1; return 0; }");
        assert_eq!(codes(&diagnostics), ["identifier-unbound"]);
    }

    #[test]
    fn incomplete_sections_are_skipped() {
        let (_, _, diagnostics) = analyze_bindings("let = oops;");
        // Only the parser's diagnostic is present; no binding errors pile on.
        assert_eq!(codes(&diagnostics), ["expected-identifier"]);
    }
}
