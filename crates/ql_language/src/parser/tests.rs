use ql_base::{Diagnostics, Interner};

use crate::ast::raw::{RawExpr, RawExprKind, RawItemKind, RawStmtKind, RawTopLevel};
use crate::ast::{BinaryOp, NodeIdGen, TypeName, UnaryOp};
use crate::ast_arenas;
use crate::lexer::Lexer;
use crate::parser::Parser;

fn parse_with<'i>(
    source: &str,
    interner: &'i mut Interner,
    diagnostics: &'i mut Diagnostics,
    check: impl FnOnce(&RawTopLevel<'_>, &Interner, &Diagnostics),
) {
    let mut ids = NodeIdGen::new();
    let tokens = Lexer::new(source, interner).tokenize(diagnostics);
    ast_arenas!(ctx);
    let raw = Parser::new(tokens, interner, &mut ids, diagnostics, ctx).parse();
    check(&raw, interner, diagnostics);
}

fn parse(source: &str, check: impl FnOnce(&RawTopLevel<'_>, &Interner, &Diagnostics)) {
    let mut interner = Interner::new();
    let mut diagnostics = Diagnostics::new();
    parse_with(source, &mut interner, &mut diagnostics, check);
}

fn first_def_value<'a, 'r>(raw: &'r RawTopLevel<'a>) -> &'r RawExpr<'a> {
    match &raw.sections[0].kind {
        RawItemKind::Def(stmt) => match &stmt.kind {
            RawStmtKind::LetDef { value, .. } | RawStmtKind::VarDef { value, .. } => value,
            other => panic!("expected definition, got {:?}", other),
        },
        other => panic!("expected def item, got {:?}", other),
    }
}

fn diagnostic_codes(diagnostics: &Diagnostics) -> Vec<&'static str> {
    diagnostics.iter().map(|d| d.code).collect()
}

// ---------------------------------------------------------------------------
// Expressions
// ---------------------------------------------------------------------------

#[test]
fn multiplication_binds_tighter_than_addition() {
    parse("let x = 1 + 2 * 3;", |raw, _, diagnostics| {
        assert!(!diagnostics.has_errors());
        let value = first_def_value(raw);
        let RawExprKind::Binary { op, lhs, rhs } = &value.kind else {
            panic!("expected binary");
        };
        assert_eq!(*op, BinaryOp::Add);
        assert!(matches!(lhs.kind, RawExprKind::Number(1)));
        let RawExprKind::Binary { op: inner, lhs: l2, rhs: r2 } = &rhs.kind else {
            panic!("expected nested binary");
        };
        assert_eq!(*inner, BinaryOp::Mul);
        assert!(matches!(l2.kind, RawExprKind::Number(2)));
        assert!(matches!(r2.kind, RawExprKind::Number(3)));
    });
}

#[test]
fn subtraction_is_left_associative() {
    parse("let x = 10 - 3 - 2;", |raw, _, diagnostics| {
        assert!(!diagnostics.has_errors());
        let value = first_def_value(raw);
        let RawExprKind::Binary { op, lhs, rhs } = &value.kind else {
            panic!("expected binary");
        };
        assert_eq!(*op, BinaryOp::Sub);
        assert!(matches!(rhs.kind, RawExprKind::Number(2)));
        let RawExprKind::Binary { op: inner, .. } = &lhs.kind else {
            panic!("expected left-nested binary");
        };
        assert_eq!(*inner, BinaryOp::Sub);
    });
}

#[test]
fn and_binds_tighter_than_or() {
    parse("let x = a || b && c;", |raw, _, diagnostics| {
        assert!(!diagnostics.has_errors());
        let value = first_def_value(raw);
        let RawExprKind::Binary { op, rhs, .. } = &value.kind else {
            panic!("expected binary");
        };
        assert_eq!(*op, BinaryOp::Or);
        let RawExprKind::Binary { op: inner, .. } = &rhs.kind else {
            panic!("expected nested binary");
        };
        assert_eq!(*inner, BinaryOp::And);
    });
}

#[test]
fn arithmetic_binds_tighter_than_boolean_operators() {
    parse("let x = a && b + c;", |raw, _, diagnostics| {
        assert!(!diagnostics.has_errors());
        let value = first_def_value(raw);
        let RawExprKind::Binary { op, rhs, .. } = &value.kind else {
            panic!("expected binary");
        };
        assert_eq!(*op, BinaryOp::And);
        assert!(matches!(
            rhs.kind,
            RawExprKind::Binary { op: BinaryOp::Add, .. }
        ));
    });
}

#[test]
fn unary_operators_parse_as_part_of_the_primary() {
    parse("let x = !a && -b;", |raw, _, diagnostics| {
        assert!(!diagnostics.has_errors());
        let value = first_def_value(raw);
        let RawExprKind::Binary { op, lhs, rhs } = &value.kind else {
            panic!("expected binary");
        };
        assert_eq!(*op, BinaryOp::And);
        assert!(matches!(
            lhs.kind,
            RawExprKind::Unary { op: UnaryOp::Not, .. }
        ));
        assert!(matches!(
            rhs.kind,
            RawExprKind::Unary { op: UnaryOp::Neg, .. }
        ));
    });
}

#[test]
fn call_is_distinguished_from_identifier_by_lookahead() {
    parse("let x = f(1, g(2), true);", |raw, interner, diagnostics| {
        assert!(!diagnostics.has_errors());
        let value = first_def_value(raw);
        let RawExprKind::FuncApp { callee, args } = &value.kind else {
            panic!("expected call, got {:?}", value.kind);
        };
        assert_eq!(interner.resolve(*callee), "f");
        assert_eq!(args.len(), 3);
        assert!(matches!(args[1].kind, RawExprKind::FuncApp { .. }));
    });
}

#[test]
fn bare_identifier_in_expression_is_an_identifier() {
    parse("let x = y;", |raw, interner, diagnostics| {
        assert!(!diagnostics.has_errors());
        let value = first_def_value(raw);
        let RawExprKind::Identifier(sym) = value.kind else {
            panic!("expected identifier");
        };
        assert_eq!(interner.resolve(sym), "y");
    });
}

// ---------------------------------------------------------------------------
// Declarations and statements
// ---------------------------------------------------------------------------

#[test]
fn function_definition_parses_signature_and_body() {
    parse(
        "func add(a: Int, b: Int) -> Int { return a + b; }",
        |raw, interner, diagnostics| {
            assert!(!diagnostics.has_errors());
            let RawItemKind::FuncDef(func) = &raw.sections[0].kind else {
                panic!("expected function");
            };
            assert_eq!(interner.resolve(func.name), "add");
            assert_eq!(func.params.len(), 2);
            assert_eq!(func.params[0].annotation, TypeName::Int);
            assert_eq!(func.return_type, TypeName::Int);
            assert_eq!(func.body.stmts.len(), 1);
            assert!(matches!(func.body.stmts[0].kind, RawStmtKind::Return { .. }));
        },
    );
}

#[test]
fn definition_annotation_is_optional() {
    parse("let x: Int = 1; let y = 2;", |raw, _, diagnostics| {
        assert!(!diagnostics.has_errors());
        let RawItemKind::Def(first) = &raw.sections[0].kind else {
            panic!("expected def");
        };
        let RawStmtKind::LetDef { annotation, .. } = &first.kind else {
            panic!("expected let");
        };
        assert_eq!(*annotation, Some(TypeName::Int));

        let RawItemKind::Def(second) = &raw.sections[1].kind else {
            panic!("expected def");
        };
        let RawStmtKind::LetDef { annotation, .. } = &second.kind else {
            panic!("expected let");
        };
        assert!(annotation.is_none());
    });
}

#[test]
fn else_if_chain_flattens_into_multi_arm_list() {
    parse(
        "func f(a: Bool, b: Bool) -> Int {\
           if (a) { return 1; } else if (b) { return 2; } else { return 3; }\
         }",
        |raw, _, diagnostics| {
            assert!(!diagnostics.has_errors());
            let RawItemKind::FuncDef(func) = &raw.sections[0].kind else {
                panic!("expected function");
            };
            let RawStmtKind::If { arms, else_branch } = &func.body.stmts[0].kind else {
                panic!("expected if");
            };
            assert_eq!(arms.len(), 2);
            assert!(else_branch.is_some());
        },
    );
}

#[test]
fn assignment_parses_in_block_position() {
    parse(
        "func f() -> Int { var x = 1; x = 2; return x; }",
        |raw, _, diagnostics| {
            assert!(!diagnostics.has_errors());
            let RawItemKind::FuncDef(func) = &raw.sections[0].kind else {
                panic!("expected function");
            };
            assert!(matches!(
                func.body.stmts[1].kind,
                RawStmtKind::Assignment { .. }
            ));
        },
    );
}

#[test]
fn top_level_call_statement_parses() {
    parse("run(1, 2);", |raw, _, diagnostics| {
        assert!(!diagnostics.has_errors());
        assert!(matches!(raw.sections[0].kind, RawItemKind::Call(_)));
    });
}

#[test]
fn attributed_function_keeps_its_attribute() {
    parse("@main func go() -> Int { return 0; }", |raw, _, diagnostics| {
        assert!(!diagnostics.has_errors());
        assert!(matches!(
            raw.sections[0].kind,
            RawItemKind::Attributed { .. }
        ));
    });
}

// ---------------------------------------------------------------------------
// Recovery
// ---------------------------------------------------------------------------

#[test]
fn missing_parameter_identifier_drops_to_brace_and_yields_incomplete() {
    parse("func f( -> Int { return 1; }", |raw, _, diagnostics| {
        assert_eq!(diagnostic_codes(diagnostics), ["expected-identifier"]);
        assert_eq!(raw.sections.len(), 1);
        assert!(raw.sections[0].is_incomplete());
    });
}

#[test]
fn recovery_resumes_after_the_sync_point() {
    parse("let = 5; let y = 2;", |raw, _, diagnostics| {
        assert_eq!(diagnostic_codes(diagnostics), ["expected-identifier"]);
        assert_eq!(raw.sections.len(), 2);
        assert!(raw.sections[0].is_incomplete());
        assert!(matches!(raw.sections[1].kind, RawItemKind::Def(_)));
    });
}

#[test]
fn missing_semicolon_is_ignored_and_parsing_continues() {
    parse("let x = 1 let y = 2;", |raw, _, diagnostics| {
        // `let` after `1` first ends the expression (expected-operator,
        // ignored), then the statement notices its missing semicolon.
        assert_eq!(
            diagnostic_codes(diagnostics),
            ["expected-operator", "expected-semicolon"]
        );
        assert_eq!(raw.sections.len(), 2);
        assert!(matches!(raw.sections[0].kind, RawItemKind::Def(_)));
        assert!(matches!(raw.sections[1].kind, RawItemKind::Def(_)));
    });
}

#[test]
fn non_operator_after_expression_reports_expected_operator() {
    parse("let x = 1 2;", |raw, _, diagnostics| {
        let codes = diagnostic_codes(diagnostics);
        assert!(codes.contains(&"expected-operator"), "{codes:?}");
        // The definition itself survives with the parsed prefix.
        assert!(matches!(raw.sections[0].kind, RawItemKind::Def(_)));
    });
}

#[test]
fn missing_expression_is_unrecoverable() {
    parse("let x = ;", |raw, _, diagnostics| {
        assert_eq!(diagnostic_codes(diagnostics), ["expected-expression"]);
        assert!(raw.sections.is_empty());
    });
}

#[test]
fn unclosed_block_at_eof_is_unrecoverable() {
    parse("func f() -> Int { return 1;", |raw, _, diagnostics| {
        assert_eq!(diagnostic_codes(diagnostics), ["expected-block-body-part"]);
        assert!(raw.sections.is_empty());
    });
}

#[test]
fn bad_attribute_name_reports_and_recovers() {
    parse(
        "@wat func f() -> Int { return 1; } let x = 1;",
        |raw, _, diagnostics| {
            assert_eq!(diagnostic_codes(diagnostics), ["expected-valid-attribute"]);
            assert!(raw.sections[0].is_incomplete());
            // Recovery dropped through the function's closing brace.
            assert!(matches!(raw.sections[1].kind, RawItemKind::Def(_)));
        },
    );
}

#[test]
fn bare_identifier_at_top_level_is_not_a_call() {
    parse("f; let x = 1;", |raw, _, diagnostics| {
        assert_eq!(
            diagnostic_codes(diagnostics),
            ["expected-function-application"]
        );
        assert!(raw.sections[0].is_incomplete());
        assert!(matches!(raw.sections[1].kind, RawItemKind::Def(_)));
    });
}

#[test]
fn missing_call_paren_in_args_drops_to_semicolon() {
    parse("let x = f(1; let y = 2;", |raw, _, diagnostics| {
        let codes = diagnostic_codes(diagnostics);
        assert!(codes.contains(&"expected-right-paren"), "{codes:?}");
        // The second definition still parses.
        assert!(matches!(raw.sections[1].kind, RawItemKind::Def(_)));
    });
}

#[test]
fn missing_arrow_drops_function() {
    parse("func f() Int { return 1; } let x = 1;", |raw, _, diagnostics| {
        assert_eq!(diagnostic_codes(diagnostics), ["expected-arrow"]);
        assert!(raw.sections[0].is_incomplete());
        assert!(matches!(raw.sections[1].kind, RawItemKind::Def(_)));
    });
}

#[test]
fn garbage_top_level_token_drops_to_semicolon() {
    parse("42; let x = 1;", |raw, _, diagnostics| {
        assert_eq!(
            diagnostic_codes(diagnostics),
            ["expected-top-level-statement"]
        );
        assert!(raw.sections[0].is_incomplete());
        assert!(matches!(raw.sections[1].kind, RawItemKind::Def(_)));
    });
}

#[test]
fn incomplete_marker_propagates_structurally() {
    parse("let x = f(1; let y = 2;", |raw, _, _| {
        // The damaged call bubbles incompleteness to the enclosing item.
        assert!(raw.sections[0].any_incomplete());
        assert!(!raw.sections[1].any_incomplete());
    });
}

#[test]
fn empty_input_parses_to_empty_top_level() {
    parse("", |raw, _, diagnostics| {
        assert!(raw.sections.is_empty());
        assert!(!diagnostics.has_errors());
    });
}
