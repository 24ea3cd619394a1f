//! FIR arithmetic linearization: three-address form.
//!
//! Rewrites every compound expression nested inside a statement or
//! terminator into a chain of fresh assignments (`bin_op_$N$`, `un_op_$N$`)
//! preceding it, replacing the inline occurrence with the temporary's name.
//! An assignment whose right-hand side is already a bare compound over
//! leaves is left in place: it is already three-address. Identifiers,
//! literals, and calls stay untouched (call arguments are flattened).
//!
//! The return block is never rewritten. Runs after short-circuit lowering,
//! so no boolean compound remains in any position this pass hoists from.

use ql_base::Interner;

use super::{FirExpr, FirStmt, Module, Terminator};
use crate::context::AnalysisContext;

/// Rewrites every function body into three-address form.
pub fn linearize_arithmetic(
    module: &mut Module,
    ctx: &mut AnalysisContext,
    interner: &mut Interner,
) {
    for function in &mut module.functions {
        for block in &mut function.blocks {
            let mut statements = Vec::with_capacity(block.statements.len());
            for stmt in block.statements.drain(..) {
                let rewritten = rewrite_stmt(stmt, &mut statements, ctx, interner);
                statements.push(rewritten);
            }
            block.terminator = rewrite_terminator(
                std::mem::replace(&mut block.terminator, Terminator::Return(FirExpr::EmptyTuple)),
                &mut statements,
                ctx,
                interner,
            );
            block.statements = statements;
        }
    }
}

fn rewrite_stmt(
    stmt: FirStmt,
    out: &mut Vec<FirStmt>,
    ctx: &mut AnalysisContext,
    interner: &mut Interner,
) -> FirStmt {
    match stmt {
        FirStmt::Assign { target, value } => {
            // A bare compound RHS is already three-address; only its
            // operands need flattening.
            let value = match value {
                FirExpr::Binary { op, lhs, rhs } => FirExpr::Binary {
                    op,
                    lhs: Box::new(flatten(*lhs, out, ctx, interner)),
                    rhs: Box::new(flatten(*rhs, out, ctx, interner)),
                },
                FirExpr::Unary { op, operand } => FirExpr::Unary {
                    op,
                    operand: Box::new(flatten(*operand, out, ctx, interner)),
                },
                FirExpr::Call { callee, args } => FirExpr::Call {
                    callee,
                    args: args
                        .into_iter()
                        .map(|arg| flatten(arg, out, ctx, interner))
                        .collect(),
                },
                leaf => leaf,
            };
            FirStmt::Assign { target, value }
        }
        FirStmt::Call { callee, args } => FirStmt::Call {
            callee,
            args: args
                .into_iter()
                .map(|arg| flatten(arg, out, ctx, interner))
                .collect(),
        },
    }
}

fn rewrite_terminator(
    terminator: Terminator,
    out: &mut Vec<FirStmt>,
    ctx: &mut AnalysisContext,
    interner: &mut Interner,
) -> Terminator {
    match terminator {
        Terminator::Branch { target, arg } => Terminator::Branch {
            target,
            arg: arg.map(|arg| flatten(arg, out, ctx, interner)),
        },
        Terminator::CondBranch {
            condition,
            then_label,
            else_label,
        } => Terminator::CondBranch {
            condition: flatten(condition, out, ctx, interner),
            then_label,
            else_label,
        },
        Terminator::Return(value) => Terminator::Return(value),
    }
}

/// Flattens an operand-position expression to a leaf or a call over
/// flattened arguments, hoisting compounds into fresh assignments.
fn flatten(
    expr: FirExpr,
    out: &mut Vec<FirStmt>,
    ctx: &mut AnalysisContext,
    interner: &mut Interner,
) -> FirExpr {
    match expr {
        FirExpr::Binary { op, lhs, rhs } => {
            let lhs = flatten(*lhs, out, ctx, interner);
            let rhs = flatten(*rhs, out, ctx, interner);
            let name = ctx.gensym.fresh(interner, "bin_op");
            out.push(FirStmt::Assign {
                target: name,
                value: FirExpr::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
            });
            FirExpr::Identifier(name)
        }
        FirExpr::Unary { op, operand } => {
            let operand = flatten(*operand, out, ctx, interner);
            let name = ctx.gensym.fresh(interner, "un_op");
            out.push(FirStmt::Assign {
                target: name,
                value: FirExpr::Unary {
                    op,
                    operand: Box::new(operand),
                },
            });
            FirExpr::Identifier(name)
        }
        FirExpr::Call { callee, args } => FirExpr::Call {
            callee,
            args: args
                .into_iter()
                .map(|arg| flatten(arg, out, ctx, interner))
                .collect(),
        },
        leaf => leaf,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::lowered_module;
    use ql_language::ast::BinaryOp;

    /// Post-pass invariant: compounds appear only as assignment right-hand
    /// sides, never nested.
    fn assert_three_address(module: &Module) {
        fn assert_flat(expr: &FirExpr) {
            match expr {
                FirExpr::Binary { .. } | FirExpr::Unary { .. } => {
                    panic!("nested compound survived: {:?}", expr)
                }
                FirExpr::Call { args, .. } => args.iter().for_each(assert_flat),
                _ => {}
            }
        }

        for function in &module.functions {
            for block in &function.blocks {
                for stmt in &block.statements {
                    match stmt {
                        FirStmt::Assign { value, .. } => match value {
                            FirExpr::Binary { lhs, rhs, .. } => {
                                assert_flat(lhs);
                                assert_flat(rhs);
                            }
                            FirExpr::Unary { operand, .. } => assert_flat(operand),
                            other => assert_flat(other),
                        },
                        FirStmt::Call { args, .. } => args.iter().for_each(assert_flat),
                    }
                }
                match &block.terminator {
                    Terminator::Branch { arg: Some(arg), .. } => assert_flat(arg),
                    Terminator::CondBranch { condition, .. } => assert_flat(condition),
                    _ => {}
                }
            }
        }
    }

    #[test]
    fn already_three_address_entry_is_left_alone() {
        let (module, _, interner) = lowered_module("func f() -> Int { return 1 + 2; }");
        let f = &module.functions[0];
        let entry = &f.blocks[0];

        // One statement: the AST linearizer's temporary, untouched.
        assert_eq!(entry.statements.len(), 1);
        let FirStmt::Assign { target, value } = &entry.statements[0] else {
            panic!("expected assignment");
        };
        assert!(interner.resolve(*target).starts_with("tmp_$"));
        assert!(matches!(value, FirExpr::Binary { op: BinaryOp::Add, .. }));
        assert_three_address(&module);
    }

    #[test]
    fn call_arguments_in_branch_args_stay_flat() {
        let (module, _, _) = lowered_module(
            "func g(n: Int) -> Int { return n; }\
             func f() -> Int { return g(1); }",
        );
        assert_three_address(&module);
    }

    #[test]
    fn whole_pipeline_output_is_three_address() {
        let (module, _, _) = lowered_module(
            "func p(n: Int) -> Bool { return true; }\
             func f(a: Bool, b: Bool) -> Bool {\
               var x = true;\
               if (a && p(2 * 3 + 1)) { x = b || a; } else { x = !a; }\
               return x && b;\
             }",
        );
        assert_three_address(&module);
    }

    #[test]
    fn return_block_is_never_rewritten() {
        let (module, _, _) = lowered_module("func f() -> Int { return 1 + 2; }");
        let f = &module.functions[0];
        assert!(f.return_block.statements.is_empty());
        assert!(matches!(
            f.return_block.terminator,
            Terminator::Return(FirExpr::Identifier(_))
        ));
    }
}
