//! Short-circuit lowering of compound boolean expressions.
//!
//! Two sibling passes:
//!
//! - [`lower_condition_short_circuits`] rewrites every `CondBranch` whose
//!   condition is compound into a chain of conditional branches over leaf
//!   expressions. `a && b` tests `a` first and skips `b` when `a` is false;
//!   `a || b` mirrors; `!e` recurses with the targets swapped, so no
//!   negation survives into a condition.
//!
//! - [`lower_boolean_values`] expands compound booleans in *value*
//!   positions. An assignment `x = a && b` becomes a branch chain feeding a
//!   pair of trivial blocks that jump with the constants `true`/`false`
//!   into a fresh join block carrying the value as a block parameter; a
//!   `return`-position compound feeds the function's return block directly,
//!   which already carries the value parameter.
//!
//! ```text
//! cond a && b ? T : E        br f$cc2
//! …                          block f$cc2: cond a ? f$cc1 : E
//!                            block f$cc1: cond b ? T : E
//! ```
//!
//! After both passes no `CondBranch` condition is a boolean binary or a
//! unary wrapper. Unary `-` negates like `!` here; the typechecker already
//! pinned both operators to `Bool`.

use ql_base::{Interner, Symbol};
use ql_language::ast::BinaryOp;

use super::{BasicBlock, FirExpr, FirParam, FirStmt, FirType, Function, Module, Terminator};
use crate::context::AnalysisContext;

/// `true` when a condition must be expanded before branching on it.
fn is_compound_condition(expr: &FirExpr) -> bool {
    match expr {
        FirExpr::Binary { op, .. } => op.is_boolean(),
        FirExpr::Unary { .. } => true,
        _ => false,
    }
}

/// Expands compound `CondBranch` conditions in every function.
pub fn lower_condition_short_circuits(
    module: &mut Module,
    ctx: &mut AnalysisContext,
    interner: &mut Interner,
) {
    for function in &mut module.functions {
        let fn_name = interner.resolve(function.name).to_string();
        let mut index = 0;
        while index < function.blocks.len() {
            let needs_expansion = matches!(
                &function.blocks[index].terminator,
                Terminator::CondBranch { condition, .. } if is_compound_condition(condition)
            );
            if needs_expansion {
                let Terminator::CondBranch {
                    condition,
                    then_label,
                    else_label,
                } = std::mem::replace(
                    &mut function.blocks[index].terminator,
                    Terminator::Return(FirExpr::EmptyTuple),
                )
                else {
                    unreachable!("checked above");
                };

                let mut new_blocks = Vec::new();
                let entry = expand(
                    condition, then_label, else_label, &fn_name, ctx, interner, &mut new_blocks,
                );
                function.blocks[index].terminator = Terminator::Branch {
                    target: entry,
                    arg: None,
                };
                function.blocks.append(&mut new_blocks);
            }
            index += 1;
        }
    }
}

/// Lowers one condition given its inherited `(then, else)` targets,
/// returning the entry label of the emitted chain. Negation swaps the
/// targets on the way down.
fn expand(
    condition: FirExpr,
    then_label: Symbol,
    else_label: Symbol,
    fn_name: &str,
    ctx: &mut AnalysisContext,
    interner: &mut Interner,
    out: &mut Vec<BasicBlock>,
) -> Symbol {
    match condition {
        FirExpr::Unary { operand, .. } => {
            expand(*operand, else_label, then_label, fn_name, ctx, interner, out)
        }
        FirExpr::Binary {
            op: BinaryOp::And,
            lhs,
            rhs,
        } => {
            let rhs_entry = expand(*rhs, then_label, else_label, fn_name, ctx, interner, out);
            expand(*lhs, rhs_entry, else_label, fn_name, ctx, interner, out)
        }
        FirExpr::Binary {
            op: BinaryOp::Or,
            lhs,
            rhs,
        } => {
            let rhs_entry = expand(*rhs, then_label, else_label, fn_name, ctx, interner, out);
            expand(*lhs, then_label, rhs_entry, fn_name, ctx, interner, out)
        }
        leaf => {
            let label = interner.intern(&format!("{}$cc{}", fn_name, ctx.gensym.next_index()));
            out.push(BasicBlock {
                label,
                parameter: None,
                statements: Vec::new(),
                terminator: Terminator::CondBranch {
                    condition: leaf,
                    then_label,
                    else_label,
                },
                unreachable_terminators: Vec::new(),
            });
            label
        }
    }
}

/// Expands compound booleans in assignment and branch-argument positions.
pub fn lower_boolean_values(
    module: &mut Module,
    ctx: &mut AnalysisContext,
    interner: &mut Interner,
) {
    for function in &mut module.functions {
        let fn_name = interner.resolve(function.name).to_string();
        let mut index = 0;
        while index < function.blocks.len() {
            expand_first_boolean_assignment(function, index, &fn_name, ctx, interner);
            expand_boolean_branch_arg(function, index, &fn_name, ctx, interner);
            index += 1;
        }
    }
}

/// Splits the block at its first short-circuiting assignment, if any. The
/// remainder of the block moves into the join and is revisited when the
/// loop reaches the appended join block.
fn expand_first_boolean_assignment(
    function: &mut Function,
    index: usize,
    fn_name: &str,
    ctx: &mut AnalysisContext,
    interner: &mut Interner,
) {
    let position = function.blocks[index].statements.iter().position(|stmt| {
        matches!(stmt, FirStmt::Assign { value, .. } if value.needs_short_circuit())
    });
    let Some(position) = position else {
        return;
    };

    let block = &mut function.blocks[index];
    let mut tail: Vec<FirStmt> = block.statements.split_off(position);
    let FirStmt::Assign { target, value } = tail.remove(0) else {
        unreachable!("position found an assignment");
    };

    let phi_index = ctx.gensym.next_index();
    let join_label = interner.intern(&format!("{}$phi{}", fn_name, phi_index));
    let param_name = interner.intern(&format!("{}$phi{}$val", fn_name, phi_index));

    let true_label = interner.intern(&format!("{}$cc{}", fn_name, ctx.gensym.next_index()));
    let false_label = interner.intern(&format!("{}$cc{}", fn_name, ctx.gensym.next_index()));

    let old_terminator = std::mem::replace(
        &mut block.terminator,
        Terminator::Return(FirExpr::EmptyTuple),
    );

    let mut new_blocks = Vec::new();
    let entry = expand(
        value, true_label, false_label, fn_name, ctx, interner, &mut new_blocks,
    );
    function.blocks[index].terminator = Terminator::Branch {
        target: entry,
        arg: None,
    };

    for (label, constant) in [(true_label, true), (false_label, false)] {
        new_blocks.push(BasicBlock {
            label,
            parameter: None,
            statements: Vec::new(),
            terminator: Terminator::Branch {
                target: join_label,
                arg: Some(FirExpr::Boolean(constant)),
            },
            unreachable_terminators: Vec::new(),
        });
    }

    let mut join_statements = vec![FirStmt::Assign {
        target,
        value: FirExpr::Identifier(param_name),
    }];
    join_statements.extend(tail);
    new_blocks.push(BasicBlock {
        label: join_label,
        parameter: Some(FirParam {
            name: param_name,
            ty: FirType::Bool,
        }),
        statements: join_statements,
        terminator: old_terminator,
        unreachable_terminators: Vec::new(),
    });

    function.blocks.append(&mut new_blocks);
}

/// Expands a compound boolean passed as a branch argument, feeding the
/// branch target (typically the return block) with constants instead.
fn expand_boolean_branch_arg(
    function: &mut Function,
    index: usize,
    fn_name: &str,
    ctx: &mut AnalysisContext,
    interner: &mut Interner,
) {
    let needs_expansion = matches!(
        &function.blocks[index].terminator,
        Terminator::Branch { arg: Some(arg), .. } if arg.needs_short_circuit()
    );
    if !needs_expansion {
        return;
    }

    let Terminator::Branch {
        target,
        arg: Some(arg),
    } = std::mem::replace(
        &mut function.blocks[index].terminator,
        Terminator::Return(FirExpr::EmptyTuple),
    )
    else {
        unreachable!("checked above");
    };

    let true_label = interner.intern(&format!("{}$cc{}", fn_name, ctx.gensym.next_index()));
    let false_label = interner.intern(&format!("{}$cc{}", fn_name, ctx.gensym.next_index()));

    let mut new_blocks = Vec::new();
    let entry = expand(
        arg, true_label, false_label, fn_name, ctx, interner, &mut new_blocks,
    );
    function.blocks[index].terminator = Terminator::Branch {
        target: entry,
        arg: None,
    };

    for (label, constant) in [(true_label, true), (false_label, false)] {
        new_blocks.push(BasicBlock {
            label,
            parameter: None,
            statements: Vec::new(),
            terminator: Terminator::Branch {
                target,
                arg: Some(FirExpr::Boolean(constant)),
            },
            unreachable_terminators: Vec::new(),
        });
    }

    function.blocks.append(&mut new_blocks);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::lowered_module;

    fn label_of<'a>(interner: &'a Interner, block: &BasicBlock) -> &'a str {
        interner.resolve(block.label)
    }

    /// Post-pass invariant: no compound conditions anywhere.
    fn assert_no_compound_conditions(module: &Module) {
        for function in &module.functions {
            for block in function.all_blocks() {
                if let Terminator::CondBranch { condition, .. } = &block.terminator {
                    assert!(
                        !is_compound_condition(condition),
                        "compound condition survived: {:?}",
                        condition
                    );
                }
            }
        }
    }

    #[test]
    fn and_condition_becomes_a_two_test_chain() {
        let (module, _, interner) = lowered_module(
            "func f(a: Bool, b: Bool) -> Int {\
               if (a && b) { return 1; } else { return 2; }\
             }",
        );
        let f = &module.functions[0];
        assert_no_compound_conditions(&module);

        // The entry now branches into the chain.
        let Terminator::Branch { target, arg } = &f.blocks[0].terminator else {
            panic!("expected branch into the chain");
        };
        assert!(arg.is_none());
        let first = f.block(*target).expect("chain entry resolves");
        assert!(label_of(&interner, first).contains("$cc"));

        // First test: a; on false, skip b and go straight to the else body.
        let Terminator::CondBranch {
            condition,
            then_label,
            else_label,
        } = &first.terminator
        else {
            panic!("expected leaf test");
        };
        assert_eq!(interner.resolve(*condition_ident(condition)), "a");
        assert!(interner.resolve(*else_label).ends_with("$else"));

        // Second test: b, with the original then/else targets.
        let second = f.block(*then_label).expect("second test resolves");
        let Terminator::CondBranch {
            condition,
            then_label,
            else_label,
        } = &second.terminator
        else {
            panic!("expected leaf test");
        };
        assert_eq!(interner.resolve(*condition_ident(condition)), "b");
        assert!(interner.resolve(*then_label).ends_with("$then"));
        assert!(interner.resolve(*else_label).ends_with("$else"));
    }

    fn condition_ident(expr: &FirExpr) -> &Symbol {
        match expr {
            FirExpr::Identifier(sym) => sym,
            other => panic!("expected identifier condition, got {:?}", other),
        }
    }

    #[test]
    fn or_condition_skips_the_second_test_when_true() {
        let (module, _, interner) = lowered_module(
            "func f(a: Bool, b: Bool) -> Int {\
               if (a || b) { return 1; } else { return 2; }\
             }",
        );
        let f = &module.functions[0];
        assert_no_compound_conditions(&module);

        let Terminator::Branch { target, .. } = &f.blocks[0].terminator else {
            panic!("expected branch into the chain");
        };
        let first = f.block(*target).expect("chain entry");
        let Terminator::CondBranch {
            then_label,
            else_label,
            ..
        } = &first.terminator
        else {
            panic!("expected leaf test");
        };
        // On true, jump straight to the then block; on false, test b.
        assert!(interner.resolve(*then_label).ends_with("$then"));
        assert!(interner.resolve(*else_label).contains("$cc"));
    }

    #[test]
    fn negation_swaps_targets_instead_of_surviving() {
        let (module, _, interner) = lowered_module(
            "func f(a: Bool) -> Int {\
               if (!a) { return 1; } else { return 2; }\
             }",
        );
        let f = &module.functions[0];
        assert_no_compound_conditions(&module);

        let Terminator::Branch { target, .. } = &f.blocks[0].terminator else {
            panic!("expected branch into the chain");
        };
        let test = f.block(*target).expect("chain entry");
        let Terminator::CondBranch {
            condition,
            then_label,
            else_label,
        } = &test.terminator
        else {
            panic!("expected leaf test");
        };
        assert!(matches!(condition, FirExpr::Identifier(_)));
        // Swapped: true goes to the else body, false to the then body.
        assert!(interner.resolve(*then_label).ends_with("$else"));
        assert!(interner.resolve(*else_label).ends_with("$then"));
    }

    #[test]
    fn de_morgan_over_a_negated_conjunction() {
        let (module, _, _) = lowered_module(
            "func f(a: Bool, b: Bool) -> Int {\
               if (!(a && b)) { return 1; } else { return 2; }\
             }",
        );
        assert_no_compound_conditions(&module);
    }

    #[test]
    fn nested_mixed_operators_expand_fully() {
        let (module, _, _) = lowered_module(
            "func f(a: Bool, b: Bool, c: Bool) -> Int {\
               if (a && b || !c) { return 1; } else { return 2; }\
             }",
        );
        assert_no_compound_conditions(&module);
    }

    #[test]
    fn boolean_assignment_joins_through_a_block_parameter() {
        let (module, _, interner) = lowered_module(
            "func f(a: Bool, b: Bool) -> Bool { var x = true; x = a && b; return x; }",
        );
        let f = &module.functions[0];
        assert_no_compound_conditions(&module);

        let join = f
            .blocks
            .iter()
            .find(|b| label_of(&interner, b).contains("$phi"))
            .expect("join block");
        let param = join.parameter.as_ref().expect("join parameter");
        assert_eq!(param.ty, FirType::Bool);

        // The join re-materializes the assignment from the parameter.
        let FirStmt::Assign { target, value } = &join.statements[0] else {
            panic!("expected assignment in join");
        };
        assert_eq!(interner.resolve(*target), "x");
        assert_eq!(value, &FirExpr::Identifier(param.name));

        // Two feeder blocks branch in with constants.
        let feeders: Vec<_> = f
            .blocks
            .iter()
            .filter(|b| {
                matches!(
                    &b.terminator,
                    Terminator::Branch { target, arg: Some(FirExpr::Boolean(_)) }
                        if *target == join.label
                )
            })
            .collect();
        assert_eq!(feeders.len(), 2);
    }

    #[test]
    fn boolean_return_value_feeds_the_return_block_with_constants() {
        let (module, _, _) = lowered_module(
            "func f(a: Bool, b: Bool) -> Bool { return a || b; }",
        );
        let f = &module.functions[0];
        assert_no_compound_conditions(&module);

        let ret_label = f.return_block.label;
        let constant_feeders = f
            .blocks
            .iter()
            .filter(|b| {
                matches!(
                    &b.terminator,
                    Terminator::Branch { target, arg: Some(FirExpr::Boolean(_)) }
                        if *target == ret_label
                )
            })
            .count();
        assert_eq!(constant_feeders, 2);
    }

    #[test]
    fn plain_not_assignment_is_left_alone() {
        let (module, _, _) = lowered_module(
            "func f(a: Bool) -> Bool { let b = !a; return b; }",
        );
        let f = &module.functions[0];
        // No phi machinery for a bare unary.
        assert!(f
            .blocks
            .iter()
            .all(|b| b.parameter.is_none()));
    }
}
