//! FIR generation: normalized AST → control-flow graph.
//!
//! One [`Function`] per `FuncDef`. The entry block is `<fn>$entry`; the
//! return block `<fn>$return` carries the typed return-value parameter
//! `<fn>$val` and is the only block that `Return`s. `return e` lowers to a
//! branch into the return block with `e` as the block argument; a body that
//! falls off the end branches there too (with the unit value for `Void`
//! functions).
//!
//! # If lowering
//!
//! ```text
//! if (c) { T } else { E }      cond c ? f$ifN$then : f$ifN$else
//! …                            block f$ifN$then:  T…  -> br f$ifN$end
//!                              block f$ifN$else:  E…  -> br f$ifN$end
//!                              block f$ifN$end:   …
//! ```
//!
//! A desugared `else if` chain shares one join: the outermost if registers
//! its `$end` label under its own node id, and every inner if (linked
//! through `desugared_from`) reuses it instead of minting its own.
//!
//! Conditions are lowered as plain expressions here; compound booleans are
//! expanded into short-circuit control flow by the next pass.

use ql_base::{Interner, Symbol};
use ql_language::ast::{
    Block, Expr, ExprKind, FuncDef, NodeId, Stmt, StmtKind, TypeName,
};
use rustc_hash::FxHashMap;

use super::builder::FunctionBuilder;
use super::{BasicBlock, FirExpr, FirParam, FirStmt, FirType, Function, Module, Terminator};
use crate::context::{AnalysisContext, BlockRef, BlockSlot};

/// Lowers every function and records the label→block map in the context.
pub fn generate_fir(ctx: &mut AnalysisContext, interner: &mut Interner) -> Module {
    let top_level = std::mem::take(&mut ctx.top_level);

    let mut functions = Vec::new();
    for func in top_level.functions() {
        if func.any_incomplete() {
            continue;
        }
        let function = lower_function(ctx, interner, func);
        log::trace!(
            "lowered {}: {} blocks",
            interner.resolve(function.name),
            function.blocks.len()
        );
        functions.push(function);
    }

    ctx.top_level = top_level;
    let module = Module { functions };

    for (function_index, function) in module.functions.iter().enumerate() {
        for (block_index, block) in function.blocks.iter().enumerate() {
            ctx.blocks.insert(
                block.label,
                BlockRef {
                    function: function_index,
                    block: BlockSlot::Body(block_index),
                },
            );
        }
        ctx.blocks.insert(
            function.return_block.label,
            BlockRef {
                function: function_index,
                block: BlockSlot::Return,
            },
        );
    }

    module
}

struct LowerEnv {
    fn_name: String,
    ret_label: Symbol,
    is_void: bool,
    /// Outermost chain-if id → shared `$end` label.
    joins: FxHashMap<NodeId, Symbol>,
}

fn lower_function(ctx: &mut AnalysisContext, interner: &mut Interner, func: &FuncDef) -> Function {
    let fn_name = interner.resolve(func.name).to_string();
    let entry_label = interner.intern(&format!("{}$entry", fn_name));
    let ret_label = interner.intern(&format!("{}$return", fn_name));
    let ret_val = interner.intern(&format!("{}$val", fn_name));

    let return_block = BasicBlock {
        label: ret_label,
        parameter: Some(FirParam {
            name: ret_val,
            ty: fir_type(&func.return_type),
        }),
        statements: Vec::new(),
        terminator: Terminator::Return(FirExpr::Identifier(ret_val)),
        unreachable_terminators: Vec::new(),
    };

    let mut env = LowerEnv {
        fn_name,
        ret_label,
        is_void: func.return_type == TypeName::Void,
        joins: FxHashMap::default(),
    };

    let mut builder = FunctionBuilder::new();
    builder.start_block(entry_label, None);
    lower_block(&mut builder, ctx, interner, &mut env, &func.body);

    if builder.is_open() {
        let arg = if env.is_void {
            Some(FirExpr::EmptyTuple)
        } else {
            None
        };
        builder.terminate(Terminator::Branch {
            target: env.ret_label,
            arg,
        });
    }

    Function {
        name: func.name,
        parameters: func
            .params
            .iter()
            .map(|p| FirParam {
                name: p.name,
                ty: fir_type(&p.annotation),
            })
            .collect(),
        blocks: builder.finish(),
        return_block,
    }
}

fn lower_block(
    builder: &mut FunctionBuilder,
    ctx: &mut AnalysisContext,
    interner: &mut Interner,
    env: &mut LowerEnv,
    block: &Block,
) {
    for stmt in &block.stmts {
        lower_stmt(builder, ctx, interner, env, stmt);
    }
}

fn lower_stmt(
    builder: &mut FunctionBuilder,
    ctx: &mut AnalysisContext,
    interner: &mut Interner,
    env: &mut LowerEnv,
    stmt: &Stmt,
) {
    match &stmt.kind {
        StmtKind::Definition { name, value, .. } => builder.push_stmt(FirStmt::Assign {
            target: *name,
            value: lower_expr(value),
        }),
        StmtKind::Assignment { target, value } => builder.push_stmt(FirStmt::Assign {
            target: *target,
            value: lower_expr(value),
        }),
        StmtKind::Return { value } => builder.terminate(Terminator::Branch {
            target: env.ret_label,
            arg: Some(lower_expr(value)),
        }),
        StmtKind::Call(expr) => match &expr.kind {
            ExprKind::Call { callee, args } => builder.push_stmt(FirStmt::Call {
                callee: *callee,
                args: args.iter().map(lower_expr).collect(),
            }),
            _ => unreachable!("call statements always wrap call expressions"),
        },
        StmtKind::If {
            condition,
            then_block,
            else_block,
            desugared_from,
        } => {
            let index = ctx.gensym.next_index();
            let then_label = interner.intern(&format!("{}$if{}$then", env.fn_name, index));

            // Chain ifs reuse the outermost if's join.
            let reused = desugared_from.and_then(|outer| env.joins.get(&outer).copied());
            let (end_label, owns_end) = match reused {
                Some(label) => (label, false),
                None => {
                    let label = interner.intern(&format!("{}$if{}$end", env.fn_name, index));
                    if desugared_from.is_none() {
                        env.joins.insert(stmt.id, label);
                    }
                    (label, true)
                }
            };

            let else_label = match else_block {
                Some(_) => interner.intern(&format!("{}$if{}$else", env.fn_name, index)),
                None => end_label,
            };

            builder.terminate(Terminator::CondBranch {
                condition: lower_expr(condition),
                then_label,
                else_label,
            });

            builder.start_block(then_label, None);
            lower_block(builder, ctx, interner, env, then_block);
            if builder.is_open() {
                builder.terminate(Terminator::Branch {
                    target: end_label,
                    arg: None,
                });
            }

            if let Some(else_block) = else_block {
                builder.start_block(else_label, None);
                lower_block(builder, ctx, interner, env, else_block);
                if builder.is_open() {
                    builder.terminate(Terminator::Branch {
                        target: end_label,
                        arg: None,
                    });
                }
            }

            if owns_end {
                builder.start_block(end_label, None);
                if desugared_from.is_none() {
                    env.joins.remove(&stmt.id);
                }
            }
        }
        StmtKind::Incomplete => {}
    }
}

fn lower_expr(expr: &Expr) -> FirExpr {
    match &expr.kind {
        ExprKind::Identifier(sym) => FirExpr::Identifier(*sym),
        ExprKind::Number(value) => FirExpr::Integer(*value),
        ExprKind::Boolean(value) => FirExpr::Boolean(*value),
        ExprKind::Unary { op, operand } => FirExpr::Unary {
            op: *op,
            operand: Box::new(lower_expr(operand)),
        },
        ExprKind::Binary { op, lhs, rhs } => FirExpr::Binary {
            op: *op,
            lhs: Box::new(lower_expr(lhs)),
            rhs: Box::new(lower_expr(rhs)),
        },
        ExprKind::Call { callee, args } => FirExpr::Call {
            callee: *callee,
            args: args.iter().map(lower_expr).collect(),
        },
        // Incomplete nodes never reach FIR generation; the driver halts on
        // parse diagnostics first.
        ExprKind::Incomplete => FirExpr::EmptyTuple,
    }
}

fn fir_type(ty: &TypeName) -> FirType {
    match ty {
        TypeName::Int => FirType::Int,
        TypeName::Bool => FirType::Bool,
        TypeName::String => FirType::String,
        TypeName::Void => FirType::Void,
        // Function types never appear in value positions.
        TypeName::Arrow(_, _) => FirType::Void,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::BlockSlot;
    use crate::test_support::{build_module, resolve_label};
    use ql_language::ast::BinaryOp;

    #[test]
    fn return_lowers_to_a_branch_into_the_return_block() {
        let (module, ctx, interner) = build_module("func f() -> Int { return 1 + 2; }");
        assert_eq!(module.functions.len(), 1);
        let f = &module.functions[0];

        let entry = &f.blocks[0];
        assert_eq!(interner.resolve(entry.label), "f$entry");
        // The AST linearizer already hoisted the sum.
        assert_eq!(entry.statements.len(), 1);
        let FirStmt::Assign { value, .. } = &entry.statements[0] else {
            panic!("expected assignment");
        };
        assert!(matches!(value, FirExpr::Binary { op: BinaryOp::Add, .. }));
        let Terminator::Branch { target, arg } = &entry.terminator else {
            panic!("expected branch");
        };
        assert_eq!(interner.resolve(*target), "f$return");
        assert!(matches!(arg, Some(FirExpr::Identifier(_))));

        // Return block: typed parameter, Return(param), never anything else.
        let ret = &f.return_block;
        assert_eq!(interner.resolve(ret.label), "f$return");
        let param = ret.parameter.as_ref().expect("return parameter");
        assert_eq!(param.ty, FirType::Int);
        assert!(matches!(ret.terminator, Terminator::Return(FirExpr::Identifier(_))));
        let _ = ctx;
    }

    #[test]
    fn if_else_produces_then_else_and_join_blocks() {
        let (module, _, interner) = build_module(
            "func f(c: Bool) -> Int { if (c) { return 1; } else { return 2; } }",
        );
        let f = &module.functions[0];
        let labels: Vec<&str> = f.blocks.iter().map(|b| interner.resolve(b.label)).collect();
        assert!(labels.contains(&"f$entry"), "{labels:?}");
        assert!(labels.iter().any(|l| l.ends_with("$then")), "{labels:?}");
        assert!(labels.iter().any(|l| l.ends_with("$else")), "{labels:?}");
        assert!(labels.iter().any(|l| l.ends_with("$end")), "{labels:?}");

        let Terminator::CondBranch { condition, .. } = &f.blocks[0].terminator else {
            panic!("expected conditional branch");
        };
        assert!(matches!(condition, FirExpr::Identifier(_)));
    }

    #[test]
    fn else_if_chain_shares_a_single_join_block() {
        let (module, _, interner) = build_module(
            "func f(a: Bool, b: Bool) -> Int {\
               if (a) { return 1; } else if (b) { return 2; } else { return 3; }\
               return 4;\
             }",
        );
        let f = &module.functions[0];
        let end_blocks: Vec<&str> = f
            .blocks
            .iter()
            .map(|b| interner.resolve(b.label))
            .filter(|l| l.ends_with("$end"))
            .collect();
        assert_eq!(end_blocks.len(), 1, "one join for the whole chain: {end_blocks:?}");
    }

    #[test]
    fn if_without_else_branches_to_the_join() {
        let (module, _, interner) = build_module(
            "func f(c: Bool) -> Int { if (c) { return 1; } return 2; }",
        );
        let f = &module.functions[0];
        let Terminator::CondBranch { else_label, .. } = &f.blocks[0].terminator else {
            panic!("expected conditional branch");
        };
        assert!(interner.resolve(*else_label).ends_with("$end"));
    }

    #[test]
    fn void_function_falls_through_with_the_unit_value() {
        let (module, _, _) = build_module("func f() -> Void { let x = 1; }");
        let f = &module.functions[0];
        let last = f.blocks.last().expect("at least one block");
        let Terminator::Branch { arg, .. } = &last.terminator else {
            panic!("expected branch to return block");
        };
        assert_eq!(*arg, Some(FirExpr::EmptyTuple));
        assert_eq!(f.return_block.parameter.as_ref().map(|p| p.ty), Some(FirType::Void));
    }

    #[test]
    fn statements_after_return_become_shadow_terminators() {
        let (module, _, _) = build_module(
            "func f() -> Int { return 1; return 2; }",
        );
        let f = &module.functions[0];
        assert_eq!(f.blocks.len(), 1);
        assert_eq!(f.blocks[0].unreachable_terminators.len(), 1);
    }

    #[test]
    fn every_terminator_target_resolves_within_the_function() {
        let (module, ctx, interner) = build_module(
            "func f(a: Bool, b: Bool) -> Int {\
               if (a) { return 1; } else if (b) { return 2; } else { return 3; }\
               return 4;\
             }",
        );
        let f = &module.functions[0];
        for block in f.all_blocks() {
            let targets: Vec<Symbol> = match &block.terminator {
                Terminator::Branch { target, .. } => vec![*target],
                Terminator::CondBranch {
                    then_label,
                    else_label,
                    ..
                } => vec![*then_label, *else_label],
                Terminator::Return(_) => vec![],
            };
            for target in targets {
                assert!(
                    f.block(target).is_some(),
                    "label {} does not resolve",
                    interner.resolve(target)
                );
            }
        }
        let _ = ctx;
    }

    #[test]
    fn context_label_map_covers_every_block() {
        let (module, ctx, _) = build_module(
            "func f(c: Bool) -> Int { if (c) { return 1; } return 2; }\
             func g() -> Int { return 3; }",
        );
        for (fi, f) in module.functions.iter().enumerate() {
            for (bi, block) in f.blocks.iter().enumerate() {
                assert_eq!(
                    resolve_label(&ctx, block.label),
                    Some((fi, BlockSlot::Body(bi)))
                );
            }
            assert_eq!(
                resolve_label(&ctx, f.return_block.label),
                Some((fi, BlockSlot::Return))
            );
        }
    }

    #[test]
    fn parameters_carry_their_declared_types() {
        let (module, _, _) = build_module(
            "func f(n: Int, ok: Bool) -> Int { return n; }",
        );
        let f = &module.functions[0];
        assert_eq!(f.parameters.len(), 2);
        assert_eq!(f.parameters[0].ty, FirType::Int);
        assert_eq!(f.parameters[1].ty, FirType::Bool);
    }
}
