//! FIR: the flat intermediate representation.
//!
//! A [`Module`] holds one [`Function`] per QL function. Each function is a
//! control-flow graph of [`BasicBlock`]s plus a distinguished *return
//! block*: the single sink, carrying a typed block parameter of the
//! function's return type and terminated by `Return(param)`. Branching into
//! the return block passes the return value as the branch argument.
//!
//! ```text
//! func f() -> Int { return 1 + 2; }
//!
//! block f$entry:
//!   tmp_$1$ = 1 + 2
//!   -> br f$return(tmp_$1$)
//! block f$return(f$val: Int):
//!   -> ret f$val
//! ```
//!
//! # Invariants
//!
//! - every block ends with exactly one terminator; terminators that proved
//!   unreachable during construction are preserved in
//!   `unreachable_terminators` for diagnostics;
//! - label symbols are unique within a module (the context's gensym feeds
//!   every label);
//! - the return block is never mutated after FIR generation;
//! - every terminator target resolves to a block of the same function.
//!
//! All FIR types are `Clone`; lowering passes deep-copy expressions when
//! the same value feeds multiple terminators.

pub mod arith;
pub mod builder;
pub mod gen;
pub mod short_circuit;

use ql_base::{Interner, Symbol};
use ql_language::ast::{BinaryOp, UnaryOp};

/// Primitive FIR value types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FirType {
    Int,
    Bool,
    String,
    Void,
}

impl std::fmt::Display for FirType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FirType::Int => "Int",
            FirType::Bool => "Bool",
            FirType::String => "String",
            FirType::Void => "Void",
        };
        write!(f, "{}", name)
    }
}

/// A typed parameter: of a function, or of a basic block.
#[derive(Debug, Clone, PartialEq)]
pub struct FirParam {
    pub name: Symbol,
    pub ty: FirType,
}

/// A FIR expression.
#[derive(Debug, Clone, PartialEq)]
pub enum FirExpr {
    Identifier(Symbol),
    Integer(i64),
    Boolean(bool),
    Unary {
        op: UnaryOp,
        operand: Box<FirExpr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<FirExpr>,
        rhs: Box<FirExpr>,
    },
    Call {
        callee: Symbol,
        args: Vec<FirExpr>,
    },
    /// The unit value; passed to the return block of `Void` functions.
    EmptyTuple,
}

impl FirExpr {
    /// `true` for identifiers and literals.
    pub fn is_leaf(&self) -> bool {
        matches!(
            self,
            FirExpr::Identifier(_) | FirExpr::Integer(_) | FirExpr::Boolean(_) | FirExpr::EmptyTuple
        )
    }

    /// `true` when evaluating this expression requires short-circuit
    /// control flow: a boolean binary anywhere under unary wrappers.
    pub fn needs_short_circuit(&self) -> bool {
        match self {
            FirExpr::Binary { op, .. } => op.is_boolean(),
            FirExpr::Unary { operand, .. } => operand.needs_short_circuit(),
            _ => false,
        }
    }
}

/// A FIR statement.
#[derive(Debug, Clone, PartialEq)]
pub enum FirStmt {
    Assign { target: Symbol, value: FirExpr },
    /// A call whose value is discarded.
    Call { callee: Symbol, args: Vec<FirExpr> },
}

/// A block terminator.
#[derive(Debug, Clone, PartialEq)]
pub enum Terminator {
    /// Unconditional jump, optionally passing a block argument.
    Branch {
        target: Symbol,
        arg: Option<FirExpr>,
    },
    CondBranch {
        condition: FirExpr,
        then_label: Symbol,
        else_label: Symbol,
    },
    Return(FirExpr),
}

/// A basic block.
#[derive(Debug, Clone, PartialEq)]
pub struct BasicBlock {
    pub label: Symbol,
    pub parameter: Option<FirParam>,
    pub statements: Vec<FirStmt>,
    pub terminator: Terminator,
    /// Terminators encountered while no block was live; kept for
    /// diagnostics, never executed.
    pub unreachable_terminators: Vec<Terminator>,
}

/// A lowered function.
#[derive(Debug, Clone)]
pub struct Function {
    pub name: Symbol,
    pub parameters: Vec<FirParam>,
    pub blocks: Vec<BasicBlock>,
    pub return_block: BasicBlock,
}

impl Function {
    /// Finds a body block by label.
    pub fn block(&self, label: Symbol) -> Option<&BasicBlock> {
        if self.return_block.label == label {
            return Some(&self.return_block);
        }
        self.blocks.iter().find(|b| b.label == label)
    }

    /// Iterates body blocks and the return block.
    pub fn all_blocks(&self) -> impl Iterator<Item = &BasicBlock> {
        self.blocks.iter().chain(std::iter::once(&self.return_block))
    }
}

/// The pipeline's terminal artifact.
#[derive(Debug, Clone, Default)]
pub struct Module {
    pub functions: Vec<Function>,
}

// ---------------------------------------------------------------------------
// Textual dump
// ---------------------------------------------------------------------------

/// Renders FIR with names resolved, for tests and debugging.
pub struct FirPrinter<'a> {
    interner: &'a Interner,
}

impl<'a> FirPrinter<'a> {
    pub fn new(interner: &'a Interner) -> Self {
        FirPrinter { interner }
    }

    pub fn module(&self, module: &Module) -> String {
        let mut out = String::new();
        for function in &module.functions {
            out.push_str(&self.function(function));
            out.push('\n');
        }
        out
    }

    pub fn function(&self, function: &Function) -> String {
        let mut out = format!("func {}(", self.interner.resolve(function.name));
        for (i, param) in function.parameters.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            out.push_str(&format!("{}: {}", self.interner.resolve(param.name), param.ty));
        }
        out.push_str("):\n");
        for block in function.all_blocks() {
            out.push_str(&self.block(block));
        }
        out
    }

    pub fn block(&self, block: &BasicBlock) -> String {
        let mut out = format!("block {}", self.interner.resolve(block.label));
        if let Some(param) = &block.parameter {
            out.push_str(&format!("({}: {})", self.interner.resolve(param.name), param.ty));
        }
        out.push_str(":\n");
        for stmt in &block.statements {
            out.push_str(&format!("  {}\n", self.stmt(stmt)));
        }
        out.push_str(&format!("  -> {}\n", self.terminator(&block.terminator)));
        for shadow in &block.unreachable_terminators {
            out.push_str(&format!("  !! {}\n", self.terminator(shadow)));
        }
        out
    }

    pub fn stmt(&self, stmt: &FirStmt) -> String {
        match stmt {
            FirStmt::Assign { target, value } => {
                format!("{} = {}", self.interner.resolve(*target), self.expr(value))
            }
            FirStmt::Call { callee, args } => {
                format!("{}({})", self.interner.resolve(*callee), self.args(args))
            }
        }
    }

    pub fn terminator(&self, terminator: &Terminator) -> String {
        match terminator {
            Terminator::Branch { target, arg } => match arg {
                Some(arg) => format!("br {}({})", self.interner.resolve(*target), self.expr(arg)),
                None => format!("br {}", self.interner.resolve(*target)),
            },
            Terminator::CondBranch {
                condition,
                then_label,
                else_label,
            } => format!(
                "cond {} ? {} : {}",
                self.expr(condition),
                self.interner.resolve(*then_label),
                self.interner.resolve(*else_label)
            ),
            Terminator::Return(value) => format!("ret {}", self.expr(value)),
        }
    }

    pub fn expr(&self, expr: &FirExpr) -> String {
        match expr {
            FirExpr::Identifier(sym) => self.interner.resolve(*sym).to_string(),
            FirExpr::Integer(value) => value.to_string(),
            FirExpr::Boolean(value) => value.to_string(),
            FirExpr::Unary { op, operand } => format!("{}{}", op.symbol(), self.expr(operand)),
            FirExpr::Binary { op, lhs, rhs } => {
                format!("{} {} {}", self.expr(lhs), op.symbol(), self.expr(rhs))
            }
            FirExpr::Call { callee, args } => {
                format!("{}({})", self.interner.resolve(*callee), self.args(args))
            }
            FirExpr::EmptyTuple => "()".to_string(),
        }
    }

    fn args(&self, args: &[FirExpr]) -> String {
        args.iter()
            .map(|a| self.expr(a))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn needs_short_circuit_sees_through_unary_wrappers() {
        let compound = FirExpr::Unary {
            op: UnaryOp::Not,
            operand: Box::new(FirExpr::Binary {
                op: BinaryOp::And,
                lhs: Box::new(FirExpr::Identifier(Symbol::EMPTY)),
                rhs: Box::new(FirExpr::Identifier(Symbol::EMPTY)),
            }),
        };
        assert!(compound.needs_short_circuit());

        let plain_not = FirExpr::Unary {
            op: UnaryOp::Not,
            operand: Box::new(FirExpr::Identifier(Symbol::EMPTY)),
        };
        assert!(!plain_not.needs_short_circuit());
    }

    #[test]
    fn arithmetic_is_not_short_circuit() {
        let sum = FirExpr::Binary {
            op: BinaryOp::Add,
            lhs: Box::new(FirExpr::Integer(1)),
            rhs: Box::new(FirExpr::Integer(2)),
        };
        assert!(!sum.needs_short_circuit());
    }

    #[test]
    fn leaves_are_leaves() {
        assert!(FirExpr::Integer(3).is_leaf());
        assert!(FirExpr::Boolean(true).is_leaf());
        assert!(FirExpr::EmptyTuple.is_leaf());
        assert!(!FirExpr::Unary {
            op: UnaryOp::Not,
            operand: Box::new(FirExpr::Boolean(true))
        }
        .is_leaf());
    }

    #[test]
    fn printer_renders_a_block() {
        let mut interner = Interner::new();
        let label = interner.intern("f$entry");
        let ret = interner.intern("f$return");
        let x = interner.intern("x");
        let block = BasicBlock {
            label,
            parameter: None,
            statements: vec![FirStmt::Assign {
                target: x,
                value: FirExpr::Binary {
                    op: BinaryOp::Add,
                    lhs: Box::new(FirExpr::Integer(1)),
                    rhs: Box::new(FirExpr::Integer(2)),
                },
            }],
            terminator: Terminator::Branch {
                target: ret,
                arg: Some(FirExpr::Identifier(x)),
            },
            unreachable_terminators: Vec::new(),
        };
        let printed = FirPrinter::new(&interner).block(&block);
        assert!(printed.contains("block f$entry:"));
        assert!(printed.contains("x = 1 + 2"));
        assert!(printed.contains("br f$return(x)"));
    }
}
