//! The parser's raw AST.
//!
//! Raw nodes preserve the surface syntax: `if … else if … else` is a single
//! multi-arm node, `let` and `var` are distinct kinds, and top-level
//! functions may be wrapped in an attribute. Every node has a stable
//! [`NodeId`] and may be an `Incomplete` placeholder synthesized during
//! error recovery; `any_incomplete` walks a node's structure so consumers
//! can short-circuit on damaged subtrees.
//!
//! All raw nodes are arena-allocated (see [`crate::arena_ctx::AstContext`])
//! and live only until desugaring has produced the owned normalized tree.

use ql_base::{Span, Symbol};

use super::{BinaryOp, NodeId, TypeName, UnaryOp};

/// A raw expression.
#[derive(Debug)]
pub struct RawExpr<'a> {
    pub id: NodeId,
    pub span: Span,
    pub kind: RawExprKind<'a>,
}

#[derive(Debug)]
pub enum RawExprKind<'a> {
    Identifier(Symbol),
    Boolean(bool),
    Number(i64),
    Unary {
        op: UnaryOp,
        operand: &'a RawExpr<'a>,
    },
    Binary {
        op: BinaryOp,
        lhs: &'a RawExpr<'a>,
        rhs: &'a RawExpr<'a>,
    },
    FuncApp {
        callee: Symbol,
        args: &'a [&'a RawExpr<'a>],
    },
    Incomplete,
}

impl RawExpr<'_> {
    pub fn is_incomplete(&self) -> bool {
        matches!(self.kind, RawExprKind::Incomplete)
    }

    /// `true` if this expression or any sub-expression is a placeholder.
    pub fn any_incomplete(&self) -> bool {
        match &self.kind {
            RawExprKind::Incomplete => true,
            RawExprKind::Identifier(_) | RawExprKind::Boolean(_) | RawExprKind::Number(_) => false,
            RawExprKind::Unary { operand, .. } => operand.any_incomplete(),
            RawExprKind::Binary { lhs, rhs, .. } => lhs.any_incomplete() || rhs.any_incomplete(),
            RawExprKind::FuncApp { args, .. } => args.iter().any(|a| a.any_incomplete()),
        }
    }
}

/// One `(condition, body)` arm of a multi-arm if.
pub type RawIfArm<'a> = (&'a RawExpr<'a>, &'a RawBlock<'a>);

/// A raw statement.
#[derive(Debug)]
pub struct RawStmt<'a> {
    pub id: NodeId,
    pub span: Span,
    pub kind: RawStmtKind<'a>,
}

#[derive(Debug)]
pub enum RawStmtKind<'a> {
    LetDef {
        name: Symbol,
        annotation: Option<TypeName>,
        value: &'a RawExpr<'a>,
    },
    VarDef {
        name: Symbol,
        annotation: Option<TypeName>,
        value: &'a RawExpr<'a>,
    },
    Assignment {
        target: Symbol,
        value: &'a RawExpr<'a>,
    },
    Return {
        value: &'a RawExpr<'a>,
    },
    /// `if … else if … else` in the collapsed multi-arm form. The parser
    /// flattens `else if` chains into `arms`; the desugarer rebuilds the
    /// right-nested binary shape.
    If {
        arms: &'a [RawIfArm<'a>],
        else_branch: Option<&'a RawBlock<'a>>,
    },
    Call {
        expr: &'a RawExpr<'a>,
    },
    Incomplete,
}

impl RawStmt<'_> {
    pub fn is_incomplete(&self) -> bool {
        matches!(self.kind, RawStmtKind::Incomplete)
    }

    pub fn any_incomplete(&self) -> bool {
        match &self.kind {
            RawStmtKind::Incomplete => true,
            RawStmtKind::LetDef { value, .. }
            | RawStmtKind::VarDef { value, .. }
            | RawStmtKind::Assignment { value, .. }
            | RawStmtKind::Return { value } => value.any_incomplete(),
            RawStmtKind::If { arms, else_branch } => {
                arms.iter()
                    .any(|(cond, body)| cond.any_incomplete() || body.any_incomplete())
                    || else_branch.map(|b| b.any_incomplete()).unwrap_or(false)
            }
            RawStmtKind::Call { expr } => expr.any_incomplete(),
        }
    }
}

/// A raw `{ ... }` block.
#[derive(Debug)]
pub struct RawBlock<'a> {
    pub id: NodeId,
    pub span: Span,
    pub stmts: &'a [&'a RawStmt<'a>],
}

impl RawBlock<'_> {
    pub fn any_incomplete(&self) -> bool {
        self.stmts.iter().any(|s| s.any_incomplete())
    }
}

/// A raw function parameter.
#[derive(Debug)]
pub struct RawParam {
    pub id: NodeId,
    pub name: Symbol,
    pub annotation: TypeName,
    pub span: Span,
}

/// A raw function definition. Parameters live in the arena alongside the
/// other raw nodes so the whole raw tree frees in one shot.
#[derive(Debug)]
pub struct RawFuncDef<'a> {
    pub id: NodeId,
    pub span: Span,
    pub name: Symbol,
    pub params: &'a [RawParam],
    pub return_type: TypeName,
    pub body: &'a RawBlock<'a>,
}

/// Attributes accepted on top-level functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attribute {
    /// `@main`: the function is the program entry point.
    Main,
    /// `@never`: explicitly not an entry point.
    Never,
}

/// A top-level section.
#[derive(Debug)]
pub struct RawItem<'a> {
    pub id: NodeId,
    pub span: Span,
    pub kind: RawItemKind<'a>,
}

#[derive(Debug)]
pub enum RawItemKind<'a> {
    FuncDef(RawFuncDef<'a>),
    /// Attributed function, e.g. `@main func …`.
    Attributed {
        attribute: Attribute,
        func: RawFuncDef<'a>,
    },
    /// Top-level `let`/`var`; the statement is always a definition kind.
    Def(&'a RawStmt<'a>),
    /// Top-level call statement.
    Call(&'a RawStmt<'a>),
    Incomplete,
}

impl RawItem<'_> {
    pub fn is_incomplete(&self) -> bool {
        matches!(self.kind, RawItemKind::Incomplete)
    }

    pub fn any_incomplete(&self) -> bool {
        match &self.kind {
            RawItemKind::Incomplete => true,
            RawItemKind::FuncDef(func) | RawItemKind::Attributed { func, .. } => {
                func.body.any_incomplete()
            }
            RawItemKind::Def(stmt) | RawItemKind::Call(stmt) => stmt.any_incomplete(),
        }
    }
}

/// The raw program root. Owned by the caller; everything below it lives in
/// the arenas.
#[derive(Debug, Default)]
pub struct RawTopLevel<'a> {
    pub sections: Vec<&'a RawItem<'a>>,
}

impl RawTopLevel<'_> {
    pub fn any_incomplete(&self) -> bool {
        self.sections.iter().any(|s| s.any_incomplete())
    }
}
