//! Display-tree views of the normalized AST for editor tooling.
//!
//! Editors render the program as a tree of labelled nodes; they neither
//! want the interner nor the full AST. [`DisplayNode`] is the owned,
//! serializable shape they consume: a node id (stable across the session),
//! a fixed per-kind name, a short description, and children.
//!
//! Names are fixed per node kind (`"If Statement"`, `"Func Definition"`,
//! `"Binary Operation"`, ...); descriptions carry the interesting detail —
//! the operator symbol, the identifier text, the literal value.

use ql_base::Interner;
use serde::Serialize;

use crate::ast::{Block, Expr, ExprKind, FuncDef, Item, ItemKind, Stmt, StmtKind, TopLevel};

/// One node of the editor display tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayNode {
    pub id: u32,
    pub name: &'static str,
    pub description: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<DisplayNode>,
}

impl DisplayNode {
    fn new(id: u32, name: &'static str, description: impl Into<String>) -> Self {
        DisplayNode {
            id,
            name,
            description: description.into(),
            children: Vec::new(),
        }
    }

    fn with_children(mut self, children: Vec<DisplayNode>) -> Self {
        self.children = children;
        self
    }
}

/// Builds the display tree for a whole program.
pub fn display_top_level(top: &TopLevel, interner: &Interner) -> DisplayNode {
    DisplayNode::new(0, "Top Level", "").with_children(
        top.sections
            .iter()
            .map(|item| display_item(item, interner))
            .collect(),
    )
}

fn display_item(item: &Item, interner: &Interner) -> DisplayNode {
    match &item.kind {
        ItemKind::Func(func) => display_func(func, interner),
        ItemKind::Def(stmt) | ItemKind::Call(stmt) => display_stmt(stmt, interner),
        ItemKind::Incomplete => DisplayNode::new(item.id.0, "Incomplete", ""),
    }
}

fn display_func(func: &FuncDef, interner: &Interner) -> DisplayNode {
    let mut children: Vec<DisplayNode> = func
        .params
        .iter()
        .map(|p| {
            DisplayNode::new(
                p.id.0,
                "Parameter",
                format!("{}: {}", interner.resolve(p.name), p.annotation),
            )
        })
        .collect();
    children.push(display_block(&func.body, interner));

    let description = if func.is_entry {
        format!("@main {}", interner.resolve(func.name))
    } else {
        interner.resolve(func.name).to_string()
    };
    DisplayNode::new(func.id.0, "Func Definition", description).with_children(children)
}

fn display_block(block: &Block, interner: &Interner) -> DisplayNode {
    DisplayNode::new(block.id.0, "Block", "").with_children(
        block
            .stmts
            .iter()
            .map(|stmt| display_stmt(stmt, interner))
            .collect(),
    )
}

fn display_stmt(stmt: &Stmt, interner: &Interner) -> DisplayNode {
    match &stmt.kind {
        StmtKind::Definition {
            name, immutable, value, ..
        } => {
            let keyword = if *immutable { "let" } else { "var" };
            DisplayNode::new(
                stmt.id.0,
                "Definition",
                format!("{} {}", keyword, interner.resolve(*name)),
            )
            .with_children(vec![display_expr(value, interner)])
        }
        StmtKind::Assignment { target, value } => {
            DisplayNode::new(stmt.id.0, "Assignment", interner.resolve(*target))
                .with_children(vec![display_expr(value, interner)])
        }
        StmtKind::Return { value } => DisplayNode::new(stmt.id.0, "Return Statement", "")
            .with_children(vec![display_expr(value, interner)]),
        StmtKind::If {
            condition,
            then_block,
            else_block,
            ..
        } => {
            let mut children = vec![
                display_expr(condition, interner),
                display_block(then_block, interner),
            ];
            if let Some(else_block) = else_block {
                children.push(display_block(else_block, interner));
            }
            DisplayNode::new(stmt.id.0, "If Statement", "").with_children(children)
        }
        StmtKind::Call(expr) => display_expr(expr, interner),
        StmtKind::Incomplete => DisplayNode::new(stmt.id.0, "Incomplete", ""),
    }
}

fn display_expr(expr: &Expr, interner: &Interner) -> DisplayNode {
    match &expr.kind {
        ExprKind::Identifier(sym) => {
            DisplayNode::new(expr.id.0, "Identifier", interner.resolve(*sym))
        }
        ExprKind::Boolean(value) => {
            DisplayNode::new(expr.id.0, "Boolean Literal", value.to_string())
        }
        ExprKind::Number(value) => {
            DisplayNode::new(expr.id.0, "Number Literal", value.to_string())
        }
        ExprKind::Unary { op, operand } => {
            DisplayNode::new(expr.id.0, "Unary Operation", op.symbol())
                .with_children(vec![display_expr(operand, interner)])
        }
        ExprKind::Binary { op, lhs, rhs } => {
            DisplayNode::new(expr.id.0, "Binary Operation", op.symbol()).with_children(vec![
                display_expr(lhs, interner),
                display_expr(rhs, interner),
            ])
        }
        ExprKind::Call { callee, args } => DisplayNode::new(
            expr.id.0,
            "Function Application",
            interner.resolve(*callee),
        )
        .with_children(args.iter().map(|a| display_expr(a, interner)).collect()),
        ExprKind::Incomplete => DisplayNode::new(expr.id.0, "Incomplete", ""),
    }
}
