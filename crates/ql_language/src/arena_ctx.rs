//! Typed arena bundle for raw AST allocation.
//!
//! The parser needs one arena per raw node category. Rather than thread
//! eight arena references through every parse method, [`AstContext`] bundles
//! them. The arenas themselves are declared by the driver so the raw tree's
//! lifetime is visible at the call site:
//!
//! ```
//! use ql_base::Arena;
//! use ql_language::arena_ctx::AstContext;
//!
//! let exprs = Arena::new();
//! let expr_refs = Arena::new();
//! let stmts = Arena::new();
//! let stmt_refs = Arena::new();
//! let blocks = Arena::new();
//! let arms = Arena::new();
//! let items = Arena::new();
//! let params = Arena::new();
//! let ctx = AstContext::new(
//!     &exprs, &expr_refs, &stmts, &stmt_refs, &blocks, &arms, &items, &params,
//! );
//! # let _ = ctx;
//! ```

use ql_base::Arena;

use crate::ast::raw::{RawBlock, RawExpr, RawIfArm, RawItem, RawParam, RawStmt};

/// References to the arenas a single parse allocates from.
#[derive(Clone, Copy)]
pub struct AstContext<'a> {
    pub exprs: &'a Arena<RawExpr<'a>>,
    pub expr_refs: &'a Arena<&'a RawExpr<'a>>,
    pub stmts: &'a Arena<RawStmt<'a>>,
    pub stmt_refs: &'a Arena<&'a RawStmt<'a>>,
    pub blocks: &'a Arena<RawBlock<'a>>,
    pub arms: &'a Arena<RawIfArm<'a>>,
    pub items: &'a Arena<RawItem<'a>>,
    pub params: &'a Arena<RawParam>,
}

impl<'a> AstContext<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        exprs: &'a Arena<RawExpr<'a>>,
        expr_refs: &'a Arena<&'a RawExpr<'a>>,
        stmts: &'a Arena<RawStmt<'a>>,
        stmt_refs: &'a Arena<&'a RawStmt<'a>>,
        blocks: &'a Arena<RawBlock<'a>>,
        arms: &'a Arena<RawIfArm<'a>>,
        items: &'a Arena<RawItem<'a>>,
        params: &'a Arena<RawParam>,
    ) -> Self {
        AstContext {
            exprs,
            expr_refs,
            stmts,
            stmt_refs,
            blocks,
            arms,
            items,
            params,
        }
    }

    pub fn alloc_expr(&self, expr: RawExpr<'a>) -> &'a RawExpr<'a> {
        self.exprs.alloc(expr)
    }

    pub fn alloc_expr_list(&self, exprs: Vec<&'a RawExpr<'a>>) -> &'a [&'a RawExpr<'a>] {
        self.expr_refs.alloc_slice(exprs)
    }

    pub fn alloc_stmt(&self, stmt: RawStmt<'a>) -> &'a RawStmt<'a> {
        self.stmts.alloc(stmt)
    }

    pub fn alloc_stmt_list(&self, stmts: Vec<&'a RawStmt<'a>>) -> &'a [&'a RawStmt<'a>] {
        self.stmt_refs.alloc_slice(stmts)
    }

    pub fn alloc_block(&self, block: RawBlock<'a>) -> &'a RawBlock<'a> {
        self.blocks.alloc(block)
    }

    pub fn alloc_arms(&self, arms: Vec<RawIfArm<'a>>) -> &'a [RawIfArm<'a>] {
        self.arms.alloc_slice(arms)
    }

    pub fn alloc_item(&self, item: RawItem<'a>) -> &'a RawItem<'a> {
        self.items.alloc(item)
    }

    pub fn alloc_params(&self, params: Vec<RawParam>) -> &'a [RawParam] {
        self.params.alloc_slice(params)
    }
}

/// Declares the eight arenas and builds an [`AstContext`] over them.
///
/// Usable only where a `let` binding can live, i.e. in function bodies.
#[macro_export]
macro_rules! ast_arenas {
    ($ctx:ident) => {
        let exprs = $crate::__private::Arena::new();
        let expr_refs = $crate::__private::Arena::new();
        let stmts = $crate::__private::Arena::new();
        let stmt_refs = $crate::__private::Arena::new();
        let blocks = $crate::__private::Arena::new();
        let arms = $crate::__private::Arena::new();
        let items = $crate::__private::Arena::new();
        let params = $crate::__private::Arena::new();
        let $ctx = $crate::arena_ctx::AstContext::new(
            &exprs, &expr_refs, &stmts, &stmt_refs, &blocks, &arms, &items, &params,
        );
    };
}
