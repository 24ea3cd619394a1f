//! Semantic analysis passes.
//!
//! The passes run in a fixed order, each reading what earlier passes wrote
//! into the [`AnalysisContext`](crate::context::AnalysisContext):
//!
//! | # | Pass | Writes |
//! |---|------|--------|
//! | 1 | [`scopes::build_scopes`] | scope arena, node→scope map |
//! | 2 | [`binding::check_bindings`] | diagnostics only |
//! | 3 | [`symbols::build_symbol_table`] | symbol table |
//! | 4 | [`typecheck::typecheck`] | type cache, declaration types, diagnostics |
//! | 5 | [`linearize::linearize`] | rewritten AST, fresh temporaries |
//!
//! The driver checks the diagnostics sink between passes and stops at the
//! first failure.

pub mod binding;
pub mod linearize;
pub mod scopes;
pub mod symbols;
pub mod typecheck;

pub use binding::check_bindings;
pub use linearize::linearize;
pub use scopes::{build_scopes, BindingKind, Scope, ScopeArena, ScopeBinding, ScopeId};
pub use symbols::build_symbol_table;
pub use typecheck::typecheck;
