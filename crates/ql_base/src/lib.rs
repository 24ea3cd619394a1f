//! # ql-base
//!
//! Foundation types shared by every stage of the QL compiler.
//!
//! This crate carries no language knowledge. It provides:
//!
//! - [`Interner`] / [`Symbol`] — string interning with O(1) equality, used
//!   for identifiers, keywords, generated temporaries, and FIR block labels.
//! - [`Span`] — byte-offset source ranges carried by tokens, AST nodes, and
//!   diagnostics.
//! - [`Arena`] — bump allocation for the raw AST, which lives exactly as
//!   long as parsing plus desugaring.
//! - [`Diagnostic`] / [`Diagnostics`] — the error channel every pass writes
//!   into. Errors are recorded, never thrown across the pipeline.
//! - [`Style`] — ANSI color helpers for rendering diagnostics in terminals.

pub mod arena;
pub mod diagnostic;
pub mod intern;
pub mod span;
pub mod style;

pub use arena::Arena;
pub use diagnostic::{Diagnostic, Diagnostics};
pub use intern::{Interner, Symbol, SymbolEq};
pub use span::Span;
pub use style::Style;
