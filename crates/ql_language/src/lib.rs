//! # ql-language
//!
//! Front half of the QL compiler: lexing, parsing with error recovery, and
//! desugaring into the normalized AST consumed by semantic analysis.
//!
//! ## Pipeline position
//!
//! ```text
//! QL Source
//!     │
//!     ▼
//! ┌───────────────────┐
//! │  Lexer            │ characters → tokens
//! └─────────┬─────────┘
//!           ▼
//! ┌───────────────────┐
//! │  Parser           │ tokens → raw AST (+ diagnostics, recovery)
//! └─────────┬─────────┘
//!           ▼
//! ┌───────────────────┐
//! │  Desugar          │ raw AST → normalized AST
//! └─────────┬─────────┘
//!           ▼
//!   semantic analysis (ql-compile)
//! ```
//!
//! ## Quick start
//!
//! ```
//! use ql_base::{Diagnostics, Interner};
//! use ql_language::ast::NodeIdGen;
//! use ql_language::{ast_arenas, desugar, Lexer, Parser};
//!
//! let mut interner = Interner::new();
//! let mut diagnostics = Diagnostics::new();
//! let mut ids = NodeIdGen::new();
//!
//! let tokens = Lexer::new("let x = 1 + 2;", &mut interner).tokenize(&mut diagnostics);
//!
//! ast_arenas!(ctx);
//! let raw = Parser::new(tokens, &mut interner, &mut ids, &mut diagnostics, ctx).parse();
//! let top_level = desugar::desugar(&raw, &mut ids);
//!
//! assert!(!diagnostics.has_errors());
//! assert_eq!(top_level.sections.len(), 1);
//! ```

pub mod arena_ctx;
pub mod ast;
pub mod desugar;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod token;
pub mod view;

pub use arena_ctx::AstContext;
pub use desugar::desugar as desugar_top_level;
pub use error::{ParserError, ParserErrorKind};
pub use lexer::Lexer;
pub use parser::recovery::{DefaultRecovery, RecoveryAction, RecoveryEngine};
pub use parser::Parser;
pub use token::{Keyword, Sym, Token, TokenKind};
pub use view::DisplayNode;

// Support for the `ast_arenas!` macro.
#[doc(hidden)]
pub mod __private {
    pub use ql_base::Arena;
}
