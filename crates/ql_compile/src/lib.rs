//! # ql-compile
//!
//! Back half of the QL compiler: semantic analysis over the normalized AST
//! and lowering into FIR, the flat intermediate representation.
//!
//! ## Pipeline
//!
//! | # | Stage | Module |
//! |---|-------|--------|
//! | 1 | BuildScopes | [`analysis::scopes`] |
//! | 2 | BindingCheck | [`analysis::binding`] |
//! | 3 | BuildSymbolTable | [`analysis::symbols`] |
//! | 4 | Typecheck | [`analysis::typecheck`] |
//! | 5 | Linearize | [`analysis::linearize`] |
//! | 6 | FIRGen | [`fir::gen`] |
//! | 7 | ShortCircuitLower | [`fir::short_circuit`] |
//! | 8 | ArithmeticLinearize | [`fir::arith`] |
//!
//! The driver is [`compile::compile`]; it stops at the first stage that
//! records a diagnostic and returns whatever was built.
//!
//! ## Quick start
//!
//! ```
//! use ql_compile::compile;
//!
//! let result = compile("func f() -> Int { return 1 + 2; }");
//! assert!(result.succeeded());
//! let module = result.module.expect("lowered module");
//! assert_eq!(module.functions.len(), 1);
//! ```

pub mod analysis;
pub mod compile;
pub mod context;
pub mod error;
pub mod fir;
pub mod suggest;

#[cfg(test)]
pub(crate) mod test_support;

pub use compile::{compile, CompileResult};
pub use context::{AnalysisContext, BlockRef, BlockSlot, SymbolGenerator, SymbolInfo, SymbolTable};
pub use error::SemanticErrorKind;
pub use fir::{
    BasicBlock, FirExpr, FirParam, FirPrinter, FirStmt, FirType, Function, Module, Terminator,
};
