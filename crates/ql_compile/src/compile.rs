//! The compilation pipeline driver.
//!
//! Runs the stages in their fixed order, threading one [`AnalysisContext`]
//! and one diagnostics sink through all of them:
//!
//! ```text
//! QL Source
//!       │
//!       ▼
//! ┌───────────────────┐
//! │  1. Lexer         │ characters → tokens
//! └─────────┬─────────┘
//!           ▼
//! ┌───────────────────┐
//! │  2. Parser        │ tokens → raw AST (recovery, placeholders)
//! └─────────┬─────────┘
//!           ▼
//! ┌───────────────────┐
//! │  3. Desugar       │ raw AST → normalized AST
//! └─────────┬─────────┘
//!           ▼
//! ┌───────────────────┐
//! │  4. Analysis      │ scopes → bindings → symbols → types → linearize
//! └─────────┬─────────┘
//!           ▼
//! ┌───────────────────┐
//! │  5. FIR           │ CFG generation, short-circuit + arithmetic lowering
//! └─────────┬─────────┘
//!           ▼
//!        Module
//! ```
//!
//! Any stage that records a diagnostic fails the compilation: the driver
//! checks the sink after each stage and skips the rest, while still
//! returning every artifact built so far — tooling inspects partial trees
//! through the `Incomplete` placeholders and per-node ids.

use ql_base::{Diagnostics, Interner};
use ql_language::ast::{NodeIdGen, TopLevel};
use ql_language::{ast_arenas, desugar, Lexer, Parser};

use crate::analysis::{
    build_scopes, build_symbol_table, check_bindings, linearize, typecheck,
};
use crate::context::AnalysisContext;
use crate::fir::arith::linearize_arithmetic;
use crate::fir::gen::generate_fir;
use crate::fir::short_circuit::{lower_boolean_values, lower_condition_short_circuits};
use crate::fir::Module;

/// Everything a compilation produces, partial or complete.
#[derive(Debug)]
pub struct CompileResult {
    /// Side tables and the normalized tree (possibly empty on early
    /// failure).
    pub context: AnalysisContext,
    /// The lowered module; `None` when any stage failed.
    pub module: Option<Module>,
    /// Every recorded diagnostic, in order.
    pub diagnostics: Diagnostics,
    /// The interner all names and labels resolve through.
    pub interner: Interner,
}

impl CompileResult {
    /// `true` when the pipeline ran to completion without diagnostics.
    pub fn succeeded(&self) -> bool {
        self.module.is_some() && !self.diagnostics.has_errors()
    }

    /// The editor display tree of the normalized program. Available even
    /// for failed compilations, placeholders included.
    pub fn display_tree(&self) -> ql_language::DisplayNode {
        ql_language::view::display_top_level(&self.context.top_level, &self.interner)
    }
}

/// Compiles QL source through the whole pipeline.
pub fn compile(source: &str) -> CompileResult {
    let mut interner = Interner::new();
    let mut diagnostics = Diagnostics::new();
    let mut ids = NodeIdGen::new();

    log::debug!("lexing {} bytes", source.len());
    let tokens = Lexer::new(source, &mut interner).tokenize(&mut diagnostics);
    if diagnostics.has_errors() {
        return CompileResult {
            context: AnalysisContext::new(TopLevel::default(), ids),
            module: None,
            diagnostics,
            interner,
        };
    }

    log::debug!("parsing {} tokens", tokens.len());
    let top_level = {
        ast_arenas!(ctx);
        let raw = Parser::new(tokens, &mut interner, &mut ids, &mut diagnostics, ctx).parse();
        desugar::desugar(&raw, &mut ids)
    };

    let mut context = AnalysisContext::new(top_level, ids);
    if diagnostics.has_errors() {
        return halt(context, diagnostics, interner);
    }

    log::debug!("building scopes");
    build_scopes(&mut context);

    log::debug!("checking bindings");
    check_bindings(&context, &interner, &mut diagnostics);
    if diagnostics.has_errors() {
        return halt(context, diagnostics, interner);
    }

    log::debug!("building symbol table");
    build_symbol_table(&mut context);

    log::debug!("typechecking");
    typecheck(&mut context, &interner, &mut diagnostics);
    if diagnostics.has_errors() {
        return halt(context, diagnostics, interner);
    }

    log::debug!("linearizing expressions");
    linearize(&mut context, &mut interner);

    log::debug!("generating fir");
    let mut module = generate_fir(&mut context, &mut interner);

    log::debug!("lowering short circuits");
    lower_condition_short_circuits(&mut module, &mut context, &mut interner);
    lower_boolean_values(&mut module, &mut context, &mut interner);

    log::debug!("linearizing fir arithmetic");
    linearize_arithmetic(&mut module, &mut context, &mut interner);

    CompileResult {
        context,
        module: Some(module),
        diagnostics,
        interner,
    }
}

fn halt(
    context: AnalysisContext,
    diagnostics: Diagnostics,
    interner: Interner,
) -> CompileResult {
    log::debug!(
        "stopping after {} diagnostic(s)",
        diagnostics.len()
    );
    CompileResult {
        context,
        module: None,
        diagnostics,
        interner,
    }
}
