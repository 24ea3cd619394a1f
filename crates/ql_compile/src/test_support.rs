//! Shared helpers for the unit suites: run the pipeline up to a chosen
//! stage and hand back the artifacts.

use ql_base::{Diagnostics, Interner, Symbol};
use ql_language::ast::NodeIdGen;
use ql_language::{ast_arenas, desugar, Lexer, Parser};

use crate::analysis::{
    build_scopes, build_symbol_table, check_bindings, linearize, typecheck,
};
use crate::context::{AnalysisContext, BlockSlot};
use crate::fir::arith::linearize_arithmetic;
use crate::fir::gen::generate_fir;
use crate::fir::short_circuit::{lower_boolean_values, lower_condition_short_circuits};
use crate::fir::Module;

/// Lex, parse, and desugar; diagnostics are returned, not asserted.
pub fn frontend(source: &str) -> (AnalysisContext, Interner, Diagnostics) {
    let mut interner = Interner::new();
    let mut diagnostics = Diagnostics::new();
    let mut ids = NodeIdGen::new();

    let tokens = Lexer::new(source, &mut interner).tokenize(&mut diagnostics);
    let top_level = {
        ast_arenas!(ctx);
        let raw = Parser::new(tokens, &mut interner, &mut ids, &mut diagnostics, ctx).parse();
        desugar::desugar(&raw, &mut ids)
    };

    (AnalysisContext::new(top_level, ids), interner, diagnostics)
}

/// Through BuildScopes; asserts a clean parse.
pub fn analyze_scopes(source: &str) -> (AnalysisContext, Interner) {
    let (mut ctx, interner, diagnostics) = frontend(source);
    assert!(!diagnostics.has_errors(), "parse failed: {:?}", diagnostics);
    build_scopes(&mut ctx);
    (ctx, interner)
}

/// Through BindingCheck; diagnostics (parse + binding) are returned.
pub fn analyze_bindings(source: &str) -> (AnalysisContext, Interner, Diagnostics) {
    let (mut ctx, interner, mut diagnostics) = frontend(source);
    build_scopes(&mut ctx);
    check_bindings(&ctx, &interner, &mut diagnostics);
    (ctx, interner, diagnostics)
}

/// Through BuildSymbolTable; asserts clean parse and bindings.
pub fn analyze_symbols(source: &str) -> (AnalysisContext, Interner) {
    let (mut ctx, interner, mut diagnostics) = frontend(source);
    assert!(!diagnostics.has_errors(), "parse failed: {:?}", diagnostics);
    build_scopes(&mut ctx);
    check_bindings(&ctx, &interner, &mut diagnostics);
    assert!(!diagnostics.has_errors(), "binding failed: {:?}", diagnostics);
    build_symbol_table(&mut ctx);
    (ctx, interner)
}

/// Through Typecheck; asserts clean parse and bindings, returns the
/// typechecker's diagnostics.
pub fn analyze_typed(source: &str) -> (AnalysisContext, Interner, Diagnostics) {
    let (mut ctx, interner, mut diagnostics) = frontend(source);
    assert!(!diagnostics.has_errors(), "parse failed: {:?}", diagnostics);
    build_scopes(&mut ctx);
    check_bindings(&ctx, &interner, &mut diagnostics);
    assert!(!diagnostics.has_errors(), "binding failed: {:?}", diagnostics);
    build_symbol_table(&mut ctx);
    typecheck(&mut ctx, &interner, &mut diagnostics);
    (ctx, interner, diagnostics)
}

/// Through AST linearization; asserts everything before it was clean.
pub fn analyze_linearized(source: &str) -> (AnalysisContext, Interner, Diagnostics) {
    let (mut ctx, mut interner, diagnostics) = analyze_typed(source);
    assert!(!diagnostics.has_errors(), "typecheck failed: {:?}", diagnostics);
    linearize(&mut ctx, &mut interner);
    (ctx, interner, diagnostics)
}

/// Through FIR generation, before the lowering passes.
pub fn build_module(source: &str) -> (Module, AnalysisContext, Interner) {
    let (mut ctx, mut interner, _) = analyze_linearized(source);
    let module = generate_fir(&mut ctx, &mut interner);
    (module, ctx, interner)
}

/// The full pipeline: FIR with short-circuit and arithmetic lowering.
pub fn lowered_module(source: &str) -> (Module, AnalysisContext, Interner) {
    let (mut module, mut ctx, mut interner) = build_module(source);
    lower_condition_short_circuits(&mut module, &mut ctx, &mut interner);
    lower_boolean_values(&mut module, &mut ctx, &mut interner);
    linearize_arithmetic(&mut module, &mut ctx, &mut interner);
    (module, ctx, interner)
}

/// Looks up a label in the context's block map.
pub fn resolve_label(ctx: &AnalysisContext, label: Symbol) -> Option<(usize, BlockSlot)> {
    ctx.blocks.get(&label).map(|r| (r.function, r.block))
}
