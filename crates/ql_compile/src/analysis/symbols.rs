//! BuildSymbolTable: the global declaration table.
//!
//! Registers every top-level declaration before the typechecker runs, the
//! same pre-pass shape that makes forward references and recursion work:
//! any function can call any other function regardless of declaration
//! order, because all signatures are known up front.
//!
//! Functions contribute their full `Arrow` type and parameter list;
//! parameters get their declared types recorded immediately. Value
//! definitions contribute their annotation when present; unannotated
//! definition types are filled in by the typechecker in source order via
//! [`SymbolTable::assign_type_of`](crate::context::SymbolTable::assign_type_of).

use ql_language::ast::{ItemKind, StmtKind};

use crate::context::{AnalysisContext, SymbolInfo};

/// Populates the context's symbol table from the top level.
pub fn build_symbol_table(ctx: &mut AnalysisContext) {
    let top_level = std::mem::take(&mut ctx.top_level);

    for item in &top_level.sections {
        match &item.kind {
            ItemKind::Func(func) => {
                let params: Vec<_> = func
                    .params
                    .iter()
                    .map(|p| (p.name, p.annotation.clone()))
                    .collect();
                for param in &func.params {
                    ctx.symbols.assign_type_of(param.id, param.annotation.clone());
                }
                ctx.symbols.define(
                    func.name,
                    SymbolInfo {
                        decl: func.id,
                        ty: Some(func.arrow_type()),
                        params: Some(params),
                    },
                );
            }
            ItemKind::Def(stmt) => {
                if let StmtKind::Definition { name, annotation, .. } = &stmt.kind {
                    ctx.symbols.define(
                        *name,
                        SymbolInfo {
                            decl: stmt.id,
                            ty: annotation.clone(),
                            params: None,
                        },
                    );
                }
            }
            ItemKind::Call(_) | ItemKind::Incomplete => {}
        }
    }

    ctx.top_level = top_level;
}
