//! The mutable analysis context threaded through every pass.
//!
//! The driver builds one [`AnalysisContext`] per compilation and hands it by
//! mutable reference to each pass in sequence. Passes communicate only
//! through it: BuildScopes fills the scope arena and the node→scope map,
//! BuildSymbolTable and Typecheck fill the symbol table and the type cache,
//! FIR generation fills the label→block map. Nothing here is shared between
//! threads; the pipeline is single-threaded by design.

use ql_base::{Interner, Symbol};
use ql_language::ast::{NodeId, NodeIdGen, TopLevel, TypeName};
use rustc_hash::FxHashMap;

use crate::analysis::scopes::{ScopeArena, ScopeId};

/// Where a FIR label points: which function, and which block within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockRef {
    pub function: usize,
    pub block: BlockSlot,
}

/// A block position within a function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockSlot {
    /// Index into `Function::blocks`.
    Body(usize),
    /// The function's dedicated return block.
    Return,
}

/// What the symbol table records for a top-level declaration.
#[derive(Debug, Clone)]
pub struct SymbolInfo {
    /// The declaring node.
    pub decl: NodeId,
    /// Declared type, when known without running the typechecker
    /// (function signatures and annotated definitions).
    pub ty: Option<TypeName>,
    /// Parameter names and types, for functions.
    pub params: Option<Vec<(Symbol, TypeName)>>,
}

/// Global name → declaration table plus per-declaration types.
///
/// `by_name` holds the top-level surface (functions and global definitions);
/// `decl_types` holds the resolved type of *every* declaration, including
/// parameters and function-local definitions, keyed by the declaring node.
/// Identifier expressions resolve scope → declaring node → `decl_types`.
#[derive(Debug, Default)]
pub struct SymbolTable {
    by_name: FxHashMap<Symbol, SymbolInfo>,
    decl_types: FxHashMap<NodeId, TypeName>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a top-level declaration.
    pub fn define(&mut self, name: Symbol, info: SymbolInfo) {
        if let Some(ty) = &info.ty {
            self.decl_types.insert(info.decl, ty.clone());
        }
        self.by_name.insert(name, info);
    }

    /// Looks up a top-level declaration by name.
    pub fn lookup(&self, name: Symbol) -> Option<&SymbolInfo> {
        self.by_name.get(&name)
    }

    /// Records the resolved type of a declaration.
    pub fn assign_type_of(&mut self, decl: NodeId, ty: TypeName) {
        self.decl_types.insert(decl, ty);
    }

    /// The resolved type of a declaration, if recorded.
    pub fn type_of_decl(&self, decl: NodeId) -> Option<&TypeName> {
        self.decl_types.get(&decl)
    }

    /// Number of top-level entries.
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

/// Fresh-name generator for linearizer temporaries and FIR labels.
///
/// One counter serves the whole pipeline, so every generated name and label
/// is unique within a compilation. Names follow the `root_$N$` convention
/// (`tmp_$1$`, `bin_op_$7$`); label construction uses [`Self::next_index`]
/// directly (`f$if3$then`).
#[derive(Debug, Default)]
pub struct SymbolGenerator {
    counter: u32,
}

impl SymbolGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Interns and returns `root_$N$` for a fresh `N`.
    pub fn fresh(&mut self, interner: &mut Interner, root: &str) -> Symbol {
        let index = self.next_index();
        interner.intern(&format!("{}_${}$", root, index))
    }

    /// A fresh index for callers that build their own name shapes.
    pub fn next_index(&mut self) -> u32 {
        self.counter += 1;
        self.counter
    }
}

/// Everything the passes share.
#[derive(Debug)]
pub struct AnalysisContext {
    /// The normalized program. Passes that rewrite it temporarily take it
    /// out and put the rewritten tree back.
    pub top_level: TopLevel,
    /// Memoized expression types, keyed by expression node id.
    pub types: FxHashMap<NodeId, TypeName>,
    /// Global symbol table.
    pub symbols: SymbolTable,
    /// All scopes of the program.
    pub scopes: ScopeArena,
    /// Scope attached to each normalized node.
    pub scope_of: FxHashMap<NodeId, ScopeId>,
    /// FIR label → block, populated during FIR generation.
    pub blocks: FxHashMap<Symbol, BlockRef>,
    /// Fresh-name generator.
    pub gensym: SymbolGenerator,
    /// Node id issuance, continued from parsing and desugaring.
    pub ids: NodeIdGen,
}

impl AnalysisContext {
    pub fn new(top_level: TopLevel, ids: NodeIdGen) -> Self {
        AnalysisContext {
            top_level,
            types: FxHashMap::default(),
            symbols: SymbolTable::new(),
            scopes: ScopeArena::new(),
            scope_of: FxHashMap::default(),
            blocks: FxHashMap::default(),
            gensym: SymbolGenerator::new(),
            ids,
        }
    }

    /// The memoized type of an expression node.
    pub fn type_of(&self, id: NodeId) -> Option<&TypeName> {
        self.types.get(&id)
    }

    /// Memoizes the type of an expression node.
    pub fn set_type(&mut self, id: NodeId, ty: TypeName) {
        self.types.insert(id, ty);
    }

    /// The scope attached to a node by BuildScopes.
    pub fn scope_of(&self, id: NodeId) -> Option<ScopeId> {
        self.scope_of.get(&id).copied()
    }
}
