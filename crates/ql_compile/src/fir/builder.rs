//! Block-at-a-time construction of a FIR function body.
//!
//! The builder keeps at most one *live* block: a label, an optional block
//! parameter, and the statements accumulated so far. A terminator flushes
//! the live block into the finished list; starting a label opens the next
//! one. Between a flush and the next label the builder is in a *hole*:
//!
//! - statements arriving in a hole are unreachable post-return code and are
//!   discarded;
//! - terminators arriving in a hole are preserved on the most recently
//!   finished block as unreachable shadow terminators, so diagnostics can
//!   still see them.

use ql_base::Symbol;

use super::{BasicBlock, FirParam, FirStmt, Terminator};

pub struct FunctionBuilder {
    finished: Vec<BasicBlock>,
    live: Option<LiveBlock>,
}

struct LiveBlock {
    label: Symbol,
    parameter: Option<FirParam>,
    statements: Vec<FirStmt>,
}

impl FunctionBuilder {
    pub fn new() -> Self {
        FunctionBuilder {
            finished: Vec::new(),
            live: None,
        }
    }

    /// Opens a block. The previous block must have been terminated.
    pub fn start_block(&mut self, label: Symbol, parameter: Option<FirParam>) {
        debug_assert!(self.live.is_none(), "started a block over a live block");
        self.live = Some(LiveBlock {
            label,
            parameter,
            statements: Vec::new(),
        });
    }

    /// `true` while a block is live.
    pub fn is_open(&self) -> bool {
        self.live.is_some()
    }

    /// Appends a statement to the live block; drops it in a hole.
    pub fn push_stmt(&mut self, stmt: FirStmt) {
        if let Some(live) = &mut self.live {
            live.statements.push(stmt);
        }
    }

    /// Flushes the live block with `terminator`; in a hole, records it as an
    /// unreachable shadow terminator on the last finished block.
    pub fn terminate(&mut self, terminator: Terminator) {
        match self.live.take() {
            Some(live) => self.finished.push(BasicBlock {
                label: live.label,
                parameter: live.parameter,
                statements: live.statements,
                terminator,
                unreachable_terminators: Vec::new(),
            }),
            None => {
                if let Some(last) = self.finished.last_mut() {
                    last.unreachable_terminators.push(terminator);
                }
            }
        }
    }

    /// All finished blocks, in construction order.
    ///
    /// The caller must have terminated the last live block.
    pub fn finish(self) -> Vec<BasicBlock> {
        debug_assert!(self.live.is_none(), "finished with a live block");
        self.finished
    }
}

impl Default for FunctionBuilder {
    fn default() -> Self {
        Self::new()
    }
}
