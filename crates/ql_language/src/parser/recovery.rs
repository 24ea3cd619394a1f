//! Pluggable error recovery for the parser.
//!
//! When an expectation fails, the parser records the diagnostic and asks a
//! [`RecoveryEngine`] what to do next. The engine maps the error kind to a
//! [`RecoveryAction`]:
//!
//! - `DropUntil(set)` — consume tokens until one in `set` is next, consuming
//!   that token too; the enclosing construct becomes an incomplete
//!   placeholder.
//! - `Add(token)` — behave as if `token` were present, without consuming.
//! - `Ignore` — continue from the current position (used for missing
//!   semicolons and stray non-operators).
//! - `Unrecoverable` — abort the whole parse; the partial tree is still
//!   returned.
//! - `Override(inner)` — answer with the strategy for a different error
//!   kind, so wrapper engines can reclassify without re-implementing the
//!   table.
//!
//! [`DefaultRecovery`] implements the stock policy table.

use crate::error::{
    ArgumentIssue, BlockIssue, IdentifierPosition, ParenPosition, ParserErrorKind, TopLevelIssue,
    TypePosition,
};
use crate::token::{Sym, TokenKind};

/// Synchronization set ending at `;`.
pub const UNTIL_SEMICOLON: &[Sym] = &[Sym::Semicolon];
/// Synchronization set ending at `}`.
pub const UNTIL_RBRACE: &[Sym] = &[Sym::RBrace];

/// What the parser should do after a recorded error.
#[derive(Debug, Clone)]
pub enum RecoveryAction {
    /// Consume tokens until one of `set` is next, consuming it.
    DropUntil(&'static [Sym]),
    /// Proceed as if this token had been present.
    Add(TokenKind),
    /// Continue from the current position.
    Ignore,
    /// Abort the whole parse.
    Unrecoverable,
    /// Use the strategy of another error kind.
    Override(Box<ParserErrorKind>),
}

/// Strategy provider consulted on every recorded parser error.
pub trait RecoveryEngine {
    fn strategy(&self, error: &ParserErrorKind) -> RecoveryAction;
}

/// The stock recovery policy.
#[derive(Debug, Default)]
pub struct DefaultRecovery;

impl RecoveryEngine for DefaultRecovery {
    fn strategy(&self, error: &ParserErrorKind) -> RecoveryAction {
        use ParserErrorKind::*;
        use RecoveryAction::*;

        match error {
            ExpectedTypeIdentifier(TypePosition::Definition) => DropUntil(UNTIL_SEMICOLON),
            ExpectedTypeIdentifier(TypePosition::FunctionReturn)
            | ExpectedTypeIdentifier(TypePosition::Parameter) => DropUntil(UNTIL_RBRACE),
            ExpectedParameterType => DropUntil(UNTIL_RBRACE),

            ExpectedIdentifier(IdentifierPosition::FunctionName)
            | ExpectedIdentifier(IdentifierPosition::FunctionParameter) => {
                DropUntil(UNTIL_RBRACE)
            }
            ExpectedIdentifier(IdentifierPosition::ValueDefinition)
            | ExpectedIdentifier(IdentifierPosition::FunctionCall)
            | ExpectedIdentifier(IdentifierPosition::Assignment) => DropUntil(UNTIL_SEMICOLON),

            ExpectedFunctionApplication => DropUntil(UNTIL_SEMICOLON),
            ExpectedFunctionArgument(ArgumentIssue::Eof) => Unrecoverable,
            ExpectedFunctionArgument(ArgumentIssue::Other) => DropUntil(UNTIL_SEMICOLON),

            ExpectedLeftParen(ParenPosition::FunctionDefinition)
            | ExpectedLeftParen(ParenPosition::If)
            | ExpectedRightParen(ParenPosition::FunctionDefinition)
            | ExpectedRightParen(ParenPosition::If)
            | ExpectedLeftBrace(_)
            | ExpectedRightBrace(_) => DropUntil(UNTIL_RBRACE),
            ExpectedLeftParen(ParenPosition::FunctionCall)
            | ExpectedRightParen(ParenPosition::FunctionCall) => DropUntil(UNTIL_SEMICOLON),

            ExpectedArrowInFunctionDefinition => DropUntil(UNTIL_RBRACE),
            ExpectedEqualInAssignment => DropUntil(UNTIL_SEMICOLON),

            ExpectedSemicolonToEndStatement => Ignore,
            ExpectedSemicolonToEndFunctionCall => Ignore,
            ExpectedOperator => Ignore,
            ExpectedExpression => Unrecoverable,

            ExpectedTopLevelStatement(TopLevelIssue::Eof) => Unrecoverable,
            ExpectedTopLevelStatement(TopLevelIssue::NestedKeyword) => DropUntil(UNTIL_RBRACE),
            ExpectedTopLevelStatement(TopLevelIssue::Other) => DropUntil(UNTIL_SEMICOLON),

            ExpectedBlockBodyPart(BlockIssue::Eof) => Unrecoverable,
            ExpectedBlockBodyPart(BlockIssue::Other) => DropUntil(UNTIL_RBRACE),

            ExpectedValidAttribute => DropUntil(UNTIL_RBRACE),
            InternalParserError(_) => Unrecoverable,
        }
    }
}
