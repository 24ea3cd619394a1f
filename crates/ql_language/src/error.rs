//! Parser error taxonomy.
//!
//! Every way the parser can be disappointed is a [`ParserErrorKind`], and
//! most kinds carry the syntactic position they arose in (a missing
//! identifier in a parameter list recovers differently from one in a value
//! definition). The recovery engine keys its strategy off the full kind, so
//! the position enums here are the vocabulary of the recovery policy table.
//!
//! Parser errors are recorded as [`ql_base::Diagnostic`]s; they never unwind
//! through the parser. See [`crate::parser::recovery`] for the strategies.

use ql_base::{Diagnostic, Span};

/// Where a type name was expected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypePosition {
    /// Annotation on a `let`/`var` definition.
    Definition,
    /// Function return type, after `->`.
    FunctionReturn,
    /// Parameter annotation, after `:`.
    Parameter,
}

/// Where an identifier was expected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierPosition {
    FunctionName,
    FunctionParameter,
    ValueDefinition,
    FunctionCall,
    Assignment,
}

/// Which construct's parentheses are involved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParenPosition {
    FunctionDefinition,
    If,
    FunctionCall,
}

/// Which construct's braces are involved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BracePosition {
    FunctionBody,
    IfBody,
    ElseBody,
}

/// What went wrong at a function-call argument position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgumentIssue {
    /// Input ended inside the argument list.
    Eof,
    /// A symbol or keyword that cannot start an expression.
    Other,
}

/// What was found where a top-level statement should start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopLevelIssue {
    Eof,
    /// A keyword that belongs inside a function (`if`, `else`) or a stray
    /// `func` mid-recovery.
    NestedKeyword,
    Other,
}

/// What was found where a block body part should start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockIssue {
    Eof,
    Other,
}

/// Everything the parser can report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParserErrorKind {
    ExpectedTypeIdentifier(TypePosition),
    ExpectedParameterType,
    ExpectedIdentifier(IdentifierPosition),
    ExpectedLeftParen(ParenPosition),
    ExpectedRightParen(ParenPosition),
    ExpectedLeftBrace(BracePosition),
    ExpectedRightBrace(BracePosition),
    ExpectedArrowInFunctionDefinition,
    ExpectedEqualInAssignment,
    ExpectedSemicolonToEndStatement,
    ExpectedSemicolonToEndFunctionCall,
    ExpectedOperator,
    ExpectedExpression,
    ExpectedFunctionApplication,
    ExpectedFunctionArgument(ArgumentIssue),
    ExpectedTopLevelStatement(TopLevelIssue),
    ExpectedBlockBodyPart(BlockIssue),
    ExpectedValidAttribute,
    /// A state the grammar cannot reach; signals a parser bug.
    InternalParserError(&'static str),
}

impl ParserErrorKind {
    /// Stable diagnostic code, kebab-case.
    pub fn code(&self) -> &'static str {
        match self {
            ParserErrorKind::ExpectedTypeIdentifier(_) => "expected-type-identifier",
            ParserErrorKind::ExpectedParameterType => "expected-parameter-type",
            ParserErrorKind::ExpectedIdentifier(_) => "expected-identifier",
            ParserErrorKind::ExpectedLeftParen(_) => "expected-left-paren",
            ParserErrorKind::ExpectedRightParen(_) => "expected-right-paren",
            ParserErrorKind::ExpectedLeftBrace(_) => "expected-left-brace",
            ParserErrorKind::ExpectedRightBrace(_) => "expected-right-brace",
            ParserErrorKind::ExpectedArrowInFunctionDefinition => "expected-arrow",
            ParserErrorKind::ExpectedEqualInAssignment => "expected-equal",
            ParserErrorKind::ExpectedSemicolonToEndStatement => "expected-semicolon",
            ParserErrorKind::ExpectedSemicolonToEndFunctionCall => {
                "expected-semicolon-after-call"
            }
            ParserErrorKind::ExpectedOperator => "expected-operator",
            ParserErrorKind::ExpectedExpression => "expected-expression",
            ParserErrorKind::ExpectedFunctionApplication => "expected-function-application",
            ParserErrorKind::ExpectedFunctionArgument(_) => "expected-function-argument",
            ParserErrorKind::ExpectedTopLevelStatement(_) => "expected-top-level-statement",
            ParserErrorKind::ExpectedBlockBodyPart(_) => "expected-block-body-part",
            ParserErrorKind::ExpectedValidAttribute => "expected-valid-attribute",
            ParserErrorKind::InternalParserError(_) => "internal-parser-error",
        }
    }

    /// Human-readable description; the diagnostic span points at the
    /// offending token.
    pub fn message(&self) -> String {
        match self {
            ParserErrorKind::ExpectedTypeIdentifier(pos) => {
                let place = match pos {
                    TypePosition::Definition => "in this definition's annotation",
                    TypePosition::FunctionReturn => "as the function return type",
                    TypePosition::Parameter => "as the parameter type",
                };
                format!("expected a type name (Int, Bool, or String) {}", place)
            }
            ParserErrorKind::ExpectedParameterType => {
                "expected ':' and a type after the parameter name".to_string()
            }
            ParserErrorKind::ExpectedIdentifier(pos) => {
                let place = match pos {
                    IdentifierPosition::FunctionName => "as the function name",
                    IdentifierPosition::FunctionParameter => "as a parameter name",
                    IdentifierPosition::ValueDefinition => "as the defined name",
                    IdentifierPosition::FunctionCall => "as the called function",
                    IdentifierPosition::Assignment => "as the assignment target",
                };
                format!("expected an identifier {}", place)
            }
            ParserErrorKind::ExpectedLeftParen(pos) => {
                format!("expected '(' {}", paren_place(*pos))
            }
            ParserErrorKind::ExpectedRightParen(pos) => {
                format!("expected ')' {}", paren_place(*pos))
            }
            ParserErrorKind::ExpectedLeftBrace(pos) => {
                format!("expected '{{' {}", brace_place(*pos))
            }
            ParserErrorKind::ExpectedRightBrace(pos) => {
                format!("expected '}}' {}", brace_place(*pos))
            }
            ParserErrorKind::ExpectedArrowInFunctionDefinition => {
                "expected '->' before the function return type".to_string()
            }
            ParserErrorKind::ExpectedEqualInAssignment => {
                "expected '=' before the assigned value".to_string()
            }
            ParserErrorKind::ExpectedSemicolonToEndStatement => {
                "expected ';' to end the statement".to_string()
            }
            ParserErrorKind::ExpectedSemicolonToEndFunctionCall => {
                "expected ';' to end the function call".to_string()
            }
            ParserErrorKind::ExpectedOperator => {
                "expected an operator to continue the expression".to_string()
            }
            ParserErrorKind::ExpectedExpression => {
                "expected an expression (identifier, number, or boolean)".to_string()
            }
            ParserErrorKind::ExpectedFunctionApplication => {
                "expected a function call: an identifier here must be followed by '('"
                    .to_string()
            }
            ParserErrorKind::ExpectedFunctionArgument(issue) => match issue {
                ArgumentIssue::Eof => {
                    "input ended inside a function argument list".to_string()
                }
                ArgumentIssue::Other => "expected a function argument".to_string(),
            },
            ParserErrorKind::ExpectedTopLevelStatement(issue) => match issue {
                TopLevelIssue::Eof => {
                    "expected a top-level statement, found end of input".to_string()
                }
                _ => "expected a function definition, value definition, or call".to_string(),
            },
            ParserErrorKind::ExpectedBlockBodyPart(issue) => match issue {
                BlockIssue::Eof => "input ended inside a block".to_string(),
                BlockIssue::Other => {
                    "expected a definition, call, return, or if statement".to_string()
                }
            },
            ParserErrorKind::ExpectedValidAttribute => {
                "expected a valid attribute: '@main' or '@never'".to_string()
            }
            ParserErrorKind::InternalParserError(note) => {
                format!("internal parser error: {}", note)
            }
        }
    }
}

fn paren_place(pos: ParenPosition) -> &'static str {
    match pos {
        ParenPosition::FunctionDefinition => "in the function signature",
        ParenPosition::If => "around the if condition",
        ParenPosition::FunctionCall => "in the function call",
    }
}

fn brace_place(pos: BracePosition) -> &'static str {
    match pos {
        BracePosition::FunctionBody => "around the function body",
        BracePosition::IfBody => "around the if body",
        BracePosition::ElseBody => "around the else body",
    }
}

/// A parser error bound to its source location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserError {
    pub kind: ParserErrorKind,
    pub span: Span,
}

impl ParserError {
    pub fn new(kind: ParserErrorKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Converts into the pipeline's shared diagnostic representation.
    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::new(self.kind.code(), self.kind.message(), self.span)
    }
}

impl std::fmt::Display for ParserError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} at {}..{}",
            self.kind.message(),
            self.span.start,
            self.span.end
        )
    }
}

impl std::error::Error for ParserError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_kebab_case() {
        let kinds = [
            ParserErrorKind::ExpectedTypeIdentifier(TypePosition::Definition),
            ParserErrorKind::ExpectedParameterType,
            ParserErrorKind::ExpectedIdentifier(IdentifierPosition::FunctionName),
            ParserErrorKind::ExpectedArrowInFunctionDefinition,
            ParserErrorKind::ExpectedOperator,
            ParserErrorKind::ExpectedExpression,
        ];
        for kind in kinds {
            let code = kind.code();
            assert!(!code.is_empty());
            assert!(
                code.chars().all(|c| c.is_ascii_lowercase() || c == '-'),
                "bad code {code}"
            );
        }
    }

    #[test]
    fn message_names_the_position() {
        let msg =
            ParserErrorKind::ExpectedIdentifier(IdentifierPosition::FunctionParameter).message();
        assert!(msg.contains("parameter"), "{msg}");
    }

    #[test]
    fn to_diagnostic_carries_span() {
        let err = ParserError::new(ParserErrorKind::ExpectedExpression, Span::new(3, 7));
        let diag = err.to_diagnostic();
        assert_eq!(diag.span, Span::new(3, 7));
        assert_eq!(diag.code, "expected-expression");
    }
}
