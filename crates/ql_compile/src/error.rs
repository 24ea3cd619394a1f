//! Semantic error taxonomy.
//!
//! Binding and type errors share one enum so every pass reports through the
//! same channel. Unlike parser errors these have no recovery strategies: a
//! pass finishes its traversal, records what it found, and the driver stops
//! the pipeline afterwards if anything was recorded.

use ql_base::{Diagnostic, Interner, Span, Symbol};
use ql_language::ast::TypeName;

/// Everything the semantic passes can report.
#[derive(Debug, Clone, PartialEq)]
pub enum SemanticErrorKind {
    /// An identifier expression whose name is not in scope.
    IdentifierUnbound {
        name: Symbol,
        suggestion: Option<Symbol>,
    },
    /// A call to a name that is not in scope.
    FunctionNotFound {
        name: Symbol,
        suggestion: Option<Symbol>,
    },
    /// A declaration re-using a name already visible at its scope.
    Shadowing { name: Symbol },
    /// Two parameters of one function share a name.
    ParameterNamesNotUnique { name: Symbol },
    /// An operand with the wrong type for its operator.
    OperandTypeMismatch {
        operator: &'static str,
        expected: TypeName,
        found: TypeName,
    },
    /// A definition whose annotation disagrees with its initializer.
    DefinitionTypeMismatch {
        name: Symbol,
        annotated: TypeName,
        found: TypeName,
    },
    /// An assignment whose value disagrees with the target's type.
    AssignmentTypeMismatch {
        name: Symbol,
        expected: TypeName,
        found: TypeName,
    },
    /// A return value that disagrees with the declared return type.
    ReturnTypeMismatch { expected: TypeName, found: TypeName },
    /// A `return` with a value inside a `Void` function.
    VoidFunctionReturnsValue,
    /// A non-`Void` function with no syntactic `return`.
    MissingReturn { name: Symbol },
    /// An `if` condition that is not `Bool`.
    IfConditionNotBool { found: TypeName },
    /// A call target that is not a function.
    NotAFunction { name: Symbol },
    /// A call with the wrong number of arguments.
    ArityMismatch {
        name: Symbol,
        expected: usize,
        found: usize,
    },
    /// A call argument with the wrong type.
    ArgumentTypeMismatch {
        name: Symbol,
        position: usize,
        expected: TypeName,
        found: TypeName,
    },
    /// A value-position reference to a definition typed later in the
    /// program.
    DefinedLater { name: Symbol },
}

impl SemanticErrorKind {
    /// Stable diagnostic code, kebab-case.
    pub fn code(&self) -> &'static str {
        match self {
            SemanticErrorKind::IdentifierUnbound { .. } => "identifier-unbound",
            SemanticErrorKind::FunctionNotFound { .. } => "function-not-found",
            SemanticErrorKind::Shadowing { .. } => "shadowing",
            SemanticErrorKind::ParameterNamesNotUnique { .. } => "parameter-names-not-unique",
            SemanticErrorKind::OperandTypeMismatch { .. } => "operand-type-mismatch",
            SemanticErrorKind::DefinitionTypeMismatch { .. } => "definition-type-mismatch",
            SemanticErrorKind::AssignmentTypeMismatch { .. } => "assignment-type-mismatch",
            SemanticErrorKind::ReturnTypeMismatch { .. } => "return-type-mismatch",
            SemanticErrorKind::VoidFunctionReturnsValue => "void-function-returns-value",
            SemanticErrorKind::MissingReturn { .. } => "missing-return",
            SemanticErrorKind::IfConditionNotBool { .. } => "if-condition-not-bool",
            SemanticErrorKind::NotAFunction { .. } => "not-a-function",
            SemanticErrorKind::ArityMismatch { .. } => "arity-mismatch",
            SemanticErrorKind::ArgumentTypeMismatch { .. } => "argument-type-mismatch",
            SemanticErrorKind::DefinedLater { .. } => "defined-later",
        }
    }

    /// Human-readable message with names resolved.
    pub fn message(&self, interner: &Interner) -> String {
        match self {
            SemanticErrorKind::IdentifierUnbound { name, suggestion } => {
                let mut msg = format!("'{}' is not in scope", interner.resolve(*name));
                if let Some(suggestion) = suggestion {
                    msg.push_str(&format!(
                        "; did you mean '{}'?",
                        interner.resolve(*suggestion)
                    ));
                }
                msg
            }
            SemanticErrorKind::FunctionNotFound { name, suggestion } => {
                let mut msg = format!("no function '{}' in scope", interner.resolve(*name));
                if let Some(suggestion) = suggestion {
                    msg.push_str(&format!(
                        "; did you mean '{}'?",
                        interner.resolve(*suggestion)
                    ));
                }
                msg
            }
            SemanticErrorKind::Shadowing { name } => {
                format!("shadowing of '{}'", interner.resolve(*name))
            }
            SemanticErrorKind::ParameterNamesNotUnique { name } => {
                format!("parameter '{}' is declared twice", interner.resolve(*name))
            }
            SemanticErrorKind::OperandTypeMismatch {
                operator,
                expected,
                found,
            } => format!(
                "operator '{}' expects {} operands, found {}",
                operator, expected, found
            ),
            SemanticErrorKind::DefinitionTypeMismatch {
                name,
                annotated,
                found,
            } => format!(
                "'{}' is annotated {} but its value has type {}",
                interner.resolve(*name),
                annotated,
                found
            ),
            SemanticErrorKind::AssignmentTypeMismatch {
                name,
                expected,
                found,
            } => format!(
                "cannot assign {} to '{}' of type {}",
                found,
                interner.resolve(*name),
                expected
            ),
            SemanticErrorKind::ReturnTypeMismatch { expected, found } => {
                format!("return type mismatch: expected {}, found {}", expected, found)
            }
            SemanticErrorKind::VoidFunctionReturnsValue => {
                "a Void function must not return a value".to_string()
            }
            SemanticErrorKind::MissingReturn { name } => format!(
                "function '{}' must return a value on some path",
                interner.resolve(*name)
            ),
            SemanticErrorKind::IfConditionNotBool { found } => {
                format!("if condition must be Bool, found {}", found)
            }
            SemanticErrorKind::NotAFunction { name } => {
                format!("'{}' is not a function", interner.resolve(*name))
            }
            SemanticErrorKind::ArityMismatch {
                name,
                expected,
                found,
            } => format!(
                "'{}' takes {} argument(s), found {}",
                interner.resolve(*name),
                expected,
                found
            ),
            SemanticErrorKind::ArgumentTypeMismatch {
                name,
                position,
                expected,
                found,
            } => format!(
                "argument {} of '{}' expects {}, found {}",
                position + 1,
                interner.resolve(*name),
                expected,
                found
            ),
            SemanticErrorKind::DefinedLater { name } => format!(
                "'{}' is used before its definition is typed",
                interner.resolve(*name)
            ),
        }
    }

    /// Converts into the pipeline's shared diagnostic representation.
    pub fn to_diagnostic(&self, interner: &Interner, span: Span) -> Diagnostic {
        Diagnostic::new(self.code(), self.message(interner), span)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shadowing_message_names_the_identifier() {
        let mut interner = Interner::new();
        let x = interner.intern("x");
        let msg = SemanticErrorKind::Shadowing { name: x }.message(&interner);
        assert!(msg.contains("'x'"), "{msg}");
    }

    #[test]
    fn unbound_message_includes_suggestion() {
        let mut interner = Interner::new();
        let countr = interner.intern("countr");
        let counter = interner.intern("counter");
        let msg = SemanticErrorKind::IdentifierUnbound {
            name: countr,
            suggestion: Some(counter),
        }
        .message(&interner);
        assert!(msg.contains("did you mean 'counter'"), "{msg}");
    }

    #[test]
    fn operand_mismatch_shows_both_types() {
        let interner = Interner::new();
        let msg = SemanticErrorKind::OperandTypeMismatch {
            operator: "+",
            expected: TypeName::Int,
            found: TypeName::Bool,
        }
        .message(&interner);
        assert!(msg.contains("Int") && msg.contains("Bool"), "{msg}");
    }

    #[test]
    fn argument_positions_are_one_based_in_messages() {
        let mut interner = Interner::new();
        let f = interner.intern("f");
        let msg = SemanticErrorKind::ArgumentTypeMismatch {
            name: f,
            position: 0,
            expected: TypeName::Int,
            found: TypeName::Bool,
        }
        .message(&interner);
        assert!(msg.contains("argument 1"), "{msg}");
    }
}
