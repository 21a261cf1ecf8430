//! Errors produced while parsing or assembling osci source.
use thiserror::Error;

use super::source::Position;

/// What went wrong, independent of where.
#[derive(Clone, PartialEq, Eq, Debug, Error)]
pub enum ErrorKind {
    #[error("syntax error: {0}")]
    Syntax(String),

    #[error("unknown directive `.{0}`")]
    UnknownDirective(String),

    #[error("`.{directive}` takes exactly {expected} operand(s), got {found}")]
    Arity {
        directive: String,
        expected: usize,
        found: usize,
    },

    #[error("unresolved symbol `{0}`")]
    UnresolvedSymbol(String),

    #[error("unexpected end of input")]
    UnexpectedEndOfInput,

    #[error("invalid number literal `{0}`")]
    InvalidNumber(String),

    #[error("division by zero")]
    DivisionByZero,

    #[error("string literal \"{0}\" cannot be used as a single value")]
    StringOperand(String),

    #[error("malformed expression")]
    MalformedExpression,
}

/// An error together with the source position it was raised at.
#[derive(Clone, PartialEq, Eq, Debug, Error)]
#[error("{position}: {kind}")]
pub struct AsmError {
    pub kind: ErrorKind,
    pub position: Position,
}

impl AsmError {
    pub fn new(kind: ErrorKind, position: Position) -> Self {
        AsmError { kind, position }
    }

    pub fn syntax<S: Into<String>>(message: S, position: Position) -> Self {
        AsmError::new(ErrorKind::Syntax(message.into()), position)
    }
}
