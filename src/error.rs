//! Error types for the lexing, parsing and emulation stages.
//!
//! All of these are fail-fast: once raised they propagate to the caller
//! unchanged. Parser backtracking ("the marker letter was absent") is not an
//! error and is represented as `Ok(None)` by the trial productions instead.

use std::fmt;

use itertools::Itertools;

use crate::ast::ArgumentKind;
use crate::span::Span;
use crate::token::TokenKind;

/// An error produced while tokenizing source text.
#[derive(Debug, Clone, PartialEq)]
pub enum LexError {
    /// No lexical rule matched at the cursor.
    UnrecognisedCharacter {
        /// 1-based line of the offending character.
        line: usize,
        /// 1-based column of the offending character.
        column: usize,
        character: char,
    },
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LexError::UnrecognisedCharacter {
                line,
                column,
                character,
            } => write!(
                f,
                "unrecognised character {:?} at line {} column {}",
                character, line, column
            ),
        }
    }
}

impl std::error::Error for LexError {}

/// An error produced while parsing a token stream.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    /// A required token was missing after a production committed to its
    /// marker letter.
    UnexpectedToken {
        expected: Vec<TokenKind>,
        found: TokenKind,
        span: Span,
    },

    /// The token stream ran out where more input was required.
    UnexpectedEof { expected: Vec<TokenKind> },

    /// An integer-only slot received a literal with a sign or decimal
    /// point.
    InvalidInteger { span: Span },

    /// A numeric literal could not be interpreted as a number.
    InvalidNumber { span: Span },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ParseError::UnexpectedToken {
                expected,
                found,
                span,
            } => write!(
                f,
                "expected one of [{}] but found {} at {}",
                expected.iter().join(", "),
                found,
                span
            ),
            ParseError::UnexpectedEof { expected } => write!(
                f,
                "expected one of [{}] but reached the end of input",
                expected.iter().join(", ")
            ),
            ParseError::InvalidInteger { span } => {
                write!(f, "expected a positive integer at {}", span)
            }
            ParseError::InvalidNumber { span } => {
                write!(f, "invalid numeric literal at {}", span)
            }
        }
    }
}

impl std::error::Error for ParseError {}

/// An error produced while mapping instructions to operations.
#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeError {
    /// No operation is defined for this instruction number.
    UnknownInstruction { number: i64, span: Span },

    /// The instruction is missing a required argument.
    MissingArgument {
        number: i64,
        kind: ArgumentKind,
        span: Span,
    },
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RuntimeError::UnknownInstruction { number, span } => {
                write!(f, "no applicable operation for G{} at {}", number, span)
            }
            RuntimeError::MissingArgument { number, kind, span } => {
                write!(f, "G{} requires a {} argument at {}", number, kind, span)
            }
        }
    }
}

impl std::error::Error for RuntimeError {}

/// Any error the interpreter pipeline can produce.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    Lex(LexError),
    Parse(ParseError),
    Runtime(RuntimeError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Lex(err) => fmt::Display::fmt(err, f),
            Error::Parse(err) => fmt::Display::fmt(err, f),
            Error::Runtime(err) => fmt::Display::fmt(err, f),
        }
    }
}

impl std::error::Error for Error {}

impl From<LexError> for Error {
    fn from(err: LexError) -> Error {
        Error::Lex(err)
    }
}

impl From<ParseError> for Error {
    fn from(err: ParseError) -> Error {
        Error::Parse(err)
    }
}

impl From<RuntimeError> for Error {
    fn from(err: RuntimeError) -> Error {
        Error::Runtime(err)
    }
}
