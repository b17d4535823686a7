//! Tokens and the kinds of words that make up a gcode program.

use std::fmt;

use crate::ast::ArgumentKind;
use crate::span::Span;

/// Enumeration of all token kinds of the gcode vocabulary.
///
/// Every kind except [Number](TokenKind::Number) is a single
/// (case-insensitive) letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    G,
    M,
    N,
    T,
    O,
    X,
    Y,
    Z,
    F,
    I,
    J,
    K,
    A,
    B,
    C,
    H,
    P,
    S,
    Number,
}

impl TokenKind {
    /// Does a token of this kind carry its raw matched text?
    pub fn has_value(self) -> bool {
        self == TokenKind::Number
    }

    /// The [ArgumentKind] this token introduces, if it can begin an
    /// argument.
    pub fn as_argument_kind(self) -> Option<ArgumentKind> {
        let kind = match self {
            TokenKind::X => ArgumentKind::X,
            TokenKind::Y => ArgumentKind::Y,
            TokenKind::Z => ArgumentKind::Z,
            TokenKind::F => ArgumentKind::FeedRate,
            TokenKind::A => ArgumentKind::A,
            TokenKind::B => ArgumentKind::B,
            TokenKind::C => ArgumentKind::C,
            TokenKind::I => ArgumentKind::I,
            TokenKind::J => ArgumentKind::J,
            TokenKind::K => ArgumentKind::K,
            TokenKind::H => ArgumentKind::H,
            TokenKind::P => ArgumentKind::P,
            TokenKind::S => ArgumentKind::S,
            _ => return None,
        };

        Some(kind)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TokenKind::Number => write!(f, "number"),
            other => write!(f, "{:?}", other),
        }
    }
}

/// A single token, borrowing its raw text from the source it was lexed
/// from. `value` is present exactly for [Number](TokenKind::Number) tokens.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub span: Span,
    pub value: Option<&'a str>,
}

impl<'a> Token<'a> {
    pub fn new(kind: TokenKind, span: Span) -> Token<'a> {
        Token {
            kind,
            span,
            value: None,
        }
    }

    pub fn with_value(kind: TokenKind, span: Span, value: &'a str) -> Token<'a> {
        Token {
            kind,
            span,
            value: Some(value),
        }
    }
}
