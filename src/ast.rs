//! The abstract syntax tree for parsed gcode programs.

use std::fmt;

use crate::span::Span;

/// The various kinds of arguments an instruction can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArgumentKind {
    X,
    Y,
    Z,
    FeedRate,
    A,
    B,
    C,
    I,
    J,
    K,
    H,
    P,
    S,
}

impl fmt::Display for ArgumentKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ArgumentKind::FeedRate => write!(f, "F"),
            other => write!(f, "{:?}", other),
        }
    }
}

/// A single argument, a letter plus its numeric value (e.g. `X-23.4`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Argument {
    pub kind: ArgumentKind,
    pub value: f64,
    pub span: Span,
}

/// A general instruction (`G1`), with any arguments that followed it.
#[derive(Debug, Clone, PartialEq)]
pub struct Gcode {
    pub number: i64,
    pub arguments: Vec<Argument>,
    pub span: Span,
    pub line: Option<i64>,
}

impl Gcode {
    /// The value of the first argument of the given kind, if present.
    pub fn value_for(&self, kind: ArgumentKind) -> Option<f64> {
        self.arguments
            .iter()
            .find(|argument| argument.kind == kind)
            .map(|argument| argument.value)
    }
}

/// A miscellaneous instruction (`M5`).
#[derive(Debug, Clone, PartialEq)]
pub struct Mcode {
    pub number: i64,
    pub span: Span,
    pub line: Option<i64>,
}

/// A tool-change instruction (`T2`).
#[derive(Debug, Clone, PartialEq)]
pub struct Tcode {
    pub number: i64,
    pub span: Span,
    pub line: Option<i64>,
}

/// A program-number instruction (`O4711`).
#[derive(Debug, Clone, PartialEq)]
pub struct Ocode {
    pub program_number: i64,
    pub span: Span,
    pub line: Option<i64>,
}

/// An `N`-word label. Transient parse artifact, attached to the instruction
/// that follows it; never appears in the parsed program itself.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineNumber {
    pub number: i64,
    pub span: Span,
}

/// The closed set of instructions a gcode program consists of, in source
/// order.
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    Gcode(Gcode),
    Mcode(Mcode),
    Tcode(Tcode),
    Ocode(Ocode),
}

impl Instruction {
    /// The instruction's location within its source text.
    pub fn span(&self) -> Span {
        match self {
            Instruction::Gcode(code) => code.span,
            Instruction::Mcode(code) => code.span,
            Instruction::Tcode(code) => code.span,
            Instruction::Ocode(code) => code.span,
        }
    }

    /// The instruction's `N`-word line number, if one was supplied.
    pub fn line(&self) -> Option<i64> {
        match self {
            Instruction::Gcode(code) => code.line,
            Instruction::Mcode(code) => code.line,
            Instruction::Tcode(code) => code.line,
            Instruction::Ocode(code) => code.line,
        }
    }
}
