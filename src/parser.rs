//! A backtracking recursive-descent parser over the lexer's token stream.
//!
//! Each instruction production first records the cursor, then tries to
//! consume its marker letter. If the marker is absent the cursor is rewound
//! and `Ok(None)` is returned so the next production can have a go. Once a
//! production has its marker, everything after it is mandatory and missing
//! pieces raise a [ParseError].

use itertools::Itertools;

use crate::ast::{Argument, Gcode, Instruction, LineNumber, Mcode, Ocode, Tcode};
use crate::error::{LexError, ParseError};
use crate::lexer::Lexer;
use crate::span::Span;
use crate::token::{Token, TokenKind};

/// The token kinds that can begin an argument.
const ARGUMENT_KINDS: &[TokenKind] = &[
    TokenKind::F,
    TokenKind::P,
    TokenKind::S,
    TokenKind::H,
    TokenKind::X,
    TokenKind::Y,
    TokenKind::Z,
    TokenKind::I,
    TokenKind::J,
    TokenKind::K,
    TokenKind::A,
    TokenKind::B,
    TokenKind::C,
];

/// Parses a token stream into a list of [Instruction]s.
pub struct Parser<'a> {
    tokens: Vec<Token<'a>>,
    index: usize,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: Vec<Token<'a>>) -> Parser<'a> {
        Parser { tokens, index: 0 }
    }

    /// Lexes `src` and constructs a parser over its tokens. Comments are
    /// discarded.
    pub fn from_source(src: &'a str) -> Result<Parser<'a>, LexError> {
        let tokens = Lexer::new(src).collect::<Result<Vec<_>, _>>()?;
        Ok(Parser::new(tokens))
    }

    fn peek(&self) -> Option<Token<'a>> {
        self.tokens.get(self.index).copied()
    }

    /// Consumes and returns the next token if its kind is one of `kinds`.
    fn chomp(&mut self, kinds: &[TokenKind]) -> Option<Token<'a>> {
        let token = self.peek()?;

        if kinds.contains(&token.kind) {
            self.index += 1;
            Some(token)
        } else {
            None
        }
    }

    fn parse_error(&self, expected: &[TokenKind]) -> ParseError {
        match self.peek() {
            Some(token) => ParseError::UnexpectedToken {
                expected: expected.to_vec(),
                found: token.kind,
                span: token.span,
            },
            None => ParseError::UnexpectedEof {
                expected: expected.to_vec(),
            },
        }
    }

    /// Is the remaining input semantically empty?
    ///
    /// Trailing `N`-word labels with nothing after them are ignored, so
    /// input consisting only of alternating `N` and number tokens counts as
    /// finished.
    pub fn finished(&self) -> bool {
        let rest = &self.tokens[self.index..];

        if rest.is_empty() {
            return true;
        }

        if rest.len() % 2 != 0 {
            return false;
        }

        rest.iter().tuples().all(|(label, number)| {
            label.kind == TokenKind::N && number.kind == TokenKind::Number
        })
    }

    /// Parses the entire token stream.
    pub fn parse(&mut self) -> Result<Vec<Instruction>, ParseError> {
        let mut instructions = Vec::new();

        while !self.finished() {
            instructions.push(self.next_item()?);
        }

        Ok(instructions)
    }

    fn next_item(&mut self) -> Result<Instruction, ParseError> {
        if let Some(code) = self.parse_gcode()? {
            return Ok(Instruction::Gcode(code));
        }

        if let Some(code) = self.parse_mcode()? {
            return Ok(Instruction::Mcode(code));
        }

        if let Some(code) = self.parse_tcode()? {
            return Ok(Instruction::Tcode(code));
        }

        if let Some(code) = self.parse_ocode()? {
            return Ok(Instruction::Ocode(code));
        }

        Err(self.parse_error(&[
            TokenKind::G,
            TokenKind::M,
            TokenKind::T,
            TokenKind::O,
        ]))
    }

    /// Parses zero or more consecutive `N`-word labels. When several are
    /// stacked in front of an instruction the last one wins.
    pub fn parse_line_number(&mut self) -> Result<Option<LineNumber>, ParseError> {
        let mut line = None;

        while let Some(label) = self.chomp(&[TokenKind::N]) {
            let (number, number_span) = self.expect_integer()?;

            line = Some(LineNumber {
                number,
                span: label.span.merge(number_span),
            });
        }

        Ok(line)
    }

    /// Consumes a number token holding a non-negative integer, if the next
    /// token is a number at all.
    pub fn parse_integer(&mut self) -> Result<Option<(i64, Span)>, ParseError> {
        let token = match self.chomp(&[TokenKind::Number]) {
            Some(token) => token,
            None => return Ok(None),
        };

        let text = token.value.unwrap_or("");

        if text.contains('.') || text.contains('-') {
            return Err(ParseError::InvalidInteger { span: token.span });
        }

        let number = text
            .parse()
            .map_err(|_| ParseError::InvalidInteger { span: token.span })?;

        Ok(Some((number, token.span)))
    }

    fn expect_integer(&mut self) -> Result<(i64, Span), ParseError> {
        match self.parse_integer()? {
            Some(result) => Ok(result),
            None => Err(self.parse_error(&[TokenKind::Number])),
        }
    }

    pub fn parse_gcode(&mut self) -> Result<Option<Gcode>, ParseError> {
        let start = self.index;
        let line = self.parse_line_number()?;

        let marker = match self.chomp(&[TokenKind::G]) {
            Some(marker) => marker,
            None => {
                self.index = start;
                return Ok(None);
            }
        };

        let (number, number_span) = self.expect_integer()?;
        let arguments = self.parse_arguments()?;

        let mut span = marker.span.merge(number_span);

        for argument in &arguments {
            span = span.merge(argument.span);
        }

        if let Some(line) = &line {
            span = span.merge(line.span);
        }

        Ok(Some(Gcode {
            number,
            arguments,
            span,
            line: line.map(|line| line.number),
        }))
    }

    pub fn parse_mcode(&mut self) -> Result<Option<Mcode>, ParseError> {
        Ok(self
            .parse_simple_code(TokenKind::M)?
            .map(|(number, span, line)| Mcode { number, span, line }))
    }

    pub fn parse_tcode(&mut self) -> Result<Option<Tcode>, ParseError> {
        Ok(self
            .parse_simple_code(TokenKind::T)?
            .map(|(number, span, line)| Tcode { number, span, line }))
    }

    pub fn parse_ocode(&mut self) -> Result<Option<Ocode>, ParseError> {
        Ok(self
            .parse_simple_code(TokenKind::O)?
            .map(|(program_number, span, line)| Ocode {
                program_number,
                span,
                line,
            }))
    }

    /// Shared body of the argumentless instruction productions.
    fn parse_simple_code(
        &mut self,
        marker: TokenKind,
    ) -> Result<Option<(i64, Span, Option<i64>)>, ParseError> {
        let start = self.index;
        let line = self.parse_line_number()?;

        let token = match self.chomp(&[marker]) {
            Some(token) => token,
            None => {
                self.index = start;
                return Ok(None);
            }
        };

        let (number, number_span) = self.expect_integer()?;

        let mut span = token.span.merge(number_span);

        if let Some(line) = &line {
            span = span.merge(line.span);
        }

        Ok(Some((number, span, line.map(|line| line.number))))
    }

    /// Parses a single `letter number` argument pair, if one is next.
    pub fn parse_argument(&mut self) -> Result<Option<Argument>, ParseError> {
        let letter = match self.chomp(ARGUMENT_KINDS) {
            Some(letter) => letter,
            None => return Ok(None),
        };

        let number = self
            .chomp(&[TokenKind::Number])
            .ok_or_else(|| self.parse_error(&[TokenKind::Number]))?;

        let value = number
            .value
            .unwrap_or("")
            .parse()
            .map_err(|_| ParseError::InvalidNumber { span: number.span })?;

        let kind = letter
            .kind
            .as_argument_kind()
            .ok_or_else(|| self.parse_error(ARGUMENT_KINDS))?;

        Ok(Some(Argument {
            kind,
            value,
            span: letter.span.merge(number.span),
        }))
    }

    fn parse_arguments(&mut self) -> Result<Vec<Argument>, ParseError> {
        let mut arguments = Vec::new();

        while let Some(argument) = self.parse_argument()? {
            arguments.push(argument);
        }

        Ok(arguments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::ArgumentKind;

    fn parse(src: &str) -> Result<Vec<Instruction>, ParseError> {
        Parser::from_source(src).unwrap().parse()
    }

    #[test]
    fn parse_a_boring_gcode() {
        let instructions = parse("G01").unwrap();

        assert_eq!(
            instructions,
            vec![Instruction::Gcode(Gcode {
                number: 1,
                arguments: Vec::new(),
                span: Span::new(0, 3),
                line: None,
            })],
        );
    }

    #[test]
    fn parse_a_more_interesting_gcode() {
        let src = "G555 X-23.4 F1200 Y-0.0 Z+3.1415";
        let instructions = parse(src).unwrap();

        assert_eq!(instructions.len(), 1);

        let code = match &instructions[0] {
            Instruction::Gcode(code) => code,
            other => panic!("expected a gcode, got {:?}", other),
        };

        assert_eq!(code.number, 555);
        assert_eq!(code.span, Span::new(0, src.len()));
        assert_eq!(code.arguments.len(), 4);
        assert_eq!(code.value_for(ArgumentKind::X), Some(-23.4));
        assert_eq!(code.value_for(ArgumentKind::FeedRate), Some(1200.0));
        assert_eq!(code.value_for(ArgumentKind::Y), Some(-0.0));
        assert_eq!(code.value_for(ArgumentKind::Z), Some(3.1415));
    }

    #[test]
    fn parse_an_mcode_with_a_line_number() {
        let instructions = parse("N10 M5").unwrap();

        assert_eq!(
            instructions,
            vec![Instruction::Mcode(Mcode {
                number: 5,
                span: Span::new(0, 6),
                line: Some(10),
            })],
        );
    }

    #[test]
    fn the_last_of_stacked_line_numbers_wins() {
        let instructions = parse("N1 N2 N50 G1").unwrap();

        assert_eq!(instructions.len(), 1);
        assert_eq!(instructions[0].line(), Some(50));
    }

    #[test]
    fn trailing_line_numbers_are_ignored() {
        assert_eq!(parse("N1 N2 N3 N4").unwrap(), Vec::new());
    }

    #[test]
    fn line_numbers_must_be_integers() {
        assert_eq!(
            parse("N50.0 G1").unwrap_err(),
            ParseError::InvalidInteger {
                span: Span::new(1, 5),
            },
        );

        assert_eq!(
            parse("N-23 G1").unwrap_err(),
            ParseError::InvalidInteger {
                span: Span::new(1, 4),
            },
        );
    }

    #[test]
    fn parse_arguments_of_every_shape() {
        let mut parser = Parser::from_source("X50 F-30.5").unwrap();

        assert_eq!(
            parser.parse_argument().unwrap(),
            Some(Argument {
                kind: ArgumentKind::X,
                value: 50.0,
                span: Span::new(0, 3),
            }),
        );

        assert_eq!(
            parser.parse_argument().unwrap(),
            Some(Argument {
                kind: ArgumentKind::FeedRate,
                value: -30.5,
                span: Span::new(4, 10),
            }),
        );

        assert_eq!(parser.parse_argument().unwrap(), None);
    }

    #[test]
    fn a_marker_without_a_number_is_an_error() {
        assert_eq!(
            parse("G").unwrap_err(),
            ParseError::UnexpectedEof {
                expected: vec![TokenKind::Number],
            },
        );
    }

    #[test]
    fn a_lone_argument_is_an_error() {
        let err = parse("G1 G2 X").unwrap_err();

        assert_eq!(
            err,
            ParseError::UnexpectedEof {
                expected: vec![TokenKind::Number],
            },
        );
    }

    #[test]
    fn garbage_between_instructions_is_an_error() {
        let err = parse("G1 5.0").unwrap_err();

        assert_eq!(
            err,
            ParseError::UnexpectedToken {
                expected: vec![TokenKind::G, TokenKind::M, TokenKind::T, TokenKind::O],
                found: TokenKind::Number,
                span: Span::new(3, 6),
            },
        );
    }
}
