//! Turns gcode source text into a stream of [Token]s.
//!
//! Lexing is driven by a table of anchored regular expressions which are
//! tried in a fixed order at the cursor. Whitespace and both comment styles
//! (`; to end of line` and `(parenthesised)`) are consumed between tokens;
//! comment text is retained and can be inspected after lexing.

use lazy_static::lazy_static;
use regex::{Regex, RegexBuilder};

use crate::error::LexError;
use crate::span::Span;
use crate::token::{Token, TokenKind};

/// Errors raised while constructing a [Pattern].
#[derive(Debug, Clone, PartialEq)]
pub enum PatternError {
    /// The pattern does not begin with the `\A` anchor.
    NotAnchored,

    /// The pattern is not a valid regular expression.
    Invalid(String),
}

/// A single lexical rule: an anchored regular expression and the kind of
/// token it produces.
#[derive(Debug, Clone)]
pub struct Pattern {
    regex: Regex,
    kind: TokenKind,
}

impl Pattern {
    /// Compiles `pattern` case-insensitively. The pattern must begin with
    /// `\A` so it can only ever match at the cursor.
    pub fn new(pattern: &str, kind: TokenKind) -> Result<Pattern, PatternError> {
        if !pattern.starts_with("\\A") {
            return Err(PatternError::NotAnchored);
        }

        let regex = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|err| PatternError::Invalid(err.to_string()))?;

        Ok(Pattern { regex, kind })
    }

    /// Tries this rule against `src` at byte offset `start`.
    pub fn try_match<'a>(&self, src: &'a str, start: usize) -> Option<Token<'a>> {
        let m = self.regex.find(&src[start..])?;
        let span = Span::new(start + m.start(), start + m.end());

        if self.kind.has_value() {
            Some(Token::with_value(self.kind, span, m.as_str()))
        } else {
            Some(Token::new(self.kind, span))
        }
    }
}

lazy_static! {
    static ref SKIPS: Vec<Regex> = vec![
        Regex::new(r"\A\s+").unwrap(),
        Regex::new(r"\A;([^\n\r]*)").unwrap(),
        Regex::new(r"\A\(([^)\n\r]*)\)").unwrap(),
    ];

    static ref PATTERNS: Vec<Pattern> = vec![
        Pattern::new(r"\AG", TokenKind::G).unwrap(),
        Pattern::new(r"\AO", TokenKind::O).unwrap(),
        Pattern::new(r"\AN", TokenKind::N).unwrap(),
        Pattern::new(r"\AM", TokenKind::M).unwrap(),
        Pattern::new(r"\AT", TokenKind::T).unwrap(),
        Pattern::new(r"\AX", TokenKind::X).unwrap(),
        Pattern::new(r"\AY", TokenKind::Y).unwrap(),
        Pattern::new(r"\AZ", TokenKind::Z).unwrap(),
        Pattern::new(r"\AF", TokenKind::F).unwrap(),
        Pattern::new(r"\AI", TokenKind::I).unwrap(),
        Pattern::new(r"\AJ", TokenKind::J).unwrap(),
        Pattern::new(r"\AK", TokenKind::K).unwrap(),
        Pattern::new(r"\AA", TokenKind::A).unwrap(),
        Pattern::new(r"\AB", TokenKind::B).unwrap(),
        Pattern::new(r"\AC", TokenKind::C).unwrap(),
        Pattern::new(r"\AH", TokenKind::H).unwrap(),
        Pattern::new(r"\AP", TokenKind::P).unwrap(),
        Pattern::new(r"\AS", TokenKind::S).unwrap(),
        Pattern::new(r"\A[-+]?(?:\d+\.\d+|\.\d+|\d+\.?)", TokenKind::Number).unwrap(),
    ];
}

/// A comment encountered while lexing, with its text (delimiters stripped)
/// and the span of that text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Comment<'a> {
    pub text: &'a str,
    pub span: Span,
}

/// An iterator over the [Token]s of a source text.
pub struct Lexer<'a> {
    src: &'a str,
    pointer: usize,
    line_number: usize,
    comments: Vec<Comment<'a>>,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Lexer<'a> {
        Lexer {
            src,
            pointer: 0,
            line_number: 0,
            comments: Vec::new(),
        }
    }

    /// The comments seen so far, in source order.
    pub fn comments(&self) -> &[Comment<'a>] {
        &self.comments
    }

    fn finished(&self) -> bool {
        self.pointer >= self.src.len()
    }

    /// Consumes whitespace and comments until no skip rule makes progress.
    fn skip_stuff(&mut self) {
        let src = self.src;

        loop {
            let before = self.pointer;

            for skip in SKIPS.iter() {
                if self.finished() {
                    break;
                }

                let m = match skip.captures(&src[self.pointer..]) {
                    Some(m) => m,
                    None => continue,
                };

                if let Some(text) = m.get(1) {
                    self.comments.push(Comment {
                        text: text.as_str(),
                        span: Span::new(
                            self.pointer + text.start(),
                            self.pointer + text.end(),
                        ),
                    });
                }

                let whole = m.get(0).unwrap();
                self.line_number += whole.as_str().matches('\n').count();
                self.pointer += whole.end();
            }

            if self.finished() || self.pointer == before {
                break;
            }
        }
    }

    /// The 0-based column of the cursor within its line. The cursor always
    /// sits on a character boundary, so slicing up to it is safe even when
    /// the character under it is multi-byte.
    fn current_column(&self) -> usize {
        let line_start = self.src[..self.pointer]
            .rfind('\n')
            .map(|p| p + 1)
            .unwrap_or(0);

        self.pointer - line_start
    }

    fn next_token(&mut self) -> Result<Token<'a>, LexError> {
        let src = self.src;

        for pattern in PATTERNS.iter() {
            if let Some(token) = pattern.try_match(src, self.pointer) {
                self.pointer = token.span.end;
                return Ok(token);
            }
        }

        Err(LexError::UnrecognisedCharacter {
            line: self.line_number + 1,
            column: self.current_column() + 1,
            character: src[self.pointer..].chars().next().unwrap_or('\0'),
        })
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Result<Token<'a>, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.skip_stuff();

        if self.finished() {
            return None;
        }

        Some(self.next_token())
    }
}

/// Tokenizes an entire source text, collecting the tokens and comments it
/// contains.
pub fn tokenize(src: &str) -> Result<(Vec<Token>, Vec<Comment>), LexError> {
    let mut lexer = Lexer::new(src);
    let mut tokens = Vec::new();

    for token in &mut lexer {
        tokens.push(token?);
    }

    Ok((tokens, lexer.comments))
}
