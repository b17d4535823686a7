//! Drives a parsed program through a user-supplied [Handler].
//!
//! The interpreter owns the pipeline: it lexes, parses and then walks the
//! instruction list in source order, calling back into the handler for every
//! instruction. Handlers can stop the walk early through the [Control]
//! passed to each callback.

use slog::{debug, o, Discard, Logger};

use crate::ast::{Gcode, Instruction, Mcode, Ocode, Tcode};
use crate::error::{Error, RuntimeError};
use crate::file_map::FileMap;
use crate::lexer::Lexer;
use crate::parser::Parser;
use crate::span::{Location, Span, SpanInfo};
use crate::token::Token;

/// Lets a [Handler] influence the instruction walk while it is in progress.
pub struct Control {
    running: bool,
}

impl Control {
    /// Stops the walk after the current callback returns.
    pub fn halt(&mut self) {
        self.running = false;
    }

    pub fn running(&self) -> bool {
        self.running
    }
}

/// The callback surface of the interpreter.
///
/// All methods have no-op defaults, so implementors only write the ones they
/// care about.
pub trait Handler {
    /// Called with the full token list before parsing starts.
    fn before_parse(&mut self, _tokens: &[Token]) {}

    /// Called with the full instruction list before the walk starts.
    fn before_run(&mut self, _instructions: &[Instruction]) {}

    /// Called once per comment, in source order, before parsing.
    fn comment(&mut self, _text: &str, _span: Span) {}

    fn gcode(&mut self, _control: &mut Control, _code: &Gcode) -> Result<(), RuntimeError> {
        Ok(())
    }

    fn mcode(&mut self, _control: &mut Control, _code: &Mcode) -> Result<(), RuntimeError> {
        Ok(())
    }

    fn tcode(&mut self, _control: &mut Control, _code: &Tcode) -> Result<(), RuntimeError> {
        Ok(())
    }

    fn ocode(&mut self, _control: &mut Control, _code: &Ocode) -> Result<(), RuntimeError> {
        Ok(())
    }
}

/// Walks a gcode program, forwarding each instruction to a [Handler].
pub struct Interpreter<H> {
    handler: H,
    control: Control,
    file_map: Option<FileMap>,
    logger: Logger,
}

impl<H: Handler> Interpreter<H> {
    pub fn new(handler: H) -> Interpreter<H> {
        Interpreter::with_logger(handler, None)
    }

    pub fn with_logger<L>(handler: H, logger: L) -> Interpreter<H>
    where
        L: Into<Option<Logger>>,
    {
        let logger = logger
            .into()
            .unwrap_or(Logger::root(Discard, o!()))
            .new(o!("stage" => "interpretation"));

        Interpreter {
            handler,
            control: Control { running: false },
            file_map: None,
            logger,
        }
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    pub fn into_handler(self) -> H {
        self.handler
    }

    /// Stops the walk before the next instruction.
    pub fn halt(&mut self) {
        self.control.halt();
    }

    /// The line and column of `byte_index` in the most recent source text.
    ///
    /// `None` when the last run started from tokens or instructions instead
    /// of source text.
    pub fn location_for(&mut self, byte_index: usize) -> Option<Location> {
        self.file_map
            .as_mut()
            .map(|map| map.location_for(byte_index))
    }

    /// Position details for `span` in the most recent source text.
    pub fn span_info_for(&mut self, span: Span) -> Option<SpanInfo> {
        self.file_map.as_mut().map(|map| map.span_info_for(span))
    }

    /// Runs a program from source text.
    pub fn run(&mut self, src: &str) -> Result<(), Error> {
        self.file_map = Some(FileMap::new(src.to_string()));

        let mut lexer = Lexer::new(src);
        let mut tokens = Vec::new();

        for token in &mut lexer {
            tokens.push(token?);
        }

        for comment in lexer.comments() {
            self.handler.comment(comment.text, comment.span);
        }

        debug!(self.logger, "tokenized source text";
               "tokens" => tokens.len(),
               "comments" => lexer.comments().len());

        self.parse_and_run(tokens)
    }

    /// Runs a program from an already-lexed token stream. Position queries
    /// are unavailable afterwards.
    pub fn run_tokens(&mut self, tokens: Vec<Token>) -> Result<(), Error> {
        self.file_map = None;
        self.parse_and_run(tokens)
    }

    /// Runs an already-parsed program. Position queries are unavailable
    /// afterwards.
    pub fn run_instructions(&mut self, instructions: &[Instruction]) -> Result<(), Error> {
        self.file_map = None;
        self.execute(instructions)
    }

    fn parse_and_run(&mut self, tokens: Vec<Token>) -> Result<(), Error> {
        self.handler.before_parse(&tokens);

        let instructions = Parser::new(tokens).parse()?;

        debug!(self.logger, "parsed program";
               "instructions" => instructions.len());

        self.execute(&instructions)
    }

    fn execute(&mut self, instructions: &[Instruction]) -> Result<(), Error> {
        self.handler.before_run(instructions);
        self.control.running = true;

        for instruction in instructions {
            if !self.control.running {
                break;
            }

            self.dispatch(instruction)?;
        }

        self.control.running = false;

        Ok(())
    }

    fn dispatch(&mut self, instruction: &Instruction) -> Result<(), Error> {
        match instruction {
            Instruction::Gcode(code) => self.handler.gcode(&mut self.control, code)?,
            Instruction::Mcode(code) => self.handler.mcode(&mut self.control, code)?,
            Instruction::Tcode(code) => self.handler.tcode(&mut self.control, code)?,
            Instruction::Ocode(code) => self.handler.ocode(&mut self.control, code)?,
        }

        Ok(())
    }
}
