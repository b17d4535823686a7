//! A crate for working with CNC gcode programs: tokenizing, parsing,
//! interpreting and emulating them on a virtual clock.
//!
//! Currently this crate provides the functionality to:
//! - Tokenize gcode source text, including both comment styles.
//! - Parse the token stream into typed `G`/`M`/`T`/`O` instructions.
//! - Resolve byte offsets and spans back to lines and columns.
//! - Walk a parsed program through a user-supplied [Handler](interpreter::Handler).
//! - Emulate a program on a time-stepped virtual machine and observe it
//!   through [Events](event::Event).
//!
//! # Example
//! ```
//! use gcodes::{emulator::Emulator, event::Event};
//!
//! fn main() {
//!     let src = "
//!         ; select the XY plane, then pause for two seconds
//!         G17
//!         G04 P2000
//!     ";
//!
//!     let mut emulator = Emulator::new();
//!
//!     emulator.add_listener(|event: &Event| {
//!         if let Event::StateChanged { time, .. } = event {
//!             println!("t = {:.3}s", time);
//!         }
//!     });
//!
//!     emulator.run(src).expect("emulation failed");
//!
//!     assert_eq!(emulator.time(), 2.0);
//! }
//! ```

pub mod ast;
pub mod emulator;
pub mod error;
pub mod event;
pub mod file_map;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod span;
pub mod token;
