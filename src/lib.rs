//! # From calculator text to stack machine code
//!
//! User's input: `if (n > 1) r = fact(n) / 2; else r = 0`

//! ## Scanning
//!
//! The scanner turns characters into tokens: `if`, `(`, `n`, `>`, `1`, `)`
//! and so on. Numbers and strings are interned as they are read, so a token
//! carries a small index instead of its text. Whether a newline is a token
//! depends on what the parser is reading: it ends a typed line, but not a
//! function body in braces.

//! ## Single-pass code generation
//!
//! The parser never builds a tree. Each grammar rule emits its instructions
//! as soon as it recognizes them:
//!
//! ``` markdown
//!  0: DEBUG 1
//!  1: GLOBALADDR 0 ("n")
//!  2: NUMBER 1 ("1")
//!  3: GT
//!  4: JUMPEQ 12
//!  ...
//! ```
//!
//! A jump whose target is not parsed yet, like the `JUMPEQ` to the `else`
//! branch above, is emitted with a placeholder and recorded on a label. When
//! the parser reaches the target, every recorded jump is patched.

//! ## Names
//!
//! Names resolve while the code is emitted: a parameter, then a local, then
//! a static visible from here, then a global. Assigning to an unknown name at
//! the top level creates a global.

//! ## Errors
//!
//! A syntax error is reported with its input and line, then the parser
//! skips to the next comma or statement and goes on, so one pass finds as
//! many errors as it can. A unit with errors is never run. Too many errors,
//! or nesting too deep, abandon the unit at once.

//! ## Running
//!
//! Finished code goes to a [`Host`], which owns the virtual machine.

pub mod bytecode;
mod calcer;
pub mod cli;
pub mod config;
pub mod environment;
pub mod error;
pub mod host;
mod parser;
pub mod scanner;

pub use calcer::Calcer;
pub use config::Config;
pub use error::{
	parser::ParseErrorType,
	scanner::{ScanError, ScanErrorType},
	Abort, CalcError, Diagnostic, ErrorKind,
};
pub use host::{Host, OpenOutcome};
pub use parser::Parser;
