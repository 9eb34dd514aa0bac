use std::{
	collections::HashSet,
	fs::read_to_string,
	io::{BufRead, Write},
	path::{Path, PathBuf},
};

use anyhow::Context;
use tracing::debug;

use crate::{
	bytecode::Function,
	config::Config,
	environment::Environment,
	error::CalcError,
	host::{Host, OpenOutcome},
	parser::Parser,
	scanner::{CharSource, StrSource},
};

/// Calcer runs calculator sessions from a file or the terminal.
pub struct Calcer {
	config:  Config,
	listing: bool,
}

impl Calcer {
	pub fn new(config: Config, listing: bool) -> Self { Self { config, listing } }

	/// Compile every command of the file at `path`.
	pub fn run_file<P: AsRef<Path>>(&self, path: P) -> Result<(), CalcError> {
		let path = path.as_ref();
		let source = read_to_string(path).context("Failed open source file")?;
		let mut parser = Parser::new(self.config.clone(), ConsoleHost::new(self.listing));
		parser.compile_statement_stream(Box::new(StrSource::new(path.display().to_string(), &source)))
	}

	/// Run the REPL prompt until end of input.
	pub fn run_prompt(&self) {
		let mut parser = Parser::new(self.config.clone(), ConsoleHost::new(self.listing));
		match parser.compile_statement_stream(Box::new(Terminal::default())) {
			Ok(()) | Err(CalcError::CompileErrors(_)) => {}
			Err(e) => eprintln!("Failed run prompt: {e}"),
		}
		println!("\nExited zcalc repl");
	}
}

/// Lines typed at the terminal, prompted for as the scanner needs them.
#[derive(Default)]
struct Terminal {
	line:         Vec<char>,
	at:           usize,
	continuation: bool,
	closed:       bool,
}

impl CharSource for Terminal {
	fn next_char(&mut self) -> Option<char> {
		while self.at == self.line.len() {
			if self.closed {
				return None;
			}
			print!("{}", if self.continuation { ">> " } else { "> " });
			if let Err(e) = std::io::stdout().flush() {
				eprintln!("Failed flush: {e}");
			}
			let mut input = String::new();
			match std::io::stdin().lock().read_line(&mut input) {
				Ok(0) => self.closed = true,
				Ok(_) => {}
				Err(e) => {
					eprintln!("Failed read line: {e}");
					self.closed = true;
				}
			}
			self.line = input.chars().collect();
			self.at = 0;
		}
		self.at += 1;
		Some(self.line[self.at - 1])
	}

	fn name(&self) -> &str { "(stdin)" }

	fn is_terminal(&self) -> bool { true }

	fn set_continuation(&mut self, continuation: bool) { self.continuation = continuation; }
}

/// Host for the command-line binary.
///
/// Code is handed to the virtual machine, which lives outside this crate, so
/// executing here means showing the listing when asked for one.
struct ConsoleHost {
	listing: bool,
	/// Files read so far, for `read -once`
	read:    HashSet<PathBuf>,
}

impl ConsoleHost {
	fn new(listing: bool) -> Self { Self { listing, read: HashSet::new() } }
}

impl Host for ConsoleHost {
	fn execute(&mut self, function: &Function, env: &Environment) -> anyhow::Result<()> {
		if self.listing {
			print!("{}", function.listing(env));
		}
		Ok(())
	}

	fn function_defined(&mut self, function: &Function, env: &Environment) {
		if self.listing {
			print!("{}", function.listing(env));
		}
	}

	/// Open `name`, or `name.cal` if there is no such file.
	fn open(&mut self, name: &str, once: bool) -> OpenOutcome {
		let mut candidates = vec![PathBuf::from(name)];
		if !name.ends_with(".cal") {
			candidates.push(PathBuf::from(format!("{name}.cal")));
		}
		for path in candidates {
			let Ok(source) = read_to_string(&path) else { continue };
			let key = path.canonicalize().unwrap_or_else(|_| path.clone());
			if !self.read.insert(key) && once {
				return OpenOutcome::AlreadyRead;
			}
			debug!(path = %path.display(), "opened");
			return OpenOutcome::Opened(Box::new(StrSource::new(path.display().to_string(), &source)));
		}
		OpenOutcome::NotFound
	}
}
