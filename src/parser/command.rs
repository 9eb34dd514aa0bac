//! The commands of an input stream: function definitions, the file and
//! directory commands, and lines to evaluate.
//!
//! ``` BNF
//! command  → "define" SYMBOL "(" params? ")" ( "=" exprlist | body )
//!          | "read" "-once"? FILENAME | "write" FILENAME
//!          | "help" FILENAME? | "cd" FILENAME?
//!          | statements NEWLINE ;
//! params   → SYMBOL ( "," SYMBOL )* ;
//! ```
use tracing::{debug, warn};
use TokenType::*;

use super::{ParseResult, Parser, Skip, Targets};
use crate::{
	bytecode::{FunctionKind, Op},
	error::parser::ParseErrorType,
	host::{Host, OpenOutcome},
	scanner::{ScanMode, TokenType},
};

impl<H: Host> Parser<H> {
	/// Compile and run commands until the end of the current input.
	///
	/// An abort read from a terminal only loses the rest of the line, any
	/// other input is given up on.
	pub(super) fn commands(&mut self) -> ParseResult {
		loop {
			self.scanner.set_mode(ScanMode::NEWLINES);
			self.stream_errors += std::mem::take(&mut self.error_count);
			match self.command() {
				Ok(true) => {}
				Ok(false) => return Ok(()),
				Err(abort) if self.scanner.is_terminal() => {
					warn!(%abort, "discarding line");
					eprintln!("{abort}");
					self.scanner.skip_line();
					self.stream_errors += std::mem::take(&mut self.error_count);
				}
				Err(abort) => return Err(abort),
			}
		}
	}

	/// Handle one command, returning whether there may be more.
	fn command(&mut self) -> ParseResult<bool> {
		match self.next()? {
			Eof => return Ok(false),
			NewLine | Semicolon => {}
			Define => self.define_function()?,
			Help => {
				let topic = self.filename(false)?.map_or_else(|| "help".to_string(), |(name, _)| name);
				self.host.help(&topic);
			}
			Read => self.read_command()?,
			Write => {
				let Some((name, _)) = self.filename(true)? else { return Ok(true) };
				if let Err(error) = self.host.write_globals(&name, &self.env) {
					debug!(%error, "write failed");
					self.error(ParseErrorType::CannotWrite(name), Skip::None)?;
				}
			}
			Cd => self.cd_command()?,
			_ => {
				self.push_back();
				self.compile_interactive_line(false)?;
			}
		}
		Ok(true)
	}

	/// Read the file name argument of a command, with `-once` before it if
	/// `once_ok`. Missing names are only reported when they are required.
	fn filename(&mut self, once_ok: bool) -> ParseResult<Option<(std::string::String, bool)>> {
		self.scanner.set_mode(ScanMode::FILENAME);
		let mut name = self.filename_word()?;
		let mut once = false;
		if once_ok && name.as_deref() == Some("-once") {
			once = true;
			name = self.filename_word()?;
		}
		let Some(name) = name else {
			if once_ok {
				self.error(ParseErrorType::FilenameExpected, Skip::Statement)?;
			}
			return Ok(None);
		};
		match self.next()? {
			Semicolon | NewLine | Eof => Ok(Some((name, once))),
			_ => {
				if once_ok {
					self.error(ParseErrorType::FilenameSemicolon, Skip::Statement)?;
				}
				Ok(None)
			}
		}
	}

	fn filename_word(&mut self) -> ParseResult<Option<std::string::String>> {
		Ok(match self.next()? {
			Symbol(name) => Some(name),
			String(id) => self.env.strings.get(id).map(str::to_string),
			_ => {
				self.push_back();
				None
			}
		})
	}

	/// `read [-once] name` compiles a whole file before going on here.
	fn read_command(&mut self) -> ParseResult {
		let Some((name, once)) = self.filename(true)? else { return Ok(()) };
		let source = match self.host.open(&name, once) {
			OpenOutcome::Opened(source) => source,
			OpenOutcome::AlreadyRead => {
				debug!(name, "already read");
				return Ok(());
			}
			OpenOutcome::NotFound => return self.error(ParseErrorType::CannotOpen(name), Skip::None),
		};
		if let Err(error) = self.scanner.push_input(source) {
			return self.error(error, Skip::None);
		}
		debug!(name, depth = self.scanner.input_depth(), "reading");
		self.env.symbols.enter_file_scope();
		let result = self.commands();
		self.env.symbols.exit_file_scope();
		self.scanner.pop_input();
		result
	}

	fn cd_command(&mut self) -> ParseResult {
		self.scanner.set_mode(ScanMode::FILENAME);
		let dir = match self.next()? {
			Symbol(name) => Some(name),
			String(id) => self.env.strings.get(id).map(str::to_string),
			_ => {
				self.push_back();
				None
			}
		};
		if let Err(error) = self.host.change_dir(dir.as_deref()) {
			eprintln!("{error:#}");
		}
		Ok(())
	}

	/// `define name(params) = expr` or `define name(params) { body }`.
	///
	/// The function only replaces an earlier definition if it compiles.
	fn define_function(&mut self) -> ParseResult {
		let mode = self.scanner.set_mode(ScanMode::DEFAULT);
		let Symbol(name) = self.next()? else {
			self.scanner.set_mode(mode);
			return self.error(ParseErrorType::FunctionNameExpected, Skip::Statement);
		};
		if self.env.functions.lookup_builtin(&name).is_some() {
			self.scanner.set_mode(mode);
			return self.error(ParseErrorType::BuiltinName, Skip::Statement);
		}
		self.begin_unit(&name, FunctionKind::Named);
		self.env.symbols.enter_function_scope();
		let result = self.function_definition();
		let function = match result {
			Ok(()) => self.end_unit(),
			Err(abort) => Err(abort),
		};
		self.env.symbols.exit_function_scope();
		self.scanner.set_mode(mode);
		let Some(function) = function? else { return Ok(()) };
		let id = self.env.functions.intern_user_function(&name);
		self.host.function_defined(&function, &self.env);
		debug!(name, params = function.param_count(), ops = function.code().len(), "function defined");
		self.env.functions.define(id, function);
		Ok(())
	}

	fn function_definition(&mut self) -> ParseResult {
		if !self.next_if(|t| matches!(t, LeftParen))? {
			return self.error(ParseErrorType::FunctionLeftParen, Skip::Statement);
		}
		if !self.next_if(|t| matches!(t, RightParen))? {
			loop {
				let Symbol(param) = self.next()? else {
					return self.error(ParseErrorType::BadFunctionDefinition, Skip::Comma);
				};
				if let Err(error) = self.env.symbols.declare_parameter(&param) {
					self.error(error.into(), Skip::None)?;
				}
				match self.next()? {
					RightParen => break,
					Comma => {}
					_ => return self.error(ParseErrorType::BadFunctionDefinition, Skip::Comma),
				}
			}
		}
		match self.next()? {
			Assign => self.simple_body(),
			LeftBrace => {
				self.push_back();
				self.body(Targets::default(), true)
			}
			_ => self.error(ParseErrorType::FunctionBodyExpected, Skip::None),
		}
	}

	/// `= exprlist` up to the end of the line.
	fn simple_body(&mut self) -> ParseResult {
		self.scanner.set_mode(ScanMode::NEWLINES);
		self.expr_list()?;
		self.function.emit(Op::Return);
		self.next_if(|t| matches!(t, Semicolon))?;
		match self.next()? {
			NewLine | Eof => Ok(()),
			_ => self.error(ParseErrorType::IllegalFunctionDefinition, Skip::Statement),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::super::tests::{compile, errors, Recorder};
	use crate::{
		bytecode::Op,
		config::Config,
		environment::Environment,
		error::CalcError,
		host::{Host, OpenOutcome},
		parser::Parser,
		scanner::StrSource,
	};

	#[test]
	fn define_installs_on_success() {
		let parser = compile("define sq(x) = x * x\nsq(3)\n");
		let functions = &parser.environment().functions;
		let sq = functions.users().find(|f| f.name == "sq").unwrap();
		let body = sq.body.as_ref().unwrap();
		assert_eq!(body.param_count(), 1);
		assert_eq!(body.code()[..4], [Op::ParamAddr(0), Op::ParamAddr(0), Op::Mul, Op::Return]);
		assert_eq!(parser.host().executed.len(), 1);
	}

	#[test]
	fn failed_define_keeps_old_body() {
		let parser = compile("define f() = 1\ndefine f() = )\n");
		assert_eq!(parser.diagnostics().len(), 1);
		assert_eq!(parser.host().defined.len(), 1);
		let f = parser.environment().functions.users().find(|f| f.name == "f").unwrap();
		assert!(f.body.is_some());
	}

	#[test]
	fn define_errors() {
		assert_eq!(errors("define 3\n"), ["Function name expected"]);
		assert_eq!(errors("define fact(n) = n\n"), ["Using builtin function name"]);
		assert_eq!(errors("define f = 1\n"), ["Left parenthesis expected for function"]);
		assert_eq!(errors("define f(a, 1) = a\n"), ["Bad function definition"]);
		assert_eq!(errors("define f(a, a) = a\n"), ["Parameter \"a\" is already defined"]);
		assert_eq!(errors("define f() 1\n"), ["Left brace or equals sign expected for function"]);
		assert_eq!(errors("define f() = 1 2\n"), ["Missing operator"]);
		assert_eq!(errors("define f() = 1)\n"), ["Illegal function definition"]);
		assert_eq!(errors("define f() { 1 \n"), ["Missing right brace"]);
	}

	#[test]
	fn multi_line_bodies() {
		let parser = compile("define f(n) {\n\tlocal i;\n\tfor (i = 0; i < n; i++)\n\t\tprint i;\n}\nf(2)\n");
		assert!(parser.diagnostics().is_empty(), "{:?}", parser.diagnostics());
		assert_eq!(parser.host().defined[0].local_count(), 1);
		assert_eq!(parser.host().executed.len(), 1);
	}

	#[test]
	fn errors_end_only_their_unit() {
		let parser = compile("1 +\n2\ndefine f() = )\n3\n");
		assert_eq!(parser.diagnostics().len(), 2);
		assert_eq!(parser.host().executed.len(), 2);
	}

	/// Host serving inputs for `read` from memory.
	#[derive(Default)]
	struct Files {
		inner: Recorder,
		files: Vec<(&'static str, &'static str)>,
		read:  Vec<std::string::String>,
		help:  Vec<std::string::String>,
	}

	impl Host for Files {
		fn execute(&mut self, function: &crate::bytecode::Function, env: &Environment) -> anyhow::Result<()> {
			self.inner.execute(function, env)
		}

		fn open(&mut self, name: &str, once: bool) -> OpenOutcome {
			if once && self.read.iter().any(|r| r == name) {
				return OpenOutcome::AlreadyRead;
			}
			match self.files.iter().find(|(file, _)| *file == name) {
				Some((file, text)) => {
					self.read.push(name.to_string());
					OpenOutcome::Opened(Box::new(StrSource::new(*file, text)))
				}
				None => OpenOutcome::NotFound,
			}
		}

		fn help(&mut self, topic: &str) { self.help.push(topic.to_string()) }
	}

	fn session(files: Vec<(&'static str, &'static str)>, input: &str) -> (Parser<Files>, Result<(), CalcError>) {
		let mut parser = Parser::new(Config::default(), Files { files, ..Files::default() });
		let result = parser.compile_statement_stream(Box::new(StrSource::new("main", input)));
		(parser, result)
	}

	#[test]
	fn read_compiles_the_file() {
		let lib = ("lib.cal", "define twice(x) = 2 * x\nstatic hidden = 1\n");
		let (parser, result) = session(vec![lib], "read lib.cal\ntwice(4)\nread -once lib.cal\nread -once lib.cal\n");
		assert!(result.is_ok(), "{:?}", parser.diagnostics());
		assert_eq!(parser.host().read, ["lib.cal"]);
		assert!(parser.environment().functions.users().any(|f| f.name == "twice" && f.body.is_some()));
		assert_eq!(parser.environment().symbols.classify("hidden"), crate::environment::SymbolKind::Undefined);
	}

	#[test]
	fn read_errors_carry_the_file_name() {
		let lib = ("bad.cal", "1\n2 +\n");
		let (parser, result) = session(vec![lib], "read bad.cal\nread missing.cal\nread\n");
		assert!(matches!(result, Err(CalcError::CompileErrors(3))));
		let shown: Vec<_> = parser.diagnostics().iter().map(ToString::to_string).collect();
		assert_eq!(shown, [
			"\"bad.cal\", line 2: Missing expression",
			"\"main\", line 2: Cannot open \"missing.cal\"",
			"\"main\", line 3: Filename expected",
		]);
	}

	#[test]
	fn read_depth_is_limited() {
		let config = Config { max_input_depth: 2, ..Config::default() };
		let files = vec![("loop.cal", "read loop.cal\n")];
		let mut parser = Parser::new(config, Files { files, ..Files::default() });
		let result = parser.compile_statement_stream(Box::new(StrSource::new("main", "read loop.cal\n")));
		assert!(matches!(result, Err(CalcError::CompileErrors(1))));
		assert_eq!(parser.diagnostics()[0].kind.to_string(), "Maximum input depth reached");
	}

	#[test]
	fn help_and_write() {
		let (parser, _) = session(vec![], "help\nhelp define\n");
		assert_eq!(parser.host().help, ["help", "define"]);
		let (parser, result) = session(vec![], "write out.cal\n");
		assert!(result.is_err());
		assert_eq!(parser.diagnostics()[0].kind.to_string(), "Error writing \"out.cal\"");
		let (parser, _) = session(vec![], "write out.cal extra\n");
		assert_eq!(parser.diagnostics()[0].kind.to_string(), "Missing semicolon after filename");
	}
}
