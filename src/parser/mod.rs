//! The `Parser` pulls tokens from the `Scanner` and emits code for the stack
//! machine as it recognizes each construct. There is no syntax tree: every
//! grammar rule writes its instructions straight into the function under
//! construction, and jumps to places not parsed yet go through a [`Label`].
//!
//! |Name|Operators|Associates
//! --|--|--
//! Assignment|= += -= *= /= //= %= &= \|= <<= >>= ^=|Right
//! Conditional|?:|Right
//! Or|\|\||Left
//! And|&&|Left
//! Relation|== != < > <= >=|None
//! Sum|+ -|Left
//! Product|* / // %|Left
//! Bitwise or|\||Left
//! Bitwise and|&|Left
//! Shift and power|<< >> ^|Right
//! Postfix|++ -- !|
//! Unary|! - + ++ --|Right
//!
//! Expression grammar:
//!
//! ``` BNF
//! exprlist   → assignment ( "," assignment )* ;
//! assignment → altcond ( ASSIGNOP ( assignment | initlist ) )? ;
//! altcond    → orcond ( "?" altcond ":" altcond )? ;
//! orcond     → andcond ( "||" andcond )* ;
//! andcond    → relation ( "&&" relation )* ;
//! relation   → sum ( RELOP sum )? ;
//! sum        → product ( ( "+" | "-" ) product )* ;
//! product    → orexpr ( ( "*" | "/" | "//" | "%" ) orexpr )* ;
//! orexpr     → andexpr ( "|" andexpr )* ;
//! andexpr    → shift ( "&" shift )* ;
//! shift      → term ( "++" | "--" )? "!"? ( ( "^" | "<<" | ">>" ) shift )? ;
//! term       → NUMBER | IMAGINARY | STRING | "." | "(" exprlist ")"
//!            | ( "++" | "--" | "!" | "-" | "+" ) term
//!            | "mat" matrix | "obj" object | idexpr ;
//! idexpr     → SYMBOL ( "(" callargs ")" )? ( "[" matargs "]" | "." SYMBOL )* ;
//! ```
//!
//! Statements, declarations and the commands around them live in their own
//! modules. All of them report recoverable errors through [`Parser::error`],
//! which skips ahead to a token the caller can resume from. Errors that end
//! the unit at once travel up as [`Abort`].
mod command;
mod declaration;
mod expression;
mod statement;

use std::ops::BitOr;

use tracing::{debug, warn};
use TokenType::*;

use crate::{
	bytecode::{Function, FunctionBuilder, FunctionKind, Label},
	config::Config,
	environment::Environment,
	error::{parser::ParseErrorType, Abort, CalcError, Diagnostic, ErrorKind},
	host::Host,
	scanner::{CharSource, ScanMode, Scanner, StrSource, TokenType},
};

type ParseResult<T = ()> = Result<T, Abort>;

/// What an expression left on the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ExprFlags(u8);

impl ExprFlags {
	/// An address that may be assigned through.
	const ADDRESS: Self = Self(0);
	const ASSIGN: Self = Self(4);
	const CONST: Self = Self(2);
	/// A plain value.
	const RVALUE: Self = Self(1);

	fn is_rvalue(self) -> bool { self.0 & Self::RVALUE.0 != 0 }

	fn is_assign(self) -> bool { self.0 & Self::ASSIGN.0 != 0 }
}

impl BitOr for ExprFlags {
	type Output = Self;

	fn bitor(self, rhs: Self) -> Self { Self(self.0 | rhs.0) }
}

/// Where to resume after a recoverable error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Skip {
	/// Right where the error was found.
	None,
	/// At the next comma or end of statement.
	Comma,
	/// At the end of the statement.
	Statement,
}

impl Skip {
	fn is_boundary(self, token: &TokenType) -> bool {
		match self {
			Skip::None => true,
			Skip::Comma => matches!(token, Comma | NewLine | Semicolon | LeftBrace | RightBrace | Eof),
			Skip::Statement => matches!(token, NewLine | Semicolon | LeftBrace | RightBrace | Eof),
		}
	}
}

/// Jump targets of the statements enclosing the one being parsed.
#[derive(Default)]
struct Targets<'l> {
	cont:      Option<&'l mut Label>,
	brk:       Option<&'l mut Label>,
	next_case: Option<&'l mut Label>,
	default:   Option<&'l mut Label>,
}

impl Targets<'_> {
	fn reborrow(&mut self) -> Targets<'_> {
		Targets {
			cont:      self.cont.as_deref_mut(),
			brk:       self.brk.as_deref_mut(),
			next_case: self.next_case.as_deref_mut(),
			default:   self.default.as_deref_mut(),
		}
	}

	/// Targets for a statement nested in another, where `case` no longer applies.
	fn loops(&mut self) -> Targets<'_> {
		Targets { cont: self.cont.as_deref_mut(), brk: self.brk.as_deref_mut(), next_case: None, default: None }
	}

	fn in_loop(&self) -> bool { self.cont.is_some() || self.brk.is_some() }
}

/// A compiler session.
///
/// One parser compiles everything typed or read in a session, so globals,
/// functions and object types defined by one unit are known to the next.
/// A unit is one top-level evaluation or one `define`.
pub struct Parser<H: Host> {
	scanner:       Scanner,
	env:           Environment,
	config:        Config,
	host:          H,
	/// Function under construction
	function:      FunctionBuilder,
	/// Errors in the current unit
	error_count:   usize,
	/// Errors in failed units of the current stream
	stream_errors: usize,
	depth:         usize,
	diagnostics:   Vec<Diagnostic>,
}

impl<H: Host> Parser<H> {
	pub fn new(config: Config, host: H) -> Self { Self::with_environment(config, host, Environment::default()) }

	pub fn with_environment(config: Config, host: H, env: Environment) -> Self {
		Self {
			scanner: Scanner::new(config.max_symbol_len, config.max_number_len, config.max_input_depth),
			env,
			config,
			host,
			function: FunctionBuilder::new("*", FunctionKind::TopLevel),
			error_count: 0,
			stream_errors: 0,
			depth: 0,
			diagnostics: vec![],
		}
	}

	/// Compile and run every command of `source` until it is exhausted.
	///
	/// Fails with the number of errors in the units that did not compile,
	/// or with the reason compilation stopped early.
	pub fn compile_statement_stream(&mut self, source: Box<dyn CharSource>) -> Result<(), CalcError> {
		self.scanner.push_input(source).map_err(|e| anyhow::anyhow!("{e}"))?;
		self.stream_errors = 0;
		self.env.symbols.enter_file_scope();
		let result = self.commands();
		self.env.symbols.exit_file_scope();
		self.scanner.pop_input();
		self.stream_errors += std::mem::take(&mut self.error_count);
		result?;
		match self.stream_errors {
			0 => Ok(()),
			errors => Err(CalcError::CompileErrors(errors)),
		}
	}

	/// Compile the statements up to the end of the line as an anonymous
	/// function and run it. A nested evaluation reads to the end of its
	/// input instead. Returns whether the code compiled and ran.
	pub fn compile_interactive_line(&mut self, nested: bool) -> Result<bool, Abort> {
		let (name, kind) = if nested { ("**", FunctionKind::NestedEval) } else { ("*", FunctionKind::TopLevel) };
		self.begin_unit(name, kind);
		let mode = if nested { self.scanner.set_mode(ScanMode::DEFAULT) } else { self.scanner.set_mode(ScanMode::NEWLINES) };
		let result = self.top_level_statements();
		self.scanner.set_mode(mode);
		result?;
		let Some(function) = self.end_unit()? else { return Ok(false) };
		debug!(kind = ?function.kind(), ops = function.code().len(), "execute");
		if let Err(error) = self.host.execute(&function, &self.env) {
			eprintln!("{error:#}");
			return Ok(false);
		}
		Ok(true)
	}

	/// Compile and run `text` as a nested evaluation.
	pub fn eval_string(&mut self, text: &str) -> Result<bool, Abort> {
		if let Err(error) = self.scanner.push_input(Box::new(StrSource::new("eval", text))) {
			self.report(self.scanner.line(), error.into())?;
			return Ok(false);
		}
		let result = self.compile_interactive_line(true);
		self.scanner.pop_input();
		result
	}

	pub fn diagnostics(&self) -> &[Diagnostic] { &self.diagnostics }

	pub fn environment(&self) -> &Environment { &self.env }

	pub fn environment_mut(&mut self) -> &mut Environment { &mut self.env }

	pub fn config(&self) -> &Config { &self.config }

	pub fn host(&self) -> &H { &self.host }

	pub fn host_mut(&mut self) -> &mut H { &mut self.host }

	/// Start a new unit with a fresh function and error count.
	fn begin_unit(&mut self, name: &str, kind: FunctionKind) {
		self.stream_errors += std::mem::take(&mut self.error_count);
		self.depth = 0;
		self.function = FunctionBuilder::new(name, kind);
		self.env.symbols.begin_function();
	}

	/// Finish the current unit, unless it had errors.
	fn end_unit(&mut self) -> ParseResult<Option<Function>> {
		for name in self.function.undefined_labels() {
			self.error(ParseErrorType::UndefinedLabel(name), Skip::None)?;
		}
		if self.error_count > 0 {
			debug!(unit = self.function.name(), errors = self.error_count, "unit failed");
			return Ok(None);
		}
		let symbols = &self.env.symbols;
		Ok(Some(self.function.finish(symbols.param_count(), symbols.local_count())?))
	}

	fn is_anonymous(&self) -> bool { self.function.kind().is_anonymous() }

	/// Next token, reporting any lexical errors found scanning it.
	fn next(&mut self) -> ParseResult<TokenType> {
		let token = self.scanner.next_token(&mut self.env.strings, self.env.numbers.as_mut());
		for error in self.scanner.take_errors() {
			self.report(error.line, error.r#type.into())?;
		}
		Ok(token)
	}

	fn push_back(&mut self) { self.scanner.push_back(); }

	/// Consume the next token if `matches` accepts it.
	fn next_if(&mut self, matches: impl FnOnce(&TokenType) -> bool) -> ParseResult<bool> {
		let token = self.next()?;
		if matches(&token) {
			return Ok(true);
		}
		self.push_back();
		Ok(false)
	}

	/// Count and print an error, then skip to where parsing can resume.
	fn error(&mut self, kind: ParseErrorType, skip: Skip) -> ParseResult {
		self.report(self.scanner.token_line(), kind.into())?;
		self.resync(skip)
	}

	fn report(&mut self, line: usize, kind: ErrorKind) -> ParseResult {
		let diagnostic = Diagnostic::new(self.scanner.input_name(), line, kind);
		eprintln!("{diagnostic}");
		self.diagnostics.push(diagnostic);
		self.error_count += 1;
		if self.config.too_many_errors(self.error_count) {
			warn!(errors = self.error_count, "too many errors");
			return Err(Abort::TooManyErrors(self.error_count));
		}
		Ok(())
	}

	/// Skip tokens up to a boundary of `skip`, leaving it to be read again.
	fn resync(&mut self, skip: Skip) -> ParseResult {
		if skip == Skip::None {
			return Ok(());
		}
		self.push_back();
		loop {
			let token = self.next()?;
			if skip.is_boundary(&token) {
				self.push_back();
				return Ok(());
			}
		}
	}

	/// Run a recursive rule one level deeper, refusing to go past the limit.
	fn nested<T>(&mut self, rule: impl FnOnce(&mut Self) -> ParseResult<T>) -> ParseResult<T> {
		if self.depth >= self.config.max_depth {
			return Err(Abort::TooDeep(self.config.max_depth));
		}
		self.depth += 1;
		let result = rule(self);
		self.depth -= 1;
		result
	}
}

#[cfg(test)]
mod tests {
	use super::{Abort, CalcError, Config, Environment, ExprFlags, Function, Host, Parser, Skip, StrSource, TokenType};
	use crate::{bytecode::Op, environment::ConstId};

	/// Host keeping every function it is given.
	#[derive(Default)]
	pub(super) struct Recorder {
		pub executed: Vec<Function>,
		pub defined:  Vec<Function>,
	}

	impl Host for Recorder {
		fn execute(&mut self, function: &Function, _env: &Environment) -> anyhow::Result<()> {
			self.executed.push(function.clone());
			Ok(())
		}

		fn function_defined(&mut self, function: &Function, _env: &Environment) { self.defined.push(function.clone()) }
	}

	pub(super) fn compile(input: &str) -> Parser<Recorder> {
		let mut parser = Parser::new(Config::default(), Recorder::default());
		let _ = parser.compile_statement_stream(Box::new(StrSource::new("test", input)));
		parser
	}

	/// Code of the last unit that ran.
	pub(super) fn last_code(input: &str) -> Vec<Op> {
		let parser = compile(input);
		assert!(parser.diagnostics().is_empty(), "{input}: {:?}", parser.diagnostics());
		parser.host().executed.last().expect("nothing ran").code().to_vec()
	}

	/// Like [`last_code`] without the line markers.
	pub(super) fn code(input: &str) -> Vec<Op> {
		last_code(input).into_iter().filter(|op| !matches!(op, Op::Debug(_))).collect()
	}

	pub(super) fn errors(input: &str) -> Vec<std::string::String> {
		compile(input).diagnostics().iter().map(|d| d.kind.to_string()).collect()
	}

	pub(super) fn num(parser: &Parser<Recorder>, text: &str) -> ConstId {
		(0..1000)
			.map(ConstId)
			.find(|&id| parser.environment().numbers.text(id) == Some(text))
			.expect("constant not interned")
	}

	#[test]
	fn flags() {
		assert!(ExprFlags::RVALUE.is_rvalue());
		assert!(!ExprFlags::ADDRESS.is_rvalue());
		assert!((ExprFlags::RVALUE | ExprFlags::ASSIGN).is_assign());
		assert!(!(ExprFlags::RVALUE | ExprFlags::CONST).is_assign());
	}

	#[test]
	fn resync_boundaries() {
		assert!(Skip::Comma.is_boundary(&TokenType::Comma));
		assert!(!Skip::Statement.is_boundary(&TokenType::Comma));
		assert!(Skip::Statement.is_boundary(&TokenType::RightBrace));
		assert!(!Skip::Statement.is_boundary(&TokenType::Plus));
	}

	#[test]
	fn errors_carry_input_and_line() {
		let parser = compile("1\n2 +\n");
		let diagnostic = &parser.diagnostics()[0];
		assert_eq!(diagnostic.to_string(), "\"test\", line 2: Missing expression");
		assert_eq!(parser.host().executed.len(), 1);
	}

	#[test]
	fn error_ceiling_aborts() {
		let config = Config { max_errors: 2, ..Config::default() };
		let mut parser = Parser::new(config, Recorder::default());
		let result = parser.compile_statement_stream(Box::new(StrSource::new("t", "); ); ); );\n1\n")));
		assert!(matches!(result, Err(CalcError::Aborted(Abort::TooManyErrors(3)))));
		assert_eq!(parser.diagnostics().len(), 3);
		assert!(parser.host().executed.is_empty());
	}

	#[test]
	fn depth_limit() {
		let config = Config { max_depth: 16, ..Config::default() };
		let mut parser = Parser::new(config, Recorder::default());
		let deep = format!("{}1{}\n", "(".repeat(40), ")".repeat(40));
		let result = parser.compile_statement_stream(Box::new(StrSource::new("t", &deep)));
		assert!(matches!(result, Err(CalcError::Aborted(Abort::TooDeep(16)))));
	}
}
