pub mod parser;
pub mod scanner;

use parser::ParseErrorType;
use scanner::ScanErrorType;

/// CalcError is the top-level error type of the compiler driver.
#[derive(thiserror::Error, Debug)]
pub enum CalcError {
	/// Internal compiler error, should never happen
	#[error("CompilerInternalError: {0}")]
	InternalError(#[from] anyhow::Error),
	/// Units of the input that failed to compile
	#[error("Generated {0} compile errors")]
	CompileErrors(usize),
	/// Compilation stopped before the end of the input
	#[error(transparent)]
	Aborted(#[from] Abort),
}

/// Errors that stop the current compilation unit at once.
#[derive(thiserror::Error, Debug)]
pub enum Abort {
	#[error("Too many errors ({0}), compilation aborted")]
	TooManyErrors(usize),
	#[error("Nesting deeper than {0} levels, compilation aborted")]
	TooDeep(usize),
	#[error("CompilerInternalError: {0}")]
	Internal(#[from] anyhow::Error),
}

/// Either kind of recoverable error.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ErrorKind {
	#[error(transparent)]
	Scan(#[from] ScanErrorType),
	#[error(transparent)]
	Parse(#[from] ParseErrorType),
}

/// A recoverable error tagged with where it was found.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[error("\"{input}\", line {line}: {kind}")]
pub struct Diagnostic {
	pub input: String,
	pub line:  usize,
	pub kind:  ErrorKind,
}

impl Diagnostic {
	pub fn new(input: impl Into<String>, line: usize, kind: ErrorKind) -> Self {
		Self { input: input.into(), line, kind }
	}
}
