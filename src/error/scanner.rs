/// A specific scanning error with line number and type.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[error("line {line}: {type}")]
pub struct ScanError {
	/// The line number where the error occurred.
	pub line:   usize,
	/// The type of scanning error.
	pub r#type: ScanErrorType,
}

impl ScanError {
	pub fn new(line: usize, r#type: ScanErrorType) -> Self { Self { line, r#type } }
}

/// Types of scanning errors.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanErrorType {
	/// A character no token starts with.
	UnknownCharacter(char),
	/// `/*` without a closing `*/`.
	UnterminatedComment,
	/// End of line or input inside a string literal.
	UnterminatedString,
	/// Identifier longer than the configured maximum.
	SymbolTooLong,
	/// Text the number parser refuses.
	BadNumber,
	/// Numeric literal longer than the configured maximum.
	NumberTooLong,
}

impl std::fmt::Display for ScanErrorType {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		use ScanErrorType::*;
		match self {
			UnknownCharacter(c) => write!(f, "Unknown token character '{}'", c.escape_debug()),
			UnterminatedComment => write!(f, "Unterminated comment"),
			UnterminatedString => write!(f, "Unterminated string constant"),
			SymbolTooLong => write!(f, "Symbol too long"),
			BadNumber => write!(f, "Badly formatted number"),
			NumberTooLong => write!(f, "Number too long"),
		}
	}
}

impl std::error::Error for ScanErrorType {}
