//! Turns the characters of the current input into tokens.
//!
//! The parser pulls one token at a time and may push the last token back, so
//! the next read returns it again without rescanning. Below that, a
//! one-character pushback lets operators be scanned by maximal munch: read a
//! character, peek at the next, and unread it if it does not extend the
//! operator (`<`, `<<`, `<<=`).
//!
//! Whether an end of line is a token depends on the [`ScanMode`] the grammar
//! rule currently parsing asked for. Statements typed at the top level end at
//! the newline, while a brace-delimited body runs over any number of lines.
//!
//! The scanner does not know the number grammar. It grows a candidate one
//! character at a time and asks the [`NumberParser`] how much of it is a
//! number, stopping once the answer no longer keeps up with the candidate.
mod source;
mod token;

use tracing::debug;
use TokenType::*;

pub use source::{CharSource, StrSource};
pub use token::TokenType;

use self::source::Input;
use crate::{
	environment::{ConstId, NumberParser, StringTable},
	error::{
		parser::ParseErrorType,
		scanner::{ScanError, ScanErrorType},
	},
};

/// How the scanner treats line ends and identifier characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScanMode {
	/// Return end of line as a token instead of skipping it.
	pub newlines:    bool,
	/// Read almost everything as symbol text, used for filenames.
	pub all_symbols: bool,
}

impl ScanMode {
	pub const DEFAULT: Self = Self { newlines: false, all_symbols: false };
	pub const FILENAME: Self = Self { newlines: true, all_symbols: true };
	pub const NEWLINES: Self = Self { newlines: true, all_symbols: false };
}

/// A scanner over a stack of inputs.
pub struct Scanner {
	/// Inputs being read, the last one is current
	inputs:          Vec<Input>,
	mode:            ScanMode,
	/// Last token returned
	current:         TokenType,
	/// Line the last token started on
	token_line:      usize,
	/// Return `current` again on the next read
	rescan:          bool,
	/// Candidate text while probing a number
	numbuf:          std::string::String,
	/// Lexical errors not yet collected by the parser
	errors:          Vec<ScanError>,
	max_symbol_len:  usize,
	max_number_len:  usize,
	max_input_depth: usize,
}

impl Scanner {
	pub fn new(max_symbol_len: usize, max_number_len: usize, max_input_depth: usize) -> Self {
		Self {
			inputs: vec![],
			mode: ScanMode::DEFAULT,
			current: Eof,
			token_line: 0,
			rescan: false,
			numbuf: std::string::String::new(),
			errors: vec![],
			max_symbol_len,
			max_number_len,
			max_input_depth,
		}
	}

	/// Start reading from a new input until it is popped again.
	pub fn push_input(&mut self, source: Box<dyn CharSource>) -> Result<(), ParseErrorType> {
		if self.inputs.len() >= self.max_input_depth {
			return Err(ParseErrorType::InputDepth);
		}
		debug!(input = source.name(), depth = self.inputs.len() + 1, "push input");
		self.inputs.push(Input::new(source));
		self.rescan = false;
		Ok(())
	}

	pub fn pop_input(&mut self) {
		if let Some(input) = self.inputs.pop() {
			debug!(input = input.name(), "pop input");
		}
		self.rescan = false;
	}

	pub fn input_depth(&self) -> usize { self.inputs.len() }

	/// Switch scanning mode, returning the previous one for the caller to restore.
	pub fn set_mode(&mut self, mode: ScanMode) -> ScanMode {
		if mode.newlines != self.mode.newlines {
			if let Some(input) = self.inputs.last_mut() {
				input.set_continuation(!mode.newlines);
			}
		}
		std::mem::replace(&mut self.mode, mode)
	}

	/// Line number of the current input.
	pub fn line(&self) -> usize { self.inputs.last().map_or(0, Input::line) }

	/// Line the last token returned started on.
	pub fn token_line(&self) -> usize { self.token_line }

	/// Name of the current input for diagnostics.
	pub fn input_name(&self) -> &str { self.inputs.last().map_or("", Input::name) }

	pub fn is_terminal(&self) -> bool { self.inputs.last().is_some_and(Input::is_terminal) }

	/// Make the next [`Scanner::next_token`] return the last token again.
	pub fn push_back(&mut self) { self.rescan = true; }

	/// Lexical errors found since the last call.
	pub fn take_errors(&mut self) -> Vec<ScanError> { std::mem::take(&mut self.errors) }

	/// Consume the next raw character if it is `expected`.
	pub fn next_char_is(&mut self, expected: char) -> bool { self.match_next(expected) }

	/// Throw away what is left of the current line.
	pub fn skip_line(&mut self) {
		self.rescan = false;
		if matches!(self.current, NewLine | Eof) {
			return;
		}
		while !matches!(self.next_char(), None | Some('\n')) {}
		self.current = NewLine;
	}

	/// Read the next token.
	pub fn next_token(&mut self, strings: &mut StringTable, numbers: &mut dyn NumberParser) -> TokenType {
		if self.rescan {
			self.rescan = false;
			return self.current.clone();
		}
		let token = self.scan_token(strings, numbers);
		self.current = token.clone();
		token
	}

	/// Scan a single token from the current input
	fn scan_token(&mut self, strings: &mut StringTable, numbers: &mut dyn NumberParser) -> TokenType {
		loop {
			self.token_line = self.line();
			let c = self.next_char();
			if self.mode.all_symbols && !matches!(c, None | Some(' ' | ';' | '"' | '\n')) {
				self.unread(c);
				return self.symbol();
			}
			#[rustfmt::skip]
			let token = match c {
				None => Eof,
				Some(' ' | '\t' | '\r' | '\0') => continue,
				Some('\n') => if self.mode.newlines { NewLine } else { continue },
				Some('{') => LeftBrace,
				Some('}') => RightBrace,
				Some('(') => LeftParen,
				Some(')') => RightParen,
				Some('[') => LeftBracket,
				Some(']') => RightBracket,
				Some(';') => Semicolon,
				Some(':') => Colon,
				Some(',') => Comma,
				Some('?') => Question,
				Some('@') => At,
				Some('`') => Backquote,
				Some('$') => Dollar,
				Some(quote @ ('"' | '\'')) => self.string(quote, strings),
				Some('^') => if self.match_next('=') { PowerEquals } else { Power },
				Some('=') => if self.match_next('=') { Eq } else { Assign },
				Some('+') => {
					if self.match_next('+') { PlusPlus } else if self.match_next('=') { PlusEquals } else { Plus }
				}
				Some('-') => {
					if self.match_next('-') { MinusMinus }
					else if self.match_next('=') { MinusEquals }
					else if self.match_next('>') { Arrow }
					else { Minus }
				}
				Some('*') => {
					if self.match_next('=') { MultEquals }
					else if self.match_next('*') { if self.match_next('=') { PowerEquals } else { Power } }
					else { Mult }
				}
				Some('/') => {
					if self.match_next('/') { if self.match_next('=') { SlashSlashEquals } else { SlashSlash } }
					else if self.match_next('=') { DivEquals }
					else if self.match_next('*') { self.comment(); continue }
					else { Div }
				}
				Some('%') => if self.match_next('=') { ModEquals } else { Mod },
				Some('<') => {
					if self.match_next('=') { Le }
					else if self.match_next('<') { if self.match_next('=') { LeftShiftEquals } else { LeftShift } }
					else { Lt }
				}
				Some('>') => {
					if self.match_next('=') { Ge }
					else if self.match_next('>') { if self.match_next('=') { RightShiftEquals } else { RightShift } }
					else { Gt }
				}
				Some('&') => if self.match_next('&') { AndAnd } else if self.match_next('=') { AndEquals } else { And },
				Some('|') => if self.match_next('|') { OrOr } else if self.match_next('=') { OrEquals } else { Or },
				Some('!') => if self.match_next('=') { Ne } else { Not },
				Some('#') => if self.match_next('=') { HashEquals } else { Hash },
				Some('~') => if self.match_next('=') { TildeEquals } else { Tilde },
				Some('\\') => {
					// backslash-newline joins lines
					if self.match_next('\n') { continue }
					if self.match_next('=') { BackslashEquals } else { Backslash }
				}
				Some(c) if c.is_ascii_alphabetic() || c == '_' => {
					self.unread(Some(c));
					self.symbol()
				}
				Some(c) if c.is_ascii_digit() || c == '.' => {
					self.unread(Some(c));
					self.number(numbers)
				}
				Some(c) => {
					self.error(ScanErrorType::UnknownCharacter(c));
					continue;
				}
			};
			return token;
		}
	}

	fn next_char(&mut self) -> Option<char> { self.inputs.last_mut()?.next_char() }

	fn unread(&mut self, c: Option<char>) {
		if let Some(input) = self.inputs.last_mut() {
			input.unread(c);
		}
	}

	/// Match the next character if it is the expected one
	fn match_next(&mut self, expected: char) -> bool {
		let c = self.next_char();
		c == Some(expected) || {
			self.unread(c);
			false
		}
	}

	fn error(&mut self, r#type: ScanErrorType) { self.errors.push(ScanError::new(self.line(), r#type)); }

	/// Skip the rest of a `/* */` comment.
	fn comment(&mut self) {
		loop {
			match self.next_char() {
				Some('*') if self.match_next('/') => return,
				Some(_) => {}
				None => {
					self.error(ScanErrorType::UnterminatedComment);
					return;
				}
			}
		}
	}

	/// Scan a string literal up to the matching quote.
	fn string(&mut self, quote: char, strings: &mut StringTable) -> TokenType {
		let mut text = std::string::String::new();
		loop {
			let c = self.next_char();
			match c {
				Some(c) if c == quote => break,
				Some('\n') if !self.mode.newlines => text.push('\n'),
				None | Some('\n') => {
					self.unread(c);
					self.error(ScanErrorType::UnterminatedString);
					break;
				}
				Some('\\') => {
					#[rustfmt::skip]
					let escaped = match self.next_char() {
						Some('n') => '\n',
						Some('r') => '\r',
						Some('t') => '\t',
						Some('b') => '\u{8}',
						Some('f') => '\u{c}',
						Some('v') => '\u{b}',
						Some('a') => '\u{7}',
						Some('e') => '\u{1b}',
						Some('\n') => continue,
						Some('x') => self.escape_digits(16, 0),
						Some(d @ '0'..='7') => self.escape_digits(8, d as u32 - '0' as u32),
						Some(c) => c,
						None => continue,
					};
					text.push(escaped);
				}
				Some(c) => text.push(c),
			}
		}
		String(strings.intern(&text))
	}

	/// Up to two more digits of a numeric escape.
	fn escape_digits(&mut self, radix: u32, mut value: u32) -> char {
		for _ in 0..2 {
			let c = self.next_char();
			match c.and_then(|c| c.to_digit(radix)) {
				Some(digit) => value = value * radix + digit,
				None => {
					self.unread(c);
					break;
				}
			}
		}
		char::from((value & 0xff) as u8)
	}

	/// Scan an identifier or keyword, or a filename in filename mode.
	fn symbol(&mut self) -> TokenType {
		let all_symbols = self.mode.all_symbols;
		let mut text = std::string::String::new();
		let mut length = 0;
		loop {
			let c = self.next_char();
			match c {
				Some(ch) if all_symbols && !matches!(ch, ' ' | ';' | '\n') => {}
				Some(ch) if !all_symbols && (ch.is_ascii_alphanumeric() || ch == '_') => {}
				_ => {
					self.unread(c);
					break;
				}
			}
			if length < self.max_symbol_len {
				text.extend(c);
			}
			length += 1;
		}
		if length > self.max_symbol_len {
			self.error(ScanErrorType::SymbolTooLong);
		}
		if all_symbols { Symbol(text) } else { TokenType::keyword_or_symbol(&text) }
	}

	/// Scan a numeric literal by growing it while the number parser keeps
	/// accepting every character.
	fn number(&mut self, numbers: &mut dyn NumberParser) -> TokenType {
		self.numbuf.clear();
		let consumed = loop {
			if self.numbuf.len() >= self.max_number_len {
				self.error(ScanErrorType::NumberTooLong);
				loop {
					let c = self.next_char();
					if !c.is_some_and(|c| c.is_ascii_alphanumeric() || c == '.') {
						self.unread(c);
						break;
					}
				}
				return Number(ConstId::ZERO);
			}
			let c = self.next_char();
			let Some(ch) = c else { break self.numbuf.len() };
			self.numbuf.push(ch);
			if self.numbuf.len() == 2 && self.numbuf.starts_with('.') && ch.is_ascii_alphabetic() {
				self.unread(c);
				return Period;
			}
			match numbers.probe(&self.numbuf, true) {
				Ok(n) if n == self.numbuf.len() => {}
				Ok(n) => break n,
				Err(_) => {
					self.unread(c);
					self.error(ScanErrorType::BadNumber);
					return Number(ConstId::ZERO);
				}
			}
		};
		let suffix: Vec<char> = self.numbuf[consumed..].chars().collect();
		for c in suffix.into_iter().rev() {
			self.unread(Some(c));
		}
		self.numbuf.truncate(consumed);

		if self.numbuf == "." {
			return OldValue;
		}
		let imaginary = self.numbuf.ends_with(['i', 'I']);
		if imaginary {
			self.numbuf.pop();
		}
		let id = match numbers.intern(&self.numbuf) {
			Ok(id) => id,
			Err(_) => {
				self.error(ScanErrorType::BadNumber);
				ConstId::ZERO
			}
		};
		if imaginary { Imaginary(id) } else { Number(id) }
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::environment::ConstantTable;

	struct Fixture {
		scanner: Scanner,
		strings: StringTable,
		numbers: ConstantTable,
	}

	impl Fixture {
		fn new(input: &str, mode: ScanMode) -> Self {
			let mut scanner = Scanner::new(16, 64, 4);
			scanner.push_input(Box::new(StrSource::new("test", input))).unwrap();
			scanner.set_mode(mode);
			Self { scanner, strings: StringTable::default(), numbers: ConstantTable::default() }
		}

		fn next(&mut self) -> TokenType { self.scanner.next_token(&mut self.strings, &mut self.numbers) }

		fn all(&mut self) -> Vec<TokenType> {
			let mut tokens = vec![];
			loop {
				let token = self.next();
				if token == Eof {
					return tokens;
				}
				tokens.push(token);
			}
		}

		fn number_text(&self, token: &TokenType) -> &str {
			match token {
				Number(id) | Imaginary(id) => self.numbers.text(*id).unwrap(),
				other => panic!("not a number: {other:?}"),
			}
		}

		fn string_text(&self, token: &TokenType) -> &str {
			match token {
				String(id) => self.strings.get(*id).unwrap(),
				other => panic!("not a string: {other:?}"),
			}
		}
	}

	fn scan(input: &str, expected: &[TokenType]) {
		let mut fixture = Fixture::new(input, ScanMode::DEFAULT);
		assert_eq!(fixture.all(), expected, "scanning {input:?}");
		assert!(fixture.scanner.take_errors().is_empty(), "errors scanning {input:?}");
	}

	fn scan_error(input: &str, expected: ScanErrorType) {
		let mut fixture = Fixture::new(input, ScanMode::DEFAULT);
		fixture.all();
		let errors = fixture.scanner.take_errors();
		assert_eq!(errors.first().map(|e| &e.r#type), Some(&expected), "scanning {input:?}");
	}

	#[test]
	fn scan_operators() {
		scan("( ) [ ] { } ; : , ?", &[LeftParen, RightParen, LeftBracket, RightBracket, LeftBrace, RightBrace, Semicolon, Colon, Comma, Question]);
		scan("+ ++ += - -- -= ->", &[Plus, PlusPlus, PlusEquals, Minus, MinusMinus, MinusEquals, Arrow]);
		scan("* ** **= *= ^ ^=", &[Mult, Power, PowerEquals, MultEquals, Power, PowerEquals]);
		scan("/ // //= /=", &[Div, SlashSlash, SlashSlashEquals, DivEquals]);
		scan("< << <<= <= > >> >>= >=", &[Lt, LeftShift, LeftShiftEquals, Le, Gt, RightShift, RightShiftEquals, Ge]);
		scan("& && &= | || |= ! != = ==", &[And, AndAnd, AndEquals, Or, OrOr, OrEquals, Not, Ne, Assign, Eq]);
		scan("# #= ~ ~= \\ \\= % %= @ ` $", &[
			Hash,
			HashEquals,
			Tilde,
			TildeEquals,
			Backslash,
			BackslashEquals,
			Mod,
			ModEquals,
			At,
			Backquote,
			Dollar,
		]);
	}

	#[test]
	fn scan_maximal_munch() {
		scan("a+++b", &[Symbol("a".into()), PlusPlus, Plus, Symbol("b".into())]);
		scan("x<<=-1", &[Symbol("x".into()), LeftShiftEquals, Minus, Number(ConstId::ONE)]);
		scan("a//=b", &[Symbol("a".into()), SlashSlashEquals, Symbol("b".into())]);
	}

	#[test]
	fn scan_keywords() {
		scan("if else for while do continue break goto return", &[If, Else, For, While, Do, Continue, Break, Goto, Return]);
		scan("local global static switch case default", &[Local, Global, Static, Switch, Case, Default]);
		scan("quit exit define read show help write mat obj print cd", &[
			Quit, Quit, Define, Read, Show, Help, Write, Mat, Obj, Print, Cd,
		]);
		scan("iff _x x1 undefine", &[
			Symbol("iff".into()),
			Symbol("_x".into()),
			Symbol("x1".into()),
			Symbol("undefine".into()),
		]);
	}

	#[test]
	fn scan_comments_and_whitespace() {
		scan("a /* note ** here **/ b", &[Symbol("a".into()), Symbol("b".into())]);
		scan("\t\r a \0", &[Symbol("a".into())]);
		scan("a\\\nb", &[Symbol("a".into()), Symbol("b".into())]);
		scan_error("/* open", ScanErrorType::UnterminatedComment);
		scan_error("a § b", ScanErrorType::UnknownCharacter('§'));
	}

	#[test]
	fn scan_newline_modes() {
		let mut fixture = Fixture::new("a\nb", ScanMode::DEFAULT);
		assert_eq!(fixture.all(), vec![Symbol("a".into()), Symbol("b".into())]);
		let mut fixture = Fixture::new("a\nb", ScanMode::NEWLINES);
		assert_eq!(fixture.all(), vec![Symbol("a".into()), NewLine, Symbol("b".into())]);
	}

	#[test]
	fn scan_filename_mode() {
		let mut fixture = Fixture::new(" lib/my-file.cal;", ScanMode::FILENAME);
		assert_eq!(fixture.next(), Symbol("lib/my-file.cal".into()));
		assert_eq!(fixture.next(), Semicolon);
		let mut fixture = Fixture::new("\"with space.cal\"\n", ScanMode::FILENAME);
		let token = fixture.next();
		assert_eq!(fixture.string_text(&token), "with space.cal");
		assert_eq!(fixture.next(), NewLine);
	}

	#[test]
	fn scan_numbers() {
		let mut fixture = Fixture::new("12 3.25 .5 1e10 0x1F 0b101 7i 2.5I", ScanMode::DEFAULT);
		let tokens = fixture.all();
		let texts: Vec<&str> = tokens.iter().map(|t| fixture.number_text(t)).collect();
		assert_eq!(texts, ["12", "3.25", ".5", "1e10", "0x1F", "0b101", "7", "2.5"]);
		assert!(matches!(tokens[6], Imaginary(_)));
		assert!(matches!(tokens[7], Imaginary(_)));
		assert!(matches!(tokens[0], Number(_)));
	}

	#[test]
	fn scan_number_suffix_is_unread() {
		let mut fixture = Fixture::new("12+x 3if", ScanMode::DEFAULT);
		let token = fixture.next();
		assert_eq!(fixture.number_text(&token), "12");
		assert_eq!(fixture.next(), Plus);
		assert_eq!(fixture.next(), Symbol("x".into()));
		let token = fixture.next();
		assert!(matches!(token, Imaginary(_)));
		assert_eq!(fixture.number_text(&token), "3");
		assert_eq!(fixture.next(), Symbol("f".into()));
	}

	#[test]
	fn scan_period_and_old_value() {
		scan("a.b", &[Symbol("a".into()), Period, Symbol("b".into())]);
		scan(". + 1", &[OldValue, Plus, Number(ConstId::ONE)]);
	}

	#[test]
	fn scan_number_too_long() {
		let digits = "9".repeat(100);
		scan_error(&digits, ScanErrorType::NumberTooLong);
		let mut fixture = Fixture::new(&format!("{digits};"), ScanMode::DEFAULT);
		assert_eq!(fixture.all(), vec![Number(ConstId::ZERO), Semicolon]);
	}

	#[test]
	fn scan_strings() {
		let mut fixture = Fixture::new(r#""a\tb" 'it''s' "\x41\101\7" "one\
two" "q\"q""#, ScanMode::DEFAULT);
		let tokens = fixture.all();
		let texts: Vec<&str> = tokens.iter().map(|t| fixture.string_text(t)).collect();
		assert_eq!(texts, ["a\tb", "it", "s", "AA\u{7}", "onetwo", "q\"q"]);
	}

	#[test]
	fn scan_unterminated_string() {
		scan_error("\"abc", ScanErrorType::UnterminatedString);
		let mut fixture = Fixture::new("\"abc\nx", ScanMode::NEWLINES);
		let token = fixture.next();
		assert_eq!(fixture.string_text(&token), "abc");
		assert_eq!(fixture.next(), NewLine);
		assert_eq!(fixture.scanner.take_errors()[0].r#type, ScanErrorType::UnterminatedString);
	}

	#[test]
	fn scan_symbol_too_long() {
		let mut fixture = Fixture::new("abcdefghijklmnopqrst", ScanMode::DEFAULT);
		assert_eq!(fixture.all(), vec![Symbol("abcdefghijklmnop".into())]);
		assert_eq!(fixture.scanner.take_errors()[0].r#type, ScanErrorType::SymbolTooLong);
	}

	#[test]
	fn push_back_returns_same_token() {
		let mut fixture = Fixture::new("alpha + 1", ScanMode::DEFAULT);
		assert_eq!(fixture.next(), Symbol("alpha".into()));
		fixture.scanner.push_back();
		fixture.scanner.push_back();
		assert_eq!(fixture.next(), Symbol("alpha".into()));
		assert_eq!(fixture.next(), Plus);
	}

	#[test]
	fn label_colon_lookahead() {
		let mut fixture = Fixture::new("done: x", ScanMode::DEFAULT);
		assert_eq!(fixture.next(), Symbol("done".into()));
		assert!(fixture.scanner.next_char_is(':'));
		assert!(!fixture.scanner.next_char_is(':'));
		assert_eq!(fixture.next(), Symbol("x".into()));
	}

	#[test]
	fn input_depth_is_bounded() {
		let mut scanner = Scanner::new(8, 8, 2);
		assert!(scanner.push_input(Box::new(StrSource::new("a", ""))).is_ok());
		assert!(scanner.push_input(Box::new(StrSource::new("b", ""))).is_ok());
		assert_eq!(scanner.push_input(Box::new(StrSource::new("c", ""))), Err(ParseErrorType::InputDepth));
		assert_eq!(scanner.input_name(), "b");
		scanner.pop_input();
		assert_eq!(scanner.input_name(), "a");
	}
}
