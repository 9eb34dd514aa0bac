use std::collections::HashMap;

use super::ConstId;

impl ConstId {
	pub const ONE: Self = Self(1);
	pub const ZERO: Self = Self(0);
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum NumberError {
	#[error("text does not start a number")]
	NotANumber,
	#[error("malformed number \"{0}\"")]
	Malformed(String),
}

/// The numeric library as seen by the scanner.
///
/// The scanner never decides what a number looks like. It asks [`probe`]
/// how many leading characters of a growing candidate form a number and
/// stops growing the candidate once the answer falls behind.
///
/// [`probe`]: NumberParser::probe
pub trait NumberParser {
	/// Length of the number at the start of `text`, counting a trailing
	/// `i`/`I` when `imaginary` is set.
	fn probe(&self, text: &str, imaginary: bool) -> Result<usize, NumberError>;

	/// Intern a complete number, without any imaginary suffix.
	fn intern(&mut self, text: &str) -> Result<ConstId, NumberError>;

	/// Intern a non-negative integer produced by the compiler itself.
	fn intern_integer(&mut self, value: usize) -> ConstId;

	/// Source text of an interned constant.
	fn text(&self, id: ConstId) -> Option<&str>;
}

/// Constants kept as their source text.
///
/// Accepts decimal numbers with an optional fraction and exponent, `0x`
/// hexadecimal and `0b` binary integers. A dangling exponent marker (`1e`)
/// is read as if the exponent were absent.
#[derive(Debug)]
pub struct ConstantTable {
	constants: Vec<String>,
	index:     HashMap<String, ConstId>,
}

impl Default for ConstantTable {
	fn default() -> Self {
		let mut table = Self { constants: vec![], index: HashMap::new() };
		table.insert("0");
		table.insert("1");
		table
	}
}

impl ConstantTable {
	fn insert(&mut self, text: &str) -> ConstId {
		if let Some(&id) = self.index.get(text) {
			return id;
		}
		let id = ConstId::from_index(self.constants.len());
		self.constants.push(text.to_string());
		self.index.insert(text.to_string(), id);
		id
	}

	pub fn len(&self) -> usize { self.constants.len() }

	pub fn is_empty(&self) -> bool { self.constants.is_empty() }
}

impl NumberParser for ConstantTable {
	fn probe(&self, text: &str, imaginary: bool) -> Result<usize, NumberError> {
		let bytes = text.as_bytes();
		let digits = |from: usize, radix: u32| {
			from + bytes[from..].iter().take_while(|&&b| char::from(b).is_digit(radix)).count()
		};

		let mut end;
		if bytes.len() >= 2 && bytes[0] == b'0' && matches!(bytes[1], b'x' | b'X' | b'b' | b'B') {
			let radix = if matches!(bytes[1], b'x' | b'X') { 16 } else { 2 };
			end = digits(2, radix);
		} else {
			end = digits(0, 10);
			if bytes.get(end) == Some(&b'.') {
				end = digits(end + 1, 10);
			}
			if end == 0 {
				return Err(NumberError::NotANumber);
			}
			let has_digits = bytes[..end].iter().any(u8::is_ascii_digit);
			if has_digits && matches!(bytes.get(end), Some(b'e' | b'E')) {
				let mut exponent = end + 1;
				if matches!(bytes.get(exponent), Some(b'+' | b'-')) {
					exponent += 1;
				}
				end = digits(exponent, 10);
			}
		}
		if imaginary && matches!(bytes.get(end), Some(b'i' | b'I')) {
			end += 1;
		}
		Ok(end)
	}

	fn intern(&mut self, text: &str) -> Result<ConstId, NumberError> {
		if text.is_empty() || text == "." || self.probe(text, false)? != text.len() {
			return Err(NumberError::Malformed(text.to_string()));
		}
		Ok(self.insert(text))
	}

	fn intern_integer(&mut self, value: usize) -> ConstId { self.insert(&value.to_string()) }

	fn text(&self, id: ConstId) -> Option<&str> { self.constants.get(id.index()).map(String::as_str) }
}

#[cfg(test)]
mod tests {
	use super::*;

	fn probe(text: &str, consumed: usize) {
		let table = ConstantTable::default();
		assert_eq!(table.probe(text, true), Ok(consumed), "probing {text:?}");
	}

	#[test]
	fn probe_lengths() {
		probe("1", 1);
		probe("12+", 2);
		probe(".", 1);
		probe(".5x", 2);
		probe("3.", 2);
		probe("1.5.", 3);
		probe("1e", 2);
		probe("1e-", 3);
		probe("1e-7;", 4);
		probe("2i", 2);
		probe("2if", 2);
		probe("0x1fz", 4);
		probe("0b1012", 5);
	}

	#[test]
	fn probe_rejects_non_numbers() {
		let table = ConstantTable::default();
		assert_eq!(table.probe("x1", true), Err(NumberError::NotANumber));
		assert_eq!(table.probe(".e", true), Ok(1));
	}

	#[test]
	fn intern_constants() {
		let mut table = ConstantTable::default();
		assert_eq!(table.intern("0"), Ok(ConstId::ZERO));
		assert_eq!(table.intern("1"), Ok(ConstId::ONE));
		let id = table.intern("3.25").unwrap();
		assert_eq!(table.intern("3.25"), Ok(id));
		assert_eq!(table.text(id), Some("3.25"));
		assert_eq!(table.intern_integer(3), table.intern("3").unwrap());
		assert!(table.intern("1.2.3").is_err());
		assert!(table.intern(".").is_err());
	}
}
