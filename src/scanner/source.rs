//! Where the scanner's characters come from.
//!
//! A [`CharSource`] only knows how to hand out characters one at a time. The
//! scanner wraps every source it reads from in an [`Input`], which adds the
//! one-character pushback the operator and number scanning rely on and keeps
//! the line number used in diagnostics.

/// A stream of characters the scanner reads from.
pub trait CharSource {
	/// Read the next character, `None` once the input is exhausted.
	fn next_char(&mut self) -> Option<char>;

	/// Name used in diagnostics.
	fn name(&self) -> &str;

	/// Whether a person is typing this input.
	fn is_terminal(&self) -> bool { false }

	/// Called with `true` while a statement continues over several lines.
	fn set_continuation(&mut self, _continuation: bool) {}
}

/// A character source backed by an in-memory string.
pub struct StrSource {
	name:  String,
	chars: std::vec::IntoIter<char>,
}

impl StrSource {
	pub fn new(name: impl Into<String>, text: &str) -> Self {
		Self { name: name.into(), chars: text.chars().collect::<Vec<_>>().into_iter() }
	}
}

impl CharSource for StrSource {
	fn next_char(&mut self) -> Option<char> { self.chars.next() }

	fn name(&self) -> &str { &self.name }
}

/// An input being scanned.
pub(crate) struct Input {
	source:   Box<dyn CharSource>,
	pushback: Vec<char>,
	line:     usize,
	at_eof:   bool,
}

impl Input {
	pub fn new(source: Box<dyn CharSource>) -> Self { Self { source, pushback: vec![], line: 1, at_eof: false } }

	pub fn next_char(&mut self) -> Option<char> {
		let c = match self.pushback.pop() {
			Some(c) => c,
			None if self.at_eof => return None,
			None => match self.source.next_char() {
				Some(c) => c,
				None => {
					self.at_eof = true;
					return None;
				}
			},
		};
		if c == '\n' {
			self.line += 1;
		}
		Some(c)
	}

	/// Push back a character read with [`Input::next_char`]. Pushing back
	/// the end of input is a no-op since the input stays at its end.
	pub fn unread(&mut self, c: Option<char>) {
		if let Some(c) = c {
			if c == '\n' {
				self.line -= 1;
			}
			self.pushback.push(c);
		}
	}

	pub fn line(&self) -> usize { self.line }

	pub fn name(&self) -> &str { self.source.name() }

	pub fn is_terminal(&self) -> bool { self.source.is_terminal() }

	pub fn set_continuation(&mut self, continuation: bool) { self.source.set_continuation(continuation) }
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn pushback_and_lines() {
		let mut input = Input::new(Box::new(StrSource::new("t", "a\nb")));
		assert_eq!(input.next_char(), Some('a'));
		assert_eq!(input.next_char(), Some('\n'));
		assert_eq!(input.line(), 2);
		input.unread(Some('\n'));
		assert_eq!(input.line(), 1);
		assert_eq!(input.next_char(), Some('\n'));
		assert_eq!(input.next_char(), Some('b'));
		assert_eq!(input.next_char(), None);
		input.unread(None);
		assert_eq!(input.next_char(), None);
		assert_eq!(input.name(), "t");
	}
}
