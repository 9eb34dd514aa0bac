use std::collections::HashMap;

use super::StrId;

/// Interned string literals.
#[derive(Debug, Default)]
pub struct StringTable {
	strings: Vec<String>,
	index:   HashMap<String, StrId>,
}

impl StringTable {
	pub fn intern(&mut self, text: &str) -> StrId {
		if let Some(&id) = self.index.get(text) {
			return id;
		}
		let id = StrId::from_index(self.strings.len());
		self.strings.push(text.to_string());
		self.index.insert(text.to_string(), id);
		id
	}

	pub fn get(&self, id: StrId) -> Option<&str> { self.strings.get(id.index()).map(String::as_str) }

	pub fn len(&self) -> usize { self.strings.len() }

	pub fn is_empty(&self) -> bool { self.strings.is_empty() }
}
