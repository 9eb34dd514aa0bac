/// Limits the compiler enforces while reading input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
	/// Errors allowed in one unit before it is abandoned, `0` for no limit
	pub max_errors:      usize,
	/// Deepest nesting of statements and expressions
	pub max_depth:       usize,
	/// Deepest nesting of `read` commands
	pub max_input_depth: usize,
	pub max_symbol_len:  usize,
	pub max_number_len:  usize,
	/// Dimensions a matrix may have
	pub max_dims:        usize,
}

impl Default for Config {
	fn default() -> Self {
		Self {
			max_errors:      20,
			max_depth:       256,
			max_input_depth: 10,
			max_symbol_len:  256,
			max_number_len:  1024,
			max_dims:        4,
		}
	}
}

impl Config {
	/// Whether `errors` errors in one unit are too many to go on.
	pub fn too_many_errors(&self, errors: usize) -> bool { self.max_errors != 0 && errors > self.max_errors }
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn error_ceiling() {
		let config = Config::default();
		assert!(!config.too_many_errors(20));
		assert!(config.too_many_errors(21));
		let unlimited = Config { max_errors: 0, ..Config::default() };
		assert!(!unlimited.too_many_errors(10_000));
	}
}
