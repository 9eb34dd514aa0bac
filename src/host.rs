//! What the compiler hands its results to.
//!
//! Running code, opening files and the other commands the statement loop
//! accepts are the business of whoever embeds the compiler. Everything but
//! [`Host::execute`] has a default that either does nothing useful or
//! refuses, so a test host only needs to run code.
use anyhow::{bail, Context};

use crate::{bytecode::Function, environment::Environment, scanner::CharSource};

/// Result of asking the host to open an input for `read`.
pub enum OpenOutcome {
	Opened(Box<dyn CharSource>),
	/// Read before and `-once` was given.
	AlreadyRead,
	NotFound,
}

pub trait Host {
	/// Run a top-level evaluation that compiled cleanly.
	fn execute(&mut self, function: &Function, env: &Environment) -> anyhow::Result<()>;

	/// A `define` compiled cleanly and is now installed.
	fn function_defined(&mut self, _function: &Function, _env: &Environment) {}

	fn open(&mut self, _name: &str, _once: bool) -> OpenOutcome { OpenOutcome::NotFound }

	/// Save the global variables to a file.
	fn write_globals(&mut self, name: &str, _env: &Environment) -> anyhow::Result<()> {
		bail!("cannot write globals to {name}")
	}

	fn help(&mut self, topic: &str) { eprintln!("No help available for \"{topic}\"") }

	/// Change directory, to the home directory without an argument.
	fn change_dir(&mut self, dir: Option<&str>) -> anyhow::Result<()> {
		let dir = match dir {
			Some(dir) => dir.to_string(),
			None => std::env::var("HOME").context("Cannot determine HOME directory")?,
		};
		std::env::set_current_dir(&dir).with_context(|| format!("cd {dir}"))
	}
}
