use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "zcalc", after_long_help = "Front end of a calc-style scripting language.")]
pub struct Cli {
	#[command(subcommand)]
	pub mode: Mode,

	/// Print the code of every unit that compiles
	#[arg(long, global = true)]
	pub listing: bool,

	/// Errors allowed in one unit before it is abandoned, 0 for no limit
	#[arg(long, global = true)]
	pub max_errors: Option<usize>,

	/// Deepest nesting of statements and expressions
	#[arg(long, global = true)]
	pub max_depth: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Mode {
	/// Input file
	File { path: PathBuf },
	/// Input prompt
	Repl,
}
