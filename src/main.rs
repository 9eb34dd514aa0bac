use clap::Parser;
use tracing_subscriber::EnvFilter;
use zcalc::{cli::*, Calcer, Config};

fn main() {
	tracing_subscriber::fmt()
		.with_writer(std::io::stderr)
		.with_env_filter(EnvFilter::try_from_env("ZCALC_LOG").unwrap_or_else(|_| EnvFilter::new("warn")))
		.init();

	let cli = Cli::parse();
	let defaults = Config::default();
	let config = Config {
		max_errors: cli.max_errors.unwrap_or(defaults.max_errors),
		max_depth: cli.max_depth.unwrap_or(defaults.max_depth),
		..defaults
	};
	let calcer = Calcer::new(config, cli.listing);

	match cli.mode {
		Mode::File { path } => {
			if let Err(e) = calcer.run_file(&path) {
				eprintln!("Failed run file: {e}");
				std::process::exit(1);
			}
		}
		Mode::Repl => calcer.run_prompt(),
	}
}
