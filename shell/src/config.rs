use std::io::{self, IsTerminal};
use std::path::PathBuf;

use clap::Parser;

use crate::global;
use crate::history::History;

pub const PROMPT: &str = "minsh> ";
pub const HINT: &str = "Type help if you need any helps.";

#[derive(Debug, Parser)]
#[command(name = "minsh", version, about = "A small command interpreter with pipes, redirection and background jobs")]
pub struct Options {
	/// Run a single command line and exit with its status
	#[arg(short = 'c', long = "command", value_name = "LINE")]
	pub command: Option<String>,

	/// Keep the last command line in this file so that `!!` survives a restart
	#[arg(long, value_name = "PATH", env = "MINSH_HISTORY")]
	pub history_file: Option<PathBuf>,

	/// Do not print the prompt or the start-up hint
	#[arg(short, long)]
	pub quiet: bool,
}

#[derive(Debug, Clone)]
pub struct Config {
	pub command: Option<String>,
	pub history_file: Option<PathBuf>,
	pub interactive: bool,
}

impl Config {
	pub fn from_options(options: Options) -> Config {
		let interactive = !options.quiet && options.command.is_none() && io::stdin().is_terminal();
		Config { command: options.command, history_file: options.history_file, interactive: interactive }
	}

	pub fn state(&self) -> global::State {
		let history = match self.history_file {
			Some(ref path) => History::with_file(path),
			None => History::new(),
		};
		global::State::with_history(history)
	}
}
