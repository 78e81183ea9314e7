use std::io;
use std::io::{BufRead, Write};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use nix::sys::signal::{self, SigHandler, Signal};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use minsh::config::{self, Config, Options};
use minsh::{eval, global, parser, Flow, ShellError, Termination};

fn init_tracing() {
	let filter = EnvFilter::try_from_env("MINSH_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(io::stderr)
		.init();
}

/// Reports background jobs that finished since the last prompt.
fn reap_jobs(state: &mut global::State) {
	let mut stderr = io::stderr();
	for job in state.job_table.reap() {
		let _ = match job.termination {
			Some(t) => writeln!(stderr, "[{}] {} {}", job.pid, t, job.command),
			None => writeln!(stderr, "[{}] Done {}", job.pid, job.command),
		};
	}
}

fn read_loop(state: &mut global::State, config: &Config) -> Result<()> {
	let mut stdout = io::stdout();
	let stdin = io::stdin();
	let mut stdin_locked = stdin.lock();

	if config.interactive {
		// keystroke signals are for the foreground children, not the controller
		for &sig in &[Signal::SIGINT, Signal::SIGQUIT] {
			unsafe { signal::signal(sig, SigHandler::SigIgn) }.context("ignoring interactive signals")?;
		}
		writeln!(stdout, "{}", config::HINT)?;
	}

	loop {
		reap_jobs(state);
		if config.interactive {
			let _ = stdout.write_all(config::PROMPT.as_bytes());
			let _ = stdout.flush();
		}
		let mut buf = Vec::new();
		if stdin_locked.read_until(b'\n', &mut buf).context("reading a command line")? == 0 {
			debug!("end of input");
			break;
		}
		let line = match String::from_utf8(buf) {
			Ok(line) => line,
			Err(e) => {
				eval::report(&ShellError::Encoding(e.utf8_error()));
				state.last_status = Termination::Exited(eval::EXIT_ERROR);
				continue;
			},
		};
		let tokens = parser::tokenize(&line);
		if eval::run_once(state, &tokens) == Flow::Stop {
			break;
		}
	}
	Ok(())
}

fn main() -> Result<ExitCode> {
	init_tracing();
	let config = Config::from_options(Options::parse());
	let mut state = config.state();

	if let Some(ref line) = config.command {
		let tokens = parser::tokenize(line);
		eval::run_once(&mut state, &tokens);
		let code = state.last_status.code();
		return Ok(ExitCode::from(code.clamp(0, 255) as u8));
	}

	read_loop(&mut state, &config)?;
	reap_jobs(&mut state);
	Ok(ExitCode::from(state.last_status.code().clamp(0, 255) as u8))
}
