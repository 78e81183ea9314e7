use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::os::fd::{AsFd, OwnedFd};

use nix::fcntl::OFlag;
use nix::unistd::{self, Pid};
use tracing::debug;

use crate::builtin::{self, Classified};
use crate::error::{Result, ShellError, UsageError};
use crate::global;
use crate::job::{self, JobBuilder, Termination};
use crate::launch::{self, PreparedStage, Wiring};
use crate::parser;
use crate::types::*;

/// Status recorded for a line the engine itself rejected or could not run.
pub const EXIT_ERROR: i32 = 2;
/// Status of a foreground pipeline whose rightmost stage never started.
pub const EXIT_NOT_STARTED: i32 = 1;

#[derive(Debug, PartialEq, Eq)]
pub enum EvalResult {
	Done(Termination),
	Running(Vec<Pid>),
}

pub fn report(e: &ShellError) {
	let _ = writeln!(&mut io::stderr(), "minsh: {}", e);
}

fn open_redirect(path: &str, typ: RedirectType) -> Result<File> {
	let mut oopt = OpenOptions::new();
	let _ = match typ {
		RedirectType::Input => oopt.read(true),
		RedirectType::Output => oopt.write(true).create(true).truncate(true),
	};
	oopt.open(path).map_err(|e| ShellError::Redirect { path: path.to_owned(), source: e })
}

fn open_stage_redirect(path: Option<&String>, typ: RedirectType) -> Result<Option<File>> {
	match path {
		Some(path) => open_redirect(path, typ).map(Some),
		None => Ok(None),
	}
}

/// Forks one process per stage, left to right, chaining them with pipes.
///
/// The parent's copy of every pipe end and redirection file is dropped right
/// after the stage that uses it is forked. A stage whose redirection cannot be
/// opened is reported and skipped; its pipe ends are closed all the same, so
/// its neighbours see end-of-file instead of blocking. Returns whether the
/// rightmost stage was started.
fn spawn_stages(pipeline: &PipelineSpec, prepared: &[PreparedStage],
                job_builder: &mut JobBuilder) -> Result<bool> {
	let last = prepared.len() - 1;
	let mut pipe_read: Option<OwnedFd> = None;
	let mut last_started = false;

	for (i, (stage, prep)) in pipeline.stages.iter().zip(prepared).enumerate() {
		let pipe_stdin = pipe_read.take();
		let pipe_stdout = if i < last {
			let (read, write) = unistd::pipe2(OFlag::O_CLOEXEC).map_err(ShellError::Pipe)?;
			debug!(stage = i, "created pipe");
			pipe_read = Some(read);
			Some(write)
		} else {
			None
		};

		let opened = open_stage_redirect(stage.input.as_ref(), RedirectType::Input)
			.and_then(|input| {
				open_stage_redirect(stage.output.as_ref(), RedirectType::Output).map(|output| (input, output))
			});
		let (input, output) = match opened {
			Ok(files) => files,
			Err(e) => {
				report(&e);
				continue;
			},
		};

		let wiring = Wiring {
			stdin: input.as_ref().map(|f| f.as_fd()).or_else(|| pipe_stdin.as_ref().map(|fd| fd.as_fd())),
			stdout: output.as_ref().map(|f| f.as_fd()).or_else(|| pipe_stdout.as_ref().map(|fd| fd.as_fd())),
		};
		let pid = launch::spawn(prep, wiring)?;
		debug!(%pid, stage = i, argv = ?stage.argv, "spawned");
		job_builder.push(pid);
		last_started = i == last;
	}
	Ok(last_started)
}

pub fn eval_pipeline(state: &mut global::State, pipeline: &PipelineSpec) -> Result<EvalResult> {
	if pipeline.stages.is_empty() {
		return Err(UsageError::MissingCommand.into());
	}
	let prepared = pipeline.stages.iter().map(PreparedStage::new).collect::<Result<Vec<_>>>()?;
	let _ = io::stdout().flush();

	let mut job_builder = JobBuilder::new(pipeline.mode, pipeline.to_string(), prepared.len());
	let last_started = match spawn_stages(pipeline, &prepared, &mut job_builder) {
		Ok(started) => started,
		Err(e) => {
			report(&e);
			false
		},
	};
	if job_builder.is_empty() {
		return Ok(EvalResult::Done(Termination::Exited(EXIT_NOT_STARTED)));
	}

	if pipeline.is_background() {
		let pids = job_builder.pids().to_vec();
		for pid in &pids {
			let _ = writeln!(&mut io::stderr(), "[{}]", pid);
		}
		for job in job_builder.build() {
			state.job_table.insert(job);
		}
		Ok(EvalResult::Running(pids))
	} else {
		let status = job::wait_all(job_builder.pids())?;
		let status = match status {
			Some(t) if last_started => t,
			_ => Termination::Exited(EXIT_NOT_STARTED),
		};
		Ok(EvalResult::Done(status))
	}
}

/// Resolves operators in `tokens` and runs the resulting pipeline.
pub fn eval(state: &mut global::State, tokens: &[String]) -> Result<EvalResult> {
	let pipeline = parser::resolve(tokens)?;
	eval_pipeline(state, &pipeline)
}

fn dispatch(state: &mut global::State, tokens: &[String]) -> Flow {
	match builtin::classify(tokens) {
		Classified::Empty => Flow::Continue,
		Classified::Builtin(func, args) => {
			let flow = func(state, args);
			state.last_status = Termination::Exited(0);
			flow
		},
		Classified::Pipeline(tokens) => {
			state.last_status = match eval(state, tokens) {
				Ok(EvalResult::Done(t)) => t,
				Ok(EvalResult::Running(_)) => Termination::Exited(0),
				Err(e) => {
					report(&e);
					Termination::Exited(EXIT_ERROR)
				},
			};
			Flow::Continue
		},
	}
}

/// Runs one input line. Every error is reported on stderr and the loop goes
/// on; only `exit` stops it.
pub fn run_once(state: &mut global::State, tokens: &[String]) -> Flow {
	if parser::is_recall(tokens) {
		let replayed = match state.history.recall() {
			Ok(entry) => {
				let mut replayed = entry.to_vec();
				replayed.extend_from_slice(&tokens[1..]);
				replayed
			},
			Err(e) => {
				report(&e);
				state.last_status = Termination::Exited(EXIT_ERROR);
				return Flow::Continue;
			},
		};
		let _ = writeln!(&mut io::stdout(), "{}", replayed.join(" "));
		debug!(?replayed, "recalled");
		return dispatch(state, &replayed);
	}

	let flow = dispatch(state, tokens);
	state.history.record(tokens);
	flow
}
