use std::collections::HashMap;
use std::fmt;

use nix::errno::Errno;
use nix::sys::signal::Signal;
use nix::sys::wait::{self, WaitPidFlag, WaitStatus};
use nix::unistd::Pid;
use tracing::debug;

use crate::error::{Result, ShellError};
use crate::types::RunMode;

/// How a reaped process ended.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Termination {
	Exited(i32),
	Signaled(Signal),
}

impl Termination {
	pub fn success(self) -> bool {
		self == Termination::Exited(0)
	}

	/// Status in the form a shell reports it: the exit code, or 128 plus the
	/// signal number.
	pub fn code(self) -> i32 {
		match self {
			Termination::Exited(code) => code,
			Termination::Signaled(sig) => 128 + sig as i32,
		}
	}
}

impl fmt::Display for Termination {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match *self {
			Termination::Exited(0) => f.write_str("Done"),
			Termination::Exited(code) => write!(f, "Exit {}", code),
			Termination::Signaled(sig) => write!(f, "Killed by {}", sig),
		}
	}
}

pub trait WaitStatusExt {
	fn termination(self) -> Option<Termination>;
}

impl WaitStatusExt for WaitStatus {
	fn termination(self) -> Option<Termination> {
		match self {
			WaitStatus::Exited(_, code) => Some(Termination::Exited(code)),
			WaitStatus::Signaled(_, sig, _) => Some(Termination::Signaled(sig)),
			_ => None,
		}
	}
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Job {
	pub pid: Pid,
	pub mode: RunMode,
	pub command: String,
	/// `None` while running, and for a background job whose status was
	/// collected by someone else before the table could reap it.
	pub termination: Option<Termination>,
}

/// Collects the processes of one command line as they are forked.
#[derive(Debug)]
pub struct JobBuilder {
	mode: RunMode,
	command: String,
	pids: Vec<Pid>,
}

impl JobBuilder {
	pub fn new(mode: RunMode, command: String, size_hint: usize) -> JobBuilder {
		JobBuilder { mode: mode, command: command, pids: Vec::with_capacity(size_hint) }
	}

	pub fn push(&mut self, pid: Pid) {
		self.pids.push(pid);
	}

	pub fn pids(&self) -> &[Pid] {
		&self.pids
	}

	pub fn is_empty(&self) -> bool {
		self.pids.is_empty()
	}

	pub fn build(self) -> Vec<Job> {
		let JobBuilder { mode, command, pids } = self;
		pids.into_iter()
			.map(|pid| Job { pid: pid, mode: mode, command: command.clone(), termination: None })
			.collect()
	}
}

/// Blocks until `pid` terminates. Only that exact child is reaped, so
/// background jobs finishing meanwhile stay in the table.
pub fn wait_for(pid: Pid) -> Result<Termination> {
	loop {
		match wait::waitpid(pid, None) {
			Ok(status) => {
				if let Some(t) = status.termination() {
					debug!(%pid, ?t, "reaped foreground process");
					return Ok(t);
				}
			},
			Err(Errno::EINTR) => {},
			Err(e) => { return Err(ShellError::Wait(e)); },
		}
	}
}

/// Waits for every process of a foreground command. The result is the
/// termination of the rightmost stage.
pub fn wait_all(pids: &[Pid]) -> Result<Option<Termination>> {
	let mut last = None;
	let mut first_error = None;
	for &pid in pids {
		match wait_for(pid) {
			Ok(t) => last = Some(t),
			Err(e) => { first_error.get_or_insert(e); },
		}
	}
	match first_error {
		Some(e) => Err(e),
		None => Ok(last),
	}
}

/// Background jobs keyed by process id.
///
/// Entries are inserted when a background command is spawned and removed by
/// `reap`. Both take `&mut self`, so a lookup never sees a half-applied update.
#[derive(Debug, Default)]
pub struct JobTable {
	jobs: HashMap<Pid, Job>,
}

impl JobTable {
	pub fn new() -> JobTable {
		JobTable { jobs: HashMap::new() }
	}

	pub fn insert(&mut self, job: Job) {
		debug!(pid = %job.pid, command = %job.command, "registered background job");
		self.jobs.insert(job.pid, job);
	}

	pub fn get(&self, pid: Pid) -> Option<&Job> {
		self.jobs.get(&pid)
	}

	pub fn len(&self) -> usize {
		self.jobs.len()
	}

	pub fn is_empty(&self) -> bool {
		self.jobs.is_empty()
	}

	pub fn pids(&self) -> Vec<Pid> {
		let mut pids: Vec<Pid> = self.jobs.keys().cloned().collect();
		pids.sort_by_key(|pid| pid.as_raw());
		pids
	}

	/// One non-blocking pass over the table. Terminated jobs are removed and
	/// returned in pid order.
	pub fn reap(&mut self) -> Vec<Job> {
		let mut finished = vec![];
		for pid in self.pids() {
			let termination = match wait::waitpid(pid, Some(WaitPidFlag::WNOHANG)) {
				Ok(status) => match status.termination() {
					Some(t) => Some(t),
					None => { continue; },
				},
				// collected elsewhere, or never was our child
				Err(Errno::ECHILD) => None,
				Err(e) => {
					debug!(%pid, error = %e, "waitpid failed, will retry");
					continue;
				},
			};
			if let Some(mut job) = self.jobs.remove(&pid) {
				debug!(%pid, ?termination, "reaped background job");
				job.termination = termination;
				finished.push(job);
			}
		}
		finished
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	use nix::unistd::{fork, ForkResult};

	fn spawn_exit(code: i32) -> Pid {
		match unsafe { fork() }.unwrap() {
			ForkResult::Child => unsafe { libc::_exit(code) },
			ForkResult::Parent { child } => child,
		}
	}

	fn background(pid: Pid) -> Job {
		Job { pid: pid, mode: RunMode::Background, command: "test".to_string(), termination: None }
	}

	#[test]
	fn termination_codes() {
		assert!(Termination::Exited(0).success());
		assert!(!Termination::Exited(3).success());
		assert!(!Termination::Signaled(Signal::SIGTERM).success());
		assert_eq!(Termination::Exited(3).code(), 3);
		assert_eq!(Termination::Signaled(Signal::SIGKILL).code(), 137);
		assert_eq!(Termination::Exited(0).to_string(), "Done");
		assert_eq!(Termination::Exited(2).to_string(), "Exit 2");
	}

	#[test]
	fn wait_for_reports_exit_code() {
		let pid = spawn_exit(7);
		assert_eq!(wait_for(pid).unwrap(), Termination::Exited(7));
	}

	#[test]
	fn builder_expands_into_one_job_per_process() {
		let mut builder = JobBuilder::new(RunMode::Background, "a | b".to_string(), 2);
		assert!(builder.is_empty());
		builder.push(Pid::from_raw(10));
		builder.push(Pid::from_raw(11));
		let jobs = builder.build();
		assert_eq!(jobs.len(), 2);
		assert_eq!(jobs[1].pid, Pid::from_raw(11));
		assert!(jobs.iter().all(|j| j.command == "a | b" && j.termination.is_none()));
	}

	#[test]
	fn reap_removes_terminated_job() {
		let pid = spawn_exit(0);
		let mut table = JobTable::new();
		table.insert(background(pid));
		assert!(table.get(pid).is_some());

		let mut finished = vec![];
		for _ in 0..500 {
			finished.extend(table.reap());
			if table.is_empty() {
				break;
			}
			std::thread::sleep(std::time::Duration::from_millis(10));
		}
		assert!(table.is_empty());
		assert_eq!(finished.len(), 1);
		assert_eq!(finished[0].termination, Some(Termination::Exited(0)));
	}

	#[test]
	fn reap_tolerates_an_already_collected_process() {
		let pid = spawn_exit(1);
		wait_for(pid).unwrap();
		let mut table = JobTable::new();
		table.insert(background(pid));
		let finished = table.reap();
		assert!(table.is_empty());
		assert_eq!(finished.len(), 1);
		assert_eq!(finished[0].termination, None);
	}
}
