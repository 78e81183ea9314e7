use std::ffi::{CStr, CString};
use std::os::fd::{AsRawFd, BorrowedFd};

use nix::errno::Errno;
use nix::sys::signal::{self, SigHandler, Signal};
use nix::unistd::{self, ForkResult, Pid};

use crate::error::{Result, ShellError, UsageError};
use crate::types::Stage;

/// Exit status of a child whose program could not be found.
pub const EXIT_NOT_FOUND: i32 = 127;
/// Exit status of a child that could not be set up or executed otherwise.
pub const EXIT_NOT_EXECUTABLE: i32 = 126;

/// A stage whose arguments are already C strings. Conversion errors such as an
/// interior NUL surface in the controller, before anything is forked.
#[derive(Debug)]
pub struct PreparedStage {
	argv: Vec<CString>,
}

impl PreparedStage {
	pub fn new(stage: &Stage) -> Result<PreparedStage> {
		if stage.argv.is_empty() {
			return Err(UsageError::MissingCommand.into());
		}
		let argv: std::result::Result<Vec<CString>, _> = stage.argv.iter().map(|s| CString::new(s.as_str())).collect();
		Ok(PreparedStage { argv: argv? })
	}

	pub fn name(&self) -> &CStr {
		&self.argv[0]
	}
}

/// Descriptors to install as the child's stdin/stdout. `None` keeps the
/// inherited one.
#[derive(Debug, Default, Clone, Copy)]
pub struct Wiring<'a> {
	pub stdin: Option<BorrowedFd<'a>>,
	pub stdout: Option<BorrowedFd<'a>>,
}

/// Forks a child that runs `stage`. Returns the child's pid in the parent;
/// the child side never returns.
pub fn spawn(stage: &PreparedStage, wiring: Wiring) -> Result<Pid> {
	match unsafe { unistd::fork() }.map_err(ShellError::Spawn)? {
		ForkResult::Parent { child } => Ok(child),
		ForkResult::Child => exec_stage(stage, wiring),
	}
}

fn exec_stage(stage: &PreparedStage, wiring: Wiring) -> ! {
	// keyboard signals never reach a launched program; SIG_IGN survives exec
	for &sig in &[Signal::SIGINT, Signal::SIGQUIT] {
		let _ = unsafe { signal::signal(sig, SigHandler::SigIgn) };
	}
	// inherited as ignored from the Rust runtime
	let _ = unsafe { signal::signal(Signal::SIGPIPE, SigHandler::SigDfl) };

	if let Some(fd) = wiring.stdin {
		if let Err(e) = unistd::dup2(fd.as_raw_fd(), libc::STDIN_FILENO) {
			child_fail(stage.name(), e);
		}
	}
	if let Some(fd) = wiring.stdout {
		if let Err(e) = unistd::dup2(fd.as_raw_fd(), libc::STDOUT_FILENO) {
			child_fail(stage.name(), e);
		}
	}

	let err = match unistd::execvp(stage.name(), &stage.argv) {
		Ok(never) => match never {},
		Err(e) => e,
	};
	child_fail(stage.name(), err)
}

fn child_fail(name: &CStr, err: Errno) -> ! {
	let status = if err == Errno::ENOENT { EXIT_NOT_FOUND } else { EXIT_NOT_EXECUTABLE };
	let parts: [&[u8]; 5] = [b"minsh: ", name.to_bytes(), b": ", err.desc().as_bytes(), b"\n"];
	for part in &parts {
		write_stderr(part);
	}
	unsafe { libc::_exit(status) }
}

fn write_stderr(mut buf: &[u8]) {
	while !buf.is_empty() {
		let rc = unsafe { libc::write(libc::STDERR_FILENO, buf.as_ptr() as *const libc::c_void, buf.len()) };
		if rc < 0 && Errno::last() == Errno::EINTR {
			continue;
		}
		if rc <= 0 {
			return;
		}
		buf = &buf[rc as usize..];
	}
}
