use std::{ffi, io, str};

use thiserror::Error;

use crate::types::RedirectType;

/// Misplaced or incomplete operators. Detected before anything is spawned.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum UsageError {
	#[error("missing redirection target after '{0}'")]
	MissingTarget(RedirectType),
	#[error("missing command before redirection '{0}'")]
	MissingCommandBeforeRedirection(RedirectType),
	#[error("missing command after pipe")]
	MissingCommandAfterPipe,
	#[error("missing command before pipe")]
	MissingCommandBeforePipe,
	#[error("missing command")]
	MissingCommand,
}

#[derive(Debug, Error)]
pub enum ShellError {
	#[error(transparent)]
	Usage(#[from] UsageError),
	#[error("argument contains a nul byte: {0}")]
	Nul(#[from] ffi::NulError),
	#[error("pipe failed: {0}")]
	Pipe(#[source] nix::Error),
	#[error("fork failed: {0}")]
	Spawn(#[source] nix::Error),
	#[error("{path}: {source}")]
	Redirect { path: String, #[source] source: io::Error },
	#[error("wait failed: {0}")]
	Wait(#[source] nix::Error),
	#[error("input line is not valid UTF-8: {0}")]
	Encoding(#[source] str::Utf8Error),
	#[error("No command in history.")]
	NoHistory,
}

pub type Result<T> = std::result::Result<T, ShellError>;
