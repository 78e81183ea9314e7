use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{Result, ShellError};
use crate::parser;

/// The single most recent command line, optionally mirrored to a file so that
/// recall survives a restart.
#[derive(Debug, Default)]
pub struct History {
	entry: Option<Vec<String>>,
	file: Option<PathBuf>,
}

impl History {
	pub fn new() -> History {
		History { entry: None, file: None }
	}

	/// Backs the history with `path`, loading whatever it already holds. A
	/// missing file just means nothing has been recorded yet.
	pub fn with_file<P: Into<PathBuf>>(path: P) -> History {
		let path = path.into();
		let entry = match load(&path) {
			Ok(entry) => entry,
			Err(e) => {
				warn!(path = %path.display(), error = %e, "could not read history file");
				None
			},
		};
		History { entry: entry, file: Some(path) }
	}

	pub fn record(&mut self, tokens: &[String]) {
		if tokens.is_empty() {
			return;
		}
		self.entry = Some(tokens.to_vec());
		if let Some(ref path) = self.file {
			match fs::write(path, tokens.join(" ")) {
				Ok(()) => debug!(path = %path.display(), "history saved"),
				Err(e) => warn!(path = %path.display(), error = %e, "could not write history file"),
			}
		}
	}

	pub fn recall(&self) -> Result<&[String]> {
		self.entry.as_ref().map(Vec::as_slice).ok_or(ShellError::NoHistory)
	}
}

fn load(path: &Path) -> io::Result<Option<Vec<String>>> {
	let line = match fs::read_to_string(path) {
		Ok(line) => line,
		Err(ref e) if e.kind() == io::ErrorKind::NotFound => { return Ok(None); },
		Err(e) => { return Err(e); },
	};
	let tokens = parser::tokenize(&line);
	if tokens.is_empty() || parser::is_recall(&tokens) {
		Ok(None)
	} else {
		Ok(Some(tokens))
	}
}
