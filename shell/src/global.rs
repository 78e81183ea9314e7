use crate::history::History;
use crate::job::{JobTable, Termination};

/// Everything the controller keeps between two command lines.
#[derive(Debug)]
pub struct State {
	pub job_table: JobTable,
	pub history: History,
	/// Outcome of the most recent line, as `-c` reports it.
	pub last_status: Termination,
}

impl State {
	pub fn new() -> State {
		State::with_history(History::new())
	}

	pub fn with_history(history: History) -> State {
		State { job_table: JobTable::new(), history: history, last_status: Termination::Exited(0) }
	}
}
