//! A small command interpreter: classifies a tokenized line, resolves `<`,
//! `>`, `|` and a trailing `&`, forks one process per pipeline stage and
//! either waits for it or tracks it as a background job.

pub mod builtin;
pub mod config;
pub mod error;
pub mod eval;
pub mod global;
pub mod history;
pub mod job;
pub mod launch;
pub mod parser;
pub mod types;

pub use error::{ShellError, UsageError};
pub use eval::{eval, run_once, EvalResult};
pub use global::State;
pub use job::{Job, JobTable, Termination};
pub use types::{Flow, PipelineSpec, RunMode, Stage};
