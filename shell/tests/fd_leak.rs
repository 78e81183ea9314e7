//! Descriptor accounting. Kept in its own test binary so no concurrently
//! running test opens or closes descriptors while these count them.
#![cfg(target_os = "linux")]

use std::fs;
use std::path::Path;

use minsh::{eval, EvalResult, State, Termination};

use test_util::words;

fn open_fds() -> usize {
	fs::read_dir("/proc/self/fd").unwrap().count()
}

fn path(dir: &Path, name: &str) -> String {
	dir.join(name).to_string_lossy().into_owned()
}

fn run(state: &mut State, line: &str) {
	assert_eq!(eval(state, &words(line)).unwrap(), EvalResult::Done(Termination::Exited(0)), "{}", line);
}

#[test]
fn pipelines_leak_no_descriptors() {
	let dir = tempfile::tempdir().unwrap();
	let input = path(dir.path(), "in.txt");
	let missing = path(dir.path(), "missing.txt");
	let base = path(dir.path(), "base.txt");
	let downstream = path(dir.path(), "downstream.txt");
	let upstream = path(dir.path(), "upstream.txt");
	let out = path(dir.path(), "out.txt");
	fs::write(&input, "x\ny\n").unwrap();
	let mut state = State::new();

	// controller side: nothing stays open after the command finishes
	let before = open_fds();
	run(&mut state, &format!("cat < {} | cat | cat > {}", input, out));
	run(&mut state, &format!("cat < {} | cat > {}", missing, out));
	run(&mut state, &format!("sort {} | uniq | wc -l > {}", input, out));
	assert_eq!(open_fds(), before);

	// child side: a stage sees the same descriptors whether or not it is piped
	run(&mut state, &format!("ls /proc/self/fd > {}", base));
	run(&mut state, &format!("echo x | ls /proc/self/fd > {}", downstream));
	run(&mut state, &format!("ls /proc/self/fd | cat > {}", upstream));
	let base = fs::read_to_string(&base).unwrap();
	assert_eq!(fs::read_to_string(&downstream).unwrap(), base);
	assert_eq!(fs::read_to_string(&upstream).unwrap(), base);
}
