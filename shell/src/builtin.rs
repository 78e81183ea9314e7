use std::io::{self, Write};

use crate::global;
use crate::types::Flow;

pub type Builtin = fn(&mut global::State, &[String]) -> Flow;

const HELP: &str = "\
minsh: a small command interpreter
Features supported by this shell:
	1. Type '&' at the end of your command to run it in the background.
	2. Type '!!' at the beginning of your command to run the most recent command again.
	   You may receive a 'No command in history.' response.
	3. Use '>' or '<' to redirect output or input.
	4. Use '|' to pipe one command into the next.
Builtins: help, exit
";

pub fn write_help<W: Write>(out: &mut W) -> io::Result<()> {
	out.write_all(HELP.as_bytes())?;
	out.flush()
}

pub fn builtin_help(_: &mut global::State, _: &[String]) -> Flow {
	let _ = write_help(&mut io::stdout());
	Flow::Continue
}

pub fn builtin_exit(_: &mut global::State, _: &[String]) -> Flow {
	Flow::Stop
}

pub fn match_builtin(name: &str) -> Option<Builtin> {
	match name {
		"help" => Some(builtin_help),
		"exit" => Some(builtin_exit),
		_ => None,
	}
}

pub enum Classified<'a> {
	Empty,
	Builtin(Builtin, &'a [String]),
	Pipeline(&'a [String]),
}

/// Decides how a token sequence is run. Builtins are matched on the first
/// token only, exactly and case-sensitively.
pub fn classify(tokens: &[String]) -> Classified<'_> {
	match tokens.first() {
		None => Classified::Empty,
		Some(name) => match match_builtin(name) {
			Some(builtin) => Classified::Builtin(builtin, tokens),
			None => Classified::Pipeline(tokens),
		},
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::parser::tokenize;

	#[test]
	fn classify_empty() {
		assert!(matches!(classify(&[]), Classified::Empty));
	}

	#[test]
	fn classify_builtins_exactly() {
		let exit = tokenize("exit now");
		match classify(&exit) {
			Classified::Builtin(f, args) => {
				assert_eq!(f(&mut global::State::new(), args), Flow::Stop);
				assert_eq!(args, exit.as_slice());
			},
			_ => panic!("exit is a builtin"),
		}
		assert!(matches!(classify(&tokenize("help")), Classified::Builtin(..)));
		assert!(matches!(classify(&tokenize("Exit")), Classified::Pipeline(_)));
		assert!(matches!(classify(&tokenize("exit_code")), Classified::Pipeline(_)));
		assert!(matches!(classify(&tokenize("hel")), Classified::Pipeline(_)));
	}

	#[test]
	fn classify_everything_else_as_pipeline() {
		let tokens = tokenize("ls -la > out.txt");
		match classify(&tokens) {
			Classified::Pipeline(t) => assert_eq!(t, tokens.as_slice()),
			_ => panic!("ls is external"),
		}
	}

	#[test]
	fn help_lists_operators() {
		let mut out: Vec<u8> = vec![];
		write_help(&mut out).unwrap();
		let text = String::from_utf8(out).unwrap();
		for op in &["'&'", "'!!'", "'>'", "'<'", "'|'"] {
			assert!(text.contains(op), "help should mention {}", op);
		}
	}
}
