use crate::error::UsageError;
use crate::types::*;

type ResolveResult<T> = Result<T, UsageError>;

/// The token that replays the previous command line.
pub const RECALL: &str = "!!";

const PIPE: &str = "|";
const BACKGROUND: &str = "&";

fn is_delimiter(c: char) -> bool {
	match c {
		' ' | '\t' | '\r' | '\n' | '\x07' => true,
		_ => false,
	}
}

/// Splits a raw line into words. Operators must be surrounded by whitespace
/// to be recognized; `a|b` is a single word.
pub fn tokenize(line: &str) -> Vec<String> {
	line.split(is_delimiter)
		.filter(|word| !word.is_empty())
		.map(str::to_owned)
		.collect()
}

pub fn is_recall(tokens: &[String]) -> bool {
	tokens.first().map_or(false, |t| t == RECALL)
}

struct Resolver<'a> {
	tokens: &'a [String],
	i: usize,
}

impl<'a> Resolver<'a> {
	fn peek(&self) -> Option<&'a str> {
		self.tokens.get(self.i).map(String::as_str)
	}

	fn is_operator(token: &str) -> bool {
		token == PIPE || RedirectType::from_token(token).is_some()
	}

	fn parse_redirect(&mut self, typ: RedirectType, has_command: bool) -> ResolveResult<String> {
		if !has_command {
			return Err(UsageError::MissingCommandBeforeRedirection(typ));
		}
		self.i += 1;
		match self.peek() {
			Some(target) if !Resolver::is_operator(target) => {
				self.i += 1;
				Ok(target.to_owned())
			},
			_ => Err(UsageError::MissingTarget(typ)),
		}
	}

	fn parse_stage(&mut self) -> ResolveResult<Stage> {
		let mut argv: Vec<String> = vec![];
		let mut input = None;
		let mut output = None;

		while let Some(token) = self.peek() {
			if token == PIPE {
				break;
			}
			match RedirectType::from_token(token) {
				Some(typ) => {
					let target = self.parse_redirect(typ, !argv.is_empty())?;
					match typ {
						RedirectType::Input => input = Some(target),
						RedirectType::Output => output = Some(target),
					}
				},
				None => {
					argv.push(token.to_owned());
					self.i += 1;
				},
			}
		}

		Ok(Stage { argv: argv, input: input, output: output })
	}

	fn parse_pipeline(&mut self, mode: RunMode) -> ResolveResult<PipelineSpec> {
		let mut stages: Vec<Stage> = vec![];

		loop {
			match self.peek() {
				None if stages.is_empty() => { return Err(UsageError::MissingCommand); },
				None => { return Err(UsageError::MissingCommandAfterPipe); },
				Some(PIPE) if stages.is_empty() => { return Err(UsageError::MissingCommandBeforePipe); },
				Some(PIPE) => { return Err(UsageError::MissingCommandAfterPipe); },
				Some(_) => {},
			}
			stages.push(self.parse_stage()?);
			if self.peek().is_none() {
				break;
			}
			// parse_stage only stops early on a pipe
			self.i += 1;
		}
		Ok(PipelineSpec { stages: stages, mode: mode })
	}
}

/// Splits a token sequence into pipeline stages. A trailing `&` runs the whole
/// pipeline in the background; an `&` anywhere else is an ordinary word.
pub fn resolve(tokens: &[String]) -> ResolveResult<PipelineSpec> {
	let (body, mode) = match tokens.split_last() {
		Some((last, rest)) if last == BACKGROUND => (rest, RunMode::Background),
		_ => (tokens, RunMode::Foreground),
	};
	let mut resolver = Resolver { tokens: body, i: 0 };
	resolver.parse_pipeline(mode)
}
