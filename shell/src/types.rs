use std::fmt;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum RunMode { Foreground, Background }

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum RedirectType { Input, Output }

impl RedirectType {
	pub fn from_token(token: &str) -> Option<RedirectType> {
		match token {
			"<" => Some(RedirectType::Input),
			">" => Some(RedirectType::Output),
			_ => None,
		}
	}
}

impl fmt::Display for RedirectType {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match *self {
			RedirectType::Input => f.write_str("<"),
			RedirectType::Output => f.write_str(">"),
		}
	}
}

/// One command of a pipeline together with its file redirections.
///
/// `argv[0]` is the program name; the resolver never produces a stage with an
/// empty `argv`.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Stage {
	pub argv: Vec<String>,
	pub input: Option<String>,
	pub output: Option<String>,
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct PipelineSpec {
	pub stages: Vec<Stage>,
	pub mode: RunMode,
}

impl PipelineSpec {
	pub fn is_background(&self) -> bool {
		self.mode == RunMode::Background
	}
}

impl fmt::Display for PipelineSpec {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		for (i, stage) in self.stages.iter().enumerate() {
			if i > 0 {
				f.write_str(" | ")?;
			}
			f.write_str(&stage.argv.join(" "))?;
			if let Some(ref path) = stage.input {
				write!(f, " < {}", path)?;
			}
			if let Some(ref path) = stage.output {
				write!(f, " > {}", path)?;
			}
		}
		if self.is_background() {
			f.write_str(" &")?;
		}
		Ok(())
	}
}

/// Whether the read loop should keep going after a line.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Flow { Continue, Stop }
