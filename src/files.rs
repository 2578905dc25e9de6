use crate::error::{PrecommitError, PrecommitResult};
use std::io::{self, BufRead, IsTerminal};

/// What an empty change set means for the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyPolicy {
	/// No files is a hard error.
	Reject,
	/// No files is a successful no-op, e.g. `git commit --amend` without changes.
	Allow,
}

/// Candidate files come from the arguments, or from piped stdin when there are none.
pub fn collect_files(args: Vec<String>, policy: EmptyPolicy) -> PrecommitResult<Vec<String>> {
	let files = if args.is_empty() {
		let stdin = io::stdin();
		if stdin.is_terminal() {
			return Err(PrecommitError::Input);
		}
		read_file_list(stdin.lock(), policy)?
	} else {
		args
	};

	if files.is_empty() && policy == EmptyPolicy::Reject {
		return Err(PrecommitError::NoFiles);
	}
	Ok(files)
}

/// Reads one path per line, dropping blank lines and a wrapping pair of double quotes.
pub fn read_file_list<R: BufRead>(mut reader: R, policy: EmptyPolicy) -> PrecommitResult<Vec<String>> {
	if reader.fill_buf()?.is_empty() {
		return match policy {
			EmptyPolicy::Reject => Err(PrecommitError::Input),
			EmptyPolicy::Allow => Ok(Vec::new()),
		};
	}

	let mut files = Vec::new();
	for line in reader.lines() {
		let line = line?;
		if line.trim().is_empty() {
			continue;
		}
		let file = trim_quotes(&line);
		if !file.is_empty() {
			files.push(file.to_string());
		}
	}
	Ok(files)
}

fn trim_quotes(line: &str) -> &str {
	line.strip_prefix('"').and_then(|rest| rest.strip_suffix('"')).unwrap_or(line)
}
