use crate::decrypt::Decryptor;
use crate::error::{PrecommitError, PrecommitResult};
use crate::rules::{RuleMatch, RuleMatcher};
use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, error, info};

/// Keeps the files that a creation rule says must be encrypted. Without a config every file is kept.
///
/// Stops at the first matcher error.
pub fn filter_files(rules: Option<&dyn RuleMatcher>, files: &[String]) -> PrecommitResult<Vec<String>> {
	let Some(rules) = rules else {
		return Ok(files.to_vec());
	};

	let mut filtered = Vec::new();
	for file in files {
		if is_deleted(file)? {
			info!("Secret: {file} was deleted in this changeset");
			continue;
		}

		match rules.match_file(file)? {
			RuleMatch::Matched { rule } => {
				debug!("File: {file} matches creation rule {rule}");
				filtered.push(file.clone());
			}
			RuleMatch::NoMatch => debug!("File: {file} doesn't match any sops config creation_rule regex. Skipping."),
		}
	}
	Ok(filtered)
}

/// Decrypts every file, logging each failure, and fails once at the end if any did.
pub fn decrypt_files(decryptor: &dyn Decryptor, files: &[String]) -> PrecommitResult<()> {
	let mut failed = 0;

	for file in files {
		let path = Path::new(file);
		let ext = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
		match decryptor.decrypt_file(path, ext) {
			Ok(_) => info!("File: {file} encryption validated"),
			Err(e) => {
				error!("Error decrypting {file}: {e}");
				failed += 1;
			}
		}
	}

	if failed > 0 {
		return Err(PrecommitError::ValidationFailed { failed, total: files.len() });
	}
	Ok(())
}

/// Gone from disk, or replaced by a directory. Any other stat failure is an error.
fn is_deleted(file: &str) -> PrecommitResult<bool> {
	match fs::metadata(file) {
		Ok(meta) => Ok(meta.is_dir()),
		Err(e) if matches!(e.kind(), io::ErrorKind::NotFound | io::ErrorKind::NotADirectory) => Ok(true),
		Err(source) => Err(PrecommitError::FileStat { path: file.into(), source }),
	}
}
