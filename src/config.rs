use crate::error::{PrecommitError, PrecommitResult};
use std::fs;
use std::io;
use std::path::{self, Component, Path, PathBuf};
use tracing::{debug, warn};

pub const CONFIG_FILE_NAME: &str = ".sops.yaml";
const MAX_DEPTH: usize = 100;

/// Looks for `.sops.yaml` in `root` and its ancestors. `None` means no config, which is not an error.
pub fn find_config_file(root: &Path) -> PrecommitResult<Option<PathBuf>> {
	let lookup_error = |source| PrecommitError::ConfigLookup { root: root.to_path_buf(), source };
	let start = clean(&path::absolute(root).map_err(lookup_error)?);

	for dir in start.ancestors().take(MAX_DEPTH) {
		let candidate = dir.join(CONFIG_FILE_NAME);
		match fs::metadata(&candidate) {
			Ok(meta) if meta.is_file() => {
				debug!("Using sops config {}", candidate.display());
				return Ok(Some(candidate));
			}
			Ok(_) => {}
			Err(e) if e.kind() == io::ErrorKind::NotFound => {}
			Err(e) => return Err(lookup_error(e)),
		}
	}

	warn!("No sops config found in repo, testing all files.");
	Ok(None)
}

/// Resolves `.` and `..` lexically, leaving symlinks alone.
fn clean(path: &Path) -> PathBuf {
	let mut cleaned = PathBuf::new();
	for component in path.components() {
		match component {
			Component::CurDir => {}
			Component::ParentDir => {
				cleaned.pop();
			}
			other => cleaned.push(other),
		}
	}
	cleaned
}
