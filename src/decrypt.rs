use crate::error::{PrecommitError, PrecommitResult};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// sops store format, picked from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
	Yaml,
	Json,
	Dotenv,
	Ini,
	Binary,
}

impl Format {
	pub fn from_extension(ext: &str) -> Self {
		match ext.trim_start_matches('.').to_ascii_lowercase().as_str() {
			"yaml" | "yml" => Format::Yaml,
			"json" => Format::Json,
			"env" => Format::Dotenv,
			"ini" => Format::Ini,
			_ => Format::Binary,
		}
	}

	pub fn as_str(self) -> &'static str {
		match self {
			Format::Yaml => "yaml",
			Format::Json => "json",
			Format::Dotenv => "dotenv",
			Format::Ini => "ini",
			Format::Binary => "binary",
		}
	}
}

pub trait Decryptor {
	/// Returns the plaintext of `path`, read as the format implied by `ext`.
	fn decrypt_file(&self, path: &Path, ext: &str) -> PrecommitResult<Vec<u8>>;
}

/// Decrypts by running the `sops` binary.
pub struct SopsDecryptor {
	program: PathBuf,
}

impl SopsDecryptor {
	pub fn new(program: PathBuf) -> Self {
		SopsDecryptor { program }
	}
}

impl Decryptor for SopsDecryptor {
	fn decrypt_file(&self, path: &Path, ext: &str) -> PrecommitResult<Vec<u8>> {
		let format = Format::from_extension(ext).as_str();
		let output = Command::new(&self.program)
			.args(["--decrypt", "--input-type", format, "--output-type", format])
			.arg(path)
			.stdin(Stdio::null())
			.output()
			.map_err(|e| PrecommitError::Decrypt { reason: format!("running {}: {e}", self.program.display()) })?;

		if !output.status.success() {
			let stderr = String::from_utf8_lossy(&output.stderr);
			let reason = match stderr.trim() {
				"" => format!("sops exited with {}", output.status),
				message => message.to_string(),
			};
			return Err(PrecommitError::Decrypt { reason });
		}
		Ok(output.stdout)
	}
}
