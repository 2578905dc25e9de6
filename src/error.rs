use anyhow::Result;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PrecommitError {
	#[error("no input or input device")]
	Input,
	#[error("reading file list: {0}")]
	InputRead(#[from] std::io::Error),
	#[error("no files to validate")]
	NoFiles,
	#[error("sops config lookup from {}: {source}", root.display())]
	ConfigLookup { root: PathBuf, source: std::io::Error },
	#[error("checking {}: {source}", path.display())]
	FileStat { path: PathBuf, source: std::io::Error },
	#[error("error loading config {}: {reason}", config.display())]
	RuleMatch { config: PathBuf, reason: String },
	#[error("{reason}")]
	Decrypt { reason: String },
	#[error("failed to validate encryption ({failed} of {total} files)")]
	ValidationFailed { failed: usize, total: usize },
	#[error("not a valid log level: {0:?}")]
	LogLevel(String),
}

pub type PrecommitResult<T> = Result<T, PrecommitError>;
