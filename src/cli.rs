use crate::error::{PrecommitError, PrecommitResult};
use crate::files::EmptyPolicy;
use clap::builder::FalseyValueParser;
use clap::{Arg, ArgAction, ArgMatches, Command, command};
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;

pub const LOG_LEVEL_ENV: &str = "SOPS_PRE_COMMIT_LOG_LEVEL";
pub const SILENT_ENV: &str = "SOPS_PRE_COMMIT_SILENT";
pub const ALLOW_EMPTY_ENV: &str = "SOPS_PRE_COMMIT_ALLOW_EMPTY";
pub const SOPS_BIN_ENV: &str = "SOPS_PRE_COMMIT_SOPS_BIN";
pub const CONFIG_ROOT_ENV: &str = "SOPS_PRE_COMMIT_CONFIG_ROOT";

pub fn build_cli() -> Command {
	command!()
		.help_template("{name} {version} - {about}\nUSAGE: {usage}\nOPTIONS:\n{options}\nFiles are read from stdin, one per line, when none are given.\n")
		.arg(Arg::new("files").value_name("FILE").help("Changed files to validate").num_args(0..).action(ArgAction::Append))
		.arg(Arg::new("log-level").long("log-level").value_name("LEVEL").help("Configure log level").env(LOG_LEVEL_ENV).default_value("info"))
		.arg(
			Arg::new("silent")
				.short('s')
				.long("silent")
				.help("Suppress output")
				.env(SILENT_ENV)
				.action(ArgAction::SetTrue)
				.value_parser(FalseyValueParser::new()),
		)
		.arg(
			Arg::new("allow-empty")
				.long("allow-empty")
				.help("Succeed when the change set is empty")
				.env(ALLOW_EMPTY_ENV)
				.action(ArgAction::SetTrue)
				.value_parser(FalseyValueParser::new()),
		)
		.arg(Arg::new("sops-bin").long("sops-bin").value_name("PATH").help("sops executable used to decrypt").env(SOPS_BIN_ENV).default_value("sops"))
		.arg(Arg::new("config-root").long("config-root").value_name("DIR").help("Directory where the .sops.yaml search starts").env(CONFIG_ROOT_ENV).default_value("."))
}

/// Resolved options for one run.
#[derive(Debug)]
pub struct Settings {
	pub files: Vec<String>,
	pub log_level: LevelFilter,
	pub empty_policy: EmptyPolicy,
	pub sops_bin: PathBuf,
	pub config_root: PathBuf,
}

impl Settings {
	pub fn from_matches(matches: &ArgMatches) -> PrecommitResult<Self> {
		let files: Vec<String> = matches.get_many::<String>("files").map(|values| values.cloned().collect()).unwrap_or_default();
		let log_level = if matches.get_flag("silent") {
			LevelFilter::OFF
		} else {
			parse_log_level(matches.get_one::<String>("log-level").map(String::as_str).unwrap_or("info"))?
		};
		let empty_policy = if matches.get_flag("allow-empty") { EmptyPolicy::Allow } else { EmptyPolicy::Reject };
		let sops_bin = matches.get_one::<String>("sops-bin").map(PathBuf::from).unwrap_or_else(|| PathBuf::from("sops"));
		let config_root = matches.get_one::<String>("config-root").map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."));

		Ok(Settings { files, log_level, empty_policy, sops_bin, config_root })
	}
}

/// Accepts the usual level names plus the `warning`, `fatal` and `panic` spellings.
pub fn parse_log_level(level: &str) -> PrecommitResult<LevelFilter> {
	match level.trim().to_ascii_lowercase().as_str() {
		"off" => Ok(LevelFilter::OFF),
		"panic" | "fatal" | "error" => Ok(LevelFilter::ERROR),
		"warn" | "warning" => Ok(LevelFilter::WARN),
		"info" => Ok(LevelFilter::INFO),
		"debug" => Ok(LevelFilter::DEBUG),
		"trace" => Ok(LevelFilter::TRACE),
		_ => Err(PrecommitError::LogLevel(level.to_string())),
	}
}
