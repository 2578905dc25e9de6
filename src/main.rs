mod cli;
mod config;
mod decrypt;
mod error;
mod files;
mod rules;
mod validate;

use crate::cli::{Settings, build_cli};
use crate::decrypt::SopsDecryptor;
use crate::rules::{RuleMatcher, SopsRules};
use anyhow::{Context, anyhow};
use std::io::IsTerminal;
use std::process;
use tracing::level_filters::LevelFilter;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

fn main() {
	if let Err(e) = run() {
		eprintln!("Error: {:#}", e);
		process::exit(1);
	}
}

fn run() -> anyhow::Result<()> {
	let settings = Settings::from_matches(&build_cli().get_matches())?;
	init_logging(settings.log_level).context("initialising logging")?;
	debug!("debug logging enabled");

	let files = files::collect_files(settings.files, settings.empty_policy)?;
	if files.is_empty() {
		info!("no files to validate");
		return Ok(());
	}

	let rules = config::find_config_file(&settings.config_root)?.map(SopsRules::new);
	let filtered = validate::filter_files(rules.as_ref().map(|r| r as &dyn RuleMatcher), &files)?;

	let sops = SopsDecryptor::new(settings.sops_bin);
	validate::decrypt_files(&sops, &filtered)?;
	Ok(())
}

fn init_logging(level: LevelFilter) -> anyhow::Result<()> {
	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::default().add_directive(level.into()))
		.with_writer(std::io::stderr)
		.with_target(false)
		.with_ansi(std::io::stderr().is_terminal())
		.try_init()
		.map_err(|e| anyhow!(e))
}
