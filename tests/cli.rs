use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use predicates::str::contains;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const SOPS_CONFIG: &str = "creation_rules:\n  - path_regex: ^secrets/\n    age: age1examplerecipient\n";

fn cmd() -> Command {
	let mut cmd = cargo_bin_cmd!("sops-precommit");
	cmd.env_remove("SOPS_PRE_COMMIT_LOG_LEVEL")
		.env_remove("SOPS_PRE_COMMIT_SILENT")
		.env_remove("SOPS_PRE_COMMIT_ALLOW_EMPTY")
		.env_remove("SOPS_PRE_COMMIT_SOPS_BIN")
		.env_remove("SOPS_PRE_COMMIT_CONFIG_ROOT");
	cmd
}

/// A throwaway repository with a stub `sops` that accepts files carrying sops metadata.
struct Repo {
	dir: TempDir,
	sops: PathBuf,
}

impl Repo {
	fn new(config: Option<&str>) -> Self {
		let dir = TempDir::new().expect("create temp dir");
		fs::create_dir_all(dir.path().join("secrets")).expect("create secrets dir");
		if let Some(config) = config {
			fs::write(dir.path().join(".sops.yaml"), config).expect("write config");
		}
		let sops = write_stub_sops(dir.path());
		Repo { dir, sops }
	}

	fn encrypted(&self, name: &str) {
		fs::write(self.dir.path().join(name), "data: ENC[AES256_GCM,data:x]\nsops:\n  version: 3.8.1\n").expect("write encrypted file");
	}

	fn plaintext(&self, name: &str) {
		fs::write(self.dir.path().join(name), "data: hunter2\n").expect("write plaintext file");
	}

	fn cmd(&self) -> Command {
		let mut cmd = cmd();
		cmd.current_dir(self.dir.path()).arg("--sops-bin").arg(&self.sops);
		cmd
	}
}

#[cfg(unix)]
fn write_stub_sops(dir: &Path) -> PathBuf {
	use std::os::unix::fs::PermissionsExt;

	let path = dir.join("stub-sops");
	let script = "#!/bin/sh\nfor last; do :; done\ngrep -q '^sops:' \"$last\" || { echo \"sops metadata not found\" >&2; exit 1; }\ncat \"$last\"\n";
	fs::write(&path, script).expect("write stub sops");
	fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).expect("chmod stub sops");
	path
}

#[cfg(not(unix))]
fn write_stub_sops(dir: &Path) -> PathBuf {
	dir.join("stub-sops")
}

#[test]
fn help_lists_flags() {
	cmd().arg("--help").assert().success().stdout(contains("--log-level")).stdout(contains("--allow-empty"));
}

#[test]
fn invalid_log_level_fails() {
	cmd().args(["--log-level", "chatty", "a.yaml"]).assert().failure().stderr(contains("not a valid log level"));
}

#[test]
fn log_level_is_read_from_env() {
	cmd().env("SOPS_PRE_COMMIT_LOG_LEVEL", "chatty").arg("a.yaml").assert().failure().stderr(contains("\"chatty\""));
}

#[test]
fn empty_stdin_fails() {
	cmd().write_stdin("").assert().failure().stderr(contains("no input or input device"));
}

#[test]
fn blank_stdin_has_no_files() {
	cmd().write_stdin("\n\n").assert().failure().stderr(contains("no files to validate"));
}

#[test]
fn empty_change_set_allowed_by_flag() {
	cmd().arg("--allow-empty").write_stdin("").assert().success();
}

#[test]
fn empty_change_set_allowed_by_env() {
	cmd().env("SOPS_PRE_COMMIT_ALLOW_EMPTY", "true").write_stdin("\n").assert().success();
}

#[cfg(unix)]
#[test]
fn only_files_under_a_rule_are_decrypted() {
	let repo = Repo::new(Some(SOPS_CONFIG));
	repo.encrypted("secrets/a.yaml");
	repo.plaintext("b.yaml");

	repo.cmd()
		.args(["secrets/a.yaml", "b.yaml"])
		.assert()
		.success()
		.stderr(contains("File: secrets/a.yaml encryption validated"))
		.stderr(contains("b.yaml encryption validated").not());
}

#[cfg(unix)]
#[test]
fn plaintext_secret_fails_the_run() {
	let repo = Repo::new(Some(SOPS_CONFIG));
	repo.plaintext("secrets/secret.yaml");

	repo.cmd()
		.arg("secrets/secret.yaml")
		.assert()
		.failure()
		.stderr(contains("Error decrypting secrets/secret.yaml: sops metadata not found"))
		.stderr(contains("failed to validate encryption (1 of 1 files)"));
}

#[cfg(unix)]
#[test]
fn every_file_is_checked_after_a_failure() {
	let repo = Repo::new(Some(SOPS_CONFIG));
	repo.plaintext("secrets/first.yaml");
	repo.encrypted("secrets/second.yaml");
	repo.plaintext("secrets/third.json");

	repo.cmd()
		.args(["secrets/first.yaml", "secrets/second.yaml", "secrets/third.json"])
		.assert()
		.failure()
		.stderr(contains("Error decrypting secrets/first.yaml"))
		.stderr(contains("File: secrets/second.yaml encryption validated"))
		.stderr(contains("Error decrypting secrets/third.json"))
		.stderr(contains("(2 of 3 files)"));
}

#[cfg(unix)]
#[test]
fn deleted_secret_is_skipped() {
	let repo = Repo::new(Some(SOPS_CONFIG));

	repo.cmd().arg("secrets/removed.yaml").assert().success().stderr(contains("Secret: secrets/removed.yaml was deleted in this changeset"));
}

#[cfg(unix)]
#[test]
fn without_config_every_file_is_checked() {
	let repo = Repo::new(None);
	repo.encrypted("secrets/a.yaml");
	repo.plaintext("b.yaml");

	repo.cmd()
		.arg("--config-root")
		.arg(repo.dir.path())
		.args(["secrets/a.yaml", "b.yaml"])
		.assert()
		.failure()
		.stderr(contains("No sops config found in repo, testing all files."))
		.stderr(contains("Error decrypting b.yaml"));
}

#[cfg(unix)]
#[test]
fn quoted_stdin_entries() {
	let repo = Repo::new(Some(SOPS_CONFIG));
	repo.encrypted("secrets/a.yaml");
	repo.encrypted("secrets/b.env");

	repo.cmd()
		.write_stdin("\"secrets/a.yaml\"\n\nsecrets/b.env\n")
		.assert()
		.success()
		.stderr(contains("File: secrets/a.yaml encryption validated"))
		.stderr(contains("File: secrets/b.env encryption validated"));
}

#[cfg(unix)]
#[test]
fn silent_run_prints_nothing() {
	let repo = Repo::new(Some(SOPS_CONFIG));
	repo.encrypted("secrets/a.yaml");

	repo.cmd().args(["--silent", "secrets/a.yaml"]).assert().success().stdout("").stderr("");
}

#[cfg(unix)]
#[test]
fn plaintext_is_never_printed() {
	let repo = Repo::new(Some(SOPS_CONFIG));
	repo.encrypted("secrets/a.yaml");

	repo.cmd().args(["--log-level", "trace", "secrets/a.yaml"]).assert().success().stdout("").stderr(contains("ENC[").not());
}

#[cfg(unix)]
#[test]
fn broken_config_aborts_before_decrypting() {
	let repo = Repo::new(Some("creation_rules:\n  - path_regex: \"(unclosed\"\n"));
	repo.encrypted("secrets/a.yaml");

	repo.cmd()
		.arg("secrets/a.yaml")
		.assert()
		.failure()
		.stderr(contains("can not compile regexp"))
		.stderr(contains("encryption validated").not());
}

#[cfg(unix)]
#[test]
fn deleted_files_never_load_the_config() {
	let repo = Repo::new(Some("creation_rules: [\n"));

	repo.cmd().arg("secrets/removed.yaml").assert().success().stderr(contains("was deleted in this changeset"));
}

#[cfg(unix)]
#[test]
fn broken_rule_after_the_matching_one_is_ignored() {
	let repo = Repo::new(Some("creation_rules:\n  - path_regex: ^secrets/\n  - path_regex: \"(unclosed\"\n"));
	repo.encrypted("secrets/a.yaml");

	repo.cmd().arg("secrets/a.yaml").assert().success().stderr(contains("File: secrets/a.yaml encryption validated"));
}

#[cfg(unix)]
#[test]
fn absolute_path_through_symlinked_repo_matches_rules() {
	let repo = Repo::new(Some(SOPS_CONFIG));
	repo.plaintext("secrets/a.yaml");
	let outer = TempDir::new().expect("create temp dir");
	let link = outer.path().join("repo-link");
	std::os::unix::fs::symlink(repo.dir.path(), &link).expect("symlink repo");
	let file = link.join("secrets/a.yaml");

	repo.cmd()
		.arg("--config-root")
		.arg(&link)
		.arg(&file)
		.assert()
		.failure()
		.stderr(contains("Error decrypting"))
		.stderr(contains("sops metadata not found"));
}
