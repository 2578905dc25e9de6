use crate::error::{PrecommitError, PrecommitResult};
use regex::Regex;
use serde::Deserialize;
use std::cell::OnceCell;
use std::fs;
use std::path::{Path, PathBuf};

/// Outcome of asking whether a file falls under a creation rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleMatch {
	/// Index of the first matching rule in `creation_rules`.
	Matched { rule: usize },
	NoMatch,
}

pub trait RuleMatcher {
	fn match_file(&self, file: &str) -> PrecommitResult<RuleMatch>;
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
	#[serde(default)]
	creation_rules: Option<Vec<RawRule>>,
}

#[derive(Debug, Default, Deserialize)]
struct RawRule {
	#[serde(default)]
	path_regex: Option<String>,
	#[serde(default)]
	filename_regex: Option<String>,
}

/// A compiled creation rule. Broken rules are kept so they only fail when evaluation reaches them.
#[derive(Debug)]
enum Rule {
	Any,
	Regex(Regex),
	Invalid(String),
}

/// Creation rules read from a `.sops.yaml`, loaded on the first file that needs them.
#[derive(Debug)]
pub struct SopsRules {
	config_path: PathBuf,
	config_dir: PathBuf,
	rules: OnceCell<Vec<Rule>>,
}

impl SopsRules {
	pub fn new(config_path: PathBuf) -> Self {
		let config_dir = config_path.parent().map(Path::to_path_buf).unwrap_or_default();
		SopsRules { config_path, config_dir, rules: OnceCell::new() }
	}

	#[cfg(test)]
	fn from_yaml(config_dir: &Path, contents: &str) -> PrecommitResult<Self> {
		let sops = SopsRules::new(config_dir.join(".sops.yaml"));
		let rules = parse_rules(contents).map_err(|reason| rule_error(&sops.config_path, reason))?;
		sops.rules.get_or_init(|| rules);
		Ok(sops)
	}

	fn rules(&self) -> PrecommitResult<&[Rule]> {
		if let Some(rules) = self.rules.get() {
			return Ok(rules.as_slice());
		}
		let contents = fs::read_to_string(&self.config_path).map_err(|e| rule_error(&self.config_path, e))?;
		let rules = parse_rules(&contents).map_err(|reason| rule_error(&self.config_path, reason))?;
		Ok(self.rules.get_or_init(|| rules).as_slice())
	}

	/// Patterns are written relative to the directory holding `.sops.yaml`.
	fn relative_path<'a>(&self, file: &'a str) -> &'a str {
		Path::new(file).strip_prefix(&self.config_dir).ok().and_then(Path::to_str).unwrap_or(file)
	}
}

impl RuleMatcher for SopsRules {
	fn match_file(&self, file: &str) -> PrecommitResult<RuleMatch> {
		let target = self.relative_path(file);
		for (index, rule) in self.rules()?.iter().enumerate() {
			let hit = match rule {
				Rule::Any => true,
				Rule::Regex(re) => re.is_match(target),
				Rule::Invalid(reason) => return Err(rule_error(&self.config_path, reason)),
			};
			if hit {
				return Ok(RuleMatch::Matched { rule: index });
			}
		}
		Ok(RuleMatch::NoMatch)
	}
}

fn rule_error(config: &Path, reason: impl ToString) -> PrecommitError {
	PrecommitError::RuleMatch { config: config.to_path_buf(), reason: reason.to_string() }
}

fn parse_rules(contents: &str) -> Result<Vec<Rule>, String> {
	if contents.trim().is_empty() {
		return Ok(Vec::new());
	}
	let config: ConfigFile = serde_yaml::from_str(contents).map_err(|e| e.to_string())?;

	let rules = config
		.creation_rules
		.unwrap_or_default()
		.into_iter()
		.map(|rule| {
			let path_regex = rule.path_regex.filter(|r| !r.is_empty());
			let filename_regex = rule.filename_regex.filter(|r| !r.is_empty());
			match (path_regex, filename_regex) {
				(None, None) => Rule::Any,
				(Some(_), Some(_)) => Rule::Invalid("both filename_regex and path_regex were found, use only path_regex".to_string()),
				(Some(re), None) | (None, Some(re)) => match Regex::new(&re) {
					Ok(compiled) => Rule::Regex(compiled),
					Err(e) => Rule::Invalid(format!("can not compile regexp {re:?}: {e}")),
				},
			}
		})
		.collect();
	Ok(rules)
}
