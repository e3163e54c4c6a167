use std::path::{Path, PathBuf};
use std::time::Duration;

use miette::{IntoDiagnostic, Result};
use serde::{Deserialize, Serialize};

use crate::filter::types::RuleKind;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    pub rules: RuleFiles,
    pub directory: Directory,
}

/// The four rule file paths. Fixed at construction; edits to the files
/// themselves are picked up by the freshness check, path changes require a
/// service restart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleFiles {
    /// Exact-equal forbidden passwords, one per line.
    pub match_file: PathBuf,
    /// Forbidden substrings, one per line.
    pub contains_file: PathBuf,
    /// Forbid-if-matches regular expressions, one per line.
    pub regex_file: PathBuf,
    /// Require-all regular expressions: a password is denied unless it
    /// matches every one of them.
    pub forbid_regex_file: PathBuf,
}

impl RuleFiles {
    pub fn path(&self, kind: RuleKind) -> &Path {
        match kind {
            RuleKind::Match => &self.match_file,
            RuleKind::Contains => &self.contains_file,
            RuleKind::Regex => &self.regex_file,
            RuleKind::ForbidRegex => &self.forbid_regex_file,
        }
    }
}

impl Default for RuleFiles {
    fn default() -> Self {
        Self {
            match_file: PathBuf::from("rules/match.txt"),
            contains_file: PathBuf::from("rules/contains.txt"),
            regex_file: PathBuf::from("rules/regex.txt"),
            forbid_regex_file: PathBuf::from("rules/forbid-regex.txt"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Directory {
    /// Upper bound on the identity lookup during evaluation. On timeout the
    /// identity-substring check is skipped, not failed.
    #[serde(default = "default_lookup_timeout_ms")]
    pub lookup_timeout_ms: u64,
}

fn default_lookup_timeout_ms() -> u64 {
    2000
}

impl Directory {
    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.lookup_timeout_ms)
    }
}

impl Default for Directory {
    fn default() -> Self {
        Self {
            lookup_timeout_ms: default_lookup_timeout_ms(),
        }
    }
}

impl Settings {
    pub fn load(path: &str) -> Result<Self> {
        let defaults = RuleFiles::default();
        let mut builder = config::Config::builder()
            .set_default(
                "rules.match_file",
                defaults.match_file.to_string_lossy().to_string(),
            )
            .into_diagnostic()?
            .set_default(
                "rules.contains_file",
                defaults.contains_file.to_string_lossy().to_string(),
            )
            .into_diagnostic()?
            .set_default(
                "rules.regex_file",
                defaults.regex_file.to_string_lossy().to_string(),
            )
            .into_diagnostic()?
            .set_default(
                "rules.forbid_regex_file",
                defaults.forbid_regex_file.to_string_lossy().to_string(),
            )
            .into_diagnostic()?
            .set_default("directory.lookup_timeout_ms", default_lookup_timeout_ms())
            .into_diagnostic()?;

        // Optional file
        if Path::new(path).exists() {
            builder = builder.add_source(config::File::with_name(path));
        }

        // Environment overrides: PALISADE__RULES__MATCH_FILE=/etc/..., etc.
        builder = builder.add_source(config::Environment::with_prefix("PALISADE").separator("__"));

        let cfg = builder.build().into_diagnostic()?;
        let mut s: Settings = cfg.try_deserialize().into_diagnostic()?;

        // Normalize rule paths to be absolute, relative to current dir
        let cwd = std::env::current_dir().into_diagnostic()?;
        for path in [
            &mut s.rules.match_file,
            &mut s.rules.contains_file,
            &mut s.rules.regex_file,
            &mut s.rules.forbid_regex_file,
        ] {
            if path.is_relative() {
                *path = cwd.join(&*path);
            }
        }

        Ok(s)
    }
}
