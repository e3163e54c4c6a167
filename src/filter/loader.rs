//! Line-oriented rule file parsing.
//!
//! Each loader reads the file's modification time **before** its content, so
//! a file edited mid-read shows up as stale on the next freshness check and
//! is re-read. Blank lines are skipped in all four files: the upstream
//! behavior of ingesting them would turn an empty contains entry into a rule
//! that denies every password.

use std::fs;
use std::path::Path;
use std::time::SystemTime;

use regex::Regex;

use crate::errors::FilterError;
use crate::filter::types::{ContainsPayload, MatchPayload, RegexPayload, RuleKind};

/// Load the exact-match forbidden password list, lowercased.
pub fn load_match(path: &Path) -> Result<(MatchPayload, SystemTime), FilterError> {
    let (lines, mtime) = read_rule_lines(path, RuleKind::Match)?;
    let payload = lines.into_iter().map(|(_, line)| line.to_lowercase()).collect();
    Ok((payload, mtime))
}

/// Load the forbidden substring list, lowercased, in file order.
pub fn load_contains(path: &Path) -> Result<(ContainsPayload, SystemTime), FilterError> {
    let (lines, mtime) = read_rule_lines(path, RuleKind::Contains)?;
    let payload = lines.into_iter().map(|(_, line)| line.to_lowercase()).collect();
    Ok((payload, mtime))
}

/// Load the forbid-if-matches patterns. Lines that fail to compile are
/// logged with their 1-based line number and dropped.
pub fn load_regex(path: &Path) -> Result<(RegexPayload, SystemTime), FilterError> {
    load_patterns(path, RuleKind::Regex)
}

/// Load the require-all patterns. Parsing is identical to [`load_regex`];
/// the inverted semantics apply only at evaluation.
pub fn load_forbid_regex(path: &Path) -> Result<(RegexPayload, SystemTime), FilterError> {
    load_patterns(path, RuleKind::ForbidRegex)
}

fn load_patterns(path: &Path, kind: RuleKind) -> Result<(RegexPayload, SystemTime), FilterError> {
    let (lines, mtime) = read_rule_lines(path, kind)?;
    let mut payload = Vec::with_capacity(lines.len());
    for (line_no, line) in lines {
        match Regex::new(&line) {
            Ok(regex) => payload.push(regex),
            Err(error) => {
                tracing::error!(
                    line = line_no,
                    path = %path.display(),
                    %error,
                    "ingest failed: pattern does not compile"
                );
            }
        }
    }
    Ok((payload, mtime))
}

/// Read all non-blank lines with their 1-based line numbers, plus the mtime
/// observed before the content was read. Tolerates LF and CRLF endings.
fn read_rule_lines(
    path: &Path,
    kind: RuleKind,
) -> Result<(Vec<(usize, String)>, SystemTime), FilterError> {
    let io_err = |source| FilterError::RuleFileLoad {
        role: kind.role(),
        path: path.display().to_string(),
        source,
    };
    let mtime = fs::metadata(path).and_then(|m| m.modified()).map_err(io_err)?;
    let content = fs::read_to_string(path).map_err(io_err)?;

    let lines = content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.is_empty())
        .map(|(idx, line)| (idx + 1, line.to_string()))
        .collect();
    Ok((lines, mtime))
}
