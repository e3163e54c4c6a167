//! Opportunistic rule reloads driven by file modification times.

use std::fs;

use crate::errors::FilterError;
use crate::filter::loader;
use crate::filter::store::RuleStore;
use crate::filter::types::RuleKind;

/// Reload every kind whose on-disk mtime differs from the store's last-seen
/// mtime, in the fixed order Match, Contains, Regex, ForbidRegex.
///
/// Best-effort: a failure on one kind is logged and the previously published
/// payload stays in service; the remaining kinds are still checked.
pub fn refresh_stale(store: &RuleStore) {
    for kind in RuleKind::ALL {
        if let Err(error) = refresh_kind(store, kind) {
            tracing::error!(
                role = kind.role(),
                %error,
                "rule refresh failed; keeping previous payload"
            );
        }
    }
}

fn refresh_kind(store: &RuleStore, kind: RuleKind) -> Result<(), FilterError> {
    let path = store.path(kind);
    let on_disk = fs::metadata(path)
        .and_then(|m| m.modified())
        .map_err(|source| FilterError::RuleFileLoad {
            role: kind.role(),
            path: path.display().to_string(),
            source,
        })?;
    if on_disk == store.last_seen_mtime(kind) {
        return Ok(());
    }

    tracing::info!(role = kind.role(), path = %path.display(), "reloading rules: mtime changed");
    match kind {
        RuleKind::Match => {
            let (payload, mtime) = loader::load_match(path)?;
            store.publish_matches(payload, mtime);
        }
        RuleKind::Contains => {
            let (payload, mtime) = loader::load_contains(path)?;
            store.publish_contains(payload, mtime);
        }
        RuleKind::Regex => {
            let (payload, mtime) = loader::load_regex(path)?;
            store.publish_regexes(payload, mtime);
        }
        RuleKind::ForbidRegex => {
            let (payload, mtime) = loader::load_forbid_regex(path)?;
            store.publish_required(payload, mtime);
        }
    }
    Ok(())
}
