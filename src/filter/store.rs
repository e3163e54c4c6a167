//! Published rule state shared between evaluations and reloads.
//!
//! Each kind sits in its own slot: an `Arc` to the compiled payload plus the
//! mtime observed at the start of the read that produced it. `snapshot()`
//! clones the four `Arc`s under short read locks, so the password-change
//! critical path never waits on loader I/O; `publish_*` swaps one slot, and
//! an old payload is freed once the last snapshot referencing it drops.

use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::SystemTime;

use crate::errors::FilterError;
use crate::filter::loader;
use crate::filter::types::{ContainsPayload, MatchPayload, RegexPayload, RuleKind};
use crate::settings::RuleFiles;

struct Slot<P> {
    payload: Arc<P>,
    mtime: SystemTime,
}

impl<P> Slot<P> {
    fn new(payload: P, mtime: SystemTime) -> RwLock<Self> {
        RwLock::new(Self {
            payload: Arc::new(payload),
            mtime,
        })
    }
}

pub struct RuleStore {
    paths: RuleFiles,
    matches: RwLock<Slot<MatchPayload>>,
    contains: RwLock<Slot<ContainsPayload>>,
    regexes: RwLock<Slot<RegexPayload>>,
    required: RwLock<Slot<RegexPayload>>,
}

/// An immutable, consistent view of all four payloads at a single instant.
/// Cheap to take and to hold; a snapshot outliving a reload keeps only the
/// payloads it references alive.
#[derive(Clone)]
pub struct RuleSnapshot {
    /// Exact-equal forbidden passwords, lowercased.
    pub matches: Arc<MatchPayload>,
    /// Forbidden substrings, lowercased.
    pub contains: Arc<ContainsPayload>,
    /// Forbid-if-matches patterns.
    pub regexes: Arc<RegexPayload>,
    /// Require-all patterns; a password must match every one.
    pub required: Arc<RegexPayload>,
}

impl RuleStore {
    /// Load all four rule files and publish their initial payloads.
    ///
    /// Any read failure here is fatal: coming up without rules would
    /// fail-open on an authentication path.
    pub fn open(paths: RuleFiles) -> Result<Self, FilterError> {
        for kind in RuleKind::ALL {
            tracing::info!(
                role = kind.role(),
                path = %paths.path(kind).display(),
                "opening rule file"
            );
        }
        let (matches, match_mtime) = loader::load_match(&paths.match_file)?;
        let (contains, contains_mtime) = loader::load_contains(&paths.contains_file)?;
        let (regexes, regex_mtime) = loader::load_regex(&paths.regex_file)?;
        let (required, required_mtime) = loader::load_forbid_regex(&paths.forbid_regex_file)?;
        tracing::info!("parsed all rule files");

        Ok(Self {
            matches: Slot::new(matches, match_mtime),
            contains: Slot::new(contains, contains_mtime),
            regexes: Slot::new(regexes, regex_mtime),
            required: Slot::new(required, required_mtime),
            paths,
        })
    }

    /// The configured source path for a kind. Immutable for the process
    /// lifetime.
    pub fn path(&self, kind: RuleKind) -> &Path {
        self.paths.path(kind)
    }

    /// Take a consistent view of all four payloads. Never fails, never
    /// blocks on a reload in progress beyond the four pointer reads.
    pub fn snapshot(&self) -> RuleSnapshot {
        RuleSnapshot {
            matches: read_slot(&self.matches),
            contains: read_slot(&self.contains),
            regexes: read_slot(&self.regexes),
            required: read_slot(&self.required),
        }
    }

    /// The mtime observed at the start of the read that produced the
    /// currently published payload for `kind`.
    pub fn last_seen_mtime(&self, kind: RuleKind) -> SystemTime {
        match kind {
            RuleKind::Match => read_mtime(&self.matches),
            RuleKind::Contains => read_mtime(&self.contains),
            RuleKind::Regex => read_mtime(&self.regexes),
            RuleKind::ForbidRegex => read_mtime(&self.required),
        }
    }

    pub fn publish_matches(&self, payload: MatchPayload, mtime: SystemTime) {
        write_slot(&self.matches, payload, mtime);
    }

    pub fn publish_contains(&self, payload: ContainsPayload, mtime: SystemTime) {
        write_slot(&self.contains, payload, mtime);
    }

    pub fn publish_regexes(&self, payload: RegexPayload, mtime: SystemTime) {
        write_slot(&self.regexes, payload, mtime);
    }

    pub fn publish_required(&self, payload: RegexPayload, mtime: SystemTime) {
        write_slot(&self.required, payload, mtime);
    }
}

fn read_slot<P>(slot: &RwLock<Slot<P>>) -> Arc<P> {
    slot.read()
        .unwrap_or_else(PoisonError::into_inner)
        .payload
        .clone()
}

fn read_mtime<P>(slot: &RwLock<Slot<P>>) -> SystemTime {
    slot.read().unwrap_or_else(PoisonError::into_inner).mtime
}

fn write_slot<P>(slot: &RwLock<Slot<P>>, payload: P, mtime: SystemTime) {
    let mut guard = slot.write().unwrap_or_else(PoisonError::into_inner);
    guard.payload = Arc::new(payload);
    guard.mtime = mtime;
}
