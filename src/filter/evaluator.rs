//! The policy state machine: ordered checks over one consistent snapshot.

use std::sync::Arc;
use std::time::Duration;

use crate::errors::FilterError;
use crate::filter::freshness;
use crate::filter::identity::IdentityResolver;
use crate::filter::store::RuleStore;
use crate::filter::types::{ForbiddenReason, Verdict};
use crate::settings::RuleFiles;

/// Target for security-sensitive records (matched poison substrings,
/// identity attribute hits), so a subscriber can route them to a separate
/// sink from the operational channel.
pub const SECURITY_TARGET: &str = "palisade::security";

pub struct Evaluator {
    store: RuleStore,
    resolver: Arc<dyn IdentityResolver>,
    lookup_timeout: Duration,
}

impl Evaluator {
    /// Load all four rule files and build an evaluator.
    ///
    /// A rule file that cannot be read at this point is fatal; once up, read
    /// failures during reload only keep the previous payload in service.
    pub fn new(
        rules: RuleFiles,
        resolver: Arc<dyn IdentityResolver>,
        lookup_timeout: Duration,
    ) -> Result<Self, FilterError> {
        let store = RuleStore::open(rules)?;

        let required = store.snapshot().required;
        if !required.is_empty() {
            // The require-all list has inverted semantics and a single
            // overly-narrow pattern denies every password.
            tracing::warn!(
                count = required.len(),
                "require-all patterns configured: a password is denied unless it matches EVERY one of them"
            );
        }

        Ok(Self {
            store,
            resolver,
            lookup_timeout,
        })
    }

    /// Decide whether `password` may be set for `account`.
    ///
    /// Total: rule-file trouble and directory outages become log records and
    /// degraded checks, never an error to the caller. Stale rule kinds are
    /// refreshed first, then every check runs against one snapshot; the
    /// first failing check wins and later kinds are not consulted. The
    /// directory is only contacted once all file-based checks have passed.
    pub async fn judge(&self, password: &str, account: &str) -> Verdict {
        freshness::refresh_stale(&self.store);
        let snapshot = self.store.snapshot();
        let lowered = password.to_lowercase();

        for substring in snapshot.contains.iter() {
            if lowered.contains(substring.as_str()) {
                tracing::warn!(
                    target: SECURITY_TARGET,
                    substring = %substring,
                    "password attempt contained poison substring (case-insensitive)"
                );
                return deny(ForbiddenReason::ContainsPoisonSubstring(substring.clone()));
            }
        }

        if snapshot.matches.contains(&lowered) {
            return deny(ForbiddenReason::MatchesForbiddenPassword);
        }

        for regex in snapshot.regexes.iter() {
            if regex.is_match(password) {
                return deny(ForbiddenReason::MatchesForbiddenPattern(
                    regex.as_str().to_string(),
                ));
            }
        }

        for regex in snapshot.required.iter() {
            if !regex.is_match(password) {
                return deny(ForbiddenReason::FailsRequiredPattern(
                    regex.as_str().to_string(),
                ));
            }
        }

        match tokio::time::timeout(self.lookup_timeout, self.resolver.lookup(account)).await {
            Ok(Ok(identity)) => {
                for (label, value) in identity.attributes() {
                    if value.is_empty() {
                        continue;
                    }
                    if lowered.contains(&value.to_lowercase()) {
                        tracing::warn!(
                            target: SECURITY_TARGET,
                            %label,
                            "password attempt contained an identity attribute"
                        );
                        return deny(ForbiddenReason::ContainsIdentityAttribute(label));
                    }
                }
            }
            Ok(Err(error)) => {
                tracing::warn!(account, %error, "skipping identity check");
            }
            Err(_) => {
                tracing::warn!(
                    account,
                    timeout_ms = self.lookup_timeout.as_millis() as u64,
                    "identity lookup timed out; skipping identity check"
                );
            }
        }

        tracing::info!("password passed filter");
        Verdict::Allow
    }

    /// Shared rule state, exposed for reload bookkeeping and tests.
    pub fn store(&self) -> &RuleStore {
        &self.store
    }
}

fn deny(reason: ForbiddenReason) -> Verdict {
    tracing::warn!(%reason, "password denied");
    Verdict::Deny(reason)
}
