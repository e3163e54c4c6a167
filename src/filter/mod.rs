//! Password-policy evaluation engine.
//!
//! Four line-oriented rule files compose into a single verdict, checked in a
//! fixed order with first-deny-wins semantics: forbidden substrings, exact
//! forbidden passwords, forbid-if-matches patterns, require-all patterns,
//! then identity-attribute substrings fetched from the directory. Rule files
//! are edited out-of-band and reloaded opportunistically at the start of
//! every evaluation, keyed on modification time.

#[cfg(test)]
pub(crate) mod capture;
pub mod evaluator;
pub mod freshness;
pub mod identity;
pub mod loader;
pub mod store;
pub mod types;

pub use evaluator::{Evaluator, SECURITY_TARGET};
pub use identity::{IdentityResolver, IdentityUnavailable, NullResolver};
pub use store::{RuleSnapshot, RuleStore};
pub use types::{ForbiddenReason, Identity, IdentityLabel, RuleKind, Verdict};
