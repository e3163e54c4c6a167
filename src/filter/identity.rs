//! Directory lookup capability.
//!
//! The evaluator only needs a narrow contract: given an account name, return
//! whatever identity attributes the directory knows. Keeping it behind a
//! trait lets deployments wire in their directory client and lets tests
//! inject deterministic identities and fault injections.

use async_trait::async_trait;
use miette::Diagnostic;
use thiserror::Error;

use crate::filter::types::Identity;

/// The directory could not be reached or did not answer in time. The
/// evaluator treats this as "skip the identity check", not as a deny.
#[derive(Debug, Error, Diagnostic)]
#[error("directory lookup unavailable: {0}")]
#[diagnostic(code(palisade::identity_unavailable))]
pub struct IdentityUnavailable(pub String);

#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// Look up the identity attributes for `account`. An unknown account
    /// yields an [`Identity`] with every attribute absent.
    async fn lookup(&self, account: &str) -> Result<Identity, IdentityUnavailable>;
}

/// Resolver for deployments without a reachable directory (and for CLI
/// dry-runs): every account resolves to an empty identity, so the
/// identity-substring check never denies.
pub struct NullResolver;

#[async_trait]
impl IdentityResolver for NullResolver {
    async fn lookup(&self, _account: &str) -> Result<Identity, IdentityUnavailable> {
        Ok(Identity::default())
    }
}
