//! Token sources behind a [`TokenProvider`](super::TokenProvider).

use crate::connection::SecureString;
use async_trait::async_trait;
use azure_core::credentials::TokenCredential;
use std::sync::Arc;
use tracing::debug;

/// Something that can produce a bearer token for a set of scopes.
///
/// Errors are reported as messages; the provider attaches the method.
#[async_trait]
pub(crate) trait TokenSource: Send + Sync {
    async fn token(&self, scopes: &[&str]) -> Result<SecureString, String>;
}

/// A token supplied up front and returned verbatim.
pub(crate) struct StaticToken {
    token: SecureString,
}

impl StaticToken {
    pub(crate) fn new(token: SecureString) -> Self {
        Self { token }
    }
}

#[async_trait]
impl TokenSource for StaticToken {
    async fn token(&self, _scopes: &[&str]) -> Result<SecureString, String> {
        Ok(self.token.clone())
    }
}

/// Adapter over an Azure SDK credential. Caching and refresh are handled by
/// the SDK.
pub(crate) struct SdkCredential {
    credential: Arc<dyn TokenCredential>,
}

impl SdkCredential {
    pub(crate) fn new(credential: Arc<dyn TokenCredential>) -> Self {
        Self { credential }
    }
}

#[async_trait]
impl TokenSource for SdkCredential {
    async fn token(&self, scopes: &[&str]) -> Result<SecureString, String> {
        let access_token = self
            .credential
            .get_token(scopes, None)
            .await
            .map_err(|e| e.to_string())?;

        Ok(SecureString::new(access_token.token.secret()))
    }
}

/// Tries each credential in order; the first token wins.
pub(crate) struct CredentialChain {
    links: Vec<(&'static str, Arc<dyn TokenCredential>)>,
}

impl CredentialChain {
    pub(crate) fn new(links: Vec<(&'static str, Arc<dyn TokenCredential>)>) -> Self {
        Self { links }
    }
}

#[async_trait]
impl TokenSource for CredentialChain {
    async fn token(&self, scopes: &[&str]) -> Result<SecureString, String> {
        let mut failures = Vec::with_capacity(self.links.len());

        for (name, credential) in &self.links {
            match credential.get_token(scopes, None).await {
                Ok(access_token) => {
                    debug!(credential = *name, "credential chain produced a token");
                    return Ok(SecureString::new(access_token.token.secret()));
                }
                Err(e) => {
                    debug!(credential = *name, error = %e, "credential chain link failed");
                    failures.push(format!("{}: {}", name, e));
                }
            }
        }

        Err(format!(
            "no credential in the chain produced a token ({})",
            failures.join("; ")
        ))
    }
}
