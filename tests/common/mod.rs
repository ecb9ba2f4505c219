//! Common test utilities for kusto-auth integration tests.
//!
//! # Live Test Prerequisites
//!
//! Tests marked `#[ignore]` acquire a real token and need a reachable
//! cluster plus a connection string describing how to authenticate:
//!
//! ```bash
//! export KUSTO_CONNECTION_STRING="https://mycluster.kusto.windows.net;AZ CLI=true"
//! cargo test --test token_provider_tests -- --ignored
//! ```
//!
//! All other tests run offline.

#![allow(dead_code)]

use async_trait::async_trait;
use azure_core::credentials::{AccessToken, TokenCredential, TokenRequestOptions};
use azure_core::error::{Error, ErrorKind};
use azure_core::time::{Duration, OffsetDateTime};
use kusto_auth::ConnectionStringBuilder;
use std::env;
use std::str::FromStr;

// ============================================================================
// Constants
// ============================================================================

/// Cluster used by offline tests.
pub const TEST_CLUSTER: &str = "https://help.kusto.windows.net/Samples";

/// Tenant used by offline tests.
pub const TEST_TENANT: &str = "72f988bf-86f1-41af-91ab-2d7cd011db47";

/// Client id used by offline tests.
pub const TEST_CLIENT_ID: &str = "11111111-2222-3333-4444-555555555555";

// ============================================================================
// Helpers
// ============================================================================

/// Parse a connection string for `TEST_CLUSTER` with extra `key=value` pairs.
pub fn kcsb_with(pairs: &[(&str, &str)]) -> ConnectionStringBuilder {
    let mut connection_string = TEST_CLUSTER.to_string();
    for (key, value) in pairs {
        connection_string.push_str(&format!(";{}={}", key, value));
    }
    ConnectionStringBuilder::from_str(&connection_string)
        .unwrap_or_else(|e| panic!("failed to parse {}: {}", connection_string, e))
}

/// The live connection string, if configured.
pub fn live_connection_string() -> Option<String> {
    env::var(kusto_auth::connection::CONNECTION_STRING_ENV)
        .ok()
        .filter(|value| !value.trim().is_empty())
}

// ============================================================================
// Credentials
// ============================================================================

/// Credential that always returns the same token.
#[derive(Debug)]
pub struct FixedCredential(pub &'static str);

#[async_trait]
impl TokenCredential for FixedCredential {
    async fn get_token(
        &self,
        _scopes: &[&str],
        _options: Option<TokenRequestOptions>,
    ) -> azure_core::Result<AccessToken> {
        Ok(AccessToken::new(
            self.0,
            OffsetDateTime::now_utc() + Duration::hours(1),
        ))
    }
}

/// Credential that never produces a token.
#[derive(Debug)]
pub struct FailingCredential;

#[async_trait]
impl TokenCredential for FailingCredential {
    async fn get_token(
        &self,
        _scopes: &[&str],
        _options: Option<TokenRequestOptions>,
    ) -> azure_core::Result<AccessToken> {
        Err(Error::message(ErrorKind::Credential, "credential unavailable"))
    }
}
