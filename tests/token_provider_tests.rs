//! Integration tests for method selection and token provider construction.
//!
//! Construction never touches the network. The live test at the bottom is
//! `#[ignore]`d; see `common` for how to run it.

mod common;

use common::{
    kcsb_with, live_connection_string, FailingCredential, FixedCredential, TEST_CLIENT_ID,
    TEST_CLUSTER, TEST_TENANT,
};
use kusto_auth::auth::BEARER_TYPE;
use kusto_auth::{
    AuthError, AuthMethod, ConnectionError, ConnectionStringBuilder, TokenProvider,
    TokenProviderOptions,
};
use std::str::FromStr;
use std::sync::Arc;

// ============================================================================
// Construction per method
// ============================================================================

#[test]
fn test_username_password_provider() {
    let kcsb = kcsb_with(&[
        ("authority id", TEST_TENANT),
        ("application client id", TEST_CLIENT_ID),
        ("aad user id", "username"),
        ("password", "userpass"),
    ]);

    let provider = TokenProvider::new(&kcsb).unwrap();
    assert_eq!(provider.method(), AuthMethod::UserPassword);
}

#[test]
fn test_interactive_login_provider() {
    let kcsb = kcsb_with(&[
        ("interactivelogin", "true"),
        ("authority id", TEST_TENANT),
        ("application client id", TEST_CLIENT_ID),
    ]);

    let provider = TokenProvider::new(&kcsb).unwrap();
    assert_eq!(provider.method(), AuthMethod::InteractiveLogin);
}

#[test]
fn test_interactive_login_wins_over_client_secret() {
    let kcsb = kcsb_with(&[
        ("interactivelogin", "true"),
        ("authority id", TEST_TENANT),
        ("application client id", TEST_CLIENT_ID),
        ("application key", "somekey"),
    ]);

    let provider = TokenProvider::new(&kcsb).unwrap();
    assert_eq!(provider.method(), AuthMethod::InteractiveLogin);
}

#[test]
fn test_client_secret_provider() {
    let kcsb = ConnectionStringBuilder::new(TEST_CLUSTER)
        .with_aad_app_key(TEST_CLIENT_ID, "somekey", TEST_TENANT)
        .unwrap();

    let provider = kcsb.token_provider().unwrap();
    assert_eq!(provider.method(), AuthMethod::ClientSecret);
}

#[test]
fn test_user_assigned_managed_identity_provider() {
    let kcsb = ConnectionStringBuilder::new(TEST_CLUSTER)
        .with_user_managed_identity(TEST_CLIENT_ID)
        .unwrap();

    let provider = kcsb.token_provider().unwrap();
    assert_eq!(provider.method(), AuthMethod::ManagedIdentity);
}

#[test]
fn test_system_managed_identity_provider() {
    let kcsb = kcsb_with(&[("msi_authentication", "true")]);

    let provider = kcsb.token_provider().unwrap();
    assert_eq!(provider.method(), AuthMethod::ManagedIdentity);
}

#[test]
fn test_workload_identity_provider() {
    let token_file = std::env::temp_dir().join("kusto-auth-workload-token");
    std::fs::write(&token_file, "federated-token").unwrap();

    let kcsb = ConnectionStringBuilder::new(TEST_CLUSTER)
        .with_kubernetes_workload_identity(TEST_CLIENT_ID, &token_file, TEST_TENANT)
        .unwrap();

    let provider = kcsb.token_provider().unwrap();
    assert_eq!(provider.method(), AuthMethod::WorkloadIdentity);
}

#[test]
fn test_workload_identity_requires_token_file() {
    let err = ConnectionStringBuilder::new(TEST_CLUSTER)
        .with_kubernetes_workload_identity(TEST_CLIENT_ID, "", TEST_TENANT)
        .unwrap_err();
    assert_eq!(err.to_string(), "FederationTokenFilePath cannot be null");
}

#[test]
fn test_az_cli_provider() {
    let kcsb = kcsb_with(&[("az cli", "true")]);

    let provider = kcsb.token_provider().unwrap();
    assert_eq!(provider.method(), AuthMethod::AzCli);
}

#[test]
fn test_certificate_bytes_provider() {
    let kcsb = ConnectionStringBuilder::new(TEST_CLUSTER)
        .with_app_certificate_bytes(TEST_CLIENT_ID, vec![0x30, 0x82, 0x01], Some("pw"), true, TEST_TENANT)
        .unwrap();

    let provider = kcsb.token_provider().unwrap();
    assert_eq!(provider.method(), AuthMethod::ClientCertificate);
}

#[test]
fn test_certificate_path_provider() {
    let cert_file = std::env::temp_dir().join("kusto-auth-app-cert.pfx");
    std::fs::write(&cert_file, [0x30, 0x82, 0x01, 0x0a]).unwrap();

    let kcsb = ConnectionStringBuilder::new(TEST_CLUSTER)
        .with_app_certificate_path(TEST_CLIENT_ID, &cert_file, None, false, TEST_TENANT)
        .unwrap();

    let provider = kcsb.token_provider().unwrap();
    assert_eq!(provider.method(), AuthMethod::ClientCertificate);
}

#[test]
fn test_client_secret_requires_authority() {
    let kcsb = kcsb_with(&[
        ("application client id", TEST_CLIENT_ID),
        ("application key", "somekey"),
    ]);

    let err = kcsb.token_provider().unwrap_err();
    assert!(matches!(
        err,
        AuthError::InvalidConfiguration(ConnectionError::MissingValue("AuthorityId"))
    ));
}

#[test]
fn test_missing_data_source_is_rejected() {
    let kcsb = ConnectionStringBuilder::from_str("user token=t").unwrap();

    let err = TokenProvider::new(&kcsb).unwrap_err();
    assert!(matches!(err, AuthError::InvalidConfiguration(_)));
}

// ============================================================================
// Static tokens
// ============================================================================

#[tokio::test]
async fn test_user_token_provider() {
    let kcsb = ConnectionStringBuilder::new(TEST_CLUSTER)
        .with_aad_user_token("token")
        .unwrap();

    let provider = kcsb.token_provider().unwrap();
    let token = provider.acquire_token().await.unwrap();

    assert_eq!(provider.method(), AuthMethod::UserToken);
    assert_eq!(token.scheme(), BEARER_TYPE);
    assert_eq!(token.token(), "token");
}

#[tokio::test]
async fn test_application_token_provider() {
    let kcsb = kcsb_with(&[("application token", "token")]);

    let provider = kcsb.token_provider().unwrap();
    let token = provider.acquire_token().await.unwrap();

    assert_eq!(provider.method(), AuthMethod::ApplicationToken);
    assert_eq!(token.authorization_header(), "Bearer token");
}

#[tokio::test]
async fn test_repeated_acquisition_is_stable() {
    let kcsb = kcsb_with(&[("usertoken", "abc")]);
    let provider = TokenProvider::with_options(&kcsb, TokenProviderOptions::default()).unwrap();

    for _ in 0..3 {
        assert_eq!(provider.acquire_token().await.unwrap().token(), "abc");
    }
}

// ============================================================================
// Supplied credential
// ============================================================================

#[tokio::test]
async fn test_token_credential_provider() {
    let credential = Arc::new(FixedCredential("mine"));
    let kcsb = ConnectionStringBuilder::new(TEST_CLUSTER)
        .with_aad_user_token("ignored")
        .unwrap()
        .with_token_credential(credential)
        .unwrap();
    assert!(kcsb.user_token().is_none());

    let provider = kcsb.token_provider().unwrap();
    assert_eq!(provider.method(), AuthMethod::TokenCredential);

    let token = provider.acquire_token().await.unwrap();
    assert_eq!(token.token(), "mine");
    assert_eq!(token.authorization_header(), "Bearer mine");
}

#[tokio::test]
async fn test_token_credential_failure_names_method() {
    let kcsb = ConnectionStringBuilder::new(TEST_CLUSTER)
        .with_token_credential(Arc::new(FailingCredential))
        .unwrap();

    let err = kcsb.token_provider().unwrap().acquire_token().await.unwrap_err();
    assert!(matches!(
        err,
        AuthError::TokenAcquisition {
            method: AuthMethod::TokenCredential,
            ..
        }
    ));
    assert!(err.to_string().contains("credential unavailable"));
}

// ============================================================================
// Live
// ============================================================================

#[tokio::test]
#[ignore]
async fn test_live_token_acquisition() {
    let Some(connection_string) = live_connection_string() else {
        eprintln!("KUSTO_CONNECTION_STRING not set, skipping");
        return;
    };

    let kcsb = ConnectionStringBuilder::from_str(&connection_string).unwrap();
    let provider = kcsb.token_provider().unwrap();
    let token = provider.acquire_token().await.unwrap();

    assert!(!token.token().is_empty());
}
