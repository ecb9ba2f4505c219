//! Authentication method selection.

use crate::connection::ConnectionStringBuilder;
use std::fmt;

/// Authentication strategy chosen for a configuration record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthMethod {
    /// Interactive user login (device code)
    InteractiveLogin,
    /// AAD user id and password
    UserPassword,
    /// Application id and key
    ClientSecret,
    /// Application id and certificate
    ClientCertificate,
    /// System or user assigned managed identity
    ManagedIdentity,
    /// Kubernetes workload identity
    WorkloadIdentity,
    /// Pre-acquired user token
    UserToken,
    /// Pre-acquired application token
    ApplicationToken,
    /// Azure CLI account
    AzCli,
    /// Caller-supplied credential
    TokenCredential,
    /// Default credential chain
    Default,
}

impl AuthMethod {
    /// Pick the method for `kcsb`.
    ///
    /// Several modes may be populated at once; the first match in this order
    /// wins: interactive login, user/password, client secret, certificate,
    /// managed identity, workload identity, user token, application token,
    /// Azure CLI, supplied credential, default chain.
    pub fn select(kcsb: &ConnectionStringBuilder) -> Self {
        if kcsb.interactive_login {
            AuthMethod::InteractiveLogin
        } else if kcsb.aad_user_id.is_some() && kcsb.password().is_some() {
            AuthMethod::UserPassword
        } else if kcsb.application_client_id.is_some() && kcsb.application_key().is_some() {
            AuthMethod::ClientSecret
        } else if kcsb.has_certificate() {
            AuthMethod::ClientCertificate
        } else if kcsb.msi_authentication {
            AuthMethod::ManagedIdentity
        } else if kcsb.workload_authentication {
            AuthMethod::WorkloadIdentity
        } else if kcsb.user_token().is_some() {
            AuthMethod::UserToken
        } else if kcsb.application_token().is_some() {
            AuthMethod::ApplicationToken
        } else if kcsb.az_cli {
            AuthMethod::AzCli
        } else if kcsb.token_credential().is_some() {
            AuthMethod::TokenCredential
        } else {
            AuthMethod::Default
        }
    }
}

impl fmt::Display for AuthMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AuthMethod::InteractiveLogin => "interactive login",
            AuthMethod::UserPassword => "username/password",
            AuthMethod::ClientSecret => "client secret",
            AuthMethod::ClientCertificate => "client certificate",
            AuthMethod::ManagedIdentity => "managed identity",
            AuthMethod::WorkloadIdentity => "workload identity",
            AuthMethod::UserToken => "user token",
            AuthMethod::ApplicationToken => "application token",
            AuthMethod::AzCli => "azure cli",
            AuthMethod::TokenCredential => "token credential",
            AuthMethod::Default => "default credential",
        };
        f.write_str(name)
    }
}
