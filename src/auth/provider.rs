//! Token provider construction.
//!
//! [`TokenProvider::new`] validates a [`ConnectionStringBuilder`], selects its
//! [`AuthMethod`] and builds the credential for it. Token acquisition itself
//! is delegated to `azure_identity` credentials or, for the user flows the
//! Azure SDK does not offer, to the `oauth2` crate.

use crate::auth::cloud::CloudInfo;
use crate::auth::method::AuthMethod;
use crate::auth::oauth::{self, DeviceCodeCallback, DeviceCodeFlow, UsernamePasswordFlow};
use crate::auth::source::{CredentialChain, SdkCredential, StaticToken, TokenSource};
use crate::connection::{ConnectionStringBuilder, SecureBytes, SecureString};
use crate::error::AuthError;
use azure_core::base64;
use azure_core::credentials::{Secret, TokenCredential};
use azure_identity::{
    AzureCliCredential, ClientCertificateCredential, ClientCertificateCredentialOptions,
    ClientSecretCredential, ManagedIdentityCredential, ManagedIdentityCredentialOptions,
    TokenCredentialOptions, UserAssignedId, WorkloadIdentityCredential,
    WorkloadIdentityCredentialOptions,
};
use std::fmt;
use std::fs;
use std::sync::Arc;
use tracing::{debug, info};

/// Token scheme used for every method.
pub const BEARER_TYPE: &str = "Bearer";

/// Optional knobs for [`TokenProvider::with_options`].
#[derive(Clone, Default)]
pub struct TokenProviderOptions {
    /// Invoked with the verification URL and code during interactive login
    pub device_code_callback: Option<DeviceCodeCallback>,

    /// Replaces the scopes derived from the cloud's resource id
    pub scopes: Option<Vec<String>>,
}

impl fmt::Debug for TokenProviderOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenProviderOptions")
            .field(
                "device_code_callback",
                &self.device_code_callback.as_ref().map(|_| "<callback>"),
            )
            .field("scopes", &self.scopes)
            .finish()
    }
}

/// A token and the scheme it is presented with.
#[derive(Clone)]
pub struct AuthToken {
    scheme: &'static str,
    token: SecureString,
}

impl AuthToken {
    pub fn scheme(&self) -> &str {
        self.scheme
    }

    /// The raw token (never log it).
    pub fn token(&self) -> &str {
        self.token.expose()
    }

    /// Value for the `Authorization` header.
    pub fn authorization_header(&self) -> String {
        format!("{} {}", self.scheme, self.token.expose())
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthToken")
            .field("scheme", &self.scheme)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Produces authorization tokens for a cluster.
pub struct TokenProvider {
    method: AuthMethod,
    scopes: Vec<String>,
    source: Arc<dyn TokenSource>,
}

impl TokenProvider {
    /// Build the provider for the method `kcsb` selects.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidConfiguration` if validation fails and
    /// `AuthError::CredentialCreation` if the certificate cannot be read or
    /// the identity library rejects the settings.
    pub fn new(kcsb: &ConnectionStringBuilder) -> Result<Self, AuthError> {
        Self::with_options(kcsb, TokenProviderOptions::default())
    }

    pub fn with_options(
        kcsb: &ConnectionStringBuilder,
        options: TokenProviderOptions,
    ) -> Result<Self, AuthError> {
        kcsb.validate()?;

        let method = AuthMethod::select(kcsb);
        let cloud = kcsb.cloud();
        let scopes = options.scopes.clone().unwrap_or_else(|| cloud.scopes());
        let source = build_source(method, kcsb, &cloud, &options)?;

        info!(
            data_source = %kcsb.data_source,
            %method,
            "selected authentication method"
        );

        Ok(Self {
            method,
            scopes,
            source,
        })
    }

    pub fn method(&self) -> AuthMethod {
        self.method
    }

    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }

    /// Acquire a token, from cache when the identity library has one.
    pub async fn acquire_token(&self) -> Result<AuthToken, AuthError> {
        let scopes: Vec<&str> = self.scopes.iter().map(String::as_str).collect();

        let token = self
            .source
            .token(&scopes)
            .await
            .map_err(|message| AuthError::TokenAcquisition {
                method: self.method,
                message,
            })?;

        debug!(method = %self.method, "acquired token");

        Ok(AuthToken {
            scheme: BEARER_TYPE,
            token,
        })
    }
}

impl fmt::Debug for TokenProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenProvider")
            .field("method", &self.method)
            .field("scopes", &self.scopes)
            .finish()
    }
}

fn build_source(
    method: AuthMethod,
    kcsb: &ConnectionStringBuilder,
    cloud: &CloudInfo,
    options: &TokenProviderOptions,
) -> Result<Arc<dyn TokenSource>, AuthError> {
    let creation_failed = |message: String| AuthError::CredentialCreation { method, message };
    let sdk_failed = |e: azure_core::Error| AuthError::CredentialCreation {
        method,
        message: e.to_string(),
    };
    let tenant = kcsb.authority_id.as_deref();

    let source: Arc<dyn TokenSource> = match method {
        AuthMethod::InteractiveLogin => {
            let client = oauth::public_client(cloud, kcsb.application_client_id.as_deref(), tenant)
                .map_err(creation_failed)?;
            Arc::new(DeviceCodeFlow::new(
                client,
                kcsb.redirect_url.clone(),
                options.device_code_callback.clone(),
            ))
        }
        AuthMethod::UserPassword => {
            let client = oauth::public_client(cloud, kcsb.application_client_id.as_deref(), tenant)
                .map_err(creation_failed)?;
            let (Some(user), Some(password)) = (&kcsb.aad_user_id, kcsb.password()) else {
                return Err(creation_failed("user id and password are required".to_string()));
            };
            Arc::new(UsernamePasswordFlow::new(
                client,
                user.clone(),
                password.clone(),
            ))
        }
        AuthMethod::ClientSecret => {
            let (Some(client_id), Some(key), Some(tenant)) =
                (&kcsb.application_client_id, kcsb.application_key(), tenant)
            else {
                return Err(creation_failed(
                    "application client id, key and authority id are required".to_string(),
                ));
            };
            let credential: Arc<dyn TokenCredential> = ClientSecretCredential::new(
                tenant,
                client_id.clone(),
                Secret::new(key.expose().to_string()),
                None,
            )
            .map_err(sdk_failed)?;
            Arc::new(SdkCredential::new(credential))
        }
        AuthMethod::ClientCertificate => {
            let (Some(client_id), Some(tenant)) = (&kcsb.application_client_id, tenant) else {
                return Err(creation_failed(
                    "application client id and authority id are required".to_string(),
                ));
            };
            let certificate = load_certificate(kcsb).map_err(creation_failed)?;
            let password = kcsb
                .application_certificate_password()
                .map(|password| password.expose().to_string())
                .unwrap_or_default();

            let mut token_options = TokenCredentialOptions::default();
            token_options.set_authority_host(cloud.login_endpoint.clone());
            let credential: Arc<dyn TokenCredential> = ClientCertificateCredential::new(
                tenant.to_string(),
                client_id.clone(),
                Secret::new(base64::encode(certificate.expose())),
                Secret::new(password),
                ClientCertificateCredentialOptions::new(
                    token_options,
                    kcsb.send_certificate_chain,
                ),
            )
            .map_err(sdk_failed)?;
            Arc::new(SdkCredential::new(credential))
        }
        AuthMethod::ManagedIdentity => {
            let options = ManagedIdentityCredentialOptions {
                user_assigned_id: kcsb
                    .managed_service_identity
                    .clone()
                    .map(UserAssignedId::ClientId),
                ..Default::default()
            };
            let credential: Arc<dyn TokenCredential> =
                ManagedIdentityCredential::new(Some(options)).map_err(sdk_failed)?;
            Arc::new(SdkCredential::new(credential))
        }
        AuthMethod::WorkloadIdentity => {
            let options = WorkloadIdentityCredentialOptions {
                client_id: kcsb.application_client_id.clone(),
                tenant_id: kcsb.authority_id.clone(),
                token_file_path: kcsb.federation_token_file_path.clone(),
                ..Default::default()
            };
            let credential: Arc<dyn TokenCredential> =
                WorkloadIdentityCredential::new(Some(options)).map_err(sdk_failed)?;
            Arc::new(SdkCredential::new(credential))
        }
        AuthMethod::UserToken | AuthMethod::ApplicationToken => {
            let token = if method == AuthMethod::UserToken {
                kcsb.user_token()
            } else {
                kcsb.application_token()
            };
            let token = token
                .cloned()
                .ok_or_else(|| creation_failed("token is required".to_string()))?;
            Arc::new(StaticToken::new(token))
        }
        AuthMethod::AzCli => {
            let credential: Arc<dyn TokenCredential> =
                AzureCliCredential::new(None).map_err(sdk_failed)?;
            Arc::new(SdkCredential::new(credential))
        }
        AuthMethod::TokenCredential => {
            let credential = kcsb
                .token_credential()
                .cloned()
                .ok_or_else(|| creation_failed("credential is required".to_string()))?;
            Arc::new(SdkCredential::new(credential))
        }
        AuthMethod::Default => {
            let cli: Arc<dyn TokenCredential> =
                AzureCliCredential::new(None).map_err(sdk_failed)?;
            let managed: Arc<dyn TokenCredential> =
                ManagedIdentityCredential::new(None).map_err(sdk_failed)?;
            Arc::new(CredentialChain::new(vec![
                ("azure cli", cli),
                ("managed identity", managed),
            ]))
        }
    };

    Ok(source)
}

/// PKCS#12 certificate from memory, or read from the configured path.
fn load_certificate(kcsb: &ConnectionStringBuilder) -> Result<SecureBytes, String> {
    if let Some(bytes) = kcsb.application_certificate_bytes() {
        return Ok(bytes.clone());
    }
    let path = kcsb
        .application_certificate_path
        .as_ref()
        .ok_or_else(|| "no application certificate configured".to_string())?;
    let bytes = fs::read(path)
        .map_err(|e| format!("failed to read certificate {}: {}", path.display(), e))?;
    debug!(path = %path.display(), "loaded application certificate");
    Ok(SecureBytes::new(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn provider(s: &str) -> Result<TokenProvider, AuthError> {
        TokenProvider::new(&ConnectionStringBuilder::from_str(s).unwrap())
    }

    #[tokio::test]
    async fn test_user_token_returned_verbatim() {
        let provider = provider("https://endpoint;user token=usertoken").unwrap();

        assert_eq!(provider.method(), AuthMethod::UserToken);
        let token = provider.acquire_token().await.unwrap();
        assert_eq!(token.token(), "usertoken");
        assert_eq!(token.scheme(), "Bearer");
        assert_eq!(token.authorization_header(), "Bearer usertoken");
    }

    #[tokio::test]
    async fn test_application_token_returned_verbatim() {
        let provider = provider("https://endpoint;application token=apptoken").unwrap();

        assert_eq!(provider.method(), AuthMethod::ApplicationToken);
        assert_eq!(provider.acquire_token().await.unwrap().token(), "apptoken");
    }

    #[test]
    fn test_default_scopes() {
        let provider = provider("https://endpoint;user token=t").unwrap();
        assert_eq!(provider.scopes(), ["https://kusto.kusto.windows.net/.default"]);
    }

    #[test]
    fn test_scopes_override() {
        let kcsb = ConnectionStringBuilder::from_str("https://endpoint;user token=t").unwrap();
        let options = TokenProviderOptions {
            scopes: Some(vec!["https://mycluster/.default".to_string()]),
            ..Default::default()
        };
        let provider = TokenProvider::with_options(&kcsb, options).unwrap();
        assert_eq!(provider.scopes(), ["https://mycluster/.default"]);
    }

    #[test]
    fn test_user_password_provider() {
        let provider =
            provider("https://endpoint;tenant=tenantID;appclientid=clientID;aad user id=u;password=p")
                .unwrap();
        assert_eq!(provider.method(), AuthMethod::UserPassword);
    }

    #[test]
    fn test_interactive_provider() {
        let provider =
            provider("https://endpoint;interactive login=true;tenant=tenantID;appclientid=clientID")
                .unwrap();
        assert_eq!(provider.method(), AuthMethod::InteractiveLogin);
    }

    #[test]
    fn test_client_secret_provider() {
        let provider = provider(
            "https://endpoint;tenant=72f988bf-86f1-41af-91ab-2d7cd011db47;appclientid=clientID;appkey=somekey",
        )
        .unwrap();
        assert_eq!(provider.method(), AuthMethod::ClientSecret);
    }

    #[test]
    fn test_certificate_provider_from_file() {
        let path = std::env::temp_dir().join("kusto-auth-provider-cert.pfx");
        std::fs::write(&path, [0x30, 0x82, 0x01, 0x0a]).unwrap();

        let provider = provider(&format!(
            "https://endpoint;appclientid=c;tenant=t;application certificate={};sendx5c=true",
            path.display()
        ))
        .unwrap();
        assert_eq!(provider.method(), AuthMethod::ClientCertificate);
    }

    #[test]
    fn test_certificate_file_missing() {
        let err = provider(
            "https://endpoint;appclientid=c;tenant=t;application certificate=/nonexistent/app.pfx",
        )
        .unwrap_err();
        assert!(matches!(
            err,
            AuthError::CredentialCreation {
                method: AuthMethod::ClientCertificate,
                ..
            }
        ));
        assert!(err.to_string().contains("/nonexistent/app.pfx"));
    }

    #[test]
    fn test_load_certificate_prefers_bytes() {
        let kcsb = ConnectionStringBuilder::new("https://endpoint")
            .with_app_certificate_bytes("c", vec![1, 2, 3], Some("pw"), false, "t")
            .unwrap();
        assert_eq!(load_certificate(&kcsb).unwrap().expose(), &[1, 2, 3]);
    }

    #[test]
    fn test_invalid_configuration_rejected() {
        let err = provider("https://endpoint;password=p").unwrap_err();
        assert!(matches!(err, AuthError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_token_debug_redacted() {
        let token = AuthToken {
            scheme: BEARER_TYPE,
            token: SecureString::new("secret-token"),
        };
        let debug = format!("{:?}", token);
        assert!(!debug.contains("secret-token"));
    }
}
