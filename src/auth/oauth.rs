//! Public-client user flows backed by the `oauth2` crate.
//!
//! The Azure SDK for Rust ships no username/password or interactive user
//! credential, so these two methods run the standard OAuth2 resource owner
//! password and device authorization grants against the cloud's AAD
//! endpoints, using the cluster's first-party client app id unless an
//! application client id is configured.

use crate::auth::cloud::{CloudInfo, ORGANIZATIONS_TENANT};
use crate::auth::source::TokenSource;
use crate::connection::SecureString;
use async_trait::async_trait;
use oauth2::basic::BasicClient;
use oauth2::reqwest::async_http_client;
use oauth2::{
    AuthType, AuthUrl, ClientId, DeviceAuthorizationUrl, ResourceOwnerPassword,
    ResourceOwnerUsername, Scope, StandardDeviceAuthorizationResponse, TokenResponse, TokenUrl,
};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Tokens are refreshed this long before they expire.
const REFRESH_MARGIN: Duration = Duration::from_secs(300);

/// What the user must do to finish an interactive login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceCodePrompt {
    pub verification_uri: String,
    pub user_code: String,
    /// Domain hint from the connection string, if any
    pub domain_hint: Option<String>,
}

impl fmt::Display for DeviceCodePrompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "To sign in, open {} and enter the code {}",
            self.verification_uri, self.user_code
        )?;
        if let Some(hint) = &self.domain_hint {
            write!(f, " (sign in with your {} account)", hint)?;
        }
        Ok(())
    }
}

/// Called when an interactive login needs the user.
pub type DeviceCodeCallback = Arc<dyn Fn(&DeviceCodePrompt) + Send + Sync>;

/// Build the OAuth2 public client for a tenant.
pub(crate) fn public_client(
    cloud: &CloudInfo,
    client_id: Option<&str>,
    tenant: Option<&str>,
) -> Result<BasicClient, String> {
    let tenant = tenant.unwrap_or(ORGANIZATIONS_TENANT);
    let client_id = client_id.unwrap_or(cloud.kusto_client_app_id.as_str());

    let auth_url = AuthUrl::new(cloud.authorize_endpoint(tenant))
        .map_err(|e| format!("invalid authorize endpoint: {}", e))?;
    let token_url = TokenUrl::new(cloud.token_endpoint(tenant))
        .map_err(|e| format!("invalid token endpoint: {}", e))?;
    let device_url = DeviceAuthorizationUrl::new(cloud.device_code_endpoint(tenant))
        .map_err(|e| format!("invalid device code endpoint: {}", e))?;

    debug!(tenant, client_id, "created public client");

    Ok(BasicClient::new(
        ClientId::new(client_id.to_string()),
        None,
        auth_url,
        Some(token_url),
    )
    .set_auth_type(AuthType::RequestBody)
    .set_device_authorization_url(device_url))
}

fn to_scopes<'a>(scopes: &'a [&'a str]) -> impl Iterator<Item = Scope> + 'a {
    scopes.iter().map(|scope| Scope::new(scope.to_string()))
}

struct CachedToken {
    token: SecureString,
    refresh_at: Instant,
}

impl CachedToken {
    fn new(token: SecureString, expires_in: Option<Duration>, now: Instant) -> Self {
        // Tokens without a lifetime are not reused
        let lifetime = expires_in.unwrap_or_default();
        Self {
            token,
            refresh_at: now + lifetime.saturating_sub(REFRESH_MARGIN),
        }
    }

    fn is_fresh(&self, now: Instant) -> bool {
        now < self.refresh_at
    }
}

type TokenSlot = Mutex<Option<CachedToken>>;

fn cached(slot: &Option<CachedToken>) -> Option<SecureString> {
    slot.as_ref()
        .filter(|cached| cached.is_fresh(Instant::now()))
        .map(|cached| cached.token.clone())
}

/// Resource owner password grant.
pub(crate) struct UsernamePasswordFlow {
    client: BasicClient,
    username: String,
    password: SecureString,
    cache: TokenSlot,
}

impl UsernamePasswordFlow {
    pub(crate) fn new(client: BasicClient, username: String, password: SecureString) -> Self {
        Self {
            client,
            username,
            password,
            cache: Mutex::new(None),
        }
    }
}

#[async_trait]
impl TokenSource for UsernamePasswordFlow {
    async fn token(&self, scopes: &[&str]) -> Result<SecureString, String> {
        let mut slot = self.cache.lock().await;
        if let Some(token) = cached(&slot) {
            return Ok(token);
        }

        let username = ResourceOwnerUsername::new(self.username.clone());
        let password = ResourceOwnerPassword::new(self.password.expose().to_string());
        let response = self
            .client
            .exchange_password(&username, &password)
            .add_scopes(to_scopes(scopes))
            .request_async(async_http_client)
            .await
            .map_err(|e| e.to_string())?;

        debug!(user = %self.username, "acquired user token");

        let token = SecureString::new(response.access_token().secret().as_str());
        *slot = Some(CachedToken::new(
            token.clone(),
            response.expires_in(),
            Instant::now(),
        ));
        Ok(token)
    }
}

/// Device authorization grant. The user completes sign-in in a browser,
/// possibly on another machine.
pub(crate) struct DeviceCodeFlow {
    client: BasicClient,
    domain_hint: Option<String>,
    on_prompt: Option<DeviceCodeCallback>,
    cache: TokenSlot,
}

impl DeviceCodeFlow {
    pub(crate) fn new(
        client: BasicClient,
        domain_hint: Option<String>,
        on_prompt: Option<DeviceCodeCallback>,
    ) -> Self {
        Self {
            client,
            domain_hint,
            on_prompt,
            cache: Mutex::new(None),
        }
    }
}

#[async_trait]
impl TokenSource for DeviceCodeFlow {
    async fn token(&self, scopes: &[&str]) -> Result<SecureString, String> {
        let mut slot = self.cache.lock().await;
        if let Some(token) = cached(&slot) {
            return Ok(token);
        }

        let details: StandardDeviceAuthorizationResponse = self
            .client
            .exchange_device_code()
            .map_err(|e| e.to_string())?
            .add_scopes(to_scopes(scopes))
            .request_async(async_http_client)
            .await
            .map_err(|e| e.to_string())?;

        let prompt = DeviceCodePrompt {
            verification_uri: details.verification_uri().to_string(),
            user_code: details.user_code().secret().to_string(),
            domain_hint: self.domain_hint.clone(),
        };
        warn!(
            verification_uri = %prompt.verification_uri,
            user_code = %prompt.user_code,
            "interactive login required"
        );
        if let Some(on_prompt) = &self.on_prompt {
            on_prompt(&prompt);
        }

        let response = self
            .client
            .exchange_device_access_token(&details)
            .request_async(async_http_client, tokio::time::sleep, None)
            .await
            .map_err(|e| e.to_string())?;

        let token = SecureString::new(response.access_token().secret().as_str());
        *slot = Some(CachedToken::new(
            token.clone(),
            response.expires_in(),
            Instant::now(),
        ));
        Ok(token)
    }
}
