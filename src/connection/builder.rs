//! Connection string parsing and the configuration record it produces.
//!
//! A connection string is a `;`-separated list of `key=value` pairs. The first
//! segment may be a bare cluster URL, which is shorthand for
//! `Data Source=<url>`.

use crate::auth::{AuthMethod, CloudInfo, TokenProvider};
use crate::connection::connector::ConnectorDetails;
use crate::connection::keywords::Keyword;
use crate::connection::secret::{SecureBytes, SecureString};
use crate::error::{AuthError, ConnectionError};
use azure_core::credentials::TokenCredential;
use std::borrow::Cow;
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;

/// Environment variable read by [`ConnectionStringBuilder::from_env`].
pub const CONNECTION_STRING_ENV: &str = "KUSTO_CONNECTION_STRING";

/// Authentication configuration for a cluster.
///
/// Created by parsing a connection string or with [`ConnectionStringBuilder::new`],
/// adjusted with the `with_*` methods, then handed to [`TokenProvider::new`].
/// Several modes may be populated at once; [`AuthMethod::select`] decides
/// which one wins.
#[derive(Clone, Default)]
pub struct ConnectionStringBuilder {
    /// Cluster URL
    pub data_source: String,

    /// AAD user id for username/password authentication
    pub aad_user_id: Option<String>,

    password: Option<SecureString>,

    user_token: Option<SecureString>,

    /// AAD application (client) id
    pub application_client_id: Option<String>,

    application_key: Option<SecureString>,

    /// AAD tenant id
    pub authority_id: Option<String>,

    /// Path to a PKCS#12 application certificate
    pub application_certificate_path: Option<PathBuf>,

    application_certificate_bytes: Option<SecureBytes>,

    application_certificate_password: Option<SecureString>,

    /// Send the x5c certificate chain with certificate authentication
    pub send_certificate_chain: bool,

    application_token: Option<SecureString>,

    /// Authenticate with the Azure CLI's logged in account
    pub az_cli: bool,

    /// Authenticate with a managed identity
    pub msi_authentication: bool,

    /// Client id of a user-assigned managed identity
    pub managed_service_identity: Option<String>,

    /// Authenticate with Kubernetes workload identity
    pub workload_authentication: bool,

    /// Federated token file used by workload identity
    pub federation_token_file_path: Option<PathBuf>,

    /// Authenticate interactively as a user
    pub interactive_login: bool,

    /// Domain hint for interactive login
    pub redirect_url: Option<String>,

    /// Fall back to the default credential chain
    pub default_auth: bool,

    token_credential: Option<Arc<dyn TokenCredential>>,

    /// Application tracing value, see [`ConnectorDetails`]
    pub application_for_tracing: Option<String>,

    /// User tracing value, see [`ConnectorDetails`]
    pub user_for_tracing: Option<String>,

    /// Cloud endpoints; public cloud when unset
    pub cloud_info: Option<CloudInfo>,
}

impl ConnectionStringBuilder {
    /// Create a builder for a cluster with no authentication configured.
    pub fn new(data_source: &str) -> Self {
        Self {
            data_source: data_source.trim().to_string(),
            ..Self::default()
        }
    }

    /// Parse the connection string stored in `KUSTO_CONNECTION_STRING`.
    pub fn from_env() -> Result<Self, ConnectionError> {
        let value = env::var(CONNECTION_STRING_ENV).map_err(|_| {
            ConnectionError::InvalidParameter {
                parameter: CONNECTION_STRING_ENV.to_string(),
                message: "Environment variable is not set".to_string(),
            }
        })?;
        Self::from_str(&value)
    }

    pub fn password(&self) -> Option<&SecureString> {
        self.password.as_ref()
    }

    pub fn user_token(&self) -> Option<&SecureString> {
        self.user_token.as_ref()
    }

    pub fn application_key(&self) -> Option<&SecureString> {
        self.application_key.as_ref()
    }

    pub fn application_token(&self) -> Option<&SecureString> {
        self.application_token.as_ref()
    }

    pub fn application_certificate_bytes(&self) -> Option<&SecureBytes> {
        self.application_certificate_bytes.as_ref()
    }

    pub fn application_certificate_password(&self) -> Option<&SecureString> {
        self.application_certificate_password.as_ref()
    }

    pub fn token_credential(&self) -> Option<&Arc<dyn TokenCredential>> {
        self.token_credential.as_ref()
    }

    /// Username/password authentication.
    pub fn with_aad_user_password_auth(
        mut self,
        user_id: &str,
        password: &str,
        authority_id: &str,
    ) -> Result<Self, ConnectionError> {
        self.require_data_source()?;
        require_non_empty("AADUserID", user_id)?;
        require_non_empty("Password", password)?;

        self.reset_auth();
        self.aad_user_id = Some(user_id.to_string());
        self.password = Some(SecureString::new(password));
        self.authority_id = non_empty(authority_id);
        Ok(self)
    }

    /// Authenticate with a pre-acquired user token.
    pub fn with_aad_user_token(mut self, user_token: &str) -> Result<Self, ConnectionError> {
        self.require_data_source()?;
        require_non_empty("UserToken", user_token)?;

        self.reset_auth();
        self.user_token = Some(SecureString::new(user_token));
        Ok(self)
    }

    /// Application id and key (client secret) authentication.
    pub fn with_aad_app_key(
        mut self,
        client_id: &str,
        application_key: &str,
        authority_id: &str,
    ) -> Result<Self, ConnectionError> {
        self.require_data_source()?;
        require_non_empty("ApplicationClientId", client_id)?;
        require_non_empty("ApplicationKey", application_key)?;

        self.reset_auth();
        self.application_client_id = Some(client_id.to_string());
        self.application_key = Some(SecureString::new(application_key));
        self.authority_id = non_empty(authority_id);
        Ok(self)
    }

    /// Application certificate authentication from a PKCS#12 file.
    pub fn with_app_certificate_path(
        mut self,
        client_id: &str,
        certificate_path: impl AsRef<Path>,
        certificate_password: Option<&str>,
        send_certificate_chain: bool,
        authority_id: &str,
    ) -> Result<Self, ConnectionError> {
        self.require_data_source()?;
        require_non_empty("ApplicationClientId", client_id)?;
        let certificate_path = certificate_path.as_ref();
        if certificate_path.as_os_str().is_empty() {
            return Err(ConnectionError::MissingValue("ApplicationCertificatePath"));
        }

        self.reset_auth();
        self.application_client_id = Some(client_id.to_string());
        self.application_certificate_path = Some(certificate_path.to_path_buf());
        self.application_certificate_password = certificate_password.map(SecureString::new);
        self.send_certificate_chain = send_certificate_chain;
        self.authority_id = non_empty(authority_id);
        Ok(self)
    }

    /// Application certificate authentication from in-memory PKCS#12 bytes.
    pub fn with_app_certificate_bytes(
        mut self,
        client_id: &str,
        certificate: Vec<u8>,
        certificate_password: Option<&str>,
        send_certificate_chain: bool,
        authority_id: &str,
    ) -> Result<Self, ConnectionError> {
        self.require_data_source()?;
        require_non_empty("ApplicationClientId", client_id)?;
        if certificate.is_empty() {
            return Err(ConnectionError::MissingValue("ApplicationCertificateBytes"));
        }

        self.reset_auth();
        self.application_client_id = Some(client_id.to_string());
        self.application_certificate_bytes = Some(SecureBytes::new(certificate));
        self.application_certificate_password = certificate_password.map(SecureString::new);
        self.send_certificate_chain = send_certificate_chain;
        self.authority_id = non_empty(authority_id);
        Ok(self)
    }

    /// Authenticate with a pre-acquired application token.
    pub fn with_application_token(
        mut self,
        client_id: &str,
        application_token: &str,
    ) -> Result<Self, ConnectionError> {
        self.require_data_source()?;
        require_non_empty("ApplicationToken", application_token)?;

        self.reset_auth();
        self.application_client_id = non_empty(client_id);
        self.application_token = Some(SecureString::new(application_token));
        Ok(self)
    }

    /// Use the account the Azure CLI is logged in with.
    pub fn with_az_cli(mut self) -> Result<Self, ConnectionError> {
        self.require_data_source()?;

        self.reset_auth();
        self.az_cli = true;
        Ok(self)
    }

    /// Use the system-assigned managed identity.
    pub fn with_system_managed_identity(mut self) -> Result<Self, ConnectionError> {
        self.require_data_source()?;

        self.reset_auth();
        self.msi_authentication = true;
        Ok(self)
    }

    /// Use a user-assigned managed identity, identified by client id.
    pub fn with_user_managed_identity(mut self, client_id: &str) -> Result<Self, ConnectionError> {
        self.require_data_source()?;
        require_non_empty("ManagedServiceIdentity", client_id)?;

        self.reset_auth();
        self.msi_authentication = true;
        self.managed_service_identity = Some(client_id.to_string());
        Ok(self)
    }

    /// Exchange a Kubernetes federated token for an AAD token.
    ///
    /// An empty authority falls back to `AZURE_TENANT_ID` at token time.
    pub fn with_kubernetes_workload_identity(
        mut self,
        client_id: &str,
        token_file_path: impl AsRef<Path>,
        authority_id: &str,
    ) -> Result<Self, ConnectionError> {
        self.require_data_source()?;
        require_non_empty("ApplicationClientId", client_id)?;
        let token_file_path = token_file_path.as_ref();
        if token_file_path.as_os_str().is_empty() {
            return Err(ConnectionError::MissingValue("FederationTokenFilePath"));
        }

        self.reset_auth();
        self.application_client_id = Some(client_id.to_string());
        self.federation_token_file_path = Some(token_file_path.to_path_buf());
        self.authority_id = non_empty(authority_id);
        self.workload_authentication = true;
        Ok(self)
    }

    /// Interactive user login.
    pub fn with_interactive_login(mut self, authority_id: &str) -> Result<Self, ConnectionError> {
        self.require_data_source()?;

        self.reset_auth();
        self.interactive_login = true;
        self.authority_id = non_empty(authority_id);
        Ok(self)
    }

    /// Use the default credential chain.
    pub fn with_default_azure_credential(mut self) -> Result<Self, ConnectionError> {
        self.require_data_source()?;

        self.reset_auth();
        self.default_auth = true;
        Ok(self)
    }

    /// Authenticate with a caller-supplied credential.
    pub fn with_token_credential(
        mut self,
        credential: Arc<dyn TokenCredential>,
    ) -> Result<Self, ConnectionError> {
        self.require_data_source()?;

        self.reset_auth();
        self.token_credential = Some(credential);
        Ok(self)
    }

    /// Record the connector and application issuing requests.
    pub fn set_connector_details(mut self, details: &ConnectorDetails) -> Self {
        self.application_for_tracing = Some(details.application_for_tracing());
        self.user_for_tracing = Some(details.user_for_tracing());
        self
    }

    /// Use endpoints from a cluster's auth metadata instead of the public cloud.
    pub fn with_cloud_info(mut self, cloud_info: CloudInfo) -> Self {
        self.cloud_info = Some(cloud_info);
        self
    }

    /// Check that the populated fields form a usable configuration.
    pub fn validate(&self) -> Result<(), ConnectionError> {
        self.require_data_source()?;

        if self.password.is_some() && self.aad_user_id.is_none() {
            return Err(ConnectionError::MissingValue("AADUserID"));
        }
        if self.application_key.is_some() && self.application_client_id.is_none() {
            return Err(ConnectionError::MissingValue("ApplicationClientId"));
        }
        if self.has_certificate() && self.application_client_id.is_none() {
            return Err(ConnectionError::MissingValue("ApplicationClientId"));
        }
        // Application grants need a concrete tenant
        if (self.application_key.is_some() || self.has_certificate())
            && self.authority_id.is_none()
        {
            return Err(ConnectionError::MissingValue("AuthorityId"));
        }
        if self.workload_authentication {
            if self.application_client_id.is_none() {
                return Err(ConnectionError::MissingValue("ApplicationClientId"));
            }
            if self.federation_token_file_path.is_none() {
                return Err(ConnectionError::MissingValue("FederationTokenFilePath"));
            }
        }
        Ok(())
    }

    /// The authentication method these settings select.
    pub fn auth_method(&self) -> AuthMethod {
        AuthMethod::select(self)
    }

    /// Validate and build the token provider for the selected method.
    pub fn token_provider(&self) -> Result<TokenProvider, AuthError> {
        TokenProvider::new(self)
    }

    /// Cloud endpoints in effect.
    pub fn cloud(&self) -> CloudInfo {
        self.cloud_info.clone().unwrap_or_default()
    }

    pub(crate) fn has_certificate(&self) -> bool {
        self.application_certificate_path.is_some() || self.application_certificate_bytes.is_some()
    }

    fn require_data_source(&self) -> Result<(), ConnectionError> {
        require_non_empty("DataSource", &self.data_source)
    }

    /// Clear every authentication field. Data source, tracing values and the
    /// cloud override are kept.
    fn reset_auth(&mut self) {
        *self = Self {
            data_source: std::mem::take(&mut self.data_source),
            application_for_tracing: self.application_for_tracing.take(),
            user_for_tracing: self.user_for_tracing.take(),
            cloud_info: self.cloud_info.take(),
            ..Self::default()
        };
    }

    fn assign(&mut self, keyword: Keyword, value: &str) -> Result<(), ConnectionError> {
        match keyword {
            Keyword::DataSource => self.data_source = value.to_string(),
            Keyword::AadUserId => self.aad_user_id = Some(value.to_string()),
            Keyword::Password => self.password = Some(SecureString::new(value)),
            Keyword::ApplicationClientId => self.application_client_id = Some(value.to_string()),
            Keyword::ApplicationKey => self.application_key = Some(SecureString::new(value)),
            Keyword::ApplicationCertificate => {
                self.application_certificate_path = Some(PathBuf::from(value))
            }
            Keyword::ApplicationCertificateX5c => {
                self.send_certificate_chain = parse_bool(keyword, value)?
            }
            Keyword::AuthorityId => self.authority_id = Some(value.to_string()),
            Keyword::ApplicationToken => self.application_token = Some(SecureString::new(value)),
            Keyword::UserToken => self.user_token = Some(SecureString::new(value)),
            Keyword::MsiAuthentication => self.msi_authentication = parse_bool(keyword, value)?,
            Keyword::ManagedServiceIdentity => {
                self.managed_service_identity = Some(value.to_string())
            }
            Keyword::AzCli => self.az_cli = parse_bool(keyword, value)?,
            Keyword::InteractiveLogin => self.interactive_login = parse_bool(keyword, value)?,
            Keyword::DomainHint => self.redirect_url = Some(value.to_string()),
        }
        Ok(())
    }

    /// Populated fields in rendering order. Secret values are borrowed as-is;
    /// `Display` redacts them by keyword.
    fn rendered_pairs(&self) -> Vec<(Keyword, Cow<'_, str>)> {
        let fields = [
            (Keyword::DataSource, Some(Cow::from(self.data_source.as_str()))),
            (Keyword::AadUserId, text(&self.aad_user_id)),
            (Keyword::Password, secret(&self.password)),
            (Keyword::ApplicationClientId, text(&self.application_client_id)),
            (Keyword::ApplicationKey, secret(&self.application_key)),
            (
                Keyword::ApplicationCertificate,
                self.application_certificate_path
                    .as_ref()
                    .map(|path| path.to_string_lossy()),
            ),
            (Keyword::ApplicationCertificateX5c, flag(self.send_certificate_chain)),
            (Keyword::AuthorityId, text(&self.authority_id)),
            (Keyword::ApplicationToken, secret(&self.application_token)),
            (Keyword::UserToken, secret(&self.user_token)),
            (Keyword::MsiAuthentication, flag(self.msi_authentication)),
            (Keyword::ManagedServiceIdentity, text(&self.managed_service_identity)),
            (Keyword::AzCli, flag(self.az_cli)),
            (Keyword::InteractiveLogin, flag(self.interactive_login)),
            (Keyword::DomainHint, text(&self.redirect_url)),
        ];

        fields
            .into_iter()
            .filter_map(|(keyword, value)| value.map(|value| (keyword, value)))
            .collect()
    }
}

impl FromStr for ConnectionStringBuilder {
    type Err = ConnectionError;

    /// Parse a connection string such as
    /// `https://help.kusto.windows.net/Samples;AAD User ID=user;Password=pass`.
    ///
    /// Keys are case-insensitive, surrounding whitespace is ignored, empty
    /// values leave a field unset and a repeated key overrides earlier ones.
    ///
    /// # Examples
    ///
    /// ```
    /// # use kusto_auth::connection::ConnectionStringBuilder;
    /// # use std::str::FromStr;
    /// let kcsb = ConnectionStringBuilder::from_str(
    ///     "https://help.kusto.windows.net;Application Client Id=app;Application Key=key;Authority Id=tenant",
    /// )?;
    /// assert_eq!(kcsb.data_source, "https://help.kusto.windows.net");
    /// assert_eq!(kcsb.authority_id.as_deref(), Some("tenant"));
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Err(ConnectionError::Empty);
        }

        let mut builder = Self::default();

        for (index, segment) in s.split(';').enumerate() {
            if segment.trim().is_empty() {
                continue;
            }

            // The first segment may be a bare cluster URL
            let (key, value) = match segment.split_once('=') {
                Some(pair) => pair,
                None if index == 0 => (Keyword::DataSource.canonical_name(), segment),
                None => {
                    return Err(ConnectionError::ParseError(format!(
                        "Expected 'key=value' but found '{}'",
                        segment.trim()
                    )));
                }
            };

            let keyword = Keyword::lookup(key)
                .ok_or_else(|| ConnectionError::UnsupportedKey(key.trim().to_lowercase()))?;

            let value = value.trim();
            if value.is_empty() {
                continue;
            }

            builder.assign(keyword, value)?;
        }

        debug!(
            data_source = %builder.data_source,
            method = %builder.auth_method(),
            "parsed connection string"
        );

        Ok(builder)
    }
}

// Prevent secrets from being displayed in debug output
impl fmt::Debug for ConnectionStringBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionStringBuilder")
            .field("data_source", &self.data_source)
            .field("aad_user_id", &self.aad_user_id)
            .field("password", &self.password)
            .field("user_token", &self.user_token)
            .field("application_client_id", &self.application_client_id)
            .field("application_key", &self.application_key)
            .field("authority_id", &self.authority_id)
            .field(
                "application_certificate_path",
                &self.application_certificate_path,
            )
            .field(
                "application_certificate_bytes",
                &self.application_certificate_bytes,
            )
            .field(
                "application_certificate_password",
                &self.application_certificate_password,
            )
            .field("send_certificate_chain", &self.send_certificate_chain)
            .field("application_token", &self.application_token)
            .field("az_cli", &self.az_cli)
            .field("msi_authentication", &self.msi_authentication)
            .field("managed_service_identity", &self.managed_service_identity)
            .field("workload_authentication", &self.workload_authentication)
            .field("federation_token_file_path", &self.federation_token_file_path)
            .field("interactive_login", &self.interactive_login)
            .field("redirect_url", &self.redirect_url)
            .field("default_auth", &self.default_auth)
            .field(
                "token_credential",
                &self.token_credential.as_ref().map(|_| "<credential>"),
            )
            .field("application_for_tracing", &self.application_for_tracing)
            .field("user_for_tracing", &self.user_for_tracing)
            .field("cloud_info", &self.cloud_info)
            .finish()
    }
}

/// Renders the connection string with secrets replaced by `****`.
impl fmt::Display for ConnectionStringBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = self
            .rendered_pairs()
            .into_iter()
            .map(|(keyword, value)| {
                let value = if keyword.is_secret() { "****" } else { &*value };
                format!("{}={}", keyword, value)
            })
            .collect::<Vec<_>>()
            .join(";");
        f.write_str(&rendered)
    }
}

fn text(value: &Option<String>) -> Option<Cow<'_, str>> {
    value.as_deref().map(Cow::from)
}

fn secret(value: &Option<SecureString>) -> Option<Cow<'_, str>> {
    value.as_ref().map(|value| Cow::from(value.expose()))
}

fn flag(set: bool) -> Option<Cow<'static, str>> {
    set.then(|| Cow::from("true"))
}

fn require_non_empty(field: &'static str, value: &str) -> Result<(), ConnectionError> {
    if value.trim().is_empty() {
        return Err(ConnectionError::MissingValue(field));
    }
    Ok(())
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Parse boolean value from string.
fn parse_bool(keyword: Keyword, s: &str) -> Result<bool, ConnectionError> {
    match s.to_lowercase().as_str() {
        "true" | "t" | "1" | "yes" | "on" => Ok(true),
        "false" | "f" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConnectionError::InvalidParameter {
            parameter: keyword.canonical_name().to_string(),
            message: format!("Invalid boolean value: {}", s),
        }),
    }
}
