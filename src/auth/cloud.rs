//! Cloud endpoints used to authenticate against a cluster.
//!
//! A cluster publishes its AAD settings at `/v1/rest/auth/metadata`. The
//! defaults here are the public cloud's; sovereign clouds load theirs with
//! [`CloudInfo::from_metadata_json`].

use crate::error::AuthError;
use serde::{Deserialize, Serialize};

pub const DEFAULT_LOGIN_ENDPOINT: &str = "https://login.microsoftonline.com";
pub const DEFAULT_KUSTO_CLIENT_APP_ID: &str = "db662dc1-0cfe-4e1c-a843-19a68e65be58";
pub const DEFAULT_REDIRECT_URI: &str = "https://microsoft/kustoclient";
pub const DEFAULT_KUSTO_SERVICE_RESOURCE_ID: &str = "https://kusto.kusto.windows.net";
pub const DEFAULT_FIRST_PARTY_AUTHORITY_URL: &str =
    "https://login.microsoftonline.com/f8cdef31-a31e-4b4a-93e4-5f571e91255a";

/// Tenant used by user flows when no authority id is configured.
pub const ORGANIZATIONS_TENANT: &str = "organizations";

/// AAD settings of a cloud.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct CloudInfo {
    pub login_endpoint: String,
    pub login_mfa_required: bool,
    pub kusto_client_app_id: String,
    pub kusto_client_redirect_uri: String,
    pub kusto_service_resource_id: String,
    pub first_party_authority_url: String,
}

#[derive(Deserialize)]
struct MetadataDocument {
    #[serde(rename = "AzureAD")]
    azure_ad: Option<CloudInfo>,
}

impl Default for CloudInfo {
    fn default() -> Self {
        Self {
            login_endpoint: DEFAULT_LOGIN_ENDPOINT.to_string(),
            login_mfa_required: false,
            kusto_client_app_id: DEFAULT_KUSTO_CLIENT_APP_ID.to_string(),
            kusto_client_redirect_uri: DEFAULT_REDIRECT_URI.to_string(),
            kusto_service_resource_id: DEFAULT_KUSTO_SERVICE_RESOURCE_ID.to_string(),
            first_party_authority_url: DEFAULT_FIRST_PARTY_AUTHORITY_URL.to_string(),
        }
    }
}

impl CloudInfo {
    /// Parse the body of a cluster's `/v1/rest/auth/metadata` response.
    ///
    /// A document without an `AzureAD` section yields the defaults.
    pub fn from_metadata_json(json: &str) -> Result<Self, AuthError> {
        let document: MetadataDocument = serde_json::from_str(json)?;
        let info = document.azure_ad.unwrap_or_default();
        if info.login_endpoint.is_empty() || info.kusto_service_resource_id.is_empty() {
            return Err(AuthError::InvalidCloudInfo(
                "LoginEndpoint and KustoServiceResourceId are required".to_string(),
            ));
        }
        Ok(info)
    }

    /// Resource id to request tokens for; MFA clouds use the `kustomfa` resource.
    pub fn resource_id(&self) -> String {
        let resource = self.kusto_service_resource_id.trim_end_matches('/');
        if self.login_mfa_required {
            resource.replacen(".kusto.", ".kustomfa.", 1)
        } else {
            resource.to_string()
        }
    }

    /// OAuth scopes for the cluster.
    pub fn scopes(&self) -> Vec<String> {
        vec![format!("{}/.default", self.resource_id())]
    }

    fn login_base(&self) -> &str {
        self.login_endpoint.trim_end_matches('/')
    }

    pub fn authorize_endpoint(&self, tenant: &str) -> String {
        format!("{}/{}/oauth2/v2.0/authorize", self.login_base(), tenant)
    }

    pub fn token_endpoint(&self, tenant: &str) -> String {
        format!("{}/{}/oauth2/v2.0/token", self.login_base(), tenant)
    }

    pub fn device_code_endpoint(&self, tenant: &str) -> String {
        format!("{}/{}/oauth2/v2.0/devicecode", self.login_base(), tenant)
    }
}
