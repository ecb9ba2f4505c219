//! Connection string keywords and their accepted aliases.

use std::fmt;

/// Canonical connection string keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    DataSource,
    AadUserId,
    Password,
    ApplicationClientId,
    ApplicationKey,
    ApplicationCertificate,
    ApplicationCertificateX5c,
    AuthorityId,
    ApplicationToken,
    UserToken,
    MsiAuthentication,
    ManagedServiceIdentity,
    AzCli,
    InteractiveLogin,
    DomainHint,
}

impl Keyword {
    /// Resolve a raw key. Matching ignores case and surrounding whitespace.
    pub fn lookup(raw: &str) -> Option<Self> {
        let key = raw.trim().to_lowercase();
        let keyword = match key.as_str() {
            "data source" | "datasource" | "addr" | "address" | "network address" | "server" => {
                Keyword::DataSource
            }
            "aad user id" | "aaduserid" => Keyword::AadUserId,
            "password" | "pwd" => Keyword::Password,
            "application client id" | "applicationclientid" | "appclientid" => {
                Keyword::ApplicationClientId
            }
            "application key" | "applicationkey" | "appkey" => Keyword::ApplicationKey,
            "application certificate" | "applicationcertificate" => {
                Keyword::ApplicationCertificate
            }
            "application certificate x5c" | "sendx5c" => Keyword::ApplicationCertificateX5c,
            "authority id" | "authorityid" | "authority" | "tenantid" | "tenant" | "tid" => {
                Keyword::AuthorityId
            }
            "application token" | "applicationtoken" | "apptoken" => Keyword::ApplicationToken,
            "user token" | "usertoken" | "usrtoken" => Keyword::UserToken,
            "msi_auth" | "msi_authentication" | "msiauthentication" | "msi authentication" => {
                Keyword::MsiAuthentication
            }
            "managedserviceidentity" | "managed service identity" => {
                Keyword::ManagedServiceIdentity
            }
            "az cli" | "azcli" => Keyword::AzCli,
            "interactive login" | "interactivelogin" => Keyword::InteractiveLogin,
            "domain hint" | "domainhint" => Keyword::DomainHint,
            _ => return None,
        };
        Some(keyword)
    }

    /// Name used when rendering a connection string.
    pub fn canonical_name(&self) -> &'static str {
        match self {
            Keyword::DataSource => "Data Source",
            Keyword::AadUserId => "AAD User ID",
            Keyword::Password => "Password",
            Keyword::ApplicationClientId => "Application Client Id",
            Keyword::ApplicationKey => "Application Key",
            Keyword::ApplicationCertificate => "Application Certificate",
            Keyword::ApplicationCertificateX5c => "Application Certificate x5c",
            Keyword::AuthorityId => "Authority Id",
            Keyword::ApplicationToken => "Application Token",
            Keyword::UserToken => "User Token",
            Keyword::MsiAuthentication => "MSI Authentication",
            Keyword::ManagedServiceIdentity => "Managed Service Identity",
            Keyword::AzCli => "AZ CLI",
            Keyword::InteractiveLogin => "Interactive Login",
            Keyword::DomainHint => "Domain Hint",
        }
    }

    /// Whether the value is a secret and must be redacted when rendered.
    pub fn is_secret(&self) -> bool {
        matches!(
            self,
            Keyword::Password
                | Keyword::ApplicationKey
                | Keyword::ApplicationToken
                | Keyword::UserToken
        )
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical_name())
    }
}
