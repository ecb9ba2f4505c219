//! Authentication method selection and token providers.
//!
//! This module decides which credential a configuration record describes and
//! builds the provider that acquires tokens for it.
//!
//! # Example
//!
//! ```no_run
//! # use kusto_auth::connection::ConnectionStringBuilder;
//! # use kusto_auth::auth::AuthMethod;
//! # use std::str::FromStr;
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let kcsb = ConnectionStringBuilder::from_str(
//!     "https://help.kusto.windows.net;AppClientId=app;AppKey=secret;TenantId=contoso.com",
//! )?;
//! assert_eq!(kcsb.auth_method(), AuthMethod::ClientSecret);
//!
//! let provider = kcsb.token_provider()?;
//! let token = provider.acquire_token().await?;
//! let header = token.authorization_header();
//! # Ok(())
//! # }
//! ```

pub mod cloud;
pub mod method;
pub mod oauth;
pub mod provider;
pub(crate) mod source;

pub use cloud::CloudInfo;
pub use method::AuthMethod;
pub use oauth::{DeviceCodeCallback, DeviceCodePrompt};
pub use provider::{AuthToken, TokenProvider, TokenProviderOptions, BEARER_TYPE};
