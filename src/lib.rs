//! # kusto-auth
//!
//! Connection string parsing and credential selection for Azure Data Explorer
//! (Kusto).
//!
//! A connection string such as
//! `https://help.kusto.windows.net/Samples;Application Client Id=...;Application Key=...`
//! is parsed into a [`ConnectionStringBuilder`]. The builder picks one of
//! several [`AuthMethod`]s and builds a [`TokenProvider`] that delegates token
//! acquisition to the Azure identity libraries.
//!
//! ## Example
//!
//! ```no_run
//! # use kusto_auth::*;
//! # use std::str::FromStr;
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let kcsb = ConnectionStringBuilder::from_str("https://help.kusto.windows.net/Samples")?
//!     .with_az_cli()?;
//!
//! let provider = kcsb.token_provider()?;
//! let token = provider.acquire_token().await?;
//! println!("Authorization: {} <token>", token.scheme());
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod connection;
pub mod error;

pub use auth::{AuthMethod, AuthToken, CloudInfo, TokenProvider, TokenProviderOptions};
pub use connection::{ConnectionStringBuilder, ConnectorDetails, SecureString};
pub use error::{AuthError, ConnectionError, KustoAuthError};
