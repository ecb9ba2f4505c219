//! Connection string parsing and builder-style configuration.
//!
//! # Example
//!
//! ```
//! # use kusto_auth::connection::ConnectionStringBuilder;
//! # use std::str::FromStr;
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // Parse from a connection string
//! let kcsb = ConnectionStringBuilder::from_str(
//!     "https://help.kusto.windows.net/Samples;AAD User ID=user@contoso.com;Password=pass",
//! )?;
//!
//! // Or configure one mode explicitly
//! let kcsb = ConnectionStringBuilder::new("https://help.kusto.windows.net")
//!     .with_user_managed_identity("00000000-0000-0000-0000-000000000000")?;
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod connector;
pub mod keywords;
pub mod secret;

pub use builder::{ConnectionStringBuilder, CONNECTION_STRING_ENV};
pub use connector::ConnectorDetails;
pub use keywords::Keyword;
pub use secret::{SecureBytes, SecureString};
