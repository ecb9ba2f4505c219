//! Basic usage example for kusto-auth.
//!
//! ```bash
//! RUST_LOG=kusto_auth=debug cargo run --example basic_usage -- \
//!     "https://help.kusto.windows.net/Samples;AZ CLI=true"
//! ```

use kusto_auth::auth::{DeviceCodePrompt, TokenProviderOptions};
use kusto_auth::{ConnectionStringBuilder, ConnectorDetails, TokenProvider};
use std::error::Error;
use std::str::FromStr;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

const DEFAULT_CONNECTION_STRING: &str =
    "https://help.kusto.windows.net/Samples;Interactive Login=true";

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let connection_string = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONNECTION_STRING.to_string());

    let details =
        ConnectorDetails::new("Rust.Demo", env!("CARGO_PKG_VERSION")).app("basic_usage", "1.0");
    let kcsb =
        ConnectionStringBuilder::from_str(&connection_string)?.set_connector_details(&details);

    println!("Connection: {}", kcsb);
    println!("Method:     {}", kcsb.auth_method());

    let options = TokenProviderOptions {
        device_code_callback: Some(Arc::new(|prompt: &DeviceCodePrompt| {
            println!("{}", prompt)
        })),
        ..Default::default()
    };
    let provider = TokenProvider::with_options(&kcsb, options)?;
    let token = provider.acquire_token().await?;

    println!("Scopes:     {:?}", provider.scopes());
    println!("Token:      {} <{} chars>", token.scheme(), token.token().len());

    Ok(())
}
