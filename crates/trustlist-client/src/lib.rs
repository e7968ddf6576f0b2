//! Trust-List Gateway Client
//!
//! Typed facade over the central trust-list authority. Three operations are
//! exposed, each answering with a status code and an optional payload:
//!
//! - **upload**: publish a signed signer certificate
//! - **revoke**: withdraw a published signer certificate
//! - **download**: fetch the consolidated trust list
//!
//! Only [`BATCH_ACCEPTED`] means the gateway committed the operation. Any other
//! status, or a [`GatewayError`], means nothing took effect. The client never
//! retries.
//!
//! ## Usage
//!
//! ```ignore
//! use trustlist_client::{GatewayClient, HttpGatewayClient, HttpGatewayConfig};
//!
//! let client = HttpGatewayClient::new(HttpGatewayConfig::new("https://gateway.example"))?;
//! let resp = client.download_trust_list().await?;
//! if resp.is_accepted() {
//!     println!("{} items", resp.data.map(|d| d.len()).unwrap_or(0));
//! }
//! ```

pub mod client;
pub mod error;
pub mod http;
pub mod mock;
pub mod types;

pub use client::{GatewayClient, GatewayResponse, BATCH_ACCEPTED};
pub use error::{GatewayError, Result};
pub use http::{HttpGatewayClient, HttpGatewayConfig};
pub use mock::{MockCall, MockGatewayClient};
pub use types::{decode_trust_list, TrustListItemDto};
