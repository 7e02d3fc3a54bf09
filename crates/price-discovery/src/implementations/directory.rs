//! HTTP network directory.
//!
//! Reads a JSON array of network descriptors from a fixed URL and maps each
//! element onto a `Network`. Fields this service does not use are ignored.

use crate::{DiscoveryError, NetworkDirectoryInterface};
use async_trait::async_trait;
use price_types::{Network, TokenAddress};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DirectoryEntry {
	name: String,
	#[serde(default)]
	is_testnet: bool,
	#[serde(default)]
	native_token_symbol: Option<String>,
	#[serde(default)]
	native_token_wrapper: Option<String>,
	#[serde(default)]
	coin_gecko_id: Option<String>,
	#[serde(default)]
	subgraph_v1: Option<SubgraphInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubgraphInfo {
	#[serde(default)]
	hosted_endpoint: Option<String>,
}

impl From<DirectoryEntry> for Network {
	fn from(entry: DirectoryEntry) -> Self {
		let non_empty = |value: Option<String>| value.filter(|v| !v.trim().is_empty());

		Network {
			name: entry.name,
			platform_id: non_empty(entry.coin_gecko_id),
			native_token_wrapper: non_empty(entry.native_token_wrapper).map(TokenAddress::from),
			native_token_symbol: non_empty(entry.native_token_symbol),
			is_testnet: entry.is_testnet,
			subgraph_endpoint: entry
				.subgraph_v1
				.and_then(|info| non_empty(info.hosted_endpoint)),
		}
	}
}

/// Network directory fetched over HTTP.
pub struct HttpNetworkDirectory {
	client: reqwest::Client,
	url: String,
}

impl HttpNetworkDirectory {
	/// Creates a directory reader for `url`.
	pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, DiscoveryError> {
		let client = reqwest::Client::builder()
			.timeout(timeout)
			.build()
			.map_err(|e| DiscoveryError::Configuration(e.to_string()))?;

		Ok(Self {
			client,
			url: url.into(),
		})
	}
}

#[async_trait]
impl NetworkDirectoryInterface for HttpNetworkDirectory {
	async fn fetch_networks(&self) -> Result<Vec<Network>, DiscoveryError> {
		let response = self
			.client
			.get(&self.url)
			.send()
			.await
			.map_err(|e| DiscoveryError::Request(e.to_string()))?;

		let status = response.status();
		if !status.is_success() {
			return Err(DiscoveryError::Status {
				status: status.as_u16(),
				url: self.url.clone(),
			});
		}

		let entries: Vec<DirectoryEntry> = response
			.json()
			.await
			.map_err(|e| DiscoveryError::Decode(e.to_string()))?;

		Ok(entries.into_iter().map(Network::from).collect())
	}
}
