//! Subgraph token lister.
//!
//! Queries a network's protocol subgraph for SuperTokens that are flagged as
//! listed. The endpoint is taken from the directory entry when present and
//! otherwise built from a URL template containing `{network}`.

use crate::{DiscoveryError, TokenListInterface};
use async_trait::async_trait;
use price_types::{ListedToken, Network, TokenAddress};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

const LISTED_TOKENS_QUERY: &str = "query ListedSuperTokens {
  tokens(first: 1000, where: { isSuperToken: true, isListed: true }) {
    id
    underlyingAddress
    name
    symbol
  }
}";

/// Placeholder substituted with the network name in the URL template.
pub const NETWORK_PLACEHOLDER: &str = "{network}";

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
	#[serde(default)]
	data: Option<TokensData>,
	#[serde(default)]
	errors: Option<Vec<GraphQlError>>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
	#[serde(default)]
	message: String,
}

#[derive(Debug, Deserialize)]
struct TokensData {
	tokens: Vec<RawToken>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawToken {
	id: String,
	#[serde(default)]
	underlying_address: Option<String>,
	#[serde(default)]
	name: String,
	#[serde(default)]
	symbol: String,
}

impl From<RawToken> for ListedToken {
	fn from(raw: RawToken) -> Self {
		ListedToken {
			id: TokenAddress::from(raw.id),
			underlying_address: raw
				.underlying_address
				.filter(|a| !a.is_empty())
				.map(TokenAddress::from)
				.unwrap_or_else(TokenAddress::zero),
			name: raw.name,
			symbol: raw.symbol,
		}
	}
}

/// Lists tokens through a network's GraphQL subgraph.
pub struct SubgraphTokenList {
	client: reqwest::Client,
	url_template: String,
}

impl SubgraphTokenList {
	/// Creates a lister using `url_template` for networks without an
	/// explicit endpoint.
	pub fn new(url_template: impl Into<String>, timeout: Duration) -> Result<Self, DiscoveryError> {
		let url_template = url_template.into();
		if !url_template.contains(NETWORK_PLACEHOLDER) {
			return Err(DiscoveryError::Configuration(format!(
				"subgraph URL template '{}' must contain {}",
				url_template, NETWORK_PLACEHOLDER
			)));
		}

		let client = reqwest::Client::builder()
			.timeout(timeout)
			.build()
			.map_err(|e| DiscoveryError::Configuration(e.to_string()))?;

		Ok(Self {
			client,
			url_template,
		})
	}

	/// Resolves the subgraph URL for a network.
	pub fn endpoint_for(&self, network: &Network) -> String {
		match &network.subgraph_endpoint {
			Some(endpoint) => endpoint.clone(),
			None => self.url_template.replace(NETWORK_PLACEHOLDER, &network.name),
		}
	}
}

#[async_trait]
impl TokenListInterface for SubgraphTokenList {
	async fn list_tokens(&self, network: &Network) -> Result<Vec<ListedToken>, DiscoveryError> {
		let url = self.endpoint_for(network);
		let response = self
			.client
			.post(&url)
			.json(&json!({ "query": LISTED_TOKENS_QUERY }))
			.send()
			.await
			.map_err(|e| DiscoveryError::Request(e.to_string()))?;

		let status = response.status();
		if !status.is_success() {
			return Err(DiscoveryError::Status {
				status: status.as_u16(),
				url,
			});
		}

		let body: GraphQlResponse = response
			.json()
			.await
			.map_err(|e| DiscoveryError::Decode(e.to_string()))?;

		if let Some(errors) = body.errors.filter(|errors| !errors.is_empty()) {
			let messages: Vec<_> = errors.into_iter().map(|e| e.message).collect();
			return Err(DiscoveryError::GraphQl(messages.join("; ")));
		}

		let data = body
			.data
			.ok_or_else(|| DiscoveryError::GraphQl("response has no data".to_string()))?;

		Ok(data.tokens.into_iter().map(ListedToken::from).collect())
	}
}
