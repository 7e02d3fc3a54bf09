//! Discovery module for the SuperToken price cache.
//!
//! Finds out what needs pricing: the network directory supplies the list of
//! networks with their market-data platform ids and native-token metadata,
//! and each network's subgraph supplies its listed SuperTokens. Both sources
//! are re-read every refresh cycle.

use async_trait::async_trait;
use price_types::{ListedToken, Network};
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod directory;
	pub mod subgraph;
}

/// Errors that can occur during discovery operations.
#[derive(Debug, Error)]
pub enum DiscoveryError {
	/// The request could not be sent or timed out.
	#[error("Request error: {0}")]
	Request(String),
	/// The upstream answered with a non-success status.
	#[error("Upstream returned status {status} for {url}")]
	Status { status: u16, url: String },
	/// The response body did not have the expected shape.
	#[error("Decode error: {0}")]
	Decode(String),
	/// The subgraph answered with GraphQL errors or without data.
	#[error("GraphQL error: {0}")]
	GraphQl(String),
	/// Error that occurs when configuration is invalid.
	#[error("Configuration error: {0}")]
	Configuration(String),
}

/// Source of the network list.
#[async_trait]
pub trait NetworkDirectoryInterface: Send + Sync {
	/// Fetches every network the directory knows about, testnets included.
	async fn fetch_networks(&self) -> Result<Vec<Network>, DiscoveryError>;
}

/// Source of listed SuperTokens for a network.
#[async_trait]
pub trait TokenListInterface: Send + Sync {
	/// Lists the SuperTokens flagged as listed on `network`.
	async fn list_tokens(&self, network: &Network) -> Result<Vec<ListedToken>, DiscoveryError>;
}

/// Combines the network directory and token listing sources.
pub struct DiscoveryService {
	directory: Box<dyn NetworkDirectoryInterface>,
	token_list: Box<dyn TokenListInterface>,
}

impl DiscoveryService {
	/// Creates a new DiscoveryService.
	pub fn new(
		directory: Box<dyn NetworkDirectoryInterface>,
		token_list: Box<dyn TokenListInterface>,
	) -> Self {
		Self {
			directory,
			token_list,
		}
	}

	/// Fetches the full network list.
	pub async fn fetch_networks(&self) -> Result<Vec<Network>, DiscoveryError> {
		let networks = self.directory.fetch_networks().await?;
		tracing::debug!(networks = networks.len(), "Fetched network directory");
		Ok(networks)
	}

	/// Lists the tokens of one network.
	pub async fn list_tokens(&self, network: &Network) -> Result<Vec<ListedToken>, DiscoveryError> {
		let tokens = self.token_list.list_tokens(network).await?;
		tracing::debug!(network = %network.name, tokens = tokens.len(), "Listed tokens");
		Ok(tokens)
	}
}
