//! Market-data module for the SuperToken price cache.
//!
//! This module provides the interface to the third-party market-data API
//! that prices are read from. Three query shapes are needed: a batched price
//! lookup by contract address on a platform, a free-text asset search, and a
//! price lookup by asset id. Implementations are pluggable and selected by
//! name from configuration, following the same trait-based pattern as the
//! other components.

use async_trait::async_trait;
use price_types::{ConfigSchema, ImplementationRegistry};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod coingecko;
	pub mod mock;
}

/// Errors that can occur during market-data operations.
#[derive(Debug, Error)]
pub enum MarketDataError {
	/// The request could not be sent or timed out.
	#[error("Request error: {0}")]
	Request(String),
	/// The upstream answered with a non-success status.
	#[error("Upstream returned status {status} for {endpoint}")]
	Status { status: u16, endpoint: String },
	/// The response body did not have the expected shape.
	#[error("Decode error: {0}")]
	Decode(String),
	/// Error that occurs when configuration is invalid.
	#[error("Configuration error: {0}")]
	Configuration(String),
}

/// One result of an asset search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchCoin {
	/// Market-data asset id, used for price-by-id lookups.
	pub id: String,
	pub symbol: String,
	#[serde(default)]
	pub name: String,
	/// Present for assets the provider ranks by market cap.
	#[serde(default)]
	pub market_cap_rank: Option<u32>,
}

/// Trait defining the interface for market-data implementations.
#[async_trait]
pub trait MarketDataInterface: Send + Sync {
	/// Returns the configuration schema for this implementation.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;

	/// Fetches prices for a batch of contract addresses on a platform.
	///
	/// The returned map is keyed by lowercase address. Addresses the upstream
	/// has no price for are absent.
	async fn prices_by_contract(
		&self,
		platform: &str,
		addresses: &[String],
	) -> Result<HashMap<String, f64>, MarketDataError>;

	/// Searches assets by free text, returning results in upstream order.
	async fn search(&self, query: &str) -> Result<Vec<SearchCoin>, MarketDataError>;

	/// Fetches the price of a single asset by its market-data id.
	async fn price_by_id(&self, id: &str) -> Result<Option<f64>, MarketDataError>;
}

/// Type alias for market-data factory functions.
pub type MarketDataFactory =
	fn(&toml::Value) -> Result<Box<dyn MarketDataInterface>, MarketDataError>;

/// Registry trait for market-data implementations.
pub trait MarketDataRegistry: ImplementationRegistry<Factory = MarketDataFactory> {}

/// Get all registered market-data implementations.
pub fn get_all_implementations() -> Vec<(&'static str, MarketDataFactory)> {
	use implementations::{coingecko, mock};

	vec![
		(coingecko::Registry::NAME, coingecko::Registry::factory()),
		(mock::Registry::NAME, mock::Registry::factory()),
	]
}

/// Service that routes market-data queries to the primary implementation.
pub struct MarketDataService {
	/// Map of implementation names to their interfaces.
	implementations: HashMap<String, Arc<dyn MarketDataInterface>>,
	/// The implementation queries are sent to.
	primary_implementation: String,
}

impl MarketDataService {
	/// Creates a new MarketDataService with the given implementations.
	pub fn new(
		implementations: HashMap<String, Arc<dyn MarketDataInterface>>,
		primary_implementation: String,
	) -> Result<Self, MarketDataError> {
		if !implementations.contains_key(&primary_implementation) {
			return Err(MarketDataError::Configuration(format!(
				"Primary implementation '{}' not found in available implementations",
				primary_implementation
			)));
		}

		Ok(Self {
			implementations,
			primary_implementation,
		})
	}

	fn primary(&self) -> Result<&Arc<dyn MarketDataInterface>, MarketDataError> {
		self.implementations
			.get(&self.primary_implementation)
			.ok_or_else(|| {
				MarketDataError::Configuration(format!(
					"Primary implementation '{}' not available",
					self.primary_implementation
				))
			})
	}

	/// Batched contract-address price lookup. An empty address list returns
	/// an empty map without contacting the upstream.
	pub async fn prices_by_contract(
		&self,
		platform: &str,
		addresses: &[String],
	) -> Result<HashMap<String, f64>, MarketDataError> {
		if addresses.is_empty() {
			return Ok(HashMap::new());
		}
		self.primary()?.prices_by_contract(platform, addresses).await
	}

	/// Free-text asset search.
	pub async fn search(&self, query: &str) -> Result<Vec<SearchCoin>, MarketDataError> {
		self.primary()?.search(query).await
	}

	/// Single asset price lookup.
	pub async fn price_by_id(&self, id: &str) -> Result<Option<f64>, MarketDataError> {
		self.primary()?.price_by_id(id).await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use implementations::mock::{MockConfig, MockMarketData, MockRequest};

	#[test]
	fn test_primary_must_exist() {
		let result = MarketDataService::new(HashMap::new(), "coingecko".to_string());
		assert!(matches!(result, Err(MarketDataError::Configuration(_))));
	}

	#[tokio::test]
	async fn test_empty_batch_skips_upstream() {
		let mock = MockMarketData::new(MockConfig::default());
		let requests = mock.requests();
		let mut implementations: HashMap<String, Arc<dyn MarketDataInterface>> = HashMap::new();
		implementations.insert("mock".to_string(), Arc::new(mock));
		let service = MarketDataService::new(implementations, "mock".to_string()).unwrap();

		let prices = service.prices_by_contract("polygon-pos", &[]).await.unwrap();
		assert!(prices.is_empty());
		assert!(requests.lock().await.is_empty());

		service
			.prices_by_contract("polygon-pos", &["0xabc".to_string()])
			.await
			.unwrap();
		assert_eq!(
			requests.lock().await.as_slice(),
			&[MockRequest::PricesByContract {
				platform: "polygon-pos".to_string(),
				addresses: vec!["0xabc".to_string()],
			}]
		);
	}

	#[test]
	fn test_search_coin_rank_is_optional() {
		let coin: SearchCoin =
			serde_json::from_str(r#"{"id":"dai","symbol":"DAI","name":"Dai"}"#).unwrap();
		assert_eq!(coin.market_cap_rank, None);
	}
}
