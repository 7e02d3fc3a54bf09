//! Mock market-data implementation for testing and development.
//!
//! Serves prices and search results from its configuration table and keeps a
//! log of every query it receives, so callers can assert which upstream
//! requests a refresh cycle would have made.

use crate::{
	MarketDataError, MarketDataFactory, MarketDataInterface, MarketDataRegistry, SearchCoin,
};
use async_trait::async_trait;
use price_types::{ConfigSchema, ImplementationRegistry, ValidationError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Configuration for the mock market-data source.
///
/// ```toml
/// [market_data.implementations.mock.contract_prices.polygon-pos]
/// "0xabc" = 1.0
/// [[market_data.implementations.mock.coins]]
/// id = "dai"
/// symbol = "DAI"
/// market_cap_rank = 24
/// [market_data.implementations.mock.id_prices]
/// dai = 1.0
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MockConfig {
	/// platform id -> address -> price
	#[serde(default)]
	pub contract_prices: HashMap<String, HashMap<String, f64>>,
	/// Search corpus, returned in this order.
	#[serde(default)]
	pub coins: Vec<SearchCoin>,
	/// asset id -> price
	#[serde(default)]
	pub id_prices: HashMap<String, f64>,
	/// Platforms whose contract price queries fail.
	#[serde(default)]
	pub failing_platforms: Vec<String>,
	/// Search queries that fail, matched case-insensitively.
	#[serde(default)]
	pub failing_searches: Vec<String>,
}

impl ConfigSchema for MockConfig {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		config
			.clone()
			.try_into::<MockConfig>()
			.map(|_| ())
			.map_err(|e| ValidationError::DeserializationError(e.to_string()))
	}
}

/// A query received by the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockRequest {
	PricesByContract {
		platform: String,
		addresses: Vec<String>,
	},
	Search(String),
	PriceById(String),
}

/// Mock market-data source backed by its configuration.
pub struct MockMarketData {
	config: MockConfig,
	requests: Arc<Mutex<Vec<MockRequest>>>,
}

impl MockMarketData {
	/// Creates a new mock with the given configuration.
	pub fn new(config: MockConfig) -> Self {
		Self {
			config,
			requests: Arc::new(Mutex::new(Vec::new())),
		}
	}

	/// Shared log of received queries, in arrival order.
	pub fn requests(&self) -> Arc<Mutex<Vec<MockRequest>>> {
		Arc::clone(&self.requests)
	}

	async fn record(&self, request: MockRequest) {
		self.requests.lock().await.push(request);
	}
}

#[async_trait]
impl MarketDataInterface for MockMarketData {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(self.config.clone())
	}

	async fn prices_by_contract(
		&self,
		platform: &str,
		addresses: &[String],
	) -> Result<HashMap<String, f64>, MarketDataError> {
		self.record(MockRequest::PricesByContract {
			platform: platform.to_string(),
			addresses: addresses.to_vec(),
		})
		.await;

		if self.config.failing_platforms.iter().any(|p| p == platform) {
			return Err(MarketDataError::Status {
				status: 503,
				endpoint: format!("/simple/token_price/{}", platform),
			});
		}

		let Some(known) = self.config.contract_prices.get(platform) else {
			return Ok(HashMap::new());
		};

		Ok(addresses
			.iter()
			.filter_map(|address| {
				known
					.iter()
					.find(|(candidate, _)| candidate.eq_ignore_ascii_case(address))
					.map(|(_, price)| (address.to_ascii_lowercase(), *price))
			})
			.collect())
	}

	async fn search(&self, query: &str) -> Result<Vec<SearchCoin>, MarketDataError> {
		self.record(MockRequest::Search(query.to_string())).await;

		if self
			.config
			.failing_searches
			.iter()
			.any(|q| q.eq_ignore_ascii_case(query))
		{
			return Err(MarketDataError::Status {
				status: 503,
				endpoint: "/search".to_string(),
			});
		}

		let needle = query.to_lowercase();
		Ok(self
			.config
			.coins
			.iter()
			.filter(|coin| {
				coin.symbol.to_lowercase().contains(&needle)
					|| coin.name.to_lowercase().contains(&needle)
			})
			.cloned()
			.collect())
	}

	async fn price_by_id(&self, id: &str) -> Result<Option<f64>, MarketDataError> {
		self.record(MockRequest::PriceById(id.to_string())).await;
		Ok(self.config.id_prices.get(id).copied())
	}
}

/// Registry for the mock market-data implementation.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "mock";
	type Factory = MarketDataFactory;

	fn factory() -> Self::Factory {
		|config: &toml::Value| -> Result<Box<dyn MarketDataInterface>, MarketDataError> {
			let mock_config: MockConfig = config.clone().try_into().map_err(|e| {
				MarketDataError::Configuration(format!("Invalid mock config: {}", e))
			})?;

			Ok(Box::new(MockMarketData::new(mock_config)))
		}
	}
}

impl MarketDataRegistry for Registry {}
