//! Configuration builder for creating test and development configurations.
//!
//! Builds a `Config` that points at the `mock` market-data implementation and
//! the `memory` snapshot backend, so engines can be assembled in tests
//! without network access or API keys.

use crate::{
	default_symbol_overrides, ApiConfig, Config, DirectoryConfig, LoggingConfig,
	MarketDataConfig, ServiceConfig, SnapshotConfig,
};
use std::collections::HashMap;

/// Builder for creating `Config` instances with a fluent API.
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
	service_id: String,
	refresh_interval_seconds: u64,
	max_concurrent_networks: usize,
	directory_url: String,
	market_data_primary: String,
	market_data_config: toml::Value,
	symbol_overrides: HashMap<String, String>,
	snapshot: Option<SnapshotConfig>,
	api: ApiConfig,
}

impl Default for ConfigBuilder {
	fn default() -> Self {
		Self::new()
	}
}

impl ConfigBuilder {
	/// Creates a new `ConfigBuilder` with default values suitable for testing.
	pub fn new() -> Self {
		Self {
			service_id: "test-price-cache".to_string(),
			refresh_interval_seconds: 60,
			max_concurrent_networks: 1,
			directory_url: "http://127.0.0.1:1/networks.json".to_string(),
			market_data_primary: "mock".to_string(),
			market_data_config: toml::Value::Table(toml::map::Map::new()),
			symbol_overrides: default_symbol_overrides(),
			snapshot: Some(SnapshotConfig {
				primary: "memory".to_string(),
				implementations: HashMap::from([(
					"memory".to_string(),
					toml::Value::Table(toml::map::Map::new()),
				)]),
			}),
			api: ApiConfig::default(),
		}
	}

	/// Sets the service ID.
	pub fn service_id(mut self, id: impl Into<String>) -> Self {
		self.service_id = id.into();
		self
	}

	/// Sets the refresh interval in seconds.
	pub fn refresh_interval_seconds(mut self, seconds: u64) -> Self {
		self.refresh_interval_seconds = seconds;
		self
	}

	/// Sets how many networks may be priced concurrently.
	pub fn max_concurrent_networks(mut self, limit: usize) -> Self {
		self.max_concurrent_networks = limit;
		self
	}

	/// Sets the network directory URL.
	pub fn directory_url(mut self, url: impl Into<String>) -> Self {
		self.directory_url = url.into();
		self
	}

	/// Sets the primary market-data implementation and its raw config.
	pub fn market_data(mut self, primary: impl Into<String>, config: toml::Value) -> Self {
		self.market_data_primary = primary.into();
		self.market_data_config = config;
		self
	}

	/// Replaces the symbol override table.
	pub fn symbol_overrides(mut self, overrides: HashMap<String, String>) -> Self {
		self.symbol_overrides = overrides;
		self
	}

	/// Disables snapshot persistence.
	pub fn without_snapshot(mut self) -> Self {
		self.snapshot = None;
		self
	}

	/// Sets the API configuration.
	pub fn api(mut self, api: ApiConfig) -> Self {
		self.api = api;
		self
	}

	/// Builds the `Config`.
	pub fn build(self) -> Config {
		Config {
			service: ServiceConfig {
				id: self.service_id,
				refresh_interval_seconds: self.refresh_interval_seconds,
				max_concurrent_networks: self.max_concurrent_networks,
			},
			api: self.api,
			logging: LoggingConfig::default(),
			directory: DirectoryConfig {
				url: self.directory_url,
				subgraph_url_template: "http://127.0.0.1:1/{network}".to_string(),
				timeout_seconds: 5,
			},
			market_data: MarketDataConfig {
				primary: self.market_data_primary.clone(),
				implementations: HashMap::from([(
					self.market_data_primary,
					self.market_data_config,
				)]),
				symbol_overrides: self.symbol_overrides,
			},
			snapshot: self.snapshot,
		}
	}
}
