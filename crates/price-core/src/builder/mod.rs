//! Builder for constructing price engines.
//!
//! Wires a PriceEngine from configuration: the market-data and snapshot
//! implementations are created through named factory functions, discovery
//! uses the HTTP directory and subgraph readers. Any failure here is a
//! startup failure.

use crate::engine::PriceEngine;
use crate::resolver::PriceResolver;
use price_config::Config;
use price_discovery::implementations::{directory::HttpNetworkDirectory, subgraph::SubgraphTokenList};
use price_discovery::DiscoveryService;
use price_feed::{MarketDataError, MarketDataInterface, MarketDataService};
use price_storage::{PriceCache, SnapshotInterface, SnapshotService, StorageError};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during engine construction.
#[derive(Debug, Error)]
pub enum BuilderError {
	#[error("Configuration error: {0}")]
	Config(String),
	#[error("Missing required component: {0}")]
	MissingComponent(String),
}

/// Factory functions for the pluggable components, keyed by implementation
/// name.
pub struct PriceFactories<MF, SF> {
	pub market_data_factories: HashMap<String, MF>,
	pub snapshot_factories: HashMap<String, SF>,
}

/// Builder for a PriceEngine.
pub struct PriceEngineBuilder {
	config: Config,
	cache: Option<Arc<PriceCache>>,
}

impl PriceEngineBuilder {
	/// Creates a new builder with the given configuration.
	pub fn new(config: Config) -> Self {
		Self {
			config,
			cache: None,
		}
	}

	/// Uses an existing cache instead of creating an empty one.
	pub fn with_cache(mut self, cache: Arc<PriceCache>) -> Self {
		self.cache = Some(cache);
		self
	}

	/// Builds the engine.
	pub fn build<MF, SF>(self, factories: PriceFactories<MF, SF>) -> Result<PriceEngine, BuilderError>
	where
		MF: Fn(&toml::Value) -> Result<Box<dyn MarketDataInterface>, MarketDataError>,
		SF: Fn(&toml::Value) -> Result<Box<dyn SnapshotInterface>, StorageError>,
	{
		let market = Arc::new(self.build_market_data(&factories.market_data_factories)?);
		let resolver = PriceResolver::new(market, self.config.market_data.symbol_overrides.clone());
		let discovery = self.build_discovery()?;
		let snapshot = self.build_snapshot(&factories.snapshot_factories)?;

		Ok(PriceEngine::new(
			self.config,
			self.cache.unwrap_or_default(),
			Arc::new(discovery),
			Arc::new(resolver),
			snapshot.map(Arc::new),
		))
	}

	fn build_market_data<MF>(
		&self,
		factories: &HashMap<String, MF>,
	) -> Result<MarketDataService, BuilderError>
	where
		MF: Fn(&toml::Value) -> Result<Box<dyn MarketDataInterface>, MarketDataError>,
	{
		let market_config = &self.config.market_data;
		let mut implementations: HashMap<String, Arc<dyn MarketDataInterface>> = HashMap::new();

		for (name, config) in &market_config.implementations {
			let Some(factory) = factories.get(name) else {
				tracing::warn!(component = "market_data", implementation = %name, "No factory registered, ignoring");
				continue;
			};

			match factory(config) {
				Ok(implementation) => {
					implementation.config_schema().validate(config).map_err(|e| {
						tracing::error!(
							component = "market_data",
							implementation = %name,
							error = %e,
							"Invalid market-data configuration"
						);
						BuilderError::Config(format!(
							"Invalid configuration for market-data implementation '{}': {}",
							name, e
						))
					})?;
					let is_primary = &market_config.primary == name;
					tracing::info!(component = "market_data", implementation = %name, enabled = %is_primary, "Loaded");
					implementations.insert(name.clone(), Arc::from(implementation));
				}
				Err(e) => {
					tracing::error!(
						component = "market_data",
						implementation = %name,
						error = %e,
						"Failed to create market-data implementation"
					);
					return Err(BuilderError::Config(format!(
						"Failed to create market-data implementation '{}': {}",
						name, e
					)));
				}
			}
		}

		if !implementations.contains_key(&market_config.primary) {
			return Err(BuilderError::MissingComponent(format!(
				"primary market-data implementation '{}'",
				market_config.primary
			)));
		}

		MarketDataService::new(implementations, market_config.primary.clone())
			.map_err(|e| BuilderError::Config(e.to_string()))
	}

	fn build_discovery(&self) -> Result<DiscoveryService, BuilderError> {
		let directory_config = &self.config.directory;
		let timeout = Duration::from_secs(directory_config.timeout_seconds);

		let directory = HttpNetworkDirectory::new(directory_config.url.clone(), timeout)
			.map_err(|e| BuilderError::Config(format!("network directory: {}", e)))?;
		let token_list = SubgraphTokenList::new(directory_config.subgraph_url_template.clone(), timeout)
			.map_err(|e| BuilderError::Config(format!("token list: {}", e)))?;

		tracing::info!(component = "discovery", directory = %directory_config.url, "Loaded");
		Ok(DiscoveryService::new(Box::new(directory), Box::new(token_list)))
	}

	fn build_snapshot<SF>(
		&self,
		factories: &HashMap<String, SF>,
	) -> Result<Option<SnapshotService>, BuilderError>
	where
		SF: Fn(&toml::Value) -> Result<Box<dyn SnapshotInterface>, StorageError>,
	{
		let Some(snapshot_config) = &self.config.snapshot else {
			tracing::info!(component = "snapshot", "No snapshot backend configured");
			return Ok(None);
		};

		let primary = &snapshot_config.primary;
		let config = snapshot_config.implementations.get(primary).ok_or_else(|| {
			BuilderError::MissingComponent(format!("snapshot implementation '{}'", primary))
		})?;
		let factory = factories.get(primary).ok_or_else(|| {
			BuilderError::Config(format!("Unknown snapshot implementation '{}'", primary))
		})?;

		let backend = factory(config).map_err(|e| {
			tracing::error!(component = "snapshot", implementation = %primary, error = %e, "Failed to create snapshot backend");
			BuilderError::Config(format!(
				"Failed to create snapshot implementation '{}': {}",
				primary, e
			))
		})?;

		backend.config_schema().validate(config).map_err(|e| {
			tracing::error!(component = "snapshot", implementation = %primary, error = %e, "Invalid snapshot configuration");
			BuilderError::Config(format!(
				"Invalid configuration for snapshot implementation '{}': {}",
				primary, e
			))
		})?;

		tracing::info!(component = "snapshot", implementation = %primary, "Loaded");
		Ok(Some(SnapshotService::new(backend)))
	}
}
