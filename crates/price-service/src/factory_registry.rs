//! Factory registry for the pluggable price-cache implementations.
//!
//! Each implementation crate exposes `get_all_implementations()`; the
//! registry collects them once so the engine can be built from whatever
//! names the configuration file refers to.

use price_config::Config;
use price_core::{PriceEngine, PriceEngineBuilder, PriceFactories};
use price_feed::MarketDataFactory;
use price_storage::SnapshotFactory;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Global registry for all implementation factories
pub struct FactoryRegistry {
	pub market_data: HashMap<String, MarketDataFactory>,
	pub snapshot: HashMap<String, SnapshotFactory>,
}

impl FactoryRegistry {
	fn new() -> Self {
		Self {
			market_data: HashMap::new(),
			snapshot: HashMap::new(),
		}
	}
}

static REGISTRY: OnceLock<FactoryRegistry> = OnceLock::new();

/// Returns the registry, filling it on first use.
pub fn get_registry() -> &'static FactoryRegistry {
	REGISTRY.get_or_init(|| {
		let mut registry = FactoryRegistry::new();

		for (name, factory) in price_feed::get_all_implementations() {
			tracing::debug!("Registering market-data implementation: {}", name);
			registry.market_data.insert(name.to_string(), factory);
		}

		for (name, factory) in price_storage::get_all_implementations() {
			tracing::debug!("Registering snapshot implementation: {}", name);
			registry.snapshot.insert(name.to_string(), factory);
		}

		registry
	})
}

/// Picks the factories named in a config `implementations` table, failing on
/// the first unknown name.
fn select_factories<F: Copy>(
	available: &HashMap<String, F>,
	configured: &HashMap<String, toml::Value>,
	kind: &str,
) -> Result<HashMap<String, F>, String> {
	let mut factories = HashMap::new();
	for name in configured.keys() {
		match available.get(name) {
			Some(factory) => {
				factories.insert(name.clone(), *factory);
			},
			None => {
				let mut known: Vec<_> = available.keys().cloned().collect();
				known.sort();
				return Err(format!(
					"Unknown {} implementation '{}'. Available: [{}]",
					kind,
					name,
					known.join(", ")
				));
			},
		}
	}
	Ok(factories)
}

/// Builds the price engine from configuration using the registry.
pub fn build_engine_from_config(config: Config) -> Result<PriceEngine, Box<dyn std::error::Error>> {
	let registry = get_registry();

	let market_data_factories = select_factories(
		&registry.market_data,
		&config.market_data.implementations,
		"market-data",
	)?;
	let snapshot_factories = match &config.snapshot {
		Some(snapshot) => select_factories(&registry.snapshot, &snapshot.implementations, "snapshot")?,
		None => HashMap::new(),
	};

	let factories = PriceFactories {
		market_data_factories,
		snapshot_factories,
	};

	Ok(PriceEngineBuilder::new(config).build(factories)?)
}
