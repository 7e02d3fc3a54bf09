//! Fakes and fixtures shared by the engine and resolver tests.

use crate::resolver::PriceResolver;
use crate::PriceEngine;
use async_trait::async_trait;
use price_config::builders::ConfigBuilder;
use price_discovery::{
	DiscoveryError, DiscoveryService, NetworkDirectoryInterface, TokenListInterface,
};
use price_feed::implementations::mock::{MockConfig, MockMarketData, MockRequest};
use price_feed::{MarketDataInterface, MarketDataService};
use price_storage::implementations::memory::{MemorySnapshot, SnapshotHandle};
use price_storage::{PriceCache, SnapshotService};
use price_types::{ListedToken, Network, TokenAddress};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

pub(crate) fn default_overrides() -> HashMap<String, String> {
	price_config::default_symbol_overrides()
}

/// Market-data service backed by the mock, plus its request log.
pub(crate) fn service_with(
	config: &str,
) -> (Arc<MarketDataService>, Arc<Mutex<Vec<MockRequest>>>) {
	let config: MockConfig = toml::from_str(config).unwrap();
	let mock = MockMarketData::new(config);
	let requests = mock.requests();
	let mut implementations: HashMap<String, Arc<dyn MarketDataInterface>> = HashMap::new();
	implementations.insert("mock".to_string(), Arc::new(mock));
	let service = MarketDataService::new(implementations, "mock".to_string()).unwrap();
	(Arc::new(service), requests)
}

pub(crate) fn network(name: &str, platform: Option<&str>) -> Network {
	Network {
		name: name.to_string(),
		platform_id: platform.map(String::from),
		native_token_wrapper: None,
		native_token_symbol: None,
		is_testnet: false,
		subgraph_endpoint: None,
	}
}

pub(crate) fn listed(id: &str, underlying: &str) -> ListedToken {
	ListedToken {
		id: TokenAddress::from(id),
		underlying_address: TokenAddress::from(underlying),
		name: format!("Super {}", id),
		symbol: format!("{}x", id),
	}
}

/// Directory returning a fixed list, or failing when built with `failing`.
#[derive(Clone)]
pub(crate) struct FakeDirectory {
	networks: Option<Vec<Network>>,
}

impl FakeDirectory {
	pub(crate) fn new(networks: Vec<Network>) -> Self {
		Self {
			networks: Some(networks),
		}
	}

	pub(crate) fn failing() -> Self {
		Self { networks: None }
	}
}

#[async_trait]
impl NetworkDirectoryInterface for FakeDirectory {
	async fn fetch_networks(&self) -> Result<Vec<Network>, DiscoveryError> {
		self.networks
			.clone()
			.ok_or_else(|| DiscoveryError::Status {
				status: 503,
				url: "http://directory.test/networks.json".to_string(),
			})
	}
}

/// Token lister keyed by network name that records every call.
#[derive(Clone, Default)]
pub(crate) struct FakeTokenList {
	tokens: HashMap<String, Vec<ListedToken>>,
	failing: Vec<String>,
	calls: Arc<Mutex<Vec<String>>>,
}

impl FakeTokenList {
	pub(crate) fn with(mut self, network: &str, tokens: Vec<ListedToken>) -> Self {
		self.tokens.insert(network.to_string(), tokens);
		self
	}

	pub(crate) fn failing(mut self, network: &str) -> Self {
		self.failing.push(network.to_string());
		self
	}

	pub(crate) fn calls(&self) -> Arc<Mutex<Vec<String>>> {
		Arc::clone(&self.calls)
	}
}

#[async_trait]
impl TokenListInterface for FakeTokenList {
	async fn list_tokens(&self, network: &Network) -> Result<Vec<ListedToken>, DiscoveryError> {
		self.calls.lock().await.push(network.name.clone());
		if self.failing.contains(&network.name) {
			return Err(DiscoveryError::GraphQl("subgraph unavailable".to_string()));
		}
		Ok(self.tokens.get(&network.name).cloned().unwrap_or_default())
	}
}

/// Engine over fakes with a memory snapshot backend.
pub(crate) fn engine_with(
	directory: FakeDirectory,
	tokens: FakeTokenList,
	market: &str,
	max_concurrent_networks: usize,
) -> (PriceEngine, SnapshotHandle) {
	let config = ConfigBuilder::new()
		.max_concurrent_networks(max_concurrent_networks)
		.build();
	let (market, _) = service_with(market);
	let resolver = PriceResolver::new(market, config.market_data.symbol_overrides.clone());
	let discovery = DiscoveryService::new(Box::new(directory), Box::new(tokens));
	let backend = MemorySnapshot::new();
	let handle = backend.handle();

	let engine = PriceEngine::new(
		config,
		Arc::new(PriceCache::new()),
		Arc::new(discovery),
		Arc::new(resolver),
		Some(Arc::new(SnapshotService::new(Box::new(backend)))),
	);
	(engine, handle)
}
