//! In-memory price cache.
//!
//! Maps network name to token address to `PriceEntry`. Network names match
//! exactly; addresses match case-insensitively while keeping the casing of
//! the first write. Entries are only ever overwritten, never evicted, so a
//! token that drops out of a listing keeps its last known price.

use crate::StorageError;
use price_types::{CacheSnapshot, PriceEntry, TokenAddress};
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
struct StoredPrice {
	/// Address as first written.
	address: TokenAddress,
	entry: PriceEntry,
}

type NetworkPrices = HashMap<String, StoredPrice>;

/// Shared price store read by the HTTP layer and written by the refresh
/// cycle.
///
/// Readers may observe a cycle in progress (some networks refreshed, others
/// not yet), but every individual network update is applied under a single
/// write lock.
#[derive(Debug, Default)]
pub struct PriceCache {
	networks: RwLock<HashMap<String, NetworkPrices>>,
}

impl PriceCache {
	/// Creates an empty cache.
	pub fn new() -> Self {
		Self::default()
	}

	/// Looks up the entry for `address` on `network`.
	pub async fn get(&self, network: &str, address: &str) -> Result<PriceEntry, StorageError> {
		let networks = self.networks.read().await;
		let prices = networks
			.get(network)
			.ok_or_else(|| StorageError::NetworkNotFound(network.to_string()))?;
		prices
			.get(&address.to_ascii_lowercase())
			.map(|stored| stored.entry)
			.ok_or_else(|| StorageError::TokenNotFound {
				network: network.to_string(),
				address: address.to_string(),
			})
	}

	/// Writes a single entry, replacing any previous one.
	pub async fn put(&self, network: &str, address: TokenAddress, entry: PriceEntry) {
		self.apply(network, vec![(address, entry)]).await;
	}

	/// Splices a network's freshly resolved entries into the cache.
	///
	/// The network key is created even when `updates` is empty, so that a
	/// refreshed network with no priced tokens reports token misses rather
	/// than an unknown network. Returns the number of distinct addresses
	/// written; repeated addresses in one batch count once.
	pub async fn apply(&self, network: &str, updates: Vec<(TokenAddress, PriceEntry)>) -> usize {
		let mut networks = self.networks.write().await;
		let prices = networks.entry(network.to_string()).or_default();
		let mut written = HashSet::new();

		for (address, entry) in updates {
			let key = address.normalized();
			written.insert(key.clone());
			prices
				.entry(key)
				.and_modify(|stored| stored.entry = entry)
				.or_insert(StoredPrice { address, entry });
		}

		written.len()
	}

	/// Returns true if the network has been populated.
	pub async fn contains_network(&self, network: &str) -> bool {
		self.networks.read().await.contains_key(network)
	}

	/// Total number of entries across all networks.
	pub async fn len(&self) -> usize {
		self.networks
			.read()
			.await
			.values()
			.map(|prices| prices.len())
			.sum()
	}

	/// Returns true if no entries are stored.
	pub async fn is_empty(&self) -> bool {
		self.len().await == 0
	}

	/// Copies the cache into its serializable form.
	pub async fn snapshot(&self) -> CacheSnapshot {
		let networks = self.networks.read().await;
		networks
			.iter()
			.map(|(network, prices)| {
				let tokens = prices
					.values()
					.map(|stored| (stored.address.to_string(), stored.entry))
					.collect();
				(network.clone(), tokens)
			})
			.collect()
	}
}
