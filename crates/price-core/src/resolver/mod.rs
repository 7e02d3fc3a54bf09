//! Price resolution for a single network.
//!
//! Turns a network's classified tokens into cache updates. Each category is
//! priced with its own market-data query; a failed query only loses the
//! prices of that category, never the others and never the cycle.

mod native;

pub use native::select_listed_coin;

use crate::classifier;
use chrono::Utc;
use price_feed::MarketDataService;
use price_types::{truncate_id, ListedToken, Network, PriceEntry, TokenAddress, TokenCategory};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Cache writes produced for one network.
pub type PriceUpdates = Vec<(TokenAddress, PriceEntry)>;

/// Resolves prices for listed tokens through the market-data service.
pub struct PriceResolver {
	market: Arc<MarketDataService>,
	/// Native symbol -> symbol to search for.
	symbol_overrides: HashMap<String, String>,
}

impl PriceResolver {
	pub fn new(market: Arc<MarketDataService>, symbol_overrides: HashMap<String, String>) -> Self {
		Self {
			market,
			symbol_overrides,
		}
	}

	/// The symbol searched for when pricing a native coin. Overrides match
	/// the declared symbol exactly.
	pub fn search_symbol<'a>(&'a self, symbol: &'a str) -> &'a str {
		self.symbol_overrides
			.get(symbol)
			.map(String::as_str)
			.unwrap_or(symbol)
	}

	/// Resolves every category of `network` and returns the entries to write.
	pub async fn resolve(
		&self,
		network: &Network,
		platform: &str,
		tokens: &[ListedToken],
	) -> PriceUpdates {
		let classified = classifier::partition(tokens, network);
		let mut updates = PriceUpdates::new();

		if let Some(native) = network.native_asset() {
			updates.extend(self.resolve_native(network, native).await);
		}

		updates.extend(
			self.resolve_batch(network, platform, TokenCategory::Pure, &classified.pure, |t| &t.id)
				.await,
		);
		updates.extend(
			self.resolve_batch(
				network,
				platform,
				TokenCategory::Erc20Wrapper,
				&classified.wrappers,
				|t| &t.underlying_address,
			)
			.await,
		);

		updates
	}

	/// Prices a batch of tokens with one contract-address query.
	///
	/// `price_key` selects the address the upstream is asked about; results
	/// are always written under the token's own id.
	async fn resolve_batch(
		&self,
		network: &Network,
		platform: &str,
		category: TokenCategory,
		tokens: &[&ListedToken],
		price_key: fn(&ListedToken) -> &TokenAddress,
	) -> PriceUpdates {
		if tokens.is_empty() {
			return PriceUpdates::new();
		}

		let addresses = unique_addresses(tokens.iter().map(|t| price_key(t)));
		let prices = match self.market.prices_by_contract(platform, &addresses).await {
			Ok(prices) => prices,
			Err(e) => {
				tracing::warn!(
					network = %network.name,
					platform = %platform,
					category = %category,
					tokens = tokens.len(),
					error = %e,
					"Batch price query failed"
				);
				return PriceUpdates::new();
			}
		};

		let now = Utc::now();
		let updates: PriceUpdates = tokens
			.iter()
			.filter_map(|token| {
				let key = price_key(token);
				let entry = prices
					.get(&key.normalized())
					.and_then(|price| PriceEntry::new(*price, now));
				if entry.is_none() {
					tracing::debug!(
						network = %network.name,
						category = %category,
						token = %truncate_id(token.id.as_str()),
						symbol = %token.symbol,
						"No price returned"
					);
				}
				entry.map(|entry| (token.id.clone(), entry))
			})
			.collect();

		tracing::debug!(
			network = %network.name,
			category = %category,
			requested = tokens.len(),
			priced = updates.len(),
			"Resolved batch"
		);
		updates
	}
}

/// Addresses to query, deduplicated case-insensitively in first-seen order.
fn unique_addresses<'a>(addresses: impl Iterator<Item = &'a TokenAddress>) -> Vec<String> {
	let mut seen = HashSet::new();
	addresses
		.filter(|address| seen.insert(address.normalized()))
		.map(|address| address.to_string())
		.collect()
}
