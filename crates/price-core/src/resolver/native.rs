//! Native coin resolution.
//!
//! The native coin has no contract address on its own chain, so it is priced
//! by searching the market-data provider for the network's native symbol and
//! reading the price of the matching asset id. The result is written under
//! both the native wrapper and the zero address.

use super::{PriceResolver, PriceUpdates};
use chrono::Utc;
use price_feed::SearchCoin;
use price_types::{NativeAsset, Network, PriceEntry, TokenAddress};

/// Picks the first search result whose symbol matches and that carries a
/// market-cap rank. Unranked results are usually imitation tokens.
pub fn select_listed_coin<'a>(coins: &'a [SearchCoin], symbol: &str) -> Option<&'a SearchCoin> {
	coins
		.iter()
		.find(|coin| coin.market_cap_rank.is_some() && coin.symbol.eq_ignore_ascii_case(symbol))
}

impl PriceResolver {
	pub(super) async fn resolve_native(
		&self,
		network: &Network,
		native: NativeAsset<'_>,
	) -> PriceUpdates {
		let symbol = self.search_symbol(native.symbol);

		let coins = match self.market.search(symbol).await {
			Ok(coins) => coins,
			Err(e) => {
				tracing::warn!(
					network = %network.name,
					symbol = %symbol,
					error = %e,
					"Native asset search failed"
				);
				return PriceUpdates::new();
			}
		};

		let Some(coin) = select_listed_coin(&coins, symbol) else {
			tracing::debug!(
				network = %network.name,
				symbol = %symbol,
				results = coins.len(),
				"No ranked asset matches native symbol"
			);
			return PriceUpdates::new();
		};

		let price = match self.market.price_by_id(&coin.id).await {
			Ok(price) => price,
			Err(e) => {
				tracing::warn!(
					network = %network.name,
					asset = %coin.id,
					error = %e,
					"Native price query failed"
				);
				return PriceUpdates::new();
			}
		};

		let Some(entry) = price.and_then(|price| PriceEntry::new(price, Utc::now())) else {
			tracing::debug!(network = %network.name, asset = %coin.id, "No native price returned");
			return PriceUpdates::new();
		};

		tracing::debug!(
			network = %network.name,
			asset = %coin.id,
			price = entry.price,
			"Resolved native price"
		);
		vec![(native.wrapper.clone(), entry), (TokenAddress::zero(), entry)]
	}
}
