//! A single refresh cycle.
//!
//! Stages run in order: directory fetch, then listing and pricing per
//! network, then snapshot. Only a directory failure aborts the cycle. A
//! network that cannot be listed is reported and skipped; every other
//! network is still refreshed. Each network's entries are spliced into the
//! cache as soon as that network is priced.

use super::{EngineError, PriceEngine};
use futures::stream::{self, StreamExt};
use price_types::Network;
use std::fmt;
use std::time::{Duration, Instant};

/// Stage of a refresh cycle, used in logs and failure reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleStage {
	FetchingDirectory,
	ListingTokens,
	ClassifyingAndPricing,
	Persisting,
}

impl fmt::Display for CycleStage {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			CycleStage::FetchingDirectory => write!(f, "fetching_directory"),
			CycleStage::ListingTokens => write!(f, "listing_tokens"),
			CycleStage::ClassifyingAndPricing => write!(f, "classifying_and_pricing"),
			CycleStage::Persisting => write!(f, "persisting"),
		}
	}
}

/// What happened to one directory entry during a cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkOutcome {
	Refreshed {
		network: String,
		tokens: usize,
		entries: usize,
	},
	Skipped {
		network: String,
		reason: &'static str,
	},
	Failed {
		network: String,
		stage: CycleStage,
		error: String,
	},
}

/// Summary of a completed cycle.
#[derive(Debug, Clone, Default)]
pub struct CycleReport {
	pub networks_seen: usize,
	pub networks_refreshed: usize,
	pub networks_skipped: usize,
	pub networks_failed: usize,
	pub entries_written: usize,
	/// Entries in the snapshot, if one was written.
	pub snapshot_entries: Option<usize>,
	pub elapsed: Duration,
	pub outcomes: Vec<NetworkOutcome>,
}

impl CycleReport {
	fn record(&mut self, outcome: NetworkOutcome) {
		match &outcome {
			NetworkOutcome::Refreshed { entries, .. } => {
				self.networks_refreshed += 1;
				self.entries_written += entries;
			}
			NetworkOutcome::Skipped { .. } => self.networks_skipped += 1,
			NetworkOutcome::Failed { .. } => self.networks_failed += 1,
		}
		self.outcomes.push(outcome);
	}

	/// Finds the outcome for a network by name.
	pub fn outcome(&self, network: &str) -> Option<&NetworkOutcome> {
		self.outcomes.iter().find(|outcome| match outcome {
			NetworkOutcome::Refreshed { network: n, .. }
			| NetworkOutcome::Skipped { network: n, .. }
			| NetworkOutcome::Failed { network: n, .. } => n == network,
		})
	}
}

impl PriceEngine {
	/// Runs one refresh cycle to completion.
	///
	/// Returns an error only when the network directory cannot be fetched, in
	/// which case the cache is left untouched and no snapshot is written.
	pub async fn run_cycle(&self) -> Result<CycleReport, EngineError> {
		let started = Instant::now();
		tracing::debug!(stage = %CycleStage::FetchingDirectory, "Starting refresh cycle");

		let networks = self
			.discovery
			.fetch_networks()
			.await
			.map_err(|e| EngineError::Directory(e.to_string()))?;

		let mut report = CycleReport {
			networks_seen: networks.len(),
			..Default::default()
		};

		let mut eligible = Vec::new();
		for network in &networks {
			match network.priceable_platform() {
				Some(platform) => eligible.push((network, platform)),
				None => {
					let reason = if network.is_testnet {
						"testnet"
					} else {
						"no market-data platform id"
					};
					tracing::info!(network = %network.name, reason, "Skipping network");
					report.record(NetworkOutcome::Skipped {
						network: network.name.clone(),
						reason,
					});
				}
			}
		}

		let concurrency = self.config.service.max_concurrent_networks.max(1);
		let outcomes: Vec<NetworkOutcome> = stream::iter(eligible)
			.map(|(network, platform)| self.refresh_network(network, platform))
			.buffer_unordered(concurrency)
			.collect()
			.await;
		for outcome in outcomes {
			report.record(outcome);
		}

		if let Some(snapshot) = &self.snapshot {
			tracing::debug!(stage = %CycleStage::Persisting, "Writing snapshot");
			match snapshot.persist(&self.cache).await {
				Ok(entries) => report.snapshot_entries = Some(entries),
				Err(e) => tracing::warn!(error = %e, "Snapshot failed"),
			}
		}

		report.elapsed = started.elapsed();
		Ok(report)
	}

	async fn refresh_network(&self, network: &Network, platform: &str) -> NetworkOutcome {
		let started = Instant::now();

		let tokens = match self.discovery.list_tokens(network).await {
			Ok(tokens) => tokens,
			Err(e) => {
				tracing::warn!(
					network = %network.name,
					stage = %CycleStage::ListingTokens,
					error = %e,
					"Skipping network for this cycle"
				);
				return NetworkOutcome::Failed {
					network: network.name.clone(),
					stage: CycleStage::ListingTokens,
					error: e.to_string(),
				};
			}
		};

		tracing::debug!(
			network = %network.name,
			stage = %CycleStage::ClassifyingAndPricing,
			tokens = tokens.len(),
			"Pricing network"
		);
		let updates = self.resolver.resolve(network, platform, &tokens).await;
		let entries = self.cache.apply(&network.name, updates).await;

		tracing::info!(
			network = %network.name,
			platform = %platform,
			tokens = tokens.len(),
			entries,
			elapsed_ms = started.elapsed().as_millis() as u64,
			"Refreshed network"
		);

		NetworkOutcome::Refreshed {
			network: network.name.clone(),
			tokens: tokens.len(),
			entries,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::test_support::{engine_with, listed, network, FakeDirectory, FakeTokenList};
	use price_types::ZERO_ADDRESS;

	const MARKET: &str = r#"
		[contract_prices.xdai]
		"0xbbb" = 2.5
		"0xddd" = 1.0

		[contract_prices.polygon-pos]
		"0x111" = 7.0

		[[coins]]
		id = "dai"
		symbol = "DAI"
		name = "Dai"
		market_cap_rank = 24

		[id_prices]
		dai = 1.0
	"#;

	fn xdai() -> Network {
		let mut net = network("xdai", Some("xdai"));
		net.native_token_wrapper = Some("0xAAA".into());
		net.native_token_symbol = Some("xDAI".to_string());
		net
	}

	fn token_list() -> FakeTokenList {
		FakeTokenList::default()
			.with(
				"xdai",
				vec![
					listed("0xAAA", ZERO_ADDRESS),
					listed("0xBBB", ZERO_ADDRESS),
					listed("0xCCC", "0xDDD"),
				],
			)
			.with("polygon", vec![listed("0x111", ZERO_ADDRESS)])
	}

	#[tokio::test]
	async fn test_cycle_populates_all_categories() {
		let (engine, _) = engine_with(FakeDirectory::new(vec![xdai()]), token_list(), MARKET, 1);

		let report = engine.run_cycle().await.unwrap();
		assert_eq!(report.networks_refreshed, 1);
		assert_eq!(report.entries_written, 4);

		let cache = engine.cache();
		let wrapper = cache.get("xdai", "0xaaa").await.unwrap();
		let zero = cache.get("xdai", ZERO_ADDRESS).await.unwrap();
		assert_eq!(wrapper.price, 1.0);
		assert_eq!(wrapper, zero);
		assert_eq!(cache.get("xdai", "0xBBB").await.unwrap().price, 2.5);
		assert_eq!(cache.get("xdai", "0xccc").await.unwrap().price, 1.0);
		assert!(cache.get("xdai", "0xDDD").await.is_err());
	}

	#[tokio::test]
	async fn test_ineligible_networks_are_not_listed() {
		let mut testnet = network("chiado", Some("xdai"));
		testnet.is_testnet = true;
		let unpriced = network("degen", None);
		let tokens = token_list();
		let calls = tokens.calls();

		let (engine, _) =
			engine_with(FakeDirectory::new(vec![testnet, unpriced, xdai()]), tokens, MARKET, 1);
		let report = engine.run_cycle().await.unwrap();

		assert_eq!(report.networks_seen, 3);
		assert_eq!(report.networks_skipped, 2);
		assert_eq!(calls.lock().await.as_slice(), &["xdai".to_string()]);
		assert!(!engine.cache().contains_network("chiado").await);
		assert!(matches!(
			report.outcome("degen"),
			Some(NetworkOutcome::Skipped { reason: "no market-data platform id", .. })
		));
	}

	#[tokio::test]
	async fn test_failed_network_does_not_affect_others() {
		let directory = FakeDirectory::new(vec![
			network("broken", Some("polygon-pos")),
			network("polygon", Some("polygon-pos")),
		]);
		let tokens = token_list().failing("broken");

		for concurrency in [1, 4] {
			let (engine, _) = engine_with(directory.clone(), tokens.clone(), MARKET, concurrency);
			let report = engine.run_cycle().await.unwrap();

			assert_eq!(report.networks_failed, 1);
			assert_eq!(report.networks_refreshed, 1);
			assert_eq!(engine.cache().get("polygon", "0x111").await.unwrap().price, 7.0);
			assert!(!engine.cache().contains_network("broken").await);
			assert!(matches!(
				report.outcome("broken"),
				Some(NetworkOutcome::Failed { stage: CycleStage::ListingTokens, .. })
			));
		}
	}

	#[tokio::test]
	async fn test_market_data_failures_stay_within_network() {
		let market = format!(
			"failing_platforms = [\"xdai\"]\nfailing_searches = [\"DAI\"]\n{}",
			MARKET
		);
		let directory =
			FakeDirectory::new(vec![xdai(), network("polygon", Some("polygon-pos"))]);

		for concurrency in [1, 4] {
			let (engine, _) = engine_with(directory.clone(), token_list(), &market, concurrency);
			let report = engine.run_cycle().await.unwrap();

			assert_eq!(report.networks_refreshed, 2);
			assert_eq!(report.networks_failed, 0);
			assert_eq!(report.entries_written, 1);
			assert_eq!(
				report.outcome("xdai"),
				Some(&NetworkOutcome::Refreshed {
					network: "xdai".to_string(),
					tokens: 3,
					entries: 0,
				})
			);

			let cache = engine.cache();
			assert_eq!(cache.get("polygon", "0x111").await.unwrap().price, 7.0);
			assert!(cache.contains_network("xdai").await);
			assert!(matches!(
				cache.get("xdai", "0xbbb").await,
				Err(price_storage::StorageError::TokenNotFound { .. })
			));
			assert!(cache.get("xdai", ZERO_ADDRESS).await.is_err());
		}
	}

	#[tokio::test]
	async fn test_directory_failure_aborts_cycle_and_keeps_cache() {
		let (engine, snapshot) =
			engine_with(FakeDirectory::new(vec![xdai()]), token_list(), MARKET, 1);
		engine.run_cycle().await.unwrap();
		let before = engine.cache().snapshot().await;
		*snapshot.write().await = None;

		let (failing, _) = engine_with(FakeDirectory::failing(), token_list(), MARKET, 1);
		let failing = crate::PriceEngine {
			discovery: failing.discovery,
			..engine.clone()
		};

		let err = failing.run_cycle().await.unwrap_err();
		assert!(matches!(err, EngineError::Directory(_)));
		assert_eq!(engine.cache().snapshot().await, before);
		assert!(snapshot.read().await.is_none());
	}

	#[tokio::test]
	async fn test_consecutive_cycles_are_idempotent() {
		let (engine, _) = engine_with(FakeDirectory::new(vec![xdai()]), token_list(), MARKET, 1);

		engine.run_cycle().await.unwrap();
		let first = engine.cache().snapshot().await;
		engine.run_cycle().await.unwrap();
		let second = engine.cache().snapshot().await;

		assert_eq!(first.len(), second.len());
		for (network, tokens) in &first {
			for (address, entry) in tokens {
				let next = second[network][address];
				assert_eq!(next.price, entry.price);
				assert!(next.last_updated >= entry.last_updated);
			}
		}
	}

	#[tokio::test]
	async fn test_snapshot_written_after_cycle() {
		let (engine, snapshot) =
			engine_with(FakeDirectory::new(vec![xdai()]), token_list(), MARKET, 1);

		let report = engine.run_cycle().await.unwrap();
		assert_eq!(report.snapshot_entries, Some(4));

		let stored = snapshot.read().await.clone().unwrap();
		assert_eq!(stored["xdai"].len(), 4);
		assert!(stored["xdai"].contains_key("0xAAA"));
	}
}
