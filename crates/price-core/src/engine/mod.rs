//! Refresh engine that keeps the price cache populated.
//!
//! This module contains the PriceEngine, which owns the shared cache and
//! drives the refresh cycle: fetch the network directory, list and price
//! every eligible network, then persist a snapshot. Cycles run back to back
//! with a fixed delay between the end of one and the start of the next.

pub mod cycle;
pub mod lifecycle;

pub use cycle::{CycleReport, CycleStage, NetworkOutcome};

use crate::resolver::PriceResolver;
use price_config::Config;
use price_discovery::DiscoveryService;
use price_storage::{PriceCache, SnapshotService};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
	/// The network directory could not be read; the cycle was aborted.
	#[error("Directory error: {0}")]
	Directory(String),
	#[error("Configuration error: {0}")]
	Config(String),
}

/// Engine that refreshes the price cache on a timer.
#[derive(Clone)]
pub struct PriceEngine {
	/// Service configuration.
	pub(crate) config: Config,
	/// Cache shared with the HTTP layer.
	pub(crate) cache: Arc<PriceCache>,
	/// Network directory and token listing.
	pub(crate) discovery: Arc<DiscoveryService>,
	/// Per-network price resolution.
	pub(crate) resolver: Arc<PriceResolver>,
	/// Snapshot writer, absent when no `[snapshot]` section is configured.
	pub(crate) snapshot: Option<Arc<SnapshotService>>,
}

impl PriceEngine {
	/// Creates a new engine around an existing cache.
	pub fn new(
		config: Config,
		cache: Arc<PriceCache>,
		discovery: Arc<DiscoveryService>,
		resolver: Arc<PriceResolver>,
		snapshot: Option<Arc<SnapshotService>>,
	) -> Self {
		Self {
			config,
			cache,
			discovery,
			resolver,
			snapshot,
		}
	}

	/// Runs refresh cycles forever.
	///
	/// The first cycle starts immediately. After each cycle, successful or
	/// aborted, the engine sleeps for the configured interval, so a slow
	/// cycle delays the next one instead of overlapping it.
	pub async fn run(&self) -> Result<(), EngineError> {
		let interval = Duration::from_secs(self.config.service.refresh_interval_seconds);

		loop {
			match self.run_cycle().await {
				Ok(report) => {
					tracing::info!(
						networks = report.networks_seen,
						refreshed = report.networks_refreshed,
						skipped = report.networks_skipped,
						failed = report.networks_failed,
						entries = report.entries_written,
						elapsed_ms = report.elapsed.as_millis() as u64,
						"Refresh cycle complete"
					);
				}
				Err(e) => {
					tracing::error!(error = %e, "Refresh cycle aborted, keeping previous cache");
				}
			}

			tokio::time::sleep(interval).await;
		}
	}

	/// Returns a reference to the configuration.
	pub fn config(&self) -> &Config {
		&self.config
	}

	/// Returns the shared price cache.
	pub fn cache(&self) -> &Arc<PriceCache> {
		&self.cache
	}
}
