//! Startup and shutdown hooks for the price engine.

use super::{EngineError, PriceEngine};

impl PriceEngine {
	/// Logs the effective refresh settings before the first cycle.
	pub async fn initialize(&self) -> Result<(), EngineError> {
		let service = &self.config.service;
		if service.max_concurrent_networks == 0 {
			return Err(EngineError::Config(
				"max_concurrent_networks must be at least 1".to_string(),
			));
		}

		tracing::info!(
			service_id = %service.id,
			interval_seconds = service.refresh_interval_seconds,
			max_concurrent_networks = service.max_concurrent_networks,
			snapshot = self.snapshot.is_some(),
			"Initializing price engine"
		);
		Ok(())
	}

	/// Writes a final snapshot so the dump reflects the cache at exit. An
	/// empty cache is not written, so an earlier dump survives a process that
	/// never completed a cycle.
	pub async fn shutdown(&self) -> Result<(), EngineError> {
		let entries = self.cache.len().await;
		tracing::info!(entries, "Shutting down price engine");

		if let Some(snapshot) = self.snapshot.as_ref().filter(|_| entries > 0) {
			if let Err(e) = snapshot.persist(&self.cache).await {
				tracing::warn!(error = %e, "Final snapshot failed");
			}
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use crate::test_support::{engine_with, FakeDirectory, FakeTokenList};
	use price_types::PriceEntry;

	#[tokio::test]
	async fn test_zero_concurrency_is_rejected() {
		let (engine, _) = engine_with(FakeDirectory::new(vec![]), FakeTokenList::default(), "", 0);
		assert!(engine.initialize().await.is_err());

		let (engine, _) = engine_with(FakeDirectory::new(vec![]), FakeTokenList::default(), "", 2);
		assert!(engine.initialize().await.is_ok());
	}

	#[tokio::test]
	async fn test_shutdown_skips_snapshot_of_empty_cache() {
		let (engine, snapshot) =
			engine_with(FakeDirectory::new(vec![]), FakeTokenList::default(), "", 1);

		engine.shutdown().await.unwrap();
		assert!(snapshot.read().await.is_none());

		let entry = PriceEntry::new(3.0, chrono::Utc::now()).unwrap();
		engine.cache().put("xdai", "0xabc".into(), entry).await;
		engine.shutdown().await.unwrap();

		let stored = snapshot.read().await.clone().unwrap();
		assert_eq!(stored["xdai"]["0xabc"].price, 3.0);
	}
}
