//! Storage module for the SuperToken price cache.
//!
//! This module owns the in-memory `PriceCache` that the refresh cycle writes
//! and the HTTP layer reads, and the snapshot seam that dumps the cache to a
//! backend after each successful cycle. Snapshots are write-only: nothing in
//! the service reads them back.

use async_trait::async_trait;
use price_types::{CacheSnapshot, ConfigSchema, ImplementationRegistry};
use thiserror::Error;

mod cache;

pub use cache::PriceCache;

/// Re-export implementations
pub mod implementations {
	pub mod file;
	pub mod memory;
}

/// Errors that can occur during cache and snapshot operations.
#[derive(Debug, Error)]
pub enum StorageError {
	/// The network has no entry in the cache.
	#[error("Network {0} not found")]
	NetworkNotFound(String),
	/// The network exists but the address does not.
	#[error("Token {address} not found on network {network}")]
	TokenNotFound { network: String, address: String },
	/// Error that occurs during serialization.
	#[error("Serialization error: {0}")]
	Serialization(String),
	/// Error that occurs in the snapshot backend.
	#[error("Backend error: {0}")]
	Backend(String),
	/// Error that occurs during configuration validation.
	#[error("Configuration error: {0}")]
	Configuration(String),
}

/// Trait defining the interface for snapshot backends.
#[async_trait]
pub trait SnapshotInterface: Send + Sync {
	/// Returns the configuration schema for validation.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;

	/// Writes the full snapshot, replacing any previous one.
	async fn persist(&self, snapshot: &CacheSnapshot) -> Result<(), StorageError>;
}

/// Type alias for snapshot factory functions.
pub type SnapshotFactory = fn(&toml::Value) -> Result<Box<dyn SnapshotInterface>, StorageError>;

/// Registry trait for snapshot implementations.
pub trait SnapshotRegistry: ImplementationRegistry<Factory = SnapshotFactory> {}

/// Get all registered snapshot implementations.
///
/// Returns a vector of (name, factory) tuples used by the service to build
/// the backend named in `[snapshot]`.
pub fn get_all_implementations() -> Vec<(&'static str, SnapshotFactory)> {
	use implementations::{file, memory};

	vec![
		(file::Registry::NAME, file::Registry::factory()),
		(memory::Registry::NAME, memory::Registry::factory()),
	]
}

/// Writes cache snapshots through the configured backend.
pub struct SnapshotService {
	/// The underlying snapshot backend implementation.
	backend: Box<dyn SnapshotInterface>,
}

impl SnapshotService {
	/// Creates a new SnapshotService with the specified backend.
	pub fn new(backend: Box<dyn SnapshotInterface>) -> Self {
		Self { backend }
	}

	/// Dumps the current cache contents.
	///
	/// Returns the number of entries written.
	pub async fn persist(&self, cache: &PriceCache) -> Result<usize, StorageError> {
		let snapshot = cache.snapshot().await;
		let entries = snapshot.values().map(|tokens| tokens.len()).sum();
		self.backend.persist(&snapshot).await?;
		Ok(entries)
	}
}
