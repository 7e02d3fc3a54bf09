//! In-memory snapshot backend.
//!
//! Keeps only the most recent snapshot. Used by tests and by deployments
//! that do not want anything written to disk.

use crate::{SnapshotInterface, StorageError};
use async_trait::async_trait;
use price_types::{CacheSnapshot, ConfigSchema, Schema, ValidationError};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared handle to the last persisted snapshot.
pub type SnapshotHandle = Arc<RwLock<Option<CacheSnapshot>>>;

/// Snapshot backend holding the last snapshot in memory.
#[derive(Default)]
pub struct MemorySnapshot {
	last: SnapshotHandle,
}

impl MemorySnapshot {
	/// Creates a new, empty MemorySnapshot.
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns a handle for inspecting persisted snapshots after the backend
	/// has been boxed.
	pub fn handle(&self) -> SnapshotHandle {
		Arc::clone(&self.last)
	}
}

#[async_trait]
impl SnapshotInterface for MemorySnapshot {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(MemorySnapshotSchema)
	}

	async fn persist(&self, snapshot: &CacheSnapshot) -> Result<(), StorageError> {
		*self.last.write().await = Some(snapshot.clone());
		Ok(())
	}
}

/// Configuration schema for MemorySnapshot.
pub struct MemorySnapshotSchema;

impl ConfigSchema for MemorySnapshotSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		Schema::new(vec![], vec![]).validate(config)
	}
}

/// Factory function to create a memory snapshot backend.
pub fn create_snapshot(_config: &toml::Value) -> Result<Box<dyn SnapshotInterface>, StorageError> {
	Ok(Box::new(MemorySnapshot::new()))
}

/// Registry for the memory snapshot implementation.
pub struct Registry;

impl price_types::ImplementationRegistry for Registry {
	const NAME: &'static str = "memory";
	type Factory = crate::SnapshotFactory;

	fn factory() -> Self::Factory {
		create_snapshot
	}
}

impl crate::SnapshotRegistry for Registry {}
