//! File-based snapshot backend.
//!
//! Writes the whole cache as pretty-printed JSON to a single file, replacing
//! the previous snapshot atomically.

use crate::{SnapshotInterface, StorageError};
use async_trait::async_trait;
use price_types::{CacheSnapshot, ConfigSchema, Field, FieldType, Schema, ValidationError};
use std::path::PathBuf;
use tokio::fs;

/// Snapshot backend that writes to a JSON file on disk.
pub struct FileSnapshot {
	path: PathBuf,
}

impl FileSnapshot {
	/// Creates a new FileSnapshot writing to `path`.
	pub fn new(path: PathBuf) -> Self {
		Self { path }
	}

	/// Path of the snapshot file.
	pub fn path(&self) -> &PathBuf {
		&self.path
	}
}

#[async_trait]
impl SnapshotInterface for FileSnapshot {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(FileSnapshotSchema)
	}

	async fn persist(&self, snapshot: &CacheSnapshot) -> Result<(), StorageError> {
		let bytes = serde_json::to_vec_pretty(snapshot)
			.map_err(|e| StorageError::Serialization(e.to_string()))?;

		if let Some(parent) = self.path.parent() {
			if !parent.as_os_str().is_empty() {
				fs::create_dir_all(parent)
					.await
					.map_err(|e| StorageError::Backend(e.to_string()))?;
			}
		}

		// Write atomically by writing to temp file then renaming
		let temp_path = self.path.with_extension("tmp");
		fs::write(&temp_path, bytes)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?;

		fs::rename(&temp_path, &self.path)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?;

		tracing::debug!(path = %self.path.display(), "Wrote cache snapshot");
		Ok(())
	}
}

/// Configuration schema for FileSnapshot.
pub struct FileSnapshotSchema;

impl ConfigSchema for FileSnapshotSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![Field::new("path", FieldType::String).with_validator(|value| {
				match value.as_str() {
					Some(path) if path.trim().is_empty() => Err("path cannot be empty".to_string()),
					_ => Ok(()),
				}
			})],
			vec![],
		);
		schema.validate(config)
	}
}

/// Factory function to create a file snapshot backend from configuration.
///
/// Configuration parameters:
/// - `path`: Destination file for the JSON snapshot
pub fn create_snapshot(config: &toml::Value) -> Result<Box<dyn SnapshotInterface>, StorageError> {
	FileSnapshotSchema
		.validate(config)
		.map_err(|e| StorageError::Configuration(e.to_string()))?;

	let path = config
		.get("path")
		.and_then(|v| v.as_str())
		.ok_or_else(|| StorageError::Configuration("path is required".to_string()))?;

	Ok(Box::new(FileSnapshot::new(PathBuf::from(path))))
}

/// Registry for the file snapshot implementation.
pub struct Registry;

impl price_types::ImplementationRegistry for Registry {
	const NAME: &'static str = "file";
	type Factory = crate::SnapshotFactory;

	fn factory() -> Self::Factory {
		create_snapshot
	}
}

impl crate::SnapshotRegistry for Registry {}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::{TimeZone, Utc};
	use price_types::PriceEntry;
	use std::collections::BTreeMap;
	use tempfile::TempDir;

	fn sample_snapshot() -> CacheSnapshot {
		let ts = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
		let mut tokens = BTreeMap::new();
		tokens.insert("0xAbC".to_string(), PriceEntry::new(1.25, ts).unwrap());
		let mut snapshot = BTreeMap::new();
		snapshot.insert("eth-mainnet".to_string(), tokens);
		snapshot
	}

	#[tokio::test]
	async fn test_persist_creates_parent_dirs_and_writes_json() {
		let temp_dir = TempDir::new().unwrap();
		let path = temp_dir.path().join("nested/dir/prices.json");
		let backend = FileSnapshot::new(path.clone());

		backend.persist(&sample_snapshot()).await.unwrap();

		let raw = tokio::fs::read_to_string(&path).await.unwrap();
		let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
		assert_eq!(value["eth-mainnet"]["0xAbC"]["price"], 1.25);
		assert_eq!(
			value["eth-mainnet"]["0xAbC"]["last_updated"],
			"2024-05-01T12:00:00Z"
		);
		assert!(!path.with_extension("tmp").exists());
	}

	#[tokio::test]
	async fn test_persist_replaces_previous_snapshot() {
		let temp_dir = TempDir::new().unwrap();
		let path = temp_dir.path().join("prices.json");
		let backend = FileSnapshot::new(path.clone());

		backend.persist(&sample_snapshot()).await.unwrap();
		backend.persist(&CacheSnapshot::new()).await.unwrap();

		let raw = tokio::fs::read_to_string(&path).await.unwrap();
		assert_eq!(raw.trim(), "{}");
	}

	#[test]
	fn test_factory_requires_path() {
		let config = toml::Value::Table(toml::map::Map::new());
		assert!(create_snapshot(&config).is_err());

		let config: toml::Value = toml::from_str(r#"path = "  ""#).unwrap();
		assert!(create_snapshot(&config).is_err());

		let config: toml::Value = toml::from_str(r#"path = "./data/prices.json""#).unwrap();
		assert!(create_snapshot(&config).is_ok());
	}
}
