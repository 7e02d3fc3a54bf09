//! Configuration module for the SuperToken price cache.
//!
//! Configuration is a single TOML file. Any value may reference the
//! environment with `${VAR}` or `${VAR:-default}`, which is how deployments
//! supply the listening port, refresh interval, market-data URL and API key
//! without editing the file. A reference to an unset variable without a
//! default is a startup error, which makes the market-data API key mandatory.

#[cfg(feature = "testing")]
pub mod builders;

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error that occurs during file I/O operations.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	/// Error that occurs when parsing TOML configuration.
	#[error("Configuration error: {0}")]
	Parse(String),
	/// Error that occurs when configuration validation fails.
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// Extract just the message without the input dump
		ConfigError::Parse(err.message().to_string())
	}
}

/// Main configuration structure for the price cache.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	/// Refresh cycle settings.
	#[serde(default)]
	pub service: ServiceConfig,
	/// HTTP server settings.
	#[serde(default)]
	pub api: ApiConfig,
	/// Logging settings.
	#[serde(default)]
	pub logging: LoggingConfig,
	/// Where networks and their listed tokens come from.
	#[serde(default)]
	pub directory: DirectoryConfig,
	/// Market-data implementations and symbol overrides.
	pub market_data: MarketDataConfig,
	/// Snapshot persistence; no snapshot is written when absent.
	pub snapshot: Option<SnapshotConfig>,
}

/// Refresh cycle settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
	/// Identifier used in logs.
	#[serde(default = "default_service_id")]
	pub id: String,
	/// Delay between the end of one refresh cycle and the start of the next.
	#[serde(default = "default_refresh_interval_seconds")]
	pub refresh_interval_seconds: u64,
	/// How many networks are priced at once. 1 processes them sequentially.
	#[serde(default = "default_max_concurrent_networks")]
	pub max_concurrent_networks: usize,
}

impl Default for ServiceConfig {
	fn default() -> Self {
		Self {
			id: default_service_id(),
			refresh_interval_seconds: default_refresh_interval_seconds(),
			max_concurrent_networks: default_max_concurrent_networks(),
		}
	}
}

fn default_service_id() -> String {
	"price-cache".to_string()
}

fn default_refresh_interval_seconds() -> u64 {
	300
}

fn default_max_concurrent_networks() -> usize {
	1
}

/// Configuration for the HTTP API server.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
	/// Host address to bind the server to.
	#[serde(default = "default_api_host")]
	pub host: String,
	/// Port to bind the server to.
	#[serde(default = "default_api_port")]
	pub port: u16,
}

impl Default for ApiConfig {
	fn default() -> Self {
		Self {
			host: default_api_host(),
			port: default_api_port(),
		}
	}
}

fn default_api_host() -> String {
	"0.0.0.0".to_string()
}

fn default_api_port() -> u16 {
	3000
}

/// Logging settings.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LoggingConfig {
	/// Lowers the default log level to debug.
	#[serde(default)]
	pub debug: bool,
}

/// Network directory and subgraph settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DirectoryConfig {
	/// URL of the JSON network directory.
	#[serde(default = "default_directory_url")]
	pub url: String,
	/// Subgraph URL used when a directory entry has no explicit endpoint.
	/// `{network}` is replaced by the network name.
	#[serde(default = "default_subgraph_url_template")]
	pub subgraph_url_template: String,
	/// Timeout for directory and subgraph requests.
	#[serde(default = "default_request_timeout_seconds")]
	pub timeout_seconds: u64,
}

impl Default for DirectoryConfig {
	fn default() -> Self {
		Self {
			url: default_directory_url(),
			subgraph_url_template: default_subgraph_url_template(),
			timeout_seconds: default_request_timeout_seconds(),
		}
	}
}

fn default_directory_url() -> String {
	"https://raw.githubusercontent.com/superfluid-finance/protocol-monorepo/dev/packages/metadata/networks.json"
		.to_string()
}

fn default_subgraph_url_template() -> String {
	"https://{network}.subgraph.x.superfluid.dev".to_string()
}

fn default_request_timeout_seconds() -> u64 {
	30
}

/// Market-data configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MarketDataConfig {
	/// Which implementation to use.
	pub primary: String,
	/// Map of implementation names to their raw configurations.
	pub implementations: HashMap<String, toml::Value>,
	/// Native symbols that must be searched under a different symbol.
	#[serde(default = "default_symbol_overrides")]
	pub symbol_overrides: HashMap<String, String>,
}

/// The overrides applied when the configuration does not list any.
pub fn default_symbol_overrides() -> HashMap<String, String> {
	HashMap::from([
		("xDAI".to_string(), "DAI".to_string()),
		("MATIC".to_string(), "POL".to_string()),
	])
}

/// Snapshot persistence configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SnapshotConfig {
	/// Which implementation to use.
	pub primary: String,
	/// Map of implementation names to their raw configurations.
	pub implementations: HashMap<String, toml::Value>,
}

/// Resolves environment variables in a string.
///
/// Replaces ${VAR_NAME} with the value of the environment variable VAR_NAME.
/// Supports default values with ${VAR_NAME:-default_value}. References on
/// comment lines are left untouched.
///
/// Input strings are limited to 1MB to bound regex work.
pub(crate) fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	const MAX_INPUT_SIZE: usize = 1024 * 1024;
	if input.len() > MAX_INPUT_SIZE {
		return Err(ConfigError::Validation(format!(
			"Configuration file too large: {} bytes (max: {} bytes)",
			input.len(),
			MAX_INPUT_SIZE
		)));
	}

	let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.map_err(|e| ConfigError::Parse(format!("Regex error: {}", e)))?;

	let mut result = String::with_capacity(input.len());
	let mut last_end = 0;

	for cap in re.captures_iter(input) {
		let (Some(full_match), Some(var_name)) = (cap.get(0), cap.get(1)) else {
			continue;
		};
		let line_start = input[..full_match.start()].rfind('\n').map_or(0, |i| i + 1);
		if input[line_start..full_match.start()].trim_start().starts_with('#') {
			continue;
		}
		let default_value = cap.get(2).map(|m| m.as_str());

		let value = match std::env::var(var_name.as_str()) {
			Ok(v) => v,
			Err(_) => match default_value {
				Some(default) => default.to_string(),
				None => {
					return Err(ConfigError::Validation(format!(
						"Environment variable '{}' not found",
						var_name.as_str()
					)))
				},
			},
		};

		result.push_str(&input[last_end..full_match.start()]);
		result.push_str(&value);
		last_end = full_match.end();
	}
	result.push_str(&input[last_end..]);

	Ok(result)
}

impl Config {
	/// Loads configuration from a file, resolving environment references.
	pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		let content = tokio::fs::read_to_string(path).await.map_err(|e| {
			ConfigError::Io(std::io::Error::new(
				e.kind(),
				format!("Cannot read {}: {}", path.display(), e),
			))
		})?;
		content.parse()
	}

	/// Returns the configuration of the primary market-data implementation.
	pub fn primary_market_data(&self) -> Option<&toml::Value> {
		self.market_data
			.implementations
			.get(&self.market_data.primary)
	}

	/// Validates cross-field constraints that serde cannot express.
	fn validate(&self) -> Result<(), ConfigError> {
		if self.service.id.is_empty() {
			return Err(ConfigError::Validation("Service ID cannot be empty".into()));
		}
		if self.service.refresh_interval_seconds == 0 {
			return Err(ConfigError::Validation(
				"refresh_interval_seconds must be greater than 0".into(),
			));
		}
		if self.service.refresh_interval_seconds > 86400 {
			return Err(ConfigError::Validation(
				"refresh_interval_seconds cannot exceed 86400 (24 hours)".into(),
			));
		}
		if self.service.max_concurrent_networks == 0 {
			return Err(ConfigError::Validation(
				"max_concurrent_networks must be at least 1".into(),
			));
		}

		if self.directory.url.is_empty() {
			return Err(ConfigError::Validation(
				"Directory URL cannot be empty".into(),
			));
		}
		if self.directory.timeout_seconds == 0 {
			return Err(ConfigError::Validation(
				"Directory timeout_seconds must be greater than 0".into(),
			));
		}

		if self.market_data.primary.is_empty() {
			return Err(ConfigError::Validation(
				"Market data primary implementation cannot be empty".into(),
			));
		}
		if self.primary_market_data().is_none() {
			return Err(ConfigError::Validation(format!(
				"Primary market data '{}' not found in implementations",
				self.market_data.primary
			)));
		}
		for (symbol, target) in &self.market_data.symbol_overrides {
			if symbol.is_empty() || target.is_empty() {
				return Err(ConfigError::Validation(format!(
					"Symbol override '{}' -> '{}' must not be empty",
					symbol, target
				)));
			}
		}

		if let Some(ref snapshot) = self.snapshot {
			if !snapshot.implementations.contains_key(&snapshot.primary) {
				return Err(ConfigError::Validation(format!(
					"Primary snapshot '{}' not found in implementations",
					snapshot.primary
				)));
			}
		}

		Ok(())
	}
}

/// Parses configuration from a TOML string. Environment variables are
/// resolved and the result is validated.
impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let resolved = resolve_env_vars(s)?;
		let config: Config = toml::from_str(&resolved)?;
		config.validate()?;
		Ok(config)
	}
}
