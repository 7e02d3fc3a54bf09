//! CoinGecko market-data implementation.
//!
//! Talks to the CoinGecko v3 REST API (or any service exposing the same
//! shapes). Every request carries the API key in a configurable header and
//! is bounded by a client-wide timeout.

use crate::{MarketDataError, MarketDataInterface, SearchCoin};
use async_trait::async_trait;
use price_types::{
	ConfigSchema, Field, FieldType, Schema, SecretString, ValidationError, DEFAULT_VS_CURRENCY,
};
use reqwest::header::HeaderName;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

const DEFAULT_API_KEY_HEADER: &str = "x-cg-demo-api-key";
const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

/// Market-data client for the CoinGecko API.
pub struct CoinGeckoMarketData {
	client: reqwest::Client,
	base_url: String,
	api_key: SecretString,
	api_key_header: HeaderName,
	vs_currency: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
	#[serde(default)]
	coins: Vec<SearchCoin>,
}

/// Price maps from both `/simple` endpoints look like
/// `{ "<key>": { "<currency>": <number> } }`.
type SimplePriceResponse = HashMap<String, HashMap<String, serde_json::Value>>;

impl CoinGeckoMarketData {
	/// Creates a new client.
	pub fn new(
		base_url: impl Into<String>,
		api_key: SecretString,
		api_key_header: HeaderName,
		vs_currency: impl Into<String>,
		timeout: Duration,
	) -> Result<Self, MarketDataError> {
		let client = reqwest::Client::builder()
			.pool_idle_timeout(Duration::from_secs(90))
			.timeout(timeout)
			.build()
			.map_err(|e| MarketDataError::Configuration(e.to_string()))?;

		Ok(Self {
			client,
			base_url: base_url.into().trim_end_matches('/').to_string(),
			api_key,
			api_key_header,
			vs_currency: vs_currency.into(),
		})
	}

	async fn get_json<T: DeserializeOwned>(
		&self,
		path: &str,
		query: &[(&str, &str)],
	) -> Result<T, MarketDataError> {
		let url = format!("{}{}", self.base_url, path);
		let response = self
			.client
			.get(&url)
			.header(self.api_key_header.clone(), self.api_key.expose_secret())
			.query(query)
			.send()
			.await
			.map_err(|e| MarketDataError::Request(e.to_string()))?;

		let status = response.status();
		if !status.is_success() {
			return Err(MarketDataError::Status {
				status: status.as_u16(),
				endpoint: path.to_string(),
			});
		}

		response
			.json::<T>()
			.await
			.map_err(|e| MarketDataError::Decode(format!("{}: {}", path, e)))
	}

	fn price_in_vs(&self, prices: &HashMap<String, serde_json::Value>) -> Option<f64> {
		prices.get(&self.vs_currency).and_then(|v| v.as_f64())
	}
}

#[async_trait]
impl MarketDataInterface for CoinGeckoMarketData {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(CoinGeckoSchema)
	}

	async fn prices_by_contract(
		&self,
		platform: &str,
		addresses: &[String],
	) -> Result<HashMap<String, f64>, MarketDataError> {
		let joined = addresses.join(",");
		let path = format!("/simple/token_price/{}", platform);
		let response: SimplePriceResponse = self
			.get_json(
				&path,
				&[
					("contract_addresses", joined.as_str()),
					("vs_currencies", self.vs_currency.as_str()),
				],
			)
			.await?;

		let prices: HashMap<String, f64> = response
			.iter()
			.filter_map(|(address, prices)| {
				self.price_in_vs(prices)
					.map(|price| (address.to_ascii_lowercase(), price))
			})
			.collect();

		tracing::debug!(
			platform = %platform,
			requested = addresses.len(),
			returned = prices.len(),
			"Fetched contract prices"
		);
		Ok(prices)
	}

	async fn search(&self, query: &str) -> Result<Vec<SearchCoin>, MarketDataError> {
		let response: SearchResponse = self.get_json("/search", &[("query", query)]).await?;
		Ok(response.coins)
	}

	async fn price_by_id(&self, id: &str) -> Result<Option<f64>, MarketDataError> {
		let response: SimplePriceResponse = self
			.get_json(
				"/simple/price",
				&[("ids", id), ("vs_currencies", self.vs_currency.as_str())],
			)
			.await?;

		Ok(response.get(id).and_then(|prices| self.price_in_vs(prices)))
	}
}

/// Configuration schema for the CoinGecko implementation.
pub struct CoinGeckoSchema;

impl ConfigSchema for CoinGeckoSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![
				Field::new("base_url", FieldType::Url),
				Field::new("api_key", FieldType::String).with_validator(|value| {
					match value.as_str() {
						Some(key) if key.trim().is_empty() => {
							Err("API key is required and cannot be empty".to_string())
						}
						_ => Ok(()),
					}
				}),
			],
			vec![
				Field::new("api_key_header", FieldType::String).with_validator(|value| {
					let name = value.as_str().unwrap_or_default();
					HeaderName::from_bytes(name.as_bytes())
						.map(|_| ())
						.map_err(|_| format!("'{}' is not a valid header name", name))
				}),
				Field::new("vs_currency", FieldType::String),
				Field::new(
					"timeout_seconds",
					FieldType::Integer {
						min: Some(1),
						max: Some(300),
					},
				),
			],
		);
		schema.validate(config)
	}
}

/// Factory function to create a CoinGecko client from configuration.
///
/// Configuration parameters:
/// - `base_url`: API root, e.g. `https://api.coingecko.com/api/v3`
/// - `api_key`: API key (required)
/// - `api_key_header`: header carrying the key (default: `x-cg-demo-api-key`)
/// - `vs_currency`: reference currency (default: `usd`)
/// - `timeout_seconds`: per-request timeout (default: 30)
pub fn create_market_data(
	config: &toml::Value,
) -> Result<Box<dyn MarketDataInterface>, MarketDataError> {
	CoinGeckoSchema
		.validate(config)
		.map_err(|e| MarketDataError::Configuration(format!("coingecko: {}", e)))?;

	let str_field = |name: &str| config.get(name).and_then(|v| v.as_str());

	let base_url = str_field("base_url")
		.ok_or_else(|| MarketDataError::Configuration("base_url is required".to_string()))?;
	let api_key = str_field("api_key")
		.ok_or_else(|| MarketDataError::Configuration("api_key is required".to_string()))?;
	let header = str_field("api_key_header").unwrap_or(DEFAULT_API_KEY_HEADER);
	let api_key_header = HeaderName::from_bytes(header.as_bytes())
		.map_err(|e| MarketDataError::Configuration(e.to_string()))?;
	let vs_currency = str_field("vs_currency").unwrap_or(DEFAULT_VS_CURRENCY);
	let timeout_seconds = config
		.get("timeout_seconds")
		.and_then(|v| v.as_integer())
		.map(|v| v as u64)
		.unwrap_or(DEFAULT_TIMEOUT_SECONDS);

	let client = CoinGeckoMarketData::new(
		base_url,
		SecretString::from(api_key),
		api_key_header,
		vs_currency,
		Duration::from_secs(timeout_seconds),
	)?;
	Ok(Box::new(client))
}

/// Registry for the CoinGecko implementation.
pub struct Registry;

impl price_types::ImplementationRegistry for Registry {
	const NAME: &'static str = "coingecko";
	type Factory = crate::MarketDataFactory;

	fn factory() -> Self::Factory {
		create_market_data
	}
}

impl crate::MarketDataRegistry for Registry {}

#[cfg(test)]
mod tests {
	use super::*;
	use axum::extract::{Path, Query};
	use axum::http::{HeaderMap, StatusCode};
	use axum::routing::get;
	use axum::{Json, Router};
	use serde_json::json;

	type Params = Query<HashMap<String, String>>;

	fn authorized(headers: &HeaderMap) -> bool {
		headers
			.get("x-cg-demo-api-key")
			.and_then(|v| v.to_str().ok())
			== Some("test-key")
	}

	async fn token_price(
		headers: HeaderMap,
		Path(platform): Path<String>,
		Query(params): Params,
	) -> Result<Json<serde_json::Value>, StatusCode> {
		if !authorized(&headers) {
			return Err(StatusCode::UNAUTHORIZED);
		}
		if platform != "polygon-pos" || params.get("vs_currencies").map(String::as_str) != Some("usd")
		{
			return Ok(Json(json!({})));
		}
		let requested = params.get("contract_addresses").cloned().unwrap_or_default();
		let mut body = serde_json::Map::new();
		for address in requested.split(',') {
			match address.to_ascii_lowercase().as_str() {
				"0xaaa" => {
					body.insert("0xaaa".into(), json!({ "usd": 1.01 }));
				}
				"0xbbb" => {
					body.insert("0xbbb".into(), json!({}));
				}
				_ => {}
			}
		}
		Ok(Json(serde_json::Value::Object(body)))
	}

	async fn search(headers: HeaderMap, Query(params): Params) -> Result<Json<serde_json::Value>, StatusCode> {
		if !authorized(&headers) {
			return Err(StatusCode::UNAUTHORIZED);
		}
		if params.get("query").map(String::as_str) != Some("DAI") {
			return Ok(Json(json!({ "coins": [] })));
		}
		Ok(Json(json!({
			"coins": [
				{ "id": "fake-dai", "symbol": "DAI", "name": "Fake Dai" },
				{ "id": "dai", "symbol": "DAI", "name": "Dai", "market_cap_rank": 24 }
			],
			"exchanges": []
		})))
	}

	async fn simple_price(
		headers: HeaderMap,
		Query(params): Params,
	) -> Result<Json<serde_json::Value>, StatusCode> {
		if !authorized(&headers) {
			return Err(StatusCode::UNAUTHORIZED);
		}
		match params.get("ids").map(String::as_str) {
			Some("dai") => Ok(Json(json!({ "dai": { "usd": 0.9998 } }))),
			Some("broken") => Err(StatusCode::INTERNAL_SERVER_ERROR),
			_ => Ok(Json(json!({}))),
		}
	}

	async fn spawn_upstream() -> String {
		let app = Router::new()
			.route("/simple/token_price/{platform}", get(token_price))
			.route("/search", get(search))
			.route("/simple/price", get(simple_price));
		let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
		let addr = listener.local_addr().unwrap();
		tokio::spawn(async move {
			axum::serve(listener, app).await.unwrap();
		});
		format!("http://{}/", addr)
	}

	fn client(base_url: &str, key: &str) -> CoinGeckoMarketData {
		CoinGeckoMarketData::new(
			base_url,
			SecretString::from(key),
			HeaderName::from_static(DEFAULT_API_KEY_HEADER),
			"usd",
			Duration::from_secs(5),
		)
		.unwrap()
	}

	#[tokio::test]
	async fn test_prices_by_contract_lowercases_and_skips_missing() {
		let base = spawn_upstream().await;
		let market = client(&base, "test-key");

		let prices = market
			.prices_by_contract(
				"polygon-pos",
				&["0xAAA".to_string(), "0xBBB".to_string(), "0xCCC".to_string()],
			)
			.await
			.unwrap();

		assert_eq!(prices.len(), 1);
		assert_eq!(prices.get("0xaaa"), Some(&1.01));
	}

	#[tokio::test]
	async fn test_search_preserves_response_order() {
		let base = spawn_upstream().await;
		let market = client(&base, "test-key");

		let coins = market.search("DAI").await.unwrap();
		let ids: Vec<_> = coins.iter().map(|c| c.id.as_str()).collect();
		assert_eq!(ids, vec!["fake-dai", "dai"]);
		assert_eq!(coins[0].market_cap_rank, None);
		assert_eq!(coins[1].market_cap_rank, Some(24));
	}

	#[tokio::test]
	async fn test_price_by_id() {
		let base = spawn_upstream().await;
		let market = client(&base, "test-key");

		assert_eq!(market.price_by_id("dai").await.unwrap(), Some(0.9998));
		assert_eq!(market.price_by_id("unknown").await.unwrap(), None);
		assert!(matches!(
			market.price_by_id("broken").await,
			Err(MarketDataError::Status { status: 500, .. })
		));
	}

	#[tokio::test]
	async fn test_api_key_is_sent() {
		let base = spawn_upstream().await;
		let market = client(&base, "wrong-key");

		let err = market.search("DAI").await.unwrap_err();
		assert!(matches!(err, MarketDataError::Status { status: 401, .. }));
	}

	#[tokio::test]
	async fn test_unreachable_upstream_is_request_error() {
		let market = client("http://127.0.0.1:1", "test-key");
		let err = market.search("DAI").await.unwrap_err();
		assert!(matches!(err, MarketDataError::Request(_)));
	}

	#[test]
	fn test_factory_rejects_missing_or_empty_key() {
		let missing: toml::Value =
			toml::from_str(r#"base_url = "https://api.coingecko.com/api/v3""#).unwrap();
		assert!(create_market_data(&missing).is_err());

		let empty: toml::Value = toml::from_str(
			r#"
			base_url = "https://api.coingecko.com/api/v3"
			api_key = ""
			"#,
		)
		.unwrap();
		assert!(create_market_data(&empty).is_err());
	}

	#[test]
	fn test_factory_validates_url_and_header() {
		let bad_url: toml::Value = toml::from_str(
			r#"
			base_url = "api.coingecko.com"
			api_key = "k"
			"#,
		)
		.unwrap();
		assert!(create_market_data(&bad_url).is_err());

		let bad_header: toml::Value = toml::from_str(
			r#"
			base_url = "https://api.coingecko.com/api/v3"
			api_key = "k"
			api_key_header = "not a header"
			"#,
		)
		.unwrap();
		assert!(create_market_data(&bad_header).is_err());

		let ok: toml::Value = toml::from_str(
			r#"
			base_url = "https://pro-api.coingecko.com/api/v3"
			api_key = "k"
			api_key_header = "x-cg-pro-api-key"
			timeout_seconds = 10
			"#,
		)
		.unwrap();
		assert!(create_market_data(&ok).is_ok());
	}
}
