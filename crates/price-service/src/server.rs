//! HTTP server for the price lookup API.
//!
//! Serves `GET /v1/{network}/{address}` straight from the shared cache. The
//! handler never calls upstream services, so a lookup costs one read lock.

use axum::{
	extract::{Path, State},
	response::Json,
	routing::get,
	Router,
};
use price_config::ApiConfig;
use price_storage::{PriceCache, StorageError};
use price_types::{ApiError, PriceResponse};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Shared application state for the API server.
#[derive(Clone)]
pub struct AppState {
	/// Cache populated by the refresh engine.
	pub cache: Arc<PriceCache>,
}

/// Builds the router with CORS and request tracing.
pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/v1/{network}/{address}", get(handle_get_price))
		.layer(CorsLayer::permissive())
		.layer(TraceLayer::new_for_http())
		.with_state(state)
}

/// Starts the HTTP server and serves until the listener fails.
pub async fn start_server(
	api_config: ApiConfig,
	cache: Arc<PriceCache>,
) -> Result<(), Box<dyn std::error::Error>> {
	let app = router(AppState { cache });

	let bind_address = format!("{}:{}", api_config.host, api_config.port);
	let listener = TcpListener::bind(&bind_address).await?;

	tracing::info!("Price API server starting on {}", bind_address);

	axum::serve(listener, app).await?;

	Ok(())
}

/// Handles GET /v1/{network}/{address} requests.
async fn handle_get_price(
	Path((network, address)): Path<(String, String)>,
	State(state): State<AppState>,
) -> Result<Json<PriceResponse>, ApiError> {
	match state.cache.get(&network, &address).await {
		Ok(entry) => Ok(Json(PriceResponse::from(entry))),
		Err(StorageError::NetworkNotFound(_)) => {
			tracing::debug!(network = %network, "Lookup for unknown network");
			Err(ApiError::NetworkNotFound { network })
		},
		Err(_) => {
			tracing::debug!(network = %network, address = %address, "Lookup for unknown token");
			Err(ApiError::TokenNotFound { network, address })
		},
	}
}
