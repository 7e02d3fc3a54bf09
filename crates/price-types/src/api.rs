//! API types for the price lookup HTTP endpoint.
//!
//! This module defines the response bodies of `GET /v1/{network}/{address}`
//! and the error type that maps lookup misses onto HTTP statuses.

use crate::PriceEntry;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Successful lookup response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceResponse {
	pub price: f64,
	pub last_updated: DateTime<Utc>,
}

impl From<PriceEntry> for PriceResponse {
	fn from(entry: PriceEntry) -> Self {
		Self {
			price: entry.price,
			last_updated: entry.last_updated,
		}
	}
}

/// API error response body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
	/// Human-readable description
	pub error: String,
}

/// Lookup failures, all reported as 404.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
	/// The network has never been populated in the cache.
	NetworkNotFound { network: String },
	/// The network exists but holds no entry for the address.
	TokenNotFound { network: String, address: String },
}

impl ApiError {
	/// Get the HTTP status code for this error.
	pub fn status_code(&self) -> u16 {
		404
	}

	/// Convert to ErrorResponse for JSON serialization.
	pub fn to_error_response(&self) -> ErrorResponse {
		ErrorResponse {
			error: self.to_string(),
		}
	}
}

impl fmt::Display for ApiError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ApiError::NetworkNotFound { network } => write!(f, "Network {} not found", network),
			ApiError::TokenNotFound { network, address } => {
				write!(f, "Token {} not found on network {}", address, network)
			},
		}
	}
}

impl std::error::Error for ApiError {}

#[cfg(feature = "axum")]
impl axum::response::IntoResponse for ApiError {
	fn into_response(self) -> axum::response::Response {
		use axum::{http::StatusCode, response::Json};

		let status =
			StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
		(status, Json(self.to_error_response())).into_response()
	}
}
