//! Common types module for the SuperToken price cache.
//!
//! This module defines the core data types shared by every crate in the
//! workspace: the network and token model produced by discovery, the price
//! entries held by the cache, the HTTP response types and the configuration
//! validation helpers used by pluggable implementations.

/// Case-insensitive token address type.
pub mod address;
/// HTTP response and error types for the lookup endpoint.
pub mod api;
/// Network and listed token types.
pub mod networks;
/// Price entry and cache snapshot types.
pub mod price;
/// Registry trait for named, self-registering implementations.
pub mod registry;
/// Redacting wrapper for API keys.
pub mod secret_string;
/// Utility functions and constants.
pub mod utils;
/// Configuration validation types for implementation configs.
pub mod validation;

pub use address::TokenAddress;
pub use api::{ApiError, ErrorResponse, PriceResponse};
pub use networks::{ListedToken, NativeAsset, Network, TokenCategory};
pub use price::{CacheSnapshot, PriceEntry};
pub use registry::ImplementationRegistry;
pub use secret_string::SecretString;
pub use utils::{constants::DEFAULT_VS_CURRENCY, truncate_id, ZERO_ADDRESS};
pub use validation::*;
