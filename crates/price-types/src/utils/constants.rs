//! Common constants used across the price cache.

/// The zero address.
///
/// Subgraphs report it as the underlying address of SuperTokens that wrap
/// nothing, and the cache uses it as an alias key for a network's native coin.
pub const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

/// Default reference currency for market-data price queries.
pub const DEFAULT_VS_CURRENCY: &str = "usd";
