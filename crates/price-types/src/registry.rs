//! Registry trait for self-registering implementations.
//!
//! Every pluggable seam (market data, snapshot persistence, discovery) names
//! its implementations through this trait so the service can look them up by
//! the key used in the configuration file.

/// Base trait for implementation registries.
pub trait ImplementationRegistry {
	/// The name used in configuration files to reference this implementation,
	/// for example "coingecko" for `[market_data.implementations.coingecko]`.
	const NAME: &'static str;

	/// The factory function type this implementation provides.
	type Factory;

	/// Get the factory function for this implementation.
	fn factory() -> Self::Factory;
}
