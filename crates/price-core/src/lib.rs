//! Core refresh logic for the SuperToken price cache.
//!
//! This crate decides how each listed SuperToken is priced and keeps the
//! shared cache up to date:
//!
//! - `classifier` splits a network's tokens into native wrapper, pure and
//!   ERC20-wrapper categories.
//! - `resolver` issues the market-data query each category needs and maps
//!   the answers back onto token addresses.
//! - `engine` runs the timed refresh cycle across all networks and writes
//!   snapshots.
//! - `builder` assembles an engine from configuration and named factories.

pub mod builder;
pub mod classifier;
pub mod engine;
pub mod resolver;

#[cfg(test)]
pub(crate) mod test_support;

pub use builder::{BuilderError, PriceEngineBuilder, PriceFactories};
pub use engine::{CycleReport, CycleStage, EngineError, NetworkOutcome, PriceEngine};
pub use resolver::PriceResolver;
