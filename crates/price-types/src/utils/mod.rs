//! Utility functions and constants shared across the price cache crates.

pub mod constants;
pub mod formatting;

pub use constants::ZERO_ADDRESS;
pub use formatting::truncate_id;
