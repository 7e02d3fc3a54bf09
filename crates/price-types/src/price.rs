//! Price entry types.
//!
//! A `PriceEntry` is the unit stored in the cache: a price reported by the
//! market-data upstream together with the time it was resolved.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A price and the time it was written to the cache.
///
/// Entries are always replaced as a whole; price and timestamp never drift
/// apart.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceEntry {
	/// Price in the configured reference currency.
	pub price: f64,
	/// When this price was resolved.
	pub last_updated: DateTime<Utc>,
}

impl PriceEntry {
	/// Builds an entry if `price` is a usable positive number.
	pub fn new(price: f64, last_updated: DateTime<Utc>) -> Option<Self> {
		if price.is_finite() && price > 0.0 {
			Some(Self {
				price,
				last_updated,
			})
		} else {
			None
		}
	}
}

/// Serializable view of the whole cache: network name to address to entry.
///
/// Addresses appear with the casing they were first stored under.
pub type CacheSnapshot = BTreeMap<String, BTreeMap<String, PriceEntry>>;

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_rejects_unusable_prices() {
		let now = Utc::now();
		assert!(PriceEntry::new(1.0, now).is_some());
		assert!(PriceEntry::new(0.0, now).is_none());
		assert!(PriceEntry::new(-3.0, now).is_none());
		assert!(PriceEntry::new(f64::NAN, now).is_none());
		assert!(PriceEntry::new(f64::INFINITY, now).is_none());
	}

	#[test]
	fn test_serializes_iso8601_timestamp() {
		let ts = DateTime::parse_from_rfc3339("2024-05-01T12:00:00Z")
			.unwrap()
			.with_timezone(&Utc);
		let entry = PriceEntry::new(2.5, ts).unwrap();
		let json = serde_json::to_value(entry).unwrap();
		assert_eq!(json["price"], 2.5);
		assert_eq!(json["last_updated"], "2024-05-01T12:00:00Z");
	}
}
