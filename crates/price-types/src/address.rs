//! Token address type with case-insensitive identity.
//!
//! Upstreams disagree on address casing: subgraphs return lowercase hex, the
//! network directory returns checksummed addresses and HTTP clients send
//! whatever they were given. `TokenAddress` keeps the original text for
//! display and storage while comparing and hashing on the lowercase form.

use crate::utils::ZERO_ADDRESS;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// A contract address that preserves its original casing but compares
/// case-insensitively.
#[derive(Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenAddress(String);

impl TokenAddress {
	/// Wraps an address string as given.
	pub fn new(address: impl Into<String>) -> Self {
		Self(address.into())
	}

	/// The zero address, used as the alias for a network's native coin.
	pub fn zero() -> Self {
		Self(ZERO_ADDRESS.to_string())
	}

	/// Returns the address exactly as it was first written.
	pub fn as_str(&self) -> &str {
		&self.0
	}

	/// Returns the lowercase form used for identity.
	pub fn normalized(&self) -> String {
		self.0.to_ascii_lowercase()
	}

	/// Returns true if this is the zero-address sentinel.
	pub fn is_zero(&self) -> bool {
		self.0.eq_ignore_ascii_case(ZERO_ADDRESS)
	}

	/// Compares against a raw address string ignoring case.
	pub fn matches(&self, other: &str) -> bool {
		self.0.eq_ignore_ascii_case(other)
	}
}

impl PartialEq for TokenAddress {
	fn eq(&self, other: &Self) -> bool {
		self.0.eq_ignore_ascii_case(&other.0)
	}
}

impl Eq for TokenAddress {}

impl Hash for TokenAddress {
	fn hash<H: Hasher>(&self, state: &mut H) {
		for byte in self.0.bytes() {
			state.write_u8(byte.to_ascii_lowercase());
		}
	}
}

impl fmt::Debug for TokenAddress {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "TokenAddress({})", self.0)
	}
}

impl fmt::Display for TokenAddress {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl From<&str> for TokenAddress {
	fn from(s: &str) -> Self {
		Self::new(s)
	}
}

impl From<String> for TokenAddress {
	fn from(s: String) -> Self {
		Self::new(s)
	}
}
