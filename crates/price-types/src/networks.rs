//! Network and token types for multi-network price resolution.
//!
//! A `Network` is one entry of the remote network directory. A `ListedToken`
//! is one SuperToken reported by that network's subgraph. Both are rebuilt
//! every refresh cycle and never mutated afterwards.

use crate::TokenAddress;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A blockchain network as described by the network directory.
///
/// # Fields
///
/// * `name` - Canonical, case-sensitive key used in the cache and the HTTP path
/// * `platform_id` - Market-data platform id; networks without one are skipped
/// * `native_token_wrapper` - Address of the SuperToken wrapping the native coin
/// * `native_token_symbol` - Symbol of the native coin (e.g. "ETH", "xDAI")
/// * `is_testnet` - Testnets are never priced
/// * `subgraph_endpoint` - Explicit subgraph URL, if the directory provides one
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Network {
	pub name: String,
	pub platform_id: Option<String>,
	pub native_token_wrapper: Option<TokenAddress>,
	pub native_token_symbol: Option<String>,
	#[serde(default)]
	pub is_testnet: bool,
	#[serde(default)]
	pub subgraph_endpoint: Option<String>,
}

/// The native coin of a network, available only when the directory declares
/// both a wrapper address and a symbol.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NativeAsset<'a> {
	pub wrapper: &'a TokenAddress,
	pub symbol: &'a str,
}

impl Network {
	/// Returns the native-wrapper descriptor, or `None` when this network has
	/// no native category.
	pub fn native_asset(&self) -> Option<NativeAsset<'_>> {
		match (&self.native_token_wrapper, &self.native_token_symbol) {
			(Some(wrapper), Some(symbol)) => Some(NativeAsset { wrapper, symbol }),
			_ => None,
		}
	}

	/// Returns the platform id if this network takes part in a refresh cycle.
	pub fn priceable_platform(&self) -> Option<&str> {
		if self.is_testnet {
			return None;
		}
		self.platform_id.as_deref().filter(|id| !id.is_empty())
	}
}

/// A listed SuperToken as returned by a network subgraph.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListedToken {
	/// The SuperToken contract address.
	pub id: TokenAddress,
	/// The wrapped asset, or the zero address when there is none.
	pub underlying_address: TokenAddress,
	pub name: String,
	pub symbol: String,
}

/// How a listed token is priced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenCategory {
	/// Wraps the network's native coin; priced by symbol search.
	NativeWrapper,
	/// Has no underlying asset; priced by its own contract address.
	Pure,
	/// Wraps an ERC20; priced by the underlying contract address.
	Erc20Wrapper,
}

impl fmt::Display for TokenCategory {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			TokenCategory::NativeWrapper => write!(f, "native_wrapper"),
			TokenCategory::Pure => write!(f, "pure"),
			TokenCategory::Erc20Wrapper => write!(f, "erc20_wrapper"),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn network() -> Network {
		Network {
			name: "xdai".to_string(),
			platform_id: Some("xdai".to_string()),
			native_token_wrapper: Some("0xAAA".into()),
			native_token_symbol: Some("xDAI".to_string()),
			is_testnet: false,
			subgraph_endpoint: None,
		}
	}

	#[test]
	fn test_native_asset_requires_wrapper_and_symbol() {
		let mut net = network();
		let native = net.native_asset().unwrap();
		assert_eq!(native.symbol, "xDAI");
		assert_eq!(native.wrapper.as_str(), "0xAAA");

		net.native_token_symbol = None;
		assert!(net.native_asset().is_none());

		let mut net = network();
		net.native_token_wrapper = None;
		assert!(net.native_asset().is_none());
	}

	#[test]
	fn test_priceable_platform() {
		let mut net = network();
		assert_eq!(net.priceable_platform(), Some("xdai"));

		net.is_testnet = true;
		assert_eq!(net.priceable_platform(), None);

		let mut net = network();
		net.platform_id = Some(String::new());
		assert_eq!(net.priceable_platform(), None);

		net.platform_id = None;
		assert_eq!(net.priceable_platform(), None);
	}

	#[test]
	fn test_listed_token_wire_format() {
		let json = r#"{
			"id": "0xbbb",
			"underlyingAddress": "0x0000000000000000000000000000000000000000",
			"name": "Super Token",
			"symbol": "STx"
		}"#;
		let token: ListedToken = serde_json::from_str(json).unwrap();
		assert_eq!(token.id.as_str(), "0xbbb");
		assert!(token.underlying_address.is_zero());
		assert_eq!(token.symbol, "STx");
	}
}
