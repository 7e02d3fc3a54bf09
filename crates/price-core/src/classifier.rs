//! Token classification.
//!
//! Decides which market-data query prices each listed token. The native
//! wrapper is carved out by address before the remaining tokens are split on
//! whether they have an underlying asset, so a native wrapper with a zero
//! underlying is never also priced as a pure token.

use price_types::{ListedToken, Network, TokenCategory};

/// A network's listed tokens split by pricing strategy.
#[derive(Debug, Default, PartialEq)]
pub struct Classified<'a> {
	/// The native wrapper, when the network has a native category and the
	/// subgraph listed it.
	pub native: Option<&'a ListedToken>,
	/// Tokens priced by their own address.
	pub pure: Vec<&'a ListedToken>,
	/// Tokens priced by their underlying address.
	pub wrappers: Vec<&'a ListedToken>,
}

/// Classifies a single token against its network.
pub fn classify(token: &ListedToken, network: &Network) -> TokenCategory {
	if is_native_wrapper(token, network) {
		TokenCategory::NativeWrapper
	} else if token.underlying_address.is_zero() {
		TokenCategory::Pure
	} else {
		TokenCategory::Erc20Wrapper
	}
}

fn is_native_wrapper(token: &ListedToken, network: &Network) -> bool {
	network
		.native_asset()
		.is_some_and(|native| *native.wrapper == token.id)
}

/// Partitions `tokens` into the three categories.
pub fn partition<'a>(tokens: &'a [ListedToken], network: &Network) -> Classified<'a> {
	let mut classified = Classified::default();

	for token in tokens {
		match classify(token, network) {
			TokenCategory::NativeWrapper => classified.native = Some(token),
			TokenCategory::Pure => classified.pure.push(token),
			TokenCategory::Erc20Wrapper => classified.wrappers.push(token),
		}
	}

	classified
}
