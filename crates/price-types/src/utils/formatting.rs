//! String formatting utilities for log output.

/// Truncates an address or id for display.
///
/// Shows only the first 10 characters followed by ".." for longer strings,
/// which keeps the "0x" prefix plus eight hex digits.
pub fn truncate_id(id: &str) -> String {
	if id.chars().count() <= 10 {
		id.to_string()
	} else {
		format!("{}..", id.chars().take(10).collect::<String>())
	}
}
