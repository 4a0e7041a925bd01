//! Formatting utilities for hex strings and hashes.

use alloy::primitives::B256;

/// Adds "0x" prefix to a hex string if not already present.
pub fn with_0x_prefix(hex_str: &str) -> String {
	if hex_str.starts_with("0x") || hex_str.starts_with("0X") {
		hex_str.to_string()
	} else {
		format!("0x{}", hex_str)
	}
}

/// Short form of a transaction hash for log fields, e.g. `0x1a2b3c4d..`.
pub fn short_hash(hash: &B256) -> String {
	let encoded = hex::encode(hash.0);
	format!("0x{}..", &encoded[..8])
}
