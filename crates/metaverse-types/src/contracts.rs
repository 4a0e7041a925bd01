//! Identities of the four contracts the client drives.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the deployed contracts targeted by the client.
///
/// The metaverse contract orchestrates the other three: it mints and burns
/// SLW, moves ships between stars and settles combat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContractKind {
	/// Fungible SLW reward currency (ERC-20).
	Slw,
	/// Star collectibles (ERC-721).
	Star,
	/// Ship collectibles (ERC-721).
	Ship,
	/// Orchestration contract coordinating stars, ships and SLW.
	Metaverse,
}

impl ContractKind {
	/// Every contract, in configuration order.
	pub const ALL: [ContractKind; 4] = [
		ContractKind::Slw,
		ContractKind::Star,
		ContractKind::Ship,
		ContractKind::Metaverse,
	];

	/// Key used for this contract in the `[contracts]` configuration table.
	pub fn config_key(&self) -> &'static str {
		match self {
			ContractKind::Slw => "slw",
			ContractKind::Star => "star",
			ContractKind::Ship => "ship",
			ContractKind::Metaverse => "metaverse",
		}
	}
}

impl fmt::Display for ContractKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			ContractKind::Slw => "SLW",
			ContractKind::Star => "Star",
			ContractKind::Ship => "Ship",
			ContractKind::Metaverse => "Metaverse",
		};
		f.write_str(name)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_config_keys_are_unique() {
		let mut keys: Vec<_> = ContractKind::ALL.iter().map(|c| c.config_key()).collect();
		keys.sort_unstable();
		keys.dedup();
		assert_eq!(keys.len(), 4);
	}

	#[test]
	fn test_display_names() {
		assert_eq!(ContractKind::Slw.to_string(), "SLW");
		assert_eq!(ContractKind::Metaverse.to_string(), "Metaverse");
	}
}
