//! Decoded event records.

use alloy::dyn_abi::DynSolValue;
use alloy::primitives::{Address, B256, U256};

/// A named argument of a decoded event.
#[derive(Debug, Clone, PartialEq)]
pub struct EventParam {
	pub name: String,
	pub value: DynSolValue,
}

/// One log of a receipt, decoded against the emitting contract's ABI.
///
/// Logs from contracts without a supplied interface, or with an unknown
/// topic, are kept as undecoded records (`name == None`) so that the record
/// list mirrors the receipt's log list one-to-one.
#[derive(Debug, Clone, PartialEq)]
pub struct EventRecord {
	/// Address of the emitting contract.
	pub contract: Address,
	/// Event name from the ABI.
	pub name: Option<String>,
	/// First topic of the log.
	pub signature: Option<B256>,
	/// Arguments in declaration order, indexed and non-indexed merged.
	pub params: Vec<EventParam>,
}

impl EventRecord {
	/// Creates an undecoded record.
	pub fn undecoded(contract: Address, signature: Option<B256>) -> Self {
		Self {
			contract,
			name: None,
			signature,
			params: Vec::new(),
		}
	}

	/// Returns true if this record was decoded against an ABI.
	pub fn is_decoded(&self) -> bool {
		self.name.is_some()
	}

	/// Returns true if this record is the named event emitted by `contract`.
	pub fn matches(&self, contract: Address, name: &str) -> bool {
		self.contract == contract && self.name.as_deref() == Some(name)
	}

	/// Looks up an argument by name.
	pub fn arg(&self, name: &str) -> Option<&DynSolValue> {
		self.params.iter().find(|p| p.name == name).map(|p| &p.value)
	}

	/// Looks up an argument by position.
	pub fn arg_at(&self, index: usize) -> Option<&DynSolValue> {
		self.params.get(index).map(|p| &p.value)
	}

	/// Named unsigned integer argument.
	pub fn uint_arg(&self, name: &str) -> Option<U256> {
		self.arg(name).and_then(|v| v.as_uint()).map(|(value, _)| value)
	}

	/// Named address argument.
	pub fn address_arg(&self, name: &str) -> Option<Address> {
		self.arg(name).and_then(|v| v.as_address())
	}
}
