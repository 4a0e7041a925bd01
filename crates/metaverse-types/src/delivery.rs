//! Transaction delivery types.
//!
//! These are the transport-neutral shapes exchanged between the invoker and
//! whichever `DeliveryInterface` implementation talks to the network.

use alloy::primitives::{Address, Bytes, Log, TxHash, U256};
use serde::Deserialize;

/// A contract call ready to be estimated, simulated or submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
	/// Target contract.
	pub to: Address,
	/// ABI-encoded calldata, selector included.
	pub data: Bytes,
	/// Native value attached to the call.
	pub value: U256,
	/// Gas budget. `None` while estimating.
	pub gas_limit: Option<u64>,
	/// Legacy gas price in wei. `None` while estimating.
	pub gas_price: Option<u128>,
}

impl Transaction {
	/// Creates a zero-value call without gas parameters.
	pub fn call(to: Address, data: impl Into<Bytes>) -> Self {
		Self {
			to,
			data: data.into(),
			value: U256::ZERO,
			gas_limit: None,
			gas_price: None,
		}
	}

	/// Sets the gas budget and price used for submission.
	pub fn with_gas(mut self, gas_limit: u64, gas_price: u128) -> Self {
		self.gas_limit = Some(gas_limit);
		self.gas_price = Some(gas_price);
		self
	}

	/// First four bytes of the calldata, if present.
	pub fn selector(&self) -> Option<[u8; 4]> {
		self.data.get(..4).and_then(|s| s.try_into().ok())
	}
}

/// How the gas price attached to submissions is obtained.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GasPricePolicy {
	/// Reuse the price observed when the account context was created.
	#[default]
	Snapshot,
	/// Fetch the current price before every submission.
	PerCall,
}

/// Receipt of an included transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionReceipt {
	/// The hash of the transaction.
	pub hash: TxHash,
	/// The block number where the transaction was included.
	pub block_number: u64,
	/// Whether the transaction executed successfully.
	pub success: bool,
	/// Gas consumed by execution.
	pub gas_used: u64,
	/// Raw logs in emission order.
	pub logs: Vec<Log>,
}
