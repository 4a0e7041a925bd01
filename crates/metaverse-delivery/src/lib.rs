//! Transaction delivery module for the metaverse client.
//!
//! This module owns the transaction lifecycle: it builds the account
//! context, prices and submits contract calls, waits for their inclusion,
//! decodes the emitted events against the supplied contract interfaces and
//! translates node failures into descriptive errors. The network itself is
//! reached through the [`DeliveryInterface`] seam so that the lifecycle can
//! run against a live node or a scripted mock.

use alloy::primitives::{Address, Bytes, TxHash, U256};
use async_trait::async_trait;
use metaverse_account::{AccountError, LocalAccount};
use metaverse_types::{Transaction, TransactionReceipt};
use std::sync::Arc;
use thiserror::Error;

mod context;
mod failure;
mod interface;
mod service;

pub use context::AccountContext;
pub use failure::{classify, FailureKind, TransactionFailure};
pub use interface::{decode_logs, ContractInterface, DecodedReceipt};
pub use service::{DeliveryService, DeliverySettings, OperationRequest, PendingTransaction};

/// Re-export implementations
pub mod implementations {
	pub mod evm {
		pub mod alloy;
	}
	pub mod mock;
}

/// Errors that can occur during transaction delivery operations.
#[derive(Debug, Error)]
pub enum DeliveryError {
	/// A required setting or interface description is missing or malformed.
	#[error("Configuration error: {0}")]
	Configuration(String),
	/// Error that occurs during network communication.
	#[error("Network error: {0}")]
	Network(String),
	/// The node rejected the request.
	#[error("Submission failed: {0}")]
	Submission(TransactionFailure),
	/// The transaction was included with failure status.
	#[error("Transaction {hash} reverted in block {block_number}: {failure}")]
	Reverted {
		hash: TxHash,
		block_number: u64,
		failure: TransactionFailure,
	},
	/// Inclusion was not observed within the confirmation timeout.
	#[error("Timed out after {seconds}s waiting for transaction {hash}")]
	Timeout { hash: TxHash, seconds: u64 },
	/// The receipt does not have the expected event shape.
	#[error("Decode error: {0}")]
	Decode(String),
	/// Error that occurs while loading a signing account.
	#[error("Account error: {0}")]
	Account(AccountError),
}

impl From<AccountError> for DeliveryError {
	fn from(err: AccountError) -> Self {
		match err {
			AccountError::MissingCredential => DeliveryError::Configuration(err.to_string()),
			other => DeliveryError::Account(other),
		}
	}
}

/// Trait defining the network operations the transaction lifecycle needs.
///
/// An implementation is bound to one signing account: `submit` signs with
/// that account and `address` returns it.
#[async_trait]
pub trait DeliveryInterface: Send + Sync {
	/// Address of the signing account.
	fn address(&self) -> Address;

	/// Gets the current gas price for the network in wei.
	async fn get_gas_price(&self) -> Result<u128, DeliveryError>;

	/// Gets the native balance of an address in wei.
	async fn get_balance(&self, address: Address) -> Result<U256, DeliveryError>;

	/// Gets the current block number.
	async fn get_block_number(&self) -> Result<u64, DeliveryError>;

	/// Estimates the gas a call would consume from the signing account.
	async fn estimate_gas(&self, tx: &Transaction) -> Result<u64, DeliveryError>;

	/// Signs and submits a transaction, returning its hash.
	async fn submit(&self, tx: Transaction) -> Result<TxHash, DeliveryError>;

	/// Retrieves the receipt for a transaction, `None` while it is pending.
	async fn get_receipt(&self, hash: &TxHash) -> Result<Option<TransactionReceipt>, DeliveryError>;

	/// Executes a read-only call and returns the raw output.
	async fn call(&self, tx: &Transaction) -> Result<Bytes, DeliveryError>;

	/// Executes a read-only call against the state at `block_number`.
	async fn call_at(&self, tx: &Transaction, block_number: u64) -> Result<Bytes, DeliveryError>;
}

/// Opens a delivery channel for a signing account.
#[async_trait]
pub trait Connector: Send + Sync {
	/// Connects `account` to the network.
	async fn connect(
		&self,
		account: &LocalAccount,
	) -> Result<Arc<dyn DeliveryInterface>, DeliveryError>;
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_missing_credential_is_configuration_error() {
		let err: DeliveryError = AccountError::MissingCredential.into();
		assert!(matches!(err, DeliveryError::Configuration(_)));

		let err: DeliveryError = AccountError::InvalidKey("bad".into()).into();
		assert!(matches!(err, DeliveryError::Account(_)));
	}

	#[test]
	fn test_reverted_display() {
		let err = DeliveryError::Reverted {
			hash: TxHash::repeat_byte(0xab),
			block_number: 12,
			failure: TransactionFailure::reverted_on_chain(),
		};
		let rendered = err.to_string();
		assert!(rendered.contains("reverted in block 12"));
		assert!(rendered.contains("0xabab"));
	}
}
