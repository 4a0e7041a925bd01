//! Transaction delivery over JSON-RPC using the Alloy library.
//!
//! The provider's wallet signs with the connected account and its fillers
//! assign nonces. Node error responses on estimation, submission or calls
//! are classified into [`TransactionFailure`](crate::TransactionFailure)s;
//! transport failures stay network errors.

use crate::{classify, Connector, DeliveryError, DeliveryInterface};
use alloy::eips::BlockId;
use alloy::network::{EthereumWallet, ReceiptResponse, TransactionBuilder};
use alloy::primitives::{Address, Bytes, TxHash, U256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::TransactionRequest;
use alloy::signers::Signer;
use alloy::transports::TransportError;
use async_trait::async_trait;
use metaverse_account::LocalAccount;
use metaverse_types::{Transaction, TransactionReceipt};
use std::sync::Arc;
use std::time::Duration;

/// Alloy-based EVM delivery bound to one signing account.
pub struct AlloyDelivery {
	provider: DynProvider,
	address: Address,
}

impl AlloyDelivery {
	/// Creates a provider for `endpoint` that signs with `account`.
	///
	/// No request is made until the first operation.
	pub fn new(
		endpoint: &str,
		account: &LocalAccount,
		chain_id: Option<u64>,
		poll_interval: Duration,
	) -> Result<Self, DeliveryError> {
		// The endpoint may embed an API key, keep it out of the error
		let url: reqwest::Url = endpoint
			.parse()
			.map_err(|e| DeliveryError::Configuration(format!("Invalid RPC URL: {}", e)))?;

		let signer = account.signer().clone().with_chain_id(chain_id);
		let provider = ProviderBuilder::new()
			.wallet(EthereumWallet::from(signer))
			.connect_http(url);

		provider.client().set_poll_interval(poll_interval);

		Ok(Self {
			provider: provider.erased(),
			address: account.address(),
		})
	}

	fn request(&self, tx: &Transaction) -> TransactionRequest {
		let mut request = TransactionRequest::default()
			.with_from(self.address)
			.with_to(tx.to)
			.with_input(tx.data.clone())
			.with_value(tx.value);
		if let Some(gas_limit) = tx.gas_limit {
			request = request.with_gas_limit(gas_limit);
		}
		if let Some(gas_price) = tx.gas_price {
			request = request.with_gas_price(gas_price);
		}
		request
	}
}

/// Maps an error from a state-changing or simulated call.
fn rpc_error(context: &str, err: TransportError) -> DeliveryError {
	match err.as_error_resp() {
		Some(payload) => {
			let revert_data = payload.as_revert_data();
			DeliveryError::Submission(classify(
				&payload.message,
				revert_data.as_deref().map(|data| data.as_ref()),
			))
		}
		None => network_error(context, err),
	}
}

fn network_error(context: &str, err: TransportError) -> DeliveryError {
	DeliveryError::Network(format!("{}: {}", context, err))
}

#[async_trait]
impl DeliveryInterface for AlloyDelivery {
	fn address(&self) -> Address {
		self.address
	}

	async fn get_gas_price(&self) -> Result<u128, DeliveryError> {
		self.provider
			.get_gas_price()
			.await
			.map_err(|e| network_error("Failed to get gas price", e))
	}

	async fn get_balance(&self, address: Address) -> Result<U256, DeliveryError> {
		self.provider
			.get_balance(address)
			.await
			.map_err(|e| network_error("Failed to get balance", e))
	}

	async fn get_block_number(&self) -> Result<u64, DeliveryError> {
		self.provider
			.get_block_number()
			.await
			.map_err(|e| network_error("Failed to get block number", e))
	}

	async fn estimate_gas(&self, tx: &Transaction) -> Result<u64, DeliveryError> {
		self.provider
			.estimate_gas(self.request(tx))
			.await
			.map_err(|e| rpc_error("Failed to estimate gas", e))
	}

	async fn submit(&self, tx: Transaction) -> Result<TxHash, DeliveryError> {
		let pending = self
			.provider
			.send_transaction(self.request(&tx))
			.await
			.map_err(|e| rpc_error("Failed to send transaction", e))?;

		let hash = *pending.tx_hash();
		tracing::debug!(tx_hash = %hash, to = %tx.to, "Transaction accepted by node");
		Ok(hash)
	}

	async fn get_receipt(&self, hash: &TxHash) -> Result<Option<TransactionReceipt>, DeliveryError> {
		let receipt = self
			.provider
			.get_transaction_receipt(*hash)
			.await
			.map_err(|e| network_error("Failed to get receipt", e))?;

		Ok(receipt.map(|receipt| TransactionReceipt {
			hash: receipt.transaction_hash,
			block_number: ReceiptResponse::block_number(&receipt).unwrap_or_default(),
			success: ReceiptResponse::status(&receipt),
			gas_used: ReceiptResponse::gas_used(&receipt),
			logs: receipt
				.inner
				.logs()
				.iter()
				.map(|log| log.inner.clone())
				.collect(),
		}))
	}

	async fn call(&self, tx: &Transaction) -> Result<Bytes, DeliveryError> {
		self.provider
			.call(self.request(tx))
			.await
			.map_err(|e| rpc_error("Failed to call contract", e))
	}

	async fn call_at(&self, tx: &Transaction, block_number: u64) -> Result<Bytes, DeliveryError> {
		self.provider
			.call(self.request(tx))
			.block(BlockId::number(block_number))
			.await
			.map_err(|e| rpc_error("Failed to replay call", e))
	}
}

/// Connects accounts to one JSON-RPC endpoint.
pub struct AlloyConnector {
	endpoint: String,
	chain_id: Option<u64>,
	poll_interval: Duration,
}

impl AlloyConnector {
	pub fn new(endpoint: impl Into<String>, chain_id: Option<u64>, poll_interval: Duration) -> Self {
		Self {
			endpoint: endpoint.into(),
			chain_id,
			poll_interval,
		}
	}
}

#[async_trait]
impl Connector for AlloyConnector {
	async fn connect(
		&self,
		account: &LocalAccount,
	) -> Result<Arc<dyn DeliveryInterface>, DeliveryError> {
		let delivery = AlloyDelivery::new(&self.endpoint, account, self.chain_id, self.poll_interval)?;
		tracing::debug!(address = %account.address(), chain_id = ?self.chain_id, "Connected signer");
		Ok(Arc::new(delivery) as Arc<dyn DeliveryInterface>)
	}
}
