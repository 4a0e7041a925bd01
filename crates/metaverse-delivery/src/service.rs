//! Gas-aware invoker and confirmation waiting.

use crate::{
	decode_logs, AccountContext, ContractInterface, DecodedReceipt, DeliveryError,
	DeliveryInterface, FailureKind, TransactionFailure,
};
use alloy::dyn_abi::{DynSolType, DynSolValue, FunctionExt, JsonAbiExt, Specifier};
use alloy::primitives::{TxHash, U256};
use metaverse_types::{short_hash, GasPricePolicy, Transaction, TransactionReceipt};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;

/// Gas budgeting and confirmation settings.
#[derive(Debug, Clone)]
pub struct DeliverySettings {
	/// Budget used when estimation fails.
	pub default_gas_limit: u64,
	/// Multiplier applied to a successful estimate.
	pub estimate_multiplier: u64,
	pub price_policy: GasPricePolicy,
	/// Confirmations required before a receipt is accepted.
	pub confirmations: u64,
	pub poll_interval: Duration,
	pub confirmation_timeout: Duration,
}

impl Default for DeliverySettings {
	fn default() -> Self {
		Self {
			default_gas_limit: 5_000_000,
			estimate_multiplier: 2,
			price_policy: GasPricePolicy::Snapshot,
			confirmations: 1,
			poll_interval: Duration::from_secs(7),
			confirmation_timeout: Duration::from_secs(600),
		}
	}
}

/// A contract method call to be submitted.
#[derive(Debug, Clone)]
pub struct OperationRequest<'a> {
	pub contract: &'a ContractInterface,
	pub method: &'a str,
	pub args: Vec<DynSolValue>,
}

impl<'a> OperationRequest<'a> {
	pub fn new(contract: &'a ContractInterface, method: &'a str, args: Vec<DynSolValue>) -> Self {
		Self {
			contract,
			method,
			args,
		}
	}

	fn encode(&self) -> Result<Transaction, DeliveryError> {
		let function = self.contract.function(self.method, self.args.len())?;
		// Integers are built as 256-bit values, narrow them to the declared widths
		let args = function
			.inputs
			.iter()
			.zip(&self.args)
			.map(|(param, value)| match (param.resolve(), value) {
				(Ok(DynSolType::Uint(bits)), DynSolValue::Uint(v, _)) => {
					if v.bit_len() > bits {
						return Err(self.out_of_range(&param.name, &param.ty, v));
					}
					Ok(DynSolValue::Uint(*v, bits))
				}
				(Ok(DynSolType::Int(bits)), DynSolValue::Int(v, _)) => {
					// Two's complement range: magnitude below 2^(bits-1), or equal when negative
					let magnitude = v.unsigned_abs();
					let magnitude = if v.is_negative() {
						magnitude - U256::from(1)
					} else {
						magnitude
					};
					if magnitude.bit_len() >= bits {
						return Err(self.out_of_range(&param.name, &param.ty, v));
					}
					Ok(DynSolValue::Int(*v, bits))
				}
				_ => Ok(value.clone()),
			})
			.collect::<Result<Vec<_>, _>>()?;
		let data = function.abi_encode_input(&args).map_err(|e| {
			DeliveryError::Configuration(format!(
				"Invalid arguments for {}.{}: {}",
				self.contract.name(),
				self.method,
				e
			))
		})?;
		Ok(Transaction::call(self.contract.address(), data))
	}

	fn out_of_range(&self, param: &str, ty: &str, value: impl fmt::Display) -> DeliveryError {
		DeliveryError::Configuration(format!(
			"Argument {} of {}.{} does not fit {}: {}",
			param,
			self.contract.name(),
			self.method,
			ty,
			value
		))
	}
}

/// A submitted transaction awaiting confirmation.
pub struct PendingTransaction {
	hash: TxHash,
	method: String,
	tx: Transaction,
	delivery: Arc<dyn DeliveryInterface>,
}

impl PendingTransaction {
	pub fn hash(&self) -> TxHash {
		self.hash
	}

	/// Method the transaction invoked.
	pub fn method(&self) -> &str {
		&self.method
	}
}

impl fmt::Debug for PendingTransaction {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("PendingTransaction")
			.field("hash", &self.hash)
			.field("method", &self.method)
			.finish()
	}
}

/// Reason a mined transaction reverted, from an `eth_call` replay.
async fn replay_failure(pending: &PendingTransaction, block_number: u64) -> TransactionFailure {
	match pending.delivery.call_at(&pending.tx, block_number).await {
		Err(DeliveryError::Submission(failure)) => {
			TransactionFailure::new(FailureKind::RevertedOnChain, failure.message)
		}
		Err(e) => {
			tracing::debug!(error = %e, "Replay of reverted transaction failed");
			TransactionFailure::reverted_on_chain()
		}
		Ok(_) => TransactionFailure::reverted_on_chain(),
	}
}

/// Service that prices, submits and confirms contract calls.
///
/// Submission and confirmation are separate steps: `invoke` returns as soon
/// as the node accepts the transaction, and `confirm` waits for inclusion.
/// Nothing here retries.
#[derive(Debug, Clone)]
pub struct DeliveryService {
	settings: DeliverySettings,
}

impl DeliveryService {
	pub fn new(settings: DeliverySettings) -> Self {
		Self { settings }
	}

	pub fn settings(&self) -> &DeliverySettings {
		&self.settings
	}

	/// Estimates, prices and submits a call from the context's account.
	///
	/// A successful estimate is multiplied by the configured multiplier. A
	/// failed estimate is logged and replaced by the default gas limit; it never
	/// fails the call by itself.
	#[instrument(skip_all, fields(contract = %request.contract.name(), method = %request.method))]
	pub async fn invoke(
		&self,
		context: &AccountContext,
		request: OperationRequest<'_>,
	) -> Result<PendingTransaction, DeliveryError> {
		let tx = request.encode()?;
		let delivery = context.delivery();

		let _guard = context.lock_submissions().await;

		let gas_price = match self.settings.price_policy {
			GasPricePolicy::Snapshot => context.gas_price(),
			GasPricePolicy::PerCall => delivery.get_gas_price().await?,
		};

		let gas_limit = match delivery.estimate_gas(&tx).await {
			Ok(estimate) => estimate.saturating_mul(self.settings.estimate_multiplier),
			Err(e) => {
				tracing::warn!(
					error = %e,
					default_gas_limit = self.settings.default_gas_limit,
					"Gas estimation failed, using default gas limit"
				);
				self.settings.default_gas_limit
			}
		};

		let tx = tx.with_gas(gas_limit, gas_price);
		let hash = delivery
			.submit(tx.clone())
			.await
			.inspect_err(|e| tracing::error!(error = %e, "Transaction submission failed"))?;

		tracing::info!(
			tx_hash = %short_hash(&hash),
			gas_limit,
			gas_price,
			"Submitted transaction"
		);

		Ok(PendingTransaction {
			hash,
			method: request.method.to_string(),
			tx,
			delivery: delivery.clone(),
		})
	}

	/// Waits for inclusion and decodes the receipt's events.
	///
	/// A receipt with failure status yields [`DeliveryError::Reverted`] and
	/// no decoded events. The call is replayed at the receipt's block to
	/// recover the revert reason.
	#[instrument(skip_all, fields(method = %pending.method, tx_hash = %short_hash(&pending.hash)))]
	pub async fn confirm(
		&self,
		pending: PendingTransaction,
		interfaces: &[&ContractInterface],
	) -> Result<DecodedReceipt, DeliveryError> {
		let timeout = self.settings.confirmation_timeout;
		let receipt = tokio::time::timeout(timeout, self.wait_for_receipt(&pending))
			.await
			.map_err(|_| DeliveryError::Timeout {
				hash: pending.hash,
				seconds: timeout.as_secs(),
			})??;

		if !receipt.success {
			tracing::debug!(receipt = ?receipt, "Reverted receipt");
			let err = DeliveryError::Reverted {
				hash: receipt.hash,
				block_number: receipt.block_number,
				failure: replay_failure(&pending, receipt.block_number).await,
			};
			tracing::error!(error = %err, "Transaction reverted");
			return Err(err);
		}

		let events = decode_logs(&receipt.logs, interfaces);
		for (index, event) in events.iter().enumerate() {
			tracing::debug!(
				index,
				contract = %event.contract,
				event = event.name.as_deref().unwrap_or("<unknown>"),
				"Decoded event"
			);
		}

		tracing::info!(
			block_number = receipt.block_number,
			gas_used = receipt.gas_used,
			events = events.len(),
			"Transaction confirmed"
		);

		Ok(DecodedReceipt {
			hash: receipt.hash,
			block_number: receipt.block_number,
			gas_used: receipt.gas_used,
			events,
		})
	}

	/// Submits and confirms in one step.
	pub async fn execute(
		&self,
		context: &AccountContext,
		request: OperationRequest<'_>,
		interfaces: &[&ContractInterface],
	) -> Result<DecodedReceipt, DeliveryError> {
		let pending = self.invoke(context, request).await?;
		self.confirm(pending, interfaces).await
	}

	/// Executes a read-only call and decodes its outputs.
	#[instrument(skip_all, fields(contract = %request.contract.name(), method = %request.method))]
	pub async fn query(
		&self,
		context: &AccountContext,
		request: OperationRequest<'_>,
	) -> Result<Vec<DynSolValue>, DeliveryError> {
		let function = request.contract.function(request.method, request.args.len())?;
		let tx = request.encode()?;
		let output = context.delivery().call(&tx).await?;

		function.abi_decode_output(&output).map_err(|e| {
			DeliveryError::Decode(format!(
				"Failed to decode {}.{} output: {}",
				request.contract.name(),
				request.method,
				e
			))
		})
	}

	async fn wait_for_receipt(
		&self,
		pending: &PendingTransaction,
	) -> Result<TransactionReceipt, DeliveryError> {
		let required = self.settings.confirmations.max(1);
		loop {
			if let Some(receipt) = pending.delivery.get_receipt(&pending.hash).await? {
				if required == 1 {
					return Ok(receipt);
				}
				let head = pending.delivery.get_block_number().await?;
				let confirmations = head.saturating_sub(receipt.block_number) + 1;
				if confirmations >= required {
					return Ok(receipt);
				}
				tracing::debug!(confirmations, required, "Waiting for more confirmations");
			}
			tokio::time::sleep(self.settings.poll_interval).await;
		}
	}
}
