//! Scripted in-memory delivery for testing and development.
//!
//! `MockDelivery` records every estimate, submission and call it receives and
//! answers from a script: queued receipts are attached to submissions in
//! order, queued call responses are returned by read-only calls. Each
//! submission mines one block. `MockConnector` hands out registered mocks by
//! signer address and counts connection attempts.

use crate::{classify, Connector, DeliveryError, DeliveryInterface, TransactionFailure};
use alloy::primitives::{keccak256, Address, Bytes, Log, TxHash, U256};
use async_trait::async_trait;
use metaverse_account::LocalAccount;
use metaverse_types::{Transaction, TransactionReceipt};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// Receipt outcome queued for the next submission.
#[derive(Debug, Clone)]
struct ScriptedReceipt {
	success: bool,
	logs: Vec<Log>,
}

#[derive(Debug)]
struct MockState {
	gas_price: u128,
	balance: U256,
	estimate: Option<u64>,
	block_number: u64,
	receipts: VecDeque<ScriptedReceipt>,
	call_responses: VecDeque<Bytes>,
	replay_failures: VecDeque<TransactionFailure>,
	submission_failure: Option<TransactionFailure>,
	never_mine: bool,
	mined: HashMap<TxHash, TransactionReceipt>,
	submitted: Vec<Transaction>,
	estimates: Vec<Transaction>,
	calls: Vec<Transaction>,
	replays: Vec<(Transaction, u64)>,
	network_calls: usize,
}

/// Mock delivery bound to one signer address.
#[derive(Debug)]
pub struct MockDelivery {
	address: Address,
	state: Mutex<MockState>,
}

impl MockDelivery {
	/// Creates a mock with a 1 gwei gas price, zero balance and a 100k gas
	/// estimate.
	pub fn new(address: Address) -> Self {
		Self {
			address,
			state: Mutex::new(MockState {
				gas_price: 1_000_000_000,
				balance: U256::ZERO,
				estimate: Some(100_000),
				block_number: 1,
				receipts: VecDeque::new(),
				call_responses: VecDeque::new(),
				replay_failures: VecDeque::new(),
				submission_failure: None,
				never_mine: false,
				mined: HashMap::new(),
				submitted: Vec::new(),
				estimates: Vec::new(),
				calls: Vec::new(),
				replays: Vec::new(),
				network_calls: 0,
			}),
		}
	}

	pub fn with_gas_price(self, gas_price: u128) -> Self {
		self.state().gas_price = gas_price;
		self
	}

	pub fn with_balance(self, balance: U256) -> Self {
		self.state().balance = balance;
		self
	}

	/// Gas estimate to answer with. `None` makes estimation fail as a revert.
	pub fn with_estimate(self, estimate: Option<u64>) -> Self {
		self.state().estimate = estimate;
		self
	}

	pub fn set_gas_price(&self, gas_price: u128) {
		self.state().gas_price = gas_price;
	}

	/// Queues the outcome of the next submission.
	pub fn push_receipt(&self, success: bool, logs: Vec<Log>) {
		self.state()
			.receipts
			.push_back(ScriptedReceipt { success, logs });
	}

	/// Queues the output of the next read-only call.
	pub fn push_call_response(&self, output: impl Into<Bytes>) {
		self.state().call_responses.push_back(output.into());
	}

	/// Queues the failure of the next replayed call. Unscripted replays
	/// succeed with empty output.
	pub fn push_replay_failure(&self, failure: TransactionFailure) {
		self.state().replay_failures.push_back(failure);
	}

	/// Makes every following submission fail with `failure`.
	pub fn fail_submissions(&self, failure: TransactionFailure) {
		self.state().submission_failure = Some(failure);
	}

	/// Accepts submissions but never reports a receipt.
	pub fn never_mine(&self) {
		self.state().never_mine = true;
	}

	pub fn advance_blocks(&self, blocks: u64) {
		self.state().block_number += blocks;
	}

	pub fn block_number(&self) -> u64 {
		self.state().block_number
	}

	/// Transactions accepted by `submit`, in order.
	pub fn submitted(&self) -> Vec<Transaction> {
		self.state().submitted.clone()
	}

	/// Transactions passed to `estimate_gas`, in order.
	pub fn estimates(&self) -> Vec<Transaction> {
		self.state().estimates.clone()
	}

	/// Transactions passed to `call`, in order.
	pub fn calls(&self) -> Vec<Transaction> {
		self.state().calls.clone()
	}

	/// Calls passed to `call_at` with their block numbers, in order.
	pub fn replays(&self) -> Vec<(Transaction, u64)> {
		self.state().replays.clone()
	}

	/// Number of network operations served so far.
	pub fn network_calls(&self) -> usize {
		self.state().network_calls
	}

	fn state(&self) -> MutexGuard<'_, MockState> {
		self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
	}
}

#[async_trait]
impl DeliveryInterface for MockDelivery {
	fn address(&self) -> Address {
		self.address
	}

	async fn get_gas_price(&self) -> Result<u128, DeliveryError> {
		let mut state = self.state();
		state.network_calls += 1;
		Ok(state.gas_price)
	}

	async fn get_balance(&self, _address: Address) -> Result<U256, DeliveryError> {
		let mut state = self.state();
		state.network_calls += 1;
		Ok(state.balance)
	}

	async fn get_block_number(&self) -> Result<u64, DeliveryError> {
		let mut state = self.state();
		state.network_calls += 1;
		Ok(state.block_number)
	}

	async fn estimate_gas(&self, tx: &Transaction) -> Result<u64, DeliveryError> {
		let mut state = self.state();
		state.network_calls += 1;
		state.estimates.push(tx.clone());
		state.estimate.ok_or_else(|| {
			DeliveryError::Submission(classify("execution reverted: estimation disabled", None))
		})
	}

	async fn submit(&self, tx: Transaction) -> Result<TxHash, DeliveryError> {
		let mut state = self.state();
		state.network_calls += 1;
		if let Some(failure) = &state.submission_failure {
			return Err(DeliveryError::Submission(failure.clone()));
		}

		let nonce = state.submitted.len() as u64;
		let hash = keccak256([self.address.as_slice(), &nonce.to_be_bytes()[..]].concat());
		state.submitted.push(tx);

		let scripted = state.receipts.pop_front().unwrap_or(ScriptedReceipt {
			success: true,
			logs: Vec::new(),
		});
		state.block_number += 1;
		if !state.never_mine {
			let receipt = TransactionReceipt {
				hash,
				block_number: state.block_number,
				success: scripted.success,
				gas_used: 21_000,
				logs: scripted.logs,
			};
			state.mined.insert(hash, receipt);
		}
		Ok(hash)
	}

	async fn get_receipt(&self, hash: &TxHash) -> Result<Option<TransactionReceipt>, DeliveryError> {
		let mut state = self.state();
		state.network_calls += 1;
		Ok(state.mined.get(hash).cloned())
	}

	async fn call(&self, tx: &Transaction) -> Result<Bytes, DeliveryError> {
		let mut state = self.state();
		state.network_calls += 1;
		state.calls.push(tx.clone());
		state
			.call_responses
			.pop_front()
			.ok_or_else(|| DeliveryError::Network("No scripted call response".to_string()))
	}

	async fn call_at(&self, tx: &Transaction, block_number: u64) -> Result<Bytes, DeliveryError> {
		let mut state = self.state();
		state.network_calls += 1;
		state.replays.push((tx.clone(), block_number));
		match state.replay_failures.pop_front() {
			Some(failure) => Err(DeliveryError::Submission(failure)),
			None => Ok(Bytes::new()),
		}
	}
}

/// Connector serving registered mocks by signer address.
#[derive(Debug, Default)]
pub struct MockConnector {
	deliveries: Mutex<HashMap<Address, Arc<MockDelivery>>>,
	connections: AtomicUsize,
}

impl MockConnector {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn register(&self, delivery: Arc<MockDelivery>) {
		self.deliveries
			.lock()
			.unwrap_or_else(|poisoned| poisoned.into_inner())
			.insert(delivery.address(), delivery);
	}

	/// Number of `connect` calls so far.
	pub fn connections(&self) -> usize {
		self.connections.load(Ordering::SeqCst)
	}
}

#[async_trait]
impl Connector for MockConnector {
	async fn connect(
		&self,
		account: &LocalAccount,
	) -> Result<Arc<dyn DeliveryInterface>, DeliveryError> {
		self.connections.fetch_add(1, Ordering::SeqCst);
		let delivery = self
			.deliveries
			.lock()
			.unwrap_or_else(|poisoned| poisoned.into_inner())
			.get(&account.address())
			.cloned()
			.ok_or_else(|| {
				DeliveryError::Network(format!(
					"No mock delivery registered for {}",
					account.address()
				))
			})?;
		Ok(delivery as Arc<dyn DeliveryInterface>)
	}
}
