//! Contract interface descriptions and receipt decoding.
//!
//! Each target contract is described by its compiled ABI. Logs in a receipt
//! are matched to an interface by emitting address and first topic, and
//! decoded into [`EventRecord`]s whose arguments merge indexed topics and
//! data words back into declaration order. Logs that cannot be matched stay
//! in the list as undecoded records so positions and counts are preserved.

use crate::DeliveryError;
use alloy::dyn_abi::EventExt;
use alloy::json_abi::{Event, Function, JsonAbi};
use alloy::primitives::{Address, Log, TxHash, B256};
use metaverse_types::{short_hash, EventParam, EventRecord};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// Compiled artifact (`{"abi": [...], ...}`) or bare ABI array.
#[derive(Deserialize)]
#[serde(untagged)]
enum AbiDocument {
	Bare(JsonAbi),
	Artifact { abi: JsonAbi },
}

/// ABI-backed description of one deployed contract.
#[derive(Debug, Clone)]
pub struct ContractInterface {
	name: String,
	address: Address,
	abi: JsonAbi,
	events: HashMap<B256, Event>,
}

impl ContractInterface {
	pub fn new(name: impl Into<String>, address: Address, abi: JsonAbi) -> Self {
		let events = abi
			.events()
			.filter(|event| !event.anonymous)
			.map(|event| (event.selector(), event.clone()))
			.collect();

		Self {
			name: name.into(),
			address,
			abi,
			events,
		}
	}

	/// Parses a Hardhat artifact or a bare ABI array.
	pub fn from_json(
		name: impl Into<String>,
		address: Address,
		json: &str,
	) -> Result<Self, DeliveryError> {
		let name = name.into();
		let document: AbiDocument = serde_json::from_str(json).map_err(|e| {
			DeliveryError::Configuration(format!("Invalid ABI for {}: {}", name, e))
		})?;
		let abi = match document {
			AbiDocument::Bare(abi) => abi,
			AbiDocument::Artifact { abi } => abi,
		};
		Ok(Self::new(name, address, abi))
	}

	/// Reads an artifact or ABI file from disk.
	pub async fn load(
		name: impl Into<String>,
		address: Address,
		path: impl AsRef<Path>,
	) -> Result<Self, DeliveryError> {
		let name = name.into();
		let path = path.as_ref();
		let json = tokio::fs::read_to_string(path).await.map_err(|e| {
			DeliveryError::Configuration(format!(
				"Failed to read ABI for {} from {}: {}",
				name,
				path.display(),
				e
			))
		})?;
		let interface = Self::from_json(name, address, &json)?;
		tracing::debug!(
			contract = %interface.name,
			address = %interface.address,
			functions = interface.abi.functions().count(),
			events = interface.events.len(),
			"Loaded contract interface"
		);
		Ok(interface)
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn address(&self) -> Address {
		self.address
	}

	pub fn abi(&self) -> &JsonAbi {
		&self.abi
	}

	/// Looks up a method overload by name and argument count.
	pub fn function(&self, method: &str, arity: usize) -> Result<&Function, DeliveryError> {
		self.abi
			.function(method)
			.and_then(|overloads| overloads.iter().find(|f| f.inputs.len() == arity))
			.ok_or_else(|| {
				DeliveryError::Decode(format!(
					"Contract {} has no method {} taking {} arguments",
					self.name, method, arity
				))
			})
	}

	/// Returns true if the ABI declares an event with this name.
	pub fn declares_event(&self, name: &str) -> bool {
		self.events.values().any(|event| event.name == name)
	}

	fn decode(&self, log: &Log) -> Option<EventRecord> {
		let signature = log.data.topics().first().copied()?;
		let event = self.events.get(&signature)?;

		let decoded = match event.decode_log(&log.data) {
			Ok(decoded) => decoded,
			Err(e) => {
				tracing::debug!(
					contract = %self.name,
					event = %event.name,
					error = %e,
					"Log matched event signature but failed to decode"
				);
				return None;
			}
		};

		let mut indexed = decoded.indexed.into_iter();
		let mut body = decoded.body.into_iter();
		let params = event
			.inputs
			.iter()
			.filter_map(|input| {
				let value = if input.indexed {
					indexed.next()
				} else {
					body.next()
				}?;
				Some(EventParam {
					name: input.name.clone(),
					value,
				})
			})
			.collect();

		Some(EventRecord {
			contract: log.address,
			name: Some(event.name.clone()),
			signature: Some(signature),
			params,
		})
	}
}

/// Decodes every log against the interface of its emitting contract.
///
/// The result has exactly one record per log, in emission order.
pub fn decode_logs(logs: &[Log], interfaces: &[&ContractInterface]) -> Vec<EventRecord> {
	logs.iter()
		.map(|log| {
			interfaces
				.iter()
				.filter(|interface| interface.address == log.address)
				.find_map(|interface| interface.decode(log))
				.unwrap_or_else(|| {
					EventRecord::undecoded(log.address, log.data.topics().first().copied())
				})
		})
		.collect()
}

/// A successful receipt with its decoded events.
#[derive(Debug, Clone)]
pub struct DecodedReceipt {
	pub hash: TxHash,
	pub block_number: u64,
	pub gas_used: u64,
	/// One record per emitted log, in emission order.
	pub events: Vec<EventRecord>,
}

impl DecodedReceipt {
	pub fn event_count(&self) -> usize {
		self.events.len()
	}

	pub fn event_at(&self, index: usize) -> Option<&EventRecord> {
		self.events.get(index)
	}

	/// First event with this name emitted by `contract`.
	pub fn find_event(&self, contract: Address, name: &str) -> Option<&EventRecord> {
		self.events.iter().find(|event| event.matches(contract, name))
	}

	/// Like [`find_event`](Self::find_event), but a missing event is a
	/// decode error naming the contract and transaction.
	pub fn require_event(
		&self,
		contract: &ContractInterface,
		name: &str,
	) -> Result<&EventRecord, DeliveryError> {
		self.find_event(contract.address(), name).ok_or_else(|| {
			DeliveryError::Decode(format!(
				"Event {} from {} not found in transaction {} ({} events)",
				name,
				contract.name(),
				short_hash(&self.hash),
				self.events.len()
			))
		})
	}
}
