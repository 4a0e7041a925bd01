//! Translation of node and contract errors into descriptive failures.
//!
//! Nodes report rejected or reverted calls as free-form JSON-RPC error
//! messages, sometimes with ABI-encoded revert data attached. This module
//! recognizes the common message patterns and produces a single
//! [`TransactionFailure`] value that is safe to surface to callers.

use alloy::sol_types::decode_revert_reason;
use std::fmt;

/// Recognized failure categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
	/// The sender cannot pay for gas and value.
	InsufficientFunds,
	/// The nonce has already been used.
	NonceTooLow,
	/// The gas price is below what the pool accepts.
	TransactionUnderpriced,
	/// The fee cap is below the current block base fee.
	MaxFeeBelowBaseFee,
	/// The gas budget does not cover intrinsic cost.
	IntrinsicGasTooLow,
	/// Execution ran out of gas.
	OutOfGas,
	/// The call reverted during simulation or submission.
	ExecutionReverted,
	/// A signer refused to sign.
	UserRejected,
	/// The transaction was included with failure status.
	RevertedOnChain,
	/// Not a recognized pattern.
	Unknown,
}

impl FailureKind {
	fn description(&self) -> &'static str {
		match self {
			FailureKind::InsufficientFunds => "Insufficient funds for gas and value",
			FailureKind::NonceTooLow => "Nonce already used",
			FailureKind::TransactionUnderpriced => "Gas price too low to be accepted",
			FailureKind::MaxFeeBelowBaseFee => "Max fee per gas below block base fee",
			FailureKind::IntrinsicGasTooLow => "Gas limit below intrinsic cost",
			FailureKind::OutOfGas => "Out of gas",
			FailureKind::ExecutionReverted => "Execution reverted",
			FailureKind::UserRejected => "Signature rejected",
			FailureKind::RevertedOnChain => "Transaction reverted on chain",
			FailureKind::Unknown => "Transaction failed",
		}
	}
}

impl fmt::Display for FailureKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.description())
	}
}

/// Message patterns in match order. Lowercase.
const PATTERNS: &[(&str, FailureKind)] = &[
	("insufficient funds", FailureKind::InsufficientFunds),
	("nonce too low", FailureKind::NonceTooLow),
	("replacement transaction underpriced", FailureKind::TransactionUnderpriced),
	("transaction underpriced", FailureKind::TransactionUnderpriced),
	("max fee per gas less than block base fee", FailureKind::MaxFeeBelowBaseFee),
	("intrinsic gas too low", FailureKind::IntrinsicGasTooLow),
	("gas required exceeds allowance", FailureKind::OutOfGas),
	("out of gas", FailureKind::OutOfGas),
	("execution reverted", FailureKind::ExecutionReverted),
	("user rejected", FailureKind::UserRejected),
	("user denied", FailureKind::UserRejected),
];

/// A classified transaction failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionFailure {
	/// Recognized category.
	pub kind: FailureKind,
	/// Human-readable detail, e.g. the decoded revert reason.
	pub message: String,
}

impl TransactionFailure {
	pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
		Self {
			kind,
			message: message.into(),
		}
	}

	/// Failure for a receipt whose status is not success.
	pub fn reverted_on_chain() -> Self {
		Self::new(
			FailureKind::RevertedOnChain,
			"execution failed, no revert reason is available from the receipt",
		)
	}
}

impl fmt::Display for TransactionFailure {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if self.message.is_empty() {
			write!(f, "{}", self.kind)
		} else {
			write!(f, "{}: {}", self.kind, self.message)
		}
	}
}

/// Classifies a node error message, with optional revert data.
pub fn classify(message: &str, revert_data: Option<&[u8]>) -> TransactionFailure {
	tracing::debug!(raw_error = %message, "Classifying node error");

	let lowered = message.to_ascii_lowercase();
	let kind = PATTERNS
		.iter()
		.find(|(pattern, _)| lowered.contains(pattern))
		.map(|(_, kind)| *kind)
		.unwrap_or_else(|| {
			if revert_data.is_some_and(|data| !data.is_empty()) {
				FailureKind::ExecutionReverted
			} else {
				FailureKind::Unknown
			}
		});

	let detail = match kind {
		FailureKind::ExecutionReverted => revert_reason(&lowered, message, revert_data),
		_ => message.trim().to_string(),
	};

	TransactionFailure::new(kind, detail)
}

fn revert_reason(lowered: &str, message: &str, revert_data: Option<&[u8]>) -> String {
	if let Some(reason) = revert_data.and_then(decode_revert_reason) {
		return reason;
	}

	const MARKER: &str = "execution reverted:";
	match lowered.find(MARKER) {
		Some(start) => {
			let reason = message[start + MARKER.len()..].trim();
			if reason.is_empty() {
				"no reason given".to_string()
			} else {
				reason.to_string()
			}
		}
		None => "no reason given".to_string(),
	}
}
