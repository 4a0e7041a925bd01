//! Common types module for the metaverse client.
//!
//! This module defines the value types shared by every layer of the client:
//! credentials, contract identities, submitted transactions and their
//! receipts, decoded event records, and the fixed-point unit conversions
//! used when talking to the contracts.

/// Contract identities targeted by the client.
pub mod contracts;
/// Signing credential wrapper that never leaks into logs.
pub mod credential;
/// Transaction and receipt types for blockchain interactions.
pub mod delivery;
/// Decoded event records extracted from receipts.
pub mod events;
/// Hex and identifier formatting helpers.
pub mod formatting;
/// Fixed-point conversions between decimals and on-chain integers.
pub mod units;

pub use contracts::ContractKind;
pub use credential::Credential;
pub use delivery::{GasPricePolicy, Transaction, TransactionReceipt};
pub use events::{EventParam, EventRecord};
pub use formatting::{short_hash, with_0x_prefix};
pub use units::{
	decimal_from_f64, from_fixed_point, to_fixed_point, ConversionError, CURRENCY_DECIMALS,
	DISTANCE_DECIMALS, LUMINOSITY_DECIMALS,
};
