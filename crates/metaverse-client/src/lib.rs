//! Domain operation client for the metaverse contracts.
//!
//! This module exposes the named operations an operator backend drives:
//! minting stars and ships, moving ships, harvesting and managing SLW,
//! updating luminosity, claiming stars and resolving attacks. Each operation
//! encodes its arguments, runs it through the delivery service and decodes
//! a typed result from the receipt's events.

use alloy::primitives::Address;
use async_trait::async_trait;
use metaverse_config::ConfigError;
use metaverse_delivery::DeliveryError;
use metaverse_types::{ConversionError, Credential};
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

mod client;
mod simulated;

pub use client::{ContractSet, MetaverseClient};
pub use simulated::{SimulatedTravel, SIMULATED_ARRIVAL_TIME};

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum ClientError {
	/// A required setting is missing or malformed.
	#[error("Configuration error: {0}")]
	Configuration(String),
	/// Submission, confirmation or transport failure.
	#[error(transparent)]
	Delivery(#[from] DeliveryError),
	/// An amount could not be converted to or from fixed-point.
	#[error("Conversion error: {0}")]
	Conversion(#[from] ConversionError),
	/// A decoded event lacks an expected argument or value.
	#[error("Decode error: {0}")]
	Decode(String),
}

impl From<ConfigError> for ClientError {
	fn from(err: ConfigError) -> Self {
		ClientError::Configuration(err.to_string())
	}
}

impl ClientError {
	/// Returns true for transient transport failures.
	///
	/// Nothing in the client retries; this is a hint for callers that run
	/// their own retry policy. A timed out transaction may still be mined.
	pub fn is_retryable(&self) -> bool {
		matches!(
			self,
			ClientError::Delivery(DeliveryError::Network(_))
				| ClientError::Delivery(DeliveryError::Timeout { .. })
		)
	}
}

/// SLW harvest breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HarvestResult {
	pub ship_id: u64,
	/// Amount credited to the ship owner.
	pub amount_ship: Decimal,
	/// Owner of the star the ship orbits.
	pub star_owner: Address,
	/// Amount credited to the star owner.
	pub tax_amount: Decimal,
}

/// Result of an attack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttackOutcome {
	pub success: bool,
	/// SLW prize, present only when the attack was won.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub amount: Option<Decimal>,
}

impl AttackOutcome {
	pub fn won(amount: Decimal) -> Self {
		Self {
			success: true,
			amount: Some(amount),
		}
	}

	pub fn lost() -> Self {
		Self {
			success: false,
			amount: None,
		}
	}
}

/// Operations available to the operator backend.
#[async_trait]
pub trait MetaverseOperations: Send + Sync {
	/// Mints a star to the operator address and returns its token id.
	async fn mint_star(&self, uri: &str) -> Result<u64, ClientError>;

	/// Mints a ship to `recipient` and returns its token id.
	async fn mint_ship(&self, uri: &str, recipient: Address) -> Result<u64, ClientError>;

	/// Puts a ship in orbit around a star.
	async fn enter_orbit(&self, ship_id: u64, star_id: u64) -> Result<(), ClientError>;

	/// Harvests the SLW accrued by a ship.
	async fn harvest(&self, ship_id: u64) -> Result<HarvestResult, ClientError>;

	/// SLW balance of an address.
	async fn get_slw_balance(&self, address: Address) -> Result<Decimal, ClientError>;

	async fn mint_slw(&self, address: Address, amount: Decimal) -> Result<(), ClientError>;

	async fn burn_slw(&self, address: Address, amount: Decimal) -> Result<(), ClientError>;

	async fn set_star_luminosity(&self, star_id: u64, luminosity: f64)
		-> Result<(), ClientError>;

	/// Grants the SLW minter role to `metaverse_address`.
	async fn set_minter_role(&self, metaverse_address: Address) -> Result<(), ClientError>;

	/// Sends a ship towards a star and returns the arrival timestamp.
	///
	/// `fast_forward` selects the `sendShipFfwd` variant.
	async fn send_ship(
		&self,
		ship_id: u64,
		star_id: u64,
		distance: Decimal,
		fuel: u64,
		fast_forward: bool,
	) -> Result<u64, ClientError>;

	/// Transfers a star to `new_owner`.
	///
	/// The approval is signed with `owner_credential` when given, otherwise
	/// with the operator signer. The claim itself is always signed by the
	/// operator.
	async fn claim_star(
		&self,
		star_id: u64,
		new_owner: Address,
		owner_credential: Option<&Credential>,
	) -> Result<(), ClientError>;

	/// Resolves an attack between two ships.
	async fn attack_ship(
		&self,
		attacker_id: u64,
		target_id: u64,
		power: u64,
	) -> Result<AttackOutcome, ClientError>;
}
