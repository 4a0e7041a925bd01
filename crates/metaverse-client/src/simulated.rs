//! Travel simulation for development backends.

use crate::{AttackOutcome, ClientError, HarvestResult, MetaverseOperations};
use alloy::primitives::Address;
use async_trait::async_trait;
use metaverse_types::Credential;
use rust_decimal::Decimal;

/// Arrival time reported by [`SimulatedTravel::send_ship`].
pub const SIMULATED_ARRIVAL_TIME: u64 = 60;

/// Wraps a client so that ship travel never touches the chain.
///
/// `send_ship` answers with a fixed arrival of [`SIMULATED_ARRIVAL_TIME`]
/// and `enter_orbit` does nothing. Every other operation is delegated.
pub struct SimulatedTravel<C> {
	inner: C,
}

impl<C: MetaverseOperations> SimulatedTravel<C> {
	pub fn new(inner: C) -> Self {
		Self { inner }
	}

	pub fn inner(&self) -> &C {
		&self.inner
	}
}

#[async_trait]
impl<C: MetaverseOperations> MetaverseOperations for SimulatedTravel<C> {
	async fn mint_star(&self, uri: &str) -> Result<u64, ClientError> {
		self.inner.mint_star(uri).await
	}

	async fn mint_ship(&self, uri: &str, recipient: Address) -> Result<u64, ClientError> {
		self.inner.mint_ship(uri, recipient).await
	}

	async fn enter_orbit(&self, ship_id: u64, star_id: u64) -> Result<(), ClientError> {
		tracing::debug!(ship_id, star_id, "Simulated orbit entry");
		Ok(())
	}

	async fn harvest(&self, ship_id: u64) -> Result<HarvestResult, ClientError> {
		self.inner.harvest(ship_id).await
	}

	async fn get_slw_balance(&self, address: Address) -> Result<Decimal, ClientError> {
		self.inner.get_slw_balance(address).await
	}

	async fn mint_slw(&self, address: Address, amount: Decimal) -> Result<(), ClientError> {
		self.inner.mint_slw(address, amount).await
	}

	async fn burn_slw(&self, address: Address, amount: Decimal) -> Result<(), ClientError> {
		self.inner.burn_slw(address, amount).await
	}

	async fn set_star_luminosity(
		&self,
		star_id: u64,
		luminosity: f64,
	) -> Result<(), ClientError> {
		self.inner.set_star_luminosity(star_id, luminosity).await
	}

	async fn set_minter_role(&self, metaverse_address: Address) -> Result<(), ClientError> {
		self.inner.set_minter_role(metaverse_address).await
	}

	async fn send_ship(
		&self,
		ship_id: u64,
		star_id: u64,
		_distance: Decimal,
		_fuel: u64,
		_fast_forward: bool,
	) -> Result<u64, ClientError> {
		tracing::debug!(ship_id, star_id, "Simulated ship dispatch");
		Ok(SIMULATED_ARRIVAL_TIME)
	}

	async fn claim_star(
		&self,
		star_id: u64,
		new_owner: Address,
		owner_credential: Option<&Credential>,
	) -> Result<(), ClientError> {
		self.inner
			.claim_star(star_id, new_owner, owner_credential)
			.await
	}

	async fn attack_ship(
		&self,
		attacker_id: u64,
		target_id: u64,
		power: u64,
	) -> Result<AttackOutcome, ClientError> {
		self.inner.attack_ship(attacker_id, target_id, power).await
	}
}
