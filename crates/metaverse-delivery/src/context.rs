//! Signing account context.

use crate::{Connector, DeliveryError, DeliveryInterface};
use alloy::primitives::{Address, U256};
use metaverse_account::LocalAccount;
use metaverse_types::Credential;
use std::fmt;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};
use tracing::instrument;

/// A connected signing account.
///
/// Created once at initialization. The gas price and native balance are
/// snapshots taken at creation; the context never refreshes them.
pub struct AccountContext {
	address: Address,
	delivery: Arc<dyn DeliveryInterface>,
	gas_price: u128,
	native_balance: U256,
	/// Serializes estimate + submit so one nonce sequence is consumed in order.
	submission_lock: Mutex<()>,
}

impl AccountContext {
	/// Derives the signer from `credential`, connects it and snapshots the
	/// network gas price and the account's native balance.
	///
	/// Fails with a configuration error before connecting if the credential
	/// is empty.
	#[instrument(skip_all)]
	pub async fn initialize(
		credential: &Credential,
		connector: &dyn Connector,
	) -> Result<Self, DeliveryError> {
		let account = LocalAccount::from_credential(credential)?;
		let delivery = connector.connect(&account).await?;

		if delivery.address() != account.address() {
			return Err(DeliveryError::Configuration(format!(
				"Connected signer {} does not match derived address {}",
				delivery.address(),
				account.address()
			)));
		}

		let gas_price = delivery.get_gas_price().await?;
		let native_balance = delivery.get_balance(account.address()).await?;

		tracing::info!(
			address = %account.address(),
			gas_price,
			native_balance = %native_balance,
			"Initialized account context"
		);

		Ok(Self {
			address: account.address(),
			delivery,
			gas_price,
			native_balance,
			submission_lock: Mutex::new(()),
		})
	}

	/// Address derived from the credential.
	pub fn address(&self) -> Address {
		self.address
	}

	/// Gas price observed at creation, in wei.
	pub fn gas_price(&self) -> u128 {
		self.gas_price
	}

	/// Native balance observed at creation, in wei.
	pub fn native_balance(&self) -> U256 {
		self.native_balance
	}

	pub fn delivery(&self) -> &Arc<dyn DeliveryInterface> {
		&self.delivery
	}

	pub(crate) async fn lock_submissions(&self) -> MutexGuard<'_, ()> {
		self.submission_lock.lock().await
	}
}

impl fmt::Debug for AccountContext {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("AccountContext")
			.field("address", &self.address)
			.field("gas_price", &self.gas_price)
			.field("native_balance", &self.native_balance)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::implementations::mock::{MockConnector, MockDelivery};
	use metaverse_account::AccountError;

	const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

	fn dev_account() -> LocalAccount {
		LocalAccount::from_credential(&Credential::from(DEV_KEY)).unwrap()
	}

	#[tokio::test]
	async fn test_initialize_snapshots_network_state() {
		let mock = Arc::new(
			MockDelivery::new(dev_account().address())
				.with_gas_price(42_000_000_000)
				.with_balance(U256::from(7u64)),
		);
		let connector = MockConnector::new();
		connector.register(mock.clone());

		let context = AccountContext::initialize(&Credential::from(DEV_KEY), &connector)
			.await
			.unwrap();

		assert_eq!(context.address(), dev_account().address());
		assert_eq!(context.gas_price(), 42_000_000_000);
		assert_eq!(context.native_balance(), U256::from(7u64));
		assert_eq!(mock.network_calls(), 2);
		assert_eq!(connector.connections(), 1);
	}

	#[tokio::test]
	async fn test_empty_credential_never_connects() {
		let connector = MockConnector::new();
		let err = AccountContext::initialize(&Credential::from(""), &connector)
			.await
			.unwrap_err();

		assert!(matches!(err, DeliveryError::Configuration(_)));
		assert_eq!(connector.connections(), 0);
	}

	#[tokio::test]
	async fn test_non_ascii_credential_is_account_error() {
		let connector = MockConnector::new();
		let err = AccountContext::initialize(&Credential::from("€€€€€€"), &connector)
			.await
			.unwrap_err();

		assert!(matches!(err, DeliveryError::Account(AccountError::InvalidKey(_))));
		assert_eq!(connector.connections(), 0);
	}

	#[tokio::test]
	async fn test_debug_hides_delivery() {
		let mock = Arc::new(MockDelivery::new(dev_account().address()));
		let connector = MockConnector::new();
		connector.register(mock);

		let context = AccountContext::initialize(&Credential::from(DEV_KEY), &connector)
			.await
			.unwrap();
		let rendered = format!("{:?}", context);
		assert!(rendered.contains("AccountContext"));
		assert!(!rendered.contains(&DEV_KEY[2..]));
	}
}
