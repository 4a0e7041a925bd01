//! Account management module for the metaverse client.
//!
//! Turns a private credential into a local signer and its derived address.
//! Network-facing account state (gas price baseline, native balance) lives
//! in the delivery crate's `AccountContext`.

use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use metaverse_types::{with_0x_prefix, Credential};
use thiserror::Error;

/// Errors that can occur during account operations.
#[derive(Debug, Error)]
pub enum AccountError {
	/// The credential is absent or empty.
	#[error("Private key missing from configuration")]
	MissingCredential,
	/// Error that occurs when a cryptographic key is invalid or malformed.
	#[error("Invalid key: {0}")]
	InvalidKey(String),
}

/// Local account backed by an in-memory private key.
#[derive(Clone)]
pub struct LocalAccount {
	signer: PrivateKeySigner,
}

impl LocalAccount {
	/// Parses a hex private key, with or without `0x` prefix.
	pub fn from_credential(credential: &Credential) -> Result<Self, AccountError> {
		if credential.is_empty() {
			return Err(AccountError::MissingCredential);
		}

		let signer = credential.with_exposed(|key| {
			key.parse::<PrivateKeySigner>().map_err(|_| {
				AccountError::InvalidKey(format!("Malformed private key {}", credential.masked()))
			})
		})?;

		tracing::debug!(address = %signer.address(), "Loaded local account");
		Ok(Self { signer })
	}

	/// Generates a fresh random account and returns it with its credential.
	pub fn generate() -> (Self, Credential) {
		let signer = PrivateKeySigner::random();
		let credential = Credential::new(with_0x_prefix(&hex::encode(signer.to_bytes())));
		(Self { signer }, credential)
	}

	/// Address derived from the private key.
	pub fn address(&self) -> Address {
		self.signer.address()
	}

	/// Signer for transaction signing.
	pub fn signer(&self) -> &PrivateKeySigner {
		&self.signer
	}
}

impl std::fmt::Debug for LocalAccount {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("LocalAccount")
			.field("address", &self.address())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	// Well-known development key (anvil/hardhat account #0).
	const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
	const DEV_ADDRESS: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

	#[test]
	fn test_address_derivation() {
		let account = LocalAccount::from_credential(&Credential::from(DEV_KEY)).unwrap();
		assert_eq!(account.address(), DEV_ADDRESS.parse::<Address>().unwrap());

		let unprefixed = LocalAccount::from_credential(&Credential::from(&DEV_KEY[2..])).unwrap();
		assert_eq!(unprefixed.address(), account.address());
	}

	#[test]
	fn test_empty_credential_rejected() {
		let result = LocalAccount::from_credential(&Credential::from(""));
		assert!(matches!(result, Err(AccountError::MissingCredential)));
	}

	#[test]
	fn test_malformed_credential_rejected() {
		let result = LocalAccount::from_credential(&Credential::from("0xnot-a-key"));
		match result {
			Err(AccountError::InvalidKey(message)) => assert!(!message.contains("not-a-key")),
			other => panic!("expected invalid key, got {:?}", other),
		}
	}

	#[test]
	fn test_non_ascii_credential_rejected() {
		let result = LocalAccount::from_credential(&Credential::from("€€€€€€"));
		assert!(matches!(result, Err(AccountError::InvalidKey(_))));
	}

	#[test]
	fn test_generated_credential_round_trips() {
		let (account, credential) = LocalAccount::generate();
		let reloaded = LocalAccount::from_credential(&credential).unwrap();
		assert_eq!(reloaded.address(), account.address());
	}
}
