//! Signing credential wrapper.
//!
//! The private key is the only secret the client handles. It is held in
//! zeroizing memory and every formatting path redacts it.

use serde::{Deserialize, Deserializer};
use std::fmt;
use zeroize::Zeroizing;

const REDACTED: &str = "***REDACTED***";

/// A private signing credential.
///
/// `Debug` and `Display` never show any part of the value. The credential
/// is not `Serialize`.
#[derive(Clone)]
pub struct Credential(Zeroizing<String>);

impl Credential {
	/// Wraps a raw credential string, trimming surrounding whitespace.
	pub fn new(raw: impl Into<String>) -> Self {
		let raw = raw.into();
		let trimmed = raw.trim();
		if trimmed.len() == raw.len() {
			Self(Zeroizing::new(raw))
		} else {
			Self(Zeroizing::new(trimmed.to_string()))
		}
	}

	/// Exposes the credential to a closure.
	///
	/// The exposed value must not be logged or stored.
	pub fn with_exposed<F, R>(&self, f: F) -> R
	where
		F: FnOnce(&str) -> R,
	{
		f(&self.0)
	}

	/// Returns true if the credential is empty.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Redacted rendering used in logs and error messages.
	pub fn masked(&self) -> &'static str {
		REDACTED
	}
}

impl fmt::Debug for Credential {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Credential({})", self.masked())
	}
}

impl fmt::Display for Credential {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.masked())
	}
}

impl From<String> for Credential {
	fn from(s: String) -> Self {
		Self::new(s)
	}
}

impl From<&str> for Credential {
	fn from(s: &str) -> Self {
		Self::new(s)
	}
}

impl PartialEq for Credential {
	fn eq(&self, other: &Self) -> bool {
		self.0.as_str() == other.0.as_str()
	}
}

impl Eq for Credential {}

impl<'de> Deserialize<'de> for Credential {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		let s = String::deserialize(deserializer)?;
		Ok(Credential::new(s))
	}
}
