//! Configuration module for the metaverse client.
//!
//! This module provides the configuration structure handed to the client at
//! initialization. Configuration is loaded from TOML, with `${VAR}` and
//! `${VAR:-default}` placeholders resolved from the process environment
//! before parsing, and is validated eagerly so that a missing endpoint,
//! credential or contract address is reported before any network call.

mod env;

use alloy::primitives::Address;
use metaverse_types::{ContractKind, Credential};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

pub use env::resolve_env_vars;
pub use metaverse_types::GasPricePolicy;

/// Public endpoint used when the transport kind is not recognized.
pub const DEFAULT_PUBLIC_RPC_URL: &str = "https://cloudflare-eth.com";

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error that occurs during file I/O operations.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	/// Error that occurs when parsing TOML configuration.
	#[error("Configuration error: {0}")]
	Parse(String),
	/// Error that occurs when configuration validation fails.
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// Extract just the message without the huge input dump
		ConfigError::Parse(err.message().to_string())
	}
}

/// Main configuration structure for the metaverse client.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	/// Network transport and confirmation settings.
	pub network: NetworkConfig,
	/// Operator account settings.
	pub account: AccountConfig,
	/// Gas budgeting settings.
	#[serde(default)]
	pub gas: GasConfig,
	/// Addresses and interface descriptions of the target contracts.
	#[serde(default)]
	pub contracts: ContractsConfig,
	/// Event names used to decode operation results.
	#[serde(default)]
	pub events: EventsConfig,
}

/// Network transport and confirmation settings.
#[derive(Debug, Clone, Deserialize)]
pub struct NetworkConfig {
	/// Transport kind: `rpc`, `alchemy`, or anything else for the default
	/// public endpoint.
	#[serde(default = "default_transport")]
	pub transport: String,
	/// JSON-RPC endpoint for the `rpc` transport.
	#[serde(default)]
	pub rpc_url: String,
	/// Alchemy network slug, e.g. `polygon-mumbai`.
	#[serde(default = "default_alchemy_network")]
	pub alchemy_network: String,
	/// Alchemy API key.
	pub alchemy_api_key: Option<Credential>,
	/// Chain id pinned on the signer. Fetched from the node when absent.
	pub chain_id: Option<u64>,
	/// Interval between receipt polls in milliseconds.
	#[serde(default = "default_poll_interval_ms")]
	pub poll_interval_ms: u64,
	/// Confirmations required before a receipt is accepted.
	#[serde(default = "default_confirmations")]
	pub confirmations: u64,
	/// Upper bound on confirmation waiting in seconds.
	#[serde(default = "default_confirmation_timeout_seconds")]
	pub confirmation_timeout_seconds: u64,
}

fn default_transport() -> String {
	"rpc".to_string()
}

fn default_alchemy_network() -> String {
	"polygon-mumbai".to_string()
}

fn default_poll_interval_ms() -> u64 {
	7_000
}

fn default_confirmations() -> u64 {
	1
}

fn default_confirmation_timeout_seconds() -> u64 {
	600
}

/// Network transport selected by [`NetworkConfig::transport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportKind {
	/// Generic JSON-RPC endpoint.
	Rpc { url: String },
	/// Alchemy managed provider.
	Alchemy {
		network: String,
		api_key: Credential,
	},
	/// Default public endpoint.
	Default,
}

impl TransportKind {
	/// Full endpoint URL. May embed an API key and must not be logged.
	pub fn endpoint_url(&self) -> String {
		match self {
			TransportKind::Rpc { url } => url.clone(),
			TransportKind::Alchemy { network, api_key } => api_key
				.with_exposed(|key| format!("https://{}.g.alchemy.com/v2/{}", network, key)),
			TransportKind::Default => DEFAULT_PUBLIC_RPC_URL.to_string(),
		}
	}

	/// Log-safe description of the transport.
	pub fn describe(&self) -> String {
		match self {
			TransportKind::Rpc { url } => format!("rpc:{}", url),
			TransportKind::Alchemy { network, .. } => format!("alchemy:{}", network),
			TransportKind::Default => format!("default:{}", DEFAULT_PUBLIC_RPC_URL),
		}
	}
}

impl NetworkConfig {
	/// Resolves the configured transport kind.
	pub fn transport_kind(&self) -> TransportKind {
		match self.transport.as_str() {
			"rpc" => TransportKind::Rpc {
				url: self.rpc_url.clone(),
			},
			"alchemy" => TransportKind::Alchemy {
				network: self.alchemy_network.clone(),
				api_key: self
					.alchemy_api_key
					.clone()
					.unwrap_or_else(|| Credential::from("")),
			},
			_ => TransportKind::Default,
		}
	}
}

/// Operator account settings.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountConfig {
	/// Private key of the operator signer.
	pub private_key: Option<Credential>,
	/// Operator address, receiver of minted stars.
	#[serde(default)]
	pub operator_address: String,
}

impl AccountConfig {
	/// Parsed operator address.
	pub fn operator(&self) -> Result<Address, ConfigError> {
		parse_address("account.operator_address", &self.operator_address)
	}
}

/// Gas budgeting settings.
#[derive(Debug, Clone, Deserialize)]
pub struct GasConfig {
	/// Budget used when estimation fails.
	#[serde(default = "default_gas_limit")]
	pub default_limit: u64,
	/// Multiplier applied to a successful estimate.
	#[serde(default = "default_estimate_multiplier")]
	pub estimate_multiplier: u64,
	/// Gas price policy.
	#[serde(default)]
	pub price_policy: GasPricePolicy,
}

fn default_gas_limit() -> u64 {
	5_000_000
}

fn default_estimate_multiplier() -> u64 {
	2
}

impl Default for GasConfig {
	fn default() -> Self {
		Self {
			default_limit: default_gas_limit(),
			estimate_multiplier: default_estimate_multiplier(),
			price_policy: GasPricePolicy::default(),
		}
	}
}

/// Address and interface description of one contract.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContractConfig {
	/// Deployed address.
	#[serde(default)]
	pub address: String,
	/// Path to the compiled artifact or bare ABI JSON.
	#[serde(default)]
	pub abi: PathBuf,
}

/// The four target contracts.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContractsConfig {
	#[serde(default)]
	pub slw: ContractConfig,
	#[serde(default)]
	pub star: ContractConfig,
	#[serde(default)]
	pub ship: ContractConfig,
	#[serde(default)]
	pub metaverse: ContractConfig,
}

impl ContractsConfig {
	/// Settings of one contract.
	pub fn get(&self, kind: ContractKind) -> &ContractConfig {
		match kind {
			ContractKind::Slw => &self.slw,
			ContractKind::Star => &self.star,
			ContractKind::Ship => &self.ship,
			ContractKind::Metaverse => &self.metaverse,
		}
	}

	/// Parsed address of one contract.
	pub fn address(&self, kind: ContractKind) -> Result<Address, ConfigError> {
		let field = format!("contracts.{}.address", kind.config_key());
		parse_address(&field, &self.get(kind).address)
	}

	/// Makes relative ABI paths relative to `base_dir`.
	fn resolve_paths(&mut self, base_dir: &Path) {
		for contract in [
			&mut self.slw,
			&mut self.star,
			&mut self.ship,
			&mut self.metaverse,
		] {
			if contract.abi.is_relative() && !contract.abi.as_os_str().is_empty() {
				contract.abi = base_dir.join(&contract.abi);
			}
		}
	}
}

/// Event names looked up when decoding operation results.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EventsConfig {
	/// ERC-721 mint event on the Star and Ship contracts.
	pub mint: String,
	/// Harvest breakdown event on the metaverse contract.
	pub harvest: String,
	/// Departure event carrying the arrival time.
	pub ship_sent: String,
	/// Prize event emitted when an attack is won.
	pub attack_prize: String,
}

impl Default for EventsConfig {
	fn default() -> Self {
		Self {
			mint: "Transfer".to_string(),
			harvest: "SlwHarvested".to_string(),
			ship_sent: "ShipSent".to_string(),
			attack_prize: "PrizeAwarded".to_string(),
		}
	}
}

fn parse_address(field: &str, value: &str) -> Result<Address, ConfigError> {
	if value.trim().is_empty() {
		return Err(ConfigError::Validation(format!("Missing {} setting", field)));
	}
	value
		.trim()
		.parse()
		.map_err(|e| ConfigError::Validation(format!("Invalid {} '{}': {}", field, value, e)))
}

impl Config {
	/// Loads configuration from a file, resolving environment variables and
	/// making ABI paths relative to the file's directory.
	pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		let content = tokio::fs::read_to_string(path).await?;
		let mut config: Config = content.parse()?;

		let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
		config.contracts.resolve_paths(base_dir);
		Ok(config)
	}

	/// Validates the configuration to ensure all required fields are properly set.
	///
	/// Checks, in order: the endpoint for the selected transport, the signing
	/// credential, the operator address, the four contract addresses and ABI
	/// paths, then gas and confirmation bounds.
	pub fn validate(&self) -> Result<(), ConfigError> {
		match self.network.transport_kind() {
			TransportKind::Rpc { url } => {
				if url.trim().is_empty() {
					return Err(ConfigError::Validation("Missing RPC URL setting".into()));
				}
				if !url.starts_with("http://") && !url.starts_with("https://") {
					return Err(ConfigError::Validation(
						"RPC URL must start with http:// or https://".into(),
					));
				}
			}
			TransportKind::Alchemy { api_key, .. } => {
				if api_key.is_empty() {
					return Err(ConfigError::Validation(
						"Missing Alchemy API key setting".into(),
					));
				}
			}
			TransportKind::Default => {}
		}

		match &self.account.private_key {
			Some(key) if !key.is_empty() => {}
			_ => {
				return Err(ConfigError::Validation(
					"Missing wallet private key setting".into(),
				))
			}
		}

		self.account.operator()?;

		for kind in ContractKind::ALL {
			self.contracts.address(kind)?;
			if self.contracts.get(kind).abi.as_os_str().is_empty() {
				return Err(ConfigError::Validation(format!(
					"Missing contracts.{}.abi setting",
					kind.config_key()
				)));
			}
		}

		if self.gas.default_limit == 0 {
			return Err(ConfigError::Validation(
				"gas.default_limit must be greater than 0".into(),
			));
		}
		if self.gas.estimate_multiplier == 0 {
			return Err(ConfigError::Validation(
				"gas.estimate_multiplier must be at least 1".into(),
			));
		}
		if self.network.confirmations == 0 {
			return Err(ConfigError::Validation(
				"network.confirmations must be at least 1".into(),
			));
		}
		if self.network.poll_interval_ms == 0 {
			return Err(ConfigError::Validation(
				"network.poll_interval_ms must be greater than 0".into(),
			));
		}
		if self.network.confirmation_timeout_seconds == 0 {
			return Err(ConfigError::Validation(
				"network.confirmation_timeout_seconds must be greater than 0".into(),
			));
		}

		Ok(())
	}

	/// Signing credential. Only meaningful after [`Config::validate`].
	pub fn credential(&self) -> Result<&Credential, ConfigError> {
		self.account
			.private_key
			.as_ref()
			.filter(|key| !key.is_empty())
			.ok_or_else(|| ConfigError::Validation("Missing wallet private key setting".into()))
	}
}

/// Parses configuration from TOML. Environment variables are resolved and
/// the configuration is validated after parsing.
impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let resolved = resolve_env_vars(s)?;
		let config: Config = toml::from_str(&resolved)?;
		config.validate()?;
		Ok(config)
	}
}
