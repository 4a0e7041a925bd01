//! Chain-backed implementation of [`MetaverseOperations`].

use crate::{AttackOutcome, ClientError, HarvestResult, MetaverseOperations};
use alloy::dyn_abi::DynSolValue;
use alloy::primitives::{Address, U256};
use async_trait::async_trait;
use metaverse_config::{Config, ContractsConfig, TransportKind};
use metaverse_delivery::implementations::evm::alloy::AlloyConnector;
use metaverse_delivery::{
	AccountContext, Connector, ContractInterface, DecodedReceipt, DeliveryService,
	DeliverySettings, OperationRequest,
};
use metaverse_types::{
	decimal_from_f64, from_fixed_point, to_fixed_point, ContractKind, Credential, EventRecord,
	CURRENCY_DECIMALS, DISTANCE_DECIMALS, LUMINOSITY_DECIMALS,
};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;

/// Interfaces of the four target contracts.
#[derive(Debug, Clone)]
pub struct ContractSet {
	pub slw: ContractInterface,
	pub star: ContractInterface,
	pub ship: ContractInterface,
	pub metaverse: ContractInterface,
}

impl ContractSet {
	/// Loads every configured ABI.
	pub async fn load(contracts: &ContractsConfig) -> Result<Self, ClientError> {
		let load = |kind: ContractKind| async move {
			let address = contracts.address(kind)?;
			let interface =
				ContractInterface::load(kind.to_string(), address, &contracts.get(kind).abi).await?;
			Ok::<_, ClientError>(interface)
		};

		let (slw, star, ship, metaverse) = tokio::try_join!(
			load(ContractKind::Slw),
			load(ContractKind::Star),
			load(ContractKind::Ship),
			load(ContractKind::Metaverse),
		)?;

		Ok(Self {
			slw,
			star,
			ship,
			metaverse,
		})
	}

	pub fn get(&self, kind: ContractKind) -> &ContractInterface {
		match kind {
			ContractKind::Slw => &self.slw,
			ContractKind::Star => &self.star,
			ContractKind::Ship => &self.ship,
			ContractKind::Metaverse => &self.metaverse,
		}
	}

	fn all(&self) -> [&ContractInterface; 4] {
		[&self.slw, &self.star, &self.ship, &self.metaverse]
	}
}

/// Client bound to one operator account.
pub struct MetaverseClient {
	config: Config,
	contracts: ContractSet,
	context: AccountContext,
	connector: Arc<dyn Connector>,
	service: DeliveryService,
	operator: Address,
}

impl MetaverseClient {
	/// Connects over the transport selected in `config`.
	pub async fn connect(config: Config) -> Result<Self, ClientError> {
		config.validate()?;
		let transport = config.network.transport_kind();
		if transport == TransportKind::Default {
			tracing::warn!(
				transport = %config.network.transport,
				"Unknown transport kind, using default endpoint"
			);
		}
		tracing::info!(transport = %transport.describe(), "Connecting to network");

		let connector = AlloyConnector::new(
			transport.endpoint_url(),
			config.network.chain_id,
			Duration::from_millis(config.network.poll_interval_ms),
		);
		let contracts = ContractSet::load(&config.contracts).await?;
		Self::build(config, contracts, Arc::new(connector)).await
	}

	/// Validates `config`, loads the contract ABIs and initializes the
	/// operator account through `connector`.
	pub async fn initialize(
		config: Config,
		connector: Arc<dyn Connector>,
	) -> Result<Self, ClientError> {
		config.validate()?;
		let contracts = ContractSet::load(&config.contracts).await?;
		Self::build(config, contracts, connector).await
	}

	/// Like [`initialize`](Self::initialize) with already loaded interfaces.
	///
	/// Configuration is validated before any network call.
	pub async fn with_interfaces(
		config: Config,
		contracts: ContractSet,
		connector: Arc<dyn Connector>,
	) -> Result<Self, ClientError> {
		config.validate()?;
		Self::build(config, contracts, connector).await
	}

	/// Assembles the client from a validated configuration.
	async fn build(
		config: Config,
		contracts: ContractSet,
		connector: Arc<dyn Connector>,
	) -> Result<Self, ClientError> {
		let operator = config.account.operator()?;
		for kind in ContractKind::ALL {
			let configured = config.contracts.address(kind)?;
			if contracts.get(kind).address() != configured {
				return Err(ClientError::Configuration(format!(
					"{} interface address {} does not match configured {}",
					kind,
					contracts.get(kind).address(),
					configured
				)));
			}
		}

		let context = AccountContext::initialize(config.credential()?, connector.as_ref()).await?;
		let service = DeliveryService::new(delivery_settings(&config));

		Ok(Self {
			config,
			contracts,
			context,
			connector,
			service,
			operator,
		})
	}

	/// Address of the operator signer.
	pub fn address(&self) -> Address {
		self.context.address()
	}

	/// Receiver of minted stars.
	pub fn operator(&self) -> Address {
		self.operator
	}

	pub fn context(&self) -> &AccountContext {
		&self.context
	}

	pub fn contracts(&self) -> &ContractSet {
		&self.contracts
	}

	async fn execute(
		&self,
		context: &AccountContext,
		contract: &ContractInterface,
		method: &str,
		args: Vec<DynSolValue>,
	) -> Result<DecodedReceipt, ClientError> {
		let request = OperationRequest::new(contract, method, args);
		Ok(self
			.service
			.execute(context, request, &self.contracts.all())
			.await?)
	}

	async fn mint(
		&self,
		contract: &ContractInterface,
		uri: &str,
		recipient: Address,
	) -> Result<u64, ClientError> {
		tracing::info!(
			contract = %contract.name(),
			recipient = %recipient,
			uri,
			"Minting token"
		);
		let receipt = self
			.execute(
				&self.context,
				contract,
				"safeMint",
				vec![
					DynSolValue::Address(recipient),
					DynSolValue::String(uri.to_string()),
				],
			)
			.await?;

		// ERC-721 Transfer(from, to, tokenId)
		let transfer = receipt.require_event(contract, &self.config.events.mint)?;
		let token_id = transfer
			.arg_at(2)
			.and_then(|value| value.as_uint())
			.map(|(value, _)| value)
			.ok_or_else(|| missing_arg(transfer, "tokenId"))?;
		to_u64(token_id, "token id")
	}
}

fn delivery_settings(config: &Config) -> DeliverySettings {
	DeliverySettings {
		default_gas_limit: config.gas.default_limit,
		estimate_multiplier: config.gas.estimate_multiplier,
		price_policy: config.gas.price_policy,
		confirmations: config.network.confirmations,
		poll_interval: Duration::from_millis(config.network.poll_interval_ms),
		confirmation_timeout: Duration::from_secs(config.network.confirmation_timeout_seconds),
	}
}

fn uint(value: u64) -> DynSolValue {
	DynSolValue::Uint(U256::from(value), 256)
}

fn fixed(value: U256) -> DynSolValue {
	DynSolValue::Uint(value, 256)
}

fn missing_arg(record: &EventRecord, name: &str) -> ClientError {
	ClientError::Decode(format!(
		"Event {} has no argument {}",
		record.name.as_deref().unwrap_or("<unknown>"),
		name
	))
}

fn uint_arg(record: &EventRecord, name: &str) -> Result<U256, ClientError> {
	record.uint_arg(name).ok_or_else(|| missing_arg(record, name))
}

fn to_u64(value: U256, what: &str) -> Result<u64, ClientError> {
	u64::try_from(value)
		.map_err(|_| ClientError::Decode(format!("{} {} does not fit in 64 bits", what, value)))
}

#[async_trait]
impl MetaverseOperations for MetaverseClient {
	#[instrument(skip_all)]
	async fn mint_star(&self, uri: &str) -> Result<u64, ClientError> {
		self.mint(&self.contracts.star, uri, self.operator).await
	}

	#[instrument(skip_all)]
	async fn mint_ship(&self, uri: &str, recipient: Address) -> Result<u64, ClientError> {
		self.mint(&self.contracts.ship, uri, recipient).await
	}

	#[instrument(skip_all, fields(ship_id = ship_id, star_id = star_id))]
	async fn enter_orbit(&self, ship_id: u64, star_id: u64) -> Result<(), ClientError> {
		self.execute(
			&self.context,
			&self.contracts.metaverse,
			"enterOrbit",
			vec![uint(ship_id), uint(star_id)],
		)
		.await?;
		Ok(())
	}

	#[instrument(skip_all, fields(ship_id = ship_id))]
	async fn harvest(&self, ship_id: u64) -> Result<HarvestResult, ClientError> {
		let metaverse = &self.contracts.metaverse;
		// The contract takes the ship id twice
		let receipt = self
			.execute(
				&self.context,
				metaverse,
				"harvestSlw",
				vec![uint(ship_id), uint(ship_id)],
			)
			.await?;

		let event = receipt.require_event(metaverse, &self.config.events.harvest)?;
		let result = HarvestResult {
			ship_id: to_u64(uint_arg(event, "_ship")?, "ship id")?,
			amount_ship: from_fixed_point(uint_arg(event, "_amountShip")?, CURRENCY_DECIMALS)?,
			star_owner: event
				.address_arg("_starOwner")
				.ok_or_else(|| missing_arg(event, "_starOwner"))?,
			tax_amount: from_fixed_point(uint_arg(event, "_amountTax")?, CURRENCY_DECIMALS)?,
		};

		tracing::info!(
			amount_ship = %result.amount_ship,
			star_owner = %result.star_owner,
			tax_amount = %result.tax_amount,
			"SLW harvested"
		);
		Ok(result)
	}

	#[instrument(skip_all, fields(address = %address))]
	async fn get_slw_balance(&self, address: Address) -> Result<Decimal, ClientError> {
		let request = OperationRequest::new(
			&self.contracts.slw,
			"balanceOf",
			vec![DynSolValue::Address(address)],
		);
		let output = self.service.query(&self.context, request).await?;

		let raw = output
			.first()
			.and_then(|value| value.as_uint())
			.map(|(value, _)| value)
			.ok_or_else(|| ClientError::Decode("balanceOf returned no uint256".to_string()))?;
		let balance = from_fixed_point(raw, CURRENCY_DECIMALS)?;
		tracing::debug!(raw = %raw, balance = %balance, "Read SLW balance");
		Ok(balance)
	}

	#[instrument(skip_all, fields(address = %address, amount = %amount))]
	async fn mint_slw(&self, address: Address, amount: Decimal) -> Result<(), ClientError> {
		let raw = to_fixed_point(amount, CURRENCY_DECIMALS)?;
		self.execute(
			&self.context,
			&self.contracts.metaverse,
			"mintSlw",
			vec![DynSolValue::Address(address), fixed(raw)],
		)
		.await?;
		Ok(())
	}

	#[instrument(skip_all, fields(address = %address, amount = %amount))]
	async fn burn_slw(&self, address: Address, amount: Decimal) -> Result<(), ClientError> {
		let raw = to_fixed_point(amount, CURRENCY_DECIMALS)?;
		self.execute(
			&self.context,
			&self.contracts.metaverse,
			"burnSlw",
			vec![DynSolValue::Address(address), fixed(raw)],
		)
		.await?;
		Ok(())
	}

	#[instrument(skip_all, fields(star_id = star_id, luminosity = luminosity))]
	async fn set_star_luminosity(
		&self,
		star_id: u64,
		luminosity: f64,
	) -> Result<(), ClientError> {
		let raw = to_fixed_point(decimal_from_f64(luminosity)?, LUMINOSITY_DECIMALS)?;
		self.execute(
			&self.context,
			&self.contracts.metaverse,
			"setStarLuminosity",
			vec![uint(star_id), fixed(raw)],
		)
		.await?;
		Ok(())
	}

	#[instrument(skip_all, fields(metaverse_address = %metaverse_address))]
	async fn set_minter_role(&self, metaverse_address: Address) -> Result<(), ClientError> {
		self.execute(
			&self.context,
			&self.contracts.slw,
			"setMinterRole",
			vec![DynSolValue::Address(metaverse_address)],
		)
		.await?;
		Ok(())
	}

	#[instrument(skip_all, fields(ship_id = ship_id, star_id = star_id, fast_forward = fast_forward))]
	async fn send_ship(
		&self,
		ship_id: u64,
		star_id: u64,
		distance: Decimal,
		fuel: u64,
		fast_forward: bool,
	) -> Result<u64, ClientError> {
		let metaverse = &self.contracts.metaverse;
		let method = if fast_forward { "sendShipFfwd" } else { "sendShip" };
		let raw_distance = to_fixed_point(distance, DISTANCE_DECIMALS)?;

		let receipt = self
			.execute(
				&self.context,
				metaverse,
				method,
				vec![uint(ship_id), uint(star_id), fixed(raw_distance), uint(fuel)],
			)
			.await?;

		let event = receipt.require_event(metaverse, &self.config.events.ship_sent)?;
		let arrival = to_u64(uint_arg(event, "_arrivalTime")?, "arrival time")?;
		tracing::info!(arrival, "Ship dispatched");
		Ok(arrival)
	}

	#[instrument(skip_all, fields(star_id = star_id, new_owner = %new_owner))]
	async fn claim_star(
		&self,
		star_id: u64,
		new_owner: Address,
		owner_credential: Option<&Credential>,
	) -> Result<(), ClientError> {
		let owner_context = match owner_credential {
			Some(credential) => {
				Some(AccountContext::initialize(credential, self.connector.as_ref()).await?)
			}
			None => None,
		};
		let approver = owner_context.as_ref().unwrap_or(&self.context);
		tracing::info!(approver = %approver.address(), "Approving star transfer");

		// The claim only succeeds once the approval is visible on chain
		self.execute(
			approver,
			&self.contracts.star,
			"approve",
			vec![
				DynSolValue::Address(self.contracts.metaverse.address()),
				uint(star_id),
			],
		)
		.await?;

		self.execute(
			&self.context,
			&self.contracts.metaverse,
			"claimStar",
			vec![uint(star_id), DynSolValue::Address(new_owner)],
		)
		.await?;
		Ok(())
	}

	#[instrument(skip_all, fields(attacker_id = attacker_id, target_id = target_id))]
	async fn attack_ship(
		&self,
		attacker_id: u64,
		target_id: u64,
		power: u64,
	) -> Result<AttackOutcome, ClientError> {
		let metaverse = &self.contracts.metaverse;
		let receipt = self
			.execute(
				&self.context,
				metaverse,
				"attackShip",
				vec![uint(attacker_id), uint(target_id), uint(power)],
			)
			.await?;

		let prize_event = &self.config.events.attack_prize;
		let prize = if metaverse.declares_event(prize_event) {
			receipt.find_event(metaverse.address(), prize_event)
		} else {
			// Compatibility rule for ABIs without a prize event: a won attack
			// emits more than three events and the second carries the prize.
			tracing::debug!(
				events = receipt.event_count(),
				"Prize event not declared, deciding outcome by event count"
			);
			if receipt.event_count() > 3 {
				let event = receipt.event_at(1).ok_or_else(|| {
					ClientError::Decode("Attack receipt has no second event".to_string())
				})?;
				Some(event)
			} else {
				None
			}
		};

		let outcome = match prize {
			Some(event) => {
				AttackOutcome::won(from_fixed_point(uint_arg(event, "_amount")?, CURRENCY_DECIMALS)?)
			}
			None => AttackOutcome::lost(),
		};
		tracing::info!(success = outcome.success, amount = ?outcome.amount, "Attack resolved");
		Ok(outcome)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy::json_abi::JsonAbi;
	use alloy::primitives::{address, Log};
	use alloy::sol;
	use alloy::sol_types::SolEvent;
	use metaverse_delivery::implementations::mock::{MockConnector, MockDelivery};
	use metaverse_delivery::DeliveryError;
	use metaverse_types::Transaction;
	use std::str::FromStr;

	sol! {
		interface Erc721 {
			event Transfer(address indexed from, address indexed to, uint256 indexed tokenId);
			event Approval(address indexed owner, address indexed approved, uint256 indexed tokenId);
		}

		interface Erc20 {
			event Transfer(address indexed from, address indexed to, uint256 value);
		}

		interface Metaverse {
			event SlwHarvested(uint256 indexed _ship, uint256 _amountShip, address _starOwner, uint256 _amountTax);
			event ShipSent(uint256 indexed _ship, uint256 _star, uint256 _arrivalTime);
			event ShipAttacked(uint256 indexed _attacker, uint256 indexed _target, uint256 _power);
			event PrizeAwarded(uint256 indexed _ship, uint256 _amount);
			event SlwWon(uint256 indexed _ship, uint256 _amount);
		}
	}

	const OPERATOR: Address = address!("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
	const SLW: Address = address!("0x5FbDB2315678afecb367f032d93F642f64180aa3");
	const STAR: Address = address!("0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512");
	const SHIP: Address = address!("0x9fE46736679d2D9a65F0992F2272dE9f3c7fa6e0");
	const METAVERSE: Address = address!("0xCf7Ed3AccA5a467e9e704C703E8D87F634fB0Fc9");

	const CONFIG: &str = r#"
[network]
rpc_url = "http://localhost:8545"

[account]
private_key = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80"
operator_address = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"

[contracts.slw]
address = "0x5FbDB2315678afecb367f032d93F642f64180aa3"
abi = "SLW.json"

[contracts.star]
address = "0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512"
abi = "Star.json"

[contracts.ship]
address = "0x9fE46736679d2D9a65F0992F2272dE9f3c7fa6e0"
abi = "Ship.json"

[contracts.metaverse]
address = "0xCf7Ed3AccA5a467e9e704C703E8D87F634fB0Fc9"
abi = "Metaverse.json"
"#;

	const SLW_ABI: &[&str] = &[
		"function balanceOf(address account) view returns (uint256)",
		"function setMinterRole(address minter)",
		"event Transfer(address indexed from, address indexed to, uint256 value)",
	];

	const STAR_ABI: &[&str] = &[
		"function safeMint(address to, string uri)",
		"function approve(address to, uint256 tokenId)",
		"event Transfer(address indexed from, address indexed to, uint256 indexed tokenId)",
		"event Approval(address indexed owner, address indexed approved, uint256 indexed tokenId)",
	];

	const SHIP_ABI: &[&str] = &[
		"function safeMint(address to, string uri)",
		"event Transfer(address indexed from, address indexed to, uint256 indexed tokenId)",
	];

	const METAVERSE_FUNCTIONS: &[&str] = &[
		"function enterOrbit(uint256 shipId, uint256 starId)",
		"function harvestSlw(uint256 shipId, uint256 shipId2)",
		"function mintSlw(address to, uint256 amount)",
		"function burnSlw(address from, uint256 amount)",
		"function setStarLuminosity(uint256 starId, uint256 luminosity)",
		"function sendShip(uint256 shipId, uint256 starId, uint256 distance, uint256 fuel)",
		"function sendShipFfwd(uint256 shipId, uint256 starId, uint256 distance, uint256 fuel)",
		"function claimStar(uint256 starId, address newOwner)",
		"function attackShip(uint256 attacker, uint256 target, uint256 power)",
		"event SlwHarvested(uint256 indexed _ship, uint256 _amountShip, address _starOwner, uint256 _amountTax)",
		"event ShipSent(uint256 indexed _ship, uint256 _star, uint256 _arrivalTime)",
		"event ShipAttacked(uint256 indexed _attacker, uint256 indexed _target, uint256 _power)",
	];

	const PRIZE_EVENT: &str = "event PrizeAwarded(uint256 indexed _ship, uint256 _amount)";
	const LEGACY_PRIZE_EVENT: &str = "event SlwWon(uint256 indexed _ship, uint256 _amount)";

	fn interface(name: &str, address: Address, items: &[&str]) -> ContractInterface {
		ContractInterface::new(name, address, JsonAbi::parse(items.iter().copied()).unwrap())
	}

	fn contracts(with_prize_event: bool) -> ContractSet {
		let mut metaverse = METAVERSE_FUNCTIONS.to_vec();
		metaverse.push(if with_prize_event {
			PRIZE_EVENT
		} else {
			LEGACY_PRIZE_EVENT
		});
		ContractSet {
			slw: interface("SLW", SLW, SLW_ABI),
			star: interface("Star", STAR, STAR_ABI),
			ship: interface("Ship", SHIP, SHIP_ABI),
			metaverse: interface("Metaverse", METAVERSE, &metaverse),
		}
	}

	struct Harness {
		client: MetaverseClient,
		mock: Arc<MockDelivery>,
		connector: Arc<MockConnector>,
	}

	async fn harness_with(contracts: ContractSet) -> Harness {
		let mock = Arc::new(MockDelivery::new(OPERATOR));
		let connector = Arc::new(MockConnector::new());
		connector.register(mock.clone());
		let config: Config = CONFIG.parse().unwrap();
		let client = MetaverseClient::with_interfaces(config, contracts, connector.clone())
			.await
			.unwrap();
		Harness {
			client,
			mock,
			connector,
		}
	}

	async fn harness() -> Harness {
		harness_with(contracts(true)).await
	}

	fn log(address: Address, event: &impl SolEvent) -> Log {
		Log {
			address,
			data: event.encode_log_data(),
		}
	}

	fn selector(contract: &ContractInterface, method: &str, arity: usize) -> Option<[u8; 4]> {
		Some(contract.function(method, arity).unwrap().selector().0)
	}

	fn slw_transfer() -> Log {
		log(
			SLW,
			&Erc20::Transfer {
				from: Address::ZERO,
				to: OPERATOR,
				value: U256::from(1u64),
			},
		)
	}

	fn wei(amount: &str) -> U256 {
		to_fixed_point(Decimal::from_str(amount).unwrap(), 18).unwrap()
	}

	fn submitted_selectors(mock: &MockDelivery) -> Vec<Option<[u8; 4]>> {
		mock.submitted().iter().map(Transaction::selector).collect()
	}

	#[tokio::test]
	async fn test_get_balance_converts_fixed_point() {
		let h = harness().await;
		h.mock.push_call_response(
			DynSolValue::Uint(U256::from(5_000_000_000_000_000_000u128), 256).abi_encode(),
		);

		let balance = h.client.get_slw_balance(OPERATOR).await.unwrap();

		assert_eq!(balance, Decimal::from(5));
		assert!(h.mock.submitted().is_empty());
		assert_eq!(h.mock.calls()[0].to, SLW);
	}

	#[tokio::test]
	async fn test_mint_star_goes_to_operator() {
		let h = harness().await;
		h.mock.push_receipt(
			true,
			vec![log(
				STAR,
				&Erc721::Transfer {
					from: Address::ZERO,
					to: OPERATOR,
					tokenId: U256::from(29),
				},
			)],
		);

		let token_id = h.client.mint_star("ipfs://star/29").await.unwrap();

		assert_eq!(token_id, 29);
		let submitted = h.mock.submitted();
		let tx = &submitted[0];
		assert_eq!(tx.to, STAR);
		assert_eq!(tx.selector(), selector(&h.client.contracts().star, "safeMint", 2));
	}

	#[tokio::test]
	async fn test_mint_ship_without_transfer_event_is_decode_error() {
		let h = harness().await;
		h.mock.push_receipt(true, vec![slw_transfer()]);

		let err = h
			.client
			.mint_ship("ipfs://ship/1", Address::repeat_byte(0x33))
			.await
			.unwrap_err();

		assert!(matches!(err, ClientError::Delivery(DeliveryError::Decode(_))));
		assert_eq!(h.mock.submitted()[0].to, SHIP);
	}

	#[tokio::test]
	async fn test_harvest_decodes_named_event() {
		let h = harness().await;
		let star_owner = Address::repeat_byte(0x44);
		h.mock.push_receipt(
			true,
			vec![
				slw_transfer(),
				slw_transfer(),
				log(
					METAVERSE,
					&Metaverse::SlwHarvested {
						_ship: U256::from(26),
						_amountShip: wei("12.5"),
						_starOwner: star_owner,
						_amountTax: wei("0.75"),
					},
				),
			],
		);

		let result = h.client.harvest(26).await.unwrap();

		assert_eq!(
			result,
			HarvestResult {
				ship_id: 26,
				amount_ship: Decimal::from_str("12.5").unwrap(),
				star_owner,
				tax_amount: Decimal::from_str("0.75").unwrap(),
			}
		);

		// Ship id is passed twice
		let submitted = h.mock.submitted();
		let data = &submitted[0].data;
		assert_eq!(data[4..36], data[36..68]);
	}

	#[tokio::test]
	async fn test_reverted_harvest_produces_no_result() {
		let h = harness().await;
		h.mock.push_receipt(false, Vec::new());

		let err = h.client.harvest(26).await.unwrap_err();

		assert!(matches!(err, ClientError::Delivery(DeliveryError::Reverted { .. })));
	}

	#[tokio::test]
	async fn test_send_ship_selects_method_variant() {
		let h = harness().await;
		let sent = |arrival: u64| {
			vec![
				slw_transfer(),
				log(
					METAVERSE,
					&Metaverse::ShipSent {
						_ship: U256::from(1),
						_star: U256::from(2),
						_arrivalTime: U256::from(arrival),
					},
				),
			]
		};
		h.mock.push_receipt(true, sent(1_700_000_060));
		h.mock.push_receipt(true, sent(1_700_000_120));

		let distance = Decimal::from_str("1.5").unwrap();
		let normal = h.client.send_ship(1, 2, distance, 10, false).await.unwrap();
		let fast = h.client.send_ship(1, 2, distance, 10, true).await.unwrap();

		assert_eq!(normal, 1_700_000_060);
		assert_eq!(fast, 1_700_000_120);

		let metaverse = &h.client.contracts().metaverse;
		assert_eq!(
			submitted_selectors(&h.mock),
			vec![
				selector(metaverse, "sendShip", 4),
				selector(metaverse, "sendShipFfwd", 4),
			]
		);

		// Distance is the third word
		let submitted = h.mock.submitted();
		let data = &submitted[0].data;
		assert_eq!(U256::from_be_slice(&data[68..100]), wei("1.5"));
	}

	#[tokio::test]
	async fn test_mint_slw_and_luminosity_encode_fixed_point() {
		let h = harness().await;

		h.client
			.mint_slw(OPERATOR, Decimal::from_str("2.25").unwrap())
			.await
			.unwrap();
		h.client.set_star_luminosity(7, 1.25).await.unwrap();

		let submitted = h.mock.submitted();
		assert_eq!(U256::from_be_slice(&submitted[0].data[36..68]), wei("2.25"));
		assert_eq!(
			U256::from_be_slice(&submitted[1].data[36..68]),
			U256::from(1_250_000_000_000u64)
		);
	}

	#[tokio::test]
	async fn test_negative_burn_fails_before_submission() {
		let h = harness().await;

		let err = h
			.client
			.burn_slw(OPERATOR, Decimal::from_str("-1").unwrap())
			.await
			.unwrap_err();

		assert!(matches!(err, ClientError::Conversion(_)));
		assert!(h.mock.submitted().is_empty());
	}

	#[tokio::test]
	async fn test_estimation_failure_still_submits() {
		let mock = Arc::new(MockDelivery::new(OPERATOR).with_estimate(None));
		let connector = Arc::new(MockConnector::new());
		connector.register(mock.clone());
		let client =
			MetaverseClient::with_interfaces(CONFIG.parse().unwrap(), contracts(true), connector)
				.await
				.unwrap();

		client.set_minter_role(METAVERSE).await.unwrap();

		let submitted = mock.submitted();
		assert_eq!(submitted.len(), 1);
		assert_eq!(submitted[0].gas_limit, Some(5_000_000));
	}

	#[tokio::test]
	async fn test_claim_star_with_operator_signer() {
		let h = harness().await;

		h.client.claim_star(29, Address::repeat_byte(0x55), None).await.unwrap();

		let contracts = h.client.contracts();
		assert_eq!(
			submitted_selectors(&h.mock),
			vec![
				selector(&contracts.star, "approve", 2),
				selector(&contracts.metaverse, "claimStar", 2),
			]
		);
		assert_eq!(h.connector.connections(), 1);
	}

	#[tokio::test]
	async fn test_claim_star_with_owner_credential() {
		let h = harness().await;
		let (owner, owner_key) = metaverse_account::LocalAccount::generate();
		let owner_mock = Arc::new(MockDelivery::new(owner.address()));
		h.connector.register(owner_mock.clone());

		h.client
			.claim_star(29, Address::repeat_byte(0x55), Some(&owner_key))
			.await
			.unwrap();

		let contracts = h.client.contracts();
		assert_eq!(
			submitted_selectors(&owner_mock),
			vec![selector(&contracts.star, "approve", 2)]
		);
		assert_eq!(
			submitted_selectors(&h.mock),
			vec![selector(&contracts.metaverse, "claimStar", 2)]
		);
		assert_eq!(h.connector.connections(), 2);
	}

	#[tokio::test]
	async fn test_rejected_approval_skips_claim() {
		let h = harness().await;
		h.mock.push_receipt(false, Vec::new());

		let err = h.client.claim_star(29, Address::repeat_byte(0x55), None).await;

		assert!(err.is_err());
		assert_eq!(h.mock.submitted().len(), 1);
	}

	fn ship_attacked() -> Log {
		log(
			METAVERSE,
			&Metaverse::ShipAttacked {
				_attacker: U256::from(1),
				_target: U256::from(2),
				_power: U256::from(3),
			},
		)
	}

	#[tokio::test]
	async fn test_attack_outcome_from_prize_event() {
		let h = harness().await;
		let prize = log(
			METAVERSE,
			&Metaverse::PrizeAwarded {
				_ship: U256::from(1),
				_amount: wei("3.5"),
			},
		);
		// Three events, decided by name rather than count
		h.mock
			.push_receipt(true, vec![ship_attacked(), slw_transfer(), prize]);
		h.mock.push_receipt(true, vec![ship_attacked()]);

		let won = h.client.attack_ship(1, 2, 3).await.unwrap();
		let lost = h.client.attack_ship(1, 2, 3).await.unwrap();

		assert_eq!(won, AttackOutcome::won(Decimal::from_str("3.5").unwrap()));
		assert_eq!(lost, AttackOutcome::lost());
	}

	#[tokio::test]
	async fn test_attack_outcome_by_event_count() {
		let h = harness_with(contracts(false)).await;
		let reward = log(
			METAVERSE,
			&Metaverse::SlwWon {
				_ship: U256::from(1),
				_amount: wei("3.5"),
			},
		);
		h.mock.push_receipt(
			true,
			vec![slw_transfer(), reward, ship_attacked(), slw_transfer()],
		);
		h.mock
			.push_receipt(true, vec![slw_transfer(), ship_attacked(), slw_transfer()]);

		let won = h.client.attack_ship(1, 2, 3).await.unwrap();
		let lost = h.client.attack_ship(1, 2, 3).await.unwrap();

		assert_eq!(won, AttackOutcome::won(Decimal::from_str("3.5").unwrap()));
		assert_eq!(lost, AttackOutcome::lost());
	}

	#[tokio::test]
	async fn test_missing_configuration_makes_no_network_calls() {
		let mutations: [fn(&mut Config); 7] = [
			|config| config.network.rpc_url = String::new(),
			|config| config.account.private_key = None,
			|config| config.account.operator_address = String::new(),
			|config| config.contracts.slw.address = String::new(),
			|config| config.contracts.star.address = String::new(),
			|config| config.contracts.ship.address = String::new(),
			|config| config.contracts.metaverse.address = String::new(),
		];

		for mutate in mutations {
			let mock = Arc::new(MockDelivery::new(OPERATOR));
			let connector = Arc::new(MockConnector::new());
			connector.register(mock.clone());
			let mut config: Config = CONFIG.parse().unwrap();
			mutate(&mut config);

			let result =
				MetaverseClient::with_interfaces(config, contracts(true), connector.clone()).await;

			assert!(matches!(result, Err(ClientError::Configuration(_))));
			assert_eq!(connector.connections(), 0);
			assert_eq!(mock.network_calls(), 0);
		}
	}

	#[tokio::test]
	async fn test_initialize_validates_before_loading_abis() {
		let connector = Arc::new(MockConnector::new());
		let mut config: Config = CONFIG.parse().unwrap();
		config.network.rpc_url = String::new();
		config.contracts.slw.abi = "/nonexistent/SLW.json".into();

		let result = MetaverseClient::initialize(config, connector.clone()).await;

		match result {
			Err(ClientError::Configuration(message)) => {
				assert_eq!(message, "Validation error: Missing RPC URL setting")
			}
			Err(other) => panic!("expected configuration error, got {other:?}"),
			Ok(_) => panic!("expected configuration error"),
		}
		assert_eq!(connector.connections(), 0);
	}

	#[tokio::test]
	async fn test_initialize_loads_artifacts() {
		let dir = tempfile::tempdir().unwrap();
		let set = contracts(true);
		for (file, contract) in [
			("SLW.json", &set.slw),
			("Star.json", &set.star),
			("Ship.json", &set.ship),
			("Metaverse.json", &set.metaverse),
		] {
			let artifact = serde_json::json!({ "contractName": contract.name(), "abi": contract.abi() });
			std::fs::write(dir.path().join(file), artifact.to_string()).unwrap();
		}
		let config_path = dir.path().join("config.toml");
		std::fs::write(&config_path, CONFIG).unwrap();

		let mock = Arc::new(MockDelivery::new(OPERATOR));
		let connector = Arc::new(MockConnector::new());
		connector.register(mock.clone());
		let config = Config::from_file(&config_path).await.unwrap();

		let client = MetaverseClient::initialize(config, connector).await.unwrap();

		assert_eq!(client.address(), OPERATOR);
		assert_eq!(client.operator(), OPERATOR);
		assert_eq!(client.contracts().metaverse.address(), METAVERSE);
		assert!(client.contracts().metaverse.declares_event("PrizeAwarded"));
	}
}
