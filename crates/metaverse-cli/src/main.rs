//! Command-line entry point for the metaverse client.
//!
//! Each subcommand runs one domain operation against the contracts named
//! in the configuration file and prints its result as JSON.

use alloy::primitives::Address;
use clap::{Parser, Subcommand};
use metaverse_account::LocalAccount;
use metaverse_client::{MetaverseClient, MetaverseOperations};
use metaverse_config::Config;
use metaverse_types::Credential;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::path::PathBuf;

/// Command-line arguments for the metaverse client.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file
	#[arg(short, long, default_value = "config.toml")]
	config: PathBuf,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info")]
	log_level: String,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Print the SLW balance of an address, the operator address by default
	Balance { address: Option<Address> },
	/// Mint a star to the operator address
	MintStar { uri: String },
	/// Mint a ship to a recipient
	MintShip { uri: String, recipient: Address },
	/// Put a ship in orbit around a star
	EnterOrbit { ship_id: u64, star_id: u64 },
	/// Harvest the SLW accrued by a ship
	Harvest { ship_id: u64 },
	/// Mint SLW to an address
	MintSlw { address: Address, amount: Decimal },
	/// Burn SLW from an address
	BurnSlw { address: Address, amount: Decimal },
	/// Update the luminosity of a star
	SetLuminosity { star_id: u64, luminosity: f64 },
	/// Grant the SLW minter role to the metaverse contract
	SetMinterRole { metaverse_address: Address },
	/// Send a ship towards a star
	SendShip {
		ship_id: u64,
		star_id: u64,
		distance: Decimal,
		fuel: u64,
		/// Use the fast-forward travel variant
		#[arg(long)]
		fast_forward: bool,
	},
	/// Transfer a star to a new owner
	ClaimStar {
		star_id: u64,
		new_owner: Address,
		/// Private key of the current owner, signs the approval
		#[arg(long, env = "METAVERSE_OWNER_KEY", hide_env_values = true)]
		owner_key: Option<String>,
	},
	/// Resolve an attack between two ships
	Attack {
		attacker_id: u64,
		target_id: u64,
		power: u64,
	},
	/// Generate a new signing key
	CreateWallet,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	use tracing_subscriber::{fmt, EnvFilter};

	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

	fmt()
		.with_env_filter(env_filter)
		.with_writer(std::io::stderr)
		.with_thread_ids(true)
		.with_target(true)
		.init();

	if matches!(args.command, Command::CreateWallet) {
		let (account, credential) = LocalAccount::generate();
		tracing::info!(address = %account.address(), "Generated wallet");
		let output = credential.with_exposed(|key| {
			json!({ "address": account.address(), "privateKey": key })
		});
		return print(output);
	}

	let config = Config::from_file(&args.config).await?;
	tracing::info!(config = %args.config.display(), "Loaded configuration");

	let client = MetaverseClient::connect(config).await?;
	let output = run(&client, args.command).await?;
	print(output)
}

async fn run(client: &MetaverseClient, command: Command) -> Result<Value, Box<dyn std::error::Error>> {
	let output = match command {
		Command::Balance { address } => {
			let address = address.unwrap_or_else(|| client.operator());
			let balance = client.get_slw_balance(address).await?;
			json!({ "address": address, "balance": balance })
		}
		Command::MintStar { uri } => {
			json!({ "starId": client.mint_star(&uri).await? })
		}
		Command::MintShip { uri, recipient } => {
			json!({ "shipId": client.mint_ship(&uri, recipient).await? })
		}
		Command::EnterOrbit { ship_id, star_id } => {
			client.enter_orbit(ship_id, star_id).await?;
			json!({ "shipId": ship_id, "starId": star_id })
		}
		Command::Harvest { ship_id } => serde_json::to_value(client.harvest(ship_id).await?)?,
		Command::MintSlw { address, amount } => {
			client.mint_slw(address, amount).await?;
			json!({ "address": address, "minted": amount })
		}
		Command::BurnSlw { address, amount } => {
			client.burn_slw(address, amount).await?;
			json!({ "address": address, "burned": amount })
		}
		Command::SetLuminosity {
			star_id,
			luminosity,
		} => {
			client.set_star_luminosity(star_id, luminosity).await?;
			json!({ "starId": star_id, "luminosity": luminosity })
		}
		Command::SetMinterRole { metaverse_address } => {
			client.set_minter_role(metaverse_address).await?;
			json!({ "minter": metaverse_address })
		}
		Command::SendShip {
			ship_id,
			star_id,
			distance,
			fuel,
			fast_forward,
		} => {
			let arrival = client
				.send_ship(ship_id, star_id, distance, fuel, fast_forward)
				.await?;
			json!({ "shipId": ship_id, "arrivalTime": arrival })
		}
		Command::ClaimStar {
			star_id,
			new_owner,
			owner_key,
		} => {
			let owner_credential = owner_key.map(Credential::from);
			client
				.claim_star(star_id, new_owner, owner_credential.as_ref())
				.await?;
			json!({ "starId": star_id, "owner": new_owner })
		}
		Command::Attack {
			attacker_id,
			target_id,
			power,
		} => serde_json::to_value(client.attack_ship(attacker_id, target_id, power).await?)?,
		Command::CreateWallet => json!({}),
	};
	Ok(output)
}

fn print(output: Value) -> Result<(), Box<dyn std::error::Error>> {
	println!("{}", serde_json::to_string_pretty(&output)?);
	Ok(())
}
