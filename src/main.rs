//! Carpool deployer CLI Application
//!
//! Compiles the Carpooling contract, deploys it and joins a ride.

use alloy_primitives::Address;
use carpool_deploy::cli;
use carpool_deploy::config::{
    DeployConfig, GasPricePolicy, DEFAULT_RPC_URL, DEFAULT_SOURCE_PATH, RPC_URL_VAR,
};
use carpool_deploy::contract::toolchain;
use carpool_deploy::core::{DEFAULT_GAS_LIMIT, DEFAULT_GAS_PRICE_GWEI};
use carpool_deploy::network::DEFAULT_POLL_INTERVAL;
use clap::{Args, Parser, Subcommand};
use semver::Version;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "carpool")]
#[command(version)]
#[command(about = "Compile, deploy and call the Carpooling contract", long_about = None)]
struct Cli {
    #[command(flatten)]
    options: Options,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args)]
struct Options {
    /// JSON-RPC endpoint of the node
    #[arg(long, global = true, env = RPC_URL_VAR, default_value = DEFAULT_RPC_URL)]
    rpc_url: String,

    /// Solidity source file; the contract is named after the file
    #[arg(short, long, global = true, default_value = DEFAULT_SOURCE_PATH)]
    source: PathBuf,

    /// solc release to install and use
    #[arg(long, global = true, default_value = toolchain::DEFAULT_SOLC_VERSION)]
    solc_version: Version,

    /// Use this solc binary instead of an installed release
    #[arg(long, global = true)]
    solc: Option<PathBuf>,

    /// Directory holding installed solc releases
    #[arg(long, global = true)]
    solc_cache_dir: Option<PathBuf>,

    /// Host or mirror serving solc release builds
    #[arg(long, global = true, default_value = toolchain::SOLC_BINARIES_URL)]
    solc_mirror: String,

    /// Gas limit for every transaction
    #[arg(long, global = true, default_value_t = DEFAULT_GAS_LIMIT)]
    gas_limit: u64,

    /// Fixed gas price in gwei
    #[arg(long, global = true, default_value_t = DEFAULT_GAS_PRICE_GWEI)]
    gas_price_gwei: u64,

    /// Ask the node for the gas price instead of using a fixed one
    #[arg(long, global = true, conflicts_with = "gas_price_gwei")]
    network_gas_price: bool,

    /// Ride to join
    #[arg(long, global = true, default_value_t = 1)]
    ride_id: u64,

    /// Seconds to wait for each transaction to be mined
    #[arg(long, global = true, default_value_t = 120)]
    receipt_timeout: u64,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile, deploy and join a ride (default)
    Run,

    /// Compile the contract only
    Compile,

    /// Compile and deploy the contract
    Deploy,

    /// Join a ride on an already deployed contract
    Join {
        /// Contract address
        #[arg(short, long)]
        address: Address,
    },

    /// Show endpoint and account status
    Status,
}

impl Options {
    fn into_config(self) -> DeployConfig {
        let gas_price = if self.network_gas_price {
            GasPricePolicy::Network
        } else {
            GasPricePolicy::fixed_gwei(self.gas_price_gwei)
        };

        DeployConfig {
            rpc_url: self.rpc_url,
            source_path: self.source,
            solc_version: self.solc_version,
            solc_binary: self.solc,
            solc_cache_dir: self
                .solc_cache_dir
                .unwrap_or_else(toolchain::default_cache_dir),
            solc_base_url: self.solc_mirror,
            gas_limit: self.gas_limit,
            gas_price,
            ride_id: self.ride_id,
            receipt_timeout: Duration::from_secs(self.receipt_timeout),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

fn main() {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = cli.options.into_config();

    let result = match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => cli::cmd_run(&config),
        Commands::Compile => cli::cmd_compile(&config),
        Commands::Deploy => cli::cmd_deploy(&config),
        Commands::Join { address } => cli::cmd_join(&config, address),
        Commands::Status => cli::cmd_status(&config),
    };

    if let Err(e) = result {
        eprintln!("❌ {}", e);
        if cli::is_not_connected(e.as_ref()) {
            std::process::exit(-1);
        }
        std::process::exit(1);
    }
}
