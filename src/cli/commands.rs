//! CLI commands for the deployer
//!
//! Implements all command handlers for the CLI interface.

use crate::config::DeployConfig;
use crate::contract::{compile_contract, Solc};
use crate::driver::{Driver, DriverError, DriverEvent};
use crate::network::{ChainClient, RpcChainClient};
use crate::source;
use crate::wallet::{Wallet, WalletError, PRIVATE_KEY_VAR};
use alloy_primitives::Address;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Whether `err` means the node could not be reached
pub fn is_not_connected(err: &(dyn std::error::Error + 'static)) -> bool {
    matches!(
        err.downcast_ref::<DriverError>(),
        Some(DriverError::NotConnected)
    )
}

/// Print one progress line per driver event
pub fn print_event(event: &DriverEvent) {
    match event {
        DriverEvent::Connected { chain_id, account } => {
            println!("🔗 Connected to chain {}", chain_id);
            println!("   └─ Account: {}", account);
        }
        DriverEvent::Compiled {
            name,
            functions,
            bytecode_len,
        } => {
            println!("🔨 Compiled {} ({} bytes)", name, bytecode_len);
            for function in functions {
                println!("   ├─ {}", function);
            }
        }
        DriverEvent::Submitted {
            purpose,
            hash,
            nonce,
        } => {
            println!("📤 Sent {} transaction", purpose);
            println!("   ├─ Hash: {}", hash);
            println!("   └─ Nonce: {}", nonce);
            println!("⏳ Waiting for receipt...");
        }
        DriverEvent::Mined { purpose, receipt } => {
            let icon = if receipt.status { "✅" } else { "❌" };
            println!("{} {} mined", icon, purpose);
            match receipt.block_number {
                Some(block) => println!("   ├─ Block: {}", block),
                None => println!("   ├─ Block: pending"),
            }
            println!("   ├─ Gas used: {}", receipt.gas_used);
            println!(
                "   └─ Status: {}",
                if receipt.status { "success" } else { "reverted" }
            );
        }
        DriverEvent::Deployed { address } => {
            println!("📜 Contract deployed at {}", address);
        }
        DriverEvent::Attached { address } => {
            println!("📎 Using contract at {}", address);
        }
    }
}

fn driver(config: &DeployConfig) -> CliResult<Driver<RpcChainClient, Solc>> {
    config.validate()?;
    let wallet = Wallet::from_env()?;
    let chain = config.chain_client()?;

    println!("🌐 Connecting to {}...", config.rpc_url);
    Ok(Driver::new(chain, config.compiler(), wallet, config.clone()).on_event(print_event))
}

/// Compile, deploy and join a ride
pub fn cmd_run(config: &DeployConfig) -> CliResult<()> {
    let mut driver = driver(config)?;
    let summary = driver.run()?;

    println!("\n🚗 Joined ride {}", driver.config().ride_id);
    println!("   ├─ Chain: {}", summary.chain_id);
    println!("   ├─ Contract: {}", summary.contract_address);
    println!("   ├─ Deployment: {}", summary.deploy_receipt.transaction_hash);
    println!("   └─ Ride call: {}", summary.join_receipt.transaction_hash);

    Ok(())
}

/// Compile the contract without touching the network
pub fn cmd_compile(config: &DeployConfig) -> CliResult<()> {
    let source = source::load(&config.source_path)?;
    println!("🔨 Compiling {}...", source.path().display());

    let artifact = compile_contract(&config.compiler(), &source)?;

    println!("✅ Compiled {}", artifact.name());
    println!("   ├─ Bytecode: {} bytes", artifact.bytecode().len());
    println!("   ├─ ABI entries: {}", artifact.abi().len());
    for function in artifact.function_signatures() {
        println!("   │  • {}", function);
    }
    match artifact.metadata() {
        Some(metadata) => println!("   └─ Metadata: {} bytes", metadata.len()),
        None => println!("   └─ Metadata: not produced"),
    }

    Ok(())
}

/// Compile and deploy, without joining a ride
pub fn cmd_deploy(config: &DeployConfig) -> CliResult<()> {
    let mut driver = driver(config)?;
    driver.connect()?;
    driver.compile()?;
    driver.deploy()?;

    if let Some(address) = driver.contract().and_then(|c| c.address()) {
        println!("\n💡 Join a ride later with: carpool join --address {}", address);
    }
    Ok(())
}

/// Join a ride on a contract deployed earlier
pub fn cmd_join(config: &DeployConfig, address: Address) -> CliResult<()> {
    let mut driver = driver(config)?;
    driver.connect()?;
    driver.compile()?;
    driver.attach(address)?;
    driver.join_ride()?;

    println!("\n🚗 Joined ride {} on {}", config.ride_id, address);
    Ok(())
}

/// Show endpoint, chain and account state
pub fn cmd_status(config: &DeployConfig) -> CliResult<()> {
    config.validate()?;
    let chain = config.chain_client()?;

    println!("🌐 Endpoint: {}", chain.url());
    if !chain.is_connected() {
        println!("   └─ Status: unreachable");
        return Err(DriverError::NotConnected.into());
    }

    println!("   ├─ Status: connected");
    println!("   ├─ Chain ID: {}", chain.chain_id()?);
    println!("   └─ Gas price: {} wei", chain.gas_price()?);

    match Wallet::from_env() {
        Ok(wallet) => {
            let nonce = chain.get_transaction_count(wallet.address())?;
            println!("\n👛 Account: {}", wallet.address());
            println!("   └─ Nonce: {}", nonce);
        }
        Err(WalletError::MissingKey(_)) => {
            println!("\n👛 No account configured (set {})", PRIVATE_KEY_VAR);
        }
        Err(e) => return Err(e.into()),
    }

    let installer = config.installer();
    let versions: Vec<String> = installer
        .installed_versions()
        .iter()
        .map(|v| v.to_string())
        .collect();
    println!("\n🔧 solc cache: {}", installer.cache_dir().display());
    if versions.is_empty() {
        println!("   └─ Installed: none");
    } else {
        println!("   └─ Installed: {}", versions.join(", "));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::TxPurpose;
    use crate::source::SourceError;

    #[test]
    fn test_not_connected_detection() {
        let err: Box<dyn std::error::Error> = Box::new(DriverError::NotConnected);
        assert!(is_not_connected(err.as_ref()));

        let err: Box<dyn std::error::Error> =
            Box::new(DriverError::MissingContractAddress(Default::default()));
        assert!(!is_not_connected(err.as_ref()));
    }

    #[test]
    fn test_status_unreachable() {
        let config = DeployConfig {
            rpc_url: "http://127.0.0.1:9".to_string(),
            ..Default::default()
        };
        let err = cmd_status(&config).unwrap_err();
        assert!(is_not_connected(err.as_ref()));
    }

    #[test]
    fn test_compile_missing_source() {
        let dir = tempfile::tempdir().unwrap();
        let config = DeployConfig {
            source_path: dir.path().join("Carpooling.sol"),
            ..Default::default()
        };
        let err = cmd_compile(&config).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SourceError>(),
            Some(SourceError::NotFound(_))
        ));
    }

    #[test]
    fn test_purpose_labels() {
        assert_eq!(TxPurpose::Deploy.to_string(), "deployment");
        assert_eq!(TxPurpose::JoinRide(1).to_string(), "joinRide(1)");
    }
}
