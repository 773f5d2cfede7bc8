pub mod config;
pub mod ethers_client;
pub mod layout;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use contract_probe::{
    artifacts::ArtifactStore,
    contracts::EthersDeployer,
    probe::{Probe, ProbeOptions, DEFAULT_CONTRACT, DEFAULT_PAYLOAD, DEFAULT_SLOT},
    utils::display_address,
};
use tokio_util::sync::CancellationToken;

use crate::ethers_client::get_writer_ethers_client;

#[derive(Parser)]
#[command(name = "contract_probe_demo")]
#[command(about = "Deploy a contract, flip its owner slot and print the before/after owner", long_about = None)]
struct Cli {
    /// TOML config replacing the built-in localhost table
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Network to use instead of the configured default
    #[arg(short, long)]
    network: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Deploy, read owner, write slot, read owner again (the default)
    Probe {
        /// Contract name or fully qualified `source.sol:Name`
        #[arg(long, default_value = DEFAULT_CONTRACT)]
        contract: String,

        /// Storage slot passed as the first `write` argument
        #[arg(long, default_value_t = DEFAULT_SLOT)]
        slot: u64,

        /// 32 byte word passed as the second `write` argument
        #[arg(long, default_value = DEFAULT_PAYLOAD)]
        payload: String,
    },

    /// Print storage slots from a solc compact AST json
    Layout {
        /// Path to the AST json
        #[arg(short, long)]
        ast: PathBuf,

        /// Only lay out this contract
        #[arg(long)]
        contract: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Probe {
        contract: DEFAULT_CONTRACT.to_string(),
        slot: DEFAULT_SLOT,
        payload: DEFAULT_PAYLOAD.to_string(),
    });

    match command {
        Commands::Probe {
            contract,
            slot,
            payload,
        } => run_probe(cli.config, cli.network, &contract, slot, &payload).await,
        Commands::Layout { ast, contract } => layout::print_layouts(&ast, contract.as_deref()),
    }
}

async fn run_probe(
    config_path: Option<PathBuf>,
    network_override: Option<String>,
    contract: &str,
    slot: u64,
    payload: &str,
) -> anyhow::Result<()> {
    let config = config::load(config_path.as_deref(), network_override.as_deref())?;
    let network_name = config.default_network.clone();
    let network = config.active_network()?;

    let options = ProbeOptions::new(slot, payload, network.call_timeout())?;

    // resolved before any client exists so a missing artifact never hits the network
    let store = ArtifactStore::new(&config.paths.artifacts);
    let artifact = store.find(contract)?;

    match store.compiler_version(&artifact) {
        Some(version) if version != config.solidity => log::warn!(
            "{} was compiled with solc {version}, config expects {}",
            artifact.fully_qualified_name(),
            config.solidity
        ),
        Some(_) => {}
        None => log::debug!("no build info for {}", artifact.fully_qualified_name()),
    }

    let signer = get_writer_ethers_client(&network_name, network).await?;
    log::info!("Using network {network_name} at {}", network.url);

    let cancel = CancellationToken::new();
    let on_ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("Interrupted, cancelling in-flight call");
            on_ctrl_c.cancel();
        }
    });

    let deployer = EthersDeployer::new(signer, network.confirmations);
    let report = Probe::new(deployer, options.clone(), cancel)
        .run(&artifact)
        .await
        .with_context(|| format!("probing {}", artifact.fully_qualified_name()))?;

    log::info!(
        "Contract at {}, write tx {}",
        display_address(&report.contract_address),
        report
            .write_tx
            .map_or_else(|| "without receipt".to_string(), |tx| format!("{tx:?}"))
    );
    println!("{report}");

    if report.new_owner != options.expected_owner() {
        log::warn!(
            "owner after write is {}, payload encodes {}",
            display_address(&report.new_owner),
            display_address(&options.expected_owner())
        );
    }

    Ok(())
}
