use std::path::PathBuf;

use clap::Parser;
use ethers::{signers::Signer, types::U256};
use log::info;
use utility_deployer::{
    client,
    config::{NetworkConfig, DEFAULT_CREDENTIALS_PATH, DEFAULT_NETWORK},
    deploy::{self, DeployRequest, DEFAULT_CONTRACT},
    ContractArtifact,
};

// CLI argument parsing
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Network name in the credentials file
    #[clap(short = 'n', long, default_value = DEFAULT_NETWORK)]
    network: String,

    /// Credentials file mapping network names to URL and PKEY
    #[clap(short = 'c', long, default_value = DEFAULT_CREDENTIALS_PATH)]
    credentials: PathBuf,

    /// Contract to deploy, optionally fully qualified (path/File.sol:Name)
    #[clap(long, default_value = DEFAULT_CONTRACT)]
    contract: String,

    /// Directory holding compiled artifacts
    #[clap(short = 'a', long, default_value = "artifacts")]
    artifacts: PathBuf,

    /// Constructor argument, repeat in declaration order
    #[clap(long = "arg")]
    constructor_args: Vec<String>,

    /// Blocks to wait for after the deployment is mined
    #[clap(long, default_value_t = 1)]
    confirmations: usize,

    /// Chain ID (queried from the node when omitted)
    #[clap(long)]
    chain_id: Option<u64>,

    /// Gas limit for the deployment transaction
    #[clap(long)]
    gas_limit: Option<u64>,

    /// Send a pre-EIP-1559 transaction
    #[clap(long)]
    legacy: bool,

    /// Simulate the deployment and print the gas estimate only
    #[clap(long)]
    dry_run: bool,

    /// Write a JSON deployment record to this file
    #[clap(short = 'o', long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let network = NetworkConfig::load(&args.credentials, &args.network)?;
    let artifact = ContractArtifact::locate(&args.artifacts, &args.contract)?;
    if let Some(path) = &artifact.path {
        info!("Using artifact {}", path.display());
    }

    let client = client::connect(&network, args.chain_id).await?;
    client::report_balance(client.as_ref(), client.address()).await?;

    let request = DeployRequest {
        constructor_args: args.constructor_args,
        confirmations: args.confirmations,
        gas_limit: args.gas_limit.map(U256::from),
        legacy: args.legacy,
    };

    if args.dry_run {
        let gas = deploy::simulate(client, &artifact, &request).await?;
        println!("{} deployment would use {} gas", artifact.name, gas);
        return Ok(());
    }

    let chain_id = client.signer().chain_id();
    let deployment = deploy::deploy(client, &artifact, &request).await?;
    info!("Transaction hash: {:?}", deployment.transaction_hash);
    println!("{}", deployment.report());

    if let Some(path) = &args.output {
        deployment.save(path, &network.name, chain_id)?;
    }

    Ok(())
}
