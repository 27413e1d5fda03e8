use clap::Parser;
use ethers::{types::H256, utils::to_checksum};
use std::path::PathBuf;
use utility_deployer::{
    client,
    config::{NetworkConfig, DEFAULT_CREDENTIALS_PATH, DEFAULT_NETWORK},
    deploy::lookup_deployment,
};

/// Print the contract address created by a deployment transaction
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Deployment transaction hash
    tx_hash: H256,

    /// Network name in the credentials file
    #[clap(short = 'n', long, default_value = DEFAULT_NETWORK)]
    network: String,

    /// Credentials file mapping network names to URL and PKEY
    #[clap(short = 'c', long, default_value = DEFAULT_CREDENTIALS_PATH)]
    credentials: PathBuf,
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    let network = NetworkConfig::load(&args.credentials, &args.network)?;
    let provider = client::provider(&network)?;

    match lookup_deployment(&provider, args.tx_hash).await? {
        Some(contract_address) => {
            println!("Contract address: {}", to_checksum(&contract_address, None))
        }
        None => println!("This transaction is not a contract deployment."),
    }

    Ok(())
}
