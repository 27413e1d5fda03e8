use clap::Parser;
use ethers::{providers::Middleware, types::Address, utils::to_checksum};
use std::path::PathBuf;
use utility_deployer::{
    client,
    config::{NetworkConfig, DEFAULT_CREDENTIALS_PATH, DEFAULT_NETWORK},
    deploy::{verify_deployment, DEFAULT_CONTRACT},
    CodeCheck, ContractArtifact,
};

/// Compare on-chain code at an address with the compiled artifact
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Deployed contract address
    address: Address,

    /// Contract name, optionally fully qualified (path/File.sol:Name)
    #[clap(long, default_value = DEFAULT_CONTRACT)]
    contract: String,

    /// Directory holding compiled artifacts
    #[clap(short = 'a', long, default_value = "artifacts")]
    artifacts: PathBuf,

    /// Network name in the credentials file
    #[clap(short = 'n', long, default_value = DEFAULT_NETWORK)]
    network: String,

    /// Credentials file mapping network names to URL and PKEY
    #[clap(short = 'c', long, default_value = DEFAULT_CREDENTIALS_PATH)]
    credentials: PathBuf,
}

// Hosted endpoints carry the API key in the path, so only host and port are shown
fn rpc_host(network: &NetworkConfig) -> String {
    let host = network.rpc_url.host_str().unwrap_or("<none>");
    match network.rpc_url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    }
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    let network = NetworkConfig::load(&args.credentials, &args.network)?;
    let artifact = ContractArtifact::locate(&args.artifacts, &args.contract)?;
    let provider = client::provider(&network)?;

    println!("Verifying {} deployment...", artifact.name);
    println!("RPC host: {}", rpc_host(&network));
    println!("Contract Address: {}", to_checksum(&args.address, None));

    let chain_id = provider.get_chainid().await?;
    println!("Network Chain ID: {}", chain_id);

    match verify_deployment(&provider, args.address, &artifact).await? {
        CodeCheck::Missing => {
            println!("\n❌ No code found at address: {}", to_checksum(&args.address, None));
            println!("This could mean:");
            println!("1. The contract is not deployed at this address");
            println!("2. You're connecting to the wrong network (Chain ID: {})", chain_id);
            println!("3. The deployment transaction hasn't been mined yet");
            eyre::bail!("no code at {:?}", args.address);
        }
        CodeCheck::Matches { len } => {
            println!("\n✅ Verification successful!");
            println!("The deployed contract ({} bytes) matches the local compiled bytecode.", len);
        }
        CodeCheck::Differs { deployed_len, expected_len, first_mismatch } => {
            println!("\n❌ Verification failed!");
            println!("Deployed bytecode length: {} bytes", deployed_len);
            println!("Local bytecode length: {} bytes", expected_len);
            println!("First mismatch at byte {}", first_mismatch);
            println!("Immutable variables and metadata hashes also show up as differences.");
            eyre::bail!("deployed code differs from {}", artifact.name);
        }
    }

    Ok(())
}
