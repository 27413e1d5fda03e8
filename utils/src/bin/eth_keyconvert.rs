use clap::Parser;
use ethers::{types::Address, utils::to_checksum};
use secp256k1::{PublicKey, Secp256k1, SecretKey};
use std::path::PathBuf;
use tiny_keccak::{Hasher, Keccak};
use utility_deployer::config::{
    normalize_private_key, NetworkConfig, DEFAULT_CREDENTIALS_PATH, DEFAULT_NETWORK,
};

/// Show the public key and address behind a deployer key
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Private key; read from the credentials file when omitted
    private_key: Option<String>,

    /// Network name in the credentials file
    #[clap(short = 'n', long, default_value = DEFAULT_NETWORK)]
    network: String,

    /// Credentials file mapping network names to URL and PKEY
    #[clap(short = 'c', long, default_value = DEFAULT_CREDENTIALS_PATH)]
    credentials: PathBuf,
}

struct KeyInfo {
    public_key: [u8; 65],
    address: Address,
}

fn derive(private_key: &str) -> eyre::Result<KeyInfo> {
    let normalized = normalize_private_key(private_key)?;
    let private_key_bytes = hex::decode(&normalized[2..])?;

    let secp = Secp256k1::new();
    let secret_key = SecretKey::from_slice(&private_key_bytes)
        .map_err(|_| eyre::eyre!("Invalid private key: not a valid secp256k1 scalar"))?;
    let public_key = PublicKey::from_secret_key(&secp, &secret_key).serialize_uncompressed();

    // Address is the last 20 bytes of keccak256 over the key without its 0x04 tag
    let mut hasher = Keccak::v256();
    hasher.update(&public_key[1..]);
    let mut hash = [0u8; 32];
    hasher.finalize(&mut hash);

    Ok(KeyInfo {
        public_key,
        address: Address::from_slice(&hash[12..]),
    })
}

fn main() -> eyre::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    let private_key = match args.private_key {
        Some(key) => key,
        None => NetworkConfig::load(&args.credentials, &args.network)?
            .private_key()?
            .to_string(),
    };

    let info = derive(&private_key)?;
    println!("Public Key: 0x{}", hex::encode(info.public_key));
    println!("Ethereum Address: {}", to_checksum(&info.address, None));
    Ok(())
}
