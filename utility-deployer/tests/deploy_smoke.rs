//! Live deployment against a real node. Needs a funded key and compiled
//! artifacts; run with `cargo test -- --ignored` and optionally set
//! `SMOKE_NETWORK`, `SMOKE_CREDENTIALS` and `SMOKE_ARTIFACTS`.

use std::env;

use ethers::{providers::Middleware, utils::to_checksum};
use utility_deployer::{
    client,
    config::{NetworkConfig, DEFAULT_CREDENTIALS_PATH, DEFAULT_NETWORK},
    deploy::{self, DeployRequest, DEFAULT_CONTRACT},
    ContractArtifact,
};

#[tokio::test]
#[ignore = "needs a reachable RPC endpoint and a funded key"]
async fn deploys_utility_contract_and_reports_checksummed_address() -> eyre::Result<()> {
    let network_name = env::var("SMOKE_NETWORK").unwrap_or_else(|_| DEFAULT_NETWORK.to_string());
    let credentials =
        env::var("SMOKE_CREDENTIALS").unwrap_or_else(|_| DEFAULT_CREDENTIALS_PATH.to_string());
    let artifacts = env::var("SMOKE_ARTIFACTS").unwrap_or_else(|_| "artifacts".to_string());

    let network = NetworkConfig::load(&credentials, &network_name)?;
    let artifact = ContractArtifact::locate(&artifacts, DEFAULT_CONTRACT)?;
    let client = client::connect(&network, None).await?;

    let deployment = deploy::deploy(client.clone(), &artifact, &DeployRequest::default()).await?;
    println!("{}", deployment.report());

    let address = deployment.checksum_address();
    assert!(!deployment.address.is_zero());
    assert_eq!(address.len(), 42);
    assert_eq!(address, to_checksum(&deployment.address, None));

    let code = client.get_code(deployment.address, None).await?;
    assert!(!code.is_empty());
    Ok(())
}
