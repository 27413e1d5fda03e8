use std::sync::Arc;

use ethers::{
    middleware::SignerMiddleware,
    providers::{Http, Middleware, Provider},
    signers::{LocalWallet, Signer},
    types::{Address, U256},
    utils::{format_ether, to_checksum},
};
use log::{info, warn};

use crate::{
    config::NetworkConfig,
    error::{DeployError, Result},
};

pub type DeployClient = SignerMiddleware<Provider<Http>, LocalWallet>;

/// Read-only provider for lookups that don't need a key.
pub fn provider(network: &NetworkConfig) -> Result<Provider<Http>> {
    Ok(Provider::<Http>::try_from(network.rpc_url.as_str())?)
}

/// Builds the signing client. Without `chain_id` the node is asked for it.
pub async fn connect(network: &NetworkConfig, chain_id: Option<u64>) -> Result<Arc<DeployClient>> {
    let provider = provider(network)?;

    let chain_id = match chain_id {
        Some(id) => id,
        None => provider.get_chainid().await?.as_u64(),
    };
    info!("Connected to {} (chain ID: {})", network.name, chain_id);

    let wallet = network.signer()?.with_chain_id(chain_id);
    info!("Deployer address: {}", to_checksum(&wallet.address(), None));

    Ok(Arc::new(SignerMiddleware::new(provider, wallet)))
}

/// Logs the balance of `address`. A zero balance only warns; the node
/// decides whether the deployment can be paid for.
pub async fn report_balance<M: Middleware>(client: &M, address: Address) -> Result<U256> {
    let balance = client
        .get_balance(address, None)
        .await
        .map_err(|e| DeployError::Provider(e.to_string()))?;
    if balance.is_zero() {
        warn!("Deployer {} has no funds", to_checksum(&address, None));
    } else {
        info!("Deployer balance: {} ETH", format_ether(balance));
    }
    Ok(balance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Credentials, EnvOverrides};

    fn local_network() -> NetworkConfig {
        let creds = Credentials::from_json(
            r#"{ "LOCAL": { "URL": "http://127.0.0.1:8545", "PKEY": "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80" } }"#,
        )
        .unwrap();
        NetworkConfig::resolve("LOCAL", Some(&creds), &EnvOverrides::default()).unwrap()
    }

    #[tokio::test]
    async fn binds_wallet_to_given_chain_id() {
        let client = connect(&local_network(), Some(1337)).await.unwrap();
        assert_eq!(client.signer().chain_id(), 1337);
        assert_eq!(
            to_checksum(&client.address(), None),
            "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"
        );
    }

    #[test]
    fn balance_is_read_from_the_node() {
        let (provider, mock) = Provider::mocked();
        mock.push::<U256, _>(U256::exp10(18)).unwrap();

        let balance =
            tokio_test::block_on(report_balance(&provider, Address::zero())).unwrap();
        assert_eq!(format_ether(balance), "1.000000000000000000");
    }
}
