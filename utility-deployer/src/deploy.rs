use std::{fs::File, path::Path, sync::Arc};

use ethers::{
    abi::{
        token::{LenientTokenizer, Tokenizer},
        Abi, Token,
    },
    contract::ContractFactory,
    providers::Middleware,
    types::{transaction::eip2718::TypedTransaction, Address, H256, U256},
    utils::to_checksum,
};
use log::{debug, info};
use serde::Serialize;

use crate::{
    artifact::ContractArtifact,
    error::{DeployError, Result},
};

pub const DEFAULT_CONTRACT: &str = "UtilityContract";

#[derive(Debug, Clone)]
pub struct DeployRequest {
    pub constructor_args: Vec<String>,
    pub confirmations: usize,
    pub gas_limit: Option<U256>,
    pub legacy: bool,
}

impl Default for DeployRequest {
    fn default() -> Self {
        Self {
            constructor_args: Vec::new(),
            confirmations: 1,
            gas_limit: None,
            legacy: false,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Deployment {
    pub contract: String,
    pub address: Address,
    pub transaction_hash: H256,
    pub block_number: Option<u64>,
    pub gas_used: Option<U256>,
    pub deployer: Address,
}

impl Deployment {
    pub fn checksum_address(&self) -> String {
        to_checksum(&self.address, None)
    }

    /// The console line printed after a successful deployment.
    pub fn report(&self) -> String {
        format!(
            "{} deployed at address: {}",
            self.contract,
            self.checksum_address()
        )
    }

    pub fn save(&self, path: impl AsRef<Path>, network: &str, chain_id: u64) -> Result<()> {
        let record = serde_json::json!({
            "network": network,
            "chainId": chain_id,
            "deployment": self,
        });
        let file = File::create(path.as_ref())?;
        serde_json::to_writer_pretty(file, &record)?;
        info!("Deployment record saved to {}", path.as_ref().display());
        Ok(())
    }
}

/// Tokenizes string arguments against the constructor inputs.
pub fn encode_constructor_args(abi: &Abi, args: &[String]) -> Result<Vec<Token>> {
    let inputs = abi
        .constructor()
        .map(|c| c.inputs.as_slice())
        .unwrap_or_default();
    if inputs.len() != args.len() {
        return Err(DeployError::ArgumentCount {
            expected: inputs.len(),
            got: args.len(),
        });
    }

    inputs
        .iter()
        .zip(args)
        .map(|(param, value)| {
            LenientTokenizer::tokenize(&param.kind, value).map_err(|e| {
                DeployError::InvalidArgument {
                    name: param.name.clone(),
                    reason: e.to_string(),
                }
            })
        })
        .collect()
}

fn factory<M: Middleware>(client: Arc<M>, artifact: &ContractArtifact) -> ContractFactory<M> {
    ContractFactory::new(artifact.abi.clone(), artifact.bytecode.clone(), client)
}

/// Applies `--legacy` and `--gas-limit` to the deployment transaction.
fn apply_overrides(tx: &mut TypedTransaction, request: &DeployRequest) {
    if request.legacy {
        if let TypedTransaction::Eip1559(inner) = tx {
            let legacy = TypedTransaction::Legacy(inner.clone().into());
            *tx = legacy;
        }
    }
    if let Some(gas) = request.gas_limit {
        tx.set_gas(gas);
    }
}

/// Sends the deployment and waits for `request.confirmations` blocks.
pub async fn deploy<M: Middleware + 'static>(
    client: Arc<M>,
    artifact: &ContractArtifact,
    request: &DeployRequest,
) -> Result<Deployment> {
    let tokens = encode_constructor_args(&artifact.abi, &request.constructor_args)?;

    let mut deployer = factory(client, artifact)
        .deploy_tokens(tokens)
        .map_err(|e| DeployError::Contract(e.to_string()))?
        .confirmations(request.confirmations);
    apply_overrides(&mut deployer.tx, request);

    info!(
        "Deploying {} ({} bytes of creation code)",
        artifact.name,
        artifact.bytecode.len()
    );
    let (contract, receipt) = deployer
        .send_with_receipt()
        .await
        .map_err(|e| DeployError::Contract(e.to_string()))?;
    debug!("Deployment receipt: {:?}", receipt);

    Ok(Deployment {
        contract: artifact.name.clone(),
        address: contract.address(),
        transaction_hash: receipt.transaction_hash,
        block_number: receipt.block_number.map(|n| n.as_u64()),
        gas_used: receipt.gas_used,
        deployer: receipt.from,
    })
}

/// Runs the deployment as an `eth_call` and returns the gas estimate.
pub async fn simulate<M: Middleware + 'static>(
    client: Arc<M>,
    artifact: &ContractArtifact,
    request: &DeployRequest,
) -> Result<U256> {
    let tokens = encode_constructor_args(&artifact.abi, &request.constructor_args)?;
    let mut deployer = factory(client.clone(), artifact)
        .deploy_tokens(tokens)
        .map_err(|e| DeployError::Contract(e.to_string()))?;
    apply_overrides(&mut deployer.tx, request);

    deployer
        .call()
        .await
        .map_err(|e| DeployError::Contract(e.to_string()))?;
    client
        .estimate_gas(&deployer.tx, None)
        .await
        .map_err(|e| DeployError::Provider(e.to_string()))
}

/// Address created by a deployment transaction, `None` if the transaction
/// did not create a contract.
pub async fn lookup_deployment<M: Middleware>(client: &M, tx_hash: H256) -> Result<Option<Address>> {
    let receipt = client
        .get_transaction_receipt(tx_hash)
        .await
        .map_err(|e| DeployError::Provider(e.to_string()))?
        .ok_or(DeployError::ReceiptNotFound(tx_hash))?;
    Ok(receipt.contract_address)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeCheck {
    Missing,
    Matches { len: usize },
    Differs { deployed_len: usize, expected_len: usize, first_mismatch: usize },
}

/// Compares on-chain runtime code at `address` with the artifact.
pub async fn verify_deployment<M: Middleware>(
    client: &M,
    address: Address,
    artifact: &ContractArtifact,
) -> Result<CodeCheck> {
    let expected = artifact.deployed_bytecode()?;
    let deployed = client
        .get_code(address, None)
        .await
        .map_err(|e| DeployError::Provider(e.to_string()))?;

    if deployed.is_empty() {
        return Ok(CodeCheck::Missing);
    }
    if deployed == expected {
        return Ok(CodeCheck::Matches { len: deployed.len() });
    }

    let first_mismatch = deployed
        .iter()
        .zip(expected.iter())
        .position(|(d, e)| d != e)
        .unwrap_or_else(|| deployed.len().min(expected.len()));
    Ok(CodeCheck::Differs {
        deployed_len: deployed.len(),
        expected_len: expected.len(),
        first_mismatch,
    })
}
