//! Contract publication and the build-time descriptor files the client embeds.

use std::fs;
use std::path::{Path, PathBuf};

use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, Bytes};
use alloy::providers::{DynProvider, Provider};
use alloy::rpc::types::TransactionRequest;
use chrono::{DateTime, SecondsFormat, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ChainConfig;
use crate::error::ContractError;

pub const CONTRACT_NAME: &str = "InstaSocial";
pub const ADDRESS_FILE: &str = "contract-address.json";
pub const ABI_FILE: &str = "contract-abi.json";

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("artifact for {0} has no deployable bytecode")]
    MissingBytecode(String),
}

/// Written next to the client sources after a successful deployment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentInfo {
    pub contract: String,
    pub address: Address,
    pub network: String,
    pub chain_id: u64,
    pub deployer: Address,
    /// RFC 3339, UTC.
    pub timestamp: String,
}

impl DeploymentInfo {
    pub fn new(contract: &str, address: Address, chain: &ChainConfig, deployer: Address, at: DateTime<Utc>) -> Self {
        Self {
            contract: contract.to_string(),
            address,
            network: chain.chain_name.clone(),
            chain_id: chain.chain_id,
            deployer,
            timestamp: at.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// The parts of a Hardhat-style compilation artifact the deployment needs.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractArtifact {
    pub contract_name: String,
    pub abi: serde_json::Value,
    pub bytecode: Bytes,
}

impl ContractArtifact {
    pub fn load(path: &Path) -> Result<Self, ArtifactError> {
        let raw = fs::read_to_string(path).map_err(|source| ArtifactError::Io { path: path.to_path_buf(), source })?;
        let artifact: Self =
            serde_json::from_str(&raw).map_err(|source| ArtifactError::Json { path: path.to_path_buf(), source })?;
        if artifact.bytecode.is_empty() {
            return Err(ArtifactError::MissingBytecode(artifact.contract_name));
        }
        Ok(artifact)
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), ArtifactError> {
    let json =
        serde_json::to_string_pretty(value).map_err(|source| ArtifactError::Json { path: path.to_path_buf(), source })?;
    fs::write(path, json).map_err(|source| ArtifactError::Io { path: path.to_path_buf(), source })
}

/// Write the address descriptor and ABI copy into `out_dir`, creating it if needed.
/// Returns the two paths written, address file first.
pub fn write_outputs(
    out_dir: &Path,
    info: &DeploymentInfo,
    abi: &serde_json::Value,
) -> Result<(PathBuf, PathBuf), ArtifactError> {
    fs::create_dir_all(out_dir).map_err(|source| ArtifactError::Io { path: out_dir.to_path_buf(), source })?;
    let address_path = out_dir.join(ADDRESS_FILE);
    let abi_path = out_dir.join(ABI_FILE);
    write_json(&address_path, info)?;
    write_json(&abi_path, abi)?;
    debug!("Wrote {} and {}", address_path.display(), abi_path.display());
    Ok((address_path, abi_path))
}

/// Send the creation transaction and wait for its receipt.
pub async fn publish(provider: &DynProvider, artifact: &ContractArtifact) -> Result<Address, ContractError> {
    let tx = TransactionRequest::default().with_deploy_code(artifact.bytecode.clone());
    let pending = provider.send_transaction(tx).await?;
    info!("Deployment of {} submitted: {}", artifact.contract_name, pending.tx_hash());
    let receipt = pending.get_receipt().await?;
    if !receipt.status() {
        return Err(ContractError::Reverted { reason: None });
    }
    receipt.contract_address.ok_or_else(|| ContractError::Decode("deployment receipt has no contract address".into()))
}
