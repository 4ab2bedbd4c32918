use std::fs;
use std::path::Path;

use alloy::network::EthereumWallet;
use alloy::primitives::utils::format_ether;
use alloy::providers::{Provider, ProviderBuilder};
use alloy::signers::local::PrivateKeySigner;
use anyhow::{anyhow, bail, Context};
use chrono::Utc;
use instasocial::config::ChainConfig;
use instasocial::deployment::{publish, write_outputs, ContractArtifact, DeploymentInfo, CONTRACT_NAME};
use log::{info, warn};

use crate::cli::{Args, PRIVATE_KEY_ENV};

/// Resolve the deployer key from the flag/environment first, then the key file.
pub fn load_signer(private_key: Option<&str>, key_file: Option<&Path>) -> anyhow::Result<PrivateKeySigner> {
    let raw = match (private_key, key_file) {
        (Some(key), _) => key.to_string(),
        (None, Some(path)) => {
            fs::read_to_string(path).with_context(|| format!("reading deployer key from {}", path.display()))?
        }
        (None, None) => bail!("no deployer key: pass --private-key, set {PRIVATE_KEY_ENV} or use --key-file"),
    };
    raw.trim().parse::<PrivateKeySigner>().map_err(|e| anyhow!("invalid deployer key: {e}"))
}

pub async fn run(args: &Args) -> anyhow::Result<()> {
    let chain = args.chain();
    let signer = load_signer(args.private_key.as_deref(), args.key_file.as_deref())?;
    let deployer = signer.address();

    let rpc_url = chain.primary_rpc_url().ok_or_else(|| anyhow!("{} has no RPC endpoint", chain.chain_name))?;
    let provider =
        ProviderBuilder::new().wallet(EthereumWallet::from(signer)).connect_http(rpc_url.parse()?).erased();

    let remote_chain = provider.get_chain_id().await.context("querying chain id")?;
    if remote_chain != chain.chain_id {
        warn!("{rpc_url} reports chain {remote_chain}, descriptor will still say {}", chain.chain_id);
    }

    println!("Deploying {CONTRACT_NAME} to {}...", chain.chain_name);
    println!("Deployer address: {deployer}");
    let balance = provider.get_balance(deployer).await.context("querying deployer balance")?;
    println!("Deployer balance: {} {}", format_ether(balance), chain.native_currency.symbol);

    let artifact = ContractArtifact::load(&args.artifact)?;
    info!("Loaded {} ({} bytes of bytecode)", artifact.contract_name, artifact.bytecode.len());

    let address = publish(&provider, &artifact).await.context("deployment failed")?;
    println!("{CONTRACT_NAME} deployed to: {address}");

    let info = DeploymentInfo::new(CONTRACT_NAME, address, &chain, deployer, Utc::now());
    let (address_path, abi_path) = write_outputs(&args.out_dir, &info, &artifact.abi)?;
    println!("Deployment info saved to {}", address_path.display());
    println!("ABI saved to {}", abi_path.display());

    print_explorer_link(&chain, &info);
    Ok(())
}

fn print_explorer_link(chain: &ChainConfig, info: &DeploymentInfo) {
    if let Some(url) = chain.explorer_address_url(info.address) {
        println!("View on explorer: {url}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    #[test]
    fn flag_key_wins_over_file() {
        let signer = load_signer(Some(DEV_KEY), Some(Path::new("/nonexistent"))).unwrap();
        assert_eq!(signer.address().to_string().to_lowercase(), "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266");
    }

    #[test]
    fn key_file_is_trimmed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deployer.key");
        fs::write(&path, format!("{DEV_KEY}\n")).unwrap();
        assert!(load_signer(None, Some(&path)).is_ok());
    }

    #[test]
    fn missing_key_is_an_error() {
        let err = load_signer(None, None).unwrap_err();
        assert!(err.to_string().contains(PRIVATE_KEY_ENV));
        assert!(load_signer(Some("not-a-key"), None).is_err());
    }
}
