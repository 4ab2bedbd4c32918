use std::path::PathBuf;

use clap::Parser;
use instasocial::config::ChainConfig;
use instasocial::utils::logging::{default_filters, init_logger};

use crate::deploy;

pub const DEFAULT_ARTIFACT: &str = "artifacts/contracts/InstaSocial.sol/InstaSocial.json";
pub const DEFAULT_OUT_DIR: &str = "apps/instasocial-client/deployment";
pub const PRIVATE_KEY_ENV: &str = "DEPLOYER_PRIVATE_KEY";

#[derive(Parser, Debug)]
#[command(author, version, about = "Deploy the InstaSocial contract", long_about = None)]
pub struct Args {
    /// JSON-RPC endpoint of the target network. Defaults to the MegaETH testnet endpoint
    #[arg(short, long)]
    pub rpc_url: Option<String>,

    /// Hex-encoded deployer key
    #[arg(short = 'k', long, env = PRIVATE_KEY_ENV, hide_env_values = true, conflicts_with = "key_file")]
    pub private_key: Option<String>,

    /// Read the deployer key from this file instead (development only)
    #[arg(long)]
    pub key_file: Option<PathBuf>,

    /// Compiled contract artifact holding `abi` and `bytecode`
    #[arg(short, long, default_value = DEFAULT_ARTIFACT)]
    pub artifact: PathBuf,

    /// Directory receiving contract-address.json and contract-abi.json
    #[arg(short, long, default_value = DEFAULT_OUT_DIR)]
    pub out_dir: PathBuf,

    /// Logging level for all subsystems {off, error, warn, info, debug, trace}
    #[arg(long = "loglevel", default_value = default_filters(env!("CARGO_PKG_NAME")))]
    pub log_level: String,
}

impl Args {
    pub fn chain(&self) -> ChainConfig {
        match &self.rpc_url {
            Some(url) => ChainConfig::megaeth_testnet().with_rpc_url(url.clone()),
            None => ChainConfig::megaeth_testnet(),
        }
    }
}

#[tokio::main]
pub async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logger(&args.log_level);
    deploy::run(&args).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rpc_override_replaces_the_default_endpoint() {
        let args = Args::try_parse_from(["instasocial-deploy", "--rpc-url", "http://127.0.0.1:8545"]).unwrap();
        assert_eq!(args.chain().primary_rpc_url(), Some("http://127.0.0.1:8545"));
        assert_eq!(args.artifact, PathBuf::from(DEFAULT_ARTIFACT));
        assert_eq!(args.out_dir, PathBuf::from(DEFAULT_OUT_DIR));
    }

    #[test]
    fn key_sources_are_exclusive() {
        let err = Args::try_parse_from(["instasocial-deploy", "--private-key", "0x01", "--key-file", "k"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }
}
