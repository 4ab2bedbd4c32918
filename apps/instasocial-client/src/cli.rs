use std::path::PathBuf;

use clap::Parser;
use instasocial::utils::logging::default_filters;
use instasocial::wallet::DEV_KEY_FILE;

#[derive(Parser, Debug)]
#[command(author, version, about = "InstaSocial terminal client", long_about = None)]
pub struct Args {
    /// JSON-RPC endpoint to use instead of the network's default. Usage: <https://host:port>
    #[arg(short, long, env = "INSTASOCIAL_RPC_URL")]
    pub rpc_url: Option<String>,

    /// File holding the hex-encoded signing key, used when INSTASOCIAL_PRIVATE_KEY is not set
    #[arg(short, long, default_value = DEV_KEY_FILE)]
    pub key_file: PathBuf,

    /// Seconds between background feed refreshes
    #[arg(long, default_value_t = 3)]
    pub poll_secs: u64,

    /// Logging level for all subsystems {off, error, warn, info, debug, trace}
    ///  -- You may also specify `<subsystem>=<level>,<subsystem2>=<level>,...` to set the log level for individual subsystems
    #[arg(long = "loglevel", default_value = default_filters(env!("CARGO_PKG_NAME")))]
    pub log_level: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let args = Args::try_parse_from(["instasocial-client"]).unwrap();
        assert_eq!(args.key_file, PathBuf::from(DEV_KEY_FILE));
        assert_eq!(args.poll_secs, 3);
        assert!(args.log_level.contains("instasocial_client=debug"));
    }
}
