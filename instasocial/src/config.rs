//! Static network descriptor and client tunables.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Native currency descriptor as wallets expect it when registering a network.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

/// Everything a wallet needs to add and switch to the target chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainConfig {
    pub chain_id: u64,
    pub chain_name: String,
    pub native_currency: NativeCurrency,
    pub rpc_urls: Vec<String>,
    pub block_explorer_urls: Vec<String>,
}

impl ChainConfig {
    pub const MEGAETH_TESTNET_CHAIN_ID: u64 = 6342;

    pub fn megaeth_testnet() -> Self {
        Self {
            chain_id: Self::MEGAETH_TESTNET_CHAIN_ID,
            chain_name: "MegaETH Testnet".to_string(),
            native_currency: NativeCurrency { name: "ETH".to_string(), symbol: "ETH".to_string(), decimals: 18 },
            rpc_urls: vec!["https://carrot.megaeth.com/rpc".to_string()],
            block_explorer_urls: vec!["https://megaexplorer.xyz".to_string()],
        }
    }

    /// Chain id in the `0x`-prefixed hex form used by wallet RPC methods.
    pub fn chain_id_hex(&self) -> String {
        format!("{:#x}", self.chain_id)
    }

    pub fn primary_rpc_url(&self) -> Option<&str> {
        self.rpc_urls.first().map(String::as_str)
    }

    pub fn explorer_address_url(&self, address: impl std::fmt::Display) -> Option<String> {
        self.block_explorer_urls.first().map(|base| format!("{}/address/{address}", base.trim_end_matches('/')))
    }

    /// Replace the RPC endpoint list with a single override, keeping the rest of the descriptor.
    pub fn with_rpc_url(mut self, url: impl Into<String>) -> Self {
        self.rpc_urls = vec![url.into()];
        self
    }
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self::megaeth_testnet()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
    poll_interval: Duration,
    feed_page_size: u64,
    username_max_len: usize,
    content_max_len: usize,
}

impl ClientConfig {
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);
    pub const DEFAULT_FEED_PAGE_SIZE: u64 = 20;
    pub const DEFAULT_USERNAME_MAX_LEN: usize = 20;
    pub const DEFAULT_CONTENT_MAX_LEN: usize = 500;

    /// Poll interval is clamped to at least 100ms so a bad override cannot spin the RPC endpoint.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval.max(Duration::from_millis(100));
        self
    }

    pub fn with_feed_page_size(mut self, size: u64) -> Self {
        self.feed_page_size = size.max(1);
        self
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn feed_page_size(&self) -> u64 {
        self.feed_page_size
    }

    pub fn username_max_len(&self) -> usize {
        self.username_max_len
    }

    pub fn content_max_len(&self) -> usize {
        self.content_max_len
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            poll_interval: Self::DEFAULT_POLL_INTERVAL,
            feed_page_size: Self::DEFAULT_FEED_PAGE_SIZE,
            username_max_len: Self::DEFAULT_USERNAME_MAX_LEN,
            content_max_len: Self::DEFAULT_CONTENT_MAX_LEN,
        }
    }
}
