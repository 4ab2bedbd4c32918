//! Wallet provider boundary and the session manager that drives it.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use alloy::network::EthereumWallet;
use alloy::primitives::Address;
use alloy::providers::{Provider, ProviderBuilder};
use alloy::signers::local::PrivateKeySigner;
use async_trait::async_trait;
use log::{debug, info, warn};
use url::Url;

use crate::config::ChainConfig;
use crate::error::WalletError;

/// Environment variable consulted before the key file.
pub const PRIVATE_KEY_ENV: &str = "INSTASOCIAL_PRIVATE_KEY";
/// Development key file, hex encoded. Never use it for real funds.
pub const DEV_KEY_FILE: &str = ".instasocial-dev-key";

/// Authorization context bound to one account on the wallet's active network.
#[derive(Clone)]
pub struct SigningHandle {
    account: Address,
    wallet: EthereumWallet,
    rpc_url: Url,
}

impl SigningHandle {
    pub fn new(account: Address, wallet: EthereumWallet, rpc_url: Url) -> Self {
        Self { account, wallet, rpc_url }
    }

    pub fn account(&self) -> Address {
        self.account
    }

    pub fn wallet(&self) -> &EthereumWallet {
        &self.wallet
    }

    pub fn rpc_url(&self) -> &Url {
        &self.rpc_url
    }
}

impl fmt::Debug for SigningHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningHandle").field("account", &self.account).field("rpc_url", &self.rpc_url.as_str()).finish()
    }
}

#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Accounts already authorized for this client. Never prompts.
    async fn authorized_accounts(&self) -> Result<Vec<Address>, WalletError>;

    /// Ask for account access, prompting if necessary.
    async fn request_accounts(&self) -> Result<Vec<Address>, WalletError>;

    /// Make `chain_id` the active network. Unknown chains fail with [`WalletError::UnrecognizedChain`].
    async fn switch_chain(&self, chain_id: u64) -> Result<(), WalletError>;

    async fn add_chain(&self, chain: &ChainConfig) -> Result<(), WalletError>;

    async fn signing_handle(&self, account: Address) -> Result<SigningHandle, WalletError>;
}

#[derive(Clone, Debug)]
pub struct Session {
    pub account: Address,
    pub handle: SigningHandle,
}

pub struct SessionManager {
    wallet: Option<Arc<dyn WalletProvider>>,
    chain: ChainConfig,
}

impl SessionManager {
    pub fn new(wallet: Option<Arc<dyn WalletProvider>>, chain: ChainConfig) -> Self {
        Self { wallet, chain }
    }

    /// Re-establish a session without prompting when the wallet already authorized an account.
    pub async fn restore(&self) -> Result<Option<Session>, WalletError> {
        let Some(wallet) = self.wallet.as_ref() else {
            return Ok(None);
        };
        if wallet.authorized_accounts().await?.is_empty() {
            debug!("No previously authorized account, waiting for explicit connect");
            return Ok(None);
        }
        self.connect().await.map(Some)
    }

    pub async fn connect(&self) -> Result<Session, WalletError> {
        let wallet = self.wallet.as_ref().ok_or(WalletError::ProviderUnavailable)?;
        let accounts = wallet.request_accounts().await?;
        let account = accounts.first().copied().ok_or(WalletError::NoAccounts)?;
        self.ensure_chain(wallet.as_ref()).await?;
        let handle = wallet.signing_handle(account).await?;
        info!("Wallet session established for {account} on {}", self.chain.chain_name);
        Ok(Session { account, handle })
    }

    /// Switch to the target chain, registering it once if the wallet does not know it.
    async fn ensure_chain(&self, wallet: &dyn WalletProvider) -> Result<(), WalletError> {
        match wallet.switch_chain(self.chain.chain_id).await {
            Ok(()) => Ok(()),
            Err(WalletError::UnrecognizedChain(chain_id)) => {
                info!("Chain {chain_id:#x} unknown to wallet, registering {}", self.chain.chain_name);
                wallet.add_chain(&self.chain).await?;
                wallet.switch_chain(self.chain.chain_id).await
            }
            Err(e) => Err(e),
        }
    }
}

/// Wallet provider backed by a local development key.
pub struct LocalWallet {
    signer: PrivateKeySigner,
    networks: Mutex<HashMap<u64, ChainConfig>>,
    active_chain: Mutex<Option<u64>>,
    authorized: AtomicBool,
}

impl LocalWallet {
    pub fn from_hex_key(key: &str) -> Result<Self, WalletError> {
        let signer = key.trim().parse::<PrivateKeySigner>().map_err(|e| WalletError::InvalidKey(e.to_string()))?;
        Ok(Self {
            signer,
            networks: Mutex::new(HashMap::new()),
            active_chain: Mutex::new(None),
            authorized: AtomicBool::new(false),
        })
    }

    /// Look for a key in [`PRIVATE_KEY_ENV`] and then in `key_file`. `None` means no wallet is present.
    /// A key found on disk or in the environment counts as a previously authorized account.
    pub fn discover(key_file: &Path) -> Result<Option<Self>, WalletError> {
        let key = match std::env::var(PRIVATE_KEY_ENV) {
            Ok(key) if !key.trim().is_empty() => key,
            _ => match std::fs::read_to_string(key_file) {
                Ok(key) => key,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
                Err(e) => return Err(WalletError::InvalidKey(format!("{}: {e}", key_file.display()))),
            },
        };
        let wallet = Self::from_hex_key(&key)?;
        wallet.authorized.store(true, Ordering::Relaxed);
        Ok(Some(wallet))
    }

    /// Pre-register a network, as if the user had added it earlier.
    pub fn with_network(self, chain: ChainConfig) -> Self {
        if let Ok(mut networks) = self.networks.lock() {
            networks.insert(chain.chain_id, chain);
        }
        self
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }

    fn network(&self, chain_id: u64) -> Option<ChainConfig> {
        self.networks.lock().ok().and_then(|networks| networks.get(&chain_id).cloned())
    }

    fn active_rpc_url(&self) -> Result<Url, WalletError> {
        let chain_id = self
            .active_chain
            .lock()
            .ok()
            .and_then(|active| *active)
            .ok_or_else(|| WalletError::Rpc("no active network".into()))?;
        let chain = self.network(chain_id).ok_or(WalletError::UnrecognizedChain(chain_id))?;
        rpc_url_of(&chain)
    }
}

fn rpc_url_of(chain: &ChainConfig) -> Result<Url, WalletError> {
    let url = chain.primary_rpc_url().ok_or_else(|| WalletError::Rpc(format!("{} has no RPC endpoint", chain.chain_name)))?;
    Url::parse(url).map_err(|e| WalletError::Rpc(format!("invalid RPC url {url}: {e}")))
}

#[async_trait]
impl WalletProvider for LocalWallet {
    async fn authorized_accounts(&self) -> Result<Vec<Address>, WalletError> {
        if self.authorized.load(Ordering::Relaxed) {
            Ok(vec![self.address()])
        } else {
            Ok(Vec::new())
        }
    }

    async fn request_accounts(&self) -> Result<Vec<Address>, WalletError> {
        self.authorized.store(true, Ordering::Relaxed);
        Ok(vec![self.address()])
    }

    async fn switch_chain(&self, chain_id: u64) -> Result<(), WalletError> {
        let chain = self.network(chain_id).ok_or(WalletError::UnrecognizedChain(chain_id))?;
        let url = rpc_url_of(&chain)?;
        let provider = ProviderBuilder::new().connect_http(url.clone());
        let actual = provider.get_chain_id().await.map_err(|e| {
            warn!("Chain id query against {url} failed: {e}");
            WalletError::Rpc(e.to_string())
        })?;
        if actual != chain_id {
            return Err(WalletError::ChainMismatch { expected: chain_id, actual });
        }
        if let Ok(mut active) = self.active_chain.lock() {
            *active = Some(chain_id);
        }
        debug!("Switched to {} ({chain_id:#x})", chain.chain_name);
        Ok(())
    }

    async fn add_chain(&self, chain: &ChainConfig) -> Result<(), WalletError> {
        rpc_url_of(chain)?;
        let mut networks = self.networks.lock().map_err(|_| WalletError::Rpc("network registry poisoned".into()))?;
        networks.insert(chain.chain_id, chain.clone());
        info!("Registered network {} ({})", chain.chain_name, chain.chain_id_hex());
        Ok(())
    }

    async fn signing_handle(&self, account: Address) -> Result<SigningHandle, WalletError> {
        if account != self.address() {
            return Err(WalletError::NoAccounts);
        }
        let rpc_url = self.active_rpc_url()?;
        Ok(SigningHandle::new(account, EthereumWallet::from(self.signer.clone()), rpc_url))
    }
}
