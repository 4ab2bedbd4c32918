use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use alloy::network::EthereumWallet;
use alloy::primitives::{Address, TxHash, U256};
use alloy::signers::local::PrivateKeySigner;
use async_trait::async_trait;
use instasocial::config::{ChainConfig, ClientConfig};
use instasocial::contract::{ContractConnector, SocialContract};
use instasocial::controller::{AmountPrompt, Controller};
use instasocial::error::{ContractError, WalletError};
use instasocial::model::{Post, PostId, Profile};
use instasocial::wallet::{SessionManager, SigningHandle, WalletProvider};
use url::Url;

/// Well-known local development keys (anvil/hardhat accounts 0 and 1).
pub const ALICE_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
pub const BOB_KEY: &str = "0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d";

pub const GENESIS_TIMESTAMP: u64 = 1_700_000_000;

pub fn signer(key: &str) -> PrivateKeySigner {
    key.parse().expect("valid development key")
}

pub fn address_of(key: &str) -> Address {
    signer(key).address()
}

/// A write observed by the mock contract.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WriteCall {
    CreateProfile { from: Address, username: String, bio: String, avatar_uri: String },
    CreatePost { from: Address, content: String, image_uri: String },
    Like { from: Address, id: PostId },
    Tip { from: Address, id: PostId, value: U256 },
    Mint { from: Address, fee: U256 },
}

#[derive(Default)]
struct ChainState {
    profiles: HashMap<Address, Profile>,
    /// Oldest first; ids are 1-based positions.
    posts: Vec<Post>,
    likers: HashMap<PostId, HashSet<Address>>,
    failing_posts: HashSet<PostId>,
    fail_listing: bool,
    /// Outcome for the next write: `Some(reason)` reverts it.
    next_revert: Option<Option<String>>,
    writes: Vec<WriteCall>,
    next_nft: u64,
    tx_counter: u64,
}

/// In-memory stand-in for the deployed contract, shared by every account bound to it.
#[derive(Clone, Default)]
pub struct MockChain {
    state: Arc<Mutex<ChainState>>,
    listing_calls: Arc<AtomicUsize>,
}

impl MockChain {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ChainState> {
        self.state.lock().expect("mock chain lock")
    }

    pub fn with_profile(self, account: Address, username: &str) -> Self {
        self.lock().profiles.insert(
            account,
            Profile {
                username: username.to_string(),
                bio: String::new(),
                avatar_uri: String::new(),
                nft_id: None,
                followers: 0,
                following: 0,
                post_count: 0,
            },
        );
        self
    }

    /// Publish a post directly, as another client would.
    pub fn seed_post(&self, author: Address, content: &str) -> PostId {
        let mut state = self.lock();
        let username = state.profiles.get(&author).map(|p| p.username.clone()).unwrap_or_default();
        push_post(&mut state, author, username, content, "")
    }

    pub fn fail_post(&self, id: PostId) {
        self.lock().failing_posts.insert(id);
    }

    pub fn fail_listing(&self, fail: bool) {
        self.lock().fail_listing = fail;
    }

    pub fn revert_next(&self, reason: Option<&str>) {
        self.lock().next_revert = Some(reason.map(str::to_string));
    }

    pub fn writes(&self) -> Vec<WriteCall> {
        self.lock().writes.clone()
    }

    pub fn listing_calls(&self) -> usize {
        self.listing_calls.load(Ordering::SeqCst)
    }

    pub fn profile(&self, account: Address) -> Option<Profile> {
        self.lock().profiles.get(&account).cloned()
    }
}

fn push_post(state: &mut ChainState, author: Address, username: String, content: &str, image_uri: &str) -> PostId {
    let id = state.posts.len() as PostId + 1;
    state.posts.push(Post {
        id,
        author,
        username,
        content: content.to_string(),
        image_uri: image_uri.to_string(),
        timestamp: GENESIS_TIMESTAMP + id,
        likes: 0,
        tips: U256::ZERO,
        comment_count: 0,
        liked_by_viewer: false,
    });
    if let Some(profile) = state.profiles.get_mut(&author) {
        profile.post_count += 1;
    }
    id
}

fn not_found(what: &str) -> ContractError {
    ContractError::Reverted { reason: Some(format!("{what} does not exist")) }
}

/// The mock chain seen through one account.
pub struct MockContract {
    account: Address,
    chain: MockChain,
}

impl MockContract {
    /// Applies `write` unless a revert was scheduled, recording the attempt either way.
    fn write(
        &self,
        call: WriteCall,
        apply: impl FnOnce(&mut ChainState) -> Result<(), ContractError>,
    ) -> Result<TxHash, ContractError> {
        let mut state = self.chain.lock();
        state.writes.push(call);
        if let Some(reason) = state.next_revert.take() {
            return Err(ContractError::Reverted { reason });
        }
        apply(&mut state)?;
        state.tx_counter += 1;
        Ok(TxHash::left_padding_from(&state.tx_counter.to_be_bytes()))
    }
}

#[async_trait]
impl SocialContract for MockContract {
    async fn get_profile(&self, account: Address) -> Result<Profile, ContractError> {
        self.chain.lock().profiles.get(&account).cloned().ok_or_else(|| not_found("Profile"))
    }

    async fn get_recent_posts(&self, count: u64, offset: u64) -> Result<Vec<PostId>, ContractError> {
        self.chain.listing_calls.fetch_add(1, Ordering::SeqCst);
        let state = self.chain.lock();
        if state.fail_listing {
            return Err(ContractError::Transport("connection refused".into()));
        }
        Ok(state.posts.iter().rev().skip(offset as usize).take(count as usize).map(|p| p.id).collect())
    }

    async fn get_post(&self, id: PostId) -> Result<Post, ContractError> {
        let state = self.chain.lock();
        if state.failing_posts.contains(&id) {
            return Err(ContractError::Transport(format!("post {id} timed out")));
        }
        let mut post = state.posts.iter().find(|p| p.id == id).cloned().ok_or_else(|| not_found("Post"))?;
        post.liked_by_viewer = state.likers.get(&id).is_some_and(|likers| likers.contains(&self.account));
        Ok(post)
    }

    async fn create_profile(&self, username: &str, bio: &str, avatar_uri: &str) -> Result<TxHash, ContractError> {
        let from = self.account;
        let call = WriteCall::CreateProfile {
            from,
            username: username.to_string(),
            bio: bio.to_string(),
            avatar_uri: avatar_uri.to_string(),
        };
        self.write(call, |state| {
            if state.profiles.contains_key(&from) {
                return Err(ContractError::Reverted { reason: Some("Profile already exists".into()) });
            }
            state.profiles.insert(
                from,
                Profile {
                    username: username.to_string(),
                    bio: bio.to_string(),
                    avatar_uri: avatar_uri.to_string(),
                    nft_id: None,
                    followers: 0,
                    following: 0,
                    post_count: 0,
                },
            );
            Ok(())
        })
    }

    async fn create_post(&self, content: &str, image_uri: &str) -> Result<TxHash, ContractError> {
        let from = self.account;
        let call = WriteCall::CreatePost { from, content: content.to_string(), image_uri: image_uri.to_string() };
        self.write(call, |state| {
            let username = state.profiles.get(&from).map(|p| p.username.clone()).ok_or_else(|| not_found("Profile"))?;
            push_post(state, from, username, content, image_uri);
            Ok(())
        })
    }

    async fn like_post(&self, id: PostId) -> Result<TxHash, ContractError> {
        let from = self.account;
        self.write(WriteCall::Like { from, id }, |state| {
            if !state.likers.entry(id).or_default().insert(from) {
                return Err(ContractError::Reverted { reason: Some("Already liked".into()) });
            }
            let post = state.posts.iter_mut().find(|p| p.id == id).ok_or_else(|| not_found("Post"))?;
            post.likes += 1;
            Ok(())
        })
    }

    async fn tip_post(&self, id: PostId, value: U256) -> Result<TxHash, ContractError> {
        let from = self.account;
        self.write(WriteCall::Tip { from, id, value }, |state| {
            let post = state.posts.iter_mut().find(|p| p.id == id).ok_or_else(|| not_found("Post"))?;
            post.tips += value;
            Ok(())
        })
    }

    async fn mint_profile_nft(&self, fee: U256) -> Result<TxHash, ContractError> {
        let from = self.account;
        self.write(WriteCall::Mint { from, fee }, |state| {
            state.next_nft += 1;
            let nft = state.next_nft;
            let profile = state.profiles.get_mut(&from).ok_or_else(|| not_found("Profile"))?;
            profile.nft_id = Some(nft);
            Ok(())
        })
    }
}

pub struct MockConnector {
    chain: MockChain,
}

impl MockConnector {
    pub fn new(chain: MockChain) -> Self {
        Self { chain }
    }
}

impl ContractConnector for MockConnector {
    fn bind(&self, handle: &SigningHandle) -> Result<Arc<dyn SocialContract>, ContractError> {
        Ok(Arc::new(MockContract { account: handle.account(), chain: self.chain.clone() }))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SwitchBehavior {
    /// Known chains switch, unknown ones answer 4902.
    Normal,
    /// Every switch answers 4902, even after the chain was added.
    AlwaysUnrecognized,
    /// The user declines the switch.
    Reject,
}

/// Wallet provider double that records the network requests it receives.
pub struct MockWallet {
    signer: PrivateKeySigner,
    authorized: AtomicBool,
    known_chains: Mutex<HashSet<u64>>,
    switch: SwitchBehavior,
    switch_calls: AtomicUsize,
    add_calls: AtomicUsize,
}

impl MockWallet {
    pub fn new(key: &str) -> Self {
        Self {
            signer: signer(key),
            authorized: AtomicBool::new(false),
            known_chains: Mutex::new(HashSet::new()),
            switch: SwitchBehavior::Normal,
            switch_calls: AtomicUsize::new(0),
            add_calls: AtomicUsize::new(0),
        }
    }

    /// The account was authorized in an earlier run.
    pub fn authorized(self) -> Self {
        self.authorized.store(true, Ordering::SeqCst);
        self
    }

    pub fn knowing(self, chain_id: u64) -> Self {
        self.known_chains.lock().expect("known chains lock").insert(chain_id);
        self
    }

    pub fn with_switch(mut self, behavior: SwitchBehavior) -> Self {
        self.switch = behavior;
        self
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }

    pub fn switch_calls(&self) -> usize {
        self.switch_calls.load(Ordering::SeqCst)
    }

    pub fn add_calls(&self) -> usize {
        self.add_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WalletProvider for MockWallet {
    async fn authorized_accounts(&self) -> Result<Vec<Address>, WalletError> {
        Ok(if self.authorized.load(Ordering::SeqCst) { vec![self.address()] } else { vec![] })
    }

    async fn request_accounts(&self) -> Result<Vec<Address>, WalletError> {
        self.authorized.store(true, Ordering::SeqCst);
        Ok(vec![self.address()])
    }

    async fn switch_chain(&self, chain_id: u64) -> Result<(), WalletError> {
        self.switch_calls.fetch_add(1, Ordering::SeqCst);
        match self.switch {
            SwitchBehavior::Reject => Err(WalletError::UserRejected),
            SwitchBehavior::AlwaysUnrecognized => Err(WalletError::UnrecognizedChain(chain_id)),
            SwitchBehavior::Normal => {
                if self.known_chains.lock().expect("known chains lock").contains(&chain_id) {
                    Ok(())
                } else {
                    Err(WalletError::UnrecognizedChain(chain_id))
                }
            }
        }
    }

    async fn add_chain(&self, chain: &ChainConfig) -> Result<(), WalletError> {
        self.add_calls.fetch_add(1, Ordering::SeqCst);
        self.known_chains.lock().expect("known chains lock").insert(chain.chain_id);
        Ok(())
    }

    async fn signing_handle(&self, account: Address) -> Result<SigningHandle, WalletError> {
        let url = Url::parse("http://127.0.0.1:8545").map_err(|e| WalletError::Rpc(e.to_string()))?;
        Ok(SigningHandle::new(account, EthereumWallet::from(self.signer.clone()), url))
    }
}

/// Answers amount prompts from a script and counts how often it was asked.
#[derive(Default)]
pub struct ScriptedPrompt {
    answers: Mutex<VecDeque<Option<String>>>,
    asked: AtomicUsize,
}

impl ScriptedPrompt {
    pub fn answering(answers: impl IntoIterator<Item = Option<&'static str>>) -> Self {
        Self {
            answers: Mutex::new(answers.into_iter().map(|a| a.map(str::to_string)).collect()),
            asked: AtomicUsize::new(0),
        }
    }

    pub fn asked(&self) -> usize {
        self.asked.load(Ordering::SeqCst)
    }
}

impl AmountPrompt for ScriptedPrompt {
    fn prompt_amount(&self, _message: &str, _default: &str) -> Option<String> {
        self.asked.fetch_add(1, Ordering::SeqCst);
        self.answers.lock().expect("prompt script lock").pop_front().flatten()
    }
}

/// Poll slowly enough that only explicit refreshes matter unless a test opts in.
pub fn quiet_config() -> ClientConfig {
    ClientConfig::default().with_poll_interval(Duration::from_secs(3_600))
}

pub fn controller_with(wallet: Option<Arc<MockWallet>>, chain: &MockChain, config: ClientConfig) -> Controller {
    let wallet = wallet.map(|w| w as Arc<dyn WalletProvider>);
    let sessions = SessionManager::new(wallet, ChainConfig::megaeth_testnet());
    Controller::new(sessions, Arc::new(MockConnector::new(chain.clone())), config)
}

/// A controller whose wallet already knows the target network.
pub fn controller(key: &str, chain: &MockChain) -> (Controller, Arc<MockWallet>) {
    let wallet = Arc::new(MockWallet::new(key).knowing(ChainConfig::MEGAETH_TESTNET_CHAIN_ID));
    (controller_with(Some(Arc::clone(&wallet)), chain, quiet_config()), wallet)
}

/// Connected controller for an account that already has a profile.
pub async fn signed_in(key: &str, username: &str, chain: MockChain) -> (Controller, MockChain) {
    let chain = chain.with_profile(address_of(key), username);
    let (mut controller, _) = controller(key, &chain);
    controller.connect().await.expect("connect");
    (controller, chain)
}
