//! Single owner of [`AppState`]. Turns user actions into contract calls and folds the results
//! back into the state through [`reduce`].

use std::sync::Arc;

use alloy::primitives::{Address, TxHash, U256};
use log::{debug, error, info, warn};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use crate::config::ClientConfig;
use crate::contract::{ContractConnector, SocialContract};
use crate::error::{ClientError, ValidationError, WalletError};
use crate::feed::{load_feed, FeedPoller, FeedSequencer, FeedUpdate};
use crate::model::{PostId, Profile};
use crate::state::{reduce, AppState, Event, Notice};
use crate::utils::units::{parse_tip_amount, DEFAULT_TIP_AMOUNT, PROFILE_NFT_FEE_WEI};
use crate::wallet::{Session, SessionManager};

pub const NO_WALLET_MESSAGE: &str = "Please install a wallet!";
pub const CREATE_PROFILE_FAILED: &str = "Failed to create profile";
pub const CREATE_POST_FAILED: &str = "Failed to create post";
pub const TIP_FAILED: &str = "Failed to send tip";
pub const TIP_SENT: &str = "Tip sent!";
pub const INVALID_TIP: &str = "Invalid tip amount";
pub const MINT_FAILED: &str = "Failed to mint profile NFT";
pub const MINTED: &str = "Profile NFT minted!";
pub const TIP_PROMPT: &str = "Enter tip amount in ETH";

/// Blocking question to the user. `None` when the prompt is dismissed.
pub trait AmountPrompt {
    fn prompt_amount(&self, message: &str, default: &str) -> Option<String>;
}

pub fn validate_username(username: &str, config: &ClientConfig) -> Result<(), ValidationError> {
    if username.trim().is_empty() {
        return Err(ValidationError::EmptyUsername);
    }
    if username.chars().count() > config.username_max_len() {
        return Err(ValidationError::UsernameTooLong { max: config.username_max_len() });
    }
    Ok(())
}

pub fn validate_post_content(content: &str, config: &ClientConfig) -> Result<(), ValidationError> {
    if content.trim().is_empty() {
        return Err(ValidationError::EmptyContent);
    }
    if content.chars().count() > config.content_max_len() {
        return Err(ValidationError::ContentTooLong { max: config.content_max_len() });
    }
    Ok(())
}

struct ActiveSession {
    account: Address,
    contract: Arc<dyn SocialContract>,
    poller: FeedPoller,
}

pub struct Controller {
    state: AppState,
    sessions: SessionManager,
    connector: Arc<dyn ContractConnector>,
    config: ClientConfig,
    sequencer: FeedSequencer,
    active: Option<ActiveSession>,
    updates_tx: UnboundedSender<FeedUpdate>,
    updates_rx: UnboundedReceiver<FeedUpdate>,
}

impl Controller {
    pub fn new(sessions: SessionManager, connector: Arc<dyn ContractConnector>, config: ClientConfig) -> Self {
        let (updates_tx, updates_rx) = unbounded_channel();
        Self {
            state: AppState::default(),
            sessions,
            connector,
            config,
            sequencer: FeedSequencer::default(),
            active: None,
            updates_tx,
            updates_rx,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn is_polling(&self) -> bool {
        self.active.as_ref().is_some_and(|active| !active.poller.is_cancelled())
    }

    pub fn dispatch(&mut self, event: Event) {
        let state = std::mem::take(&mut self.state);
        self.state = reduce(state, event);
    }

    /// Hand pending notices to the UI and forget them.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        let notices = self.state.notices.clone();
        self.dispatch(Event::NoticesTaken);
        notices
    }

    /// Called once at startup: reconnect silently if the wallet already trusts us.
    pub async fn restore(&mut self) {
        match self.sessions.restore().await {
            Ok(Some(session)) => {
                if let Err(e) = self.start_session(session).await {
                    warn!("Could not resume wallet session: {e}");
                }
            }
            Ok(None) => debug!("No wallet session to restore"),
            Err(e) => warn!("Could not restore wallet session: {e}"),
        }
    }

    pub async fn connect(&mut self) -> Result<(), ClientError> {
        if self.active.is_some() {
            return Ok(());
        }
        match self.sessions.connect().await {
            Ok(session) => self.start_session(session).await,
            Err(WalletError::ProviderUnavailable) => {
                self.dispatch(Event::Notify(Notice::Error(NO_WALLET_MESSAGE.to_string())));
                Err(WalletError::ProviderUnavailable.into())
            }
            Err(e) => {
                error!("Error connecting wallet: {e}");
                Err(e.into())
            }
        }
    }

    async fn start_session(&mut self, session: Session) -> Result<(), ClientError> {
        let contract = self.connector.bind(&session.handle).inspect_err(|e| error!("Error binding contract: {e}"))?;
        let poller = FeedPoller::spawn(
            Arc::clone(&contract),
            self.config.poll_interval(),
            self.config.feed_page_size(),
            self.sequencer.clone(),
            self.updates_tx.clone(),
        );
        self.active = Some(ActiveSession { account: session.account, contract, poller });
        self.dispatch(Event::SessionStarted { account: session.account });
        self.load_profile().await;
        self.refresh_feed().await;
        Ok(())
    }

    /// End the session: stop polling and drop every cached snapshot.
    pub async fn disconnect(&mut self) {
        if let Some(active) = self.active.take() {
            active.poller.stop().await;
            info!("Session for {} closed", active.account);
        }
        while self.updates_rx.try_recv().is_ok() {}
        self.dispatch(Event::SessionEnded);
    }

    fn session(&self) -> Result<(Address, Arc<dyn SocialContract>), ClientError> {
        self.active.as_ref().map(|active| (active.account, Arc::clone(&active.contract))).ok_or(ClientError::NotConnected)
    }

    /// Read failures mean "no profile" and send the UI to profile creation.
    pub async fn load_profile(&mut self) -> Option<Profile> {
        let Ok((account, contract)) = self.session() else {
            return None;
        };
        let profile = match contract.get_profile(account).await {
            // Unregistered accounts can read back as an all-default record.
            Ok(profile) if profile.username.is_empty() => None,
            Ok(profile) => Some(profile),
            Err(e) => {
                debug!("No profile found for {account}: {e}");
                None
            }
        };
        self.dispatch(Event::ProfileLoaded(profile.clone()));
        profile
    }

    /// Reload the feed page. A failure keeps the previous snapshot.
    pub async fn refresh_feed(&mut self) -> bool {
        let Ok((_, contract)) = self.session() else {
            return false;
        };
        let seq = self.sequencer.next();
        match load_feed(contract.as_ref(), self.config.feed_page_size()).await {
            Ok(posts) => {
                self.dispatch(Event::FeedLoaded { seq, posts });
                true
            }
            Err(e) => {
                error!("Error loading feed: {e}");
                false
            }
        }
    }

    fn apply_update(&mut self, update: FeedUpdate) {
        self.dispatch(Event::FeedLoaded { seq: update.seq, posts: update.posts });
    }

    /// Apply poller results that already arrived. Returns how many were applied.
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(update) = self.updates_rx.try_recv() {
            self.apply_update(update);
            applied += 1;
        }
        applied
    }

    /// Wait for the next poller result and apply it. Cancel safe.
    pub async fn next_feed_update(&mut self) {
        if let Some(update) = self.updates_rx.recv().await {
            self.apply_update(update);
        }
    }

    pub async fn create_profile(&mut self) -> Result<TxHash, ClientError> {
        let username = self.state.forms.username.clone();
        let bio = self.state.forms.bio.clone();
        validate_username(&username, &self.config)?;
        let (_, contract) = self.session()?;

        self.dispatch(Event::SubmissionStarted);
        match contract.create_profile(&username, &bio, "").await {
            Ok(tx) => {
                info!("Profile {username} created in {tx}");
                self.load_profile().await;
                self.dispatch(Event::ProfileCreated);
                Ok(tx)
            }
            Err(e) => {
                error!("Error creating profile: {e}");
                let err = ClientError::from(e);
                self.dispatch(Event::SubmissionFailed(err.user_message(CREATE_PROFILE_FAILED).to_string()));
                Err(err)
            }
        }
    }

    pub async fn create_post(&mut self) -> Result<TxHash, ClientError> {
        let content = self.state.forms.post_content.clone();
        let image = self.state.forms.post_image.clone();
        validate_post_content(&content, &self.config)?;
        let (_, contract) = self.session()?;

        self.dispatch(Event::SubmissionStarted);
        match contract.create_post(&content, &image).await {
            Ok(tx) => {
                info!("Post created in {tx}");
                self.dispatch(Event::PostCreated);
                self.refresh_feed().await;
                Ok(tx)
            }
            Err(e) => {
                error!("Error creating post: {e}");
                let err = ClientError::from(e);
                self.dispatch(Event::SubmissionFailed(err.user_message(CREATE_POST_FAILED).to_string()));
                Err(err)
            }
        }
    }

    /// No optimistic update: the like only shows once the refreshed feed reflects it.
    pub async fn like_post(&mut self, id: PostId) -> Result<TxHash, ClientError> {
        let (_, contract) = self.session()?;
        match contract.like_post(id).await {
            Ok(tx) => {
                debug!("Liked post {id} in {tx}");
                self.refresh_feed().await;
                Ok(tx)
            }
            Err(e) => {
                error!("Error liking post {id}: {e}");
                Err(e.into())
            }
        }
    }

    /// Ask for an amount and tip the post author. `Ok(None)` when the user backed out.
    pub async fn tip_post(&mut self, id: PostId, prompt: &dyn AmountPrompt) -> Result<Option<TxHash>, ClientError> {
        let (_, contract) = self.session()?;
        let Some(input) = prompt.prompt_amount(TIP_PROMPT, DEFAULT_TIP_AMOUNT) else {
            return Ok(None);
        };
        let value = match parse_tip_amount(&input) {
            Ok(Some(value)) => value,
            Ok(None) => return Ok(None),
            Err(e) => {
                self.dispatch(Event::Notify(Notice::Error(INVALID_TIP.to_string())));
                return Err(e.into());
            }
        };

        match contract.tip_post(id, value).await {
            Ok(tx) => {
                info!("Tipped post {id} with {value} wei in {tx}");
                self.refresh_feed().await;
                self.dispatch(Event::Notify(Notice::Info(TIP_SENT.to_string())));
                Ok(Some(tx))
            }
            Err(e) => {
                error!("Error tipping post {id}: {e}");
                let err = ClientError::from(e);
                self.dispatch(Event::Notify(Notice::Error(err.user_message(TIP_FAILED).to_string())));
                Err(err)
            }
        }
    }

    /// Mint the profile NFT for the fixed fee. Only offered while the profile has none.
    pub async fn mint_profile_nft(&mut self) -> Result<TxHash, ClientError> {
        let (_, contract) = self.session()?;
        if self.state.profile.as_ref().is_some_and(Profile::has_nft) {
            return Err(ValidationError::NftAlreadyMinted.into());
        }
        match contract.mint_profile_nft(U256::from(PROFILE_NFT_FEE_WEI)).await {
            Ok(tx) => {
                info!("Profile NFT minted in {tx}");
                self.load_profile().await;
                self.dispatch(Event::Notify(Notice::Info(MINTED.to_string())));
                Ok(tx)
            }
            Err(e) => {
                error!("Error minting profile NFT: {e}");
                let err = ClientError::from(e);
                self.dispatch(Event::Notify(Notice::Error(err.user_message(MINT_FAILED).to_string())));
                Err(err)
            }
        }
    }
}
