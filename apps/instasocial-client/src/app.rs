use std::future::Future;
use std::io::{self, BufRead};
use std::sync::Arc;
use std::time::Duration;

use instasocial::config::{ChainConfig, ClientConfig};
use instasocial::contract::RpcConnector;
use instasocial::controller::Controller;
use instasocial::error::{ClientError, WalletError};
use instasocial::model::Post;
use instasocial::state::{Event, Screen, View};
use instasocial::wallet::{LocalWallet, SessionManager, WalletProvider};
use log::{debug, info, warn};
use tokio::task::JoinHandle;

use crate::actions::{Action, HELP};
use crate::cli::Args;
use crate::deployment;
use crate::prompt::StdinPrompt;
use crate::ui;

fn now() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp()).unwrap_or_default()
}

/// Drive `future` to completion on a fresh runtime, then shut the runtime down without waiting
/// for blocking tasks. A stdin read left pending at exit would otherwise keep the process alive.
pub fn block_on_detached<F: Future>(future: F) -> anyhow::Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;
    let output = runtime.block_on(future);
    runtime.shutdown_background();
    Ok(output)
}

/// One pending stdin read. `None` once input is closed.
fn read_line() -> JoinHandle<Option<String>> {
    tokio::task::spawn_blocking(|| {
        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line),
        }
    })
}

pub struct App {
    controller: Controller,
    chain: ChainConfig,
    /// Feed snapshot last printed, so background refreshes only redraw on change.
    shown_posts: Vec<Post>,
}

impl App {
    pub fn new(args: &Args) -> anyhow::Result<Self> {
        let deployment = deployment::embedded()?;
        deployment::check_bundled_abi()?;
        let mut chain = ChainConfig::megaeth_testnet();
        if let Some(url) = &args.rpc_url {
            chain = chain.with_rpc_url(url.clone());
        }
        if deployment.chain_id != chain.chain_id {
            warn!("Contract was deployed to chain {} but the client targets {}", deployment.chain_id, chain.chain_id);
        }
        info!("Using {} at {} on {}", deployment.contract, deployment.address, chain.chain_name);

        let wallet = LocalWallet::discover(&args.key_file)?.map(|wallet| Arc::new(wallet) as Arc<dyn WalletProvider>);
        if wallet.is_none() {
            debug!("No signing key found in the environment or {}", args.key_file.display());
        }
        let sessions = SessionManager::new(wallet, chain.clone());
        let connector = Arc::new(RpcConnector::new(deployment.address));
        let config = ClientConfig::default().with_poll_interval(Duration::from_secs(args.poll_secs));

        Ok(Self { controller: Controller::new(sessions, connector, config), chain, shown_posts: Vec::new() })
    }

    fn draw(&mut self) {
        for notice in self.controller.take_notices() {
            println!("{}", ui::render_notice(&notice));
        }
        let state = self.controller.state();
        println!("{}", ui::render(state, &self.chain, self.controller.config(), now()));
        self.shown_posts = state.posts.clone();
    }

    fn feed_changed(&self) -> bool {
        let state = self.controller.state();
        state.screen() == Screen::Main(View::Feed) && state.posts != self.shown_posts
    }

    pub async fn run(mut self) -> anyhow::Result<()> {
        self.controller.restore().await;
        self.draw();

        let mut pending = read_line();
        loop {
            tokio::select! {
                line = &mut pending => {
                    let Some(line) = line? else { break };
                    if !self.handle(Action::from_line(&line)).await {
                        break;
                    }
                    self.draw();
                    pending = read_line();
                }
                _ = self.controller.next_feed_update() => {
                    if self.feed_changed() {
                        self.draw();
                    }
                }
                _ = tokio::signal::ctrl_c() => break,
            }
        }

        self.controller.disconnect().await;
        Ok(())
    }

    /// Returns `false` when the user asked to leave.
    async fn handle(&mut self, action: Action) -> bool {
        let controller = &mut self.controller;
        match action {
            Action::Connect => {
                if let Err(e) = controller.connect().await {
                    // The missing-wallet case already produced a notice.
                    if !matches!(e, ClientError::Wallet(WalletError::ProviderUnavailable)) {
                        println!("! Could not connect: {e}");
                    }
                }
            }
            Action::Disconnect => controller.disconnect().await,
            Action::Go(view) => controller.dispatch(Event::Navigate(view)),
            Action::Refresh => {
                controller.refresh_feed().await;
            }
            Action::Username(name) => controller.dispatch(Event::UsernameEdited(name)),
            Action::Bio(bio) => controller.dispatch(Event::BioEdited(bio)),
            Action::CreateProfile => report(controller.create_profile().await),
            Action::Content(text) => controller.dispatch(Event::PostContentEdited(text)),
            Action::Image(url) => controller.dispatch(Event::PostImageEdited(url)),
            Action::Publish => report(controller.create_post().await),
            Action::Comment(text) => controller.dispatch(Event::CommentEdited(text)),
            Action::Like(id) => {
                // Like failures are only logged.
                let _ = controller.like_post(id).await;
            }
            Action::Tip(id) => {
                if controller.state().post(id).is_none() {
                    println!("! No post #{id} in the feed");
                } else {
                    let _ = controller.tip_post(id, &StdinPrompt).await;
                }
            }
            Action::Mint => report(controller.mint_profile_nft().await),
            Action::Help => println!("{HELP}"),
            Action::Quit => return false,
            Action::None => {}
            Action::Unknown(what) => println!("! Unknown command: {what} (try `help`)"),
        }
        true
    }
}

/// Validation problems have no notice of their own, so show them inline.
fn report<T>(result: Result<T, ClientError>) {
    match result {
        Err(ClientError::Validation(e)) => println!("! {e}"),
        Err(ClientError::NotConnected) => println!("! Connect a wallet first"),
        _ => {}
    }
}
