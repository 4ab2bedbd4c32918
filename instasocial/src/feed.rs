//! Feed loading and the session-bound poller that keeps it fresh.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use log::{debug, warn};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::contract::SocialContract;
use crate::error::ContractError;
use crate::model::Post;

/// Fetch the most recent page of posts. Individual post failures drop that post only;
/// a failure listing the page ids fails the whole load.
pub async fn load_feed(contract: &dyn SocialContract, page_size: u64) -> Result<Vec<Post>, ContractError> {
    let ids = contract.get_recent_posts(page_size, 0).await?;
    let fetches = ids.iter().map(|&id| async move {
        match contract.get_post(id).await {
            Ok(post) => Some(post),
            Err(e) => {
                debug!("Post {id} unavailable: {e}");
                None
            }
        }
    });
    Ok(join_all(fetches).await.into_iter().flatten().collect())
}

/// Hands out strictly increasing numbers at the start of each feed load.
#[derive(Clone, Debug, Default)]
pub struct FeedSequencer(Arc<AtomicU64>);

impl FeedSequencer {
    pub fn next(&self) -> u64 {
        self.0.fetch_add(1, Ordering::Relaxed) + 1
    }
}

/// Result of one feed load, tagged with the sequence number taken when it started.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeedUpdate {
    pub seq: u64,
    pub posts: Vec<Post>,
}

/// Repeating feed refresh bound to a wallet session. Cancelled by [`FeedPoller::stop`] or on drop.
pub struct FeedPoller {
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl FeedPoller {
    /// The first tick fires one `period` after spawning; the session start load is done by the caller.
    pub fn spawn(
        contract: Arc<dyn SocialContract>,
        period: Duration,
        page_size: u64,
        sequencer: FeedSequencer,
        updates: UnboundedSender<FeedUpdate>,
    ) -> Self {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {}
                }
                let seq = sequencer.next();
                let result = tokio::select! {
                    _ = token.cancelled() => break,
                    result = load_feed(contract.as_ref(), page_size) => result,
                };
                match result {
                    Ok(posts) => {
                        if updates.send(FeedUpdate { seq, posts }).is_err() {
                            debug!("Feed receiver dropped");
                            break;
                        }
                    }
                    Err(e) => warn!("Error loading feed: {e}"),
                }
            }
            debug!("Feed poller stopped");
        });
        Self { cancel, handle: Some(handle) }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Cancel and wait for the task to finish.
    pub async fn stop(mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                warn!("Feed poller task failed: {e}");
            }
        }
    }
}

impl Drop for FeedPoller {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{Address, TxHash, U256};
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;

    use crate::model::{PostId, Profile};

    struct CountingFeed {
        ids: Vec<PostId>,
        broken: Vec<PostId>,
        listings: AtomicUsize,
    }

    fn post(id: PostId) -> Post {
        Post {
            id,
            author: Address::ZERO,
            username: format!("user{id}"),
            content: format!("post {id}"),
            image_uri: String::new(),
            timestamp: id,
            likes: 0,
            tips: U256::ZERO,
            comment_count: 0,
            liked_by_viewer: false,
        }
    }

    #[async_trait]
    impl SocialContract for CountingFeed {
        async fn get_profile(&self, _account: Address) -> Result<Profile, ContractError> {
            Err(ContractError::Reverted { reason: None })
        }

        async fn get_recent_posts(&self, count: u64, offset: u64) -> Result<Vec<PostId>, ContractError> {
            assert_eq!(offset, 0);
            self.listings.fetch_add(1, Ordering::SeqCst);
            Ok(self.ids.iter().copied().take(count as usize).collect())
        }

        async fn get_post(&self, id: PostId) -> Result<Post, ContractError> {
            if self.broken.contains(&id) {
                Err(ContractError::Transport("boom".into()))
            } else {
                Ok(post(id))
            }
        }

        async fn create_profile(&self, _: &str, _: &str, _: &str) -> Result<TxHash, ContractError> {
            unreachable!()
        }

        async fn create_post(&self, _: &str, _: &str) -> Result<TxHash, ContractError> {
            unreachable!()
        }

        async fn like_post(&self, _: PostId) -> Result<TxHash, ContractError> {
            unreachable!()
        }

        async fn tip_post(&self, _: PostId, _: U256) -> Result<TxHash, ContractError> {
            unreachable!()
        }

        async fn mint_profile_nft(&self, _: U256) -> Result<TxHash, ContractError> {
            unreachable!()
        }
    }

    #[tokio::test]
    async fn failing_posts_are_skipped_in_order() {
        let feed = CountingFeed { ids: vec![5, 4, 3, 2, 1], broken: vec![4, 2], listings: AtomicUsize::new(0) };
        let posts = load_feed(&feed, 20).await.expect("load feed");
        let ids: Vec<_> = posts.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![5, 3, 1]);
    }

    #[tokio::test]
    async fn page_size_limits_the_listing() {
        let feed = CountingFeed { ids: (1..=30).rev().collect(), broken: vec![], listings: AtomicUsize::new(0) };
        assert_eq!(load_feed(&feed, 20).await.unwrap().len(), 20);
    }

    #[test]
    fn sequencer_is_strictly_increasing_across_clones() {
        let seq = FeedSequencer::default();
        let other = seq.clone();
        assert_eq!(seq.next(), 1);
        assert_eq!(other.next(), 2);
        assert_eq!(seq.next(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn poller_ticks_until_stopped() {
        let feed = Arc::new(CountingFeed { ids: vec![1], broken: vec![], listings: AtomicUsize::new(0) });
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let poller =
            FeedPoller::spawn(feed.clone(), Duration::from_secs(3), 20, FeedSequencer::default(), tx);

        let first = rx.recv().await.expect("first tick");
        let second = rx.recv().await.expect("second tick");
        assert!(second.seq > first.seq);
        assert_eq!(first.posts.len(), 1);

        poller.stop().await;
        let listed = feed.listings.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(feed.listings.load(Ordering::SeqCst), listed);
        assert!(rx.recv().await.is_none());
    }
}
