use std::sync::Arc;
use std::time::Duration;

use instasocial::config::{ChainConfig, ClientConfig};
use instasocial::state::Event;
use integration_tests::support::{address_of, controller_with, signed_in, MockChain, MockWallet, ALICE_KEY, BOB_KEY};

#[tokio::test]
async fn empty_chain_gives_an_empty_feed() {
    let (controller, chain) = signed_in(ALICE_KEY, "alice", MockChain::new()).await;

    assert!(controller.state().posts.is_empty());
    assert!(chain.listing_calls() >= 1);
}

#[tokio::test]
async fn feed_is_newest_first_and_skips_unreadable_posts() {
    let chain = MockChain::new().with_profile(address_of(BOB_KEY), "bob");
    for content in ["one", "two", "three"] {
        chain.seed_post(address_of(BOB_KEY), content);
    }
    chain.fail_post(2);
    let (mut controller, _) = signed_in(ALICE_KEY, "alice", chain).await;

    assert!(controller.refresh_feed().await);

    let ids: Vec<_> = controller.state().posts.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![3, 1]);
    assert_eq!(controller.state().posts[0].username, "bob");
}

#[tokio::test]
async fn listing_failure_keeps_the_previous_snapshot() {
    let chain = MockChain::new().with_profile(address_of(BOB_KEY), "bob");
    chain.seed_post(address_of(BOB_KEY), "still here");
    let (mut controller, chain) = signed_in(ALICE_KEY, "alice", chain).await;
    let before = controller.state().posts.clone();
    assert_eq!(before.len(), 1);

    chain.fail_listing(true);
    assert!(!controller.refresh_feed().await);

    assert_eq!(controller.state().posts, before);
}

#[tokio::test(start_paused = true)]
async fn poller_picks_up_posts_from_other_accounts() {
    let chain = MockChain::new().with_profile(address_of(ALICE_KEY), "alice").with_profile(address_of(BOB_KEY), "bob");
    let wallet = Arc::new(MockWallet::new(ALICE_KEY).knowing(ChainConfig::MEGAETH_TESTNET_CHAIN_ID));
    let config = ClientConfig::default().with_poll_interval(Duration::from_secs(3));
    let mut controller = controller_with(Some(wallet), &chain, config);
    controller.connect().await.unwrap();
    assert!(controller.state().posts.is_empty());

    chain.seed_post(address_of(BOB_KEY), "hello from bob");
    tokio::time::timeout(Duration::from_secs(10), controller.next_feed_update()).await.expect("poller tick");

    assert_eq!(controller.state().posts.len(), 1);
    assert_eq!(controller.state().posts[0].content, "hello from bob");
}

#[tokio::test(start_paused = true)]
async fn no_feed_updates_after_disconnect() {
    let (mut controller, chain) = signed_in(ALICE_KEY, "alice", MockChain::new()).await;
    controller.disconnect().await;
    let calls = chain.listing_calls();

    tokio::time::sleep(Duration::from_secs(30)).await;

    assert_eq!(chain.listing_calls(), calls);
    assert_eq!(controller.pump(), 0);
    assert!(controller.state().posts.is_empty());
}

#[tokio::test]
async fn stale_feed_results_are_ignored() {
    let chain = MockChain::new().with_profile(address_of(BOB_KEY), "bob");
    chain.seed_post(address_of(BOB_KEY), "fresh");
    let (mut controller, _) = signed_in(ALICE_KEY, "alice", chain).await;
    let current = controller.state().feed_seq;
    let fresh = controller.state().posts.clone();

    controller.dispatch(Event::FeedLoaded { seq: current - 1, posts: vec![] });
    assert_eq!(controller.state().posts, fresh);

    controller.dispatch(Event::FeedLoaded { seq: current + 1, posts: vec![] });
    assert!(controller.state().posts.is_empty());
}
