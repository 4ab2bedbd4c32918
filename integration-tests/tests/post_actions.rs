use alloy::primitives::U256;
use instasocial::controller::{CREATE_POST_FAILED, INVALID_TIP, MINTED, TIP_SENT};
use instasocial::error::{ClientError, ValidationError};
use instasocial::state::{Event, Notice, Screen, View};
use integration_tests::support::{
    address_of, controller, signed_in, MockChain, ScriptedPrompt, WriteCall, ALICE_KEY, BOB_KEY,
};

const THOUSANDTH_ETH: u64 = 1_000_000_000_000_000;

async fn feed_with_bob_post() -> (instasocial::controller::Controller, MockChain) {
    let chain = MockChain::new().with_profile(address_of(BOB_KEY), "bob");
    chain.seed_post(address_of(BOB_KEY), "tip me");
    signed_in(ALICE_KEY, "alice", chain).await
}

#[tokio::test]
async fn empty_username_never_submits() {
    let chain = MockChain::new();
    let (mut controller, _) = controller(ALICE_KEY, &chain);
    controller.connect().await.unwrap();
    controller.dispatch(Event::BioEdited("hi".into()));

    let err = controller.create_profile().await.unwrap_err();

    assert!(matches!(err, ClientError::Validation(ValidationError::EmptyUsername)));
    assert!(chain.writes().is_empty());
    assert_eq!(controller.state().screen(), Screen::CreateProfile);
}

#[tokio::test]
async fn created_profile_opens_the_feed() {
    let chain = MockChain::new();
    let (mut controller, _) = controller(ALICE_KEY, &chain);
    controller.connect().await.unwrap();
    controller.dispatch(Event::UsernameEdited("alice".into()));
    controller.dispatch(Event::BioEdited("gm".into()));

    controller.create_profile().await.unwrap();

    assert_eq!(
        chain.writes(),
        vec![WriteCall::CreateProfile {
            from: address_of(ALICE_KEY),
            username: "alice".into(),
            bio: "gm".into(),
            avatar_uri: String::new(),
        }]
    );
    assert_eq!(controller.state().screen(), Screen::Main(View::Feed));
    assert_eq!(controller.state().profile.as_ref().map(|p| p.username.as_str()), Some("alice"));
    assert!(controller.state().forms.username.is_empty());
    assert!(!controller.state().busy);
}

#[tokio::test]
async fn reverted_profile_keeps_the_form_and_shows_the_reason() {
    let chain = MockChain::new();
    let (mut controller, _) = controller(ALICE_KEY, &chain);
    controller.connect().await.unwrap();
    controller.dispatch(Event::UsernameEdited("alice".into()));
    chain.revert_next(Some("Username taken"));

    assert!(controller.create_profile().await.is_err());

    assert_eq!(controller.state().forms.username, "alice");
    assert!(!controller.state().busy);
    assert_eq!(controller.take_notices(), vec![Notice::Error("Username taken".into())]);
    assert_eq!(controller.state().screen(), Screen::CreateProfile);
}

#[tokio::test]
async fn new_post_shows_first_in_the_feed() {
    let (mut controller, chain) = feed_with_bob_post().await;
    controller.dispatch(Event::Navigate(View::CreatePost));
    controller.dispatch(Event::PostContentEdited("hello".into()));

    controller.create_post().await.unwrap();

    assert_eq!(controller.state().screen(), Screen::Main(View::Feed));
    let first = &controller.state().posts[0];
    assert_eq!(first.content, "hello");
    assert_eq!(first.image_uri, "");
    assert_eq!(first.author, address_of(ALICE_KEY));
    assert!(controller.state().forms.post_content.is_empty());
    assert!(matches!(&chain.writes()[0], WriteCall::CreatePost { image_uri, .. } if image_uri.is_empty()));
}

#[tokio::test]
async fn failed_post_keeps_the_draft() {
    let (mut controller, chain) = feed_with_bob_post().await;
    controller.dispatch(Event::Navigate(View::CreatePost));
    controller.dispatch(Event::PostContentEdited("draft".into()));
    controller.dispatch(Event::PostImageEdited("https://img.example/a.png".into()));
    chain.revert_next(None);

    assert!(controller.create_post().await.is_err());

    assert_eq!(controller.state().screen(), Screen::Main(View::CreatePost));
    assert_eq!(controller.state().forms.post_content, "draft");
    assert_eq!(controller.state().forms.post_image, "https://img.example/a.png");
    assert_eq!(controller.take_notices(), vec![Notice::Error(CREATE_POST_FAILED.into())]);
    assert_eq!(controller.state().posts.len(), 1);
}

#[tokio::test]
async fn like_shows_after_the_reload() {
    let (mut controller, _) = feed_with_bob_post().await;

    controller.like_post(1).await.unwrap();

    let post = &controller.state().posts[0];
    assert_eq!(post.likes, 1);
    assert!(post.liked_by_viewer);
}

#[tokio::test]
async fn failed_like_is_not_surfaced() {
    let (mut controller, chain) = feed_with_bob_post().await;
    chain.revert_next(Some("Already liked"));

    assert!(controller.like_post(1).await.is_err());

    assert!(controller.state().notices.is_empty());
    assert_eq!(controller.state().posts[0].likes, 0);
}

#[tokio::test]
async fn default_tip_sends_a_thousandth_of_an_ether() {
    let (mut controller, chain) = feed_with_bob_post().await;
    let prompt = ScriptedPrompt::answering([Some("0.001")]);

    let tx = controller.tip_post(1, &prompt).await.unwrap();

    assert!(tx.is_some());
    assert_eq!(
        chain.writes(),
        vec![WriteCall::Tip { from: address_of(ALICE_KEY), id: 1, value: U256::from(THOUSANDTH_ETH) }]
    );
    assert_eq!(controller.state().posts[0].tips, U256::from(THOUSANDTH_ETH));
    assert_eq!(controller.take_notices(), vec![Notice::Info(TIP_SENT.into())]);
}

#[tokio::test]
async fn unusable_tip_answers_never_submit() {
    let (mut controller, chain) = feed_with_bob_post().await;

    let dismissed = ScriptedPrompt::answering([None]);
    assert_eq!(controller.tip_post(1, &dismissed).await.unwrap(), None);

    let empty = ScriptedPrompt::answering([Some("")]);
    assert_eq!(controller.tip_post(1, &empty).await.unwrap(), None);
    assert!(controller.state().notices.is_empty());

    let garbage = ScriptedPrompt::answering([Some("lots")]);
    let err = controller.tip_post(1, &garbage).await.unwrap_err();
    assert!(matches!(err, ClientError::Validation(ValidationError::InvalidTipAmount(_))));
    assert_eq!(controller.take_notices(), vec![Notice::Error(INVALID_TIP.into())]);

    assert!(chain.writes().is_empty());
    assert_eq!(dismissed.asked() + empty.asked() + garbage.asked(), 3);
}

#[tokio::test]
async fn reverted_tip_shows_the_contract_reason() {
    let (mut controller, chain) = feed_with_bob_post().await;
    chain.revert_next(Some("Cannot tip yourself"));

    let prompt = ScriptedPrompt::answering([Some("0.5")]);
    assert!(controller.tip_post(1, &prompt).await.is_err());

    assert_eq!(controller.take_notices(), vec![Notice::Error("Cannot tip yourself".into())]);
    assert!(controller.state().posts[0].tips.is_zero());
}

#[tokio::test]
async fn profile_nft_is_minted_once() {
    let (mut controller, chain) = signed_in(ALICE_KEY, "alice", MockChain::new()).await;

    controller.mint_profile_nft().await.unwrap();

    assert_eq!(
        chain.writes(),
        vec![WriteCall::Mint { from: address_of(ALICE_KEY), fee: U256::from(THOUSANDTH_ETH) }]
    );
    assert_eq!(controller.state().profile.as_ref().and_then(|p| p.nft_id), Some(1));
    assert_eq!(controller.take_notices(), vec![Notice::Info(MINTED.into())]);

    let err = controller.mint_profile_nft().await.unwrap_err();
    assert!(matches!(err, ClientError::Validation(ValidationError::NftAlreadyMinted)));
    assert_eq!(chain.writes().len(), 1);
}
