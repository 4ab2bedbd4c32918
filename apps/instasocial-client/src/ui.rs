use std::fmt::Write;

use alloy::primitives::Address;
use instasocial::config::{ChainConfig, ClientConfig};
use instasocial::model::{Forms, Post, Profile};
use instasocial::state::{AppState, Notice, Screen, View};
use itertools::Itertools;

const RULE: &str = "----------------------------------------";

/// Relative age of a post, coarsest unit first. Future timestamps read as `0s ago`.
pub fn format_time(now: u64, timestamp: u64) -> String {
    let diff = now.saturating_sub(timestamp);
    match diff {
        0..=59 => format!("{diff}s ago"),
        60..=3_599 => format!("{}m ago", diff / 60),
        3_600..=86_399 => format!("{}h ago", diff / 3_600),
        _ => format!("{}d ago", diff / 86_400),
    }
}

pub fn short_address(address: &Address) -> String {
    let full = address.to_string();
    format!("{}...{}", &full[..6], &full[full.len() - 4..])
}

pub fn render(state: &AppState, chain: &ChainConfig, config: &ClientConfig, now: u64) -> String {
    let mut out = String::new();
    match state.screen() {
        Screen::Connect => render_connect(&mut out, chain),
        Screen::CreateProfile => render_create_profile(&mut out, &state.forms, state.busy, config),
        Screen::Main(view) => {
            render_header(&mut out, state, view);
            match view {
                View::Feed => render_feed(&mut out, &state.posts, now),
                View::CreatePost => render_create_post(&mut out, &state.forms, state.busy, config),
                View::Profile => {
                    if let (Some(profile), Some(account)) = (&state.profile, &state.account) {
                        render_profile(&mut out, profile, account, chain);
                    }
                }
            }
        }
    }
    out
}

pub fn render_notice(notice: &Notice) -> String {
    match notice {
        Notice::Info(message) => format!("* {message}"),
        Notice::Error(message) => format!("! {message}"),
    }
}

fn render_connect(out: &mut String, chain: &ChainConfig) {
    let _ = writeln!(out, "InstaSocial");
    let _ = writeln!(out, "Decentralized social on {}", chain.chain_name);
    let _ = writeln!(out, "Type `connect` to connect your wallet.");
}

fn render_create_profile(out: &mut String, forms: &Forms, busy: bool, config: &ClientConfig) {
    let _ = writeln!(out, "Create Your Profile");
    let _ = writeln!(out, "{RULE}");
    let _ = writeln!(
        out,
        "username: {} ({}/{})",
        forms.username,
        forms.username.chars().count(),
        config.username_max_len()
    );
    let _ = writeln!(out, "bio:      {}", forms.bio);
    if busy {
        let _ = writeln!(out, "Creating...");
    } else {
        let _ = writeln!(out, "Set `username` and `bio`, then `register`.");
    }
}

fn render_header(out: &mut String, state: &AppState, view: View) {
    let initial = state.profile.as_ref().map(Profile::initial).unwrap_or('?');
    let account = state.account.as_ref().map(short_address).unwrap_or_default();
    let tabs = [(View::Feed, "feed"), (View::CreatePost, "new"), (View::Profile, "profile")]
        .iter()
        .map(|(v, name)| if *v == view { format!("[{name}]") } else { name.to_string() })
        .join(" ");
    let _ = writeln!(out, "InstaSocial  ({initial}) {account}");
    let _ = writeln!(out, "{tabs}");
    let _ = writeln!(out, "{RULE}");
}

fn render_post(out: &mut String, post: &Post, now: u64) {
    let _ = writeln!(
        out,
        "#{} ({}) {}  {}  {}",
        post.id,
        post.initial(),
        post.username,
        short_address(&post.author),
        format_time(now, post.timestamp)
    );
    let _ = writeln!(out, "  {}", post.content);
    if post.has_image() {
        let _ = writeln!(out, "  [image] {}", post.image_uri);
    }
    let heart = if post.liked_by_viewer { "liked" } else { "likes" };
    let mut stats = format!("  {} {heart}  {} comments", post.likes, post.comment_count);
    if post.has_tips() {
        let _ = write!(stats, "  {} ETH tipped", post.tips_display());
    }
    let _ = writeln!(out, "{stats}");
}

fn render_feed(out: &mut String, posts: &[Post], now: u64) {
    if posts.is_empty() {
        let _ = writeln!(out, "No posts yet");
        let _ = writeln!(out, "Be the first to post!");
        return;
    }
    for post in posts {
        render_post(out, post, now);
        let _ = writeln!(out, "{RULE}");
    }
}

fn render_create_post(out: &mut String, forms: &Forms, busy: bool, config: &ClientConfig) {
    let _ = writeln!(out, "Create Post");
    let _ = writeln!(out, "content: {}", forms.post_content);
    let _ = writeln!(out, "         {}/{}", forms.post_content.chars().count(), config.content_max_len());
    let _ = writeln!(out, "image:   {}", forms.post_image);
    if busy {
        let _ = writeln!(out, "Posting...");
    } else {
        let _ = writeln!(out, "Set `content` (and optionally `image`), then `post`.");
    }
}

fn render_profile(out: &mut String, profile: &Profile, account: &Address, chain: &ChainConfig) {
    let _ = writeln!(out, "({}) {}", profile.initial(), profile.username);
    if !profile.bio.is_empty() {
        let _ = writeln!(out, "{}", profile.bio);
    }
    let _ = writeln!(
        out,
        "{} posts  {} followers  {} following",
        profile.post_count, profile.followers, profile.following
    );
    match profile.nft_id {
        Some(id) => {
            let _ = writeln!(out, "Profile NFT #{id}");
        }
        None => {
            let _ = writeln!(out, "No profile NFT yet. `mint` one for 0.001 {}.", chain.native_currency.symbol);
        }
    }
    if let Some(url) = chain.explorer_address_url(account) {
        let _ = writeln!(out, "{url}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::U256;
    use instasocial::state::{reduce, Event};

    fn post(id: u64, timestamp: u64) -> Post {
        Post {
            id,
            author: Address::repeat_byte(0xab),
            username: "alice".into(),
            content: "gm".into(),
            image_uri: String::new(),
            timestamp,
            likes: 2,
            tips: U256::ZERO,
            comment_count: 0,
            liked_by_viewer: false,
        }
    }

    fn profile() -> Profile {
        Profile {
            username: "alice".into(),
            bio: String::new(),
            avatar_uri: String::new(),
            nft_id: None,
            followers: 0,
            following: 0,
            post_count: 1,
        }
    }

    fn main_state(posts: Vec<Post>) -> AppState {
        let state = reduce(AppState::default(), Event::SessionStarted { account: Address::repeat_byte(0xab) });
        let state = reduce(state, Event::ProfileLoaded(Some(profile())));
        reduce(state, Event::FeedLoaded { seq: 1, posts })
    }

    #[test]
    fn relative_times() {
        assert_eq!(format_time(1_000, 1_000), "0s ago");
        assert_eq!(format_time(1_059, 1_000), "59s ago");
        assert_eq!(format_time(1_060, 1_000), "1m ago");
        assert_eq!(format_time(1_000 + 3_600 * 5, 1_000), "5h ago");
        assert_eq!(format_time(1_000 + 86_400 * 3, 1_000), "3d ago");
        assert_eq!(format_time(10, 20), "0s ago");
    }

    #[test]
    fn empty_feed_invites_a_first_post() {
        let out = render(&main_state(vec![]), &ChainConfig::default(), &ClientConfig::default(), 0);
        assert!(out.contains("No posts yet"));
        assert!(out.contains("Be the first to post!"));
        assert!(out.contains("[feed]"));
    }

    #[test]
    fn image_line_only_when_present() {
        let mut with_image = post(2, 0);
        with_image.image_uri = "https://img.example/cat.png".into();
        let out = render(&main_state(vec![with_image, post(1, 0)]), &ChainConfig::default(), &ClientConfig::default(), 120);
        assert_eq!(out.matches("[image]").count(), 1);
        assert!(out.find("#2").unwrap() < out.find("#1").unwrap());
        assert!(out.contains("2m ago"));
    }

    #[test]
    fn connect_screen_before_session() {
        let out = render(&AppState::default(), &ChainConfig::default(), &ClientConfig::default(), 0);
        assert!(out.contains("connect"));
    }

    #[test]
    fn addresses_are_shortened() {
        assert_eq!(short_address(&Address::repeat_byte(0xab)).to_lowercase(), "0xabab...abab");
    }
}
