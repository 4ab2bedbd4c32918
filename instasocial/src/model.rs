//! Client-side copies of contract records. These are snapshots, never authoritative.

use alloy::primitives::{utils::format_ether, Address, U256};
use serde::{Deserialize, Serialize};

pub type PostId = u64;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub username: String,
    pub bio: String,
    pub avatar_uri: String,
    /// Zero on chain means no NFT was minted.
    pub nft_id: Option<u64>,
    pub followers: u64,
    pub following: u64,
    pub post_count: u64,
}

impl Profile {
    pub fn has_nft(&self) -> bool {
        self.nft_id.is_some()
    }

    /// Uppercased first character of the username, used as an avatar placeholder.
    pub fn initial(&self) -> char {
        initial_of(&self.username)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub author: Address,
    pub username: String,
    pub content: String,
    pub image_uri: String,
    /// Unix seconds.
    pub timestamp: u64,
    pub likes: u64,
    /// Accumulated tips in wei.
    pub tips: U256,
    pub comment_count: u64,
    pub liked_by_viewer: bool,
}

impl Post {
    pub fn has_image(&self) -> bool {
        !self.image_uri.is_empty()
    }

    pub fn has_tips(&self) -> bool {
        !self.tips.is_zero()
    }

    /// Tips rendered in whole native units, e.g. `0.001000000000000000`.
    pub fn tips_display(&self) -> String {
        format_ether(self.tips)
    }

    pub fn initial(&self) -> char {
        initial_of(&self.username)
    }
}

fn initial_of(name: &str) -> char {
    name.chars().next().map(|c| c.to_uppercase().next().unwrap_or(c)).unwrap_or('?')
}

/// Local drafts. Nothing here is persisted or sent until a submit event.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Forms {
    pub username: String,
    pub bio: String,
    pub post_content: String,
    pub post_image: String,
    pub comment: String,
}

impl Forms {
    pub fn clear_post(&mut self) {
        self.post_content.clear();
        self.post_image.clear();
    }
}
