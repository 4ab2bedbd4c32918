//! Explicit UI state and its pure transition function.

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};

use crate::model::{Forms, Post, Profile};

/// Views reachable from the navigation bar once a profile exists.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum View {
    #[default]
    Feed,
    CreatePost,
    Profile,
}

/// What the UI should render, derived from the state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Screen {
    Connect,
    CreateProfile,
    Main(View),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum Notice {
    Info(String),
    Error(String),
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppState {
    pub account: Option<Address>,
    pub profile: Option<Profile>,
    pub posts: Vec<Post>,
    /// Sequence number of the feed snapshot currently shown.
    pub feed_seq: u64,
    pub view: View,
    pub forms: Forms,
    /// A profile or post submission is waiting for confirmation.
    pub busy: bool,
    /// Notices not yet shown to the user, oldest first.
    pub notices: Vec<Notice>,
}

impl AppState {
    pub fn screen(&self) -> Screen {
        match (&self.account, &self.profile) {
            (None, _) => Screen::Connect,
            (Some(_), None) => Screen::CreateProfile,
            (Some(_), Some(_)) => Screen::Main(self.view),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.account.is_some()
    }

    pub fn post(&self, id: u64) -> Option<&Post> {
        self.posts.iter().find(|p| p.id == id)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    SessionStarted { account: Address },
    SessionEnded,
    ProfileLoaded(Option<Profile>),
    FeedLoaded { seq: u64, posts: Vec<Post> },
    Navigate(View),
    UsernameEdited(String),
    BioEdited(String),
    PostContentEdited(String),
    PostImageEdited(String),
    CommentEdited(String),
    SubmissionStarted,
    ProfileCreated,
    PostCreated,
    SubmissionFailed(String),
    Notify(Notice),
    NoticesTaken,
}

pub fn reduce(mut state: AppState, event: Event) -> AppState {
    match event {
        Event::SessionStarted { account } => {
            let notices = std::mem::take(&mut state.notices);
            AppState { account: Some(account), notices, ..AppState::default() }
        }
        Event::SessionEnded => {
            let notices = std::mem::take(&mut state.notices);
            AppState { notices, ..AppState::default() }
        }
        Event::ProfileLoaded(profile) => {
            if state.account.is_some() {
                state.profile = profile;
            }
            state
        }
        Event::FeedLoaded { seq, posts } => {
            // Results can land out of order; only a newer snapshot may replace the current one.
            if state.account.is_some() && seq > state.feed_seq {
                state.feed_seq = seq;
                state.posts = posts;
            }
            state
        }
        Event::Navigate(view) => {
            if state.profile.is_none() || view == state.view {
                return state;
            }
            if state.view == View::CreatePost {
                state.forms.clear_post();
            }
            state.forms.comment.clear();
            state.view = view;
            state
        }
        Event::UsernameEdited(value) => {
            state.forms.username = value;
            state
        }
        Event::BioEdited(value) => {
            state.forms.bio = value;
            state
        }
        Event::PostContentEdited(value) => {
            state.forms.post_content = value;
            state
        }
        Event::PostImageEdited(value) => {
            state.forms.post_image = value;
            state
        }
        Event::CommentEdited(value) => {
            state.forms.comment = value;
            state
        }
        Event::SubmissionStarted => {
            state.busy = true;
            state
        }
        Event::ProfileCreated => {
            state.busy = false;
            state.forms.username.clear();
            state.forms.bio.clear();
            state.view = View::Feed;
            state
        }
        Event::PostCreated => {
            state.busy = false;
            state.forms.clear_post();
            state.view = View::Feed;
            state
        }
        Event::SubmissionFailed(message) => {
            state.busy = false;
            state.notices.push(Notice::Error(message));
            state
        }
        Event::Notify(notice) => {
            state.notices.push(notice);
            state
        }
        Event::NoticesTaken => {
            state.notices.clear();
            state
        }
    }
}
