//! Client core for InstaSocial, a small social network whose state lives in an EVM contract.
//!
//! The UI owns a [`controller::Controller`], feeds it user actions and renders its
//! [`state::AppState`]. Everything chain-facing goes through the [`wallet::WalletProvider`] and
//! [`contract::SocialContract`] seams.

pub mod config;
pub mod contract;
pub mod controller;
pub mod deployment;
pub mod error;
pub mod feed;
pub mod model;
pub mod state;
pub mod utils;
pub mod wallet;
