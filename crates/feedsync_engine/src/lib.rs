//! # feedsync Engine
//!
//! Offline-first sync engine for a social feed.
//!
//! This crate provides:
//! - Reactive read projection over the local store's visible items
//! - Full refresh from the remote feed service
//! - Delta polling that stages newer items until the user asks to see them
//! - Optimistic like, unlike and delete with a boolean error flag
//! - One error classifier: network, API status, or unknown
//! - HTTP remote over an abstract client, and a scripted mock remote
//!
//! ## Architecture
//!
//! The local store is the single source of truth for reads:
//! 1. Readers subscribe to [`SyncEngine::data`] and never touch the network
//! 2. [`SyncEngine::get_all`] and [`SyncEngine::save`] write remote results
//!    into the store
//! 3. [`SyncEngine::watch_newer_count`] stages deltas as hidden records
//! 4. [`SyncEngine::show_all`] makes them visible in one step
//!
//! ## Key Invariants
//!
//! - Reads are served from the store only
//! - Staged items never reach readers before `show_all`
//! - Optimistic local changes are not rolled back
//! - Callers only see [`AppError::Network`], [`AppError::Api`] or
//!   [`AppError::Unknown`]

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod engine;
mod error;
mod http;
mod remote;

pub use config::{HttpRemoteConfig, SyncConfig, DEFAULT_POLL_INTERVAL};
pub use engine::{FeedStream, NewerCountStream, SyncEngine, SyncStats};
pub use error::{AppError, AppResult, Fault};
pub use http::{HttpClient, HttpRemote, HttpRequest, HttpResponse, Method};
pub use remote::{MockRemote, MockReply, RemoteCall, RemoteFeed, RemoteResult};
