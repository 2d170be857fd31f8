//! # feedsync Protocol
//!
//! Feed item types and the JSON wire codec shared by the local cache and
//! the remote feed service.
//!
//! This crate provides:
//! - [`ItemId`] and [`FeedItem`], the public read-model shape
//! - [`Attachment`] metadata
//! - [`ApiResponse`], a decoded status code + message + optional payload
//! - JSON encoding/decoding helpers
//!
//! This is a pure protocol crate with no I/O operations.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod codec;
mod item;
mod response;

pub use codec::{from_json, to_json, ProtocolError, ProtocolResult};
pub use item::{Attachment, AttachmentKind, FeedItem, ItemId};
pub use response::ApiResponse;
