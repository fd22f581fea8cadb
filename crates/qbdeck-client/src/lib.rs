#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, unreachable_pub)]

//! HTTP client for the qBittorrent WebUI API v2.
//!
//! Layout:
//! - `client.rs`: [`QbClient`], cookie-jar session, request plumbing and the
//!   `TorrentSource` impl

pub mod client;

pub use client::{ClientOptions, HEADER_REQUEST_ID, QbClient, SESSION_COOKIE};
