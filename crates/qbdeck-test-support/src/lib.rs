#![forbid(unsafe_code)]
#![deny(unused_must_use, rustdoc::broken_intra_doc_links, missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, unreachable_pub)]

//! Shared test helpers used across integration suites.
//! Layout: fixtures.rs (torrent builders), mocks.rs (scripted backend).

pub mod fixtures;
pub mod mocks;
