#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, unreachable_pub)]
#![allow(clippy::module_name_repetitions)]

//! Configuration for the qbdeck client.
//!
//! Layout:
//! - `model.rs`: typed configuration document
//! - `defaults.rs`: default values and environment variable names
//! - `loader.rs`: YAML file loading and environment overrides
//! - `validate.rs`: range and format checks
//! - `error.rs`: error type

pub mod defaults;
pub mod error;
pub mod loader;
pub mod model;
pub mod validate;

pub use error::{ConfigError, ConfigResult};
pub use loader::{apply_env_overrides, from_yaml_str, load, load_with_env};
pub use model::{DeckConfig, LoggingSettings, PollSettings, ServerConfig, SidebarSettings};
pub use validate::validate;
