//! # Configuration
//!
//! Client configuration: where the registry API lives, how long requests may
//! take, and where the session is persisted between runs.

pub mod client;

pub use client::{ClientConfig, ConfigError};
