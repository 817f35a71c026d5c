//! redd-harvest - Download media from followed subreddits and redditors
//!
//! Pulls posts from configured subreddits and redditors, resolves each post
//! URL into downloadable resources and stores them in a content-addressed
//! folder tree.
//!
//! # Architecture
//!
//! Each post flows through a small rules engine:
//! - Routing decides which followed entity owns the post, honoring ignore
//!   lists and the `favor_entity` rule
//! - Link resolution turns the post URL into zero or more downloads
//! - The store names files by their SHA-256 and skips content already in
//!   the target folder, so the filesystem is the only seen-set
//!
//! # Modules
//!
//! - `adapters`: Network integrations (reqwest fetcher, Reddit listings)
//! - `config`: YAML configuration, defaults and validation
//! - `core`: Registry, routing, resolver, store, pruner, harvest loop
//! - `domain`: Data structures (Entity, Post, ResolvedResource)
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Write an example config
//! redd-harvest setup
//!
//! # Harvest everything configured
//! redd-harvest run
//!
//! # Harvest one subreddit, asking before pruning
//! redd-harvest run --subreddits-only --only-name pics --interactive
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;

// Re-export main types at crate root for convenience
pub use config::{ConfigError, HarvestConfig};
pub use core::{HarvestReport, HarvestScope, Harvester, Shutdown};
pub use domain::{Entity, EntityKind, Post};
