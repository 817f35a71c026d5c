//! Domain types for the harvester.
//!
//! This module contains the core data structures:
//! - Entity: followed subreddits and redditors, with their storage layout
//! - Post: what the feed client hands us
//! - Resource: concrete downloads produced by the link resolver

pub mod entity;
pub mod post;
pub mod resource;

// Re-export commonly used types
pub use entity::{
    folder_segment, is_plain_segment, Entity, EntityKind, SearchCriteria, SortToggle, SortType,
    StoreType,
};
pub use post::{Post, UNKNOWN_AUTHOR};
pub use resource::{MediaKind, ResolvedResource};
