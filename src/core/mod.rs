//! Core harvesting logic.
//!
//! This module contains:
//! - EntityRegistry: followed and ignored entities
//! - Router: ownership decisions and storage targets
//! - LinkResolver: post URL to downloadable resources
//! - store: content-addressed file storage
//! - prune: removal of content owned by ignored counterparts
//! - Harvester: the sequential harvest loop

pub mod harvester;
pub mod prune;
pub mod registry;
pub mod resolver;
pub mod routing;
pub mod store;

// Re-export commonly used types
pub use harvester::{
    HarvestReport, HarvestScope, Harvester, Prompt, RetrievalStatus, Shutdown, StreamPoller,
};
pub use prune::prune;
pub use registry::EntityRegistry;
pub use resolver::LinkResolver;
pub use routing::{DropReason, Route, Router, StorageTarget};
pub use store::{SaveOutcome, StorageError};
