//! Entity registry: who is followed, who is ignored.
//!
//! Built once from configuration and read-only afterwards. A name that is
//! both followed and ignored is treated as ignored: it is not harvested and
//! only acts as a filter.

use std::collections::{HashMap, HashSet};

use tracing::{info, warn};

use crate::config::HarvestConfig;
use crate::domain::{Entity, EntityKind};

type Key = (EntityKind, String);

/// Membership answers for `(kind, name)` pairs
#[derive(Debug, Clone, Default)]
pub struct EntityRegistry {
    followed: HashMap<Key, Entity>,
    /// Harvest order of followed entities
    order: Vec<Key>,
    ignored: HashSet<Key>,
    /// Ignored entries in configuration order
    ignored_order: Vec<Key>,
}

impl EntityRegistry {
    /// Build from followed entities and ignored `(kind, name)` pairs
    pub fn new<F, I>(followed: F, ignored: I) -> Self
    where
        F: IntoIterator<Item = Entity>,
        I: IntoIterator<Item = (EntityKind, String)>,
    {
        let mut registry = Self::default();

        for key in ignored {
            if registry.ignored.insert(key.clone()) {
                registry.ignored_order.push(key);
            }
        }

        for entity in followed {
            let key = (entity.kind, entity.name.clone());
            if registry.ignored.contains(&key) {
                info!("{} '{}' is also ignored, not harvesting it", entity.kind, entity.name);
                continue;
            }
            if registry.followed.contains_key(&key) {
                warn!("{} '{}' is configured twice, keeping the first", entity.kind, entity.name);
                continue;
            }
            registry.order.push(key.clone());
            registry.followed.insert(key, entity);
        }

        registry
    }

    /// Build from configuration: redditors first, then subreddits
    pub fn from_config(config: &HarvestConfig) -> Self {
        let followed = config
            .redditors
            .iter()
            .chain(config.subreddits.iter())
            .cloned();

        let ignored = config
            .ignored_redditors
            .iter()
            .map(|n| (EntityKind::Redditor, n.clone()))
            .chain(
                config
                    .ignored_subreddits
                    .iter()
                    .map(|n| (EntityKind::Subreddit, n.clone())),
            );

        Self::new(followed, ignored)
    }

    /// Followed, non-ignored entity with this identity
    pub fn followed(&self, kind: EntityKind, name: &str) -> Option<&Entity> {
        self.followed.get(&(kind, name.to_string()))
    }

    pub fn is_ignored(&self, kind: EntityKind, name: &str) -> bool {
        self.ignored.contains(&(kind, name.to_string()))
    }

    /// Followed or ignored
    pub fn is_configured(&self, kind: EntityKind, name: &str) -> bool {
        self.followed(kind, name).is_some() || self.is_ignored(kind, name)
    }

    /// Entities to harvest, in harvest order
    pub fn active_entities(&self) -> impl Iterator<Item = &Entity> {
        self.order.iter().filter_map(|key| self.followed.get(key))
    }

    /// Ignored names of one kind, in configuration order
    pub fn ignored_names(&self, kind: EntityKind) -> impl Iterator<Item = &str> {
        self.ignored_order
            .iter()
            .filter(move |(k, _)| *k == kind)
            .map(|(_, name)| name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::StoreType;

    fn sub(name: &str) -> Entity {
        Entity::new(EntityKind::Subreddit, name, StoreType::Nested)
    }

    fn user(name: &str) -> Entity {
        Entity::new(EntityKind::Redditor, name, StoreType::Flat)
    }

    #[test]
    fn test_ignored_wins_over_followed() {
        let registry = EntityRegistry::new(
            vec![sub("pics"), sub("aww")],
            vec![(EntityKind::Subreddit, "aww".to_string())],
        );

        assert!(registry.followed(EntityKind::Subreddit, "pics").is_some());
        assert!(registry.followed(EntityKind::Subreddit, "aww").is_none());
        assert!(registry.is_ignored(EntityKind::Subreddit, "aww"));
        assert!(registry.is_configured(EntityKind::Subreddit, "aww"));

        let active: Vec<_> = registry.active_entities().map(|e| e.name.as_str()).collect();
        assert_eq!(active, vec!["pics"]);
    }

    #[test]
    fn test_kinds_are_separate_namespaces() {
        let registry = EntityRegistry::new(
            vec![user("same")],
            vec![(EntityKind::Subreddit, "same".to_string())],
        );

        assert!(registry.followed(EntityKind::Redditor, "same").is_some());
        assert!(!registry.is_ignored(EntityKind::Redditor, "same"));
        assert!(registry.is_ignored(EntityKind::Subreddit, "same"));
    }

    #[test]
    fn test_names_are_case_sensitive() {
        let registry = EntityRegistry::new(vec![sub("Pics")], Vec::new());
        assert!(registry.followed(EntityKind::Subreddit, "Pics").is_some());
        assert!(registry.followed(EntityKind::Subreddit, "pics").is_none());
    }

    #[test]
    fn test_duplicates_keep_first() {
        let registry = EntityRegistry::new(
            vec![sub("pics").with_alias("first"), sub("pics").with_alias("second")],
            Vec::new(),
        );
        assert_eq!(registry.active_entities().count(), 1);
        assert_eq!(
            registry
                .followed(EntityKind::Subreddit, "pics")
                .unwrap()
                .folder_name(),
            "first"
        );
    }

    #[test]
    fn test_from_config_orders_redditors_first() {
        let mut config = HarvestConfig::new("/tmp/data");
        config.subreddits.push(sub("pics"));
        config.redditors.push(user("someone"));
        config.ignored_redditors.push("spammer".to_string());

        let registry = EntityRegistry::from_config(&config);
        let active: Vec<_> = registry.active_entities().map(|e| e.name.as_str()).collect();
        assert_eq!(active, vec!["someone", "pics"]);

        let ignored: Vec<_> = registry.ignored_names(EntityKind::Redditor).collect();
        assert_eq!(ignored, vec!["spammer"]);
        assert_eq!(registry.ignored_names(EntityKind::Subreddit).count(), 0);
    }
}
