//! Routing engine: decides which entity owns a post's content.
//!
//! A post has two sides, its author and its source feed. Each side may be
//! followed, ignored, or unknown to the configuration. When both sides are
//! configured (an overlap) the `favor_entity` rule breaks the tie, and
//! `disabled` drops the post instead of guessing.

use std::path::{Path, PathBuf};

use crate::config::FavorEntity;
use crate::domain::{folder_segment, Entity, EntityKind, MediaKind, Post, StoreType};

use super::registry::EntityRegistry;

/// Where a post's content lands
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageTarget {
    /// Winning entity
    pub owner: Entity,

    /// Name on the other side of the post
    pub counterpart: String,

    root: PathBuf,
    relative: PathBuf,
    separate_media: bool,
}

impl StorageTarget {
    /// Folder for content of the given media kind
    pub fn folder(&self, media: MediaKind) -> PathBuf {
        let mut folder = self.root.clone();
        if self.separate_media {
            if let Some(segment) = media.folder() {
                folder.push(segment);
            }
        }
        folder.join(&self.relative)
    }

    /// Path below the download root, without any media segment
    pub fn relative(&self) -> &Path {
        &self.relative
    }
}

/// Why a post was not routed anywhere
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropReason {
    /// Both sides are ignored
    Ignored,

    /// Neither side is a followed entity
    Unowned,

    /// Overlap with `favor_entity = disabled`
    AmbiguousOverlap {
        author: Option<Entity>,
        feed: Option<Entity>,
    },
}

impl std::fmt::Display for DropReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DropReason::Ignored => write!(f, "author and subreddit are both ignored"),
            DropReason::Unowned => write!(f, "no followed entity owns this post"),
            DropReason::AmbiguousOverlap { .. } => {
                write!(f, "overlapping entities and favor_entity is disabled")
            }
        }
    }
}

/// Routing decision for one post
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Target(StorageTarget),
    Dropped(DropReason),
}

struct Side<'a> {
    followed: Option<&'a Entity>,
    ignored: bool,
}

impl Side<'_> {
    fn configured(&self) -> bool {
        self.followed.is_some() || self.ignored
    }
}

/// Routes posts to storage targets
#[derive(Debug, Clone)]
pub struct Router {
    registry: EntityRegistry,
    favor: FavorEntity,
    root: PathBuf,
    separate_media: bool,
}

impl Router {
    pub fn new(
        registry: EntityRegistry,
        favor: FavorEntity,
        root: impl Into<PathBuf>,
        separate_media: bool,
    ) -> Self {
        Self {
            registry,
            favor,
            root: root.into(),
            separate_media,
        }
    }

    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    /// Decide ownership of a post.
    ///
    /// `origin` is the entity whose listing produced the post; it stands in
    /// for the registry lookup on its own side, since upstream may report
    /// the name with different casing than the configuration uses.
    pub fn route(&self, post: &Post, origin: Option<&Entity>) -> Route {
        let author = self.side(EntityKind::Redditor, post, origin);
        let feed = self.side(EntityKind::Subreddit, post, origin);

        if author.ignored && feed.ignored {
            return Route::Dropped(DropReason::Ignored);
        }

        let owner = match (author.followed, feed.followed) {
            (None, None) if author.ignored || feed.ignored => {
                return Route::Dropped(DropReason::Ignored)
            }
            (None, None) => return Route::Dropped(DropReason::Unowned),
            (Some(a), None) if !feed.configured() => a,
            (None, Some(f)) if !author.configured() => f,
            // overlap: both followed, or a followed side facing an ignored one
            (a, f) => match self.favor {
                FavorEntity::Redditor => match a.or(f) {
                    Some(owner) => owner,
                    None => return Route::Dropped(DropReason::Unowned),
                },
                FavorEntity::Subreddit => match f.or(a) {
                    Some(owner) => owner,
                    None => return Route::Dropped(DropReason::Unowned),
                },
                FavorEntity::Disabled => {
                    return Route::Dropped(DropReason::AmbiguousOverlap {
                        author: a.cloned(),
                        feed: f.cloned(),
                    })
                }
            },
        };

        Route::Target(self.target_for(owner, post))
    }

    /// Build the storage target for a chosen owner
    pub fn target_for(&self, owner: &Entity, post: &Post) -> StorageTarget {
        let counterpart = post.name_for(owner.kind.counterpart()).to_string();

        let relative = match owner.store_type {
            StoreType::ReallyFlat => PathBuf::new(),
            StoreType::Flat => PathBuf::from(folder_segment(owner.folder_name())),
            StoreType::Nested => PathBuf::from(folder_segment(owner.folder_name()))
                .join(folder_segment(&counterpart)),
        };

        StorageTarget {
            owner: owner.clone(),
            counterpart,
            root: self.root.clone(),
            relative,
            separate_media: self.separate_media,
        }
    }

    fn side<'a>(&'a self, kind: EntityKind, post: &Post, origin: Option<&'a Entity>) -> Side<'a> {
        let name = post.name_for(kind);
        let followed = match origin {
            Some(o) if o.kind == kind => Some(o),
            _ => self.registry.followed(kind, name),
        };
        Side {
            followed,
            ignored: self.registry.is_ignored(kind, name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_folder_stays_below_root() {
        let entity = Entity::new(EntityKind::Subreddit, "pics", StoreType::Nested).with_alias("/etc");
        let post = Post::new("1", "../up", "pics", "https://i.redd.it/x.jpg");

        let router = Router::new(EntityRegistry::default(), FavorEntity::Redditor, "/data", false);
        let target = router.target_for(&entity, &post);
        assert_eq!(target.folder(MediaKind::Image), PathBuf::from("/data/_etc/.._up"));
    }

    #[test]
    fn test_media_segment_only_when_separating() {
        let entity = Entity::new(EntityKind::Subreddit, "pics", StoreType::Flat);
        let post = Post::new("1", "someone", "pics", "https://i.redd.it/x.jpg");

        let plain = Router::new(EntityRegistry::default(), FavorEntity::Redditor, "/data", false);
        let target = plain.target_for(&entity, &post);
        assert_eq!(target.folder(MediaKind::Image), PathBuf::from("/data/pics"));

        let split = Router::new(EntityRegistry::default(), FavorEntity::Redditor, "/data", true);
        let target = split.target_for(&entity, &post);
        assert_eq!(target.folder(MediaKind::Image), PathBuf::from("/data/image/pics"));
        assert_eq!(target.folder(MediaKind::Video), PathBuf::from("/data/video/pics"));
        assert_eq!(target.folder(MediaKind::Unknown), PathBuf::from("/data/pics"));
    }
}
