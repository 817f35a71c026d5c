//! Routing Integration Tests
//!
//! Ownership decisions for overlapping and ignored entities, and the
//! folder layout each store type produces.

use std::path::PathBuf;

use redd_harvest::config::FavorEntity;
use redd_harvest::core::{DropReason, EntityRegistry, Route, Router, StorageTarget};
use redd_harvest::domain::{Entity, EntityKind, MediaKind, Post, StoreType};

fn sub(name: &str, store_type: StoreType) -> Entity {
    Entity::new(EntityKind::Subreddit, name, store_type)
}

fn user(name: &str, store_type: StoreType) -> Entity {
    Entity::new(EntityKind::Redditor, name, store_type)
}

fn post(author: &str, feed: &str) -> Post {
    Post::new("p1", author, feed, "https://i.redd.it/x.jpg")
}

fn router(registry: EntityRegistry, favor: FavorEntity) -> Router {
    Router::new(registry, favor, "/data", false)
}

fn target(route: Route) -> StorageTarget {
    match route {
        Route::Target(target) => target,
        Route::Dropped(reason) => panic!("expected a target, got dropped: {}", reason),
    }
}

fn overlap_registry() -> EntityRegistry {
    EntityRegistry::new(
        vec![user("someone", StoreType::Flat), sub("pics", StoreType::Nested)],
        Vec::new(),
    )
}

#[test]
fn test_single_followed_side_owns_post() {
    let r = router(overlap_registry(), FavorEntity::Disabled);

    let t = target(r.route(&post("stranger", "pics"), None));
    assert_eq!(t.owner.name, "pics");
    assert_eq!(t.counterpart, "stranger");
    assert_eq!(t.folder(MediaKind::Image), PathBuf::from("/data/pics/stranger"));
}

#[test]
fn test_overlap_favors_redditor() {
    let r = router(overlap_registry(), FavorEntity::Redditor);
    let t = target(r.route(&post("someone", "pics"), None));
    assert_eq!(t.owner.kind, EntityKind::Redditor);
    assert_eq!(t.folder(MediaKind::Image), PathBuf::from("/data/someone"));
}

#[test]
fn test_overlap_favors_subreddit() {
    let r = router(overlap_registry(), FavorEntity::Subreddit);
    let t = target(r.route(&post("someone", "pics"), None));
    assert_eq!(t.owner.kind, EntityKind::Subreddit);
    assert_eq!(t.folder(MediaKind::Image), PathBuf::from("/data/pics/someone"));
}

#[test]
fn test_overlap_disabled_drops_post() {
    let r = router(overlap_registry(), FavorEntity::Disabled);
    match r.route(&post("someone", "pics"), None) {
        Route::Dropped(DropReason::AmbiguousOverlap { author, feed }) => {
            assert_eq!(author.unwrap().name, "someone");
            assert_eq!(feed.unwrap().name, "pics");
        }
        other => panic!("expected ambiguous overlap, got {:?}", other),
    }
}

#[test]
fn test_both_sides_ignored_drops_post() {
    let registry = EntityRegistry::new(
        Vec::new(),
        vec![
            (EntityKind::Redditor, "spammer".to_string()),
            (EntityKind::Subreddit, "junk".to_string()),
        ],
    );
    let r = router(registry, FavorEntity::Redditor);
    assert_eq!(
        r.route(&post("spammer", "junk"), None),
        Route::Dropped(DropReason::Ignored)
    );
}

#[test]
fn test_unowned_post_is_dropped() {
    let r = router(overlap_registry(), FavorEntity::Redditor);
    assert_eq!(
        r.route(&post("stranger", "elsewhere"), None),
        Route::Dropped(DropReason::Unowned)
    );
}

#[test]
fn test_ignored_counterpart_follows_favor_rule() {
    let registry = EntityRegistry::new(
        vec![sub("pics", StoreType::Nested)],
        vec![(EntityKind::Redditor, "spammer".to_string())],
    );

    // the followed side still owns it; pruning removes it later
    let favor_user = router(registry.clone(), FavorEntity::Redditor);
    let t = target(favor_user.route(&post("spammer", "pics"), None));
    assert_eq!(t.folder(MediaKind::Image), PathBuf::from("/data/pics/spammer"));

    let disabled = router(registry, FavorEntity::Disabled);
    assert!(matches!(
        disabled.route(&post("spammer", "pics"), None),
        Route::Dropped(DropReason::AmbiguousOverlap { author: None, .. })
    ));
}

#[test]
fn test_origin_owns_its_own_side() {
    let r = router(overlap_registry(), FavorEntity::Subreddit);
    // upstream reported different casing than the configuration
    let origin = sub("pics", StoreType::Nested);
    let t = target(r.route(&post("stranger", "Pics"), Some(&origin)));
    assert_eq!(t.owner.name, "pics");
}

#[test]
fn test_store_type_layouts() {
    let registry = EntityRegistry::new(
        vec![
            sub("nested_sub", StoreType::Nested),
            sub("flat_sub", StoreType::Flat).with_alias("renamed"),
            sub("really_flat_sub", StoreType::ReallyFlat),
        ],
        Vec::new(),
    );
    let r = router(registry, FavorEntity::Redditor);

    let folder = |feed: &str| target(r.route(&post("someone", feed), None)).folder(MediaKind::Video);
    assert_eq!(folder("nested_sub"), PathBuf::from("/data/nested_sub/someone"));
    assert_eq!(folder("flat_sub"), PathBuf::from("/data/renamed"));
    assert_eq!(folder("really_flat_sub"), PathBuf::from("/data"));
}

#[test]
fn test_separate_media_prefixes_folder() {
    let r = Router::new(overlap_registry(), FavorEntity::Subreddit, "/data", true);
    let t = target(r.route(&post("someone", "pics"), None));
    assert_eq!(t.folder(MediaKind::Video), PathBuf::from("/data/video/pics/someone"));
    assert_eq!(t.relative(), PathBuf::from("pics/someone").as_path());
}
