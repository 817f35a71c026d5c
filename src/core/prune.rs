//! Pruner: removes nested content that now belongs to an ignored counterpart.
//!
//! Only `nested` entities keep the counterpart name in the path, so only
//! they can be pruned. Folders are looked up by the entity's configured
//! name; an aliased entity is not detected.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::domain::{folder_segment, MediaKind, StoreType};

use super::registry::EntityRegistry;

/// Remove `<root>[/<media>]/<entity>/<ignored counterpart>` subtrees.
///
/// Returns the number of subtrees removed. Failures are logged and skipped.
pub fn prune(registry: &EntityRegistry, root: &Path, separate_media: bool) -> usize {
    let bases = base_folders(root, separate_media);
    let mut removed = 0;

    for entity in registry.active_entities() {
        if entity.store_type != StoreType::Nested {
            continue;
        }

        let owner = folder_segment(&entity.name);
        for ignored in registry.ignored_names(entity.kind.counterpart()) {
            // same segment mapping the router uses when storing
            let counterpart = folder_segment(ignored);
            for base in &bases {
                let folder = base.join(&owner).join(&counterpart);
                debug!("Checking for {}", folder.display());

                match remove_folder(&folder) {
                    Ok(true) => {
                        info!("Pruned {}", folder.display());
                        removed += 1;
                    }
                    Ok(false) => {}
                    Err(e) => warn!("Failed to prune {}: {}", folder.display(), e),
                }
            }
        }
    }

    removed
}

fn base_folders(root: &Path, separate_media: bool) -> Vec<PathBuf> {
    let mut bases = vec![root.to_path_buf()];
    if separate_media {
        bases.extend(
            [MediaKind::Image, MediaKind::Video]
                .into_iter()
                .filter_map(|kind| kind.folder())
                .map(|segment| root.join(segment)),
        );
    }
    bases
}

/// Ok(false) when there is nothing to remove
fn remove_folder(folder: &Path) -> io::Result<bool> {
    let meta = match fs::symlink_metadata(folder) {
        Ok(meta) => meta,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e),
    };

    // never follow a link out of the download tree
    if meta.is_dir() {
        fs::remove_dir_all(folder)?;
    } else {
        fs::remove_file(folder)?;
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Entity, EntityKind};
    use tempfile::TempDir;

    #[test]
    fn test_flat_entities_are_untouched() {
        let dir = TempDir::new().unwrap();
        let keep = dir.path().join("someone").join("banned_sub");
        fs::create_dir_all(&keep).unwrap();

        let registry = EntityRegistry::new(
            vec![Entity::new(EntityKind::Redditor, "someone", StoreType::Flat)],
            vec![(EntityKind::Subreddit, "banned_sub".to_string())],
        );

        assert_eq!(prune(&registry, dir.path(), false), 0);
        assert!(keep.exists());
    }

    #[test]
    fn test_media_folders_pruned_when_separating() {
        let dir = TempDir::new().unwrap();
        let image = dir.path().join("image").join("pics").join("spammer");
        let video = dir.path().join("video").join("pics").join("spammer");
        fs::create_dir_all(&image).unwrap();
        fs::create_dir_all(&video).unwrap();

        let registry = EntityRegistry::new(
            vec![Entity::new(EntityKind::Subreddit, "pics", StoreType::Nested)],
            vec![(EntityKind::Redditor, "spammer".to_string())],
        );

        assert_eq!(prune(&registry, dir.path(), true), 2);
        assert!(!image.exists());
        assert!(!video.exists());
        assert!(dir.path().join("image").join("pics").exists());
    }
}
