//! Content Store Integration Tests
//!
//! Content-addressed naming, folder-scoped deduplication and the
//! filesystem-as-seen-set contract.

use std::fs;

use redd_harvest::core::store::{digest, save, SaveOutcome};
use tempfile::TempDir;

#[test]
fn test_file_named_by_content_hash() {
    let dir = TempDir::new().unwrap();
    let bytes = b"\x89PNG\r\n\x1a\nnot really a png";

    let outcome = save(bytes, "png", dir.path()).unwrap();

    let expected = dir.path().join(format!("{}.png", digest(bytes)));
    assert_eq!(outcome, SaveOutcome::Stored(expected.clone()));
    assert_eq!(fs::read(expected).unwrap(), bytes);
}

#[test]
fn test_second_save_is_deduplicated() {
    let dir = TempDir::new().unwrap();

    assert!(save(b"same", "jpg", dir.path()).unwrap().is_new());
    let again = save(b"same", "jpg", dir.path()).unwrap();

    assert!(matches!(again, SaveOutcome::Deduplicated(_)));
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[test]
fn test_dedup_is_scoped_to_folder() {
    let dir = TempDir::new().unwrap();
    let a = dir.path().join("someone");
    let b = dir.path().join("pics").join("someone");

    assert!(save(b"shared", "gif", &a).unwrap().is_new());
    assert!(save(b"shared", "gif", &b).unwrap().is_new());

    let name = format!("{}.gif", digest(b"shared"));
    assert!(a.join(&name).exists());
    assert!(b.join(&name).exists());
}

#[test]
fn test_truncated_file_still_counts_as_seen() {
    let dir = TempDir::new().unwrap();
    let stored = save(b"original content", "mp4", dir.path()).unwrap();

    fs::write(stored.path(), b"").unwrap();

    let again = save(b"original content", "mp4", dir.path()).unwrap();
    assert!(matches!(again, SaveOutcome::Deduplicated(_)));
    assert_eq!(fs::metadata(stored.path()).unwrap().len(), 0);
}

#[test]
fn test_deleted_file_is_downloaded_again() {
    let dir = TempDir::new().unwrap();
    let stored = save(b"content", "jpg", dir.path()).unwrap();

    fs::remove_file(stored.path()).unwrap();

    assert!(save(b"content", "jpg", dir.path()).unwrap().is_new());
}

#[test]
fn test_no_temp_files_left_behind() {
    let dir = TempDir::new().unwrap();
    for i in 0..5u8 {
        save(&[i; 16], "bin", dir.path()).unwrap();
    }

    let names: Vec<String> = fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names.len(), 5);
    assert!(names.iter().all(|n| n.ends_with(".bin") && n.len() == 64 + 4));
}
