use std::fs;

use reveal_track::store::{ImageBackend, ImageMap, ImageStore, JsonFileBackend};
use tempfile::tempdir;

#[test]
fn missing_file_loads_empty() {
    let dir = tempdir().expect("tempdir");
    let backend = JsonFileBackend::new(dir.path().join("images.json"));
    assert!(backend.load_all().is_empty());
}

#[test]
fn corrupt_file_loads_empty() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("images.json");
    fs::write(&path, "{ not json").expect("write");

    let store = ImageStore::open(JsonFileBackend::new(&path));
    assert!(store.is_empty());
}

#[test]
fn one_undecodable_entry_discards_the_whole_store() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("images.json");
    fs::write(
        &path,
        r#"{"version":1,"images":{"good":"AQID","bad":"!!not base64!!"}}"#,
    )
    .expect("write");

    assert!(JsonFileBackend::new(&path).load_all().is_empty());
}

#[test]
fn images_survive_reopening() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("nested").join("images.json");

    let mut store = ImageStore::open(JsonFileBackend::new(&path));
    store.put("ember", vec![1, 2, 3]).saved.expect("put");
    store.put("tide", vec![4]).saved.expect("put");
    assert!(path.exists(), "parent directories are created on first write");

    let reopened = ImageStore::open(JsonFileBackend::new(&path));
    assert_eq!(reopened.get("ember"), Some(&[1u8, 2, 3][..]));
    assert_eq!(reopened.get("tide"), Some(&[4u8][..]));
    assert_eq!(reopened.len(), 2);
}

#[test]
fn document_is_versioned_base64_json() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("images.json");
    let mut backend = JsonFileBackend::new(&path);
    let mut images = ImageMap::new();
    images.insert("a".to_string(), vec![1, 2, 3]);
    backend.save_all(&images).expect("save");

    let doc: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&path).expect("read")).expect("json");
    assert_eq!(doc["version"], 1);
    assert_eq!(doc["images"]["a"], "AQID");
}

#[test]
fn reset_empties_the_file() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("images.json");
    let mut store = ImageStore::open(JsonFileBackend::new(&path));
    store.put("a", vec![7]).saved.expect("put");
    store.reset().expect("reset");

    assert!(JsonFileBackend::new(&path).load_all().is_empty());
}

#[test]
fn explicit_path_wins_over_environment() {
    let dir = tempdir().expect("tempdir");
    let explicit = dir.path().join("explicit.json");
    let backend = JsonFileBackend::from_env(Some(&explicit));
    assert_eq!(backend.path(), explicit.as_path());
}

#[test]
fn unwritable_store_keeps_image_in_memory() {
    let dir = tempdir().expect("tempdir");
    // A regular file where the parent directory should be.
    let blocker = dir.path().join("blocker");
    fs::write(&blocker, "x").expect("write");

    let mut store = ImageStore::open(JsonFileBackend::new(blocker.join("images.json")));
    assert!(store.put("a", vec![1]).saved.is_err());
    assert!(store.contains("a"));

    let again = store.put("a", vec![2]);
    assert!(again.replaced);
    assert!(again.saved.is_err());
}

#[test]
fn failed_reset_keeps_images_in_memory() {
    let dir = tempdir().expect("tempdir");
    let blocker = dir.path().join("blocker");
    fs::write(&blocker, "x").expect("write");

    let mut store = ImageStore::open(JsonFileBackend::new(blocker.join("images.json")));
    let _ = store.put("a", vec![1]);
    let generation = store.generation();

    assert!(store.reset().is_err());
    assert!(store.contains("a"));
    assert_eq!(store.generation(), generation);
}
