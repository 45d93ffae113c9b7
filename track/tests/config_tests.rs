use std::fs;

use reveal_track::config::{ConfigError, TrackConfig};
use reveal_track::countdown::DisplayZone;
use reveal_track::tile::{ContentMode, RarityTag};
use tempfile::tempdir;

const TRACK: &str = r#"{
    "content_mode": "static_url",
    "display_zone": "utc",
    "tick_millis": 250,
    "tiles": [
        {"id": "one", "title": "One", "rarity": "Legendary", "reveal_at": "2025-01-01T00:00:00Z",
         "icon": "1", "content_url": "https://example.com/one.png"},
        {"id": "two", "title": "Two", "rarity_label": "mythical", "reveal_at": "2025-02-01"}
    ]
}"#;

#[test]
fn loads_track_from_file() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("track.json");
    fs::write(&path, TRACK).expect("write");

    let config = TrackConfig::load(&path).expect("config should load");
    assert_eq!(config.content_mode, ContentMode::StaticUrl);
    assert_eq!(config.display_zone, DisplayZone::Utc);
    assert_eq!(config.tick_period().as_millis(), 250);
    assert_eq!(config.tiles.len(), 2);
    assert_eq!(config.tiles[0].content_url.as_deref(), Some("https://example.com/one.png"));
    assert_eq!(config.tiles[1].icon, "*");
    assert_eq!(config.tiles[1].rarity_tag(), RarityTag::Mythic);
}

#[test]
fn explicit_path_is_resolved_first() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("track.json");
    fs::write(&path, TRACK).expect("write");

    let config = TrackConfig::resolve(Some(&path)).expect("config should load");
    assert_eq!(config.tiles[0].id, "one");
}

#[test]
fn missing_file_reports_path() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("absent.json");
    let err = TrackConfig::load(&path).expect_err("missing file should fail");
    assert!(matches!(err, ConfigError::Read { path: ref p, .. } if p == &path));
}

#[test]
fn blank_ids_are_rejected() {
    let err = TrackConfig::from_json_str(
        r#"{"tiles":[{"id":"  ","title":"A","rarity":"Rare","reveal_at":"2025-01-01"}]}"#,
    )
    .expect_err("blank id should fail");
    assert!(matches!(err, ConfigError::BlankId(0)));
}

#[test]
fn unknown_content_mode_is_a_parse_error() {
    let err = TrackConfig::from_json_str(r#"{"content_mode":"video","tiles":[]}"#)
        .expect_err("unknown mode should fail");
    assert!(matches!(err, ConfigError::Parse(_)));
}
