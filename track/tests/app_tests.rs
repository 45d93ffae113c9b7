use std::fs;
use std::thread;
use std::time::{Duration, Instant};

use chrono::{DateTime, TimeDelta, Utc};
use engine::app::{KeyPress, TickApp};
use engine::surface::SurfaceSize;
use engine::ticker::Tick;
use engine::view_tree::hit_test;
use reveal_track::app::TrackApp;
use reveal_track::clock::{Clock, ManualClock};
use reveal_track::config::TrackConfig;
use reveal_track::draw::rarity_color;
use reveal_track::layout::{HEADER_H, PADDING, TILE_H, TrackAction, visible_tile_rect};
use reveal_track::renderer::{ContentRef, StatusLabel, TrackRenderer};
use reveal_track::store::{ImageStore, MemoryBackend};
use reveal_track::tile::{ContentMode, RarityTag, TileDescriptor};
use reveal_track::view::TrackView;
use tempfile::tempdir;

const SIZE: SurfaceSize = SurfaceSize::new(1280, 480);

fn at(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .expect("valid timestamp")
        .with_timezone(&Utc)
}

fn png_bytes() -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(8, 8, image::Rgba([10, 200, 10, 255]));
    let mut out = std::io::Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png)
        .expect("encode png");
    out.into_inner()
}

fn app_at(now: &str, backend: MemoryBackend) -> (TrackApp<ManualClock>, ManualClock) {
    let tiles = vec![
        TileDescriptor::new("open", "Open", "Rare", "2024-01-01T00:00:00Z"),
        TileDescriptor::new("soon", "Soon", "Legendary", "2025-01-01T00:00:00Z"),
        TileDescriptor::new("later", "Later", "Mythic", "2026-01-01T00:00:00Z"),
    ];
    let renderer = TrackRenderer::new(
        TrackConfig::new(ContentMode::UserUpload, tiles),
        ImageStore::open(backend),
    );
    let clock = ManualClock::new(at(now));
    let mut app = TrackApp::new(renderer, clock.clone());
    app.on_resize(SIZE);
    (app, clock)
}

fn tick() -> Tick {
    Tick { index: 1, missed: 0 }
}

fn wait_for_uploads(app: &mut TrackApp<ManualClock>) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !app.uploads().is_empty() && Instant::now() < deadline {
        app.poll_uploads();
        thread::sleep(Duration::from_millis(5));
    }
    assert!(app.uploads().is_empty(), "upload did not finish in time");
}

#[test]
fn tick_updates_countdown_then_reveals() {
    let (mut app, clock) = app_at("2024-12-31T23:59:58Z", MemoryBackend::new());
    assert_eq!(app.tiles()[1].countdown_text.as_deref(), Some("0m 2s"));

    clock.advance(TimeDelta::seconds(1));
    assert!(app.on_tick(tick()));
    assert_eq!(app.tiles()[1].countdown_text.as_deref(), Some("0m 1s"));

    clock.advance(TimeDelta::seconds(1));
    assert!(app.on_tick(tick()));
    assert!(!app.tiles()[1].is_locked);
    assert_eq!(app.tiles()[1].status_label, StatusLabel::Revealed);
}

#[test]
fn clicking_a_tile_opens_detail_and_escape_closes_it() {
    let (mut app, _clock) = app_at("2024-12-31T00:00:00Z", MemoryBackend::new());
    let rect = visible_tile_rect(1, app.scroll(), SIZE).expect("tile visible");
    let view = app.build_view(SIZE);
    let action = hit_test(&view, (rect.x + 5, rect.y + 5)).expect("tile is clickable");
    assert_eq!(action, TrackAction::SelectTile(1));

    assert!(app.on_action(action));
    assert_eq!(app.view(), TrackView::Detail { index: 1 });
    let detail = app.detail().expect("detail open");
    assert_eq!(detail.tile.id, "soon");
    assert!(!detail.can_upload);

    assert!(app.on_key(KeyPress::Escape));
    assert_eq!(app.view(), TrackView::Track);
    assert!(app.detail().is_none());
}

#[test]
fn open_detail_tracks_reveal_on_tick() {
    let (mut app, clock) = app_at("2024-12-31T23:59:59Z", MemoryBackend::new());
    app.on_action(TrackAction::SelectTile(1));
    assert!(app.detail().is_some_and(|d| d.tile.is_locked));

    clock.set(at("2025-01-01T00:00:00Z"));
    app.on_tick(tick());
    let detail = app.detail().expect("detail open");
    assert!(!detail.tile.is_locked);
    assert!(detail.can_upload);
}

#[test]
fn dropped_file_on_locked_tile_is_ignored() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("pic.png");
    fs::write(&path, png_bytes()).expect("write");

    let (mut app, _clock) = app_at("2024-12-31T00:00:00Z", MemoryBackend::new());
    assert!(!app.on_file_dropped(path.clone()));

    app.on_action(TrackAction::SelectTile(1));
    assert!(!app.on_file_dropped(path));
    assert!(app.uploads().is_empty());
}

#[test]
fn dropped_image_on_revealed_tile_is_stored() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("pic.png");
    fs::write(&path, png_bytes()).expect("write");

    let backend = MemoryBackend::new();
    let (mut app, _clock) = app_at("2024-12-31T00:00:00Z", backend.clone());
    app.on_action(TrackAction::SelectTile(0));
    assert!(app.on_file_dropped(path));
    wait_for_uploads(&mut app);

    assert_eq!(app.notice(), Some("IMAGE SAVED"));
    assert_eq!(app.tiles()[0].status_label, StatusLabel::Uploaded);
    assert_eq!(
        app.detail().map(|d| d.tile.content.clone()),
        Some(ContentRef::StoredImage {
            tile_id: "open".to_string()
        })
    );
    assert!(backend.snapshot().contains_key("open"));
}

#[test]
fn dropped_text_file_changes_nothing() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("notes.txt");
    fs::write(&path, "just words").expect("write");

    let backend = MemoryBackend::new();
    let (mut app, _clock) = app_at("2024-12-31T00:00:00Z", backend.clone());
    app.on_action(TrackAction::SelectTile(0));
    app.on_file_dropped(path);
    wait_for_uploads(&mut app);

    assert_eq!(app.notice(), Some("NOT AN IMAGE"));
    assert_eq!(app.tiles()[0].status_label, StatusLabel::Revealed);
    assert_eq!(backend.save_count(), 0);
}

#[test]
fn reset_key_clears_images() {
    let mut seeded = reveal_track::store::ImageMap::new();
    seeded.insert("open".to_string(), png_bytes());
    let backend = MemoryBackend::with_images(seeded);
    let (mut app, _clock) = app_at("2024-12-31T00:00:00Z", backend.clone());
    assert_eq!(app.tiles()[0].status_label, StatusLabel::Uploaded);

    assert!(app.on_key(KeyPress::Char('r')));
    assert_eq!(app.tiles()[0].status_label, StatusLabel::Revealed);
    assert!(backend.snapshot().is_empty());
}

#[test]
fn next_key_scrolls_to_first_locked_tile() {
    let tiles: Vec<TileDescriptor> = (0..12)
        .map(|i| {
            let year = if i < 9 { 2020 } else { 2030 };
            TileDescriptor::new(format!("t{i}"), format!("T{i}"), "Rare", format!("{year}-01-01"))
        })
        .collect();
    let renderer = TrackRenderer::new(
        TrackConfig::new(ContentMode::IconOnly, tiles),
        ImageStore::open(MemoryBackend::new()),
    );
    let clock = ManualClock::new(at("2025-01-01T00:00:00Z"));
    let mut app = TrackApp::new(renderer, clock);
    let narrow = SurfaceSize::new(640, 480);
    app.on_resize(narrow);

    // The first layout already centres the next locked tile.
    let first = app.scroll();
    assert!(first > 0);
    assert!(visible_tile_rect(9, first, narrow).is_some());

    assert!(app.on_key(KeyPress::Home));
    assert_eq!(app.scroll(), 0);
    assert!(app.on_key(KeyPress::Char('n')));
    assert_eq!(app.scroll(), first);
}

#[test]
fn snapshot_paints_tiles_with_rarity_colours() {
    let (mut app, clock) = app_at("2024-12-31T00:00:00Z", MemoryBackend::new());
    assert_eq!(clock.now(), at("2024-12-31T00:00:00Z"));
    let frame = app.snapshot(SIZE);

    let edge_y = HEADER_H + PADDING + TILE_H / 2;
    assert_eq!(frame.pixel(PADDING, edge_y), Some(rarity_color(RarityTag::Rare)));
}

#[test]
fn detail_snapshot_dims_the_track() {
    let (mut app, _clock) = app_at("2024-12-31T00:00:00Z", MemoryBackend::new());
    let plain = app.snapshot(SIZE);
    app.on_action(TrackAction::SelectTile(0));
    let with_detail = app.snapshot(SIZE);

    let probe = (2, 2);
    let before = plain.pixel(probe.0, probe.1).expect("in bounds");
    let after = with_detail.pixel(probe.0, probe.1).expect("in bounds");
    assert!(after[0] < before[0] || after[2] < before[2]);
}
