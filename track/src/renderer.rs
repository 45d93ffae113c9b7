//! The render cycle: per-tile presentations, countdown ticks and transition detection.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::TrackConfig;
use crate::countdown::{DisplayZone, format_countdown, format_reveal_instant};
use crate::schedule::{RevealState, find_next_locked, next_reveal, remaining, reveal_state};
use crate::store::{ImageStore, StoreError, sniff_image_format};
use crate::tile::{ContentMode, RarityTag, TileDescriptor};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusLabel {
    Locked,
    Revealed,
    /// Revealed and showing a user-uploaded image.
    Uploaded,
    InvalidTime,
}

impl StatusLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Locked => "LOCKED",
            Self::Revealed => "REVEALED",
            Self::Uploaded => "UPLOADED",
            Self::InvalidTime => "INVALID TIME",
        }
    }
}

impl fmt::Display for StatusLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContentRef {
    /// Locked tiles never expose their content.
    Hidden,
    Icon { glyph: String },
    Url { url: String },
    /// Bytes live in the image store under `tile_id`.
    StoredImage { tile_id: String },
}

/// Everything the display surface needs to draw one tile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TilePresentation {
    pub id: String,
    pub title: String,
    pub rarity_label: String,
    pub rarity_tag: RarityTag,
    pub is_locked: bool,
    pub status_label: StatusLabel,
    pub formatted_reveal_instant: String,
    pub countdown_text: Option<String>,
    pub content: ContentRef,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetailPresentation {
    pub index: usize,
    pub tile: TilePresentation,
    pub can_upload: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountdownUpdate {
    pub index: usize,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// No tile changed state; only these countdown texts moved.
    Countdowns(Vec<CountdownUpdate>),
    /// At least one tile changed state, so a full render pass was run.
    Rerendered {
        transitioned: Vec<usize>,
        tiles: Vec<TilePresentation>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadOutcome {
    Stored { replaced: bool, persisted: bool },
    UnknownTile,
    UploadsDisabled,
    NotRevealed,
    NotAnImage,
}

impl UploadOutcome {
    pub fn is_stored(self) -> bool {
        matches!(self, Self::Stored { .. })
    }
}

pub struct TrackRenderer {
    tiles: Vec<TileDescriptor>,
    content_mode: ContentMode,
    display_zone: DisplayZone,
    store: ImageStore,
    /// Revealed flags as of the last render pass; the baseline ticks diff against.
    rendered: Option<Vec<bool>>,
    persist_error: Option<StoreError>,
}

impl TrackRenderer {
    pub fn new(config: TrackConfig, store: ImageStore) -> Self {
        Self {
            tiles: config.tiles,
            content_mode: config.content_mode,
            display_zone: config.display_zone,
            store,
            rendered: None,
            persist_error: None,
        }
    }

    pub fn tiles(&self) -> &[TileDescriptor] {
        &self.tiles
    }

    pub fn content_mode(&self) -> ContentMode {
        self.content_mode
    }

    pub fn store(&self) -> &ImageStore {
        &self.store
    }

    pub fn index_of(&self, tile_id: &str) -> Option<usize> {
        self.tiles.iter().position(|t| t.id == tile_id)
    }

    fn present(&self, tile: &TileDescriptor, now: DateTime<Utc>) -> TilePresentation {
        let reveal_at = tile.reveal_instant();
        let state = reveal_state(tile, now);
        let content = self.content_for(tile, state);

        let status_label = match (state, &content) {
            (RevealState::InvalidSchedule, _) => StatusLabel::InvalidTime,
            (RevealState::Locked, _) => StatusLabel::Locked,
            (RevealState::Revealed, ContentRef::StoredImage { .. }) => StatusLabel::Uploaded,
            (RevealState::Revealed, _) => StatusLabel::Revealed,
        };
        let countdown_text = match (state, reveal_at) {
            (RevealState::Locked, Some(at)) => Some(format_countdown(remaining(at, now))),
            _ => None,
        };

        TilePresentation {
            id: tile.id.clone(),
            title: tile.title.clone(),
            rarity_label: tile.rarity.clone(),
            rarity_tag: tile.rarity_tag(),
            is_locked: !state.is_revealed(),
            status_label,
            formatted_reveal_instant: format_reveal_instant(reveal_at, self.display_zone),
            countdown_text,
            content,
        }
    }

    fn content_for(&self, tile: &TileDescriptor, state: RevealState) -> ContentRef {
        if !state.is_revealed() {
            return ContentRef::Hidden;
        }
        let icon = || ContentRef::Icon {
            glyph: tile.icon.clone(),
        };
        match self.content_mode {
            ContentMode::StaticUrl => match &tile.content_url {
                Some(url) => ContentRef::Url { url: url.clone() },
                None => icon(),
            },
            ContentMode::UserUpload if self.store.contains(&tile.id) => ContentRef::StoredImage {
                tile_id: tile.id.clone(),
            },
            ContentMode::UserUpload | ContentMode::IconOnly => icon(),
        }
    }

    /// Rebuilds every presentation from scratch against `now`.
    pub fn render_pass(&mut self, now: DateTime<Utc>) -> Vec<TilePresentation> {
        let tiles: Vec<TilePresentation> = self.tiles.iter().map(|t| self.present(t, now)).collect();
        self.rendered = Some(tiles.iter().map(|t| !t.is_locked).collect());
        tiles
    }

    /// One timer tick: recompute every state, and either report countdown text changes or, if
    /// any tile's state differs from the last render pass, run exactly one full pass.
    pub fn tick(&mut self, now: DateTime<Utc>) -> TickOutcome {
        let Some(rendered) = self.rendered.as_deref() else {
            return TickOutcome::Rerendered {
                transitioned: Vec::new(),
                tiles: self.render_pass(now),
            };
        };

        let mut transitioned = Vec::new();
        let mut relocked = Vec::new();
        let mut updates = Vec::new();
        for (index, tile) in self.tiles.iter().enumerate() {
            let was_revealed = rendered.get(index).copied().unwrap_or(false);
            match (reveal_state(tile, now), tile.reveal_instant()) {
                (RevealState::Revealed, _) if !was_revealed => transitioned.push(index),
                (RevealState::Locked, _) if was_revealed => relocked.push(index),
                (RevealState::Locked, Some(at)) => updates.push(CountdownUpdate {
                    index,
                    text: format_countdown(remaining(at, now)),
                }),
                _ => {}
            }
        }

        if transitioned.is_empty() && relocked.is_empty() {
            return TickOutcome::Countdowns(updates);
        }
        for &index in &transitioned {
            tracing::info!(tile = %self.tiles[index].id, %now, "tile revealed");
        }
        if !relocked.is_empty() {
            tracing::warn!(tiles = ?relocked, %now, "clock moved backwards; tiles locked again");
        }
        TickOutcome::Rerendered {
            transitioned,
            tiles: self.render_pass(now),
        }
    }

    /// Detail view for the tile at `index`, recomputed against `now` rather than taken from the
    /// last render pass.
    pub fn detail_at(&self, index: usize, now: DateTime<Utc>) -> Option<DetailPresentation> {
        let tile = self.tiles.get(index)?;
        let presentation = self.present(tile, now);
        Some(DetailPresentation {
            index,
            can_upload: self.content_mode.accepts_uploads() && !presentation.is_locked,
            tile: presentation,
        })
    }

    pub fn open_detail(&self, tile_id: &str, now: DateTime<Utc>) -> Option<DetailPresentation> {
        self.detail_at(self.index_of(tile_id)?, now)
    }

    /// Stores an uploaded image if the tile accepts one right now.
    ///
    /// Every rejection leaves the store untouched. Eligibility is evaluated at `now`, which for
    /// asynchronous reads is the moment the read completed.
    pub fn upload_image(&mut self, tile_id: &str, bytes: Vec<u8>, now: DateTime<Utc>) -> UploadOutcome {
        let Some(index) = self.index_of(tile_id) else {
            return UploadOutcome::UnknownTile;
        };
        if !self.content_mode.accepts_uploads() {
            return UploadOutcome::UploadsDisabled;
        }
        if !reveal_state(&self.tiles[index], now).is_revealed() {
            tracing::debug!(tile = tile_id, "upload ignored; tile is locked");
            return UploadOutcome::NotRevealed;
        }
        let Some(format) = sniff_image_format(&bytes) else {
            tracing::debug!(tile = tile_id, len = bytes.len(), "upload ignored; not an image");
            return UploadOutcome::NotAnImage;
        };

        let len = bytes.len();
        let put = self.store.put(tile_id, bytes);
        let persisted = match put.saved {
            Ok(()) => {
                tracing::info!(tile = tile_id, ?format, len, replaced = put.replaced, "image stored");
                self.persist_error = None;
                true
            }
            Err(err) => {
                tracing::error!(tile = tile_id, %err, "image kept in memory but not persisted");
                self.persist_error = Some(err);
                false
            }
        };
        UploadOutcome::Stored {
            replaced: put.replaced,
            persisted,
        }
    }

    /// The error behind the most recent `Stored { persisted: false }`, if not yet taken.
    pub fn take_persist_error(&mut self) -> Option<StoreError> {
        self.persist_error.take()
    }

    pub fn reset_images(&mut self) -> Result<(), StoreError> {
        tracing::info!(count = self.store.len(), "clearing stored images");
        self.store.reset()
    }

    pub fn next_locked(&self, now: DateTime<Utc>) -> Option<usize> {
        find_next_locked(&self.tiles, now)
    }

    pub fn next_reveal(&self, now: DateTime<Utc>) -> Option<(usize, DateTime<Utc>)> {
        next_reveal(&self.tiles, now)
    }

    pub fn revealed_count(&self, now: DateTime<Utc>) -> usize {
        self.tiles
            .iter()
            .filter(|t| reveal_state(t, now).is_revealed())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryBackend;
    use chrono::TimeDelta;

    fn at(raw: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(raw)
            .expect("valid timestamp")
            .with_timezone(&Utc)
    }

    fn renderer(mode: ContentMode, tiles: Vec<TileDescriptor>) -> TrackRenderer {
        let mut config = TrackConfig::new(mode, tiles);
        config.display_zone = DisplayZone::Utc;
        TrackRenderer::new(config, ImageStore::open(MemoryBackend::new()))
    }

    #[test]
    fn first_tick_runs_a_full_pass() {
        let mut r = renderer(
            ContentMode::IconOnly,
            vec![TileDescriptor::new("a", "A", "Rare", "2025-01-01T00:00:00Z")],
        );
        let outcome = r.tick(at("2024-12-31T23:59:00Z"));
        assert!(matches!(outcome, TickOutcome::Rerendered { ref transitioned, .. } if transitioned.is_empty()));
    }

    #[test]
    fn locked_presentation_hides_content_and_counts_down() {
        let mut r = renderer(
            ContentMode::IconOnly,
            vec![TileDescriptor::new("a", "A", "Epic", "2025-01-01T00:00:00Z").with_icon("!")],
        );
        let tiles = r.render_pass(at("2024-12-31T23:58:59Z"));
        let t = &tiles[0];
        assert!(t.is_locked);
        assert_eq!(t.status_label, StatusLabel::Locked);
        assert_eq!(t.countdown_text.as_deref(), Some("1m 1s"));
        assert_eq!(t.content, ContentRef::Hidden);
        assert_eq!(t.rarity_tag, RarityTag::Epic);
        assert_eq!(t.formatted_reveal_instant, "2025-01-01 00:00 UTC");
    }

    #[test]
    fn tick_without_transition_only_updates_countdowns() {
        let mut r = renderer(
            ContentMode::IconOnly,
            vec![
                TileDescriptor::new("a", "A", "Rare", "2025-01-01T00:00:00Z"),
                TileDescriptor::new("b", "B", "Rare", "2024-01-01T00:00:00Z"),
                TileDescriptor::new("c", "C", "Rare", "whenever"),
            ],
        );
        let now = at("2024-12-31T23:00:00Z");
        r.render_pass(now);

        let outcome = r.tick(now + TimeDelta::seconds(1));
        assert_eq!(
            outcome,
            TickOutcome::Countdowns(vec![CountdownUpdate {
                index: 0,
                text: "59m 59s".to_string(),
            }])
        );
    }

    #[test]
    fn tick_at_reveal_instant_rerenders_once() {
        let mut r = renderer(
            ContentMode::IconOnly,
            vec![TileDescriptor::new("a", "A", "Rare", "2025-01-01T00:00:00Z").with_icon("@")],
        );
        r.render_pass(at("2024-12-31T23:59:59Z"));

        let TickOutcome::Rerendered { transitioned, tiles } = r.tick(at("2025-01-01T00:00:00Z")) else {
            panic!("reveal should trigger a render pass");
        };
        assert_eq!(transitioned, vec![0]);
        assert!(!tiles[0].is_locked);
        assert_eq!(tiles[0].status_label, StatusLabel::Revealed);
        assert_eq!(tiles[0].content, ContentRef::Icon { glyph: "@".to_string() });
        assert_eq!(tiles[0].countdown_text, None);

        // The next tick sees no new transition.
        assert_eq!(
            r.tick(at("2025-01-01T00:00:01Z")),
            TickOutcome::Countdowns(Vec::new())
        );
    }

    #[test]
    fn static_url_mode_falls_back_to_icon() {
        let mut r = renderer(
            ContentMode::StaticUrl,
            vec![
                TileDescriptor::new("a", "A", "Rare", "2020-01-01T00:00:00Z")
                    .with_content_url("https://example.com/a.png"),
                TileDescriptor::new("b", "B", "Rare", "2020-01-01T00:00:00Z").with_icon("b"),
            ],
        );
        let tiles = r.render_pass(at("2025-01-01T00:00:00Z"));
        assert_eq!(
            tiles[0].content,
            ContentRef::Url {
                url: "https://example.com/a.png".to_string()
            }
        );
        assert_eq!(tiles[1].content, ContentRef::Icon { glyph: "b".to_string() });
    }

    #[test]
    fn detail_recomputes_state_at_open_time() {
        let mut r = renderer(
            ContentMode::UserUpload,
            vec![TileDescriptor::new("a", "A", "Rare", "2025-01-01T00:00:00Z")],
        );
        let tiles = r.render_pass(at("2024-12-31T23:59:59Z"));
        assert!(tiles[0].is_locked);

        let detail = r
            .open_detail("a", at("2025-01-01T00:00:00Z"))
            .expect("tile exists");
        assert!(!detail.tile.is_locked);
        assert!(detail.can_upload);
        assert_eq!(r.open_detail("missing", at("2025-01-01T00:00:00Z")), None);
    }
}
