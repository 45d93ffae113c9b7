//! Window-side glue: owns the view state, scroll position and pending uploads, and forwards
//! ticks and input to the [`TrackRenderer`].

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use engine::app::{KeyPress, TickApp};
use engine::graphics::Renderer2d;
use engine::surface::{FrameBuffer, SurfaceSize};
use engine::ticker::Tick;
use engine::view_tree::ViewTree;

use crate::clock::Clock;
use crate::draw::{Scene, ThumbnailCache, draw_scene};
use crate::layout::{TILE_GAP, TILE_W, TrackAction, build_view_tree, clamp_scroll, max_scroll, scroll_to};
use crate::renderer::{DetailPresentation, TickOutcome, TilePresentation, TrackRenderer, UploadOutcome};
use crate::upload::{UploadError, UploadQueue, UploadedFile};
use crate::view::{TrackView, TrackViewEffect, TrackViewEvent};

pub const WINDOW_TITLE: &str = "Reveal Track";

pub struct TrackApp<C: Clock> {
    renderer: TrackRenderer,
    clock: C,
    view: TrackView,
    tiles: Vec<TilePresentation>,
    detail: Option<DetailPresentation>,
    scroll: u32,
    size: SurfaceSize,
    uploads: UploadQueue,
    thumbs: ThumbnailCache,
    notice: Option<String>,
}

impl<C: Clock> TrackApp<C> {
    pub fn new(mut renderer: TrackRenderer, clock: C) -> Self {
        let tiles = renderer.render_pass(clock.now());
        Self {
            renderer,
            clock,
            view: TrackView::default(),
            tiles,
            detail: None,
            scroll: 0,
            size: SurfaceSize::new(0, 0),
            uploads: UploadQueue::new(),
            thumbs: ThumbnailCache::new(),
            notice: None,
        }
    }

    pub fn view(&self) -> TrackView {
        self.view
    }

    pub fn tiles(&self) -> &[TilePresentation] {
        &self.tiles
    }

    pub fn detail(&self) -> Option<&DetailPresentation> {
        self.detail.as_ref()
    }

    pub fn scroll(&self) -> u32 {
        self.scroll
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn renderer(&self) -> &TrackRenderer {
        &self.renderer
    }

    pub fn uploads(&self) -> &UploadQueue {
        &self.uploads
    }

    /// Centres the first locked tile, if any. Used once the window size is known.
    pub fn scroll_to_next_locked(&mut self) -> bool {
        let (view, effect) = self
            .view
            .handle(TrackViewEvent::ScrollToNext(self.renderer.next_locked(self.clock.now())));
        self.view = view;
        self.apply_effect(effect)
    }

    fn refresh(&mut self, now: DateTime<Utc>) {
        self.tiles = self.renderer.render_pass(now);
        self.refresh_detail(now);
    }

    fn refresh_detail(&mut self, now: DateTime<Utc>) {
        self.detail = self
            .view
            .detail_index()
            .and_then(|index| self.renderer.detail_at(index, now));
    }

    fn dispatch(&mut self, event: TrackViewEvent) -> bool {
        let before = self.view;
        let (view, effect) = self.view.handle(event);
        self.view = view;
        if view != before {
            self.refresh_detail(self.clock.now());
        }
        let applied = self.apply_effect(effect);
        view != before || applied
    }

    fn apply_effect(&mut self, effect: TrackViewEffect) -> bool {
        match effect {
            TrackViewEffect::None => false,
            TrackViewEffect::ScrollTo(index) => {
                let target = scroll_to(index, self.tiles.len(), self.size.width);
                let changed = target != self.scroll;
                self.scroll = target;
                changed
            }
            TrackViewEffect::ClearImages => {
                self.notice = Some(match self.renderer.reset_images() {
                    Ok(()) => "IMAGES CLEARED".to_string(),
                    Err(err) => {
                        tracing::error!(%err, "failed to clear image store");
                        "CLEAR FAILED".to_string()
                    }
                });
                self.refresh(self.clock.now());
                true
            }
        }
    }

    fn scroll_by(&mut self, delta: i64) -> bool {
        let target = clamp_scroll(
            i64::from(self.scroll) + delta,
            self.tiles.len(),
            self.size.width,
        );
        let changed = target != self.scroll;
        self.scroll = target;
        changed
    }

    /// Applies one finished file read. Eligibility is evaluated now, not when the read began.
    ///
    /// `None` when the read itself failed.
    pub fn apply_upload(
        &mut self,
        tile_id: &str,
        result: Result<UploadedFile, UploadError>,
    ) -> Option<UploadOutcome> {
        let file = match result {
            Ok(file) => file,
            Err(err) => {
                tracing::warn!(tile = tile_id, %err, "upload read failed");
                self.notice = Some("UPLOAD FAILED".to_string());
                return None;
            }
        };
        let now = self.clock.now();
        let outcome = self.renderer.upload_image(tile_id, file.bytes, now);
        self.notice = Some(
            match outcome {
                UploadOutcome::Stored { persisted: true, .. } => "IMAGE SAVED",
                UploadOutcome::Stored { persisted: false, .. } => "IMAGE NOT SAVED TO DISK",
                UploadOutcome::NotAnImage => "NOT AN IMAGE",
                UploadOutcome::NotRevealed => "TILE IS LOCKED",
                UploadOutcome::UnknownTile | UploadOutcome::UploadsDisabled => "UPLOAD IGNORED",
            }
            .to_string(),
        );
        if outcome.is_stored() {
            self.refresh(now);
        }
        Some(outcome)
    }

    /// Applies every finished read. Returns whether anything was applied.
    pub fn poll_uploads(&mut self) -> bool {
        let finished = self.uploads.poll();
        let any = !finished.is_empty();
        for (tile_id, result) in finished {
            self.apply_upload(&tile_id, result);
        }
        any
    }

    /// Runs one renderer tick against the clock. Returns whether anything visible changed.
    pub fn tick_now(&mut self) -> bool {
        let now = self.clock.now();
        match self.renderer.tick(now) {
            TickOutcome::Countdowns(updates) => {
                let mut changed = false;
                for update in updates {
                    if let Some(tile) = self.tiles.get_mut(update.index) {
                        if tile.countdown_text.as_deref() != Some(update.text.as_str()) {
                            tile.countdown_text = Some(update.text);
                            changed = true;
                        }
                    }
                }
                let before = self.detail.clone();
                self.refresh_detail(now);
                changed || before != self.detail
            }
            TickOutcome::Rerendered { tiles, .. } => {
                self.tiles = tiles;
                self.refresh_detail(now);
                true
            }
        }
    }

    /// Paints the current state into an offscreen buffer of `size`.
    pub fn snapshot(&mut self, size: SurfaceSize) -> FrameBuffer {
        if self.size != size {
            self.on_resize(size);
        }
        let mut frame = FrameBuffer::new(size);
        self.render(&mut frame.renderer());
        frame
    }

    fn header_title(&self) -> String {
        let revealed = self.tiles.iter().filter(|t| !t.is_locked).count();
        format!("{WINDOW_TITLE} {revealed}/{}", self.tiles.len())
    }
}

impl<C: Clock> TickApp for TrackApp<C> {
    type Action = TrackAction;

    fn on_tick(&mut self, _tick: Tick) -> bool {
        let uploaded = self.poll_uploads();
        self.tick_now() || uploaded
    }

    fn on_action(&mut self, action: TrackAction) -> bool {
        let event = match action {
            TrackAction::SelectTile(index) => TrackViewEvent::SelectTile(index),
            TrackAction::CloseDetail => TrackViewEvent::Close,
            TrackAction::ScrollToNext => {
                TrackViewEvent::ScrollToNext(self.renderer.next_locked(self.clock.now()))
            }
            TrackAction::ResetImages => TrackViewEvent::ResetImages,
        };
        self.dispatch(event)
    }

    fn on_key(&mut self, key: KeyPress) -> bool {
        let step = i64::from(TILE_W + TILE_GAP);
        match key {
            KeyPress::Escape => self.dispatch(TrackViewEvent::Close),
            KeyPress::Char('n') => self.on_action(TrackAction::ScrollToNext),
            KeyPress::Char('r') if self.renderer.content_mode().accepts_uploads() => {
                self.dispatch(TrackViewEvent::ResetImages)
            }
            KeyPress::Left if !self.view.is_detail() => self.scroll_by(-step),
            KeyPress::Right if !self.view.is_detail() => self.scroll_by(step),
            KeyPress::Home if !self.view.is_detail() => self.scroll_by(-i64::from(self.scroll)),
            KeyPress::End if !self.view.is_detail() => {
                let max = max_scroll(self.tiles.len(), self.size.width);
                self.scroll_by(i64::from(max) - i64::from(self.scroll))
            }
            _ => false,
        }
    }

    fn on_scroll(&mut self, delta_px: i32) -> bool {
        if self.view.is_detail() {
            return false;
        }
        self.scroll_by(i64::from(delta_px))
    }

    fn on_file_dropped(&mut self, path: PathBuf) -> bool {
        let Some(detail) = self.detail.as_ref().filter(|d| d.can_upload) else {
            tracing::debug!(path = %path.display(), "dropped file ignored; no upload target");
            return false;
        };
        let tile_id = detail.tile.id.clone();
        tracing::info!(tile = %tile_id, path = %path.display(), "upload started");
        self.uploads.start(&tile_id, path);
        self.notice = Some("READING FILE".to_string());
        true
    }

    fn on_resize(&mut self, size: SurfaceSize) {
        let first_layout = self.size.is_empty() && !size.is_empty();
        self.size = size;
        self.scroll = clamp_scroll(i64::from(self.scroll), self.tiles.len(), size.width);
        if first_layout {
            self.scroll_to_next_locked();
        }
    }

    fn build_view(&self, size: SurfaceSize) -> ViewTree<TrackAction> {
        build_view_tree(
            self.view,
            self.tiles.len(),
            self.scroll,
            size,
            self.renderer.content_mode().accepts_uploads(),
        )
    }

    fn render(&mut self, gfx: &mut dyn Renderer2d) {
        let title = self.header_title();
        let scene = Scene {
            title: &title,
            tiles: &self.tiles,
            detail: self.detail.as_ref(),
            scroll: self.scroll,
            show_reset: self.renderer.content_mode().accepts_uploads(),
            notice: self.notice.as_deref(),
        };
        draw_scene(gfx, &scene, self.renderer.store(), &mut self.thumbs);
    }
}
