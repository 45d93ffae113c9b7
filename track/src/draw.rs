//! Paints tile presentations onto a [`Renderer2d`].

use std::collections::HashMap;

use engine::graphics::{Color, Renderer2d, fit_text, line_advance_y, text_width};
use engine::surface::SurfaceSize;
use engine::ui::{Anchor, Insets, Rect, Size};

use crate::layout::{
    PADDING, close_button_rect, header_rect, modal_rect, next_button_rect, reset_button_rect,
    tile_rect, track_viewport,
};
use crate::renderer::{ContentRef, DetailPresentation, StatusLabel, TilePresentation};
use crate::store::ImageStore;
use crate::tile::RarityTag;

const COLOR_BG: Color = [12, 12, 18, 255];
const COLOR_HEADER_BG: Color = [20, 20, 28, 255];
const COLOR_PANEL_BG: Color = [16, 16, 22, 255];
const COLOR_PANEL_BORDER: Color = [40, 40, 55, 255];
const COLOR_TEXT: Color = [235, 235, 245, 255];
const COLOR_TEXT_DIM: Color = [140, 140, 160, 255];
const COLOR_LOCKED_FILL: Color = [26, 26, 34, 255];
const COLOR_DIM: Color = [0, 0, 0, 255];
const DIM_ALPHA: u8 = 170;

const TILE_CONTENT: u32 = 128;
const MODAL_CONTENT: u32 = 192;
const ICON_SCALE: u32 = 8;
const BAND_H: u32 = 24;

pub fn rarity_color(tag: RarityTag) -> Color {
    match tag {
        RarityTag::Common => [150, 150, 160, 255],
        RarityTag::Uncommon => [80, 190, 100, 255],
        RarityTag::Rare => [70, 130, 230, 255],
        RarityTag::Epic => [170, 90, 220, 255],
        RarityTag::Legendary => [240, 160, 40, 255],
        RarityTag::Mythic => [235, 70, 110, 255],
    }
}

pub fn status_color(status: StatusLabel) -> Color {
    match status {
        StatusLabel::Locked => COLOR_TEXT_DIM,
        StatusLabel::Revealed => [120, 220, 140, 255],
        StatusLabel::Uploaded => [110, 190, 250, 255],
        StatusLabel::InvalidTime => [230, 80, 80, 255],
    }
}

fn dim_color(mut c: Color, factor: f32) -> Color {
    let f = factor.clamp(0.0, 1.0);
    for v in c.iter_mut().take(3) {
        *v = (f32::from(*v) * f) as u8;
    }
    c
}

/// Decoded RGBA thumbnail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thumbnail {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

/// Decoded stored images, keyed by tile and box size. Invalidated whenever the store changes.
#[derive(Debug, Default)]
pub struct ThumbnailCache {
    generation: Option<u64>,
    entries: HashMap<(String, u32), Option<Thumbnail>>,
}

impl ThumbnailCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&mut self, store: &ImageStore, tile_id: &str, max_side: u32) -> Option<&Thumbnail> {
        if self.generation != Some(store.generation()) {
            self.entries.clear();
            self.generation = Some(store.generation());
        }
        self.entries
            .entry((tile_id.to_string(), max_side))
            .or_insert_with(|| decode_thumbnail(store.get(tile_id)?, tile_id, max_side))
            .as_ref()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn decode_thumbnail(bytes: &[u8], tile_id: &str, max_side: u32) -> Option<Thumbnail> {
    let decoded = match image::load_from_memory(bytes) {
        Ok(decoded) => decoded,
        Err(err) => {
            tracing::warn!(tile = tile_id, %err, "stored image could not be decoded");
            return None;
        }
    };
    let rgba = decoded.thumbnail(max_side, max_side).to_rgba8();
    Some(Thumbnail {
        width: rgba.width(),
        height: rgba.height(),
        rgba: rgba.into_raw(),
    })
}

/// Everything needed to paint one frame.
#[derive(Debug, Clone, Copy)]
pub struct Scene<'a> {
    pub title: &'a str,
    pub tiles: &'a [TilePresentation],
    pub detail: Option<&'a DetailPresentation>,
    pub scroll: u32,
    pub show_reset: bool,
    /// Transient one-line message shown in the header, e.g. the last upload result.
    pub notice: Option<&'a str>,
}

pub fn draw_scene(
    gfx: &mut dyn Renderer2d,
    scene: &Scene<'_>,
    store: &ImageStore,
    thumbs: &mut ThumbnailCache,
) {
    let size = gfx.size();
    if size.is_empty() {
        return;
    }
    gfx.clear(COLOR_BG);

    let viewport = track_viewport(size);
    for (index, tile) in scene.tiles.iter().enumerate() {
        let content = tile_rect(index);
        if content.right() <= scene.scroll {
            continue;
        }
        if content.x >= scene.scroll {
            let rect = Rect::new(content.x - scene.scroll, content.y, content.w, content.h);
            if rect.x >= viewport.right() {
                break;
            }
            draw_tile(gfx, rect, tile, store, thumbs);
        } else if let Some(clipped) = content.scrolled_into(scene.scroll, viewport) {
            // Partially scrolled off the left edge: frame only.
            gfx.fill_rect(clipped, tile_fill(tile));
            gfx.rect_outline(clipped, rarity_color(tile.rarity_tag));
        }
    }

    draw_header(gfx, size, scene);

    if let Some(detail) = scene.detail {
        draw_detail(gfx, size, detail, store, thumbs);
    }
}

fn tile_fill(tile: &TilePresentation) -> Color {
    if tile.is_locked {
        COLOR_LOCKED_FILL
    } else {
        COLOR_PANEL_BG
    }
}

fn draw_header(gfx: &mut dyn Renderer2d, size: SurfaceSize, scene: &Scene<'_>) {
    let header = header_rect(size);
    gfx.fill_rect(header, COLOR_HEADER_BG);
    gfx.fill_rect(
        Rect::new(0, header.bottom().saturating_sub(1), header.w, 1),
        COLOR_PANEL_BORDER,
    );

    let text_y = header.y + header.h.saturating_sub(line_advance_y(3)) / 2;
    gfx.draw_text_scaled(PADDING, text_y, scene.title, COLOR_TEXT, 3);

    if let Some(notice) = scene.notice {
        let x = PADDING + text_width(scene.title, 3) + 24;
        let limit = reset_button_rect(size).x.saturating_sub(x + 12);
        let y = header.y + header.h.saturating_sub(line_advance_y(2)) / 2;
        gfx.draw_text(x, y, &fit_text(notice, limit, 2), COLOR_TEXT_DIM);
    }

    draw_button(gfx, next_button_rect(size), "NEXT");
    if scene.show_reset {
        draw_button(gfx, reset_button_rect(size), "RESET");
    }
}

fn draw_button(gfx: &mut dyn Renderer2d, rect: Rect, label: &str) {
    if rect.is_empty() {
        return;
    }
    gfx.fill_rect(rect, COLOR_PANEL_BG);
    gfx.rect_outline(rect, COLOR_PANEL_BORDER);
    let text = rect.place(Size::new(text_width(label, 2), line_advance_y(2)), Anchor::Center);
    gfx.draw_text(text.x, text.y + 1, label, COLOR_TEXT);
}

fn draw_tile(
    gfx: &mut dyn Renderer2d,
    rect: Rect,
    tile: &TilePresentation,
    store: &ImageStore,
    thumbs: &mut ThumbnailCache,
) {
    let accent = rarity_color(tile.rarity_tag);
    gfx.fill_rect(rect, tile_fill(tile));
    gfx.rect_outline(rect, accent);
    gfx.rect_outline(rect.inset(Insets::all(1)), accent);

    let band = Rect::new(rect.x, rect.y, rect.w, BAND_H);
    let band_color = if tile.is_locked { dim_color(accent, 0.45) } else { accent };
    gfx.fill_rect(band, band_color);
    let inner = rect.inset(Insets::symmetric(12, 0));
    gfx.draw_text(
        inner.x,
        band.y + 6,
        &fit_text(&tile.rarity_label, inner.w, 2),
        COLOR_BG,
    );

    let mut y = band.bottom() + 10;
    gfx.draw_text(inner.x, y, &fit_text(&tile.title, inner.w, 2), COLOR_TEXT);
    y += line_advance_y(2) + 8;

    let slot = Rect::new(rect.x, y, rect.w, TILE_CONTENT).place(
        Size::new(TILE_CONTENT, TILE_CONTENT),
        Anchor::Center,
    );
    draw_content(gfx, slot, tile, store, thumbs);
    y = slot.bottom() + 10;

    gfx.draw_text(inner.x, y, tile.status_label.as_str(), status_color(tile.status_label));
    y += line_advance_y(2) + 4;

    gfx.draw_text_scaled(
        inner.x,
        y,
        &fit_text(&tile.formatted_reveal_instant, inner.w, 1),
        COLOR_TEXT_DIM,
        1,
    );
    y += line_advance_y(1) + 6;

    if let Some(countdown) = &tile.countdown_text {
        gfx.draw_text(inner.x, y, &fit_text(countdown, inner.w, 2), COLOR_TEXT);
    }
}

fn draw_content(
    gfx: &mut dyn Renderer2d,
    slot: Rect,
    tile: &TilePresentation,
    store: &ImageStore,
    thumbs: &mut ThumbnailCache,
) {
    gfx.rect_outline(slot, COLOR_PANEL_BORDER);
    match &tile.content {
        ContentRef::Hidden => {
            let label = if tile.status_label == StatusLabel::InvalidTime { "?" } else { "LOCKED" };
            draw_centered_text(gfx, slot, label, COLOR_TEXT_DIM, 2);
        }
        ContentRef::Icon { glyph } => {
            draw_centered_text(gfx, slot, glyph, rarity_color(tile.rarity_tag), ICON_SCALE);
        }
        ContentRef::Url { url } => {
            let inner = slot.inset(Insets::all(6));
            draw_centered_text(gfx, slot, "URL", COLOR_TEXT_DIM, 3);
            gfx.draw_text_scaled(
                inner.x,
                inner.bottom().saturating_sub(line_advance_y(1)),
                &fit_text(url, inner.w, 1),
                COLOR_TEXT_DIM,
                1,
            );
        }
        ContentRef::StoredImage { tile_id } => {
            let inner = slot.inset(Insets::all(2));
            match thumbs.get(store, tile_id, inner.w.min(inner.h)) {
                Some(thumb) => {
                    let at = inner.place(Size::new(thumb.width, thumb.height), Anchor::Center);
                    gfx.blit_rgba(at.x, at.y, thumb.width, thumb.height, &thumb.rgba);
                }
                None => draw_centered_text(gfx, slot, "?", COLOR_TEXT_DIM, ICON_SCALE),
            }
        }
    }
}

fn draw_centered_text(gfx: &mut dyn Renderer2d, area: Rect, text: &str, color: Color, scale: u32) {
    let text = fit_text(text, area.w, scale);
    let at = area.place(
        Size::new(text_width(&text, scale), line_advance_y(scale)),
        Anchor::Center,
    );
    gfx.draw_text_scaled(at.x, at.y, &text, color, scale);
}

fn draw_detail(
    gfx: &mut dyn Renderer2d,
    size: SurfaceSize,
    detail: &DetailPresentation,
    store: &ImageStore,
    thumbs: &mut ThumbnailCache,
) {
    let tile = &detail.tile;
    gfx.blend_rect(Rect::from_size(size.width, size.height), COLOR_DIM, DIM_ALPHA);

    let modal = modal_rect(size);
    if modal.is_empty() {
        return;
    }
    let accent = rarity_color(tile.rarity_tag);
    gfx.fill_rect(modal, COLOR_PANEL_BG);
    gfx.rect_outline(modal, accent);
    gfx.rect_outline(modal.inset(Insets::all(1)), accent);

    let inner = modal.inset(Insets::all(20));
    let mut y = inner.y;
    gfx.draw_text_scaled(inner.x, y, &fit_text(&tile.title, inner.w, 3), COLOR_TEXT, 3);
    y += line_advance_y(3) + 6;
    gfx.draw_text(inner.x, y, &fit_text(&tile.rarity_label, inner.w, 2), accent);
    y += line_advance_y(2) + 12;

    let slot = Rect::new(inner.x, y, MODAL_CONTENT, MODAL_CONTENT);
    draw_content(gfx, slot, tile, store, thumbs);

    let side = Rect::new(
        slot.right() + 20,
        y,
        inner.right().saturating_sub(slot.right() + 20),
        MODAL_CONTENT,
    );
    let mut sy = side.y;
    gfx.draw_text(side.x, sy, tile.status_label.as_str(), status_color(tile.status_label));
    sy += line_advance_y(2) + 10;
    gfx.draw_text(side.x, sy, "REVEALS", COLOR_TEXT_DIM);
    sy += line_advance_y(2) + 2;
    gfx.draw_text(
        side.x,
        sy,
        &fit_text(&tile.formatted_reveal_instant, side.w, 2),
        COLOR_TEXT,
    );
    sy += line_advance_y(2) + 10;
    if let Some(countdown) = &tile.countdown_text {
        gfx.draw_text(side.x, sy, "IN", COLOR_TEXT_DIM);
        sy += line_advance_y(2) + 2;
        gfx.draw_text(side.x, sy, &fit_text(countdown, side.w, 2), COLOR_TEXT);
    }

    let close = close_button_rect(modal);
    if detail.can_upload {
        gfx.draw_text_scaled(
            inner.x,
            close.y + close.h.saturating_sub(line_advance_y(1)) / 2,
            &fit_text("DROP AN IMAGE FILE HERE TO UPLOAD", close.x.saturating_sub(inner.x + 8), 1),
            COLOR_TEXT_DIM,
            1,
        );
    }
    draw_button(gfx, close, "CLOSE");
}
