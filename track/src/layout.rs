//! Track geometry and the clickable regions for each frame.
//!
//! Tile rects are computed in content coordinates (before scrolling) and mapped into the
//! viewport on demand.

use engine::surface::SurfaceSize;
use engine::ui::{Anchor, Insets, Rect, Size};
use engine::view_tree::{ViewNode, ViewTree};
use serde::{Deserialize, Serialize};

use crate::view::TrackView;

pub const TILE_W: u32 = 220;
pub const TILE_H: u32 = 300;
pub const TILE_GAP: u32 = 24;
pub const PADDING: u32 = 32;
pub const HEADER_H: u32 = 56;

const HEADER_BUTTON: Size = Size::new(96, 32);
const MODAL: Size = Size::new(560, 420);
const MODAL_MARGIN: u32 = 24;
const CLOSE_BUTTON: Size = Size::new(96, 32);

pub const BTN_NEXT: u32 = 1;
pub const BTN_RESET: u32 = 2;
pub const BTN_TILE_BASE: u32 = 100;
pub const BTN_CLOSE: u32 = 900;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackAction {
    SelectTile(usize),
    CloseDetail,
    ScrollToNext,
    ResetImages,
}

pub fn header_rect(size: SurfaceSize) -> Rect {
    Rect::new(0, 0, size.width, HEADER_H.min(size.height))
}

/// The horizontally scrolling band below the header.
pub fn track_viewport(size: SurfaceSize) -> Rect {
    Rect::new(
        0,
        HEADER_H,
        size.width,
        size.height.saturating_sub(HEADER_H),
    )
}

/// Tile `index` in unscrolled content coordinates.
pub fn tile_rect(index: usize) -> Rect {
    let step = TILE_W + TILE_GAP;
    let x = PADDING.saturating_add((index as u32).saturating_mul(step));
    Rect::new(x, HEADER_H + PADDING, TILE_W, TILE_H)
}

pub fn content_width(tile_count: usize) -> u32 {
    if tile_count == 0 {
        return 0;
    }
    tile_rect(tile_count - 1).right() + PADDING
}

pub fn max_scroll(tile_count: usize, viewport_width: u32) -> u32 {
    content_width(tile_count).saturating_sub(viewport_width)
}

pub fn clamp_scroll(scroll: i64, tile_count: usize, viewport_width: u32) -> u32 {
    let max = i64::from(max_scroll(tile_count, viewport_width));
    scroll.clamp(0, max) as u32
}

/// Scroll offset that centres tile `index` in the viewport, clamped to the content.
pub fn scroll_to(index: usize, tile_count: usize, viewport_width: u32) -> u32 {
    let tile = tile_rect(index);
    let centre = i64::from(tile.x) + i64::from(tile.w / 2);
    clamp_scroll(centre - i64::from(viewport_width / 2), tile_count, viewport_width)
}

/// Tile `index` as it appears on screen, or `None` when scrolled out of view.
pub fn visible_tile_rect(index: usize, scroll: u32, size: SurfaceSize) -> Option<Rect> {
    tile_rect(index).scrolled_into(scroll, track_viewport(size))
}

pub fn next_button_rect(size: SurfaceSize) -> Rect {
    header_rect(size)
        .inset(Insets::symmetric(PADDING, 12))
        .place(HEADER_BUTTON, Anchor::CenterRight)
}

pub fn reset_button_rect(size: SurfaceSize) -> Rect {
    let next = next_button_rect(size);
    let right = next.x.saturating_sub(12);
    Rect::new(
        right.saturating_sub(HEADER_BUTTON.w),
        next.y,
        HEADER_BUTTON.w.min(right),
        next.h,
    )
}

pub fn modal_rect(size: SurfaceSize) -> Rect {
    Rect::from_size(size.width, size.height)
        .inset(Insets::all(MODAL_MARGIN))
        .place(MODAL, Anchor::Center)
}

pub fn close_button_rect(modal: Rect) -> Rect {
    modal
        .inset(Insets::all(16))
        .place(CLOSE_BUTTON, Anchor::BottomRight)
}

/// Clickable regions for one frame, in paint order.
pub fn build_view_tree(
    view: TrackView,
    tile_count: usize,
    scroll: u32,
    size: SurfaceSize,
    show_reset: bool,
) -> ViewTree<TrackAction> {
    let mut tree = ViewTree::new();
    if size.is_empty() {
        return tree;
    }

    for index in 0..tile_count {
        if let Some(rect) = visible_tile_rect(index, scroll, size) {
            tree.push_button(
                BTN_TILE_BASE + index as u32,
                rect,
                TrackAction::SelectTile(index),
            );
        }
    }
    tree.push_button(BTN_NEXT, next_button_rect(size), TrackAction::ScrollToNext);
    if show_reset {
        tree.push_button(BTN_RESET, reset_button_rect(size), TrackAction::ResetImages);
    }

    if view.is_detail() {
        let modal = modal_rect(size);
        tree.push(ViewNode::Blocker(Rect::from_size(size.width, size.height)));
        tree.push_button(BTN_CLOSE, close_button_rect(modal), TrackAction::CloseDetail);
    }
    tree
}
