//! Layout primitives for the track surface.
//!
//! Everything works in unsigned surface pixels. Horizontal scrolling is a leftward pixel
//! shift applied to content rects, which are then clipped against the viewport.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub const fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    pub const fn from_size(w: u32, h: u32) -> Self {
        Self { x: 0, y: 0, w, h }
    }

    pub fn size(&self) -> Size {
        Size::new(self.w, self.h)
    }

    pub fn right(&self) -> u32 {
        self.x.saturating_add(self.w)
    }

    pub fn bottom(&self) -> u32 {
        self.y.saturating_add(self.h)
    }

    pub fn is_empty(&self) -> bool {
        self.w == 0 || self.h == 0
    }

    pub fn contains(&self, px: u32, py: u32) -> bool {
        (self.x..self.right()).contains(&px) && (self.y..self.bottom()).contains(&py)
    }

    /// Overlapping area of two rects, or `None` when they do not touch.
    pub fn intersect(&self, other: Rect) -> Option<Rect> {
        let x0 = self.x.max(other.x);
        let y0 = self.y.max(other.y);
        let x1 = self.right().min(other.right());
        let y1 = self.bottom().min(other.bottom());
        if x0 >= x1 || y0 >= y1 {
            return None;
        }
        Some(Rect::new(x0, y0, x1 - x0, y1 - y0))
    }

    /// Moves the rect left by `scroll` pixels and clips it to `viewport`.
    ///
    /// Content that scrolls past the left edge is cut off rather than wrapped.
    pub fn scrolled_into(&self, scroll: u32, viewport: Rect) -> Option<Rect> {
        let right = self.right().checked_sub(scroll)?;
        let left = self.x.saturating_sub(scroll);
        Rect::new(left, self.y, right - left, self.h).intersect(viewport)
    }

    /// The inner content area after removing `insets`. Saturates to an empty rect.
    pub fn inset(&self, insets: Insets) -> Self {
        Self {
            x: self.x.saturating_add(insets.left),
            y: self.y.saturating_add(insets.top),
            w: self.w.saturating_sub(insets.left.saturating_add(insets.right)),
            h: self.h.saturating_sub(insets.top.saturating_add(insets.bottom)),
        }
    }

    /// Places a child of `size` inside this rect, clamping the child to fit.
    pub fn place(&self, size: Size, anchor: Anchor) -> Self {
        let size = size.clamp_max(self.size());
        let (hx, vy) = anchor.split();
        Self {
            x: self.x + hx.offset(self.w, size.w),
            y: self.y + vy.offset(self.h, size.h),
            w: size.w,
            h: size.h,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Size {
    pub w: u32,
    pub h: u32,
}

impl Size {
    pub const fn new(w: u32, h: u32) -> Self {
        Self { w, h }
    }

    pub fn clamp_max(self, max: Size) -> Self {
        Self::new(self.w.min(max.w), self.h.min(max.h))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Insets {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl Insets {
    pub const ZERO: Insets = Insets::all(0);

    pub const fn all(v: u32) -> Self {
        Self {
            left: v,
            top: v,
            right: v,
            bottom: v,
        }
    }

    pub const fn symmetric(horizontal: u32, vertical: u32) -> Self {
        Self {
            left: horizontal,
            top: vertical,
            right: horizontal,
            bottom: vertical,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    TopLeft,
    TopCenter,
    TopRight,
    CenterLeft,
    Center,
    CenterRight,
    BottomLeft,
    BottomCenter,
    BottomRight,
}

#[derive(Debug, Clone, Copy)]
enum Align {
    Start,
    Middle,
    End,
}

impl Align {
    fn offset(self, outer: u32, inner: u32) -> u32 {
        let slack = outer.saturating_sub(inner);
        match self {
            Align::Start => 0,
            Align::Middle => slack / 2,
            Align::End => slack,
        }
    }
}

impl Anchor {
    fn split(self) -> (Align, Align) {
        use Align::*;
        match self {
            Anchor::TopLeft => (Start, Start),
            Anchor::TopCenter => (Middle, Start),
            Anchor::TopRight => (End, Start),
            Anchor::CenterLeft => (Start, Middle),
            Anchor::Center => (Middle, Middle),
            Anchor::CenterRight => (End, Middle),
            Anchor::BottomLeft => (Start, End),
            Anchor::BottomCenter => (Middle, End),
            Anchor::BottomRight => (End, End),
        }
    }
}
