use crate::surface::SurfaceSize;
use crate::ui::Rect;

pub type Color = [u8; 4];

pub const DEFAULT_TEXT_SCALE: u32 = 2;
const GLYPH_W: u32 = 3;
const GLYPH_H: u32 = 5;

pub fn glyph_advance_x(scale: u32) -> u32 {
    (GLYPH_W + 1) * scale.max(1)
}

pub fn line_advance_y(scale: u32) -> u32 {
    (GLYPH_H + 1) * scale.max(1)
}

/// Pixel width of the longest line of `text` at `scale`.
pub fn text_width(text: &str, scale: u32) -> u32 {
    text.lines()
        .map(|line| line.chars().count() as u32)
        .max()
        .unwrap_or(0)
        .saturating_mul(glyph_advance_x(scale))
}

/// Truncates `text` so that it fits in `max_width` pixels, marking the cut with `..`.
pub fn fit_text(text: &str, max_width: u32, scale: u32) -> String {
    let max_chars = (max_width / glyph_advance_x(scale)) as usize;
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    if max_chars <= 2 {
        return text.chars().take(max_chars).collect();
    }
    let mut out: String = text.chars().take(max_chars - 2).collect();
    out.push_str("..");
    out
}

/// Drawing interface the track surface talks to.
///
/// Callers never touch pixel buffers directly, so the same drawing code serves the window and
/// the offscreen buffers used by tests.
pub trait Renderer2d {
    fn begin_frame(&mut self, size: SurfaceSize);
    fn size(&self) -> SurfaceSize;

    fn fill_rect(&mut self, rect: Rect, color: Color);

    /// Alpha-blends `color` over what is already in `rect`.
    fn blend_rect(&mut self, rect: Rect, color: Color, alpha: u8);

    fn draw_text_scaled(&mut self, x: u32, y: u32, text: &str, color: Color, scale: u32);

    /// Copies a tightly packed RGBA image of `width` x `height` with its top-left at `(x, y)`.
    fn blit_rgba(&mut self, x: u32, y: u32, width: u32, height: u32, rgba: &[u8]);

    fn draw_text(&mut self, x: u32, y: u32, text: &str, color: Color) {
        self.draw_text_scaled(x, y, text, color, DEFAULT_TEXT_SCALE);
    }

    fn rect_outline(&mut self, rect: Rect, color: Color) {
        if rect.is_empty() {
            return;
        }
        self.fill_rect(Rect::new(rect.x, rect.y, rect.w, 1), color);
        self.fill_rect(Rect::new(rect.x, rect.bottom() - 1, rect.w, 1), color);
        self.fill_rect(Rect::new(rect.x, rect.y, 1, rect.h), color);
        self.fill_rect(Rect::new(rect.right() - 1, rect.y, 1, rect.h), color);
    }

    fn clear(&mut self, color: Color) {
        let s = self.size();
        self.fill_rect(Rect::from_size(s.width, s.height), color);
    }
}

/// CPU renderer over an RGBA frame buffer.
pub struct CpuRenderer<'a> {
    frame: &'a mut [u8],
    size: SurfaceSize,
}

impl<'a> CpuRenderer<'a> {
    pub fn new(frame: &'a mut [u8], size: SurfaceSize) -> Self {
        Self { frame, size }
    }

    fn bounds(&self) -> Option<Rect> {
        if self.size.is_empty() || self.frame.len() < self.size.rgba_len() {
            return None;
        }
        Some(Rect::from_size(self.size.width, self.size.height))
    }

    /// Runs `f` on every pixel of `rect` that lies inside the frame.
    fn for_each_pixel(&mut self, rect: Rect, mut f: impl FnMut(&mut [u8])) {
        let Some(clip) = self.bounds().and_then(|b| b.intersect(rect)) else {
            return;
        };
        let stride = self.size.width as usize * 4;
        for y in clip.y..clip.bottom() {
            let start = y as usize * stride + clip.x as usize * 4;
            let end = start + clip.w as usize * 4;
            for px in self.frame[start..end].chunks_exact_mut(4) {
                f(px);
            }
        }
    }

    fn set_pixel(&mut self, x: u32, y: u32, color: Color) {
        if x >= self.size.width || y >= self.size.height {
            return;
        }
        let idx = (y as usize * self.size.width as usize + x as usize) * 4;
        if let Some(px) = self.frame.get_mut(idx..idx + 4) {
            px.copy_from_slice(&color);
        }
    }

    fn draw_char(&mut self, x: u32, y: u32, ch: char, color: Color, scale: u32) {
        let bits = glyph_bits(ch);
        for row in 0..GLYPH_H {
            for col in 0..GLYPH_W {
                let shift = (GLYPH_H - 1 - row) * GLYPH_W + (GLYPH_W - 1 - col);
                if bits & (1 << shift) == 0 {
                    continue;
                }
                let px0 = x.saturating_add(col * scale);
                let py0 = y.saturating_add(row * scale);
                for dy in 0..scale {
                    for dx in 0..scale {
                        self.set_pixel(px0 + dx, py0 + dy, color);
                    }
                }
            }
        }
    }
}

impl Renderer2d for CpuRenderer<'_> {
    fn begin_frame(&mut self, size: SurfaceSize) {
        self.size = size;
    }

    fn size(&self) -> SurfaceSize {
        self.size
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.for_each_pixel(rect, |px| px.copy_from_slice(&color));
    }

    fn blend_rect(&mut self, rect: Rect, color: Color, alpha: u8) {
        match alpha {
            0 => {}
            255 => self.fill_rect(rect, color),
            _ => {
                let a = alpha as u32;
                let inv = 255 - a;
                self.for_each_pixel(rect, |px| {
                    for c in 0..3 {
                        px[c] = ((px[c] as u32 * inv + color[c] as u32 * a + 127) / 255) as u8;
                    }
                    px[3] = 255;
                });
            }
        }
    }

    fn draw_text_scaled(&mut self, x: u32, y: u32, text: &str, color: Color, scale: u32) {
        let scale = scale.max(1);
        let (adv_x, adv_y) = (glyph_advance_x(scale), line_advance_y(scale));
        for (line_idx, line) in text.lines().enumerate() {
            let cy = y.saturating_add(line_idx as u32 * adv_y);
            if cy >= self.size.height {
                break;
            }
            let mut cx = x;
            for ch in line.chars() {
                if cx >= self.size.width {
                    break;
                }
                if ch != ' ' {
                    self.draw_char(cx, cy, ch, color, scale);
                }
                cx = cx.saturating_add(adv_x);
            }
        }
    }

    fn blit_rgba(&mut self, x: u32, y: u32, width: u32, height: u32, rgba: &[u8]) {
        if rgba.len() < (width as usize) * (height as usize) * 4 {
            return;
        }
        for row in 0..height {
            for col in 0..width {
                let src = ((row * width + col) * 4) as usize;
                let [r, g, b, a] = [rgba[src], rgba[src + 1], rgba[src + 2], rgba[src + 3]];
                if a == 0 {
                    continue;
                }
                self.set_pixel(x.saturating_add(col), y.saturating_add(row), [r, g, b, 255]);
            }
        }
    }
}

/// 3x5 block glyphs packed row-major into 15 bits, top row in the high bits.
fn glyph_bits(ch: char) -> u16 {
    match ch.to_ascii_uppercase() {
        '0' => 0b111_101_101_101_111,
        '1' => 0b010_110_010_010_111,
        '2' => 0b111_001_111_100_111,
        '3' => 0b111_001_111_001_111,
        '4' => 0b101_101_111_001_001,
        '5' => 0b111_100_111_001_111,
        '6' => 0b111_100_111_101_111,
        '7' => 0b111_001_001_001_001,
        '8' => 0b111_101_111_101_111,
        '9' => 0b111_101_111_001_111,
        'A' => 0b010_101_111_101_101,
        'B' => 0b110_101_110_101_110,
        'C' => 0b111_100_100_100_111,
        'D' => 0b110_101_101_101_110,
        'E' => 0b111_100_111_100_111,
        'F' => 0b111_100_111_100_100,
        'G' => 0b111_100_101_101_111,
        'H' => 0b101_101_111_101_101,
        'I' => 0b111_010_010_010_111,
        'J' => 0b111_001_001_101_010,
        'K' => 0b101_110_100_110_101,
        'L' => 0b100_100_100_100_111,
        'M' => 0b101_111_111_101_101,
        'N' => 0b101_111_111_111_101,
        'O' => 0b111_101_101_101_111,
        'P' => 0b111_101_111_100_100,
        'Q' => 0b111_101_101_111_001,
        'R' => 0b111_101_111_110_101,
        'S' => 0b111_100_111_001_111,
        'T' => 0b111_010_010_010_010,
        'U' => 0b101_101_101_101_111,
        'V' => 0b101_101_101_101_010,
        'W' => 0b101_101_111_111_101,
        'X' => 0b101_101_010_101_101,
        'Y' => 0b101_101_010_010_010,
        'Z' => 0b111_001_010_100_111,
        '.' => 0b000_000_000_000_010,
        ',' => 0b000_000_000_010_100,
        ':' => 0b000_010_000_010_000,
        '-' => 0b000_000_111_000_000,
        '_' => 0b000_000_000_000_111,
        '(' => 0b010_100_100_100_010,
        ')' => 0b010_001_001_001_010,
        '[' => 0b110_100_100_100_110,
        ']' => 0b011_001_001_001_011,
        '!' => 0b010_010_010_000_010,
        '?' => 0b111_001_010_000_010,
        '~' => 0b000_001_111_100_000,
        '/' => 0b001_001_010_100_100,
        '+' => 0b000_010_111_010_000,
        '*' => 0b101_010_111_010_101,
        '#' => 0b101_111_101_111_101,
        '<' => 0b001_010_100_010_001,
        '>' => 0b100_010_001_010_100,
        '=' => 0b000_111_000_111_000,
        '\'' => 0b010_010_000_000_000,
        // Anything outside the table, emoji icons included, renders as a solid block.
        _ => 0b111_111_111_111_111,
    }
}
