use crate::graphics::CpuRenderer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn rgba_len(self) -> usize {
        (self.width as usize)
            .saturating_mul(self.height as usize)
            .saturating_mul(4)
    }
}

/// An offscreen RGBA frame, used for snapshots and for drawing in tests.
#[derive(Debug, Clone)]
pub struct FrameBuffer {
    size: SurfaceSize,
    buf: Vec<u8>,
}

impl FrameBuffer {
    pub fn new(size: SurfaceSize) -> Self {
        Self {
            size,
            buf: vec![0u8; size.rgba_len()],
        }
    }

    pub fn size(&self) -> SurfaceSize {
        self.size
    }

    pub fn pixels(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_pixels(self) -> Vec<u8> {
        self.buf
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.size.width || y >= self.size.height {
            return None;
        }
        let i = (y as usize * self.size.width as usize + x as usize) * 4;
        let px = self.buf.get(i..i + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }

    pub fn renderer(&mut self) -> CpuRenderer<'_> {
        CpuRenderer::new(&mut self.buf, self.size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphics::Renderer2d;

    #[test]
    fn frame_buffer_is_sized_for_rgba() {
        let fb = FrameBuffer::new(SurfaceSize::new(3, 2));
        assert_eq!(fb.pixels().len(), 24);
        assert_eq!(fb.pixel(3, 0), None);
    }

    #[test]
    fn renderer_writes_into_buffer() {
        let mut fb = FrameBuffer::new(SurfaceSize::new(2, 2));
        fb.renderer().clear([1, 2, 3, 255]);
        assert_eq!(fb.pixel(1, 1), Some([1, 2, 3, 255]));
    }
}
