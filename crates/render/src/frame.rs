//! RGBA raster frame
//!
//! The unit of output for page rendering and the surface the overlay
//! renderer paints on. Pixels are tightly packed RGBA8, row-major,
//! origin at the top-left with y increasing downward.

/// An RGBA8 raster frame
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Frame {
    /// Create a transparent frame of the given size
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; (width as usize) * (height as usize) * 4],
        }
    }

    /// Create a frame from existing RGBA pixel data
    ///
    /// Returns `None` if the buffer length does not match `width * height * 4`.
    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> Option<Self> {
        if pixels.len() != (width as usize) * (height as usize) * 4 {
            return None;
        }
        Some(Self {
            width,
            height,
            pixels,
        })
    }

    /// Frame width in pixels
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Frame height in pixels
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw RGBA pixel data
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Read one pixel as `[r, g, b, a]`
    ///
    /// Returns `None` when the coordinate is outside the frame.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        Some([
            self.pixels[offset],
            self.pixels[offset + 1],
            self.pixels[offset + 2],
            self.pixels[offset + 3],
        ])
    }

    /// Source-over blend one pixel into the frame
    ///
    /// Out-of-bounds coordinates are ignored, so callers can pass clipped
    /// geometry without pre-checking every pixel.
    pub fn blend_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        if x >= self.width || y >= self.height {
            return;
        }
        let offset = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        let src_a = rgba[3] as u32;
        if src_a == 0 {
            return;
        }
        let inv_a = 255 - src_a;
        for channel in 0..3 {
            let src = rgba[channel] as u32;
            let dst = self.pixels[offset + channel] as u32;
            self.pixels[offset + channel] = ((src * src_a + dst * inv_a + 127) / 255) as u8;
        }
        let dst_a = self.pixels[offset + 3] as u32;
        self.pixels[offset + 3] = (src_a + (dst_a * inv_a + 127) / 255).min(255) as u8;
    }

    /// Fill an axis-aligned rectangle with source-over blending
    ///
    /// The rectangle is clipped to the frame bounds. `x` and `y` may be
    /// negative when the rectangle starts left of or above the frame.
    pub fn fill_rect(&mut self, x: i32, y: i32, width: u32, height: u32, rgba: [u8; 4]) {
        if rgba[3] == 0 {
            return;
        }
        let x0 = x.max(0) as u32;
        let y0 = y.max(0) as u32;
        let x1 = x
            .saturating_add(width.min(i32::MAX as u32) as i32)
            .clamp(0, self.width as i32) as u32;
        let y1 = y
            .saturating_add(height.min(i32::MAX as u32) as i32)
            .clamp(0, self.height as i32) as u32;

        for py in y0..y1 {
            for px in x0..x1 {
                self.blend_pixel(px, py, rgba);
            }
        }
    }

    /// Blit an RGBA source buffer into a destination rectangle
    ///
    /// The source is resampled with nearest-neighbor box mapping to the
    /// destination size and blended source-over, so transparent regions of
    /// the source leave the underlying page content visible. The
    /// destination rectangle is clipped to the frame bounds.
    pub fn blit_scaled(
        &mut self,
        src: &[u8],
        src_width: u32,
        src_height: u32,
        dst_x: i32,
        dst_y: i32,
        dst_width: u32,
        dst_height: u32,
    ) {
        if src_width == 0 || src_height == 0 || dst_width == 0 || dst_height == 0 {
            return;
        }
        if src.len() < (src_width as usize) * (src_height as usize) * 4 {
            return;
        }

        for oy in 0..dst_height {
            let py = dst_y + oy as i32;
            if py < 0 || py >= self.height as i32 {
                continue;
            }
            let sy = (oy as u64 * src_height as u64 / dst_height as u64).min(src_height as u64 - 1);
            for ox in 0..dst_width {
                let px = dst_x + ox as i32;
                if px < 0 || px >= self.width as i32 {
                    continue;
                }
                let sx =
                    (ox as u64 * src_width as u64 / dst_width as u64).min(src_width as u64 - 1);
                let offset = ((sy as usize) * (src_width as usize) + (sx as usize)) * 4;
                let rgba = [src[offset], src[offset + 1], src[offset + 2], src[offset + 3]];
                self.blend_pixel(px as u32, py as u32, rgba);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_frame_is_transparent() {
        let frame = Frame::new(4, 3);
        assert_eq!(frame.width(), 4);
        assert_eq!(frame.height(), 3);
        assert_eq!(frame.pixel(0, 0), Some([0, 0, 0, 0]));
        assert_eq!(frame.pixel(3, 2), Some([0, 0, 0, 0]));
        assert_eq!(frame.pixel(4, 0), None);
    }

    #[test]
    fn test_from_rgba_validates_length() {
        assert!(Frame::from_rgba(2, 2, vec![0; 16]).is_some());
        assert!(Frame::from_rgba(2, 2, vec![0; 15]).is_none());
    }

    #[test]
    fn test_opaque_blend_replaces() {
        let mut frame = Frame::new(2, 2);
        frame.blend_pixel(1, 1, [10, 20, 30, 255]);
        assert_eq!(frame.pixel(1, 1), Some([10, 20, 30, 255]));
    }

    #[test]
    fn test_half_alpha_blend_over_opaque_white() {
        let mut frame = Frame::new(1, 1);
        frame.blend_pixel(0, 0, [255, 255, 255, 255]);
        frame.blend_pixel(0, 0, [0, 0, 0, 128]);

        let [r, g, b, a] = frame.pixel(0, 0).unwrap();
        // 50% black over white lands near mid-gray
        assert!((126..=129).contains(&r));
        assert_eq!(r, g);
        assert_eq!(g, b);
        assert_eq!(a, 255);
    }

    #[test]
    fn test_zero_alpha_blend_is_noop() {
        let mut frame = Frame::new(1, 1);
        frame.blend_pixel(0, 0, [40, 50, 60, 255]);
        frame.blend_pixel(0, 0, [255, 0, 0, 0]);
        assert_eq!(frame.pixel(0, 0), Some([40, 50, 60, 255]));
    }

    #[test]
    fn test_fill_rect_clips_to_bounds() {
        let mut frame = Frame::new(4, 4);
        frame.fill_rect(-2, -2, 4, 4, [255, 0, 0, 255]);

        assert_eq!(frame.pixel(0, 0), Some([255, 0, 0, 255]));
        assert_eq!(frame.pixel(1, 1), Some([255, 0, 0, 255]));
        assert_eq!(frame.pixel(2, 2), Some([0, 0, 0, 0]));
    }

    #[test]
    fn test_blit_scaled_upscales_source() {
        // 1x1 opaque green source stretched over a 2x2 destination
        let mut frame = Frame::new(2, 2);
        frame.blit_scaled(&[0, 255, 0, 255], 1, 1, 0, 0, 2, 2);

        for y in 0..2 {
            for x in 0..2 {
                assert_eq!(frame.pixel(x, y), Some([0, 255, 0, 255]));
            }
        }
    }

    #[test]
    fn test_blit_scaled_rejects_short_buffer() {
        let mut frame = Frame::new(2, 2);
        frame.blit_scaled(&[0, 255, 0], 1, 1, 0, 0, 2, 2);
        assert_eq!(frame.pixel(0, 0), Some([0, 0, 0, 0]));
    }
}
