//! Source pixel encodings understood by `draw_direct_rect`.

use crate::color::Color;
use crate::geometry::Rect;

/// Decoder for a raw, row-strided pixel buffer.
///
/// `data` always starts at pixel (0, 0) of the source image and `row_stride`
/// is the distance in bytes between two rows. Rectangles are in source pixel
/// coordinates and are assumed to lie inside the image.
pub trait ColorFormat {
    fn bytes_per_pixel(&self) -> usize;

    /// Decode one pixel.
    fn decode_pixel(&self, data: &[u8], row_stride: usize, x: i16, y: i16) -> Color;

    /// Decode `rect` in row-major order into `out`, which must hold
    /// `rect.area()` entries.
    fn decode(&self, data: &[u8], row_stride: usize, rect: Rect, out: &mut [Color]) {
        debug_assert!(out.len() >= rect.area() as usize);
        let mut i = 0;
        for y in rect.y0..=rect.y1 {
            for x in rect.x0..=rect.x1 {
                out[i] = self.decode_pixel(data, row_stride, x, y);
                i += 1;
            }
        }
    }

    /// The color of `rect` if every pixel in it decodes to the same value.
    fn decode_if_uniform(&self, data: &[u8], row_stride: usize, rect: Rect) -> Option<Color> {
        if rect.is_empty() {
            return None;
        }
        let first = self.decode_pixel(data, row_stride, rect.x0, rect.y0);
        for y in rect.y0..=rect.y1 {
            for x in rect.x0..=rect.x1 {
                if self.decode_pixel(data, row_stride, x, y) != first {
                    return None;
                }
            }
        }
        Some(first)
    }
}

/// 32-bit ARGB stored big-endian, `A R G B` byte order.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Argb8888;

impl Argb8888 {
    #[inline]
    fn offset(row_stride: usize, x: i16, y: i16) -> usize {
        y as usize * row_stride + x as usize * 4
    }
}

impl ColorFormat for Argb8888 {
    fn bytes_per_pixel(&self) -> usize {
        4
    }

    fn decode_pixel(&self, data: &[u8], row_stride: usize, x: i16, y: i16) -> Color {
        let off = Self::offset(row_stride, x, y);
        match data.get(off..off + 4) {
            Some(&[a, r, g, b]) => Color::from_argb(a, r, g, b),
            _ => Color::TRANSPARENT,
        }
    }

    fn decode_if_uniform(&self, data: &[u8], row_stride: usize, rect: Rect) -> Option<Color> {
        if rect.is_empty() {
            return None;
        }
        let first_off = Self::offset(row_stride, rect.x0, rect.y0);
        let first = data.get(first_off..first_off + 4)?;
        let row_bytes = rect.width() as usize * 4;
        for y in rect.y0..=rect.y1 {
            let start = Self::offset(row_stride, rect.x0, y);
            let row = data.get(start..start + row_bytes)?;
            if !row.chunks_exact(4).all(|px| px == first) {
                return None;
            }
        }
        Some(Color::from_be_bytes([first[0], first[1], first[2], first[3]]))
    }
}

/// Encode colors as `Argb8888` rows, `width` pixels per row.
pub fn encode_argb8888(colors: &[Color], out: &mut [u8]) {
    for (px, c) in out.chunks_exact_mut(4).zip(colors) {
        px.copy_from_slice(&c.to_be_bytes());
    }
}
