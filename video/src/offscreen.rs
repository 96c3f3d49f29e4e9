//! In-memory ARGB8888 display device.
//!
//! Behaves like a panel driver: it keeps an address window and a streaming
//! cursor, honors orientation, and rejects requests outside its extents.
//! Used as a render target on hosts and as the reference device in tests.

use alloc::vec;
use alloc::vec::Vec;

use mosaic_abi::{
    BlendingMode, Color, DisplayDevice, DisplayError, DisplayOutput, DisplayResult, Orientation, Point, Rect,
};

#[inline]
fn mix(src: u8, dst: u8, a: u8) -> u8 {
    ((src as u32 * a as u32 + dst as u32 * (255 - a as u32) + 127) / 255) as u8
}

/// `src` composited over `dst`.
fn over(src: Color, dst: Color) -> Color {
    match src.a() {
        0xFF => src,
        0x00 => dst,
        a => {
            let out_a = a as u32 + (dst.a() as u32 * (255 - a as u32) + 127) / 255;
            Color::from_argb(
                out_a.min(255) as u8,
                mix(src.r(), dst.r(), a),
                mix(src.g(), dst.g(), a),
                mix(src.b(), dst.b(), a),
            )
        }
    }
}

/// Result of writing `src` onto `dst` in `mode`.
pub fn blend(dst: Color, src: Color, mode: BlendingMode) -> Color {
    match mode {
        BlendingMode::Source => src,
        BlendingMode::SourceOver => over(src, dst),
        BlendingMode::DestinationOver => over(dst, src),
        BlendingMode::SourcePlus => Color::from_argb(
            src.a().saturating_add(dst.a()),
            src.r().saturating_add(dst.r()),
            src.g().saturating_add(dst.g()),
            src.b().saturating_add(dst.b()),
        ),
    }
}

pub struct Offscreen {
    raw_width: i16,
    raw_height: i16,
    pixels: Vec<Color>,
    orientation: Orientation,
    window: Rect,
    mode: BlendingMode,
    cursor: u32,
    bg_hint: Option<Color>,
}

impl Offscreen {
    /// A transparent surface of the given raw size.
    pub fn new(width: i16, height: i16) -> Self {
        Self::with_color(width, height, Color::TRANSPARENT)
    }

    pub fn with_color(width: i16, height: i16, color: Color) -> Self {
        debug_assert!(width > 0 && height > 0);
        Self {
            raw_width: width,
            raw_height: height,
            pixels: vec![color; width.max(0) as usize * height.max(0) as usize],
            orientation: Orientation::ROTATION_0,
            window: Rect::empty(),
            mode: BlendingMode::Source,
            cursor: 0,
            bg_hint: None,
        }
    }

    /// Storage index of logical pixel `(x, y)`.
    fn raw_index(&self, x: i16, y: i16) -> Option<usize> {
        if !self.extents().contains(Point::new(x, y)) {
            return None;
        }
        let (mut rx, mut ry) = if self.orientation.is_xy_swapped() { (y, x) } else { (x, y) };
        if self.orientation.contains(Orientation::FLIP_X) {
            rx = self.raw_width - 1 - rx;
        }
        if self.orientation.contains(Orientation::FLIP_Y) {
            ry = self.raw_height - 1 - ry;
        }
        Some(ry as usize * self.raw_width as usize + rx as usize)
    }

    #[inline]
    fn put(&mut self, x: i16, y: i16, color: Color, mode: BlendingMode) {
        if let Some(i) = self.raw_index(x, y) {
            self.pixels[i] = blend(self.pixels[i], color, mode);
        }
    }

    /// Logical pixel; transparent outside the surface.
    pub fn pixel(&self, x: i16, y: i16) -> Color {
        self.raw_index(x, y).map_or(Color::TRANSPARENT, |i| self.pixels[i])
    }

    /// Raw framebuffer, row-major in unrotated coordinates.
    pub fn raw_pixels(&self) -> &[Color] {
        &self.pixels
    }

    /// Overwrite every pixel, bypassing any address window.
    pub fn clear(&mut self, color: Color) {
        self.pixels.fill(color);
    }

    pub fn bg_color_hint(&self) -> Option<Color> {
        self.bg_hint
    }

    fn check(&self, rect: Rect) -> DisplayResult {
        if rect.is_empty() {
            return Err(DisplayError::Invalid);
        }
        if !self.extents().contains_rect(&rect) {
            return Err(DisplayError::OutOfBounds);
        }
        Ok(())
    }

    fn fill_checked(&mut self, mode: BlendingMode, rect: Rect, color: Color) -> DisplayResult {
        self.check(rect)?;
        for y in rect.y0..=rect.y1 {
            for x in rect.x0..=rect.x1 {
                self.put(x, y, color, mode);
            }
        }
        Ok(())
    }
}

impl DisplayOutput for Offscreen {
    fn set_address(&mut self, window: Rect, mode: BlendingMode) -> DisplayResult {
        self.check(window)?;
        self.window = window;
        self.mode = mode;
        self.cursor = 0;
        Ok(())
    }

    fn write(&mut self, colors: &[Color]) -> DisplayResult {
        if self.window.is_empty() {
            return Err(DisplayError::Invalid);
        }
        let w = self.window.width() as u32;
        let area = self.window.area();
        for &c in colors {
            let x = self.window.x0 + (self.cursor % w) as i16;
            let y = self.window.y0 + (self.cursor / w) as i16;
            self.put(x, y, c, self.mode);
            self.cursor += 1;
            if self.cursor == area {
                self.cursor = 0;
            }
        }
        Ok(())
    }

    fn write_rects(&mut self, mode: BlendingMode, colors: &[Color], rects: &[Rect]) -> DisplayResult {
        for (&color, &rect) in colors.iter().zip(rects) {
            self.fill_checked(mode, rect, color)?;
        }
        Ok(())
    }

    fn fill_rects(&mut self, mode: BlendingMode, color: Color, rects: &[Rect]) -> DisplayResult {
        for &rect in rects {
            self.fill_checked(mode, rect, color)?;
        }
        Ok(())
    }

    fn write_pixels(&mut self, mode: BlendingMode, colors: &[Color], points: &[Point]) -> DisplayResult {
        for (&color, p) in colors.iter().zip(points) {
            if self.raw_index(p.x, p.y).is_none() {
                return Err(DisplayError::OutOfBounds);
            }
            self.put(p.x, p.y, color, mode);
        }
        Ok(())
    }

    fn fill_pixels(&mut self, mode: BlendingMode, color: Color, points: &[Point]) -> DisplayResult {
        for p in points {
            if self.raw_index(p.x, p.y).is_none() {
                return Err(DisplayError::OutOfBounds);
            }
            self.put(p.x, p.y, color, mode);
        }
        Ok(())
    }

    fn draw_direct_rect(&mut self, data: &[u8], row_stride: usize, src: Rect, dst: Point) -> DisplayResult {
        if src.is_empty() {
            return Ok(());
        }
        let target = src.translate(dst.x - src.x0, dst.y - src.y0);
        self.check(target)?;
        let format = self.color_format();
        for y in src.y0..=src.y1 {
            for x in src.x0..=src.x1 {
                let c = format.decode_pixel(data, row_stride, x, y);
                self.put(dst.x + (x - src.x0), dst.y + (y - src.y0), c, BlendingMode::Source);
            }
        }
        Ok(())
    }
}

impl DisplayDevice for Offscreen {
    fn raw_width(&self) -> i16 {
        self.raw_width
    }

    fn raw_height(&self) -> i16 {
        self.raw_height
    }

    fn orientation(&self) -> Orientation {
        self.orientation
    }

    fn set_orientation(&mut self, orientation: Orientation) -> DisplayResult {
        self.orientation = orientation;
        self.window = Rect::empty();
        Ok(())
    }

    fn set_bg_color_hint(&mut self, color: Color) {
        self.bg_hint = Some(color);
    }
}
