//! The sink contract shared by display drivers and the filters stacked on
//! top of them.
//!
//! Only `set_address`, `write` and the size/orientation queries are required.
//! Everything else has a default built on the streaming pair, so a minimal
//! driver needs a handful of methods; drivers with hardware rectangle fills
//! override `fill_rects` and friends.
//!
//! All coordinates are device coordinates with inclusive bounds. Callers clip
//! before calling; sinks may reject out-of-range requests with
//! `DisplayError::OutOfBounds`.

use crate::blending::BlendingMode;
use crate::color::Color;
use crate::error::DisplayResult;
use crate::geometry::{Point, Rect};
use crate::orientation::Orientation;
use crate::pixel_format::{Argb8888, ColorFormat};

/// Number of colors staged on the stack by the default implementations.
pub const STAGING_PIXELS: usize = 64;

/// Anything that accepts addressed pixel data.
pub trait DisplayOutput {
    /// Open a transaction. Calls may be nested by the caller but are not
    /// counted here.
    fn begin(&mut self) -> DisplayResult {
        Ok(())
    }

    /// Close a transaction; buffered work must reach the device.
    fn end(&mut self) -> DisplayResult {
        Ok(())
    }

    /// Declare the window the next `write`/`fill` calls stream into. The
    /// cursor restarts at the window's top-left corner.
    fn set_address(&mut self, window: Rect, mode: BlendingMode) -> DisplayResult;

    /// Stream colors in row-major order into the current window.
    fn write(&mut self, colors: &[Color]) -> DisplayResult;

    /// Stream `count` copies of `color`.
    fn fill(&mut self, color: Color, count: u32) -> DisplayResult {
        let staging = [color; STAGING_PIXELS];
        let mut left = count as usize;
        while left > 0 {
            let n = left.min(STAGING_PIXELS);
            self.write(&staging[..n])?;
            left -= n;
        }
        Ok(())
    }

    /// Fill each `rects[i]` with `colors[i]`.
    fn write_rects(&mut self, mode: BlendingMode, colors: &[Color], rects: &[Rect]) -> DisplayResult {
        debug_assert_eq!(colors.len(), rects.len());
        for (&color, rect) in colors.iter().zip(rects) {
            self.set_address(*rect, mode)?;
            self.fill(color, rect.area())?;
        }
        Ok(())
    }

    /// Fill every rect with the same color.
    fn fill_rects(&mut self, mode: BlendingMode, color: Color, rects: &[Rect]) -> DisplayResult {
        for rect in rects {
            self.set_address(*rect, mode)?;
            self.fill(color, rect.area())?;
        }
        Ok(())
    }

    /// Single-rect convenience over `fill_rects`.
    #[inline]
    fn fill_rect(&mut self, mode: BlendingMode, rect: Rect, color: Color) -> DisplayResult {
        self.fill_rects(mode, color, core::slice::from_ref(&rect))
    }

    /// Set each `points[i]` to `colors[i]`.
    fn write_pixels(&mut self, mode: BlendingMode, colors: &[Color], points: &[Point]) -> DisplayResult {
        debug_assert_eq!(colors.len(), points.len());
        for (&color, p) in colors.iter().zip(points) {
            self.set_address(Rect::new(p.x, p.y, p.x, p.y), mode)?;
            self.write(core::slice::from_ref(&color))?;
        }
        Ok(())
    }

    fn fill_pixels(&mut self, mode: BlendingMode, color: Color, points: &[Point]) -> DisplayResult {
        for p in points {
            self.set_address(Rect::new(p.x, p.y, p.x, p.y), mode)?;
            self.write(core::slice::from_ref(&color))?;
        }
        Ok(())
    }

    /// Encoding accepted by `draw_direct_rect`.
    fn color_format(&self) -> &'static dyn ColorFormat {
        &Argb8888
    }

    /// Copy `src` out of an encoded image so that its top-left pixel lands
    /// at `dst`. The image is encoded in `color_format()`.
    fn draw_direct_rect(&mut self, data: &[u8], row_stride: usize, src: Rect, dst: Point) -> DisplayResult {
        if src.is_empty() {
            return Ok(());
        }
        let format = self.color_format();
        let window = src.translate(dst.x - src.x0, dst.y - src.y0);
        self.set_address(window, BlendingMode::Source)?;
        let mut staging = [Color::TRANSPARENT; STAGING_PIXELS];
        for y in src.y0..=src.y1 {
            let mut x = src.x0;
            while x <= src.x1 {
                let n = (src.x1 - x + 1).min(STAGING_PIXELS as i16);
                let span = Rect::new(x, y, x + n - 1, y);
                format.decode(data, row_stride, span, &mut staging[..n as usize]);
                self.write(&staging[..n as usize])?;
                x += n;
            }
        }
        Ok(())
    }
}

/// A physical panel: an output plus lifecycle and geometry.
pub trait DisplayDevice: DisplayOutput {
    fn init(&mut self) -> DisplayResult {
        Ok(())
    }

    /// Width before orientation is applied.
    fn raw_width(&self) -> i16;

    /// Height before orientation is applied.
    fn raw_height(&self) -> i16;

    fn orientation(&self) -> Orientation;

    fn set_orientation(&mut self, orientation: Orientation) -> DisplayResult;

    #[inline]
    fn effective_width(&self) -> i16 {
        self.orientation().effective_size(self.raw_width(), self.raw_height()).0
    }

    #[inline]
    fn effective_height(&self) -> i16 {
        self.orientation().effective_size(self.raw_width(), self.raw_height()).1
    }

    /// Bounds of the logical surface.
    #[inline]
    fn extents(&self) -> Rect {
        Rect::from_size(0, 0, self.effective_width(), self.effective_height())
    }

    /// Hint about the color most of the screen is about to hold. Drivers may
    /// use it to pick a cheaper clear; ignoring it is always correct.
    fn set_bg_color_hint(&mut self, _color: Color) {}
}

impl<T: DisplayOutput + ?Sized> DisplayOutput for &mut T {
    fn begin(&mut self) -> DisplayResult {
        (**self).begin()
    }

    fn end(&mut self) -> DisplayResult {
        (**self).end()
    }

    fn set_address(&mut self, window: Rect, mode: BlendingMode) -> DisplayResult {
        (**self).set_address(window, mode)
    }

    fn write(&mut self, colors: &[Color]) -> DisplayResult {
        (**self).write(colors)
    }

    fn fill(&mut self, color: Color, count: u32) -> DisplayResult {
        (**self).fill(color, count)
    }

    fn write_rects(&mut self, mode: BlendingMode, colors: &[Color], rects: &[Rect]) -> DisplayResult {
        (**self).write_rects(mode, colors, rects)
    }

    fn fill_rects(&mut self, mode: BlendingMode, color: Color, rects: &[Rect]) -> DisplayResult {
        (**self).fill_rects(mode, color, rects)
    }

    fn write_pixels(&mut self, mode: BlendingMode, colors: &[Color], points: &[Point]) -> DisplayResult {
        (**self).write_pixels(mode, colors, points)
    }

    fn fill_pixels(&mut self, mode: BlendingMode, color: Color, points: &[Point]) -> DisplayResult {
        (**self).fill_pixels(mode, color, points)
    }

    fn color_format(&self) -> &'static dyn ColorFormat {
        (**self).color_format()
    }

    fn draw_direct_rect(&mut self, data: &[u8], row_stride: usize, src: Rect, dst: Point) -> DisplayResult {
        (**self).draw_direct_rect(data, row_stride, src, dst)
    }
}

impl<T: DisplayDevice + ?Sized> DisplayDevice for &mut T {
    fn init(&mut self) -> DisplayResult {
        (**self).init()
    }

    fn raw_width(&self) -> i16 {
        (**self).raw_width()
    }

    fn raw_height(&self) -> i16 {
        (**self).raw_height()
    }

    fn orientation(&self) -> Orientation {
        (**self).orientation()
    }

    fn set_orientation(&mut self, orientation: Orientation) -> DisplayResult {
        (**self).set_orientation(orientation)
    }

    fn set_bg_color_hint(&mut self, color: Color) {
        (**self).set_bg_color_hint(color)
    }
}
