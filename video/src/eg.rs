//! `embedded-graphics` front end for any display device.
//!
//! Contiguous fills are streamed through `set_address`/`write`, so a
//! [`DeviceAdapter`](crate::adapter::DeviceAdapter) underneath sees them as
//! runs it can elide.

use embedded_graphics_core::Pixel;
use embedded_graphics_core::draw_target::DrawTarget;
use embedded_graphics_core::geometry::{OriginDimensions, Point as EgPoint, Size};
use embedded_graphics_core::pixelcolor::{Rgb888, RgbColor};
use embedded_graphics_core::primitives::{PointsIter, Rectangle};

use mosaic_abi::{BlendingMode, Color, DisplayDevice, DisplayError, Point, Rect, STAGING_PIXELS};

use crate::buffered::BufferedPixelWriter;

#[inline]
pub fn color_from_rgb888(c: Rgb888) -> Color {
    Color::from_rgb(c.r(), c.g(), c.b())
}

/// Device rect of an `embedded-graphics` rectangle clipped to `bounds`.
fn to_rect(area: &Rectangle, bounds: Rect) -> Rect {
    let Some(br) = area.bottom_right() else {
        return Rect::empty();
    };
    let clamp = |v: i32| v.clamp(i16::MIN as i32, i16::MAX as i32) as i16;
    Rect::new(clamp(area.top_left.x), clamp(area.top_left.y), clamp(br.x), clamp(br.y)).intersection(&bounds)
}

pub struct EgDisplay<T> {
    inner: T,
}

impl<T: DisplayDevice> EgDisplay<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T: DisplayDevice> OriginDimensions for EgDisplay<T> {
    fn size(&self) -> Size {
        Size::new(self.inner.effective_width().max(0) as u32, self.inner.effective_height().max(0) as u32)
    }
}

impl<T: DisplayDevice> DrawTarget for EgDisplay<T> {
    type Color = Rgb888;
    type Error = DisplayError;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        let bounds = self.inner.extents();
        let mut batch = BufferedPixelWriter::new(BlendingMode::Source);
        for Pixel(p, color) in pixels {
            let (Ok(x), Ok(y)) = (i16::try_from(p.x), i16::try_from(p.y)) else {
                continue;
            };
            let p = Point::new(x, y);
            if bounds.contains(p) {
                batch.push(&mut self.inner, p, color_from_rgb888(color))?;
            }
        }
        batch.flush(&mut self.inner)
    }

    fn fill_contiguous<I>(&mut self, area: &Rectangle, colors: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Self::Color>,
    {
        let rect = to_rect(area, self.inner.extents());
        if rect.is_empty() {
            return Ok(());
        }
        if rect.area() as u64 != area.size.width as u64 * area.size.height as u64 {
            // Clipped: the color sequence no longer matches the window.
            return self.draw_iter(area.points().zip(colors).map(|(p, c)| Pixel(p, c)));
        }
        self.inner.set_address(rect, BlendingMode::Source)?;
        let mut staging = [Color::TRANSPARENT; STAGING_PIXELS];
        let mut n = 0;
        for color in colors.into_iter().take(rect.area() as usize) {
            staging[n] = color_from_rgb888(color);
            n += 1;
            if n == STAGING_PIXELS {
                self.inner.write(&staging)?;
                n = 0;
            }
        }
        if n > 0 {
            self.inner.write(&staging[..n])?;
        }
        Ok(())
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        let rect = to_rect(area, self.inner.extents());
        if rect.is_empty() {
            return Ok(());
        }
        self.inner.fill_rect(BlendingMode::Source, rect, color_from_rgb888(color))
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        let all = Rectangle::new(EgPoint::zero(), self.size());
        self.fill_solid(&all, color)
    }
}
