//! Stack buffers that batch scattered pixel and rectangle writes into the
//! slice-taking calls of [`DisplayOutput`].
//!
//! The writers do not hold the output; it is passed to every call so the
//! owner can interleave direct calls with buffered ones. Pending items are
//! only sent by `push` (when full) and `flush`, so call `flush` before any
//! direct call that must be ordered after them, and before dropping.

use mosaic_abi::{BlendingMode, Color, DisplayOutput, DisplayResult, Point, Rect};

/// Items collected before a batch is sent.
pub const BATCH: usize = 64;

pub struct BufferedPixelWriter {
    mode: BlendingMode,
    len: usize,
    colors: [Color; BATCH],
    points: [Point; BATCH],
}

impl BufferedPixelWriter {
    pub fn new(mode: BlendingMode) -> Self {
        Self {
            mode,
            len: 0,
            colors: [Color::TRANSPARENT; BATCH],
            points: [Point::default(); BATCH],
        }
    }

    pub fn push<O: DisplayOutput + ?Sized>(&mut self, out: &mut O, p: Point, color: Color) -> DisplayResult {
        if self.len == BATCH {
            self.flush(out)?;
        }
        self.colors[self.len] = color;
        self.points[self.len] = p;
        self.len += 1;
        Ok(())
    }

    pub fn flush<O: DisplayOutput + ?Sized>(&mut self, out: &mut O) -> DisplayResult {
        if self.len == 0 {
            return Ok(());
        }
        let n = core::mem::take(&mut self.len);
        out.write_pixels(self.mode, &self.colors[..n], &self.points[..n])
    }
}

pub struct BufferedPixelFiller {
    mode: BlendingMode,
    color: Color,
    len: usize,
    points: [Point; BATCH],
}

impl BufferedPixelFiller {
    pub fn new(mode: BlendingMode, color: Color) -> Self {
        Self {
            mode,
            color,
            len: 0,
            points: [Point::default(); BATCH],
        }
    }

    pub fn push<O: DisplayOutput + ?Sized>(&mut self, out: &mut O, p: Point) -> DisplayResult {
        if self.len == BATCH {
            self.flush(out)?;
        }
        self.points[self.len] = p;
        self.len += 1;
        Ok(())
    }

    pub fn flush<O: DisplayOutput + ?Sized>(&mut self, out: &mut O) -> DisplayResult {
        if self.len == 0 {
            return Ok(());
        }
        let n = core::mem::take(&mut self.len);
        out.fill_pixels(self.mode, self.color, &self.points[..n])
    }
}

pub struct BufferedRectWriter {
    mode: BlendingMode,
    len: usize,
    colors: [Color; BATCH],
    rects: [Rect; BATCH],
}

impl BufferedRectWriter {
    pub fn new(mode: BlendingMode) -> Self {
        Self {
            mode,
            len: 0,
            colors: [Color::TRANSPARENT; BATCH],
            rects: [Rect::empty(); BATCH],
        }
    }

    pub fn push<O: DisplayOutput + ?Sized>(&mut self, out: &mut O, rect: Rect, color: Color) -> DisplayResult {
        if rect.is_empty() {
            return Ok(());
        }
        if self.len == BATCH {
            self.flush(out)?;
        }
        self.colors[self.len] = color;
        self.rects[self.len] = rect;
        self.len += 1;
        Ok(())
    }

    pub fn flush<O: DisplayOutput + ?Sized>(&mut self, out: &mut O) -> DisplayResult {
        if self.len == 0 {
            return Ok(());
        }
        let n = core::mem::take(&mut self.len);
        out.write_rects(self.mode, &self.colors[..n], &self.rects[..n])
    }
}

pub struct BufferedRectFiller {
    mode: BlendingMode,
    color: Color,
    len: usize,
    rects: [Rect; BATCH],
}

impl BufferedRectFiller {
    pub fn new(mode: BlendingMode, color: Color) -> Self {
        Self {
            mode,
            color,
            len: 0,
            rects: [Rect::empty(); BATCH],
        }
    }

    pub fn push<O: DisplayOutput + ?Sized>(&mut self, out: &mut O, rect: Rect) -> DisplayResult {
        if rect.is_empty() {
            return Ok(());
        }
        if self.len == BATCH {
            self.flush(out)?;
        }
        self.rects[self.len] = rect;
        self.len += 1;
        Ok(())
    }

    pub fn flush<O: DisplayOutput + ?Sized>(&mut self, out: &mut O) -> DisplayResult {
        if self.len == 0 {
            return Ok(());
        }
        let n = core::mem::take(&mut self.len);
        out.fill_rects(self.mode, self.color, &self.rects[..n])
    }
}
