//! Rectangles and points in device coordinates.
//!
//! Bounds are inclusive on both ends, matching how display controllers take
//! column/row address windows.

/// A pixel coordinate.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Point {
    pub x: i16,
    pub y: i16,
}

impl Point {
    #[inline]
    pub const fn new(x: i16, y: i16) -> Self {
        Self { x, y }
    }
}

/// A rectangular region with inclusive bounds.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x0: i16,
    pub y0: i16,
    pub x1: i16, // inclusive
    pub y1: i16, // inclusive
}

impl Rect {
    #[inline]
    pub const fn new(x0: i16, y0: i16, x1: i16, y1: i16) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Rectangle from origin and size. `w` and `h` must be positive.
    #[inline]
    pub const fn from_size(x: i16, y: i16, w: i16, h: i16) -> Self {
        Self {
            x0: x,
            y0: y,
            x1: x + w - 1,
            y1: y + h - 1,
        }
    }

    /// An empty rect.
    #[inline]
    pub const fn empty() -> Self {
        Self {
            x0: 0,
            y0: 0,
            x1: -1,
            y1: -1,
        }
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.x0 > self.x1 || self.y0 > self.y1
    }

    #[inline]
    pub const fn width(&self) -> i16 {
        self.x1 - self.x0 + 1
    }

    #[inline]
    pub const fn height(&self) -> i16 {
        self.y1 - self.y0 + 1
    }

    /// Number of pixels covered.
    #[inline]
    pub fn area(&self) -> u32 {
        if self.is_empty() {
            0
        } else {
            self.width() as u32 * self.height() as u32
        }
    }

    #[inline]
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x0 && p.x <= self.x1 && p.y >= self.y0 && p.y <= self.y1
    }

    #[inline]
    pub fn contains_rect(&self, other: &Self) -> bool {
        other.x0 >= self.x0 && other.x1 <= self.x1 && other.y0 >= self.y0 && other.y1 <= self.y1
    }

    /// Overlap of two rects; may be empty.
    #[inline]
    pub fn intersection(&self, other: &Self) -> Self {
        Self {
            x0: self.x0.max(other.x0),
            y0: self.y0.max(other.y0),
            x1: self.x1.min(other.x1),
            y1: self.y1.min(other.y1),
        }
    }

    #[inline]
    pub fn intersects(&self, other: &Self) -> bool {
        self.x0 <= other.x1 && self.x1 >= other.x0 && self.y0 <= other.y1 && self.y1 >= other.y0
    }

    #[inline]
    pub fn translate(&self, dx: i16, dy: i16) -> Self {
        Self {
            x0: self.x0 + dx,
            y0: self.y0 + dy,
            x1: self.x1 + dx,
            y1: self.y1 + dy,
        }
    }
}
