//! Packed grid of 4-bit values.
//!
//! Layout: row-major, `stride = ceil(width / 2)` bytes per row, the even
//! column in the high nibble and the odd column in the low nibble. The row
//! count is padded to an even number so the buffer size does not change when
//! width and height are exchanged.
//!
//! Coordinates are cells, not pixels. Every accessor is bounds checked: reads
//! outside the grid return 0 and writes outside it are dropped, after a
//! `debug_assert!` flags the caller.

use alloc::vec;
use alloc::vec::Vec;

use mosaic_abi::{DisplayError, DisplayResult, Rect};
use mosaic_lib::alignment::{div_ceil, round_up_even};

#[inline]
const fn byte_index(stride: usize, x: i16, y: i16) -> usize {
    y as usize * stride + (x as usize >> 1)
}

#[inline]
const fn read_nibble(byte: u8, x: i16) -> u8 {
    if x & 1 == 0 { byte >> 4 } else { byte & 0x0F }
}

#[inline]
const fn write_nibble(byte: u8, x: i16, v: u8) -> u8 {
    if x & 1 == 0 {
        (byte & 0x0F) | (v << 4)
    } else {
        (byte & 0xF0) | (v & 0x0F)
    }
}

/// Set columns `x0..=x1` of one packed row to `v`.
fn nibble_fill(row: &mut [u8], mut x0: i16, mut x1: i16, v: u8) {
    if x0 > x1 {
        return;
    }
    if x0 & 1 == 1 {
        let i = (x0 >> 1) as usize;
        row[i] = write_nibble(row[i], x0, v);
        x0 += 1;
    }
    if x0 <= x1 && x1 & 1 == 0 {
        let i = (x1 >> 1) as usize;
        row[i] = write_nibble(row[i], x1, v);
        x1 -= 1;
    }
    if x0 <= x1 {
        row[(x0 >> 1) as usize..=(x1 >> 1) as usize].fill(v * 0x11);
    }
}

pub struct NibbleMask<S = Vec<u8>> {
    buf: S,
    width: i16,
    height: i16,
    stride: usize,
}

impl NibbleMask<Vec<u8>> {
    /// Zeroed, heap-allocated grid.
    pub fn new(width: i16, height: i16) -> Self {
        let len = Self::required_bytes(width, height);
        Self {
            buf: vec![0; len],
            width,
            height,
            stride: div_ceil(width, 2) as usize,
        }
    }
}

impl<S> NibbleMask<S> {
    /// Bytes needed for a `width` x `height` grid.
    pub const fn required_bytes(width: i16, height: i16) -> usize {
        div_ceil(width, 2) as usize * round_up_even(height) as usize
    }

    #[inline]
    pub fn width(&self) -> i16 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> i16 {
        self.height
    }

    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// The whole grid as a cell rectangle.
    #[inline]
    pub fn bounds(&self) -> Rect {
        Rect::new(0, 0, self.width - 1, self.height - 1)
    }

    #[inline]
    fn in_bounds(&self, x: i16, y: i16) -> bool {
        x >= 0 && y >= 0 && x < self.width && y < self.height
    }

    pub fn into_inner(self) -> S {
        self.buf
    }
}

impl<S: AsRef<[u8]> + AsMut<[u8]>> NibbleMask<S> {
    /// Wrap caller-owned storage. The contents are used as they are.
    pub fn from_buffer(width: i16, height: i16, buf: S) -> DisplayResult<Self> {
        if width <= 0 || height <= 0 || buf.as_ref().len() < Self::required_bytes(width, height) {
            return Err(DisplayError::Invalid);
        }
        Ok(Self {
            buf,
            width,
            height,
            stride: div_ceil(width, 2) as usize,
        })
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        let len = Self::required_bytes(self.width, self.height);
        &self.buf.as_ref()[..len]
    }

    #[inline]
    pub fn get(&self, x: i16, y: i16) -> u8 {
        debug_assert!(self.in_bounds(x, y), "nibble read out of range: ({x}, {y})");
        if !self.in_bounds(x, y) {
            return 0;
        }
        let byte = self.buf.as_ref()[byte_index(self.stride, x, y)];
        read_nibble(byte, x)
    }

    #[inline]
    pub fn set(&mut self, x: i16, y: i16, v: u8) {
        debug_assert!(v <= 0x0F);
        debug_assert!(self.in_bounds(x, y), "nibble write out of range: ({x}, {y})");
        if !self.in_bounds(x, y) {
            return;
        }
        let i = byte_index(self.stride, x, y);
        let bytes = self.buf.as_mut();
        bytes[i] = write_nibble(bytes[i], x, v);
    }

    /// Set every cell, padding included.
    pub fn fill(&mut self, v: u8) {
        let len = Self::required_bytes(self.width, self.height);
        self.buf.as_mut()[..len].fill((v & 0x0F) * 0x11);
    }

    /// Set every cell of `rect`, clipped to the grid.
    pub fn fill_rect(&mut self, rect: Rect, v: u8) {
        debug_assert!(v <= 0x0F);
        let r = rect.intersection(&self.bounds());
        if r.is_empty() {
            return;
        }
        let stride = self.stride;
        let bytes = self.buf.as_mut();
        if r.x0 == 0 && r.x1 == self.width - 1 {
            // Full rows are contiguous; the odd padding nibble goes along.
            let start = r.y0 as usize * stride;
            let end = (r.y1 as usize + 1) * stride;
            bytes[start..end].fill((v & 0x0F) * 0x11);
            return;
        }
        for y in r.y0..=r.y1 {
            let row = &mut bytes[y as usize * stride..(y as usize + 1) * stride];
            nibble_fill(row, r.x0, r.x1, v & 0x0F);
        }
    }

    /// Row-major values of `rect`, clipped to the grid.
    pub fn window(&self, rect: Rect) -> Window<'_> {
        let r = rect.intersection(&self.bounds());
        Window {
            bytes: self.as_bytes(),
            stride: self.stride,
            x0: r.x0,
            x1: r.x1,
            y1: r.y1,
            x: r.x0,
            y: if r.is_empty() { r.y1 + 1 } else { r.y0 },
        }
    }

    /// Change the logical shape without touching the bytes. The new shape
    /// must fit the existing storage.
    pub fn reshape(&mut self, width: i16, height: i16) -> DisplayResult {
        if width <= 0 || height <= 0 || self.buf.as_ref().len() < Self::required_bytes(width, height) {
            return Err(DisplayError::Invalid);
        }
        self.width = width;
        self.height = height;
        self.stride = div_ceil(width, 2) as usize;
        Ok(())
    }
}

/// Iterator returned by [`NibbleMask::window`].
pub struct Window<'a> {
    bytes: &'a [u8],
    stride: usize,
    x0: i16,
    x1: i16,
    y1: i16,
    x: i16,
    y: i16,
}

impl Iterator for Window<'_> {
    type Item = u8;

    fn next(&mut self) -> Option<u8> {
        if self.y > self.y1 {
            return None;
        }
        let v = read_nibble(self.bytes[byte_index(self.stride, self.x, self.y)], self.x);
        if self.x == self.x1 {
            self.x = self.x0;
            self.y += 1;
        } else {
            self.x += 1;
        }
        Some(v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.y > self.y1 {
            return (0, Some(0));
        }
        let w = (self.x1 - self.x0 + 1) as usize;
        let rows_after = (self.y1 - self.y) as usize;
        let n = rows_after * w + (self.x1 - self.x + 1) as usize;
        (n, Some(n))
    }
}

impl ExactSizeIterator for Window<'_> {}
