//! Deterministic xorshift generator for randomized sequences.

use mosaic_abi::{Color, Rect};

pub struct XorShift(u32);

impl XorShift {
    pub fn new(seed: u32) -> Self {
        Self(seed.max(1))
    }

    pub fn next_u32(&mut self) -> u32 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.0 = x;
        x
    }

    /// Uniform in `0..n`; 0 when `n` is 0.
    pub fn below(&mut self, n: u32) -> u32 {
        if n == 0 { 0 } else { self.next_u32() % n }
    }

    /// Uniform in `lo..=hi`.
    pub fn range(&mut self, lo: i16, hi: i16) -> i16 {
        lo + self.below((hi - lo + 1) as u32) as i16
    }

    pub fn chance(&mut self, percent: u32) -> bool {
        self.below(100) < percent
    }

    pub fn pick<T: Copy>(&mut self, items: &[T]) -> T {
        items[self.below(items.len() as u32) as usize]
    }

    /// Non-empty rect inside `bounds`.
    pub fn rect_in(&mut self, bounds: Rect) -> Rect {
        let x0 = self.range(bounds.x0, bounds.x1);
        let y0 = self.range(bounds.y0, bounds.y1);
        let x1 = self.range(x0, bounds.x1);
        let y1 = self.range(y0, bounds.y1);
        Rect::new(x0, y0, x1, y1)
    }

    /// Rect inside `bounds` snapped outward to multiples of `step`.
    pub fn aligned_rect_in(&mut self, bounds: Rect, step: i16) -> Rect {
        let r = self.rect_in(bounds);
        Rect::new(
            r.x0 - r.x0.rem_euclid(step),
            r.y0 - r.y0.rem_euclid(step),
            r.x1 - r.x1.rem_euclid(step) + step - 1,
            r.y1 - r.y1.rem_euclid(step) + step - 1,
        )
        .intersection(&bounds)
    }

    pub fn opaque_color(&mut self) -> Color {
        Color::from_rgb(self.next_u32() as u8, self.next_u32() as u8, self.next_u32() as u8)
    }
}
