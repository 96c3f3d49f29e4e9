//! Persistent state of the background fill cache: the block mask, the
//! palette it indexes and per-slot usage counters.
//!
//! Mask cell `v > 0` asserts that every pixel of its block currently equals
//! `palette[v - 1]`. Cell 0 asserts nothing. `usage[v]` is the number of
//! cells holding `v`; it is kept exact so that dynamic slots can be reused
//! the moment nothing references them.

use alloc::vec::Vec;

use mosaic_abi::{Color, DisplayResult, Rect};
use mosaic_lib::alignment::div_ceil;
use mosaic_lib::{klog_debug, klog_info};

use crate::nibble::NibbleMask;

/// Side of a square block, in pixels.
pub const BLOCK: i16 = 4;

/// Palette capacity. Slot 0 is "unknown", so 15 colors fit in a nibble.
pub const MAX_PALETTE: usize = 15;

/// Block rectangle touching any pixel of `rect`.
#[inline]
pub fn covering_blocks(rect: Rect) -> Rect {
    Rect::new(
        rect.x0.div_euclid(BLOCK),
        rect.y0.div_euclid(BLOCK),
        rect.x1.div_euclid(BLOCK),
        rect.y1.div_euclid(BLOCK),
    )
}

/// Block rectangle lying entirely inside `rect`; may be empty.
#[inline]
pub fn inner_blocks(rect: Rect) -> Rect {
    if rect.is_empty() {
        return Rect::empty();
    }
    Rect::new(
        (rect.x0 + BLOCK - 1).div_euclid(BLOCK),
        (rect.y0 + BLOCK - 1).div_euclid(BLOCK),
        (rect.x1 + 1).div_euclid(BLOCK) - 1,
        (rect.y1 + 1).div_euclid(BLOCK) - 1,
    )
}

/// Pixel rectangle of a block rectangle.
#[inline]
pub fn block_pixels(blocks: Rect) -> Rect {
    Rect::new(
        blocks.x0 * BLOCK,
        blocks.y0 * BLOCK,
        blocks.x1 * BLOCK + BLOCK - 1,
        blocks.y1 * BLOCK + BLOCK - 1,
    )
}

pub struct FrameState<S = Vec<u8>> {
    mask: NibbleMask<S>,
    raw_width: i16,
    raw_height: i16,
    palette: [Color; MAX_PALETTE],
    size: u8,
    pinned: u8,
    usage: [u32; 16],
    palette_full: bool,
    swap_xy: bool,
}

impl FrameState<Vec<u8>> {
    /// Heap-backed state for a `width` x `height` pixel surface, fully
    /// invalidated, with an empty palette.
    pub fn new(width: i16, height: i16) -> Self {
        let mask = NibbleMask::new(div_ceil(width, BLOCK), div_ceil(height, BLOCK));
        let mut state = Self::from_mask(mask, width, height);
        state.usage[0] = state.cell_count();
        state
    }
}

impl<S> FrameState<S> {
    /// Bytes of storage `with_buffer` needs for a `width` x `height` surface.
    pub const fn size_for_dimensions(width: i16, height: i16) -> usize {
        NibbleMask::<S>::required_bytes(div_ceil(width, BLOCK), div_ceil(height, BLOCK))
    }

    fn from_mask(mask: NibbleMask<S>, raw_width: i16, raw_height: i16) -> Self {
        Self {
            mask,
            raw_width,
            raw_height,
            palette: [Color::TRANSPARENT; MAX_PALETTE],
            size: 0,
            pinned: 0,
            usage: [0; 16],
            palette_full: false,
            swap_xy: false,
        }
    }

    #[inline]
    pub fn palette(&self) -> &[Color] {
        &self.palette[..self.size as usize]
    }

    #[inline]
    pub fn palette_size(&self) -> u8 {
        self.size
    }

    #[inline]
    pub fn pinned(&self) -> u8 {
        self.pinned
    }

    /// Number of cells currently holding `slot`.
    #[inline]
    pub fn usage(&self, slot: u8) -> u32 {
        self.usage[slot as usize & 0x0F]
    }

    #[inline]
    pub fn mask(&self) -> &NibbleMask<S> {
        &self.mask
    }

    #[inline]
    pub fn swap_xy(&self) -> bool {
        self.swap_xy
    }

    /// Set once every dynamic slot is referenced; cleared as soon as one is
    /// released.
    #[inline]
    pub fn palette_full(&self) -> bool {
        self.palette_full
    }

    /// Raw (unrotated) surface size in pixels.
    #[inline]
    pub fn raw_size(&self) -> (i16, i16) {
        (self.raw_width, self.raw_height)
    }

    #[inline]
    fn cell_count(&self) -> u32 {
        self.mask.width() as u32 * self.mask.height() as u32
    }

    /// Slot holding `color`, or 0.
    #[inline]
    pub fn slot_of(&self, color: Color) -> u8 {
        self.palette()
            .iter()
            .position(|&c| c == color)
            .map_or(0, |i| i as u8 + 1)
    }

    /// The color recorded by `slot`, if it is in use.
    #[inline]
    pub fn color_of(&self, slot: u8) -> Option<Color> {
        if slot == 0 || slot > self.size {
            return None;
        }
        Some(self.palette[slot as usize - 1])
    }
}

impl<S: AsRef<[u8]> + AsMut<[u8]>> FrameState<S> {
    /// State over caller-supplied storage, which must hold at least
    /// `size_for_dimensions(width, height)` bytes. The contents are kept and
    /// the usage counters are rebuilt from them, so storage that survived a
    /// reset can be reused once the same palette is installed again.
    pub fn with_buffer(width: i16, height: i16, storage: S) -> DisplayResult<Self> {
        let mask = NibbleMask::from_buffer(div_ceil(width, BLOCK), div_ceil(height, BLOCK), storage)?;
        let mut state = Self::from_mask(mask, width, height);
        state.count_cells();
        Ok(state)
    }

    /// Install `colors`, all of them permanent.
    pub fn set_palette(&mut self, colors: &[Color]) {
        self.set_palette_with_pinned(colors, colors.len());
    }

    /// Install `colors`; the first `pinned` are permanent and the rest may be
    /// reassigned once unused. The mask is kept, except for cells naming a
    /// slot past the end of the new palette, which drop to 0. Callers that
    /// cannot vouch for the existing mask must `invalidate()`.
    pub fn set_palette_with_pinned(&mut self, colors: &[Color], pinned: usize) {
        debug_assert!(colors.len() <= MAX_PALETTE, "palette holds at most {MAX_PALETTE} colors");
        let n = colors.len().min(MAX_PALETTE);
        self.palette[..n].copy_from_slice(&colors[..n]);
        self.palette[n..].fill(Color::TRANSPARENT);
        self.size = n as u8;
        self.pinned = pinned.min(n) as u8;
        self.palette_full = false;
        self.recount_usage();
        klog_debug!("bgfill: palette set, {} colors ({} pinned)", self.size, self.pinned);
    }

    /// Declare the whole device to hold `color`. Colors outside the palette
    /// invalidate instead.
    pub fn set_prefilled(&mut self, color: Color) {
        let slot = self.slot_of(color);
        self.reset_cells(slot);
    }

    /// Forget everything the mask knows.
    pub fn invalidate(&mut self) {
        self.reset_cells(0);
    }

    /// Forget the blocks overlapping pixel rectangle `rect`.
    pub fn invalidate_rect(&mut self, rect: Rect) {
        if rect.is_empty() {
            return;
        }
        self.fill_cells(covering_blocks(rect), 0);
    }

    /// Switch between the raw and the axis-swapped view of the device. The
    /// mask is reinterpreted with transposed dimensions and invalidated.
    pub fn set_swap_xy(&mut self, swap: bool) {
        if swap == self.swap_xy {
            return;
        }
        let (w, h) = (self.mask.height(), self.mask.width());
        // Same byte count either way, so reshaping cannot fail.
        if self.mask.reshape(w, h).is_ok() {
            self.swap_xy = swap;
        }
        self.invalidate();
        klog_debug!("bgfill: swap_xy={} ({}x{} blocks), mask invalidated", swap, w, h);
    }

    #[inline]
    pub fn cell(&self, bx: i16, by: i16) -> u8 {
        self.mask.get(bx, by)
    }

    /// Set one cell, keeping the counters exact.
    pub fn set_cell(&mut self, bx: i16, by: i16, v: u8) {
        let old = self.mask.get(bx, by);
        if old == v {
            return;
        }
        self.mask.set(bx, by, v);
        self.usage[v as usize] += 1;
        self.release(old, 1);
    }

    /// Set every cell in block rectangle `blocks` (clipped) to `v`.
    pub fn fill_cells(&mut self, blocks: Rect, v: u8) {
        let blocks = blocks.intersection(&self.mask.bounds());
        if blocks.is_empty() {
            return;
        }
        let mut before = [0u32; 16];
        for old in self.mask.window(blocks) {
            before[old as usize] += 1;
        }
        let changed = blocks.area() - before[v as usize];
        if changed == 0 {
            return;
        }
        self.mask.fill_rect(blocks, v);
        self.usage[v as usize] += changed;
        for (old, &n) in before.iter().enumerate() {
            if old != v as usize && n > 0 {
                self.release(old as u8, n);
            }
        }
    }

    /// First run of cells in row `by`, starting at `from` and ending at or
    /// before `to`, whose value differs from `slot`. Returns inclusive
    /// column bounds.
    pub fn next_run_not_equal(&self, by: i16, from: i16, to: i16, slot: u8) -> Option<(i16, i16)> {
        if from > to {
            return None;
        }
        let start = self
            .mask
            .window(Rect::new(from, by, to, by))
            .position(|v| v != slot)? as i16
            + from;
        let len = self
            .mask
            .window(Rect::new(start, by, to, by))
            .take_while(|&v| v != slot)
            .count() as i16;
        Some((start, start + len - 1))
    }

    fn release(&mut self, slot: u8, n: u32) {
        debug_assert!(self.usage[slot as usize] >= n, "usage underflow on slot {slot}");
        self.usage[slot as usize] = self.usage[slot as usize].saturating_sub(n);
        if self.usage[slot as usize] == 0 && slot > self.pinned && self.palette_full {
            self.palette_full = false;
            klog_debug!("bgfill: slot {} released, palette no longer full", slot);
        }
    }

    fn reset_cells(&mut self, slot: u8) {
        self.mask.fill(slot);
        self.usage = [0; 16];
        self.usage[slot as usize] = self.cell_count();
        self.palette_full = false;
    }

    /// Find a slot for `color`, which must not be resident. Prefers the
    /// highest unused dynamic slot, then growing the palette. Returns 0 once
    /// every slot is taken; later calls return 0 immediately until a dynamic
    /// slot is released.
    pub fn claim_slot(&mut self, color: Color) -> u8 {
        debug_assert_eq!(self.slot_of(color), 0);
        if self.palette_full {
            return 0;
        }
        let reusable = (self.pinned + 1..=self.size).rev().find(|&s| self.usage[s as usize] == 0);
        if let Some(slot) = reusable {
            self.palette[slot as usize - 1] = color;
            klog_debug!("bgfill: reusing slot {} for {:#010x}", slot, color.0);
            return slot;
        }
        if (self.size as usize) < MAX_PALETTE {
            self.palette[self.size as usize] = color;
            self.size += 1;
            klog_debug!("bgfill: added {:#010x} as slot {}", color.0, self.size);
            return self.size;
        }
        self.palette_full = true;
        klog_info!("bgfill: palette full, new colors are not cached");
        0
    }

    /// Rebuild counters from the mask, dropping cells that name a slot past
    /// the end of the palette.
    pub fn recount_usage(&mut self) {
        let bounds = self.mask.bounds();
        for by in bounds.y0..=bounds.y1 {
            for bx in bounds.x0..=bounds.x1 {
                if self.mask.get(bx, by) > self.size {
                    self.mask.set(bx, by, 0);
                }
            }
        }
        self.count_cells();
    }

    fn count_cells(&mut self) {
        let mut usage = [0u32; 16];
        for v in self.mask.window(self.mask.bounds()) {
            usage[v as usize] += 1;
        }
        self.usage = usage;
    }

    /// Whether the counters match a fresh count of the mask.
    pub fn check_usage(&self) -> bool {
        let mut usage = [0u32; 16];
        for v in self.mask.window(self.mask.bounds()) {
            usage[v as usize] += 1;
        }
        usage == self.usage
    }

    pub fn into_inner(self) -> S {
        self.mask.into_inner()
    }
}
