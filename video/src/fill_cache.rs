//! Write-eliding filter in front of a display output.
//!
//! [`FillCache`] holds the per-address-window streaming state; the
//! persistent knowledge lives in [`FrameState`]. [`FillCache::bind`] pairs
//! the two with the wrapped output for the duration of a call and returns a
//! [`CachedOutput`], which implements [`DisplayOutput`] itself.
//!
//! Forwarding rules, all in service of one invariant (a nonzero mask cell
//! is never wrong about its block):
//!
//! - cells that end up 0 are cleared before the forward is issued;
//! - cells that end up naming a slot are set only after the forward
//!   returned `Ok`;
//! - a palette slot is claimed immediately before the forward that uses it,
//!   so a claimed but still unreferenced slot is never handed out twice.
//!
//! Errors from the wrapped output are returned as they are.

use mosaic_abi::{BlendingMode, Color, ColorFormat, DisplayError, DisplayOutput, DisplayResult, Point, Rect};
use mosaic_lib::alignment::{align_down, is_aligned};
use mosaic_lib::klog_trace;

use crate::buffered::{BufferedPixelFiller, BufferedPixelWriter, BufferedRectFiller, BufferedRectWriter};
use crate::config::FillCacheConfig;
use crate::frame_state::{BLOCK, FrameState, block_pixels, covering_blocks, inner_blocks};

/// Streaming mode within the current block-row stripe.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScanState {
    /// Looking for uniform runs and blocks.
    Scanning,
    /// Forwarding without inspection until the stripe ends.
    Passthrough,
}

/// Identical colors seen while scanning and not yet forwarded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct UniformRun {
    start: u32,
    len: u32,
    color: Color,
}

/// Streamed input: either caller colors or one repeated color.
#[derive(Clone, Copy)]
enum Pixels<'p> {
    Slice(&'p [Color]),
    Repeat(Color, u32),
}

impl<'p> Pixels<'p> {
    #[inline]
    fn len(&self) -> u32 {
        match *self {
            Pixels::Slice(s) => s.len() as u32,
            Pixels::Repeat(_, n) => n,
        }
    }

    #[inline]
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    fn get(&self, i: u32) -> Color {
        match *self {
            Pixels::Slice(s) => s[i as usize],
            Pixels::Repeat(c, _) => c,
        }
    }

    fn split_at(self, n: u32) -> (Self, Self) {
        match self {
            Pixels::Slice(s) => {
                let (a, b) = s.split_at(n as usize);
                (Pixels::Slice(a), Pixels::Slice(b))
            }
            Pixels::Repeat(c, len) => (Pixels::Repeat(c, n), Pixels::Repeat(c, len - n)),
        }
    }

    #[inline]
    fn sub(self, offset: u32, len: u32) -> Self {
        self.split_at(offset).1.split_at(len).0
    }

    /// Length of the prefix equal to `color`, capped at `max`.
    fn count_equal(&self, color: Color, max: u32) -> u32 {
        match *self {
            Pixels::Slice(s) => s.iter().take(max as usize).take_while(|&&c| c == color).count() as u32,
            Pixels::Repeat(c, n) if c == color => n.min(max),
            Pixels::Repeat(..) => 0,
        }
    }

    /// The color of the `BLOCK` x `BLOCK` square at `offset` if it is
    /// uniform. Rows are `row_len` apart.
    fn uniform_block(&self, offset: u32, row_len: u32) -> Option<Color> {
        let first = self.get(offset);
        let b = BLOCK as u32;
        (0..b)
            .all(|r| self.sub(offset + r * row_len, b).count_equal(first, b) == b)
            .then_some(first)
    }

    fn forward<O: DisplayOutput + ?Sized>(self, out: &mut O) -> DisplayResult {
        match self {
            Pixels::Slice(s) => out.write(s),
            Pixels::Repeat(c, n) => out.fill(c, n),
        }
    }
}

/// Split `len` window ordinals starting at `start` into a partial first
/// row, a block of full rows and a partial last row. Unused parts are empty.
pub(crate) fn span_rects(window: Rect, start: u32, len: u32) -> [Rect; 3] {
    let mut out = [Rect::empty(); 3];
    if len == 0 || window.is_empty() {
        return out;
    }
    let w = window.width() as u32;
    let end = start + len - 1;
    let (r0, c0) = (start / w, start % w);
    let (r1, c1) = (end / w, end % w);
    let col = |c: u32| window.x0 + c as i16;
    let row = |r: u32| window.y0 + r as i16;
    if r0 == r1 {
        out[0] = Rect::new(col(c0), row(r0), col(c1), row(r0));
        return out;
    }
    let mut body_first = r0;
    if c0 != 0 {
        out[0] = Rect::new(col(c0), row(r0), window.x1, row(r0));
        body_first += 1;
    }
    let mut body_last = r1;
    if c1 != w - 1 {
        out[2] = Rect::new(window.x0, row(r1), col(c1), row(r1));
        body_last -= 1;
    }
    if body_first <= body_last {
        out[1] = Rect::new(window.x0, row(body_first), window.x1, row(body_last));
    }
    out
}

pub struct FillCache {
    config: FillCacheConfig,
    window: Rect,
    mode: BlendingMode,
    area: u32,
    cursor: u32,
    state: ScanState,
    run: Option<UniformRun>,
    pending: Option<Color>,
    /// Window ordinal the wrapped output's cursor sits at, and the ordinal
    /// at which its address window runs out.
    synced: Option<(u32, u32)>,
}

impl Default for FillCache {
    fn default() -> Self {
        Self::new(FillCacheConfig::default())
    }
}

impl FillCache {
    pub fn new(config: FillCacheConfig) -> Self {
        Self {
            config,
            window: Rect::empty(),
            mode: BlendingMode::Source,
            area: 0,
            cursor: 0,
            state: ScanState::Scanning,
            run: None,
            pending: None,
            synced: None,
        }
    }

    #[inline]
    pub fn config(&self) -> &FillCacheConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: FillCacheConfig) {
        self.config = config;
        self.pending = None;
    }

    #[inline]
    pub fn scan_state(&self) -> ScanState {
        self.state
    }

    /// Color seen once and waiting for a second qualifying use.
    #[inline]
    pub fn pending_color(&self) -> Option<Color> {
        self.pending
    }

    /// Whether a uniform run is held back, waiting for more pixels.
    #[inline]
    pub fn has_deferred_run(&self) -> bool {
        self.run.is_some()
    }

    /// Pair with state and output for one or more calls.
    pub fn bind<'a, S, D>(&'a mut self, frame: &'a mut FrameState<S>, out: &'a mut D) -> CachedOutput<'a, S, D>
    where
        S: AsRef<[u8]> + AsMut<[u8]>,
        D: DisplayOutput + ?Sized,
    {
        CachedOutput { cache: self, frame, out }
    }

    /// Forward a deferred uniform run now.
    pub fn flush<S, D>(&mut self, frame: &mut FrameState<S>, out: &mut D) -> DisplayResult
    where
        S: AsRef<[u8]> + AsMut<[u8]>,
        D: DisplayOutput + ?Sized,
    {
        self.bind(frame, out).flush_run()
    }

    /// Drop the address window, e.g. after the output was reconfigured.
    /// Deferred pixels must have been flushed.
    pub fn reset_window(&mut self) {
        debug_assert!(self.run.is_none());
        self.window = Rect::empty();
        self.area = 0;
        self.cursor = 0;
        self.state = ScanState::Scanning;
        self.run = None;
        self.pending = None;
        self.synced = None;
    }

    /// Ordinal one past the last pixel of the block-row stripe holding the
    /// cursor.
    fn stripe_end(&self) -> u32 {
        let w = self.window.width() as u32;
        let y = self.window.y0 + (self.cursor / w) as i16;
        let last = (align_down(y, BLOCK) + BLOCK - 1).min(self.window.y1);
        (last - self.window.y0 + 1) as u32 * w
    }

    /// Whether the next `BLOCK` rows can be handled block by block.
    fn aligned_stripe_ahead(&self, available: u32) -> bool {
        let w = self.window.width();
        let y = self.window.y0 + (self.cursor / w as u32) as i16;
        self.run.is_none()
            && is_aligned(self.window.x0, BLOCK)
            && is_aligned(w, BLOCK)
            && self.cursor % w as u32 == 0
            && is_aligned(y, BLOCK)
            && y + BLOCK - 1 <= self.window.y1
            && available >= w as u32 * BLOCK as u32
    }
}

/// Consecutive blocks of one stripe handled by a single forward.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Streak {
    Raw { bx0: i16, bx1: i16 },
    Fill { bx0: i16, bx1: i16, color: Color, slot: u8 },
}

/// A [`FillCache`] bound to its state and the output it filters.
pub struct CachedOutput<'a, S, D: ?Sized> {
    cache: &'a mut FillCache,
    frame: &'a mut FrameState<S>,
    out: &'a mut D,
}

impl<S, D> CachedOutput<'_, S, D>
where
    S: AsRef<[u8]> + AsMut<[u8]>,
    D: DisplayOutput + ?Sized,
{
    pub fn frame(&self) -> &FrameState<S> {
        self.frame
    }

    /// Dynamic admission: the second consecutive qualifying use of a color
    /// gets a slot (or the first, with confirmation off).
    fn admit(&mut self, color: Color) -> u8 {
        if !self.cache.config.dynamic_palette {
            return 0;
        }
        if self.cache.config.confirm_dynamic && self.cache.pending != Some(color) {
            self.cache.pending = Some(color);
            return 0;
        }
        self.cache.pending = None;
        self.frame.claim_slot(color)
    }

    /// Slot to record for a replacing write of `color`. Resident colors are
    /// always usable; others only when `qualifies`.
    fn slot_for(&mut self, color: Color, qualifies: bool) -> u8 {
        let resident = self.frame.slot_of(color);
        if resident != 0 || !qualifies {
            self.cache.pending = None;
            return resident;
        }
        self.admit(color)
    }

    /// Fill `rect` with `color` and record it under `slot`, skipping the
    /// blocks already known to hold it. Only blocks `rect` covers entirely
    /// are marked; partially covered ones end up 0.
    pub fn fill_rect_bg(&mut self, mode: BlendingMode, rect: Rect, color: Color, slot: u8) -> DisplayResult {
        debug_assert!(slot != 0 && self.frame.color_of(slot) == Some(color));
        debug_assert!(mode.replaces(color));
        if rect.is_empty() {
            return Ok(());
        }
        let blocks = covering_blocks(rect);
        if !self.frame.mask().bounds().contains_rect(&blocks) {
            self.frame.invalidate_rect(rect);
            return self.out.fill_rect(mode, rect, color);
        }
        let inner = inner_blocks(rect);
        for by in blocks.y0..=blocks.y1 {
            let mut from = blocks.x0;
            while let Some((bx0, bx1)) = self.frame.next_run_not_equal(by, from, blocks.x1, slot) {
                let cells = Rect::new(bx0, by, bx1, by);
                self.frame.fill_cells(cells, 0);
                self.out.fill_rect(mode, block_pixels(cells).intersection(&rect), color)?;
                self.frame.fill_cells(cells.intersection(&inner), slot);
                from = bx1 + 1;
            }
        }
        Ok(())
    }

    /// Forward a rect fill, through the mask when a slot applies.
    fn fill_area(&mut self, mode: BlendingMode, rect: Rect, color: Color, slot: u8) -> DisplayResult {
        if slot != 0 {
            return self.fill_rect_bg(mode, rect, color, slot);
        }
        self.frame.invalidate_rect(rect);
        self.out.fill_rect(mode, rect, color)
    }

    /// Forward the deferred uniform run, if any.
    pub fn flush_run(&mut self) -> DisplayResult {
        let Some(run) = self.cache.run.take() else {
            return Ok(());
        };
        self.cache.synced = None;
        let mode = self.cache.mode;
        let rects = span_rects(self.cache.window, run.start, run.len);
        let slot = if mode.replaces(run.color) {
            let qualifies = rects.iter().any(|r| !inner_blocks(*r).is_empty());
            self.slot_for(run.color, qualifies)
        } else {
            0
        };
        for rect in rects.into_iter().filter(|r| !r.is_empty()) {
            self.fill_area(mode, rect, run.color, slot)?;
        }
        Ok(())
    }

    /// Point the wrapped output at the cursor. Returns the ordinal where the
    /// new device window ends.
    fn sync(&mut self) -> DisplayResult<u32> {
        let c = &*self.cache;
        let w = c.window.width() as u32;
        let x = c.window.x0 + (c.cursor % w) as i16;
        let y = c.window.y0 + (c.cursor / w) as i16;
        let (rect, limit) = if x == c.window.x0 {
            (Rect::new(x, y, c.window.x1, c.window.y1), c.area)
        } else {
            (Rect::new(x, y, c.window.x1, y), (c.cursor / w + 1) * w)
        };
        let mode = c.mode;
        self.cache.synced = None;
        self.out.set_address(rect, mode)?;
        self.cache.synced = Some((self.cache.cursor, limit));
        Ok(limit)
    }

    /// Forward pixels at the cursor unexamined, forgetting the blocks they
    /// land in.
    fn passthrough(&mut self, mut px: Pixels<'_>) -> DisplayResult {
        for rect in span_rects(self.cache.window, self.cache.cursor, px.len()) {
            self.frame.invalidate_rect(rect);
        }
        while !px.is_empty() {
            let limit = match self.cache.synced {
                Some((at, limit)) if at == self.cache.cursor && at < limit => limit,
                _ => self.sync()?,
            };
            let n = px.len().min(limit - self.cache.cursor);
            let (head, rest) = px.split_at(n);
            head.forward(&mut *self.out)?;
            self.cache.cursor += n;
            self.cache.synced = Some((self.cache.cursor, limit));
            px = rest;
        }
        Ok(())
    }

    fn emit_streak(&mut self, streak: Option<Streak>, px: Pixels<'_>, by: i16) -> DisplayResult {
        let mode = self.cache.mode;
        let w = self.cache.window.width() as u32;
        let left = self.cache.window.x0.div_euclid(BLOCK);
        match streak {
            None => Ok(()),
            Some(Streak::Raw { bx0, bx1 }) => {
                let cells = Rect::new(bx0, by, bx1, by);
                self.frame.fill_cells(cells, 0);
                self.out.set_address(block_pixels(cells), mode)?;
                let offset = (bx0 - left) as u32 * BLOCK as u32;
                let len = (bx1 - bx0 + 1) as u32 * BLOCK as u32;
                for r in 0..BLOCK as u32 {
                    px.sub(r * w + offset, len).forward(&mut *self.out)?;
                }
                Ok(())
            }
            Some(Streak::Fill { bx0, bx1, color, slot }) => {
                let cells = Rect::new(bx0, by, bx1, by);
                self.frame.fill_cells(cells, 0);
                self.out.fill_rect(mode, block_pixels(cells), color)?;
                if slot != 0 {
                    self.frame.fill_cells(cells, slot);
                }
                Ok(())
            }
        }
    }

    /// Handle one full block-aligned stripe, block by block. Returns the
    /// pixels after the stripe.
    fn aligned_stripe<'p>(&mut self, px: Pixels<'p>) -> DisplayResult<Pixels<'p>> {
        let w = self.cache.window.width() as u32;
        let b = BLOCK as u32;
        let y = self.cache.window.y0 + (self.cache.cursor / w) as i16;
        let by = y.div_euclid(BLOCK);
        let left = self.cache.window.x0.div_euclid(BLOCK);
        let mode = self.cache.mode;
        let mut streak: Option<Streak> = None;
        for k in 0..w / b {
            let bx = left + k as i16;
            let next = match px.uniform_block(k * b, w) {
                Some(color) if mode.replaces(color) => {
                    let mut slot = self.frame.slot_of(color);
                    if slot != 0 {
                        self.cache.pending = None;
                    } else {
                        // A claim may hand out any unreferenced slot,
                        // including one a held-back streak is about to use.
                        self.emit_streak(streak.take(), px, by)?;
                        slot = self.admit(color);
                    }
                    if slot != 0 && self.frame.cell(bx, by) == slot {
                        None
                    } else {
                        Some(Streak::Fill { bx0: bx, bx1: bx, color, slot })
                    }
                }
                Some(color) => Some(Streak::Fill { bx0: bx, bx1: bx, color, slot: 0 }),
                None => {
                    self.cache.pending = None;
                    Some(Streak::Raw { bx0: bx, bx1: bx })
                }
            };
            streak = match (streak, next) {
                (Some(Streak::Raw { bx0, .. }), Some(Streak::Raw { bx1, .. })) => Some(Streak::Raw { bx0, bx1 }),
                (
                    Some(Streak::Fill { bx0, color, slot, .. }),
                    Some(Streak::Fill { bx1, color: c, slot: s, .. }),
                ) if c == color && s == slot => Some(Streak::Fill { bx0, bx1, color, slot }),
                (current, next) => {
                    self.emit_streak(current, px, by)?;
                    next
                }
            };
        }
        self.emit_streak(streak, px, by)?;
        self.cache.synced = None;
        self.cache.cursor += w * b;
        Ok(px.split_at(w * b).1)
    }

    fn stream(&mut self, mut px: Pixels<'_>) -> DisplayResult {
        if px.is_empty() {
            return Ok(());
        }
        if self.cache.window.is_empty() {
            debug_assert!(false, "write without an address window");
            return Err(DisplayError::Invalid);
        }
        while !px.is_empty() {
            if self.cache.cursor >= self.cache.area {
                self.cache.cursor = 0;
                self.cache.state = ScanState::Scanning;
            }
            let stripe_end = self.cache.stripe_end();
            let limit = px.len().min(stripe_end - self.cache.cursor);
            match self.cache.state {
                ScanState::Passthrough => {
                    let (head, rest) = px.split_at(limit);
                    self.passthrough(head)?;
                    px = rest;
                    if self.cache.cursor == stripe_end {
                        self.cache.state = ScanState::Scanning;
                    }
                }
                ScanState::Scanning if self.cache.aligned_stripe_ahead(px.len()) => {
                    px = self.aligned_stripe(px)?;
                }
                ScanState::Scanning => {
                    let color = self.cache.run.map_or_else(|| px.get(0), |r| r.color);
                    let n = px.count_equal(color, limit);
                    if n > 0 {
                        match self.cache.run.as_mut() {
                            Some(run) => run.len += n,
                            None => {
                                self.cache.run = Some(UniformRun { start: self.cache.cursor, len: n, color });
                            }
                        }
                        self.cache.cursor += n;
                        px = px.split_at(n).1;
                    }
                    if n < limit {
                        self.flush_run()?;
                        self.cache.state = ScanState::Passthrough;
                        klog_trace!("bgfill: passthrough at ordinal {}", self.cache.cursor);
                    } else if self.cache.cursor == stripe_end {
                        self.flush_run()?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Shared tail of `fill_rects`/`write_rects`: slot for one rect, or 0.
    fn rect_slot(&mut self, mode: BlendingMode, rect: Rect, color: Color) -> u8 {
        if !mode.replaces(color) {
            return 0;
        }
        let qualifies = self.cache.config.admits_size(rect.width(), rect.height());
        self.slot_for(color, qualifies)
    }

    /// Block of pixel `p`, if the mask covers it.
    fn block_of(&self, p: Point) -> Option<(i16, i16)> {
        let b = Point::new(p.x.div_euclid(BLOCK), p.y.div_euclid(BLOCK));
        self.frame.mask().bounds().contains(b).then_some((b.x, b.y))
    }

    /// Work that must reach the output before a non-streaming call.
    fn settle(&mut self) -> DisplayResult {
        self.flush_run()?;
        self.cache.synced = None;
        Ok(())
    }
}

impl<S, D> DisplayOutput for CachedOutput<'_, S, D>
where
    S: AsRef<[u8]> + AsMut<[u8]>,
    D: DisplayOutput + ?Sized,
{
    fn begin(&mut self) -> DisplayResult {
        self.out.begin()
    }

    fn end(&mut self) -> DisplayResult {
        self.flush_run()?;
        self.out.end()
    }

    fn set_address(&mut self, window: Rect, mode: BlendingMode) -> DisplayResult {
        debug_assert!(!window.is_empty());
        self.flush_run()?;
        let c = &mut *self.cache;
        c.window = window;
        c.mode = mode;
        c.area = window.area();
        c.cursor = 0;
        c.state = ScanState::Scanning;
        c.pending = None;
        c.synced = None;
        Ok(())
    }

    fn write(&mut self, colors: &[Color]) -> DisplayResult {
        self.stream(Pixels::Slice(colors))
    }

    fn fill(&mut self, color: Color, count: u32) -> DisplayResult {
        self.stream(Pixels::Repeat(color, count))
    }

    fn write_rects(&mut self, mode: BlendingMode, colors: &[Color], rects: &[Rect]) -> DisplayResult {
        debug_assert_eq!(colors.len(), rects.len());
        self.settle()?;
        let mut batch = BufferedRectWriter::new(mode);
        for (&color, &rect) in colors.iter().zip(rects) {
            if rect.is_empty() {
                continue;
            }
            let slot = self.rect_slot(mode, rect, color);
            if slot != 0 {
                batch.flush(&mut *self.out)?;
                self.fill_rect_bg(mode, rect, color, slot)?;
            } else {
                self.frame.invalidate_rect(rect);
                batch.push(&mut *self.out, rect, color)?;
            }
        }
        batch.flush(&mut *self.out)
    }

    fn fill_rects(&mut self, mode: BlendingMode, color: Color, rects: &[Rect]) -> DisplayResult {
        self.settle()?;
        let mut batch = BufferedRectFiller::new(mode, color);
        for &rect in rects {
            if rect.is_empty() {
                continue;
            }
            let slot = self.rect_slot(mode, rect, color);
            if slot != 0 {
                batch.flush(&mut *self.out)?;
                self.fill_rect_bg(mode, rect, color, slot)?;
            } else {
                self.frame.invalidate_rect(rect);
                batch.push(&mut *self.out, rect)?;
            }
        }
        batch.flush(&mut *self.out)
    }

    fn write_pixels(&mut self, mode: BlendingMode, colors: &[Color], points: &[Point]) -> DisplayResult {
        debug_assert_eq!(colors.len(), points.len());
        self.settle()?;
        let mut batch = BufferedPixelWriter::new(mode);
        for (&color, &p) in colors.iter().zip(points) {
            if let Some((bx, by)) = self.block_of(p) {
                let slot = if mode.replaces(color) { self.frame.slot_of(color) } else { 0 };
                if slot != 0 && self.frame.cell(bx, by) == slot {
                    continue;
                }
                self.frame.set_cell(bx, by, 0);
            }
            batch.push(&mut *self.out, p, color)?;
        }
        batch.flush(&mut *self.out)
    }

    fn fill_pixels(&mut self, mode: BlendingMode, color: Color, points: &[Point]) -> DisplayResult {
        self.settle()?;
        let slot = if mode.replaces(color) { self.frame.slot_of(color) } else { 0 };
        let mut batch = BufferedPixelFiller::new(mode, color);
        for &p in points {
            if let Some((bx, by)) = self.block_of(p) {
                if slot != 0 && self.frame.cell(bx, by) == slot {
                    continue;
                }
                self.frame.set_cell(bx, by, 0);
            }
            batch.push(&mut *self.out, p)?;
        }
        batch.flush(&mut *self.out)
    }

    fn color_format(&self) -> &'static dyn ColorFormat {
        self.out.color_format()
    }

    fn draw_direct_rect(&mut self, data: &[u8], row_stride: usize, src: Rect, dst: Point) -> DisplayResult {
        self.settle()?;
        if src.is_empty() {
            return Ok(());
        }
        let target = src.translate(dst.x - src.x0, dst.y - src.y0);
        let blocks = covering_blocks(target);
        if !self.frame.mask().bounds().contains_rect(&blocks) {
            self.frame.invalidate_rect(target);
            return self.out.draw_direct_rect(data, row_stride, src, dst);
        }
        let (dx, dy) = (src.x0 - target.x0, src.y0 - target.y0);
        let format = self.out.color_format();
        for by in blocks.y0..=blocks.y1 {
            let mut streak: Option<i16> = None;
            for bx in blocks.x0..=blocks.x1 + 1 {
                let mut raw = false;
                let mut fill: Option<(Rect, Color, u8)> = None;
                if bx <= blocks.x1 {
                    let block = block_pixels(Rect::new(bx, by, bx, by));
                    let draw = block.intersection(&target);
                    let fully = draw == block;
                    let slot = match format.decode_if_uniform(data, row_stride, draw.translate(dx, dy)) {
                        Some(color) => {
                            let slot = self.slot_for(color, fully);
                            if slot != 0 && fully && self.frame.cell(bx, by) != slot {
                                fill = Some((draw, color, slot));
                            }
                            slot
                        }
                        None => {
                            self.cache.pending = None;
                            0
                        }
                    };
                    raw = fill.is_none() && (slot == 0 || self.frame.cell(bx, by) != slot);
                }
                if raw {
                    self.frame.set_cell(bx, by, 0);
                    streak.get_or_insert(bx);
                    continue;
                }
                if let Some(bx0) = streak.take() {
                    let run = block_pixels(Rect::new(bx0, by, bx - 1, by)).intersection(&target);
                    self.out
                        .draw_direct_rect(data, row_stride, run.translate(dx, dy), Point::new(run.x0, run.y0))?;
                }
                if let Some((draw, color, slot)) = fill {
                    self.frame.set_cell(bx, by, 0);
                    self.out.fill_rect(BlendingMode::Source, draw, color)?;
                    self.frame.set_cell(bx, by, slot);
                }
            }
        }
        Ok(())
    }
}
