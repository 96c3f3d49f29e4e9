//! A display device with a background fill cache in front of it.

use alloc::vec::Vec;

use mosaic_abi::{
    BlendingMode, Color, ColorFormat, DisplayDevice, DisplayOutput, DisplayResult, Orientation, Point, Rect,
};
use mosaic_lib::{klog_debug, klog_info};

use crate::config::FillCacheConfig;
use crate::fill_cache::FillCache;
use crate::frame_state::FrameState;

/// Owns a device, the state describing what it shows and the cache that
/// filters writes to it. Drawing calls go through the cache; lifecycle and
/// geometry calls go straight to the device.
pub struct DeviceAdapter<D, S = Vec<u8>> {
    device: D,
    frame: FrameState<S>,
    cache: FillCache,
}

impl<D: DisplayDevice> DeviceAdapter<D> {
    pub fn new(device: D) -> Self {
        Self::with_config(device, FillCacheConfig::default())
    }

    /// Heap-backed state sized for the device's raw dimensions.
    pub fn with_config(device: D, config: FillCacheConfig) -> Self {
        let frame = FrameState::new(device.raw_width(), device.raw_height());
        Self::assemble(device, frame, config)
    }
}

impl<D: DisplayDevice, S: AsRef<[u8]> + AsMut<[u8]>> DeviceAdapter<D, S> {
    /// Use caller-supplied mask storage, which must hold
    /// `FrameState::size_for_dimensions(raw_width, raw_height)` bytes.
    pub fn with_buffer(device: D, config: FillCacheConfig, storage: S) -> DisplayResult<Self> {
        let frame = FrameState::with_buffer(device.raw_width(), device.raw_height(), storage)?;
        Ok(Self::assemble(device, frame, config))
    }

    fn assemble(device: D, mut frame: FrameState<S>, config: FillCacheConfig) -> Self {
        frame.set_swap_xy(device.orientation().is_xy_swapped());
        klog_info!(
            "bgfill: {}x{} device, {} mask bytes, dynamic palette {}",
            device.raw_width(),
            device.raw_height(),
            frame.mask().as_bytes().len(),
            if config.dynamic_palette { "on" } else { "off" }
        );
        Self { device, frame, cache: FillCache::new(config) }
    }

    /// Install a fully pinned palette. With `prefilled`, the device is
    /// declared to hold that color everywhere; otherwise the mask is
    /// invalidated.
    pub fn set_palette(&mut self, colors: &[Color], prefilled: Option<Color>) -> DisplayResult {
        self.set_palette_with_pinned(colors, colors.len(), prefilled)
    }

    /// Install a palette whose first `pinned` colors are permanent.
    pub fn set_palette_with_pinned(
        &mut self,
        colors: &[Color],
        pinned: usize,
        prefilled: Option<Color>,
    ) -> DisplayResult {
        self.flush()?;
        self.frame.set_palette_with_pinned(colors, pinned);
        match prefilled {
            Some(color) => {
                self.frame.set_prefilled(color);
                self.device.set_bg_color_hint(color);
            }
            None => self.frame.invalidate(),
        }
        Ok(())
    }

    pub fn config(&self) -> &FillCacheConfig {
        self.cache.config()
    }

    pub fn set_config(&mut self, config: FillCacheConfig) {
        klog_debug!("bgfill: config {:?}", config);
        self.cache.set_config(config);
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    /// The device itself. Drawing through it bypasses the cache, so call
    /// `invalidate` afterwards.
    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    pub fn frame(&self) -> &FrameState<S> {
        &self.frame
    }

    pub fn frame_mut(&mut self) -> &mut FrameState<S> {
        &mut self.frame
    }

    pub fn cache(&self) -> &FillCache {
        &self.cache
    }

    /// Forget everything known about the device contents.
    pub fn invalidate(&mut self) -> DisplayResult {
        self.flush()?;
        self.frame.invalidate();
        Ok(())
    }

    /// Send any uniform run still held back by the cache.
    pub fn flush(&mut self) -> DisplayResult {
        self.cache.flush(&mut self.frame, &mut self.device)
    }

    /// Split into device and mask storage. Deferred pixels are lost unless
    /// `flush` was called.
    pub fn into_parts(self) -> (D, S) {
        (self.device, self.frame.into_inner())
    }
}

impl<D: DisplayDevice, S: AsRef<[u8]> + AsMut<[u8]>> DisplayOutput for DeviceAdapter<D, S> {
    fn begin(&mut self) -> DisplayResult {
        self.device.begin()
    }

    fn end(&mut self) -> DisplayResult {
        self.cache.bind(&mut self.frame, &mut self.device).end()
    }

    fn set_address(&mut self, window: Rect, mode: BlendingMode) -> DisplayResult {
        self.cache.bind(&mut self.frame, &mut self.device).set_address(window, mode)
    }

    fn write(&mut self, colors: &[Color]) -> DisplayResult {
        self.cache.bind(&mut self.frame, &mut self.device).write(colors)
    }

    fn fill(&mut self, color: Color, count: u32) -> DisplayResult {
        self.cache.bind(&mut self.frame, &mut self.device).fill(color, count)
    }

    fn write_rects(&mut self, mode: BlendingMode, colors: &[Color], rects: &[Rect]) -> DisplayResult {
        self.cache.bind(&mut self.frame, &mut self.device).write_rects(mode, colors, rects)
    }

    fn fill_rects(&mut self, mode: BlendingMode, color: Color, rects: &[Rect]) -> DisplayResult {
        self.cache.bind(&mut self.frame, &mut self.device).fill_rects(mode, color, rects)
    }

    fn write_pixels(&mut self, mode: BlendingMode, colors: &[Color], points: &[Point]) -> DisplayResult {
        self.cache.bind(&mut self.frame, &mut self.device).write_pixels(mode, colors, points)
    }

    fn fill_pixels(&mut self, mode: BlendingMode, color: Color, points: &[Point]) -> DisplayResult {
        self.cache.bind(&mut self.frame, &mut self.device).fill_pixels(mode, color, points)
    }

    fn color_format(&self) -> &'static dyn ColorFormat {
        self.device.color_format()
    }

    fn draw_direct_rect(&mut self, data: &[u8], row_stride: usize, src: Rect, dst: Point) -> DisplayResult {
        self.cache
            .bind(&mut self.frame, &mut self.device)
            .draw_direct_rect(data, row_stride, src, dst)
    }
}

impl<D: DisplayDevice, S: AsRef<[u8]> + AsMut<[u8]>> DisplayDevice for DeviceAdapter<D, S> {
    fn init(&mut self) -> DisplayResult {
        self.device.init()
    }

    fn raw_width(&self) -> i16 {
        self.device.raw_width()
    }

    fn raw_height(&self) -> i16 {
        self.device.raw_height()
    }

    fn orientation(&self) -> Orientation {
        self.device.orientation()
    }

    fn set_orientation(&mut self, orientation: Orientation) -> DisplayResult {
        self.flush()?;
        self.cache.reset_window();
        let before = self.device.orientation();
        let result = self.device.set_orientation(orientation);
        // Checked even on failure: the device may have switched anyway.
        let now = self.device.orientation();
        if now != before {
            self.frame.set_swap_xy(now.is_xy_swapped());
            // Flips move logical blocks too.
            self.frame.invalidate();
            klog_debug!("bgfill: orientation {:#04x} -> {:#04x}", before.bits(), now.bits());
        }
        result
    }

    fn set_bg_color_hint(&mut self, color: Color) {
        self.device.set_bg_color_hint(color);
    }
}
