//! Tunables of the fill cache's dynamic palette.

use mosaic_lib::cmdline::{self, parse_dimension, parse_on_off};
use mosaic_lib::klog::{KlogLevel, klog_set_level};
use mosaic_lib::klog_debug;

pub const DYNAMIC_PALETTE_DEFAULT: bool = true;
pub const DYNAMIC_MIN_WIDTH_DEFAULT: i16 = 8;
pub const DYNAMIC_MIN_HEIGHT_DEFAULT: i16 = 8;
pub const CONFIRM_DYNAMIC_DEFAULT: bool = true;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FillCacheConfig {
    /// Whether colors outside the configured palette may be added at runtime.
    pub dynamic_palette: bool,
    /// Smallest rectangle width that may introduce a new dynamic color.
    pub dynamic_min_width: i16,
    /// Smallest rectangle height that may introduce a new dynamic color.
    pub dynamic_min_height: i16,
    /// Require two consecutive qualifying uses before adding a color.
    pub confirm_dynamic: bool,
}

impl Default for FillCacheConfig {
    fn default() -> Self {
        Self {
            dynamic_palette: DYNAMIC_PALETTE_DEFAULT,
            dynamic_min_width: DYNAMIC_MIN_WIDTH_DEFAULT,
            dynamic_min_height: DYNAMIC_MIN_HEIGHT_DEFAULT,
            confirm_dynamic: CONFIRM_DYNAMIC_DEFAULT,
        }
    }
}

impl FillCacheConfig {
    /// Only the palette given by the caller is ever cached.
    pub const fn static_palette() -> Self {
        Self {
            dynamic_palette: false,
            dynamic_min_width: DYNAMIC_MIN_WIDTH_DEFAULT,
            dynamic_min_height: DYNAMIC_MIN_HEIGHT_DEFAULT,
            confirm_dynamic: CONFIRM_DYNAMIC_DEFAULT,
        }
    }

    /// Defaults overridden by `bgfill.*` tokens of a command line.
    pub fn from_cmdline(cmdline: &str) -> Self {
        let mut config = Self::default();
        config.apply_cmdline(cmdline);
        config
    }

    /// Apply `bgfill.*` tokens on top of the current values.
    ///
    /// Recognized: `bgfill.dynamic=`, `bgfill.min_w=`, `bgfill.min_h=`,
    /// `bgfill.confirm=` and `bgfill.log=<level>`, which sets the global
    /// log level. Anything else is ignored.
    pub fn apply_cmdline(&mut self, cmdline: &str) {
        for (key, value) in cmdline::tokens(cmdline) {
            let Some(key) = key.strip_prefix("bgfill.") else {
                continue;
            };
            match key {
                "dynamic" => self.dynamic_palette = parse_on_off(value, self.dynamic_palette),
                "min_w" => self.dynamic_min_width = parse_dimension(value, self.dynamic_min_width),
                "min_h" => self.dynamic_min_height = parse_dimension(value, self.dynamic_min_height),
                "confirm" => self.confirm_dynamic = parse_on_off(value, self.confirm_dynamic),
                "log" => {
                    if let Some(level) = KlogLevel::parse(value) {
                        klog_set_level(level);
                    }
                }
                _ => klog_debug!("bgfill: ignoring unknown option '{}'", key),
            }
        }
    }

    /// Whether a `w` x `h` rectangle is large enough to earn a new slot.
    #[inline]
    pub fn admits_size(&self, w: i16, h: i16) -> bool {
        w >= self.dynamic_min_width && h >= self.dynamic_min_height
    }
}
