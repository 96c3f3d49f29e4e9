//! How a write combines with what the device already shows.

use crate::color::Color;

#[repr(u8)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum BlendingMode {
    /// Destination is replaced by the source color.
    #[default]
    Source = 0,
    /// Source alpha-composited over the destination.
    SourceOver = 1,
    /// Destination is kept; source is composited underneath.
    DestinationOver = 2,
    /// Source color is ORed into the destination.
    SourcePlus = 3,
}

impl BlendingMode {
    /// Whether writing `color` in this mode leaves exactly `color` behind,
    /// independent of previous device content.
    #[inline]
    pub fn replaces(self, color: Color) -> bool {
        match self {
            BlendingMode::Source => true,
            BlendingMode::SourceOver => color.is_opaque(),
            BlendingMode::DestinationOver | BlendingMode::SourcePlus => false,
        }
    }

    /// Numeric mode from a raw value; unknown values fall back to `Source`.
    #[inline]
    pub fn from_u8(v: u8) -> Self {
        match v {
            1 => BlendingMode::SourceOver,
            2 => BlendingMode::DestinationOver,
            3 => BlendingMode::SourcePlus,
            _ => BlendingMode::Source,
        }
    }
}
