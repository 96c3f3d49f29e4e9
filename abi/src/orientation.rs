//! Display orientation as a set of axis transforms.

use bitflags::bitflags;

bitflags! {
    /// Transforms a panel applies between logical and raw coordinates.
    ///
    /// `SWAP_XY` exchanges the axes; the flips mirror the logical axes after
    /// the swap. The four rotations are combinations of these bits.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Orientation: u8 {
        const SWAP_XY = 1 << 0;
        const FLIP_X  = 1 << 1;
        const FLIP_Y  = 1 << 2;
    }
}

impl Orientation {
    pub const ROTATION_0: Self = Self::empty();
    pub const ROTATION_90: Self = Self::SWAP_XY.union(Self::FLIP_X);
    pub const ROTATION_180: Self = Self::FLIP_X.union(Self::FLIP_Y);
    pub const ROTATION_270: Self = Self::SWAP_XY.union(Self::FLIP_Y);

    #[inline]
    pub fn is_xy_swapped(self) -> bool {
        self.contains(Self::SWAP_XY)
    }

    /// Logical size of a panel with the given raw size.
    #[inline]
    pub fn effective_size(self, raw_width: i16, raw_height: i16) -> (i16, i16) {
        if self.is_xy_swapped() {
            (raw_height, raw_width)
        } else {
            (raw_width, raw_height)
        }
    }
}
