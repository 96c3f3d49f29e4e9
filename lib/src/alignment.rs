//! Integer rounding helpers for block grids.
//!
//! All functions take a positive `step`; a zero step returns the input
//! unchanged, the same as the other alignment helpers in this crate.

/// Round `value` down to a multiple of `step`. Negative values round toward
/// negative infinity.
#[inline(always)]
pub const fn align_down(value: i16, step: i16) -> i16 {
    if step == 0 {
        return value;
    }
    value.div_euclid(step) * step
}

/// Round `value` up to a multiple of `step`.
#[inline(always)]
pub const fn align_up(value: i16, step: i16) -> i16 {
    if step == 0 {
        return value;
    }
    align_down(value.saturating_add(step - 1), step)
}

/// `ceil(value / step)` for non-negative `value`.
#[inline(always)]
pub const fn div_ceil(value: i16, step: i16) -> i16 {
    if step == 0 {
        return value;
    }
    (value + step - 1) / step
}

#[inline(always)]
pub const fn round_up_even(value: i16) -> i16 {
    (value + 1) & !1
}

#[inline(always)]
pub const fn is_aligned(value: i16, step: i16) -> bool {
    step == 0 || value.rem_euclid(step) == 0
}
