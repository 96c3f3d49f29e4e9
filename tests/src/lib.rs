#![no_std]

//! Integration tests for the background fill cache.
//!
//! The fixtures wrap [`Offscreen`](mosaic_video::Offscreen) so that every
//! test can compare what the cache forwarded with what a device written
//! without the cache would show.

extern crate alloc;

pub mod log_capture;
pub mod rng;

#[doc(hidden)]
pub use paste;

/// Define a named group of integration tests.
///
/// Each listed function becomes a `#[test]` named `<suite>_<function>`.
///
/// ```ignore
/// define_test_suite!(palette, [
///     test_second_fill_claims_slot,
///     test_full_palette_degrades,
/// ]);
/// ```
#[macro_export]
macro_rules! define_test_suite {
    ($suite_name:ident, [$($test_fn:ident),* $(,)?]) => {
        $crate::paste::paste! {
            $(
                #[test]
                fn [<$suite_name _ $test_fn>]() {
                    $test_fn();
                }
            )*
        }
    };
}

#[cfg(test)]
mod direct;
#[cfg(test)]
mod random;
#[cfg(test)]
mod rects;
