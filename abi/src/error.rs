//! Error types reported by display sinks.
//!
//! The drawing layers above a device never inspect these beyond propagating
//! them; a filter that wraps a sink returns the sink's error unchanged.

/// Implement numeric code conversions for display error enums.
///
/// Generates `as_code()`, `from_code()` and `is_transient()` for `#[repr(i32)]`
/// error enums. Codes are negative so they can share a channel with byte
/// counts in driver status registers.
macro_rules! impl_display_error {
    ($ty:ty, fallback: $fallback:ident, transient: [$($transient:ident),*], variants: { $($val:literal => $variant:ident),* $(,)? }) => {
        impl $ty {
            /// Convert to the numeric status code.
            #[inline]
            pub fn as_code(self) -> i32 {
                self as i32
            }

            /// Convert from a numeric status code.
            #[inline]
            pub fn from_code(val: i32) -> Self {
                match val {
                    $($val => Self::$variant,)*
                    _ => Self::$fallback,
                }
            }

            /// Whether repeating the same operation later may succeed.
            #[inline]
            pub fn is_transient(self) -> bool {
                matches!(self, $(Self::$transient)|*)
            }
        }
    };
}

/// Result type for drawing operations.
pub type DisplayResult<T = ()> = Result<T, DisplayError>;

/// Errors returned by display sinks.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayError {
    /// The transport (SPI, parallel bus) reported a failure
    Bus = -1,
    /// The device did not acknowledge within its deadline
    Timeout = -2,
    /// Coordinates fall outside the addressable surface
    OutOfBounds = -3,
    /// Malformed request (empty window, mismatched slice lengths)
    Invalid = -4,
    /// The sink cannot perform the requested operation
    Unsupported = -5,
}

impl_display_error!(DisplayError, fallback: Invalid, transient: [Bus, Timeout], variants: {
    -1 => Bus,
    -2 => Timeout,
    -3 => OutOfBounds,
    -4 => Invalid,
    -5 => Unsupported,
});

impl core::fmt::Display for DisplayError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let text = match self {
            DisplayError::Bus => "bus error",
            DisplayError::Timeout => "device timeout",
            DisplayError::OutOfBounds => "coordinates out of bounds",
            DisplayError::Invalid => "invalid request",
            DisplayError::Unsupported => "unsupported operation",
        };
        f.write_str(text)
    }
}
