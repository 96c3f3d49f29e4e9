//! Shared value types and the display sink contract.
//!
//! Drivers, filters and drawing code all speak the traits in [`output`];
//! nothing in this crate allocates or touches hardware.

#![no_std]
#![forbid(unsafe_code)]

pub mod blending;
pub mod color;
pub mod error;
pub mod geometry;
pub mod orientation;
pub mod output;
pub mod pixel_format;

pub use blending::*;
pub use color::*;
pub use error::*;
pub use geometry::*;
pub use orientation::*;
pub use output::*;
pub use pixel_format::*;
