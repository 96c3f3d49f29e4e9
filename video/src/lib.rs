#![no_std]
#![forbid(unsafe_code)]

//! Background fill cache for addressed displays.
//!
//! A [`FrameState`] records, per 4x4 block, which palette color a block is
//! known to be filled with. A [`FillCache`] sits in front of a
//! [`DisplayOutput`](mosaic_abi::DisplayOutput) and drops writes that would
//! not change any pixel. [`DeviceAdapter`] bundles both with a device.

extern crate alloc;

pub mod adapter;
pub mod buffered;
pub mod config;
pub mod eg;
pub mod fill_cache;
pub mod frame_state;
pub mod nibble;
pub mod offscreen;

pub use adapter::DeviceAdapter;
pub use config::FillCacheConfig;
pub use eg::EgDisplay;
pub use fill_cache::{CachedOutput, FillCache, ScanState};
pub use frame_state::{BLOCK, FrameState, MAX_PALETTE};
pub use nibble::NibbleMask;
pub use offscreen::Offscreen;
