//! Ambient support code shared by the mosaic crates: logging, init flags,
//! grid alignment and command-line parsing.

#![no_std]
#![forbid(unsafe_code)]

pub mod alignment;
pub mod cmdline;
pub mod init_flag;
pub mod klog;

pub use init_flag::InitFlag;
pub use klog::{KlogLevel, klog_attach_sink, klog_detach_sink, klog_get_level, klog_set_level};
