//! A klog sink that counts records per level.

use core::fmt;

use mosaic_lib::klog::{KlogLevel, klog_attach_sink};
use spin::Mutex;

static COUNTS: Mutex<[u32; 5]> = Mutex::new([0; 5]);

fn count_record(level: KlogLevel, _args: fmt::Arguments<'_>) {
    COUNTS.lock()[level as usize] += 1;
}

/// Route klog output into the counters.
pub fn attach() {
    klog_attach_sink(count_record);
}

/// Records seen at `level` since `attach`.
pub fn count(level: KlogLevel) -> u32 {
    COUNTS.lock()[level as usize]
}
