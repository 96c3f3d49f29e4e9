use mosaic_abi::{BlendingMode, Color, DisplayError, DisplayOutput, Rect};
use mosaic_video::FillCacheConfig;

use crate::define_test_suite;
use crate::fixtures::{
    FailingDisplay, FakeDisplay, Inspect, assert_consistent, blocks_hold, blocks_of, unsound_block, white_adapter,
};

const FULL: Rect = Rect::new(0, 0, 15, 15);
const QUARTER: Rect = Rect::new(0, 0, 7, 7);

fn fill(adapter: &mut impl DisplayOutput, rect: Rect, color: Color) {
    adapter.fill_rect(BlendingMode::Source, rect, color).unwrap();
}

fn redundant_fill_forwards_nothing() {
    let mut a = white_adapter(FakeDisplay::new(16, 16, Color::WHITE), FillCacheConfig::default());
    fill(&mut a, FULL, Color::WHITE);
    assert_eq!(a.device().stats().pixels, 0);
    assert_eq!(a.frame().usage(1), 16);
    assert_consistent(&a);
}

fn second_red_fill_is_recorded() {
    let mut a = white_adapter(FakeDisplay::new(16, 16, Color::WHITE), FillCacheConfig::default());

    fill(&mut a, QUARTER, Color::RED);
    assert_eq!(a.device_mut().take_stats().pixels, 64);
    assert!(blocks_hold(a.frame(), blocks_of(QUARTER), 0));
    assert_eq!(a.frame().slot_of(Color::RED), 0);

    fill(&mut a, QUARTER, Color::RED);
    assert_eq!(a.device_mut().take_stats().pixels, 64);
    let red = a.frame().slot_of(Color::RED);
    assert_eq!(red, 2);
    assert!(blocks_hold(a.frame(), blocks_of(QUARTER), red));
    assert_eq!(a.frame().usage(1), 12);

    fill(&mut a, QUARTER, Color::RED);
    assert_eq!(a.device().stats().pixels, 0);
    assert_consistent(&a);
}

fn partial_overlap_forwards_only_unknown_area() {
    let mut a = white_adapter(FakeDisplay::new(16, 16, Color::WHITE), FillCacheConfig::default());
    fill(&mut a, QUARTER, Color::RED);
    fill(&mut a, QUARTER, Color::RED);
    a.device_mut().take_stats();

    fill(&mut a, Rect::new(2, 2, 9, 9), Color::RED);
    // Cached red blocks are skipped: 2x2 + 2x4 on the right, 8x2 below.
    assert_eq!(a.device().stats().pixels, 4 + 8 + 16);
    let f = a.frame();
    assert_eq!(f.cell(1, 1), 2);
    assert_eq!(f.cell(2, 0), 0);
    assert_eq!(f.cell(2, 1), 0);
    assert!(blocks_hold(f, Rect::new(0, 2, 2, 2), 0));
    assert_eq!(f.cell(3, 0), 1);
    assert_consistent(&a);
}

fn covering_fill_marks_partial_blocks_later() {
    let mut a = white_adapter(FakeDisplay::new(16, 16, Color::WHITE), FillCacheConfig::default());
    a.set_palette_with_pinned(&[Color::WHITE, Color::BLACK], 2, Some(Color::WHITE)).unwrap();
    fill(&mut a, Rect::new(1, 1, 6, 6), Color::BLACK);
    assert!(blocks_hold(a.frame(), Rect::new(0, 0, 1, 1), 0));
    fill(&mut a, QUARTER, Color::BLACK);
    assert!(blocks_hold(a.frame(), Rect::new(0, 0, 1, 1), 2));
    assert_consistent(&a);
}

fn small_rects_never_claim_slots() {
    let mut a = white_adapter(FakeDisplay::new(32, 32, Color::WHITE), FillCacheConfig::default());
    for _ in 0..3 {
        fill(&mut a, Rect::new(0, 0, 31, 6), Color::BLUE);
    }
    assert_eq!(a.frame().slot_of(Color::BLUE), 0);
    assert_eq!(a.frame().palette_size(), 1);
    // Once the color is resident, thin strips update the mask too.
    fill(&mut a, Rect::new(0, 8, 15, 15), Color::BLUE);
    fill(&mut a, Rect::new(0, 8, 15, 15), Color::BLUE);
    let blue = a.frame().slot_of(Color::BLUE);
    assert_ne!(blue, 0);
    fill(&mut a, Rect::new(16, 0, 19, 3), Color::BLUE);
    assert_eq!(a.frame().cell(4, 0), blue);
    assert_consistent(&a);
}

fn uncached_colors_invalidate() {
    let mut a = white_adapter(FakeDisplay::new(16, 16, Color::WHITE), FillCacheConfig::static_palette());
    fill(&mut a, Rect::new(5, 5, 7, 7), Color::GREEN);
    fill(&mut a, Rect::new(5, 5, 7, 7), Color::GREEN);
    assert_eq!(a.frame().cell(1, 1), 0);
    assert_eq!(a.frame().usage(1), 15);
    assert_eq!(a.frame().palette_size(), 1);
    // White over the hole is forwarded once, then known again.
    a.device_mut().take_stats();
    fill(&mut a, FULL, Color::WHITE);
    assert_eq!(a.device_mut().take_stats().pixels, 16);
    assert_eq!(a.frame().usage(1), 16);
    assert_consistent(&a);
}

fn batched_rects_keep_order() {
    let mut a = white_adapter(FakeDisplay::new(16, 16, Color::WHITE), FillCacheConfig::default());
    let rects = [Rect::new(0, 0, 3, 3), Rect::new(2, 2, 5, 5), Rect::new(8, 8, 15, 15)];
    let colors = [Color::RED, Color::GREEN, Color::WHITE];
    a.write_rects(BlendingMode::Source, &colors, &rects).unwrap();
    let dev = a.device();
    assert_eq!(dev.surface().pixel(2, 2), Color::GREEN);
    assert_eq!(dev.surface().pixel(1, 1), Color::RED);
    // The white rect was fully known and skipped.
    assert_eq!(dev.stats().pixels, 32);
    a.fill_rects(BlendingMode::Source, Color::WHITE, &rects).unwrap();
    // Blocks the second rect only touched stay unknown.
    assert_eq!(a.frame().usage(0), 3);
    assert_consistent(&a);
}

fn blended_fills_are_forwarded_and_forgotten() {
    let mut a = white_adapter(FakeDisplay::new(16, 16, Color::WHITE), FillCacheConfig::default());
    let veil = Color::BLACK.with_alpha(0x40);
    a.fill_rect(BlendingMode::SourceOver, QUARTER, veil).unwrap();
    assert_eq!(a.device().stats().pixels, 64);
    assert!(blocks_hold(a.frame(), blocks_of(QUARTER), 0));
    // Opaque colors replace even in SourceOver, so they are cacheable.
    a.fill_rect(BlendingMode::SourceOver, QUARTER, Color::WHITE).unwrap();
    assert!(blocks_hold(a.frame(), blocks_of(QUARTER), 1));
    assert_consistent(&a);
}

fn device_errors_propagate_unchanged() {
    let mut a = white_adapter(FailingDisplay::new(16, 16, Color::WHITE), FillCacheConfig::default());
    a.device_mut().fail_after(0);
    assert_eq!(a.fill_rect(BlendingMode::Source, QUARTER, Color::RED), Err(DisplayError::Bus));
    assert_eq!(a.device().failures(), 1);
    // The mask may forget, never assert.
    assert!(unsound_block(a.frame(), a.device()).is_none());
    a.device_mut().heal();
    fill(&mut a, FULL, Color::WHITE);
    assert_eq!(a.frame().usage(1), 16);
    assert_consistent(&a);
}

fn failed_claim_leaves_slot_unreferenced() {
    let config = FillCacheConfig { confirm_dynamic: false, ..FillCacheConfig::default() };
    let mut a = white_adapter(FailingDisplay::new(16, 16, Color::WHITE), config);
    a.device_mut().fail_after(0);
    assert!(a.fill_rect(BlendingMode::Source, FULL, Color::BLUE).is_err());
    let blue = a.frame().slot_of(Color::BLUE);
    assert_eq!(a.frame().usage(blue), 0);
    a.device_mut().heal();
    // A different color takes the unreferenced slot over.
    fill(&mut a, FULL, Color::GREEN);
    assert_eq!(a.frame().slot_of(Color::GREEN), blue);
    assert_eq!(a.frame().slot_of(Color::BLUE), 0);
    assert_consistent(&a);
}

define_test_suite!(rects, [
    redundant_fill_forwards_nothing,
    second_red_fill_is_recorded,
    partial_overlap_forwards_only_unknown_area,
    covering_fill_marks_partial_blocks_later,
    small_rects_never_claim_slots,
    uncached_colors_invalidate,
    batched_rects_keep_order,
    blended_fills_are_forwarded_and_forgotten,
    device_errors_propagate_unchanged,
    failed_claim_leaves_slot_unreferenced,
]);
