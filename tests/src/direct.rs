use alloc::vec;
use alloc::vec::Vec;

use mosaic_abi::{BlendingMode, Color, DisplayOutput, Point, Rect, encode_argb8888};
use mosaic_video::{FillCacheConfig, Offscreen};

use crate::define_test_suite;
use crate::fixtures::{FakeDisplay, assert_consistent, assert_same_pixels, white_adapter};

/// ARGB8888 image of `w` x `h` pixels colored by `f(x, y)`.
fn encode(w: usize, h: usize, f: impl Fn(usize, usize) -> Color) -> Vec<u8> {
    let colors: Vec<Color> = (0..w * h).map(|i| f(i % w, i / w)).collect();
    let mut bytes = vec![0u8; w * h * 4];
    encode_argb8888(&colors, &mut bytes);
    bytes
}

fn known_background_is_not_copied() {
    let mut a = white_adapter(FakeDisplay::new(16, 16, Color::WHITE), FillCacheConfig::default());
    let img = encode(16, 16, |_, _| Color::WHITE);
    a.draw_direct_rect(&img, 64, Rect::new(0, 0, 15, 15), Point::new(0, 0)).unwrap();
    assert_eq!(a.device().stats().pixels, 0);
}

fn mixed_image_copies_only_changed_blocks() {
    let mut a = white_adapter(FakeDisplay::new(16, 16, Color::WHITE), FillCacheConfig::default());
    let mut reference = Offscreen::with_color(16, 16, Color::WHITE);
    // White with a red 8x4 bar and a diagonal line.
    let img = encode(16, 16, |x, y| match (x, y) {
        (8..=15, 4..=7) => Color::RED,
        _ if x == y && y >= 8 => Color::BLACK,
        _ => Color::WHITE,
    });
    for out in [&mut a as &mut dyn DisplayOutput, &mut reference as &mut dyn DisplayOutput] {
        out.draw_direct_rect(&img, 64, Rect::new(0, 0, 15, 15), Point::new(0, 0)).unwrap();
    }
    assert_same_pixels(a.device(), &reference);
    let stats = a.device_mut().take_stats();
    // Red bar: two blocks, the first pends and the second claims a slot.
    // Diagonal: blocks (2, 2) and (3, 3) are copied.
    assert_eq!(stats.pixels, 32 + 32);
    let red = a.frame().slot_of(Color::RED);
    assert_eq!(red, 2);
    assert_eq!(a.frame().cell(3, 1), red);
    assert_eq!(a.frame().cell(2, 2), 0);
    assert_consistent(&a);

    a.draw_direct_rect(&img, 64, Rect::new(0, 0, 15, 15), Point::new(0, 0)).unwrap();
    assert_eq!(a.frame().cell(2, 1), red);
    assert_consistent(&a);
}

fn offset_copy_respects_partial_blocks() {
    let mut a = white_adapter(FakeDisplay::new(16, 16, Color::WHITE), FillCacheConfig::default());
    let mut reference = Offscreen::with_color(16, 16, Color::WHITE);
    a.set_palette_with_pinned(&[Color::WHITE, Color::GREEN], 2, Some(Color::WHITE)).unwrap();
    let img = encode(10, 10, |_, _| Color::GREEN);
    // Lands on (3, 5)..=(10, 12): only block (1, 2) is covered.
    for out in [&mut a as &mut dyn DisplayOutput, &mut reference as &mut dyn DisplayOutput] {
        out.draw_direct_rect(&img, 40, Rect::new(1, 1, 8, 8), Point::new(3, 5)).unwrap();
    }
    assert_same_pixels(a.device(), &reference);
    assert_eq!(a.frame().cell(1, 2), 2);
    assert_eq!(a.frame().cell(2, 2), 0);
    assert_eq!(a.frame().cell(0, 1), 0);
    assert_eq!(a.frame().cell(1, 1), 0);
    assert_eq!(a.frame().cell(1, 3), 0);
    assert_eq!(a.frame().cell(3, 0), 1);
    assert_consistent(&a);
}

fn pixel_writes_skip_known_blocks() {
    let mut a = white_adapter(FakeDisplay::new(16, 16, Color::WHITE), FillCacheConfig::default());
    let points = [Point::new(0, 0), Point::new(5, 5), Point::new(15, 15)];
    a.fill_pixels(BlendingMode::Source, Color::WHITE, &points).unwrap();
    assert_eq!(a.device_mut().take_stats().pixels, 0);

    a.write_pixels(BlendingMode::Source, &[Color::WHITE, Color::RED, Color::WHITE], &points)
        .unwrap();
    assert_eq!(a.device_mut().take_stats().pixels, 1);
    assert_eq!(a.frame().cell(1, 1), 0);
    assert_eq!(a.frame().usage(0), 1);

    // The block is unknown now, so white goes through.
    a.fill_pixels(BlendingMode::Source, Color::WHITE, &points[1..2]).unwrap();
    assert_eq!(a.device().stats().pixels, 1);
    assert_consistent(&a);
}

define_test_suite!(direct, [
    known_background_is_not_copied,
    mixed_image_copies_only_changed_blocks,
    offset_copy_respects_partial_blocks,
    pixel_writes_skip_known_blocks,
]);
