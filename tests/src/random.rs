//! Random operation sequences, checked against a device drawn without the
//! cache.

use alloc::vec;
use alloc::vec::Vec;

use mosaic_abi::{BlendingMode, Color, DisplayDevice, DisplayOutput, Orientation, Point, Rect, encode_argb8888};
use mosaic_video::{BLOCK, DeviceAdapter, FillCacheConfig, Offscreen};

use crate::define_test_suite;
use crate::fixtures::{FailingDisplay, FakeDisplay, assert_consistent, assert_same_pixels, unsound_block};
use crate::rng::XorShift;

const COLORS: [Color; 6] = [Color::WHITE, Color::BLACK, Color::RED, Color::GREEN, Color::BLUE, Color::GRAY];

const ORIENTATIONS: [Orientation; 4] =
    [Orientation::ROTATION_0, Orientation::ROTATION_90, Orientation::ROTATION_180, Orientation::ROTATION_270];

/// Mostly from a small set, so that colors repeat and earn slots.
fn color(rng: &mut XorShift) -> Color {
    if rng.chance(85) { rng.pick(&COLORS) } else { rng.opaque_color() }
}

fn mode_and_color(rng: &mut XorShift) -> (BlendingMode, Color) {
    if rng.chance(10) {
        (BlendingMode::SourceOver, color(rng).with_alpha(0x60))
    } else {
        (BlendingMode::Source, color(rng))
    }
}

/// Stream content for a window: uniform runs with the odd stray pixel.
fn stream_colors(rng: &mut XorShift, len: usize) -> Vec<Color> {
    let mut out = Vec::with_capacity(len);
    while out.len() < len {
        let run = (rng.below(24) as usize + 1).min(len - out.len());
        let c = color(rng);
        out.extend(core::iter::repeat_n(c, run));
        if rng.chance(15) && out.len() < len {
            out.push(rng.opaque_color());
        }
    }
    out
}

/// Image made of solid squares with a few stray pixels.
fn image(rng: &mut XorShift, w: usize, h: usize) -> Vec<u8> {
    let cell = [2usize, 4, 8][rng.below(3) as usize];
    let tiles: Vec<Color> = (0..(w / cell + 1) * (h / cell + 1)).map(|_| color(rng)).collect();
    let mut colors: Vec<Color> = (0..w * h)
        .map(|i| tiles[(i / w / cell) * (w / cell + 1) + (i % w) / cell])
        .collect();
    for _ in 0..rng.below(3) {
        let i = rng.below((w * h) as u32) as usize;
        colors[i] = rng.opaque_color();
    }
    let mut bytes = vec![0u8; w * h * 4];
    encode_argb8888(&colors, &mut bytes);
    bytes
}

/// Apply one random drawing operation to every output in `outs`.
fn random_op(rng: &mut XorShift, bounds: Rect, outs: &mut [&mut dyn DisplayOutput]) -> Vec<bool> {
    let mut results = Vec::with_capacity(outs.len());
    match rng.below(7) {
        0 => {
            let rect = if rng.chance(50) { rng.aligned_rect_in(bounds, BLOCK) } else { rng.rect_in(bounds) };
            let (mode, c) = mode_and_color(rng);
            for out in outs.iter_mut() {
                results.push(out.fill_rect(mode, rect, c).is_ok());
            }
        }
        1 => {
            let rects: Vec<Rect> = (0..rng.below(4) + 1).map(|_| rng.rect_in(bounds)).collect();
            let colors: Vec<Color> = rects.iter().map(|_| color(rng)).collect();
            for out in outs.iter_mut() {
                results.push(out.write_rects(BlendingMode::Source, &colors, &rects).is_ok());
            }
        }
        2 | 3 => {
            let window = if rng.chance(50) { rng.aligned_rect_in(bounds, BLOCK) } else { rng.rect_in(bounds) };
            let (mode, _) = mode_and_color(rng);
            let len = window.area() as usize + rng.below(window.area() / 2 + 1) as usize;
            let px = stream_colors(rng, len);
            let split = rng.below(len as u32 + 1) as usize;
            for out in outs.iter_mut() {
                let ok = out.set_address(window, mode).is_ok()
                    && out.write(&px[..split]).is_ok()
                    && out.write(&px[split..]).is_ok()
                    && out.end().is_ok();
                results.push(ok);
            }
        }
        4 => {
            let window = rng.rect_in(bounds);
            let c = color(rng);
            let n = rng.below(window.area() * 2) + 1;
            for out in outs.iter_mut() {
                let ok = out.set_address(window, BlendingMode::Source).is_ok()
                    && out.fill(c, n).is_ok()
                    && out.end().is_ok();
                results.push(ok);
            }
        }
        5 => {
            let points: Vec<Point> = (0..rng.below(40) + 1)
                .map(|_| Point::new(rng.range(bounds.x0, bounds.x1), rng.range(bounds.y0, bounds.y1)))
                .collect();
            let colors: Vec<Color> = points.iter().map(|_| color(rng)).collect();
            let c = color(rng);
            for out in outs.iter_mut() {
                let ok = out.write_pixels(BlendingMode::Source, &colors, &points).is_ok()
                    && out.fill_pixels(BlendingMode::Source, c, &points[..points.len() / 2]).is_ok();
                results.push(ok);
            }
        }
        _ => {
            let (w, h) = (24usize, 20usize);
            let img = image(rng, w, h);
            let dst_area = rng.rect_in(bounds);
            let src = Rect::from_size(
                rng.range(0, 8),
                rng.range(0, 8),
                dst_area.width().min(16),
                dst_area.height().min(12),
            );
            let dst = Point::new(dst_area.x0, dst_area.y0);
            for out in outs.iter_mut() {
                results.push(out.draw_direct_rect(&img, w * 4, src, dst).is_ok());
            }
        }
    }
    results
}

fn run_differential(seed: u32, steps: usize, config: FillCacheConfig) {
    let mut rng = XorShift::new(seed);
    let mut a = DeviceAdapter::with_config(FakeDisplay::new(40, 28, Color::WHITE), config);
    a.set_palette_with_pinned(&[Color::WHITE, Color::BLACK], 1, Some(Color::WHITE)).unwrap();
    let mut reference = Offscreen::with_color(40, 28, Color::WHITE);

    for step in 0..steps {
        if rng.chance(3) {
            let o = rng.pick(&ORIENTATIONS);
            a.set_orientation(o).unwrap();
            reference.set_orientation(o).unwrap();
        }
        let bounds = a.extents();
        let results = random_op(
            &mut rng,
            bounds,
            &mut [&mut a as &mut dyn DisplayOutput, &mut reference as &mut dyn DisplayOutput],
        );
        assert!(results.iter().all(|&ok| ok), "seed {seed} step {step}: unexpected error");
        if let Some(block) = unsound_block(a.frame(), a.device()) {
            panic!("seed {seed} step {step}: block {block:?} is wrong");
        }
    }
    a.end().unwrap();
    assert_same_pixels(a.device(), &reference);
    assert_consistent(&a);
}

fn matches_uncached_device() {
    for seed in [1, 7, 42, 1234, 0xBEEF] {
        run_differential(seed, 300, FillCacheConfig::default());
    }
}

fn matches_uncached_device_eagerly() {
    let config = FillCacheConfig {
        confirm_dynamic: false,
        dynamic_min_width: 4,
        dynamic_min_height: 4,
        ..FillCacheConfig::default()
    };
    for seed in [3, 99, 2024] {
        run_differential(seed, 300, config);
    }
}

fn matches_uncached_device_with_static_palette() {
    run_differential(5, 300, FillCacheConfig::static_palette());
}

fn stays_sound_across_device_failures() {
    let mut rng = XorShift::new(77);
    let mut a = DeviceAdapter::new(FailingDisplay::new(32, 24, Color::WHITE));
    a.set_palette_with_pinned(&[Color::WHITE], 1, Some(Color::WHITE)).unwrap();
    for step in 0..400 {
        if rng.chance(30) {
            let budget = rng.below(4);
            a.device_mut().fail_after(budget);
        } else {
            a.device_mut().heal();
        }
        let bounds = a.extents();
        let _ = random_op(&mut rng, bounds, &mut [&mut a as &mut dyn DisplayOutput]);
        if let Some(block) = unsound_block(a.frame(), a.device()) {
            panic!("step {step}: block {block:?} is wrong after a failure");
        }
        assert!(a.frame().check_usage());
    }
    assert!(a.device().failures() > 0);
    a.device_mut().heal();
    a.end().unwrap();
    assert_consistent(&a);
}

define_test_suite!(random, [
    matches_uncached_device,
    matches_uncached_device_eagerly,
    matches_uncached_device_with_static_palette,
    stays_sound_across_device_failures,
]);
