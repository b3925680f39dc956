//! Export Pipeline Benchmarks
//!
//! Strip compositing, loop animation encoding and frame sampling math.
//!
//! Run with: `cargo bench --bench export_ops`

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use image::{Rgba, RgbaImage};
use shutterbox::export::{
    clamp_seek_time, encode_loop, frame_count, render_strip, LoopAnimationConfig, SlotLayout,
    StripOrientation,
};
use shutterbox::session::SLOT_COUNT;
use std::sync::Arc;

fn stills(width: u32, height: u32) -> [Option<Arc<RgbaImage>>; SLOT_COUNT] {
    std::array::from_fn(|i| {
        Some(Arc::new(RgbaImage::from_fn(width, height, |x, y| {
            Rgba([(x % 256) as u8, (y % 256) as u8, (i * 40) as u8, 255])
        })))
    })
}

fn bench_render_strip(c: &mut Criterion) {
    let mut group = c.benchmark_group("render_strip");
    group.sample_size(10);

    for scale in [0.25, 0.5] {
        let layout = SlotLayout::grid_strip(StripOrientation::Columns2Rows3).scaled(scale);
        let inputs = stills(320, 240);
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}x{}", layout.width, layout.height)),
            &layout,
            |bench, layout| {
                bench.iter(|| {
                    let strip = render_strip(black_box(&inputs), layout, None).unwrap();
                    black_box(strip);
                });
            },
        );
    }

    group.finish();
}

fn bench_encode_loop(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_loop");
    group.sample_size(10);

    let frames: Vec<Arc<RgbaImage>> = stills(160, 120).into_iter().flatten().collect();
    for quality in [10u8, 80] {
        let config = LoopAnimationConfig::default()
            .with_size(320, 240)
            .with_quality(quality);
        group.bench_with_input(
            BenchmarkId::from_parameter(quality),
            &config,
            |bench, config| {
                bench.iter(|| {
                    let gif = encode_loop(black_box(&frames), None, config).unwrap();
                    black_box(gif);
                });
            },
        );
    }

    group.finish();
}

fn bench_sampling_math(c: &mut Criterion) {
    c.bench_function("frame_times_3s_30fps", |bench| {
        bench.iter(|| {
            let frames = frame_count(black_box(3.0), 30);
            let mut total = 0.0;
            for frame in 0..frames {
                total += clamp_seek_time(frame as f64 / 30.0, black_box(2.4), 0.1);
            }
            black_box(total);
        });
    });
}

criterion_group!(
    benches,
    bench_render_strip,
    bench_encode_loop,
    bench_sampling_math
);
criterion_main!(benches);
