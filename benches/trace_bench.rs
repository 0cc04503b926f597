#![deny(warnings)]

use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use std::{hint::black_box, time::Duration};
use vectrace::*;

const SIZE: usize = 128;

/// Concentric rings over a gradient background, gives a handful of colors with holes
fn source_image() -> PixelBuffer {
    let center = (SIZE as Scalar - 1.0) / 2.0;
    ImageOwned::new_with(SIZE, SIZE, |row, col| {
        let (x, y) = (col as Scalar - center, row as Scalar - center);
        let ring = ((x * x + y * y).sqrt() / 12.0) as usize;
        match ring {
            0 | 2 => RGBA::new(220, 40, 40, 255),
            1 | 3 => RGBA::new(40, 40, 220, 255),
            _ => RGBA::new((row * 2) as u8, 160, (col * 2) as u8, 255),
        }
    })
}

fn trace_benchmark(c: &mut Criterion) {
    let image = source_image();
    let config = TracerConfig::default();
    let quantized = quantize(&image, config.color_count).expect("failed to quantize");
    let regions = trace_regions(&quantized.index_map, 0).expect("failed to trace");

    let mut group = c.benchmark_group("trace");
    group.throughput(Throughput::Elements((SIZE * SIZE) as u64));
    group
        .bench_function("quantize", |b| {
            b.iter(|| quantize(black_box(&image), config.color_count))
        })
        .bench_function("contour", |b| {
            b.iter(|| trace_regions(black_box(&quantized.index_map), 0))
        })
        .bench_function("simplify", |b| {
            b.iter(|| {
                regions
                    .iter()
                    .filter_map(|region| simplify(&region.outer, config.tolerance, config.min_area))
                    .count()
            })
        })
        .bench_function("pipeline", |b| {
            b.iter_with_large_drop(|| trace_image(black_box(&image), &config))
        });
    group.finish();
}

fn codec_benchmark(c: &mut Criterion) {
    let doc = trace_image(&source_image(), &TracerConfig::default()).expect("failed to trace");
    let drawable = export_vector_drawable(&doc);
    let svg = export_svg(&doc);

    let mut group = c.benchmark_group("codec");
    group
        .bench_function("export vector-drawable", |b| {
            b.iter(|| export_vector_drawable(black_box(&doc)))
        })
        .bench_function("parse vector-drawable", |b| {
            b.iter(|| parse_vector_drawable(black_box(&drawable)))
        })
        .bench_function("export svg", |b| b.iter(|| export_svg(black_box(&doc))))
        .bench_function("parse svg", |b| b.iter(|| parse_svg(black_box(&svg))));
    group.finish();
}

fn render_benchmark(c: &mut Criterion) {
    let doc = trace_image(&source_image(), &TracerConfig::default()).expect("failed to trace");
    let mut group = c.benchmark_group("render");
    for scale in [1.0, 4.0] {
        let options = RenderOptions {
            scale,
            ..RenderOptions::default()
        };
        group.bench_function(format!("scale {}", scale), |b| {
            b.iter_with_large_drop(|| render(black_box(&doc), &options))
        });
    }
    group.finish();
}

criterion_group!(
    name = benches;
    config = Criterion::default().warm_up_time(Duration::new(2, 0));
    targets = trace_benchmark, codec_benchmark, render_benchmark
);
criterion_main!(benches);
