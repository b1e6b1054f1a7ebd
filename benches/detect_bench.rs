//! Detection benchmarks on a synthetic page raster.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use image::{GrayImage, Luma};
use tanzif_pdf::{BoundsOptions, ContentBoundsDetector, MarginReconciler, MarginTextOptions, NullRecognizer};

/// 1000x1400 page with a centered block of line texture.
fn synthetic_page() -> GrayImage {
    let mut img = GrayImage::from_pixel(1000, 1400, Luma([255]));
    let mut y = 200;
    while y + 6 <= 1200 {
        for ly in y..y + 6 {
            for x in 100..900 {
                img.put_pixel(x, ly, Luma([30]));
            }
        }
        y += 14;
    }
    img
}

fn bench_content_bounds(c: &mut Criterion) {
    let page = synthetic_page();
    let options = BoundsOptions::default();
    c.bench_function("content_bounds_detect", |b| {
        b.iter(|| ContentBoundsDetector::detect(black_box(&page), &options))
    });
}

fn bench_reconcile(c: &mut Criterion) {
    let page = synthetic_page();
    let recognizer = NullRecognizer;
    let reconciler = MarginReconciler::new(
        BoundsOptions::default(),
        MarginTextOptions::default(),
        &recognizer,
    );
    c.bench_function("margin_reconcile", |b| {
        b.iter(|| reconciler.reconcile(black_box(&page)))
    });
}

criterion_group!(benches, bench_content_bounds, bench_reconcile);
criterion_main!(benches);
