use criterion::{black_box, criterion_group, criterion_main, Criterion};
use hud_core::orientation::{EstimatorConfig, OrientationEstimator};
use hud_core::renderer::{RadarRenderer, SpeedThreshold};
use hud_core::types::{InertialSample, Track};
use hud_core::DisplayConfig;

fn make_tracks(n: usize) -> Vec<Track> {
    (0..n)
        .map(|i| {
            let bearing = -36.0 + 72.0 * i as f64 / n.max(1) as f64;
            let range = 500.0 + (i * 397 % 5500) as f64;
            Track::new(range, bearing).with_speed((i % 4) as f64 * 400.0)
        })
        .collect()
}

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render");

    for size in [100u32, 400] {
        let renderer = RadarRenderer::new(DisplayConfig {
            canvas_size_px: size,
            ..Default::default()
        })
        .unwrap();
        for n in [0, 10, 100] {
            let tracks = make_tracks(n);
            group.bench_function(format!("{size}px_{n}_tracks"), |b| {
                b.iter(|| black_box(renderer.render(&tracks, &SpeedThreshold::default())));
            });
        }
    }

    group.finish();
}

fn bench_estimator(c: &mut Criterion) {
    let mut group = c.benchmark_group("estimator");
    // one 30 Hz frame worth of 500 Hz samples
    let samples: Vec<InertialSample> = (0..17)
        .map(|i| {
            InertialSample::raw(i as f64 * 0.002, 0.002, [0.0, 0.3, 9.8], Some([0.01, 0.0, 0.2]))
        })
        .collect();

    group.bench_function("fusion_17_samples", |b| {
        let mut est = OrientationEstimator::new(EstimatorConfig::default()).unwrap();
        b.iter(|| black_box(est.integrate_all(&samples)));
    });

    group.finish();
}

criterion_group!(benches, bench_render, bench_estimator);
criterion_main!(benches);
