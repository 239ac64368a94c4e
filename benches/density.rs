use chrono::{Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use era5_explorer::{
    estimate_1d, estimate_2d, AxisVariable, FrameSelector, GriddedField, Kde2dConfig,
    VariableRegistry, YBins,
};
use ndarray::{Array1, Array3};

fn synthetic_field() -> GriddedField {
    let (n_time, n_lat, n_lon) = (48, 81, 161);
    let start = Utc.with_ymd_and_hms(2025, 7, 1, 0, 0, 0).unwrap();
    let times = (0..n_time).map(|t| start + Duration::hours(t as i64)).collect();
    let latitude: Array1<f64> = (0..n_lat).map(|i| 40.0 - i as f64 * 0.25).collect();
    let longitude: Array1<f64> = (0..n_lon).map(|j| -20.0 + j as f64 * 0.25).collect();
    let t2m = Array3::from_shape_fn((n_time, n_lat, n_lon), |(t, i, j)| {
        290.0 + 8.0 * ((t % 24) as f64 / 24.0 * std::f64::consts::TAU).sin() + i as f64 * 0.1
            - j as f64 * 0.02
    });
    GriddedField::new(times, latitude, longitude)
        .with_variable("t2m", t2m)
        .unwrap()
}

fn bench_estimators(c: &mut Criterion) {
    let field = synthetic_field();
    let registry = VariableRegistry::era5();
    let config = Kde2dConfig::default();

    c.bench_function("estimate_1d", |b| {
        b.iter(|| {
            estimate_1d(
                black_box(&field),
                &registry,
                "t2m",
                &FrameSelector::All,
                100,
                1.0,
            )
        })
    });
    c.bench_function("estimate_2d_time_of_day", |b| {
        b.iter(|| {
            estimate_2d(
                black_box(&field),
                &registry,
                &config,
                AxisVariable::TimeOfDay,
                "t2m",
                &YBins::Count(100),
                1.0,
                &FrameSelector::All,
            )
        })
    });
    c.bench_function("estimate_2d_latitude", |b| {
        b.iter(|| {
            estimate_2d(
                black_box(&field),
                &registry,
                &config,
                AxisVariable::Latitude,
                "t2m",
                &YBins::Count(100),
                1.0,
                &FrameSelector::All,
            )
        })
    });
}

criterion_group!(benches, bench_estimators);
criterion_main!(benches);
