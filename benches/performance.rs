// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Performance benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use nalgebra::Point3;
use xcut::{
    BackgroundMesh, CutOptions, CutWizard, CutterMesh, LevelSetField, Verbosity, VolumeCellStrategy,
};

fn unit_box(n: usize) -> BackgroundMesh {
    BackgroundMesh::structured_hex_box([n; 3], Point3::origin(), Point3::new(1.0, 1.0, 1.0))
}

fn sphere(mesh: &BackgroundMesh) -> LevelSetField {
    let center = Point3::new(0.5, 0.5, 0.5);
    LevelSetField::from_fn(mesh, |p| (p - center).norm() - 0.3)
}

fn quiet(strategy: VolumeCellStrategy) -> CutOptions {
    CutOptions {
        verbosity: Verbosity::Silent,
        ..CutOptions::with_strategy(strategy)
    }
}

fn run(
    background: &BackgroundMesh,
    cutters: &[CutterMesh],
    field: Option<&LevelSetField>,
    options: &CutOptions,
) -> usize {
    let mut wizard = CutWizard::new();
    wizard.configure(options.clone()).unwrap();
    wizard.prepare(background, cutters, field).unwrap();
    wizard.cut(true).unwrap().integration_points
}

fn bench_level_set(c: &mut Criterion) {
    let mut group = c.benchmark_group("level_set");
    group.sample_size(20);

    for n in [4, 8] {
        let background = unit_box(n);
        let field = sphere(&background);
        let options = quiet(VolumeCellStrategy::DirectDivergence);
        group.bench_with_input(BenchmarkId::new("sphere", n), &n, |b, _| {
            b.iter(|| run(black_box(&background), &[], Some(&field), &options));
        });
    }

    group.finish();
}

fn bench_strategies(c: &mut Criterion) {
    let mut group = c.benchmark_group("strategies");
    group.sample_size(20);

    let background = unit_box(4);
    let field = sphere(&background);
    for strategy in VolumeCellStrategy::all() {
        let options = quiet(strategy);
        group.bench_function(strategy.as_str(), |b| {
            b.iter(|| run(black_box(&background), &[], Some(&field), &options));
        });
    }

    group.finish();
}

fn bench_cutter_mesh(c: &mut Criterion) {
    let mut group = c.benchmark_group("cutter_mesh");
    group.sample_size(20);

    let background = unit_box(4);
    let cutter = CutterMesh::box_surface(Point3::new(0.2, 0.2, 0.2), Point3::new(0.6, 0.6, 0.6));
    let options = quiet(VolumeCellStrategy::DirectDivergence);
    group.bench_function("closed_box", |b| {
        b.iter(|| run(black_box(&background), std::slice::from_ref(&cutter), None, &options));
    });

    group.finish();
}

criterion_group!(benches, bench_level_set, bench_strategies, bench_cutter_mesh);
criterion_main!(benches);
