//! CPU propagation benchmarks.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use glam::DVec3;
use phasefield_core::library;
use phasefield_core::propagator::{PropagationOptions, Propagator, RectilinearLattice};
use phasefield_cpu::CpuPropagator;

const WAVENUMBER: f64 = std::f64::consts::TAU * 40_000.0 / 343.0;

fn bench_rectilinear(c: &mut Criterion) {
    let propagator = CpuPropagator::new();
    let options = PropagationOptions::default();
    let array = library::rectilinear(16, 16, library::DEFAULT_PITCH);

    let mut group = c.benchmark_group("Rectilinear Propagation");

    for side in [32u32, 64, 128] {
        let lattice = RectilinearLattice {
            rows: side,
            cols: side,
            spacing: 0.001,
            origin: DVec3::new(0.0, 0.0, 0.1),
            vector_1: DVec3::X,
            vector_2: DVec3::Y,
        };
        group.throughput(Throughput::Elements(
            lattice.point_count() as u64 * array.element_count() as u64,
        ));
        group.bench_function(format!("{}x{}_256_elements", side, side), |b| {
            b.iter(|| {
                let samples = propagator
                    .propagate_rectilinear(black_box(&array), &lattice, WAVENUMBER, &options)
                    .unwrap();
                black_box(samples)
            })
        });
    }

    group.finish();
}

fn bench_single_focus(c: &mut Criterion) {
    let propagator = CpuPropagator::new();
    let options = PropagationOptions::default();
    let array = library::rectilinear(32, 32, library::DEFAULT_PITCH);
    let focus = DVec3::new(0.0, 0.02, 0.15);

    c.bench_function("solve_single_focus_1024_elements", |b| {
        b.iter(|| {
            let solved = propagator
                .solve_single_focus(black_box(&array), focus, WAVENUMBER, &options)
                .unwrap();
            black_box(solved)
        })
    });
}

criterion_group!(benches, bench_rectilinear, bench_single_focus);
criterion_main!(benches);
