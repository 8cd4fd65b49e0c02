//! Integration tests for the WebGPU backend.
//!
//! These need a GPU adapter and are ignored by default:
//! `cargo test -p phasefield -- --ignored`

#![cfg(feature = "wgpu")]

use phasefield::prelude::*;

async fn worlds() -> (World, World) {
    let gpu = phasefield::builder()
        .backend(Backend::Wgpu)
        .build()
        .await
        .expect("Failed to create WebGPU world");
    let cpu = phasefield::builder()
        .backend(Backend::Cpu)
        .build()
        .await
        .expect("Failed to create CPU world");
    (gpu, cpu)
}

#[tokio::test]
#[ignore] // Requires GPU
async fn test_wgpu_world_creation() {
    let (gpu, _) = worlds().await;
    assert_eq!(gpu.propagator().name(), "wgpu");
}

#[tokio::test]
#[ignore] // Requires GPU
async fn test_rectilinear_grid_matches_cpu() {
    let (mut gpu, mut cpu) = worlds().await;
    let array = library::rectilinear(8, 8, library::DEFAULT_PITCH);
    gpu.set_tx_array(array.clone());
    cpu.set_tx_array(array);

    let grid = SamplingGrid::rectilinear()
        .normal(DVec3::X)
        .parallel(DVec3::Z)
        .origin(DVec3::new(0.0, 0.0, 0.1))
        .spacing(Spacing::Wavelengths(0.25))
        .count(GridCount::Extent(0.05))
        .build(gpu.medium())
        .unwrap();

    let options = PropagationOptions::default().with_performance_report(true);
    let mut on_gpu = grid.clone();
    let mut on_cpu = grid;
    on_gpu.propagate(&gpu, &options).unwrap();
    on_cpu.propagate(&cpu, &options).unwrap();

    let g = on_gpu.field().unwrap();
    let c = on_cpu.field().unwrap();
    let peak = c.peak_magnitude();
    for (a, b) in g.pressure().iter().zip(c.pressure()) {
        assert!((a - b).norm() < 5e-3 * peak);
    }
}

#[tokio::test]
#[ignore] // Requires GPU
async fn test_solver_on_gpu_focuses() {
    let (mut gpu, _) = worlds().await;
    gpu.set_tx_array(library::rectilinear(16, 16, library::DEFAULT_PITCH));
    let focus = DVec3::new(0.02, 0.0, 0.15);
    let options = PropagationOptions::default();

    let mut at_focus = SamplingGrid::point_list(vec![focus]).unwrap();
    at_focus.propagate(&gpu, &options).unwrap();
    let before = at_focus.pressure().unwrap()[0].norm();

    Solver::new()
        .solve_single_focus(&mut gpu, focus, &options)
        .unwrap();
    at_focus.propagate(&gpu, &options).unwrap();
    let after = at_focus.pressure().unwrap()[0].norm();

    assert!(after > before);
}
