//! Integration tests for arrays, grids and the solver on the CPU backend.

#![allow(deprecated)]

use phasefield::prelude::*;

async fn cpu_world() -> World {
    phasefield::builder()
        .backend(Backend::Cpu)
        .build()
        .await
        .expect("Failed to create CPU world")
}

/// One element at the origin, one point 200 mm along its normal.
#[tokio::test]
async fn test_single_element_on_axis() {
    let world = cpu_world().await;
    let mut grid = SamplingGrid::point_list(vec![DVec3::new(0.0, 0.0, 0.2)]).unwrap();

    grid.propagate(&world, &PropagationOptions::default())
        .expect("Propagation failed");

    let pressure = grid.pressure().unwrap()[0];
    assert!(pressure.re.is_finite());
    assert!(pressure.im.is_finite());
    assert!(pressure.norm() > 0.0);
    assert_eq!(grid.coordinates().unwrap()[0], [0.0, 0.0, 0.2]);
}

/// Millimetre spacing over a 10 mm extent gives a 39 x 39 hexagonal buffer.
#[tokio::test]
async fn test_hexagonal_grid_example() {
    let world = cpu_world().await;
    let mut grid = SamplingGrid::hexagonal()
        .normal(DVec3::Z)
        .parallel(DVec3::Y)
        .origin(DVec3::new(0.0, 0.0, 0.1))
        .spacing(Spacing::Meters(0.001))
        .extent(0.01)
        .build(world.medium())
        .unwrap();

    assert!(grid.kind().is_legacy());
    assert_eq!(grid.shape(), (39, 39));

    grid.propagate(&world, &PropagationOptions::default()).unwrap();
    let field = grid.field().unwrap();
    assert_eq!(field.shape(), (39, 39));
    assert_eq!(field.pressure().len(), 39 * 39);
    assert!(field.pressure().iter().all(|p| p.norm().is_finite()));

    // centre sample sits on the origin
    let centre = field.coordinates()[19 * 39 + 19];
    assert!(centre[0].abs() < 1e-6 && centre[1].abs() < 1e-6);
    assert!((centre[2] - 0.1).abs() < 1e-6);
}

#[tokio::test]
async fn test_non_orthogonal_grid_rejected() {
    let world = cpu_world().await;

    let err = SamplingGrid::hexagonal()
        .normal(DVec3::Z)
        .parallel(DVec3::new(0.0, 1.0, 0.5))
        .build(world.medium())
        .unwrap_err();
    assert!(err.is_configuration());

    let err = SamplingGrid::rectilinear()
        .normal(DVec3::new(1.0, 0.0, 1.0))
        .parallel(DVec3::X)
        .build(world.medium())
        .unwrap_err();
    assert!(err.is_configuration());
}

#[tokio::test]
async fn test_failed_propagate_leaves_buffers_untouched() {
    let mut world = cpu_world().await;
    let mut grid = SamplingGrid::rectilinear()
        .spacing(Spacing::Meters(0.005))
        .count(GridCount::Explicit { rows: 5, cols: 5 })
        .build(world.medium())
        .unwrap();

    let options = PropagationOptions::default();
    grid.propagate(&world, &options).unwrap();
    let coordinates = grid.coordinates().unwrap().to_vec();
    let pressure = grid.pressure().unwrap().to_vec();

    world.set_tx_array(TxArray::with_elements("empty", Vec::new()));
    let err = grid.propagate(&world, &options).unwrap_err();
    assert!(err.is_compute());

    assert_eq!(grid.coordinates().unwrap(), coordinates.as_slice());
    assert_eq!(grid.pressure().unwrap(), pressure.as_slice());
}

#[tokio::test]
async fn test_non_finite_point_rejected() {
    let world = cpu_world().await;
    let points = vec![DVec3::Z, DVec3::new(f64::NAN, 0.0, 0.1)];
    let mut grid = SamplingGrid::point_list(points).unwrap();

    let err = grid
        .propagate(&world, &PropagationOptions::default())
        .unwrap_err();
    assert!(err.is_compute());
    assert!(!grid.is_populated());
}

#[tokio::test]
async fn test_directivity_broadcast() {
    let mut world = cpu_world().await;
    world.set_tx_array(library::rectilinear(3, 3, library::DEFAULT_PITCH));
    world.tx_array_mut().set_directivity_coefficients(1.0, 0.0, 0.0);

    assert!(world
        .tx_array()
        .iter()
        .all(|e| e.directivity_amplitude == [1.0, 0.0, 0.0]));

    // Omnidirectional element: |p| = 1 / r in every direction
    world.set_tx_array(TxArray::with_elements(
        "omni",
        vec![ElementDescriptor::omnidirectional()],
    ));
    let mut grid =
        SamplingGrid::point_list(vec![DVec3::new(0.1, 0.0, 0.0), DVec3::new(0.0, 0.0, 0.1)])
            .unwrap();
    grid.propagate(&world, &PropagationOptions::default()).unwrap();
    for p in grid.pressure().unwrap() {
        assert!((p.norm() - 10.0).abs() < 1e-4);
    }
}

#[tokio::test]
async fn test_single_focus_sums_coherently() {
    let mut world = cpu_world().await;
    world.set_tx_array(library::rectilinear(8, 8, library::DEFAULT_PITCH));
    world.tx_array_mut().elements_mut()[0].amplitude_ratio = 0.5;
    let focus = DVec3::new(0.0, 0.01, 0.12);
    let options = PropagationOptions::default();

    let mut at_focus = SamplingGrid::point_list(vec![focus]).unwrap();
    at_focus.propagate(&world, &options).unwrap();
    let unfocused = at_focus.pressure().unwrap()[0].norm();

    Solver::new()
        .solve_single_focus(&mut world, focus, &options)
        .unwrap();
    assert_eq!(world.tx_array().get(0).unwrap().amplitude_ratio, 0.5);
    assert!(world.tx_array().iter().skip(1).all(|e| e.amplitude_ratio == 1.0));

    at_focus.propagate(&world, &options).unwrap();
    let focused = at_focus.pressure().unwrap()[0].norm();

    // Every element arrives in phase, so magnitudes add
    let mut coherent = 0.0f32;
    for element in world.tx_array().iter() {
        let single = TxArray::with_elements("single", vec![*element]);
        let samples = world
            .propagator()
            .propagate_points(&single, &[focus], world.wavenumber(), &options)
            .unwrap();
        coherent += samples.records[0].pressure().norm();
    }

    assert!((focused - coherent).abs() < 1e-3 * coherent);
    assert!(focused > unfocused);
}

#[tokio::test]
async fn test_phase_flip_patterns() {
    let mut world = cpu_world().await;
    world.set_tx_array(library::rectilinear(4, 4, library::DEFAULT_PITCH));
    world.tx_array_mut().apply_x_split_phase_flip();

    let mut grid = SamplingGrid::point_list(vec![DVec3::new(0.0, 0.0, 0.1)]).unwrap();
    grid.propagate(&world, &PropagationOptions::default()).unwrap();

    // Twin trap: the two halves cancel on the axis
    let on_axis = grid.pressure().unwrap()[0].norm();
    let reference = 16.0 * 318.5 / 0.1;
    assert!(on_axis < 1e-3 * reference);
}

#[tokio::test]
async fn test_world_from_toml() {
    let config = WorldConfig::from_toml_str(
        r#"
        backend = "cpu"

        [medium]
        frequency_hz = 40000.0
        speed_of_sound = 346.0
        "#,
    )
    .unwrap();

    let world = phasefield::builder().config(config).build().await.unwrap();
    assert_eq!(world.propagator().name(), "cpu");
    assert!((world.medium_wavelength() - 346.0 / 40_000.0).abs() < 1e-12);
}
