//! Host implementation of the propagation contract.

use std::time::Instant;

use glam::DVec3;
use rayon::prelude::*;
use tracing::debug;

use phasefield_core::error::Result;
use phasefield_core::propagator::{
    report_performance, validate_array, validate_points, validate_wavenumber, FieldSamples,
    HexagonalLattice, PropagationOptions, Propagator, RectilinearLattice, SampleRecord,
};
use phasefield_core::TxArray;

use crate::kernel::{superpose, Source};

const BACKEND: &str = "cpu";

/// Reference propagator running on the host.
///
/// Evaluates the point-source model in `f64` and parallelises over sample
/// points with rayon. Calls block until every point is evaluated.
#[derive(Debug, Clone, Copy, Default)]
pub struct CpuPropagator;

impl CpuPropagator {
    /// Create a CPU propagator.
    pub fn new() -> Self {
        Self
    }

    fn evaluate(
        &self,
        kernel: &str,
        array: &TxArray,
        points: &[DVec3],
        shape: (usize, usize),
        wavenumber: f64,
        options: &PropagationOptions,
    ) -> Result<FieldSamples> {
        validate_array(array)?;
        validate_wavenumber(wavenumber)?;
        debug!(
            "{}: {} points x {} elements",
            kernel,
            points.len(),
            array.element_count()
        );

        let start = Instant::now();
        let sources: Vec<Source> = array.iter().map(Source::from_descriptor).collect();

        let records = points
            .par_iter()
            .map(|&point| {
                let pressure = superpose(&sources, point, wavenumber);
                SampleRecord {
                    x: point.x as f32,
                    y: point.y as f32,
                    z: point.z as f32,
                    re: pressure.re as f32,
                    im: pressure.im as f32,
                }
            })
            .collect();

        if options.report_performance {
            report_performance(
                BACKEND,
                kernel,
                points.len(),
                sources.len(),
                start.elapsed(),
            );
        }

        Ok(FieldSamples { shape, records })
    }
}

impl Propagator for CpuPropagator {
    fn name(&self) -> &str {
        BACKEND
    }

    fn propagate_rectilinear(
        &self,
        array: &TxArray,
        lattice: &RectilinearLattice,
        wavenumber: f64,
        options: &PropagationOptions,
    ) -> Result<FieldSamples> {
        lattice.validate()?;
        let shape = (lattice.rows as usize, lattice.cols as usize);
        self.evaluate(
            "propagate_rect",
            array,
            &lattice.points(),
            shape,
            wavenumber,
            options,
        )
    }

    fn propagate_hexagonal(
        &self,
        array: &TxArray,
        lattice: &HexagonalLattice,
        wavenumber: f64,
        options: &PropagationOptions,
    ) -> Result<FieldSamples> {
        lattice.validate()?;
        let n = lattice.grid_length() as usize;
        self.evaluate(
            "propagate_hex",
            array,
            &lattice.points(),
            (n, n),
            wavenumber,
            options,
        )
    }

    fn propagate_points(
        &self,
        array: &TxArray,
        points: &[DVec3],
        wavenumber: f64,
        options: &PropagationOptions,
    ) -> Result<FieldSamples> {
        validate_points(points)?;
        self.evaluate(
            "propagate_points",
            array,
            points,
            (points.len(), 1),
            wavenumber,
            options,
        )
    }

    fn solve_single_focus(
        &self,
        array: &TxArray,
        focal_point: DVec3,
        wavenumber: f64,
        options: &PropagationOptions,
    ) -> Result<TxArray> {
        validate_array(array)?;
        validate_wavenumber(wavenumber)?;
        validate_points(&[focal_point])?;

        let start = Instant::now();
        let mut solved = array.clone();
        solved.elements_mut().par_iter_mut().for_each(|element| {
            let source = Source::from_descriptor(element);
            element.phase = source.focus_phase(focal_point, wavenumber) as f32;
        });

        if options.report_performance {
            report_performance(
                BACKEND,
                "solve_single_focus",
                1,
                solved.element_count(),
                start.elapsed(),
            );
        }
        Ok(solved)
    }
}
