//! Propagators for unit tests.

use glam::DVec3;

use crate::error::{FieldError, Result};
use crate::propagator::{
    FieldSamples, HexagonalLattice, PropagationOptions, Propagator, RectilinearLattice,
    SampleRecord,
};
use crate::tx_array::TxArray;

/// Echoes each point back with pressure `(element_count, index)`.
pub(crate) struct EchoPropagator;

impl EchoPropagator {
    fn echo(array: &TxArray, shape: (usize, usize), points: &[DVec3]) -> FieldSamples {
        let records = points
            .iter()
            .enumerate()
            .map(|(index, p)| SampleRecord {
                x: p.x as f32,
                y: p.y as f32,
                z: p.z as f32,
                re: array.element_count() as f32,
                im: index as f32,
            })
            .collect();
        FieldSamples { shape, records }
    }
}

impl Propagator for EchoPropagator {
    fn name(&self) -> &str {
        "echo"
    }

    fn propagate_rectilinear(
        &self,
        array: &TxArray,
        lattice: &RectilinearLattice,
        _wavenumber: f64,
        _options: &PropagationOptions,
    ) -> Result<FieldSamples> {
        let shape = (lattice.rows as usize, lattice.cols as usize);
        Ok(Self::echo(array, shape, &lattice.points()))
    }

    fn propagate_hexagonal(
        &self,
        array: &TxArray,
        lattice: &HexagonalLattice,
        _wavenumber: f64,
        _options: &PropagationOptions,
    ) -> Result<FieldSamples> {
        let n = lattice.grid_length() as usize;
        Ok(Self::echo(array, (n, n), &lattice.points()))
    }

    fn propagate_points(
        &self,
        array: &TxArray,
        points: &[DVec3],
        _wavenumber: f64,
        _options: &PropagationOptions,
    ) -> Result<FieldSamples> {
        Ok(Self::echo(array, (points.len(), 1), points))
    }

    fn solve_single_focus(
        &self,
        array: &TxArray,
        _focal_point: DVec3,
        _wavenumber: f64,
        _options: &PropagationOptions,
    ) -> Result<TxArray> {
        let mut solved = array.clone();
        for element in solved.elements_mut() {
            element.phase = 1.0;
        }
        Ok(solved)
    }
}

/// Fails every call with a compute error.
pub(crate) struct FailingPropagator;

impl Propagator for FailingPropagator {
    fn name(&self) -> &str {
        "failing"
    }

    fn propagate_rectilinear(
        &self,
        _array: &TxArray,
        _lattice: &RectilinearLattice,
        _wavenumber: f64,
        _options: &PropagationOptions,
    ) -> Result<FieldSamples> {
        Err(FieldError::compute("device lost"))
    }

    fn propagate_hexagonal(
        &self,
        _array: &TxArray,
        _lattice: &HexagonalLattice,
        _wavenumber: f64,
        _options: &PropagationOptions,
    ) -> Result<FieldSamples> {
        Err(FieldError::compute("device lost"))
    }

    fn propagate_points(
        &self,
        _array: &TxArray,
        _points: &[DVec3],
        _wavenumber: f64,
        _options: &PropagationOptions,
    ) -> Result<FieldSamples> {
        Err(FieldError::compute("device lost"))
    }

    fn solve_single_focus(
        &self,
        _array: &TxArray,
        _focal_point: DVec3,
        _wavenumber: f64,
        _options: &PropagationOptions,
    ) -> Result<TxArray> {
        Err(FieldError::compute("device lost"))
    }
}
