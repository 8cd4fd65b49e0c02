//! Propagation kernel contract.
//!
//! A [`Propagator`] evaluates the superposed complex pressure of every array
//! element at a set of sample points. Each kernel family (rectilinear lattice,
//! hexagonal lattice, explicit point list, single-focus solver) has its own
//! method; backends implement all of them by holding one compiled kernel per
//! family.
//!
//! ## Kernel boundary
//!
//! ```text
//! input   element table     N x 16 f32   (see descriptor module)
//!         geometry          lattice scalars/vectors or M x 3 points
//!         wavenumber        f32
//! output  sample records    M x 5 f32    (x, y, z, re, im)
//! ```
//!
//! Output order always matches the caller's point enumeration order.

use std::time::Duration;

use bytemuck::{Pod, Zeroable};
use glam::DVec3;
use num_complex::Complex32;

use crate::error::{FieldError, Result};
use crate::tx_array::TxArray;

/// Number of `f32` columns in one output record.
pub const RECORD_WIDTH: usize = 5;

/// Largest lattice side accepted by any kernel.
pub const MAX_LATTICE_SIDE: u32 = 16_384;

/// One output row: sample coordinates and complex pressure.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct SampleRecord {
    /// Sample x (m).
    pub x: f32,
    /// Sample y (m).
    pub y: f32,
    /// Sample z (m).
    pub z: f32,
    /// Real part of the complex pressure.
    pub re: f32,
    /// Imaginary part of the complex pressure.
    pub im: f32,
}

impl SampleRecord {
    /// Sample coordinates.
    pub fn position(&self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }

    /// Complex pressure `re + i·im`.
    pub fn pressure(&self) -> Complex32 {
        Complex32::new(self.re, self.im)
    }
}

/// Kernel output: one record per requested point.
#[derive(Debug, Clone)]
pub struct FieldSamples {
    /// Lattice shape `(n1, n2)`; `(M, 1)` for point lists.
    pub shape: (usize, usize),
    /// Records in enumeration order.
    pub records: Vec<SampleRecord>,
}

impl FieldSamples {
    /// Build from a flat `M x 5` buffer.
    pub fn from_flat(shape: (usize, usize), flat: &[f32]) -> Result<Self> {
        let expected = shape.0 * shape.1 * RECORD_WIDTH;
        if flat.len() != expected {
            return Err(FieldError::compute(format!(
                "kernel returned {} values, expected {} ({}x{} points x {})",
                flat.len(),
                expected,
                shape.0,
                shape.1,
                RECORD_WIDTH
            )));
        }
        Ok(Self {
            shape,
            records: bytemuck::cast_slice(flat).to_vec(),
        })
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether there are no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Flat `M x 5` view.
    pub fn as_flat(&self) -> &[f32] {
        bytemuck::cast_slice(&self.records)
    }
}

/// Per-call options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropagationOptions {
    /// Log elapsed time and throughput after the call.
    pub report_performance: bool,
    /// Threads per workgroup for GPU dispatch.
    pub workgroup_size: u32,
}

impl Default for PropagationOptions {
    fn default() -> Self {
        Self {
            report_performance: false,
            workgroup_size: 64,
        }
    }
}

impl PropagationOptions {
    /// Enable performance feedback.
    pub fn with_performance_report(mut self, enabled: bool) -> Self {
        self.report_performance = enabled;
        self
    }
}

/// Regular lattice along two orthogonal unit vectors, centred on `origin`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RectilinearLattice {
    /// Points along `vector_1`.
    pub rows: u32,
    /// Points along `vector_2`.
    pub cols: u32,
    /// Lattice pitch (m).
    pub spacing: f64,
    /// Lattice centre.
    pub origin: DVec3,
    /// First in-plane unit vector.
    pub vector_1: DVec3,
    /// Second in-plane unit vector, 90° from the first.
    pub vector_2: DVec3,
}

impl RectilinearLattice {
    /// Total point count.
    pub fn point_count(&self) -> usize {
        self.rows as usize * self.cols as usize
    }

    /// Point `(i, j)`, `i` along `vector_1`.
    pub fn point(&self, i: u32, j: u32) -> DVec3 {
        let a = i as f64 - (self.rows as f64 - 1.0) / 2.0;
        let b = j as f64 - (self.cols as f64 - 1.0) / 2.0;
        self.origin + self.spacing * (a * self.vector_1 + b * self.vector_2)
    }

    /// All points in enumeration order (`i` outer).
    pub fn points(&self) -> Vec<DVec3> {
        (0..self.rows)
            .flat_map(|i| (0..self.cols).map(move |j| (i, j)))
            .map(|(i, j)| self.point(i, j))
            .collect()
    }

    /// Reject lattices a kernel cannot evaluate.
    pub fn validate(&self) -> Result<()> {
        validate_side("rows", self.rows)?;
        validate_side("cols", self.cols)?;
        validate_geometry(self.spacing, &[self.origin, self.vector_1, self.vector_2])
    }
}

/// Lattice along two unit vectors 60° apart, centred on `origin`.
///
/// The buffer is a `grid_length x grid_length` parallelogram; only points
/// within hexagonal distance `side_length - 1` of the centre form the hex
/// footprint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HexagonalLattice {
    /// Hex side length in points.
    pub side_length: u32,
    /// Lattice pitch (m).
    pub spacing: f64,
    /// Lattice centre.
    pub origin: DVec3,
    /// First in-plane unit vector.
    pub vector_1: DVec3,
    /// Second in-plane vector, 60° from the first.
    pub vector_2: DVec3,
}

impl HexagonalLattice {
    /// Points along each lattice axis: `2·side_length − 1`.
    pub fn grid_length(&self) -> u32 {
        self.side_length.saturating_mul(2).saturating_sub(1)
    }

    /// Total point count of the bounding parallelogram.
    pub fn point_count(&self) -> usize {
        let n = self.grid_length() as usize;
        n * n
    }

    fn axial(&self, i: u32, j: u32) -> (i64, i64) {
        let centre = self.side_length as i64 - 1;
        (i as i64 - centre, j as i64 - centre)
    }

    /// Point `(i, j)`, `i` along `vector_1`.
    pub fn point(&self, i: u32, j: u32) -> DVec3 {
        let (a, b) = self.axial(i, j);
        self.origin + self.spacing * (a as f64 * self.vector_1 + b as f64 * self.vector_2)
    }

    /// Whether `(i, j)` lies inside the hex footprint.
    pub fn in_footprint(&self, i: u32, j: u32) -> bool {
        let (a, b) = self.axial(i, j);
        let radius = self.side_length as i64 - 1;
        a.abs().max(b.abs()).max((a + b).abs()) <= radius
    }

    /// Number of points inside the hex footprint.
    pub fn footprint_count(&self) -> usize {
        let s = self.side_length as usize;
        if s == 0 {
            return 0;
        }
        1 + 3 * s * (s - 1)
    }

    /// All points in enumeration order (`i` outer).
    pub fn points(&self) -> Vec<DVec3> {
        let n = self.grid_length();
        (0..n)
            .flat_map(|i| (0..n).map(move |j| (i, j)))
            .map(|(i, j)| self.point(i, j))
            .collect()
    }

    /// Reject lattices a kernel cannot evaluate.
    pub fn validate(&self) -> Result<()> {
        validate_side("side_length", self.side_length)?;
        validate_geometry(self.spacing, &[self.origin, self.vector_1, self.vector_2])
    }
}

fn validate_side(name: &str, value: u32) -> Result<()> {
    if value == 0 || value > MAX_LATTICE_SIDE {
        return Err(FieldError::compute(format!(
            "lattice {} must be in 1..={}, got {}",
            name, MAX_LATTICE_SIDE, value
        )));
    }
    Ok(())
}

fn validate_geometry(spacing: f64, vectors: &[DVec3]) -> Result<()> {
    if !spacing.is_finite() || spacing <= 0.0 {
        return Err(FieldError::compute(format!(
            "lattice spacing must be positive and finite, got {}",
            spacing
        )));
    }
    if let Some(v) = vectors.iter().find(|v| !v.is_finite()) {
        return Err(FieldError::compute(format!(
            "lattice vector {:?} is not finite",
            v
        )));
    }
    Ok(())
}

/// Reject explicit point lists a kernel cannot evaluate.
pub fn validate_points(points: &[DVec3]) -> Result<()> {
    if points.is_empty() {
        return Err(FieldError::compute("point list is empty"));
    }
    if let Some(index) = points.iter().position(|p| !p.is_finite()) {
        return Err(FieldError::compute(format!(
            "point {} is not finite: {:?}",
            index, points[index]
        )));
    }
    Ok(())
}

/// Reject arrays a kernel cannot evaluate.
pub fn validate_array(array: &TxArray) -> Result<()> {
    if array.is_empty() {
        return Err(FieldError::compute("transmitter array has no elements"));
    }
    for (index, element) in array.iter().enumerate() {
        if !element.is_finite() {
            return Err(FieldError::compute(format!(
                "element {} has non-finite fields",
                index
            )));
        }
        if element.has_degenerate_normal() {
            return Err(FieldError::compute(format!(
                "element {} has a zero normal vector",
                index
            )));
        }
    }
    Ok(())
}

/// Reject a non-finite wavenumber.
pub fn validate_wavenumber(wavenumber: f64) -> Result<()> {
    if !wavenumber.is_finite() || wavenumber <= 0.0 {
        return Err(FieldError::compute(format!(
            "wavenumber must be positive and finite, got {}",
            wavenumber
        )));
    }
    Ok(())
}

/// Emit performance feedback for one kernel call.
pub fn report_performance(
    backend: &str,
    kernel: &str,
    points: usize,
    elements: usize,
    elapsed: Duration,
) {
    let seconds = elapsed.as_secs_f64().max(f64::EPSILON);
    let interactions = points as f64 * elements as f64;
    tracing::info!(
        "{} {}: {} points x {} elements in {:.3} ms ({:.1} M interactions/s)",
        backend,
        kernel,
        points,
        elements,
        seconds * 1e3,
        interactions / seconds / 1e6
    );
}

/// Propagation service implemented by every compute backend.
///
/// Calls block until results are available. Implementations must not retain
/// the array between calls and must not return partial results: either the
/// full output or an error.
pub trait Propagator: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// Evaluate the field on a rectilinear lattice.
    fn propagate_rectilinear(
        &self,
        array: &TxArray,
        lattice: &RectilinearLattice,
        wavenumber: f64,
        options: &PropagationOptions,
    ) -> Result<FieldSamples>;

    /// Evaluate the field on a hexagonal lattice (whole bounding parallelogram).
    fn propagate_hexagonal(
        &self,
        array: &TxArray,
        lattice: &HexagonalLattice,
        wavenumber: f64,
        options: &PropagationOptions,
    ) -> Result<FieldSamples>;

    /// Evaluate the field at explicit points.
    fn propagate_points(
        &self,
        array: &TxArray,
        points: &[DVec3],
        wavenumber: f64,
        options: &PropagationOptions,
    ) -> Result<FieldSamples>;

    /// Compute element phases that focus the array on `focal_point`.
    ///
    /// Returns a new array; the input is left untouched.
    fn solve_single_focus(
        &self,
        array: &TxArray,
        focal_point: DVec3,
        wavenumber: f64,
        options: &PropagationOptions,
    ) -> Result<TxArray>;
}
