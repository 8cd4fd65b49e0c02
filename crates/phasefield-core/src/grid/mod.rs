//! Sampling grids: where the pressure field is evaluated.
//!
//! A [`SamplingGrid`] couples a frozen geometry ([`GridKind`]) with an output
//! buffer that is filled by [`SamplingGrid::propagate`]. The coordinate and
//! pressure buffers are always index-aligned and are replaced as a unit, so a
//! failed propagation never leaves a half-written field behind.

mod hexagonal;
mod point_list;
mod rectilinear;

pub use hexagonal::HexagonalGridBuilder;
pub use rectilinear::{GridCount, RectilinearGridBuilder};

use glam::{DQuat, DVec3};
use num_complex::Complex32;

use crate::config::Medium;
use crate::error::{FieldError, Result};
use crate::propagator::{
    FieldSamples, HexagonalLattice, PropagationOptions, Propagator, RectilinearLattice,
    MAX_LATTICE_SIDE,
};
use crate::tx_array::TxArray;
use crate::world::World;

/// Grid spacing, absolute or relative to the medium wavelength.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Spacing {
    /// Spacing in meters.
    Meters(f64),
    /// Spacing as a fraction of the medium wavelength.
    Wavelengths(f64),
}

impl Default for Spacing {
    fn default() -> Self {
        Spacing::Wavelengths(0.2)
    }
}

impl Spacing {
    /// Absolute spacing in meters.
    pub fn resolve(self, medium: &Medium) -> f64 {
        match self {
            Spacing::Meters(m) => m,
            Spacing::Wavelengths(fraction) => fraction * medium.wavelength(),
        }
    }
}

/// Grid geometry, one variant per kernel family.
#[derive(Debug, Clone, PartialEq)]
pub enum GridKind {
    /// Regular lattice along two orthogonal axes.
    Rectilinear(RectilinearLattice),
    /// Hexagonal lattice.
    ///
    /// Legacy: retained for compatibility with existing analyses. New code
    /// should sample with a point list.
    Hexagonal(HexagonalLattice),
    /// Arbitrary explicit points.
    PointList(Vec<DVec3>),
}

impl GridKind {
    /// Short name of the variant.
    pub fn name(&self) -> &'static str {
        match self {
            GridKind::Rectilinear(_) => "rectilinear",
            GridKind::Hexagonal(_) => "hexagonal",
            GridKind::PointList(_) => "point_list",
        }
    }

    /// Whether this variant is kept only for compatibility.
    pub fn is_legacy(&self) -> bool {
        matches!(self, GridKind::Hexagonal(_))
    }

    /// Output shape `(n1, n2)`.
    pub fn shape(&self) -> (usize, usize) {
        match self {
            GridKind::Rectilinear(l) => (l.rows as usize, l.cols as usize),
            GridKind::Hexagonal(l) => {
                let n = l.grid_length() as usize;
                (n, n)
            }
            GridKind::PointList(points) => (points.len(), 1),
        }
    }
}

/// Propagated field: coordinates and complex pressure, index-aligned.
#[derive(Debug, Clone)]
pub struct FieldBuffer {
    shape: (usize, usize),
    coordinates: Vec<[f32; 3]>,
    pressure: Vec<Complex32>,
}

impl FieldBuffer {
    fn from_samples(samples: FieldSamples, expected: (usize, usize)) -> Result<Self> {
        if samples.shape != expected || samples.records.len() != expected.0 * expected.1 {
            return Err(FieldError::compute(format!(
                "kernel output shape {:?} with {} records does not match grid shape {:?}",
                samples.shape,
                samples.records.len(),
                expected
            )));
        }
        let coordinates = samples.records.iter().map(|r| r.position()).collect();
        let pressure = samples.records.iter().map(|r| r.pressure()).collect();
        Ok(Self {
            shape: expected,
            coordinates,
            pressure,
        })
    }

    /// Buffer shape `(n1, n2)`.
    pub fn shape(&self) -> (usize, usize) {
        self.shape
    }

    /// Sample coordinates in enumeration order.
    pub fn coordinates(&self) -> &[[f32; 3]] {
        &self.coordinates
    }

    /// Complex pressure in enumeration order.
    pub fn pressure(&self) -> &[Complex32] {
        &self.pressure
    }

    /// Pressure at lattice index `(i, j)`.
    pub fn pressure_at(&self, i: usize, j: usize) -> Option<Complex32> {
        if i >= self.shape.0 || j >= self.shape.1 {
            return None;
        }
        self.pressure.get(i * self.shape.1 + j).copied()
    }

    /// Magnitude of every sample.
    pub fn magnitude(&self) -> Vec<f32> {
        self.pressure.iter().map(|p| p.norm()).collect()
    }

    /// Largest pressure magnitude.
    pub fn peak_magnitude(&self) -> f32 {
        self.pressure.iter().map(|p| p.norm()).fold(0.0, f32::max)
    }
}

/// A set of sample points and the field evaluated on them.
#[derive(Debug, Clone)]
pub struct SamplingGrid {
    kind: GridKind,
    normal: Option<DVec3>,
    area: Option<f64>,
    field: Option<FieldBuffer>,
}

impl SamplingGrid {
    /// Start building a rectilinear grid.
    pub fn rectilinear() -> RectilinearGridBuilder {
        RectilinearGridBuilder::default()
    }

    /// Start building a hexagonal grid.
    #[deprecated(note = "legacy grid; prefer `SamplingGrid::rectilinear` or `point_list`")]
    pub fn hexagonal() -> HexagonalGridBuilder {
        HexagonalGridBuilder::default()
    }

    /// Grid over explicit points.
    pub fn point_list(points: Vec<DVec3>) -> Result<Self> {
        point_list::build(points)
    }

    fn from_kind(kind: GridKind, normal: Option<DVec3>, area: Option<f64>) -> Self {
        tracing::debug!(
            "built {} sampling grid with shape {:?}",
            kind.name(),
            kind.shape()
        );
        Self {
            kind,
            normal,
            area,
            field: None,
        }
    }

    /// Grid geometry.
    pub fn kind(&self) -> &GridKind {
        &self.kind
    }

    /// Output shape `(n1, n2)`.
    pub fn shape(&self) -> (usize, usize) {
        self.kind.shape()
    }

    /// Number of sample points.
    pub fn point_count(&self) -> usize {
        let (a, b) = self.shape();
        a * b
    }

    /// Unit normal of the sampling plane (lattices only).
    pub fn normal(&self) -> Option<DVec3> {
        self.normal
    }

    /// Lattice spacing (lattices only).
    pub fn spacing(&self) -> Option<f64> {
        match &self.kind {
            GridKind::Rectilinear(l) => Some(l.spacing),
            GridKind::Hexagonal(l) => Some(l.spacing),
            GridKind::PointList(_) => None,
        }
    }

    /// Sampled area in m² (lattices only).
    pub fn area(&self) -> Option<f64> {
        self.area
    }

    /// Whether a propagation has filled the field.
    pub fn is_populated(&self) -> bool {
        self.field.is_some()
    }

    /// The last successfully propagated field.
    pub fn field(&self) -> Option<&FieldBuffer> {
        self.field.as_ref()
    }

    /// Sample coordinates of the last propagation.
    pub fn coordinates(&self) -> Option<&[[f32; 3]]> {
        self.field.as_ref().map(|f| f.coordinates())
    }

    /// Complex pressure of the last propagation.
    pub fn pressure(&self) -> Option<&[Complex32]> {
        self.field.as_ref().map(|f| f.pressure())
    }

    /// Propagate the world's array onto this grid with the world's propagator.
    pub fn propagate(&mut self, world: &World, options: &PropagationOptions) -> Result<()> {
        self.propagate_with(
            world.propagator(),
            world.tx_array(),
            world.wavenumber(),
            options,
        )
    }

    /// Propagate `array` onto this grid with an explicit propagator.
    ///
    /// On success the coordinate and pressure buffers are replaced; on error
    /// they keep their previous contents.
    pub fn propagate_with(
        &mut self,
        propagator: &dyn Propagator,
        array: &TxArray,
        wavenumber: f64,
        options: &PropagationOptions,
    ) -> Result<()> {
        let samples = match &self.kind {
            GridKind::Rectilinear(lattice) => {
                propagator.propagate_rectilinear(array, lattice, wavenumber, options)?
            }
            GridKind::Hexagonal(lattice) => {
                propagator.propagate_hexagonal(array, lattice, wavenumber, options)?
            }
            GridKind::PointList(points) => {
                propagator.propagate_points(array, points, wavenumber, options)?
            }
        };
        let field = FieldBuffer::from_samples(samples, self.shape())?;
        self.field = Some(field);
        Ok(())
    }
}

/// Angle between two vectors in whole degrees.
///
/// Degrees are rounded to one decimal and then truncated, so the accepted
/// window around a target angle `t` is `[t - 0.05, t + 0.95)`.
pub(crate) fn whole_degrees(a: DVec3, b: DVec3) -> i64 {
    let cos = a.normalize().dot(b.normalize()).clamp(-1.0, 1.0);
    let degrees = cos.acos().to_degrees();
    ((degrees * 10.0).round() / 10.0).trunc() as i64
}

/// In-plane basis for a lattice.
///
/// Rotates `parallel` by `angle_degrees` about `normal` and checks the
/// resulting vectors. Returns `(unit_normal, unit_vector_1, unit_vector_2)`.
pub(crate) fn in_plane_basis(
    normal: DVec3,
    parallel: DVec3,
    angle_degrees: i64,
) -> Result<(DVec3, DVec3, DVec3)> {
    for (name, v) in [("normal", normal), ("parallel", parallel)] {
        if !v.is_finite() || v.length_squared() == 0.0 {
            return Err(FieldError::configuration(format!(
                "{} vector {:?} must be finite and non-zero",
                name, v
            )));
        }
    }

    let unit_normal = normal.normalize();
    let rotation = DQuat::from_axis_angle(unit_normal, (angle_degrees as f64).to_radians());
    let second = rotation * parallel;

    let between = whole_degrees(parallel, second);
    let first_to_normal = whole_degrees(parallel, unit_normal);
    let second_to_normal = whole_degrees(second, unit_normal);

    if between != angle_degrees || first_to_normal != 90 || second_to_normal != 90 {
        return Err(FieldError::configuration(format!(
            "could not parameterise the sampling plane: axes {}° apart (want {}°), \
             {}° and {}° to the normal (want 90°)",
            between, angle_degrees, first_to_normal, second_to_normal
        )));
    }

    Ok((unit_normal, parallel.normalize(), second.normalize()))
}

/// Resolve spacing and validate it together with the requested extent.
pub(crate) fn resolve_spacing(spacing: Spacing, medium: &Medium) -> Result<f64> {
    let delta = spacing.resolve(medium);
    if !delta.is_finite() || delta <= 0.0 {
        return Err(FieldError::configuration(format!(
            "grid spacing must be positive and finite, got {}",
            delta
        )));
    }
    Ok(delta)
}

/// Points needed to cover `2·extent` at `spacing`: `ceil(2·extent / spacing)`.
pub(crate) fn points_for_extent(extent: f64, spacing: f64) -> Result<u32> {
    if !extent.is_finite() || extent <= 0.0 {
        return Err(FieldError::configuration(format!(
            "grid extent must be positive and finite, got {}",
            extent
        )));
    }
    let count = (2.0 * extent / spacing).ceil();
    if count < 1.0 {
        return Err(FieldError::configuration(format!(
            "grid extent {} at spacing {} gives no points per side",
            extent, spacing
        )));
    }
    if count > MAX_LATTICE_SIDE as f64 {
        return Err(FieldError::configuration(format!(
            "grid extent {} at spacing {} needs {} points per side (max {})",
            extent, spacing, count, MAX_LATTICE_SIDE
        )));
    }
    Ok(count as u32)
}

pub(crate) fn check_origin(origin: DVec3) -> Result<()> {
    if !origin.is_finite() {
        return Err(FieldError::configuration(format!(
            "grid origin {:?} is not finite",
            origin
        )));
    }
    Ok(())
}
