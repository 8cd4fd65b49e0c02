use glam::DVec3;

use super::{
    check_origin, in_plane_basis, points_for_extent, resolve_spacing, GridKind, SamplingGrid,
    Spacing,
};
use crate::config::Medium;
use crate::error::{FieldError, Result};
use crate::propagator::{HexagonalLattice, MAX_LATTICE_SIDE};

/// Builder for hexagonal sampling grids.
///
/// The lattice axes are the parallel vector and the parallel vector rotated
/// by 60° about the normal. Only points within the hexagon contribute to the
/// reported area; the remaining corners of the parallelogram are still
/// evaluated.
#[derive(Debug, Clone)]
pub struct HexagonalGridBuilder {
    normal: DVec3,
    parallel: DVec3,
    origin: DVec3,
    spacing: Spacing,
    extent: f64,
}

impl Default for HexagonalGridBuilder {
    fn default() -> Self {
        Self {
            normal: DVec3::Z,
            parallel: DVec3::Y,
            origin: DVec3::new(0.0, 0.0, 0.2),
            spacing: Spacing::default(),
            extent: 0.2,
        }
    }
}

impl HexagonalGridBuilder {
    /// Normal of the sampling plane.
    pub fn normal(mut self, normal: DVec3) -> Self {
        self.normal = normal;
        self
    }

    /// First lattice direction.
    pub fn parallel(mut self, parallel: DVec3) -> Self {
        self.parallel = parallel;
        self
    }

    /// Grid centre.
    pub fn origin(mut self, origin: DVec3) -> Self {
        self.origin = origin;
        self
    }

    /// Point spacing.
    pub fn spacing(mut self, spacing: Spacing) -> Self {
        self.spacing = spacing;
        self
    }

    /// Half-width of the sampled region (m).
    pub fn extent(mut self, extent: f64) -> Self {
        self.extent = extent;
        self
    }

    /// Validate the geometry and build the grid.
    pub fn build(self, medium: &Medium) -> Result<SamplingGrid> {
        check_origin(self.origin)?;
        let spacing = resolve_spacing(self.spacing, medium)?;
        let (normal, vector_1, vector_2) = in_plane_basis(self.normal, self.parallel, 60)?;

        let side_length = points_for_extent(self.extent, spacing)?;
        if side_length.saturating_mul(2).saturating_sub(1) > MAX_LATTICE_SIDE {
            return Err(FieldError::configuration(format!(
                "hexagonal grid of side {} exceeds {} points per axis",
                side_length, MAX_LATTICE_SIDE
            )));
        }

        let lattice = HexagonalLattice {
            side_length,
            spacing,
            origin: self.origin,
            vector_1,
            vector_2: round_to(vector_2, 4),
        };

        let grid_length = lattice.grid_length() as f64;
        let inside = lattice.footprint_count() as f64;
        let side = (grid_length - 1.0) * spacing;
        let area = inside / (grid_length * grid_length) * side * side * 3f64.sqrt() / 2.0;

        Ok(SamplingGrid::from_kind(
            GridKind::Hexagonal(lattice),
            Some(normal),
            Some(area),
        ))
    }
}

fn round_to(v: DVec3, decimals: i32) -> DVec3 {
    let scale = 10f64.powi(decimals);
    (v * scale).round() / scale
}
