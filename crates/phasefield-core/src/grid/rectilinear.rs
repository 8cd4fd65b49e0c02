use glam::DVec3;

use super::{
    check_origin, in_plane_basis, points_for_extent, resolve_spacing, GridKind, SamplingGrid,
    Spacing,
};
use crate::config::Medium;
use crate::error::{FieldError, Result};
use crate::propagator::{RectilinearLattice, MAX_LATTICE_SIDE};

/// How many points a rectilinear grid has along each axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GridCount {
    /// Fixed counts along the first and second basis vectors.
    Explicit {
        /// Points along the first basis vector.
        rows: u32,
        /// Points along the second basis vector.
        cols: u32,
    },
    /// Cover `[-extent, extent]` along both axes: `ceil(2·extent / spacing)`.
    Extent(f64),
}

impl Default for GridCount {
    fn default() -> Self {
        GridCount::Extent(0.2)
    }
}

/// Builder for rectilinear sampling grids.
#[derive(Debug, Clone)]
pub struct RectilinearGridBuilder {
    normal: DVec3,
    parallel: DVec3,
    origin: DVec3,
    spacing: Spacing,
    count: GridCount,
}

impl Default for RectilinearGridBuilder {
    fn default() -> Self {
        Self {
            normal: DVec3::Z,
            parallel: DVec3::Y,
            origin: DVec3::new(0.0, 0.0, 0.2),
            spacing: Spacing::default(),
            count: GridCount::default(),
        }
    }
}

impl RectilinearGridBuilder {
    /// Normal of the sampling plane.
    pub fn normal(mut self, normal: DVec3) -> Self {
        self.normal = normal;
        self
    }

    /// First in-plane direction.
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

    /// Point counts along each axis.
    pub fn count(mut self, count: GridCount) -> Self {
        self.count = count;
        self
    }

    /// Validate the geometry and build the grid.
    pub fn build(self, medium: &Medium) -> Result<SamplingGrid> {
        check_origin(self.origin)?;
        let spacing = resolve_spacing(self.spacing, medium)?;
        let (normal, vector_1, vector_2) = in_plane_basis(self.normal, self.parallel, 90)?;

        let (rows, cols) = match self.count {
            GridCount::Explicit { rows, cols } => {
                for (name, value) in [("rows", rows), ("cols", cols)] {
                    if value == 0 || value > MAX_LATTICE_SIDE {
                        return Err(FieldError::configuration(format!(
                            "grid {} must be in 1..={}, got {}",
                            name, MAX_LATTICE_SIDE, value
                        )));
                    }
                }
                (rows, cols)
            }
            GridCount::Extent(extent) => {
                let n = points_for_extent(extent, spacing)?;
                (n, n)
            }
        };

        let lattice = RectilinearLattice {
            rows,
            cols,
            spacing,
            origin: self.origin,
            vector_1,
            vector_2,
        };
        let area = (rows as f64 - 1.0) * (cols as f64 - 1.0) * spacing * spacing;

        Ok(SamplingGrid::from_kind(
            GridKind::Rectilinear(lattice),
            Some(normal),
            Some(area),
        ))
    }
}
