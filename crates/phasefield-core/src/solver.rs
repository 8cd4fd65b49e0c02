//! Single-focus phase solver.
//!
//! Superseded by general-purpose solvers; kept so existing analyses keep
//! producing the same phase patterns.

use glam::DVec3;

use crate::error::Result;
use crate::propagator::PropagationOptions;
use crate::world::World;

/// Focuses the world's array on one point.
#[derive(Debug, Clone, Copy, Default)]
pub struct Solver;

impl Solver {
    /// Create a solver.
    pub fn new() -> Self {
        Self
    }

    /// Set every element's phase so that all contributions arrive in phase at
    /// `focal_point`. Amplitude ratios are left as they are.
    ///
    /// The world's array is replaced only if the propagator succeeds.
    pub fn solve_single_focus(
        &self,
        world: &mut World,
        focal_point: DVec3,
        options: &PropagationOptions,
    ) -> Result<()> {
        let solved = world.propagator().solve_single_focus(
            world.tx_array(),
            focal_point,
            world.wavenumber(),
            options,
        )?;
        tracing::debug!(
            "solved single focus at {:?} for {}",
            focal_point,
            solved.summary()
        );
        world.set_tx_array(solved);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::WorldConfig;
    use crate::library;
    use crate::testing::{EchoPropagator, FailingPropagator};

    #[test]
    fn test_solver_replaces_array() {
        let mut world = World::new(WorldConfig::default(), Arc::new(EchoPropagator)).unwrap();
        world.set_tx_array(library::rectilinear(2, 2, library::DEFAULT_PITCH));

        Solver::new()
            .solve_single_focus(
                &mut world,
                DVec3::new(0.0, 0.0, 0.1),
                &PropagationOptions::default(),
            )
            .unwrap();

        assert!(world.tx_array().iter().all(|e| e.phase == 1.0));
    }

    #[test]
    fn test_failed_solve_keeps_array() {
        let mut world = World::new(WorldConfig::default(), Arc::new(FailingPropagator)).unwrap();
        world.set_tx_array(library::rectilinear(2, 2, library::DEFAULT_PITCH));

        let err = Solver::new()
            .solve_single_focus(&mut world, DVec3::Z, &PropagationOptions::default())
            .unwrap_err();

        assert!(err.is_compute());
        assert_eq!(world.tx_array().element_count(), 4);
        assert!(world.tx_array().iter().all(|e| e.phase == 0.0));
    }
}
