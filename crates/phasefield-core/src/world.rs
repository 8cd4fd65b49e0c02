//! The world: medium, transmitter array and propagator handle.

use std::fmt;
use std::sync::Arc;

use crate::config::{Medium, WorldConfig};
use crate::error::Result;
use crate::grid::Spacing;
use crate::propagator::Propagator;
use crate::tx_array::TxArray;

/// Parent context for arrays, grids and solvers.
///
/// Owns the transmitter array exclusively. Grids and the solver borrow the
/// world for the duration of a call.
pub struct World {
    config: WorldConfig,
    tx_array: TxArray,
    propagator: Arc<dyn Propagator>,
}

impl World {
    /// Create a world with a default single-element array.
    pub fn new(config: WorldConfig, propagator: Arc<dyn Propagator>) -> Result<Self> {
        config.validate()?;
        tracing::info!(
            "World created: {} Hz, wavelength {:.3} mm, backend {}",
            config.medium.frequency_hz,
            config.medium.wavelength() * 1e3,
            propagator.name()
        );
        Ok(Self {
            config,
            tx_array: TxArray::new(),
            propagator,
        })
    }

    /// Configuration the world was built with.
    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Propagation medium.
    pub fn medium(&self) -> &Medium {
        &self.config.medium
    }

    /// Wavelength in the medium (m).
    pub fn medium_wavelength(&self) -> f64 {
        self.config.medium.wavelength()
    }

    /// Angular wavenumber (rad/m).
    pub fn wavenumber(&self) -> f64 {
        self.config.medium.wavenumber()
    }

    /// Absolute spacing in meters.
    pub fn resolve_spacing(&self, spacing: Spacing) -> f64 {
        spacing.resolve(&self.config.medium)
    }

    /// The transmitter array.
    pub fn tx_array(&self) -> &TxArray {
        &self.tx_array
    }

    /// Mutable access to the transmitter array.
    pub fn tx_array_mut(&mut self) -> &mut TxArray {
        &mut self.tx_array
    }

    /// Replace the transmitter array, returning the previous one.
    pub fn set_tx_array(&mut self, array: TxArray) -> TxArray {
        std::mem::replace(&mut self.tx_array, array)
    }

    /// The propagator used by grids and the solver.
    pub fn propagator(&self) -> &dyn Propagator {
        self.propagator.as_ref()
    }

    /// Shared handle to the propagator.
    pub fn propagator_handle(&self) -> Arc<dyn Propagator> {
        Arc::clone(&self.propagator)
    }
}

impl fmt::Debug for World {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("World")
            .field("config", &self.config)
            .field("tx_array", &self.tx_array.summary())
            .field("propagator", &self.propagator.name())
            .finish()
    }
}
