//! # Phasefield
//!
//! Acoustic pressure fields of phased transducer arrays, computed on the GPU.
//!
//! A [`World`] owns the transmitter array, the propagation medium and a
//! [`Propagator`] backend. Sampling grids borrow the world to evaluate the
//! superposed field of every element at their sample points.
//!
//! ## Quick Start
//!
//! ```ignore
//! use phasefield::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let mut world = phasefield::builder()
//!         .backend(Backend::Auto)
//!         .medium(Medium::air(40_000.0))
//!         .build()
//!         .await?;
//!
//!     world.set_tx_array(library::rectilinear(16, 16, library::DEFAULT_PITCH));
//!     Solver::new().solve_single_focus(
//!         &mut world,
//!         DVec3::new(0.0, 0.0, 0.15),
//!         &PropagationOptions::default(),
//!     )?;
//!
//!     let mut grid = SamplingGrid::rectilinear()
//!         .normal(DVec3::X)
//!         .parallel(DVec3::Z)
//!         .origin(DVec3::new(0.0, 0.0, 0.1))
//!         .spacing(Spacing::Wavelengths(0.25))
//!         .count(GridCount::Extent(0.1))
//!         .build(world.medium())?;
//!     grid.propagate(&world, &PropagationOptions::default())?;
//!
//!     println!("peak |p| = {}", grid.field().unwrap().peak_magnitude());
//!     Ok(())
//! }
//! ```
//!
//! ## Backends
//!
//! - **CPU** - Reference implementation (always available)
//! - **WebGPU** - WGSL kernels via wgpu (requires the `wgpu` feature, on by default)
//!
//! `Backend::Auto` picks WebGPU when an adapter can be opened and falls back
//! to the CPU otherwise.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(hidden_glob_reexports)]

use std::sync::Arc;

pub use phasefield_core::*;

pub use phasefield_cpu::CpuPropagator;

#[cfg(feature = "wgpu")]
pub use phasefield_wgpu::{ComputeContext, WgpuPropagator};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::{builder, CpuPropagator, WorldBuilder};
    pub use phasefield_core::prelude::*;
}

/// Start building a [`World`].
pub fn builder() -> WorldBuilder {
    WorldBuilder::new()
}

/// Builder for a [`World`] with a backend chosen from its configuration.
#[derive(Debug, Clone, Default)]
pub struct WorldBuilder {
    config: WorldConfig,
}

impl WorldBuilder {
    /// Create a builder with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: WorldConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the backend.
    pub fn backend(mut self, backend: Backend) -> Self {
        self.config.backend = backend;
        self
    }

    /// Set the propagation medium.
    pub fn medium(mut self, medium: Medium) -> Self {
        self.config.medium = medium;
        self
    }

    /// Select a GPU adapter by enumeration index.
    pub fn adapter_index(mut self, index: usize) -> Self {
        self.config.device.adapter_index = Some(index);
        self
    }

    /// Set the GPU power preference.
    pub fn power_preference(mut self, preference: PowerPreference) -> Self {
        self.config.device.power_preference = preference;
        self
    }

    /// Build the world.
    pub async fn build(self) -> Result<World> {
        self.config.validate()?;
        let propagator = create_propagator(&self.config).await?;
        World::new(self.config, propagator)
    }

    /// Blocking variant of [`WorldBuilder::build`].
    pub fn build_blocking(self) -> Result<World> {
        futures::executor::block_on(self.build())
    }
}

/// Create the propagator selected by `config.backend`.
pub async fn create_propagator(config: &WorldConfig) -> Result<Arc<dyn Propagator>> {
    match config.backend {
        Backend::Auto => auto_propagator(&config.device).await,
        Backend::Cpu => Ok(Arc::new(CpuPropagator::new())),
        #[cfg(feature = "wgpu")]
        Backend::Wgpu => wgpu_propagator(&config.device).await,
        #[cfg(not(feature = "wgpu"))]
        Backend::Wgpu => Err(FieldError::backend_unavailable(
            "WebGPU feature not enabled",
        )),
    }
}

#[cfg(feature = "wgpu")]
async fn wgpu_propagator(device: &DeviceConfig) -> Result<Arc<dyn Propagator>> {
    let context = ComputeContext::new(device).await?;
    Ok(Arc::new(WgpuPropagator::new(Arc::new(context))?))
}

/// Auto-select the best available backend.
async fn auto_propagator(device: &DeviceConfig) -> Result<Arc<dyn Propagator>> {
    #[cfg(feature = "wgpu")]
    match wgpu_propagator(device).await {
        Ok(propagator) => {
            tracing::info!("Auto-selected WebGPU backend");
            return Ok(propagator);
        }
        Err(e) => tracing::warn!("WebGPU backend unavailable: {}", e),
    }
    #[cfg(not(feature = "wgpu"))]
    let _ = device;

    tracing::info!("Auto-selected CPU backend (no GPU available)");
    Ok(Arc::new(CpuPropagator::new()))
}

/// Install a `tracing` subscriber for applications and examples.
///
/// `RUST_LOG` takes precedence; otherwise `info` (or `debug` when `verbose`).
/// Does nothing if a subscriber is already installed.
pub fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "info" }));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// Check availability of backends at runtime.
pub mod availability {
    use super::Backend;

    /// Check if WebGPU is available.
    pub fn wgpu() -> bool {
        #[cfg(feature = "wgpu")]
        {
            phasefield_wgpu::is_available()
        }
        #[cfg(not(feature = "wgpu"))]
        {
            false
        }
    }

    /// Get list of available backends.
    pub fn available_backends() -> Vec<Backend> {
        let mut backends = vec![Backend::Cpu];
        if wgpu() {
            backends.push(Backend::Wgpu);
        }
        backends
    }
}
