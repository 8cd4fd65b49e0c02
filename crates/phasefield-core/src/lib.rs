//! # phasefield-core
//!
//! Transducer array model, sampling grids and the propagation contract.
//!
//! This crate holds everything that does not depend on a compute backend:
//!
//! - [`ElementDescriptor`]: the fixed 16-column record of one transmitter
//! - [`TxArray`]: an ordered table of descriptors with phase-pattern mutators
//! - [`SamplingGrid`]: rectilinear, hexagonal and point-list sample sets
//! - [`Propagator`]: the trait a backend implements to evaluate the field
//! - [`Solver`] and [`World`]: single-focus phasing and the parent context
//!
//! Backends live in `phasefield-cpu` and `phasefield-wgpu`.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod descriptor;
pub mod error;
pub mod grid;
pub mod library;
pub mod propagator;
pub mod solver;
pub mod tx_array;
pub mod world;

#[cfg(test)]
mod testing;

pub use config::{Backend, DeviceConfig, Medium, PowerPreference, WorldConfig};
pub use descriptor::ElementDescriptor;
pub use error::{FieldError, Result};
pub use grid::{FieldBuffer, GridKind, SamplingGrid, Spacing};
pub use propagator::{FieldSamples, PropagationOptions, Propagator, SampleRecord};
pub use solver::Solver;
pub use tx_array::TxArray;
pub use world::World;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::config::{Backend, DeviceConfig, Medium, PowerPreference, WorldConfig};
    pub use crate::descriptor::ElementDescriptor;
    pub use crate::error::{FieldError, Result};
    pub use crate::grid::{FieldBuffer, GridCount, GridKind, SamplingGrid, Spacing};
    pub use crate::library;
    pub use crate::propagator::{
        FieldSamples, HexagonalLattice, PropagationOptions, Propagator, RectilinearLattice,
        SampleRecord,
    };
    pub use crate::solver::Solver;
    pub use crate::tx_array::TxArray;
    pub use crate::world::World;
    pub use glam::DVec3;
    pub use num_complex::Complex32;
}
