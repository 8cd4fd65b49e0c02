//! # phasefield-cpu
//!
//! Host reference implementation of the [`Propagator`](phasefield_core::Propagator)
//! contract. Always available; used as the fallback when no GPU adapter is
//! found and as the ground truth GPU results are checked against.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod kernel;
mod propagator;

pub use propagator::CpuPropagator;
