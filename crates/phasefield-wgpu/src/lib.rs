//! # phasefield-wgpu
//!
//! WebGPU backend for phasefield.
//!
//! Propagation kernels are written in WGSL and run through wgpu, so the same
//! code targets Vulkan, Metal, DX12 and WebGPU. A [`ComputeContext`] owns the
//! adapter, device and queue; a [`WgpuPropagator`] compiles one pipeline per
//! kernel family on that context.
//!
//! ```ignore
//! use std::sync::Arc;
//! use phasefield_core::config::DeviceConfig;
//! use phasefield_wgpu::{ComputeContext, WgpuPropagator};
//!
//! let context = ComputeContext::new(&DeviceConfig::default()).await?;
//! let propagator = WgpuPropagator::new(Arc::new(context))?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod context;
mod propagator;
pub mod shader;

pub use context::{enumerate_adapters, is_available, AdapterSummary, ComputeContext};
pub use propagator::WgpuPropagator;
