//! WebGPU device context.

use std::sync::Arc;

use phasefield_core::config::{DeviceConfig, PowerPreference};
use phasefield_core::error::{FieldError, Result};

/// Adapter, device and queue shared by every kernel of a propagator.
///
/// Created once and passed explicitly to [`WgpuPropagator`](crate::WgpuPropagator);
/// there is no process-wide device.
pub struct ComputeContext {
    adapter: wgpu::Adapter,
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    info: wgpu::AdapterInfo,
}

impl ComputeContext {
    /// Open a device according to `config`.
    pub async fn new(config: &DeviceConfig) -> Result<Self> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = match config.adapter_index {
            Some(index) => {
                let mut adapters = instance.enumerate_adapters(wgpu::Backends::all());
                let count = adapters.len();
                if index >= count {
                    return Err(FieldError::backend_unavailable(format!(
                        "adapter index {} requested but only {} adapters found",
                        index, count
                    )));
                }
                adapters.swap_remove(index)
            }
            None => instance
                .request_adapter(&wgpu::RequestAdapterOptions {
                    power_preference: power_preference(config.power_preference),
                    compatible_surface: None,
                    force_fallback_adapter: false,
                })
                .await
                .ok_or_else(|| FieldError::backend_unavailable("No WebGPU adapter found"))?,
        };

        let info = adapter.get_info();

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Phasefield Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: adapter.limits(),
                },
                None,
            )
            .await
            .map_err(|e| {
                FieldError::backend_unavailable(format!("Failed to create device: {}", e))
            })?;

        tracing::info!(
            "Created WebGPU context: {} ({:?}, {:?})",
            info.name,
            info.backend,
            info.device_type
        );

        Ok(Self {
            adapter,
            device: Arc::new(device),
            queue: Arc::new(queue),
            info,
        })
    }

    /// Blocking variant of [`ComputeContext::new`].
    pub fn new_blocking(config: &DeviceConfig) -> Result<Self> {
        futures::executor::block_on(Self::new(config))
    }

    /// Adapter name.
    pub fn name(&self) -> &str {
        &self.info.name
    }

    /// Graphics API backing the adapter.
    pub fn backend(&self) -> wgpu::Backend {
        self.info.backend
    }

    /// Kind of device (discrete, integrated, CPU, ...).
    pub fn device_type(&self) -> wgpu::DeviceType {
        self.info.device_type
    }

    /// The adapter the device was opened on.
    pub fn adapter(&self) -> &wgpu::Adapter {
        &self.adapter
    }

    /// The device.
    pub fn device(&self) -> &Arc<wgpu::Device> {
        &self.device
    }

    /// The command queue.
    pub fn queue(&self) -> &Arc<wgpu::Queue> {
        &self.queue
    }

    /// Device limits.
    pub fn limits(&self) -> wgpu::Limits {
        self.device.limits()
    }

    /// Block until all submitted work has finished.
    pub fn wait_idle(&self) -> wgpu::MaintainResult {
        self.device.poll(wgpu::Maintain::Wait)
    }
}

impl std::fmt::Debug for ComputeContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComputeContext")
            .field("name", &self.info.name)
            .field("backend", &self.info.backend)
            .field("device_type", &self.info.device_type)
            .finish()
    }
}

fn power_preference(preference: PowerPreference) -> wgpu::PowerPreference {
    match preference {
        PowerPreference::HighPerformance => wgpu::PowerPreference::HighPerformance,
        PowerPreference::LowPower => wgpu::PowerPreference::LowPower,
    }
}

/// Enumerate adapters in the order `DeviceConfig::adapter_index` refers to.
pub fn enumerate_adapters() -> Vec<AdapterSummary> {
    let instance = wgpu::Instance::new(wgpu::InstanceDescriptor::default());

    instance
        .enumerate_adapters(wgpu::Backends::all())
        .into_iter()
        .enumerate()
        .map(|(index, adapter)| {
            let info = adapter.get_info();
            AdapterSummary {
                index,
                name: info.name,
                backend: info.backend,
                device_type: info.device_type,
            }
        })
        .collect()
}

/// Whether any WebGPU adapter can be opened.
pub fn is_available() -> bool {
    let instance = wgpu::Instance::new(wgpu::InstanceDescriptor::default());
    futures::executor::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions::default()))
        .is_some()
}

/// Information about a WebGPU adapter.
#[derive(Debug, Clone)]
pub struct AdapterSummary {
    /// Position in enumeration order.
    pub index: usize,
    /// Adapter name.
    pub name: String,
    /// Backend type (Vulkan, Metal, DX12, etc.).
    pub backend: wgpu::Backend,
    /// Device type (discrete GPU, integrated, etc.).
    pub device_type: wgpu::DeviceType,
}
