//! World configuration: propagation medium, backend and device selection.
//!
//! Configuration is plain data with serde support so that applications can
//! keep it in a TOML file:
//!
//! ```toml
//! backend = "wgpu"
//!
//! [medium]
//! frequency_hz = 40000.0
//! speed_of_sound = 343.0
//!
//! [device]
//! adapter_index = 0
//! power_preference = "high_performance"
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{FieldError, Result};

/// Compute backend used to run propagation kernels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    /// Pick the best available backend (WebGPU, then CPU).
    #[default]
    Auto,
    /// Host reference implementation.
    Cpu,
    /// WebGPU compute shaders.
    Wgpu,
}

/// GPU power preference when choosing an adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerPreference {
    /// Prefer a discrete GPU.
    #[default]
    HighPerformance,
    /// Prefer an integrated GPU.
    LowPower,
}

/// Device selection. Opaque to the core; consumed by GPU backends.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Explicit adapter index from enumeration order, or `None` to let the
    /// backend pick by power preference.
    pub adapter_index: Option<usize>,
    /// Power preference for automatic selection.
    pub power_preference: PowerPreference,
}

/// Propagation medium.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Medium {
    /// Drive frequency in Hz.
    pub frequency_hz: f64,
    /// Speed of sound in m/s (343 m/s in air at 20°C).
    pub speed_of_sound: f64,
}

impl Default for Medium {
    fn default() -> Self {
        Self::air(40_000.0)
    }
}

impl Medium {
    /// Create a medium.
    pub fn new(frequency_hz: f64, speed_of_sound: f64) -> Self {
        Self {
            frequency_hz,
            speed_of_sound,
        }
    }

    /// Air at 20°C driven at `frequency_hz`.
    pub fn air(frequency_hz: f64) -> Self {
        Self::new(frequency_hz, 343.0)
    }

    /// Wavelength in the medium (m).
    pub fn wavelength(&self) -> f64 {
        self.speed_of_sound / self.frequency_hz
    }

    /// Angular wavenumber `2π / λ` (rad/m).
    pub fn wavenumber(&self) -> f64 {
        std::f64::consts::TAU / self.wavelength()
    }

    /// Check that frequency and speed are positive and finite.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("frequency_hz", self.frequency_hz),
            ("speed_of_sound", self.speed_of_sound),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(FieldError::configuration(format!(
                    "medium {} must be positive and finite, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

/// Top-level configuration of a [`World`](crate::world::World).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Propagation medium.
    pub medium: Medium,
    /// Backend to build.
    pub backend: Backend,
    /// Device selection for GPU backends.
    pub device: DeviceConfig,
}

impl WorldConfig {
    /// Create the default configuration (40 kHz in air, automatic backend).
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Set the medium.
    pub fn with_medium(mut self, medium: Medium) -> Self {
        self.medium = medium;
        self
    }

    /// Set the backend.
    pub fn with_backend(mut self, backend: Backend) -> Self {
        self.backend = backend;
        self
    }

    /// Select an adapter by index.
    pub fn with_adapter_index(mut self, index: usize) -> Self {
        self.device.adapter_index = Some(index);
        self
    }

    /// Set the adapter power preference.
    pub fn with_power_preference(mut self, preference: PowerPreference) -> Self {
        self.device.power_preference = preference;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        self.medium.validate()
    }
}
