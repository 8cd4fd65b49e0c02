//! Error types for phasefield.

use thiserror::Error;

/// Result type for phasefield operations.
pub type Result<T> = std::result::Result<T, FieldError>;

/// Errors that can occur while building arrays and grids or running kernels.
#[derive(Error, Debug)]
pub enum FieldError {
    /// Malformed grid geometry or configuration.
    ///
    /// Raised at construction time; the object being built is never created.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Element index outside `[0, len)`.
    #[error("Element index {index} out of range for array of {len} elements")]
    IndexOutOfRange {
        /// Requested index.
        index: usize,
        /// Number of elements in the array.
        len: usize,
    },

    /// Kernel invocation failure (invalid input, device error, transfer error).
    #[error("Compute error: {0}")]
    Compute(String),

    /// No usable compute backend.
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    /// Configuration text could not be parsed.
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

impl FieldError {
    /// Create a configuration error.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create a compute error.
    pub fn compute(msg: impl Into<String>) -> Self {
        Self::Compute(msg.into())
    }

    /// Create a backend unavailable error.
    pub fn backend_unavailable(msg: impl Into<String>) -> Self {
        Self::BackendUnavailable(msg.into())
    }

    /// Check if this is a configuration error.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_) | Self::ConfigParse(_))
    }

    /// Check if this is a compute error.
    pub fn is_compute(&self) -> bool {
        matches!(self, Self::Compute(_))
    }
}
