//! Fixed-width transmitter element record.
//!
//! Every element of a transducer array is described by 16 `f32` values. The
//! column order is the wire format shared with every propagation kernel and
//! must not change:
//!
//! ```text
//! col  0..3   position x, y, z            (m)
//! col  3..6   outward normal nx, ny, nz
//! col  6      directivity phase poly c1
//! col  7..10  directivity amplitude poly c0, c1, c2
//! col 10      amplitude ratio setting
//! col 11      phase setting               (rad)
//! col 12..16  reserved (NaN, never read)
//! ```

use std::fmt::Write as _;

use bytemuck::{Pod, Zeroable};

use crate::error::{FieldError, Result};

/// Number of `f32` columns in one element record.
pub const DESCRIPTOR_WIDTH: usize = 16;

/// Number of leading columns that carry meaning (the rest are reserved).
pub const MEANINGFUL_FIELDS: usize = 12;

/// Default directivity amplitude polynomial, tuned to a 40 kHz murata transducer.
pub const DEFAULT_AMPLITUDE_POLY: [f32; 3] = [318.5, -682.4, 461.33];

/// One transmitter element.
///
/// `#[repr(C)]` with only `f32` fields, so a slice of descriptors is a flat
/// `N x 16` matrix that can be uploaded to the device as-is.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct ElementDescriptor {
    /// Element centre (m).
    pub position: [f32; 3],
    /// Outward normal; never the zero vector.
    pub normal: [f32; 3],
    /// Linear coefficient of the directivity phase polynomial.
    pub directivity_phase_c1: f32,
    /// Directivity amplitude polynomial coefficients (c0, c1, c2).
    pub directivity_amplitude: [f32; 3],
    /// Drive amplitude relative to full scale.
    pub amplitude_ratio: f32,
    /// Drive phase (rad). Not normalised.
    pub phase: f32,
    /// Reserved columns, filled with NaN.
    pub reserved: [f32; 4],
}

impl Default for ElementDescriptor {
    fn default() -> Self {
        Self {
            position: [0.0, 0.0, 0.0],
            normal: [0.0, 0.0, 1.0],
            directivity_phase_c1: 0.0,
            directivity_amplitude: DEFAULT_AMPLITUDE_POLY,
            amplitude_ratio: 1.0,
            phase: 0.0,
            reserved: [f32::NAN; 4],
        }
    }
}

impl ElementDescriptor {
    /// Create a descriptor with default settings at the origin, facing +z.
    pub fn new() -> Self {
        Self::default()
    }

    /// All-zero record with a valid +z normal.
    pub fn empty() -> Self {
        let mut d = Self::zeroed();
        d.normal = [0.0, 0.0, 1.0];
        d
    }

    /// Omnidirectional element with unit reference amplitude.
    pub fn omnidirectional() -> Self {
        Self::default()
            .with_directivity_phase(0.0)
            .with_directivity_amplitude(1.0, 0.0, 0.0)
    }

    /// Set the element position (m).
    pub fn with_position(mut self, x: f32, y: f32, z: f32) -> Self {
        self.position = [x, y, z];
        self
    }

    /// Set the outward normal.
    pub fn with_normal(mut self, nx: f32, ny: f32, nz: f32) -> Self {
        self.normal = [nx, ny, nz];
        self
    }

    /// Set the directivity phase polynomial coefficient.
    pub fn with_directivity_phase(mut self, c1: f32) -> Self {
        self.directivity_phase_c1 = c1;
        self
    }

    /// Set the directivity amplitude polynomial coefficients.
    pub fn with_directivity_amplitude(mut self, c0: f32, c1: f32, c2: f32) -> Self {
        self.directivity_amplitude = [c0, c1, c2];
        self
    }

    /// Set the amplitude ratio.
    pub fn with_amplitude_ratio(mut self, ratio: f32) -> Self {
        self.amplitude_ratio = ratio;
        self
    }

    /// Set the drive phase (rad).
    pub fn with_phase(mut self, phase: f32) -> Self {
        self.phase = phase;
        self
    }

    /// Flat 16-column row in wire order.
    pub fn as_row(&self) -> [f32; DESCRIPTOR_WIDTH] {
        bytemuck::cast(*self)
    }

    /// Decode a 16-column row.
    pub fn from_row(row: &[f32]) -> Result<Self> {
        let row: [f32; DESCRIPTOR_WIDTH] = row.try_into().map_err(|_| {
            FieldError::configuration(format!(
                "element row has {} columns, expected {}",
                row.len(),
                DESCRIPTOR_WIDTH
            ))
        })?;
        Ok(bytemuck::cast(row))
    }

    /// Whether the normal is the forbidden zero vector.
    pub fn has_degenerate_normal(&self) -> bool {
        self.normal.iter().all(|c| *c == 0.0)
    }

    /// Whether every meaningful (non-reserved) field is finite.
    pub fn is_finite(&self) -> bool {
        self.as_row()[..MEANINGFUL_FIELDS]
            .iter()
            .all(|v| v.is_finite())
    }

    /// Human-readable multi-line summary, used for debugging.
    pub fn describe(&self, index: usize) -> String {
        let [x, y, z] = self.position;
        let [nx, ny, nz] = self.normal;
        let [a0, a1, a2] = self.directivity_amplitude;
        let [r0, r1, r2, r3] = self.reserved;

        let mut txt = String::new();
        let _ = writeln!(txt, "element {}:", index);
        let _ = writeln!(
            txt,
            " >     location = ({:.1}, {:.1}, {:.1}) mm",
            x * 1e3,
            y * 1e3,
            z * 1e3
        );
        let _ = writeln!(txt, " >       normal = ({}, {}, {})", nx, ny, nz);
        let _ = writeln!(
            txt,
            " >  directivity = (phase_c1: {} | amp: ({}, {}, {}))",
            self.directivity_phase_c1, a0, a1, a2
        );
        let _ = writeln!(txt, " >    amplitude = {}", self.amplitude_ratio);
        let _ = writeln!(txt, " >        phase = {}", self.phase);
        let _ = writeln!(txt, " >     reserved = ({}, {}, {}, {})", r0, r1, r2, r3);
        txt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_descriptor() {
        let d = ElementDescriptor::default();
        assert_eq!(d.position, [0.0, 0.0, 0.0]);
        assert_eq!(d.normal, [0.0, 0.0, 1.0]);
        assert_eq!(d.directivity_amplitude, [318.5, -682.4, 461.33]);
        assert_eq!(d.amplitude_ratio, 1.0);
        assert_eq!(d.phase, 0.0);
        assert!(d.reserved.iter().all(|v| v.is_nan()));
        assert!(!d.has_degenerate_normal());
    }

    #[test]
    fn test_record_layout() {
        assert_eq!(std::mem::size_of::<ElementDescriptor>(), 64);

        let d = ElementDescriptor::new()
            .with_position(1.0, 2.0, 3.0)
            .with_normal(4.0, 5.0, 6.0)
            .with_directivity_phase(7.0)
            .with_directivity_amplitude(8.0, 9.0, 10.0)
            .with_amplitude_ratio(11.0)
            .with_phase(12.0);
        let row = d.as_row();

        for (col, value) in row.iter().take(MEANINGFUL_FIELDS).enumerate() {
            assert_eq!(*value, (col + 1) as f32, "column {}", col);
        }
        assert!(row[12..].iter().all(|v| v.is_nan()));
    }

    #[test]
    fn test_from_row_width_mismatch() {
        let err = ElementDescriptor::from_row(&[0.0; 15]).unwrap_err();
        assert!(err.is_configuration());

        let d = ElementDescriptor::from_row(&ElementDescriptor::default().as_row()).unwrap();
        assert_eq!(d.normal, [0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_empty_and_omnidirectional() {
        let e = ElementDescriptor::empty();
        assert_eq!(e.normal, [0.0, 0.0, 1.0]);
        assert_eq!(e.directivity_amplitude, [0.0, 0.0, 0.0]);
        assert_eq!(e.reserved, [0.0; 4]);

        let o = ElementDescriptor::omnidirectional();
        assert_eq!(o.directivity_phase_c1, 0.0);
        assert_eq!(o.directivity_amplitude, [1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_describe_renders_all_fields() {
        let d = ElementDescriptor::new()
            .with_position(0.0125, -0.0105, 0.002)
            .with_normal(0.0, 0.5, 0.75)
            .with_directivity_phase(0.25)
            .with_directivity_amplitude(318.5, -682.4, 461.33)
            .with_amplitude_ratio(0.5)
            .with_phase(1.5);

        let text = d.describe(3);
        assert!(text.starts_with("element 3:"));
        assert!(text.contains("(12.5, -10.5, 2.0) mm"));
        assert!(text.contains("(0, 0.5, 0.75)"));
        assert!(text.contains("phase_c1: 0.25"));
        assert!(text.contains("(318.5, -682.4, 461.33)"));
        assert!(text.contains("amplitude = 0.5"));
        assert!(text.contains("phase = 1.5"));
        assert!(text.contains("(NaN, NaN, NaN, NaN)"));
    }

    #[test]
    fn test_is_finite_ignores_reserved() {
        let d = ElementDescriptor::default();
        assert!(d.is_finite());
        assert!(!d.with_phase(f32::INFINITY).is_finite());
    }
}
