//! Point-source model evaluated in double precision.

use std::f64::consts::TAU;

use glam::DVec3;
use num_complex::Complex64;

use phasefield_core::ElementDescriptor;

/// Distance below which a source does not contribute to a sample.
pub const MIN_DISTANCE: f64 = 1e-9;

/// One element, widened to f64 with a unit normal.
#[derive(Debug, Clone, Copy)]
pub struct Source {
    position: DVec3,
    normal: DVec3,
    phase_c1: f64,
    amplitude_poly: [f64; 3],
    amplitude_ratio: f64,
    phase: f64,
}

impl Source {
    /// Widen a descriptor. The normal must be non-zero.
    pub fn from_descriptor(d: &ElementDescriptor) -> Self {
        let [x, y, z] = d.position.map(f64::from);
        let [nx, ny, nz] = d.normal.map(f64::from);
        Self {
            position: DVec3::new(x, y, z),
            normal: DVec3::new(nx, ny, nz).normalize(),
            phase_c1: d.directivity_phase_c1 as f64,
            amplitude_poly: d.directivity_amplitude.map(f64::from),
            amplitude_ratio: d.amplitude_ratio as f64,
            phase: d.phase as f64,
        }
    }

    /// Element centre.
    pub fn position(&self) -> DVec3 {
        self.position
    }

    /// `sin θ` between the normal and the direction to `point`, with the
    /// distance to it. `None` when the point coincides with the source.
    fn geometry(&self, point: DVec3) -> Option<(f64, f64)> {
        let d = point - self.position;
        let r = d.length();
        if r < MIN_DISTANCE {
            return None;
        }
        let cos = self.normal.dot(d) / r;
        Some(((1.0 - cos * cos).max(0.0).sqrt(), r))
    }

    fn directivity_amplitude(&self, sin: f64) -> f64 {
        let [a0, a1, a2] = self.amplitude_poly;
        a0 + a1 * sin + a2 * sin * sin
    }

    fn directivity_phase(&self, sin: f64) -> f64 {
        self.phase_c1 * sin
    }

    /// Complex pressure this source produces at `point`.
    pub fn pressure_at(&self, point: DVec3, wavenumber: f64) -> Complex64 {
        match self.geometry(point) {
            Some((sin, r)) => {
                let magnitude = self.amplitude_ratio * self.directivity_amplitude(sin) / r;
                let phase = self.phase + self.directivity_phase(sin) - wavenumber * r;
                Complex64::from_polar(magnitude, phase)
            }
            None => Complex64::new(0.0, 0.0),
        }
    }

    /// Drive phase in `[0, 2π)` that brings this source's wave to `focus`
    /// with zero phase.
    pub fn focus_phase(&self, focus: DVec3, wavenumber: f64) -> f64 {
        match self.geometry(focus) {
            Some((sin, r)) => (wavenumber * r - self.directivity_phase(sin)).rem_euclid(TAU),
            None => 0.0,
        }
    }
}

/// Superposed pressure of all sources at `point`.
pub fn superpose(sources: &[Source], point: DVec3, wavenumber: f64) -> Complex64 {
    sources
        .iter()
        .map(|s| s.pressure_at(point, wavenumber))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_on_axis_amplitude() {
        let source = Source::from_descriptor(&ElementDescriptor::new());
        let p = source.pressure_at(DVec3::new(0.0, 0.0, 0.2), 0.0);
        assert!((p.norm() - 318.5 / 0.2).abs() < 1e-9);
        assert!(p.im.abs() < 1e-9);
    }

    #[test]
    fn test_broadside_uses_full_polynomial() {
        let source = Source::from_descriptor(&ElementDescriptor::new());
        let p = source.pressure_at(DVec3::new(1.0, 0.0, 0.0), 0.0);
        let expected = 318.5f32 as f64 - 682.4f32 as f64 + 461.33f32 as f64;
        assert!((p.re - expected).abs() < 1e-9);
    }

    #[test]
    fn test_coincident_point_is_skipped() {
        let source = Source::from_descriptor(&ElementDescriptor::new());
        assert_eq!(source.pressure_at(DVec3::ZERO, 100.0), Complex64::new(0.0, 0.0));
        assert_eq!(source.focus_phase(DVec3::ZERO, 100.0), 0.0);
    }

    #[test]
    fn test_focus_phase_cancels_path() {
        let k = 732.0;
        let descriptor = ElementDescriptor::new()
            .with_position(0.01, -0.02, 0.0)
            .with_directivity_phase(0.3);
        let mut source = Source::from_descriptor(&descriptor);
        let focus = DVec3::new(0.0, 0.0, 0.1);
        source.phase = source.focus_phase(focus, k);

        assert!((0.0..TAU).contains(&source.phase));
        let p = source.pressure_at(focus, k);
        assert!(p.arg().abs() < 1e-9);
    }
}
