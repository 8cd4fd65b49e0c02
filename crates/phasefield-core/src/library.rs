//! Ready-made array layouts.

use crate::descriptor::ElementDescriptor;
use crate::tx_array::TxArray;

/// Centre-to-centre spacing of 10 mm transducers in a packed flat array (m).
pub const DEFAULT_PITCH: f32 = 10.5e-3;

/// Flat `rows x cols` array in the z = 0 plane, centred on the origin.
///
/// Elements face +z and are ordered row by row, x varying fastest.
pub fn rectilinear(rows: usize, cols: usize, pitch: f32) -> TxArray {
    let x0 = (cols.saturating_sub(1)) as f32 * pitch / 2.0;
    let y0 = (rows.saturating_sub(1)) as f32 * pitch / 2.0;

    let elements = (0..rows)
        .flat_map(|row| (0..cols).map(move |col| (row, col)))
        .map(|(row, col)| {
            ElementDescriptor::new().with_position(
                col as f32 * pitch - x0,
                row as f32 * pitch - y0,
                0.0,
            )
        })
        .collect();

    TxArray::with_elements(format!("rectilinear {}x{} array", rows, cols), elements)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rectilinear_layout() {
        let array = rectilinear(2, 3, 0.01);
        assert_eq!(array.element_count(), 6);
        assert_eq!(array.name(), "rectilinear 2x3 array");

        let first = array.get(0).unwrap();
        assert!((first.position[0] + 0.01).abs() < 1e-7);
        assert!((first.position[1] + 0.005).abs() < 1e-7);

        let second = array.get(1).unwrap();
        assert!(second.position[0].abs() < 1e-7);

        let last = array.get(5).unwrap();
        assert!((last.position[0] - 0.01).abs() < 1e-7);
        assert!((last.position[1] - 0.005).abs() < 1e-7);
    }

    #[test]
    fn test_rectilinear_is_centred() {
        let array = rectilinear(16, 16, DEFAULT_PITCH);
        let (sx, sy) = array.iter().fold((0.0f32, 0.0f32), |(sx, sy), e| {
            (sx + e.position[0], sy + e.position[1])
        });
        assert!(sx.abs() < 1e-4);
        assert!(sy.abs() < 1e-4);
        assert!(array.iter().all(|e| e.normal == [0.0, 0.0, 1.0]));
    }
}
