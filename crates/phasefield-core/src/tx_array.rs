//! Transmitter array: an ordered table of element descriptors.

use std::f32::consts::PI;
use std::fmt;

use crate::descriptor::{ElementDescriptor, DESCRIPTOR_WIDTH};
use crate::error::{FieldError, Result};

const DEFAULT_NAME: &str = "default single-element array";

/// Ordered collection of transmitter elements.
///
/// Insertion order is the element index used by every kernel and pattern
/// operation. The array owns no device resources; kernels receive it by
/// reference for the duration of a call.
#[derive(Debug, Clone)]
pub struct TxArray {
    name: String,
    elements: Vec<ElementDescriptor>,
}

impl Default for TxArray {
    fn default() -> Self {
        Self::new()
    }
}

impl TxArray {
    /// Create an array holding exactly one default element.
    pub fn new() -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            elements: vec![ElementDescriptor::default()],
        }
    }

    /// Create a named array from existing descriptors.
    pub fn with_elements(name: impl Into<String>, elements: Vec<ElementDescriptor>) -> Self {
        Self {
            name: name.into(),
            elements,
        }
    }

    /// Decode a flat `N x 16` table.
    pub fn from_table(name: impl Into<String>, table: &[f32]) -> Result<Self> {
        if table.len() % DESCRIPTOR_WIDTH != 0 {
            return Err(FieldError::configuration(format!(
                "element table length {} is not a multiple of {}",
                table.len(),
                DESCRIPTOR_WIDTH
            )));
        }
        let elements = table
            .chunks_exact(DESCRIPTOR_WIDTH)
            .map(ElementDescriptor::from_row)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::with_elements(name, elements))
    }

    /// Array name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the array.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Number of elements.
    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    /// Whether the array has no elements.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Append an element; it receives the next index.
    pub fn append(&mut self, descriptor: ElementDescriptor) {
        self.elements.push(descriptor);
    }

    /// Replace the element at `index`.
    pub fn set(&mut self, index: usize, descriptor: ElementDescriptor) -> Result<()> {
        let len = self.elements.len();
        let slot = self
            .elements
            .get_mut(index)
            .ok_or(FieldError::IndexOutOfRange { index, len })?;
        *slot = descriptor;
        Ok(())
    }

    /// Copy of the element at `index`.
    pub fn get(&self, index: usize) -> Result<ElementDescriptor> {
        self.elements
            .get(index)
            .copied()
            .ok_or(FieldError::IndexOutOfRange {
                index,
                len: self.elements.len(),
            })
    }

    /// Iterate over elements in index order.
    pub fn iter(&self) -> impl Iterator<Item = &ElementDescriptor> {
        self.elements.iter()
    }

    /// Element descriptors as a slice.
    pub fn elements(&self) -> &[ElementDescriptor] {
        &self.elements
    }

    /// Mutable element descriptors.
    pub fn elements_mut(&mut self) -> &mut [ElementDescriptor] {
        &mut self.elements
    }

    /// Flat `N x 16` view of the descriptor table (no copy).
    pub fn as_table(&self) -> &[f32] {
        bytemuck::cast_slice(&self.elements)
    }

    /// Add π to the phase of every element with x > 0.
    ///
    /// Phases are not wrapped into `[0, 2π)`.
    pub fn apply_x_split_phase_flip(&mut self) {
        for element in self.elements.iter_mut().filter(|e| e.position[0] > 0.0) {
            element.phase += PI;
        }
    }

    /// Add π to the phase of every element with y > 0.
    pub fn apply_y_split_phase_flip(&mut self) {
        for element in self.elements.iter_mut().filter(|e| e.position[1] > 0.0) {
            element.phase += PI;
        }
    }

    /// Overwrite the directivity amplitude polynomial of every element.
    pub fn set_directivity_coefficients(&mut self, c0: f32, c1: f32, c2: f32) {
        for element in &mut self.elements {
            element.directivity_amplitude = [c0, c1, c2];
        }
    }

    /// Make every element omnidirectional with unit reference amplitude.
    pub fn set_omnidirectional(&mut self) {
        self.set_directivity_coefficients(1.0, 0.0, 0.0);
        for element in &mut self.elements {
            element.directivity_phase_c1 = 0.0;
        }
    }

    /// Debug summary of one element.
    pub fn describe_element(&self, index: usize) -> Result<String> {
        Ok(self.get(index)?.describe(index))
    }

    /// Name and element count.
    pub fn summary(&self) -> String {
        format!("{} ({} elements)", self.name, self.elements.len())
    }
}

impl fmt::Display for TxArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
