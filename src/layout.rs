//! Plane layout - byte windows into a flattened decoded volume

use crate::error::{ContractViolation, Result, SqyError};
use crate::types::{ElementWidth, Shape};
use serde::Serialize;
use std::ops::Range;

/// How a decoded volume is laid out in memory: planes of `size_x * size_y`
/// samples stacked along Z, X varying fastest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlaneLayout {
    pub size_x: usize,
    pub size_y: usize,
    pub size_z: usize,
    pub element_width: ElementWidth,
    plane_bytes: usize,
    total_bytes: usize,
}

impl PlaneLayout {
    /// Create a layout, rejecting shapes whose byte size overflows `usize`
    pub fn new(shape: &Shape, element_width: ElementWidth) -> Result<Self> {
        let (size_x, size_y, size_z) = (shape.size_x(), shape.size_y(), shape.size_z());

        let plane_bytes = size_x
            .checked_mul(size_y)
            .and_then(|n| n.checked_mul(element_width.size_in_bytes()))
            .ok_or_else(|| SqyError::InvalidShape(format!("plane of {} overflows", shape)))?;
        let total_bytes = plane_bytes
            .checked_mul(size_z)
            .ok_or_else(|| SqyError::InvalidShape(format!("volume of {} overflows", shape)))?;

        Ok(Self {
            size_x,
            size_y,
            size_z,
            element_width,
            plane_bytes,
            total_bytes,
        })
    }

    /// Number of planes; channel and time axes are fixed at 1
    pub fn plane_count(&self) -> usize {
        self.size_z
    }

    /// Samples per plane
    pub fn plane_size(&self) -> usize {
        self.size_x * self.size_y
    }

    /// Bytes per plane
    pub fn plane_bytes(&self) -> usize {
        self.plane_bytes
    }

    /// Bytes in the whole decoded volume
    pub fn total_bytes(&self) -> usize {
        self.total_bytes
    }

    pub fn is_in_bounds(&self, plane: usize) -> bool {
        plane < self.plane_count()
    }

    /// Byte window of `plane` inside the decoded buffer
    pub fn plane_range(&self, plane: usize) -> Result<Range<usize>> {
        if !self.is_in_bounds(plane) {
            return Err(ContractViolation::PlaneOutOfRange {
                index: plane,
                count: self.plane_count(),
            }
            .into());
        }
        let start = plane * self.plane_bytes;
        Ok(start..start + self.plane_bytes)
    }

    /// Get a summary string of the layout
    pub fn summary(&self) -> String {
        format!(
            "{} x {} x {} ({}), {} planes of {}, {} decoded",
            self.size_x,
            self.size_y,
            self.size_z,
            self.element_width,
            self.plane_count(),
            crate::utils::format_bytes(self.plane_bytes),
            crate::utils::format_bytes(self.total_bytes),
        )
    }
}
