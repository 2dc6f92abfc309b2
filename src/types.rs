//! Core data types for sqeazy volumes

use crate::error::{Result, SqyError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Bytes per decoded voxel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ElementWidth {
    /// 8-bit samples
    U8 = 1,
    /// 16-bit samples
    U16 = 2,
}

impl ElementWidth {
    /// Map a codec-reported element size onto a supported width
    pub fn from_size(size: usize) -> Result<Self> {
        match size {
            1 => Ok(ElementWidth::U8),
            2 => Ok(ElementWidth::U16),
            other => Err(SqyError::UnsupportedElementWidth(other)),
        }
    }

    /// Size in bytes of one sample
    pub fn size_in_bytes(&self) -> usize {
        *self as usize
    }

    pub fn bits(&self) -> u32 {
        self.size_in_bytes() as u32 * 8
    }

    pub fn pixel_type(&self) -> PixelType {
        match self {
            ElementWidth::U8 => PixelType::Uint8,
            ElementWidth::U16 => PixelType::Uint16,
        }
    }
}

impl fmt::Display for ElementWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.pixel_type())
    }
}

/// Pixel type as exposed to generic image metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PixelType {
    Uint8,
    Uint16,
}

impl fmt::Display for PixelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PixelType::Uint8 => f.write_str("uint8"),
            PixelType::Uint16 => f.write_str("uint16"),
        }
    }
}

/// Spatial extent of a volume, fastest-varying axis last
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shape {
    dims: Vec<usize>,
}

impl Shape {
    /// Build a shape from codec output; rank must be 2 or 3 and every extent positive
    pub fn new(dims: Vec<usize>) -> Result<Self> {
        if dims.len() != 2 && dims.len() != 3 {
            return Err(SqyError::UnsupportedRank(dims.len()));
        }
        if let Some(axis) = dims.iter().position(|&d| d == 0) {
            return Err(SqyError::InvalidShape(format!(
                "axis {} of {:?} has zero extent",
                axis, dims
            )));
        }
        Ok(Self { dims })
    }

    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    pub fn size_x(&self) -> usize {
        self.dims[self.rank() - 1]
    }

    pub fn size_y(&self) -> usize {
        self.dims[self.rank() - 2]
    }

    /// Depth; 1 for rank-2 volumes
    pub fn size_z(&self) -> usize {
        if self.rank() == 3 {
            self.dims[0]
        } else {
            1
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dims = self
            .dims
            .iter()
            .map(|d| d.to_string())
            .collect::<Vec<_>>()
            .join(" x ");
        f.write_str(&dims)
    }
}
