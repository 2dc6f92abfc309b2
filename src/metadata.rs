//! Per-stream metadata and its lifecycle

use crate::error::{ContractViolation, Result};
use crate::header::ContainerHeader;
use crate::materialize::MaterializedVolume;
use crate::types::PixelType;
use serde::Serialize;

/// Generic image metadata handed to the host framework
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageMetadata {
    /// Axes spanned by one plane (X and Y)
    pub planar_axis_count: usize,
    /// Axis lengths in X, Y, Z order
    pub axis_lengths: [usize; 3],
    pub pixel_type: PixelType,
    pub bits_per_pixel: u32,
    pub order_certain: bool,
    /// Kept `true` for compatibility with files written on x86, even though
    /// 16-bit plane bytes are delivered big-endian.
    pub little_endian: bool,
    pub metadata_complete: bool,
}

impl ImageMetadata {
    /// Derive generic metadata from a parsed header
    pub fn from_header(header: &ContainerHeader) -> Self {
        Self {
            planar_axis_count: 2,
            axis_lengths: [header.size_x(), header.size_y(), header.size_z()],
            pixel_type: header.element_width.pixel_type(),
            bits_per_pixel: header.element_width.bits(),
            order_certain: true,
            little_endian: true,
            metadata_complete: true,
        }
    }

    pub fn plane_count(&self) -> usize {
        self.axis_lengths[2]
    }
}

/// Where a stream is in its lifecycle
#[derive(Debug, Clone, Default)]
pub enum VolumeState {
    /// Opened, nothing parsed yet
    #[default]
    Empty,
    /// Header parsed, buffer not yet decoded
    HeaderParsed(ContainerHeader),
    /// Fully decoded
    Materialized(MaterializedVolume),
}

/// Metadata for one opened container.
///
/// Populated monotonically: `Empty` -> `HeaderParsed` -> `Materialized`.
/// `close` returns it to `Empty` and releases the decoded buffer.
#[derive(Debug, Clone)]
pub struct SqyMetadata {
    state: VolumeState,
    decode_threads: usize,
}

impl SqyMetadata {
    /// Create empty metadata carrying the decode thread hint
    pub fn new(decode_threads: usize) -> Self {
        Self {
            state: VolumeState::Empty,
            decode_threads: decode_threads.max(1),
        }
    }

    pub fn state(&self) -> &VolumeState {
        &self.state
    }

    pub fn decode_threads(&self) -> usize {
        self.decode_threads
    }

    pub fn set_decode_threads(&mut self, threads: usize) {
        self.decode_threads = threads.max(1);
    }

    /// Parsed header, available once past `Empty`
    pub fn header(&self) -> Option<&ContainerHeader> {
        match &self.state {
            VolumeState::Empty => None,
            VolumeState::HeaderParsed(header) => Some(header),
            VolumeState::Materialized(volume) => Some(volume.header()),
        }
    }

    pub fn is_materialized(&self) -> bool {
        matches!(self.state, VolumeState::Materialized(_))
    }

    /// The decoded volume, or `NotMaterialized`
    pub fn volume(&self) -> Result<&MaterializedVolume> {
        match &self.state {
            VolumeState::Materialized(volume) => Ok(volume),
            _ => Err(ContractViolation::NotMaterialized.into()),
        }
    }

    pub fn size_x(&self) -> usize {
        self.header().map_or(0, |h| h.size_x())
    }

    pub fn size_y(&self) -> usize {
        self.header().map_or(0, |h| h.size_y())
    }

    pub fn size_z(&self) -> usize {
        self.header().map_or(0, |h| h.size_z())
    }

    /// Element width in bytes; 0 before parsing
    pub fn element_width(&self) -> usize {
        self.header()
            .map_or(0, |h| h.element_width.size_in_bytes())
    }

    /// Generic image metadata, available once the header is parsed
    pub fn image_metadata(&self) -> Option<ImageMetadata> {
        self.header().map(ImageMetadata::from_header)
    }

    /// `Empty` -> `HeaderParsed`; any other state is left untouched
    pub(crate) fn set_header(&mut self, header: ContainerHeader) -> Result<()> {
        match self.state {
            VolumeState::Empty => {
                self.state = VolumeState::HeaderParsed(header);
                Ok(())
            }
            _ => Err(ContractViolation::AlreadyParsed.into()),
        }
    }

    /// `HeaderParsed` -> `Materialized`
    pub(crate) fn set_volume(&mut self, volume: MaterializedVolume) -> Result<()> {
        match self.state {
            VolumeState::HeaderParsed(_) => {
                self.state = VolumeState::Materialized(volume);
                Ok(())
            }
            VolumeState::Empty => Err(ContractViolation::HeaderNotParsed.into()),
            VolumeState::Materialized(_) => Err(ContractViolation::AlreadyParsed.into()),
        }
    }

    /// Release the decoded buffer and reset every field
    pub fn close(&mut self) {
        self.state = VolumeState::Empty;
    }
}
