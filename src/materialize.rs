//! Volume materialization - the one-time full decode of a container

use crate::codec::SqyCodec;
use crate::error::{Result, SqyError};
use crate::header::ContainerHeader;
use crate::io::read_all;
use crate::layout::PlaneLayout;
use crate::types::ElementWidth;
use crate::utils::{be_bytes_to_samples, samples_to_be_bytes};
use bytes::Bytes;
use ndarray::Array3;
use std::io::{Read, Seek};
use tracing::{info, warn};

/// A fully decoded volume. The buffer is immutable once built and holds
/// exactly `layout.total_bytes()` bytes; 16-bit samples are big-endian.
#[derive(Debug, Clone)]
pub struct MaterializedVolume {
    header: ContainerHeader,
    data: Bytes,
}

impl MaterializedVolume {
    pub fn header(&self) -> &ContainerHeader {
        &self.header
    }

    pub fn layout(&self) -> &PlaneLayout {
        &self.header.layout
    }

    /// The whole decoded buffer
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Cheap shared handle to the decoded buffer
    pub fn bytes(&self) -> Bytes {
        self.data.clone()
    }

    /// Borrow the bytes of one plane without copying
    pub fn plane(&self, plane: usize) -> Result<&[u8]> {
        let range = self.layout().plane_range(plane)?;
        Ok(&self.data[range])
    }

    /// View an 8-bit volume as a `[z, y, x]` array
    pub fn to_array_u8(&self) -> Result<Array3<u8>> {
        if self.header.element_width != ElementWidth::U8 {
            return Err(SqyError::UnsupportedElementWidth(
                self.header.element_width.size_in_bytes(),
            ));
        }
        Array3::from_shape_vec(self.dims(), self.data.to_vec())
            .map_err(|e| SqyError::InvalidShape(e.to_string()))
    }

    /// View a 16-bit volume as a `[z, y, x]` array of decoded samples
    pub fn to_array_u16(&self) -> Result<Array3<u16>> {
        if self.header.element_width != ElementWidth::U16 {
            return Err(SqyError::UnsupportedElementWidth(
                self.header.element_width.size_in_bytes(),
            ));
        }
        let samples = be_bytes_to_samples(&self.data)?;
        Array3::from_shape_vec(self.dims(), samples)
            .map_err(|e| SqyError::InvalidShape(e.to_string()))
    }

    fn dims(&self) -> (usize, usize, usize) {
        let layout = self.layout();
        (layout.size_z, layout.size_y, layout.size_x)
    }
}

/// Decode the entire container behind `stream`.
///
/// The codec receives the raw container bytes, header included. On a
/// non-zero decode status nothing is retained.
pub fn materialize<S, C>(
    codec: &C,
    header: ContainerHeader,
    decode_threads: usize,
    stream: &mut S,
) -> Result<MaterializedVolume>
where
    S: Read + Seek,
    C: SqyCodec + ?Sized,
{
    let total_bytes = header.layout.total_bytes();
    let source = read_all(stream)?;
    let width = header.element_width;

    let data = match width {
        ElementWidth::U8 => {
            let mut dst = alloc_samples::<u8>(total_bytes, &header)?;
            codec
                .decode_u8(&source, &mut dst, decode_threads)
                .map_err(|status| decode_failed(width, status.code()))?;
            dst
        }
        ElementWidth::U16 => {
            let mut samples = alloc_samples::<u16>(total_bytes / 2, &header)?;
            codec
                .decode_u16(&source, &mut samples, decode_threads)
                .map_err(|status| decode_failed(width, status.code()))?;
            samples_to_be_bytes(&samples)
        }
    };
    debug_assert_eq!(data.len(), total_bytes);

    info!(
        shape = %header.shape,
        %width,
        source_bytes = source.len(),
        decoded = %crate::utils::format_bytes(total_bytes),
        codec = codec.name(),
        "materialized volume"
    );

    Ok(MaterializedVolume {
        header,
        data: Bytes::from(data),
    })
}

/// Zeroed destination buffer. A declared shape larger than the host can
/// allocate is reported as an invalid shape instead of aborting.
fn alloc_samples<T: Copy + Default>(len: usize, header: &ContainerHeader) -> Result<Vec<T>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len).map_err(|e| {
        warn!(shape = %header.shape, len, "cannot allocate decode buffer");
        SqyError::InvalidShape(format!(
            "{} {} volume needs {}: {}",
            header.shape,
            header.element_width,
            crate::utils::format_bytes(header.layout.total_bytes()),
            e
        ))
    })?;
    buf.resize(len, T::default());
    Ok(buf)
}

fn decode_failed(width: ElementWidth, status: i32) -> SqyError {
    warn!(%width, status, "decode failed, discarding buffer");
    SqyError::Decode {
        width: width.size_in_bytes(),
        status,
    }
}
