//! Codec primitives consumed by the reader, and a local reference implementation

use flate2::read::DeflateDecoder;
use serde::Deserialize;
use std::io::Read;
use tracing::trace;

/// Non-zero status returned by a codec primitive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecStatus(pub i32);

impl CodecStatus {
    pub fn code(&self) -> i32 {
        self.0
    }
}

/// Outcome of a codec primitive; `Err` carries the failing status
pub type CodecResult<T> = std::result::Result<T, CodecStatus>;

/// The decoding primitives of a sqeazy codec.
///
/// Implementations may wrap a native library or decode in Rust. Every call
/// receives its own buffer; no state is shared between calls.
pub trait SqyCodec: Send + Sync {
    /// Probe a raw prefix for a header. `Ok(0)` means no header was found.
    fn header_size(&self, prefix: &[u8]) -> CodecResult<usize>;

    /// Bytes per decoded element
    fn decoded_element_size(&self, header: &[u8]) -> CodecResult<usize>;

    /// Number of spatial dimensions
    fn decoded_rank(&self, header: &[u8]) -> CodecResult<usize>;

    /// Fill `shape` (pre-sized to the rank) with extents, fastest-varying last
    fn decoded_shape(&self, header: &[u8], shape: &mut [usize]) -> CodecResult<()>;

    /// Decode a full container of 8-bit samples into `dst`
    fn decode_u8(&self, container: &[u8], dst: &mut [u8], threads: usize) -> CodecResult<()>;

    /// Decode a full container of 16-bit samples into `dst`
    fn decode_u16(&self, container: &[u8], dst: &mut [u16], threads: usize) -> CodecResult<()>;

    /// Compression pipeline recorded in the header, when the codec exposes it
    fn pipeline_name(&self, _header: &[u8]) -> Option<String> {
        None
    }

    /// Codec name for logs
    fn name(&self) -> &'static str;
}

/// Status codes returned by [`ReferenceCodec`]
pub mod status {
    pub const TOO_SHORT: i32 = 1;
    pub const NO_TERMINATOR: i32 = 2;
    pub const MALFORMED_HEADER: i32 = 3;
    pub const UNSUPPORTED_PIPELINE: i32 = 4;
    pub const SIZE_MISMATCH: i32 = 5;
    pub const DECOMPRESSION: i32 = 6;
    pub const DESTINATION_MISMATCH: i32 = 7;
}

/// Byte closing the textual header
pub const HEADER_TERMINATOR: u8 = b'|';

/// Smallest buffer that can hold a header (`{}|`)
pub const MIN_HEADER_BYTES: usize = 3;

/// Pipelines understood by [`ReferenceCodec`]
pub const REFERENCE_PIPELINES: &[&str] = &["raw", "deflate", "zstd"];

#[derive(Debug, Deserialize)]
struct ReferenceHeader {
    pipename: String,
    value_type: String,
    rank: usize,
    shape: Vec<usize>,
}

impl ReferenceHeader {
    fn element_size(&self) -> CodecResult<usize> {
        match self.value_type.as_str() {
            "uint8" | "unsigned char" => Ok(1),
            "uint16" | "unsigned short" => Ok(2),
            "int32" | "uint32" | "float32" => Ok(4),
            "float64" => Ok(8),
            _ => Err(CodecStatus(status::MALFORMED_HEADER)),
        }
    }

    fn decoded_bytes(&self) -> CodecResult<usize> {
        let elements = self
            .shape
            .iter()
            .try_fold(1usize, |acc, &d| acc.checked_mul(d))
            .ok_or(CodecStatus(status::MALFORMED_HEADER))?;
        elements
            .checked_mul(self.element_size()?)
            .ok_or(CodecStatus(status::MALFORMED_HEADER))
    }
}

/// Local codec for containers with a JSON header terminated by `|`, followed
/// by a payload compressed with one of [`REFERENCE_PIPELINES`].
/// 16-bit payload samples are stored little-endian.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReferenceCodec;

impl ReferenceCodec {
    fn terminator(buf: &[u8]) -> CodecResult<usize> {
        if buf.len() < MIN_HEADER_BYTES {
            return Err(CodecStatus(status::TOO_SHORT));
        }
        buf.iter()
            .position(|&b| b == HEADER_TERMINATOR)
            .ok_or(CodecStatus(status::NO_TERMINATOR))
    }

    fn read_header(buf: &[u8]) -> CodecResult<ReferenceHeader> {
        let end = Self::terminator(buf)?;
        serde_json::from_slice(&buf[..end]).map_err(|_| CodecStatus(status::MALFORMED_HEADER))
    }

    /// Drain `decoder`, stopping one byte past `expected` so an oversized
    /// payload is caught without inflating it in full
    fn inflate_bounded<R: Read>(decoder: R, expected: usize) -> CodecResult<Vec<u8>> {
        let mut raw = Vec::new();
        raw.try_reserve_exact(expected)
            .map_err(|_| CodecStatus(status::SIZE_MISMATCH))?;
        decoder
            .take(expected as u64 + 1)
            .read_to_end(&mut raw)
            .map_err(|_| CodecStatus(status::DECOMPRESSION))?;
        Ok(raw)
    }

    fn decompress(container: &[u8], expected_width: usize, dst_bytes: usize) -> CodecResult<Vec<u8>> {
        let header = Self::read_header(container)?;
        if header.element_size()? != expected_width || header.decoded_bytes()? != dst_bytes {
            return Err(CodecStatus(status::DESTINATION_MISMATCH));
        }

        let payload = &container[Self::terminator(container)? + 1..];
        let raw = match header.pipename.as_str() {
            "raw" => payload.to_vec(),
            "deflate" => Self::inflate_bounded(DeflateDecoder::new(payload), dst_bytes)?,
            "zstd" => {
                let decoder = zstd::stream::read::Decoder::new(payload)
                    .map_err(|_| CodecStatus(status::DECOMPRESSION))?;
                Self::inflate_bounded(decoder, dst_bytes)?
            }
            _ => return Err(CodecStatus(status::UNSUPPORTED_PIPELINE)),
        };

        if raw.len() != dst_bytes {
            return Err(CodecStatus(status::SIZE_MISMATCH));
        }
        Ok(raw)
    }
}

fn samples_from_le(out: &mut [u16], raw: &[u8]) {
    for (sample, pair) in out.iter_mut().zip(raw.chunks_exact(2)) {
        *sample = u16::from_le_bytes([pair[0], pair[1]]);
    }
}

impl SqyCodec for ReferenceCodec {
    fn header_size(&self, prefix: &[u8]) -> CodecResult<usize> {
        if prefix.len() >= MIN_HEADER_BYTES && prefix[0] != b'{' {
            return Ok(0);
        }
        let end = Self::terminator(prefix)?;
        Self::read_header(prefix)?;
        Ok(end + 1)
    }

    fn decoded_element_size(&self, header: &[u8]) -> CodecResult<usize> {
        Self::read_header(header)?.element_size()
    }

    fn decoded_rank(&self, header: &[u8]) -> CodecResult<usize> {
        Ok(Self::read_header(header)?.rank)
    }

    fn decoded_shape(&self, header: &[u8], shape: &mut [usize]) -> CodecResult<()> {
        let header = Self::read_header(header)?;
        if header.shape.len() != shape.len() {
            return Err(CodecStatus(status::DESTINATION_MISMATCH));
        }
        shape.copy_from_slice(&header.shape);
        Ok(())
    }

    fn decode_u8(&self, container: &[u8], dst: &mut [u8], _threads: usize) -> CodecResult<()> {
        let raw = Self::decompress(container, 1, dst.len())?;
        dst.copy_from_slice(&raw);
        Ok(())
    }

    fn decode_u16(&self, container: &[u8], dst: &mut [u16], threads: usize) -> CodecResult<()> {
        let raw = Self::decompress(container, 2, dst.len() * 2)?;

        let threads = threads.max(1);
        if threads == 1 || dst.len() < threads {
            samples_from_le(dst, &raw);
            return Ok(());
        }

        let chunk = dst.len().div_ceil(threads);
        trace!(threads, chunk, "splitting sample conversion");
        std::thread::scope(|scope| {
            for (out, bytes) in dst.chunks_mut(chunk).zip(raw.chunks(chunk * 2)) {
                scope.spawn(move || samples_from_le(out, bytes));
            }
        });
        Ok(())
    }

    fn pipeline_name(&self, header: &[u8]) -> Option<String> {
        Self::read_header(header).ok().map(|h| h.pipename)
    }

    fn name(&self) -> &'static str {
        "reference"
    }
}
