//! Utility functions

use crate::error::{Result, SqyError};

/// Serialize 16-bit samples as big-endian byte pairs
pub fn samples_to_be_bytes(samples: &[u16]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(samples.len() * 2);
    for sample in samples {
        bytes.extend_from_slice(&sample.to_be_bytes());
    }
    bytes
}

/// Read big-endian byte pairs back into 16-bit samples
pub fn be_bytes_to_samples(bytes: &[u8]) -> Result<Vec<u16>> {
    if bytes.len() % 2 != 0 {
        return Err(SqyError::InvalidShape(format!(
            "{} bytes is not a whole number of 16-bit samples",
            bytes.len()
        )));
    }
    Ok(bytes
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .collect())
}

/// Byte count in binary units: `512 B`, `8.00 KiB`, `100.0 GiB`.
/// Two decimals under 10 of a unit, one decimal from there on.
pub fn format_bytes(bytes: usize) -> String {
    const SCALES: [(u32, &str); 4] = [(40, "TiB"), (30, "GiB"), (20, "MiB"), (10, "KiB")];

    SCALES
        .iter()
        .find(|(shift, _)| bytes as u64 >= 1u64 << shift)
        .map(|&(shift, unit)| {
            let value = bytes as f64 / (1u64 << shift) as f64;
            if value < 10.0 {
                format!("{:.2} {}", value, unit)
            } else {
                format!("{:.1} {}", value, unit)
            }
        })
        .unwrap_or_else(|| format!("{} B", bytes))
}
