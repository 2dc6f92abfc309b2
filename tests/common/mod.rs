//! Fixture builders for reference-codec containers

#![allow(dead_code)]

use flate2::write::DeflateEncoder;
use flate2::Compression;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy)]
pub enum Pipeline {
    Raw,
    Deflate,
    Zstd,
}

impl Pipeline {
    pub const ALL: [Pipeline; 3] = [Pipeline::Raw, Pipeline::Deflate, Pipeline::Zstd];

    fn name(&self) -> &'static str {
        match self {
            Pipeline::Raw => "raw",
            Pipeline::Deflate => "deflate",
            Pipeline::Zstd => "zstd",
        }
    }

    fn compress(&self, raw: &[u8]) -> Vec<u8> {
        match self {
            Pipeline::Raw => raw.to_vec(),
            Pipeline::Deflate => {
                let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
                encoder.write_all(raw).expect("deflate write");
                encoder.finish().expect("deflate finish")
            }
            Pipeline::Zstd => zstd::encode_all(raw, 3).expect("zstd encode"),
        }
    }
}

fn container(value_type: &str, shape: &[usize], raw: &[u8], pipeline: Pipeline) -> Vec<u8> {
    let header = serde_json::json!({
        "pipename": pipeline.name(),
        "value_type": value_type,
        "rank": shape.len(),
        "shape": shape,
    });
    let mut bytes = serde_json::to_vec(&header).expect("header json");
    bytes.push(b'|');
    bytes.extend_from_slice(&pipeline.compress(raw));
    bytes
}

/// Container holding 8-bit samples
pub fn container_u8(shape: &[usize], samples: &[u8], pipeline: Pipeline) -> Vec<u8> {
    assert_eq!(shape.iter().product::<usize>(), samples.len());
    container("uint8", shape, samples, pipeline)
}

/// Container holding 16-bit samples, stored little-endian in the payload
pub fn container_u16(shape: &[usize], samples: &[u16], pipeline: Pipeline) -> Vec<u8> {
    assert_eq!(shape.iter().product::<usize>(), samples.len());
    let raw: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
    container("uint16", shape, &raw, pipeline)
}

/// Ramp of 8-bit samples starting at zero
pub fn ramp_u8(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 256) as u8).collect()
}

/// 16-bit samples whose first three values are 100, 101, 96
pub fn reference_u16(len: usize) -> Vec<u16> {
    let mut samples: Vec<u16> = (0..len).map(|i| (i * 7 % 4096) as u16).collect();
    for (slot, value) in samples.iter_mut().zip([100u16, 101, 96]) {
        *slot = value;
    }
    samples
}

/// Write a fixture under `dir` and return its path
pub fn write_fixture(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, bytes).expect("write fixture");
    path
}
