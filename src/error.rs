//! Error types for sqeazy container operations

use std::fmt;
use thiserror::Error;

/// Header query that produced a failure status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecQuery {
    HeaderSize,
    ElementSize,
    Rank,
    Shape,
}

impl fmt::Display for CodecQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CodecQuery::HeaderSize => "header size probe",
            CodecQuery::ElementSize => "element size query",
            CodecQuery::Rank => "rank query",
            CodecQuery::Shape => "shape query",
        };
        f.write_str(name)
    }
}

/// Misuse of the plane accessor by the caller
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContractViolation {
    #[error("plane index {index} out of range (volume has {count} planes)")]
    PlaneOutOfRange { index: usize, count: usize },

    #[error("destination holds {actual} bytes, plane needs exactly {expected}")]
    DestinationLength { expected: usize, actual: usize },

    #[error("volume has not been materialized")]
    NotMaterialized,

    #[error("header has not been parsed")]
    HeaderNotParsed,

    #[error("header already parsed; close the metadata before parsing again")]
    AlreadyParsed,
}

/// Main error type for sqeazy container operations
#[derive(Error, Debug)]
pub enum SqyError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Truncated input: needed {needed} bytes at offset {offset}, stream holds {available}")]
    TruncatedInput {
        offset: u64,
        needed: u64,
        available: u64,
    },

    #[error("Header not found in the first {window} bytes{}", status_suffix(.status))]
    HeaderNotFound {
        window: usize,
        /// `None` when the probe succeeded but reported no header
        status: Option<i32>,
    },

    #[error("Header parse failure in {query}: codec status {status}")]
    HeaderQuery { query: CodecQuery, status: i32 },

    #[error("Unsupported element width: {0} bytes (expected 1 or 2)")]
    UnsupportedElementWidth(usize),

    #[error("Unsupported rank: {0} (expected 2 or 3)")]
    UnsupportedRank(usize),

    #[error("Invalid shape: {0}")]
    InvalidShape(String),

    #[error("Decode failure for {width}-byte elements: codec status {status}")]
    Decode { width: usize, status: i32 },

    #[error("Contract violation: {0}")]
    Contract(#[from] ContractViolation),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl SqyError {
    /// Codec status code attached to this error, if any
    pub fn status(&self) -> Option<i32> {
        match self {
            SqyError::HeaderNotFound { status, .. } => *status,
            SqyError::HeaderQuery { status, .. }
            | SqyError::Decode { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_contract_violation(&self) -> bool {
        matches!(self, SqyError::Contract(_))
    }
}

fn status_suffix(status: &Option<i32>) -> String {
    status.map_or_else(String::new, |code| format!(" (codec status {})", code))
}

/// Specialized Result type for sqeazy operations
pub type Result<T> = std::result::Result<T, SqyError>;

impl From<serde_json::Error> for SqyError {
    fn from(err: serde_json::Error) -> Self {
        SqyError::Configuration(err.to_string())
    }
}
