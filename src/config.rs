//! Reader configuration
//!
//! Defaults match the container conventions: detection sniffs up to 16 KiB,
//! header parsing probes the first 4 KiB, and decoding is handed one thread
//! per available core.

use crate::error::{Result, SqyError};
use serde::{Deserialize, Serialize};

/// Bytes read by the format detector.
pub const DEFAULT_DETECT_WINDOW: usize = 16 << 10;

/// Bytes handed to the header-size probe during parsing.
pub const DEFAULT_PROBE_WINDOW: usize = 4096;

/// Streams shorter than this are rejected without calling the codec.
pub const DEFAULT_MIN_DETECT_BYTES: usize = 1;

fn default_decode_threads() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Tunables for detection, parsing and decoding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReaderConfig {
    /// Thread-count hint passed to the codec's decode call
    pub decode_threads: usize,

    /// Prefix length read by the format detector
    pub detect_window: usize,

    /// Prefix length read before the exact header length is known
    pub probe_window: usize,

    /// Minimum stream length for detection to consult the codec
    pub min_detect_bytes: usize,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            decode_threads: default_decode_threads(),
            detect_window: DEFAULT_DETECT_WINDOW,
            probe_window: DEFAULT_PROBE_WINDOW,
            min_detect_bytes: DEFAULT_MIN_DETECT_BYTES,
        }
    }
}

impl ReaderConfig {
    /// Set the decode thread hint
    pub fn with_decode_threads(mut self, threads: usize) -> Self {
        self.decode_threads = threads;
        self
    }

    /// Set the detection and probe windows
    pub fn with_windows(mut self, detect_window: usize, probe_window: usize) -> Self {
        self.detect_window = detect_window;
        self.probe_window = probe_window;
        self
    }

    /// Parse a JSON document; missing fields take their defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: ReaderConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.decode_threads == 0 {
            return Err(SqyError::Configuration(
                "decode_threads must be greater than 0".to_string(),
            ));
        }
        if self.detect_window == 0 || self.probe_window == 0 {
            return Err(SqyError::Configuration(
                "detect_window and probe_window must be greater than 0".to_string(),
            ));
        }
        if self.probe_window > self.detect_window {
            return Err(SqyError::Configuration(format!(
                "probe_window ({}) must not exceed detect_window ({})",
                self.probe_window, self.detect_window
            )));
        }
        if self.min_detect_bytes == 0 {
            return Err(SqyError::Configuration(
                "min_detect_bytes must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ReaderConfig::default();
        assert_eq!(config.detect_window, 16384);
        assert_eq!(config.probe_window, 4096);
        assert_eq!(config.min_detect_bytes, 1);
        assert!(config.decode_threads >= 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_json_partial() {
        let config = ReaderConfig::from_json_str(r#"{"decode_threads": 4}"#).unwrap();
        assert_eq!(config.decode_threads, 4);
        assert_eq!(config.probe_window, DEFAULT_PROBE_WINDOW);
    }

    #[test]
    fn test_from_json_rejects_unknown_fields() {
        assert!(matches!(
            ReaderConfig::from_json_str(r#"{"threads": 4}"#),
            Err(SqyError::Configuration(_))
        ));
    }

    #[test]
    fn test_validate() {
        assert!(ReaderConfig::default()
            .with_decode_threads(0)
            .validate()
            .is_err());
        assert!(ReaderConfig::default()
            .with_windows(1024, 4096)
            .validate()
            .is_err());
        assert!(ReaderConfig::default()
            .with_windows(4096, 4096)
            .validate()
            .is_ok());
    }
}
