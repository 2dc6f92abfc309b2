//! Format detection for sqeazy containers.
//!
//! Detection is a peek: the stream position is restored before returning.
//! The codec's header-size probe is authoritative; a matching suffix alone
//! never classifies a stream.

use crate::codec::SqyCodec;
use crate::config::ReaderConfig;
use crate::io::{peek, read_prefix};
use std::io::{Read, Seek};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::Path;
use tracing::debug;

/// Format name as registered with the host framework.
pub const FORMAT_NAME: &str = "sqeazy";

/// Recognized file suffixes, without the leading separator.
pub const SUFFIXES: &[&str] = &["sqy"];

/// Whether the path carries one of the recognized suffixes (case-insensitive).
pub fn has_suffix(path: impl AsRef<Path>) -> bool {
    path.as_ref()
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| SUFFIXES.iter().any(|s| s.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}

/// Suffix matches are never sufficient on their own.
pub const fn suffix_sufficient() -> bool {
    false
}

/// Classify a raw prefix with the codec's header probe.
///
/// Any failure, including a panicking codec, means "not this format".
pub fn probe_prefix<C: SqyCodec + ?Sized>(codec: &C, prefix: &[u8]) -> bool {
    let probed = catch_unwind(AssertUnwindSafe(|| codec.header_size(prefix)));
    match probed {
        Ok(Ok(len)) if len > 0 => {
            debug!(header_len = len, codec = codec.name(), "header probe accepted");
            true
        }
        Ok(Ok(_)) => {
            debug!(codec = codec.name(), "header probe found no header");
            false
        }
        Ok(Err(status)) => {
            debug!(status = status.code(), codec = codec.name(), "header probe failed");
            false
        }
        Err(_) => {
            debug!(codec = codec.name(), "header probe panicked");
            false
        }
    }
}

/// Decide whether `stream` is a sqeazy container.
///
/// Reads up to `config.detect_window` bytes. Streams shorter than
/// `config.min_detect_bytes` short-circuit to `false`; anything else,
/// however short, is handed to the probe. Never errors.
pub fn is_format<S, C>(codec: &C, config: &ReaderConfig, stream: &mut S) -> bool
where
    S: Read + Seek,
    C: SqyCodec + ?Sized,
{
    let prefix = match peek(stream, |s| read_prefix(s, config.detect_window)) {
        Ok(prefix) => prefix,
        Err(e) => {
            debug!(error = %e, "could not read detection prefix");
            return false;
        }
    };

    if prefix.len() < config.min_detect_bytes {
        debug!(len = prefix.len(), "stream too short for detection");
        return false;
    }

    probe_prefix(codec, &prefix)
}
