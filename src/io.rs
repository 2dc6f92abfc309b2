//! Stream helpers and source resolution

use crate::error::{Result, SqyError};
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::PathBuf;

/// Resolve a source URL to a local path.
///
/// Accepts `file://` URLs and bare paths. Other schemes are rejected; callers
/// with remote storage hand any `Read + Seek` stream to the reader directly.
pub fn source_path(url: &str) -> Result<PathBuf> {
    if let Some(path) = url.strip_prefix("file://") {
        return Ok(PathBuf::from(path));
    }
    if let Some(scheme_end) = url.find("://") {
        return Err(SqyError::InvalidUrl(format!(
            "Unsupported scheme: {}",
            &url[..scheme_end]
        )));
    }
    Ok(PathBuf::from(url))
}

/// Open a local source for reading
pub fn open_source(url: &str) -> Result<File> {
    let path = source_path(url)?;
    Ok(File::open(path)?)
}

/// Total stream length; the read position is left unchanged
pub fn stream_length<S: Seek>(stream: &mut S) -> Result<u64> {
    let position = stream.stream_position()?;
    let len = stream.seek(SeekFrom::End(0))?;
    stream.seek(SeekFrom::Start(position))?;
    Ok(len)
}

/// Run `f` against the stream and restore the read position afterwards,
/// whether or not `f` succeeded
pub fn peek<S, T, F>(stream: &mut S, f: F) -> Result<T>
where
    S: Seek,
    F: FnOnce(&mut S) -> Result<T>,
{
    let position = stream.stream_position()?;
    let result = f(stream);
    stream.seek(SeekFrom::Start(position))?;
    result
}

/// Read up to `limit` bytes from the start of the stream
pub fn read_prefix<S: Read + Seek>(stream: &mut S, limit: usize) -> Result<Vec<u8>> {
    let len = stream_length(stream)?;
    let want = (limit as u64).min(len);
    stream.seek(SeekFrom::Start(0))?;
    let mut prefix = Vec::with_capacity(want as usize);
    stream.by_ref().take(want).read_to_end(&mut prefix)?;
    Ok(prefix)
}

/// Read exactly `len` bytes at `offset`, failing with `TruncatedInput` when
/// the stream is too short
pub fn read_exact_at<S: Read + Seek>(stream: &mut S, offset: u64, len: usize) -> Result<Vec<u8>> {
    let available = stream_length(stream)?;
    let end = offset.checked_add(len as u64);
    if end.map_or(true, |end| end > available) {
        return Err(SqyError::TruncatedInput {
            offset,
            needed: len as u64,
            available,
        });
    }

    stream.seek(SeekFrom::Start(offset))?;
    let mut buf = vec![0u8; len];
    stream.read_exact(&mut buf)?;
    Ok(buf)
}

/// Read the whole stream from offset zero
pub fn read_all<S: Read + Seek>(stream: &mut S) -> Result<Vec<u8>> {
    let len = stream_length(stream)?;
    let len = usize::try_from(len)
        .map_err(|_| SqyError::InvalidShape(format!("stream of {} bytes exceeds address space", len)))?;
    read_exact_at(stream, 0, len)
}
