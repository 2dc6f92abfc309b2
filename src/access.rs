//! Volume access - the main API for detecting, parsing and reading sqeazy containers

use crate::codec::{ReferenceCodec, SqyCodec};
use crate::config::ReaderConfig;
use crate::detect::{self, FORMAT_NAME, SUFFIXES};
use crate::error::{ContractViolation, Result};
use crate::header::{parse_header, ContainerHeader};
use crate::io::open_source;
use crate::materialize::{materialize, MaterializedVolume};
use crate::metadata::{ImageMetadata, SqyMetadata};
use parking_lot::{Mutex, RwLock};
use std::fs::File;
use std::io::{Read, Seek};
use std::sync::Arc;
use tracing::{debug, trace};

/// Copy plane `plane` of a decoded volume into `dst`.
///
/// `dst` must hold exactly one plane. The copy is byte-for-byte; 16-bit
/// samples arrive big-endian.
pub fn read_plane(volume: &MaterializedVolume, plane: usize, dst: &mut [u8]) -> Result<()> {
    let range = volume.layout().plane_range(plane)?;
    if dst.len() != range.len() {
        return Err(ContractViolation::DestinationLength {
            expected: range.len(),
            actual: dst.len(),
        }
        .into());
    }
    trace!(plane, offset = range.start, len = range.len(), "copying plane");
    dst.copy_from_slice(&volume.data()[range]);
    Ok(())
}

/// The sqeazy format as seen by a host framework: identity, detection,
/// parsing and plane reads, backed by an injected codec.
#[derive(Clone)]
pub struct SqyFormat {
    codec: Arc<dyn SqyCodec>,
    config: ReaderConfig,
}

impl SqyFormat {
    /// Create a format around `codec`
    pub fn new(codec: Arc<dyn SqyCodec>, config: ReaderConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { codec, config })
    }

    /// Format backed by the local reference codec with default configuration
    pub fn reference() -> Self {
        Self {
            codec: Arc::new(ReferenceCodec),
            config: ReaderConfig::default(),
        }
    }

    pub fn name(&self) -> &'static str {
        FORMAT_NAME
    }

    pub fn suffixes(&self) -> &'static [&'static str] {
        SUFFIXES
    }

    pub fn suffix_sufficient(&self) -> bool {
        detect::suffix_sufficient()
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    pub fn codec(&self) -> &dyn SqyCodec {
        self.codec.as_ref()
    }

    /// Whether `stream` holds a sqeazy container; the read position is preserved
    pub fn is_format<S: Read + Seek>(&self, stream: &mut S) -> bool {
        detect::is_format(self.codec.as_ref(), &self.config, stream)
    }

    /// Detection by location; unreadable sources are simply not this format
    pub fn is_format_at(&self, url: &str) -> bool {
        match open_source(url) {
            Ok(mut file) => self.is_format(&mut file),
            Err(e) => {
                debug!(url, error = %e, "cannot open source for detection");
                false
            }
        }
    }

    /// Fresh metadata in the `Empty` state
    pub fn create_metadata(&self) -> SqyMetadata {
        SqyMetadata::new(self.config.decode_threads)
    }

    /// Parse the header into `meta`, which must be empty. Parsing again
    /// requires `close` first.
    pub fn parse_header<S: Read + Seek>(&self, stream: &mut S, meta: &mut SqyMetadata) -> Result<()> {
        if meta.header().is_some() {
            return Err(ContractViolation::AlreadyParsed.into());
        }
        let header = parse_header(self.codec.as_ref(), &self.config, stream)?;
        meta.set_header(header)
    }

    /// Decode the volume behind a parsed header. A failed decode leaves
    /// `meta` in the header-parsed state.
    pub fn materialize<S: Read + Seek>(&self, stream: &mut S, meta: &mut SqyMetadata) -> Result<()> {
        if meta.is_materialized() {
            return Ok(());
        }
        let header = meta
            .header()
            .cloned()
            .ok_or(ContractViolation::HeaderNotParsed)?;
        let volume = materialize(self.codec.as_ref(), header, meta.decode_threads(), stream)?;
        meta.set_volume(volume)
    }

    /// Parse and decode in one pass. On failure no metadata is returned.
    pub fn parse<S: Read + Seek>(&self, stream: &mut S) -> Result<SqyMetadata> {
        let mut meta = self.create_metadata();
        self.parse_header(stream, &mut meta)?;
        self.materialize(stream, &mut meta)?;
        Ok(meta)
    }

    /// Copy one plane out of materialized metadata
    pub fn read_plane(&self, meta: &SqyMetadata, plane: usize, dst: &mut [u8]) -> Result<()> {
        read_plane(meta.volume()?, plane, dst)
    }
}

/// Reader over one open container that decodes on first plane access.
///
/// The header is parsed on open. The first plane request decodes the whole
/// volume under a single-writer lock; later requests only read the shared
/// buffer and may run in parallel.
pub struct SqyReader<S> {
    format: SqyFormat,
    header: ContainerHeader,
    stream: Mutex<Option<S>>,
    volume: RwLock<Option<Arc<MaterializedVolume>>>,
}

impl SqyReader<File> {
    /// Open a container from a `file://` URL or bare path
    pub fn open_at(format: SqyFormat, url: &str) -> Result<Self> {
        let file = open_source(url)?;
        Self::open(format, file)
    }
}

impl<S: Read + Seek> SqyReader<S> {
    /// Parse the header of `stream`; decoding is deferred
    pub fn open(format: SqyFormat, mut stream: S) -> Result<Self> {
        let header = parse_header(format.codec.as_ref(), &format.config, &mut stream)?;
        Ok(Self {
            format,
            header,
            stream: Mutex::new(Some(stream)),
            volume: RwLock::new(None),
        })
    }

    pub fn header(&self) -> &ContainerHeader {
        &self.header
    }

    pub fn image_metadata(&self) -> ImageMetadata {
        ImageMetadata::from_header(&self.header)
    }

    pub fn plane_count(&self) -> usize {
        self.header.layout.plane_count()
    }

    pub fn is_materialized(&self) -> bool {
        self.volume.read().is_some()
    }

    /// The decoded volume, decoding it now if no one has yet
    pub fn volume(&self) -> Result<Arc<MaterializedVolume>> {
        if let Some(volume) = self.volume.read().as_ref() {
            return Ok(Arc::clone(volume));
        }

        let mut stream = self.stream.lock();
        if let Some(volume) = self.volume.read().as_ref() {
            return Ok(Arc::clone(volume));
        }
        let source = stream.as_mut().ok_or(ContractViolation::NotMaterialized)?;

        let volume = Arc::new(materialize(
            self.format.codec.as_ref(),
            self.header.clone(),
            self.format.config.decode_threads,
            source,
        )?);
        *self.volume.write() = Some(Arc::clone(&volume));
        // The decoded buffer is all we need from here on.
        *stream = None;
        Ok(volume)
    }

    /// Copy plane `plane` into `dst`
    pub fn read_plane(&self, plane: usize, dst: &mut [u8]) -> Result<()> {
        let volume = self.volume()?;
        read_plane(&volume, plane, dst)
    }

    /// Copy plane `plane` into a freshly allocated buffer
    pub fn open_plane(&self, plane: usize) -> Result<Vec<u8>> {
        let volume = self.volume()?;
        Ok(volume.plane(plane)?.to_vec())
    }

    /// Release the stream and decoded buffer
    pub fn close(&mut self) {
        *self.stream.get_mut() = None;
        *self.volume.get_mut() = None;
    }
}
