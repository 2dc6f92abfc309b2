//! sqeazy-io - reader for sqeazy compressed volumetric containers
//!
//! Exposes `.sqy` containers to an image I/O host: detect whether a stream is
//! a container, parse its header into shape and element width, decode the
//! whole volume once, and serve 2-D planes out of the decoded buffer.
//!
//! # Features
//!
//! - Header-probe based detection that never errors on malformed input
//! - Exact-length header parsing through an injected codec ([`SqyCodec`])
//! - One-shot materialization of 8-bit and 16-bit volumes
//! - Allocation-free, bounds-checked plane windows, safe to read in parallel
//!
//! # Codecs
//!
//! The compression algorithm lives outside this crate. Implement [`SqyCodec`]
//! over the native library, or use [`ReferenceCodec`] for containers with a
//! JSON header and `raw`/`deflate`/`zstd` payloads.
//!
//! # Example
//!
//! ```rust,no_run
//! use sqeazy_io::{SqyFormat, SqyReader};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let format = SqyFormat::reference();
//! if format.is_format_at("flybrain.sqy") {
//!     let reader = SqyReader::open_at(format, "flybrain.sqy")?;
//!     let plane = reader.open_plane(0)?;
//!     println!("plane 0: {} bytes", plane.len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod access;
pub mod codec;
pub mod config;
pub mod detect;
pub mod error;
pub mod header;
pub mod io;
pub mod layout;
pub mod materialize;
pub mod metadata;
pub mod types;
pub mod utils;

// Re-exports
pub use access::{read_plane, SqyFormat, SqyReader};
pub use codec::{CodecResult, CodecStatus, ReferenceCodec, SqyCodec};
pub use config::ReaderConfig;
pub use detect::{has_suffix, is_format, FORMAT_NAME, SUFFIXES};
pub use error::{CodecQuery, ContractViolation, Result, SqyError};
pub use header::{parse_header, ContainerHeader};
pub use layout::PlaneLayout;
pub use materialize::{materialize, MaterializedVolume};
pub use metadata::{ImageMetadata, SqyMetadata, VolumeState};
pub use types::{ElementWidth, PixelType, Shape};

/// Version of the sqeazy-io implementation
pub const SQEAZY_IO_VERSION: &str = env!("CARGO_PKG_VERSION");
