//! Header parsing
//!
//! The header is opaque to the reader: its length, element width, rank and
//! shape all come from codec queries. Parsing reads a bounded probe window,
//! learns the exact header length, re-reads exactly that many bytes and runs
//! the remaining queries against that buffer.

use crate::codec::{CodecStatus, SqyCodec};
use crate::config::ReaderConfig;
use crate::error::{CodecQuery, Result, SqyError};
use crate::io::{read_exact_at, read_prefix};
use crate::layout::PlaneLayout;
use crate::types::{ElementWidth, Shape};
use serde::Serialize;
use std::io::{Read, Seek};
use tracing::{debug, warn};

/// Everything the header tells us about a container
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContainerHeader {
    /// Exact header length reported by the probe
    pub header_len: usize,
    pub element_width: ElementWidth,
    pub shape: Shape,
    /// Compression pipeline, when the codec reports one
    pub pipeline: Option<String>,
    pub layout: PlaneLayout,
}

impl ContainerHeader {
    pub fn rank(&self) -> usize {
        self.shape.rank()
    }

    pub fn size_x(&self) -> usize {
        self.layout.size_x
    }

    pub fn size_y(&self) -> usize {
        self.layout.size_y
    }

    pub fn size_z(&self) -> usize {
        self.layout.size_z
    }
}

fn query_failed(query: CodecQuery) -> impl FnOnce(CodecStatus) -> SqyError {
    move |status| {
        warn!(%query, status = status.code(), "codec header query failed");
        SqyError::HeaderQuery {
            query,
            status: status.code(),
        }
    }
}

/// Parse the container header at the start of `stream`.
///
/// No partial result is returned: any failing query aborts the parse.
pub fn parse_header<S, C>(codec: &C, config: &ReaderConfig, stream: &mut S) -> Result<ContainerHeader>
where
    S: Read + Seek,
    C: SqyCodec + ?Sized,
{
    let probe = read_prefix(stream, config.probe_window)?;
    let header_len = match codec.header_size(&probe) {
        Ok(0) => {
            return Err(SqyError::HeaderNotFound {
                window: probe.len(),
                status: None,
            })
        }
        Ok(len) => len,
        Err(status) => {
            return Err(SqyError::HeaderNotFound {
                window: probe.len(),
                status: Some(status.code()),
            })
        }
    };
    debug!(window = probe.len(), header_len, "probed header length");

    let header = read_exact_at(stream, 0, header_len)?;

    let size = codec
        .decoded_element_size(&header)
        .map_err(query_failed(CodecQuery::ElementSize))?;
    let element_width = ElementWidth::from_size(size)?;

    let rank = codec
        .decoded_rank(&header)
        .map_err(query_failed(CodecQuery::Rank))?;
    if rank != 2 && rank != 3 {
        return Err(SqyError::UnsupportedRank(rank));
    }

    let mut dims = vec![0usize; rank];
    codec
        .decoded_shape(&header, &mut dims)
        .map_err(query_failed(CodecQuery::Shape))?;
    let shape = Shape::new(dims)?;
    let layout = PlaneLayout::new(&shape, element_width)?;

    let pipeline = codec.pipeline_name(&header);
    debug!(
        %shape,
        %element_width,
        pipeline = pipeline.as_deref().unwrap_or("unknown"),
        "parsed container header"
    );

    Ok(ContainerHeader {
        header_len,
        element_width,
        shape,
        pipeline,
        layout,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{CodecResult, ReferenceCodec};
    use std::io::Cursor;

    fn header_bytes(value_type: &str, shape: &[usize]) -> Vec<u8> {
        format!(
            r#"{{"pipename":"raw","value_type":"{}","rank":{},"shape":{:?}}}|"#,
            value_type,
            shape.len(),
            shape
        )
        .into_bytes()
    }

    /// Codec whose header spans `len` bytes regardless of the probe window
    struct LongHeader {
        len: usize,
        rank: usize,
        fail: Option<(CodecQuery, i32)>,
    }

    impl LongHeader {
        fn new(len: usize, rank: usize) -> Self {
            Self {
                len,
                rank,
                fail: None,
            }
        }

        fn failing(query: CodecQuery, status: i32) -> Self {
            Self {
                len: 10,
                rank: 2,
                fail: Some((query, status)),
            }
        }

        fn check(&self, query: CodecQuery) -> CodecResult<()> {
            match self.fail {
                Some((failing, status)) if failing == query => Err(CodecStatus(status)),
                _ => Ok(()),
            }
        }
    }

    impl SqyCodec for LongHeader {
        fn header_size(&self, _prefix: &[u8]) -> CodecResult<usize> {
            Ok(self.len)
        }
        fn decoded_element_size(&self, header: &[u8]) -> CodecResult<usize> {
            assert_eq!(header.len(), self.len);
            self.check(CodecQuery::ElementSize)?;
            Ok(1)
        }
        fn decoded_rank(&self, _header: &[u8]) -> CodecResult<usize> {
            self.check(CodecQuery::Rank)?;
            Ok(self.rank)
        }
        fn decoded_shape(&self, _header: &[u8], shape: &mut [usize]) -> CodecResult<()> {
            self.check(CodecQuery::Shape)?;
            shape.fill(4);
            Ok(())
        }
        fn decode_u8(&self, _: &[u8], _: &mut [u8], _: usize) -> CodecResult<()> {
            Ok(())
        }
        fn decode_u16(&self, _: &[u8], _: &mut [u16], _: usize) -> CodecResult<()> {
            Ok(())
        }
        fn name(&self) -> &'static str {
            "long-header"
        }
    }

    #[test]
    fn test_parse_rank3() {
        let mut cursor = Cursor::new(header_bytes("uint16", &[3, 10, 12]));
        let header = parse_header(&ReferenceCodec, &ReaderConfig::default(), &mut cursor).unwrap();

        assert_eq!(header.element_width, ElementWidth::U16);
        assert_eq!(header.rank(), 3);
        assert_eq!(header.shape.dims(), &[3, 10, 12]);
        assert_eq!(header.size_x(), 12);
        assert_eq!(header.size_y(), 10);
        assert_eq!(header.size_z(), 3);
        assert_eq!(header.pipeline.as_deref(), Some("raw"));
        assert_eq!(header.header_len, cursor.get_ref().len());
    }

    #[test]
    fn test_parse_rank2() {
        let mut cursor = Cursor::new(header_bytes("uint8", &[8, 16]));
        let header = parse_header(&ReferenceCodec, &ReaderConfig::default(), &mut cursor).unwrap();
        assert_eq!(header.size_x(), 16);
        assert_eq!(header.size_y(), 8);
        assert_eq!(header.size_z(), 1);
    }

    #[test]
    fn test_header_longer_than_probe_window() {
        let codec = LongHeader::new(6000, 3);
        let mut cursor = Cursor::new(vec![0u8; 7000]);
        let header = parse_header(&codec, &ReaderConfig::default(), &mut cursor).unwrap();
        assert_eq!(header.header_len, 6000);
        assert_eq!(header.layout.total_bytes(), 64);
    }

    #[test]
    fn test_header_past_end_of_stream() {
        let codec = LongHeader::new(6000, 3);
        let mut cursor = Cursor::new(vec![0u8; 5000]);
        assert!(matches!(
            parse_header(&codec, &ReaderConfig::default(), &mut cursor),
            Err(SqyError::TruncatedInput { needed: 6000, .. })
        ));
    }

    #[test]
    fn test_header_not_found() {
        let mut cursor = Cursor::new(b"not a container at all".to_vec());
        let err = parse_header(&ReferenceCodec, &ReaderConfig::default(), &mut cursor).unwrap_err();
        assert!(matches!(err, SqyError::HeaderNotFound { status: None, .. }));
        assert_eq!(err.status(), None);

        let mut cursor = Cursor::new(b"{\"pipename\":\"raw\"".to_vec());
        let err = parse_header(&ReferenceCodec, &ReaderConfig::default(), &mut cursor).unwrap_err();
        assert_eq!(err.status(), Some(crate::codec::status::NO_TERMINATOR));
    }

    #[test]
    fn test_unsupported_element_width() {
        let mut cursor = Cursor::new(header_bytes("float32", &[2, 2, 2]));
        assert!(matches!(
            parse_header(&ReferenceCodec, &ReaderConfig::default(), &mut cursor),
            Err(SqyError::UnsupportedElementWidth(4))
        ));
    }

    #[test]
    fn test_unsupported_rank() {
        let codec = LongHeader::new(10, 4);
        let mut cursor = Cursor::new(vec![0u8; 10]);
        assert!(matches!(
            parse_header(&codec, &ReaderConfig::default(), &mut cursor),
            Err(SqyError::UnsupportedRank(4))
        ));
    }

    #[test]
    fn test_query_failures_propagate_status() {
        let cases = [
            (CodecQuery::ElementSize, 11),
            (CodecQuery::Rank, 12),
            (CodecQuery::Shape, 9),
        ];
        for (failing, code) in cases {
            let codec = LongHeader::failing(failing, code);
            let mut cursor = Cursor::new(vec![0u8; 10]);
            let err = parse_header(&codec, &ReaderConfig::default(), &mut cursor).unwrap_err();

            assert_eq!(err.status(), Some(code), "{}", failing);
            match err {
                SqyError::HeaderQuery { query, status } => {
                    assert_eq!(query, failing);
                    assert_eq!(status, code);
                }
                other => panic!("expected {} failure, got {:?}", failing, other),
            }
        }
    }
}
