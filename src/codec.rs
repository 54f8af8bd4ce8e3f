// Stream codecs for the patch container.
//
// The three raw streams (control, diff, extra) are compressed independently
// with a pluggable `ByteCodec`. Built-in backends:
//   - Raw (id 'R'): passthrough, always available
//   - Zlib (id 'Z'): via flate2, feature-gated `zlib-codec`
//   - LZMA (id 'L'): via lzma-rs, feature-gated `lzma-codec`
//
// The codec id doubles as the eighth magic byte of the container, so a
// patch is self-describing and the decode path resolves its codec from the
// header alone. Changing codec changes compression ratio only, never
// correctness.

use std::io;

use crate::patch::apply::ApplyError;

/// Codec id for the raw passthrough backend.
pub const RAW_ID: u8 = b'R';

/// Codec id for the Zlib backend.
pub const ZLIB_ID: u8 = b'Z';

/// Codec id for the LZMA backend.
pub const LZMA_ID: u8 = b'L';

/// Minimum combined stream size worth compressing.
pub const MIN_COMPRESS_SIZE: usize = 32;

// ---------------------------------------------------------------------------
// ByteCodec trait
// ---------------------------------------------------------------------------

/// A pluggable compressor for patch streams.
///
/// # Implementing a custom codec
///
/// ```
/// use bsdelta::codec::ByteCodec;
/// use bsdelta::patch::apply::ApplyError;
///
/// struct Memoize;
///
/// impl ByteCodec for Memoize {
///     fn id(&self) -> u8 { b'M' }
///     fn compress(&self, data: &[u8]) -> std::io::Result<Vec<u8>> {
///         Ok(data.to_vec()) // placeholder
///     }
///     fn decompress(&self, data: &[u8]) -> Result<Vec<u8>, ApplyError> {
///         Ok(data.to_vec()) // placeholder
///     }
/// }
/// ```
pub trait ByteCodec: Send + Sync {
    /// The codec id stored as the eighth magic byte of the container.
    ///
    /// Built-in ids: `b'R'` (raw), `b'Z'` (zlib), `b'L'` (LZMA). Custom
    /// implementations should use ids that don't collide with these.
    fn id(&self) -> u8;

    /// Compress one stream.
    fn compress(&self, data: &[u8]) -> io::Result<Vec<u8>>;

    /// Decompress a stream previously produced by [`compress`](Self::compress).
    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>, ApplyError>;

    /// Whether streams totalling `total_len` raw bytes are worth
    /// compressing. Below the threshold the engine frames the container
    /// raw instead. Default: skip under 32 bytes.
    fn should_compress(&self, total_len: usize) -> bool {
        total_len >= MIN_COMPRESS_SIZE
    }
}

// ---------------------------------------------------------------------------
// Raw backend
// ---------------------------------------------------------------------------

/// Passthrough codec (id `'R'`).
///
/// Always available; also the automatic choice for containers whose
/// streams are too small to be worth compressing.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawCodec;

impl ByteCodec for RawCodec {
    fn id(&self) -> u8 {
        RAW_ID
    }

    fn compress(&self, data: &[u8]) -> io::Result<Vec<u8>> {
        Ok(data.to_vec())
    }

    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>, ApplyError> {
        Ok(data.to_vec())
    }

    fn should_compress(&self, _total_len: usize) -> bool {
        false
    }
}

// ---------------------------------------------------------------------------
// Zlib backend
// ---------------------------------------------------------------------------

/// Zlib codec (id `'Z'`).
///
/// Uses zlib framing (deflate plus header and Adler-32 trailer), not raw
/// deflate, so each stream is self-checking and truncation or corruption
/// is caught at decompression time.
#[cfg(feature = "zlib-codec")]
#[derive(Debug, Clone, Copy)]
pub struct ZlibCodec {
    level: flate2::Compression,
}

#[cfg(feature = "zlib-codec")]
impl ZlibCodec {
    /// Create a zlib codec with the given compression level (0-9).
    pub fn new(level: u32) -> Self {
        Self {
            level: flate2::Compression::new(level),
        }
    }
}

#[cfg(feature = "zlib-codec")]
impl Default for ZlibCodec {
    /// Level 9. Patches are encoded once and applied many times, so the
    /// default trades encode time for size.
    fn default() -> Self {
        Self::new(9)
    }
}

#[cfg(feature = "zlib-codec")]
impl ByteCodec for ZlibCodec {
    fn id(&self) -> u8 {
        ZLIB_ID
    }

    fn compress(&self, data: &[u8]) -> io::Result<Vec<u8>> {
        use flate2::write::ZlibEncoder;
        use io::Write;

        let mut encoder = ZlibEncoder::new(Vec::new(), self.level);
        encoder.write_all(data)?;
        encoder.finish()
    }

    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>, ApplyError> {
        use flate2::read::ZlibDecoder;
        use io::Read;

        let mut decoder = ZlibDecoder::new(data);
        let mut output = Vec::new();
        decoder
            .read_to_end(&mut output)
            .map_err(|e| ApplyError::Decompression(format!("zlib: {e}")))?;
        Ok(output)
    }
}

// ---------------------------------------------------------------------------
// LZMA backend
// ---------------------------------------------------------------------------

/// LZMA codec (id `'L'`). Slower than zlib, smaller output.
#[cfg(feature = "lzma-codec")]
#[derive(Debug, Clone, Copy, Default)]
pub struct LzmaCodec;

#[cfg(feature = "lzma-codec")]
impl ByteCodec for LzmaCodec {
    fn id(&self) -> u8 {
        LZMA_ID
    }

    fn compress(&self, data: &[u8]) -> io::Result<Vec<u8>> {
        let mut input = io::Cursor::new(data);
        let mut output = Vec::new();
        lzma_rs::lzma_compress(&mut input, &mut output)?;
        Ok(output)
    }

    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>, ApplyError> {
        let mut input = io::BufReader::new(io::Cursor::new(data));
        let mut output = Vec::new();
        lzma_rs::lzma_decompress(&mut input, &mut output)
            .map_err(|e| ApplyError::Decompression(format!("lzma: {e}")))?;
        Ok(output)
    }
}

// ---------------------------------------------------------------------------
// Codec selection
// ---------------------------------------------------------------------------

/// Stream codec selection for patch creation.
#[derive(Clone, Default)]
pub enum Codec {
    /// No compression.
    #[default]
    Raw,
    /// Zlib with a compression level (0-9).
    #[cfg(feature = "zlib-codec")]
    Zlib {
        /// Zlib compression level (0-9). Default: 9.
        level: u32,
    },
    /// LZMA.
    #[cfg(feature = "lzma-codec")]
    Lzma,
    /// A custom backend provided by the caller.
    Custom(std::sync::Arc<dyn ByteCodec>),
}

impl std::fmt::Debug for Codec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Raw => write!(f, "Raw"),
            #[cfg(feature = "zlib-codec")]
            Self::Zlib { level } => write!(f, "Zlib {{ level: {level} }}"),
            #[cfg(feature = "lzma-codec")]
            Self::Lzma => write!(f, "Lzma"),
            Self::Custom(c) => write!(f, "Custom(id={})", c.id()),
        }
    }
}

impl Codec {
    /// Return the backend implementing this selection.
    pub fn backend(&self) -> Box<dyn ByteCodec> {
        match self {
            Self::Raw => Box::new(RawCodec),
            #[cfg(feature = "zlib-codec")]
            Self::Zlib { level } => Box::new(ZlibCodec::new(*level)),
            #[cfg(feature = "lzma-codec")]
            Self::Lzma => Box::new(LzmaCodec),
            Self::Custom(c) => Box::new(ArcCodec(c.clone())),
        }
    }

    /// Whether this selection actually compresses.
    pub fn is_enabled(&self) -> bool {
        !matches!(self, Self::Raw)
    }
}

/// Resolve a built-in codec id (the eighth magic byte) to its backend.
///
/// Returns `None` for custom or unknown ids, and for built-in ids whose
/// backing feature is not compiled in.
pub fn for_id(id: u8) -> Option<Box<dyn ByteCodec>> {
    match id {
        RAW_ID => Some(Box::new(RawCodec)),
        #[cfg(feature = "zlib-codec")]
        ZLIB_ID => Some(Box::new(ZlibCodec::default())),
        #[cfg(feature = "lzma-codec")]
        LZMA_ID => Some(Box::new(LzmaCodec)),
        _ => None,
    }
}

/// Human-readable name for a built-in codec id.
pub fn codec_name(id: u8) -> Option<&'static str> {
    match id {
        RAW_ID => Some("none"),
        ZLIB_ID => Some("zlib"),
        LZMA_ID => Some("lzma"),
        _ => None,
    }
}

/// Wrapper to make `Arc<dyn ByteCodec>` implement `ByteCodec`.
struct ArcCodec(std::sync::Arc<dyn ByteCodec>);

impl ByteCodec for ArcCodec {
    fn id(&self) -> u8 {
        self.0.id()
    }
    fn compress(&self, data: &[u8]) -> io::Result<Vec<u8>> {
        self.0.compress(data)
    }
    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>, ApplyError> {
        self.0.decompress(data)
    }
    fn should_compress(&self, total_len: usize) -> bool {
        self.0.should_compress(total_len)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn repetitive_data() -> Vec<u8> {
        b"Hello, world! This is test data. "
            .iter()
            .copied()
            .cycle()
            .take(1024)
            .collect()
    }

    #[cfg(feature = "zlib-codec")]
    #[test]
    fn zlib_compress_decompress_roundtrip() {
        let codec = ZlibCodec::default();
        let data = repetitive_data();
        let compressed = codec.compress(&data).unwrap();
        assert!(compressed.len() < data.len());
        assert_eq!(codec.decompress(&compressed).unwrap(), data);
    }

    #[cfg(feature = "zlib-codec")]
    #[test]
    fn zlib_rejects_truncated_stream() {
        let codec = ZlibCodec::default();
        let compressed = codec.compress(&repetitive_data()).unwrap();
        let cut = &compressed[..compressed.len() - 3];
        let err = codec.decompress(cut).unwrap_err();
        assert!(matches!(err, ApplyError::Decompression(_)));
    }

    #[cfg(feature = "zlib-codec")]
    #[test]
    fn zlib_rejects_garbage() {
        let codec = ZlibCodec::default();
        assert!(codec.decompress(&[0xAA; 64]).is_err());
    }

    #[cfg(feature = "lzma-codec")]
    #[test]
    fn lzma_compress_decompress_roundtrip() {
        let codec = LzmaCodec;
        let data = repetitive_data();
        let compressed = codec.compress(&data).unwrap();
        assert!(compressed.len() < data.len());
        assert_eq!(codec.decompress(&compressed).unwrap(), data);
    }

    #[test]
    fn raw_is_passthrough_and_never_compresses() {
        let codec = RawCodec;
        let data = repetitive_data();
        assert_eq!(codec.compress(&data).unwrap(), data);
        assert_eq!(codec.decompress(&data).unwrap(), data);
        assert!(!codec.should_compress(1 << 20));
    }

    #[test]
    fn default_threshold_skips_tiny_streams() {
        #[cfg(feature = "zlib-codec")]
        {
            let codec = ZlibCodec::default();
            assert!(!codec.should_compress(MIN_COMPRESS_SIZE - 1));
            assert!(codec.should_compress(MIN_COMPRESS_SIZE));
        }
    }

    #[test]
    fn for_id_resolves_known_ids() {
        assert_eq!(for_id(RAW_ID).unwrap().id(), RAW_ID);
        #[cfg(feature = "zlib-codec")]
        assert_eq!(for_id(ZLIB_ID).unwrap().id(), ZLIB_ID);
        #[cfg(feature = "lzma-codec")]
        assert_eq!(for_id(LZMA_ID).unwrap().id(), LZMA_ID);
        assert!(for_id(0x00).is_none());
        assert!(for_id(b'?').is_none());
    }

    #[test]
    fn codec_names() {
        assert_eq!(codec_name(RAW_ID), Some("none"));
        assert_eq!(codec_name(ZLIB_ID), Some("zlib"));
        assert_eq!(codec_name(LZMA_ID), Some("lzma"));
        assert_eq!(codec_name(b'q'), None);
    }

    #[test]
    fn custom_codec_through_selection() {
        struct Shift;
        impl ByteCodec for Shift {
            fn id(&self) -> u8 {
                b'S'
            }
            fn compress(&self, data: &[u8]) -> io::Result<Vec<u8>> {
                Ok(data.iter().map(|b| b.wrapping_add(1)).collect())
            }
            fn decompress(&self, data: &[u8]) -> Result<Vec<u8>, ApplyError> {
                Ok(data.iter().map(|b| b.wrapping_sub(1)).collect())
            }
        }

        let codec = Codec::Custom(std::sync::Arc::new(Shift));
        let backend = codec.backend();
        assert_eq!(backend.id(), b'S');
        let out = backend.compress(b"abc").unwrap();
        assert_eq!(backend.decompress(&out).unwrap(), b"abc");
    }
}
