// Delta engine: ties suffix matching to container encoding/decoding.
//
// Provides the high-level create/apply APIs that orchestrate:
//   - Suffix indexing and the encode scan (suffix, diff modules)
//   - Container framing and stream compression (patch, codec modules)
//   - Replay of a decoded container against the old file

use crate::codec::{ByteCodec, Codec, RawCodec};
use crate::diff::{self, DiffError};
use crate::patch::apply::{self, ApplyError};
use crate::patch::container;
use crate::patch::control::CONTROL_SIZE;

// ---------------------------------------------------------------------------
// Patch options
// ---------------------------------------------------------------------------

/// Configuration for patch creation.
#[derive(Debug, Clone)]
pub struct PatchOptions {
    /// Codec for the three container streams.
    pub codec: Codec,
}

impl Default for PatchOptions {
    /// Prefers zlib at level 9, then LZMA, then raw framing, depending on
    /// the compiled codec features.
    fn default() -> Self {
        #[cfg(feature = "zlib-codec")]
        let codec = Codec::Zlib { level: 9 };
        #[cfg(all(feature = "lzma-codec", not(feature = "zlib-codec")))]
        let codec = Codec::Lzma;
        #[cfg(all(not(feature = "zlib-codec"), not(feature = "lzma-codec")))]
        let codec = Codec::Raw;
        Self { codec }
    }
}

// ---------------------------------------------------------------------------
// High-level create
// ---------------------------------------------------------------------------

/// Create a patch that transforms `old` into `new`, using the default
/// options.
///
/// Identical inputs and options always produce a byte-identical patch.
pub fn create_patch(old: &[u8], new: &[u8]) -> Result<Vec<u8>, DiffError> {
    create_patch_with_options(old, new, &PatchOptions::default())
}

/// Create a patch with explicit options.
pub fn create_patch_with_options(
    old: &[u8],
    new: &[u8],
    opts: &PatchOptions,
) -> Result<Vec<u8>, DiffError> {
    let raw = diff::encode(old, new)?;
    let backend = opts.codec.backend();

    // Streams below the codec threshold are framed raw.
    let total = raw.controls.len() * CONTROL_SIZE + raw.diff.len() + raw.extra.len();
    let codec: &dyn ByteCodec = if backend.should_compress(total) {
        backend.as_ref()
    } else {
        &RawCodec
    };

    let patch = container::encode_container(
        &raw.controls,
        &raw.diff,
        &raw.extra,
        new.len() as u64,
        codec,
    )?;

    log::info!(
        "patch created: old {} bytes, new {} bytes, patch {} bytes, {} records",
        old.len(),
        new.len(),
        patch.len(),
        raw.controls.len()
    );
    Ok(patch)
}

// ---------------------------------------------------------------------------
// High-level apply
// ---------------------------------------------------------------------------

/// Apply a patch to `old`, reconstructing the new file.
///
/// The codec is resolved from the patch's magic tag. Rejects any patch
/// whose container or control stream is malformed.
pub fn apply_patch(old: &[u8], patch: &[u8]) -> Result<Vec<u8>, ApplyError> {
    apply::apply(old, patch)
}

/// Apply a patch framed with a caller-provided codec, for containers
/// created through [`Codec::Custom`].
pub fn apply_patch_with_codec(
    old: &[u8],
    patch: &[u8],
    codec: &dyn ByteCodec,
) -> Result<Vec<u8>, ApplyError> {
    let decoded = container::decode_container_with_codec(patch, codec)?;
    let new_len = usize::try_from(decoded.new_len)
        .map_err(|_| ApplyError::Format("declared length exceeds address space".into()))?;
    apply::apply_streams(old, &decoded.control, &decoded.diff, &decoded.extra, new_len)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
