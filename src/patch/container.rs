// Container framing: compress the three raw streams into a patch blob and
// decode a blob back into raw streams.
//
// Layout (fixed-width fields, see `header`):
//   [ 32-byte header | compressed control | compressed diff | compressed extra ]
// The extra stream runs to the end of the container, so only the first two
// compressed lengths are stored.

use std::io;

use crate::codec::{self, ByteCodec};

use super::apply::ApplyError;
use super::control::{CONTROL_SIZE, ControlRecord};
use super::header::{HEADER_LEN, PatchHeader};

/// Decoded, decompressed container contents.
#[derive(Debug)]
pub struct DecodedPatch {
    /// Raw control stream.
    pub control: Vec<u8>,
    /// Raw diff stream.
    pub diff: Vec<u8>,
    /// Raw extra stream.
    pub extra: Vec<u8>,
    /// Declared length of the reconstructed file.
    pub new_len: u64,
    /// Codec id the container was framed with.
    pub codec_id: u8,
}

/// Serialize control records and compress all three streams into a
/// complete patch container.
pub fn encode_container(
    records: &[ControlRecord],
    diff: &[u8],
    extra: &[u8],
    new_len: u64,
    codec: &dyn ByteCodec,
) -> io::Result<Vec<u8>> {
    let mut control = Vec::with_capacity(records.len() * CONTROL_SIZE);
    for record in records {
        record.write_into(&mut control);
    }

    let (control_c, diff_c, extra_c) = compress_streams(codec, &control, diff, extra)?;

    let header = PatchHeader {
        codec_id: codec.id(),
        ctrl_len: control_c.len() as u64,
        diff_len: diff_c.len() as u64,
        new_len,
    };

    let mut out =
        Vec::with_capacity(HEADER_LEN + control_c.len() + diff_c.len() + extra_c.len());
    out.extend_from_slice(&header.encode());
    out.extend_from_slice(&control_c);
    out.extend_from_slice(&diff_c);
    out.extend_from_slice(&extra_c);

    log::debug!(
        "container framed: codec '{}', raw {}+{}+{} compressed {}+{}+{}",
        codec.id() as char,
        control.len(),
        diff.len(),
        extra.len(),
        control_c.len(),
        diff_c.len(),
        extra_c.len()
    );
    Ok(out)
}

#[cfg(feature = "parallel")]
fn compress_streams(
    codec: &dyn ByteCodec,
    control: &[u8],
    diff: &[u8],
    extra: &[u8],
) -> io::Result<(Vec<u8>, Vec<u8>, Vec<u8>)> {
    // The streams are independent, so the result is byte-identical to the
    // sequential path.
    let (control_c, (diff_c, extra_c)) = rayon::join(
        || codec.compress(control),
        || rayon::join(|| codec.compress(diff), || codec.compress(extra)),
    );
    Ok((control_c?, diff_c?, extra_c?))
}

#[cfg(not(feature = "parallel"))]
fn compress_streams(
    codec: &dyn ByteCodec,
    control: &[u8],
    diff: &[u8],
    extra: &[u8],
) -> io::Result<(Vec<u8>, Vec<u8>, Vec<u8>)> {
    Ok((
        codec.compress(control)?,
        codec.compress(diff)?,
        codec.compress(extra)?,
    ))
}

/// Decode a container, resolving its codec from the magic tag.
pub fn decode_container(patch: &[u8]) -> Result<DecodedPatch, ApplyError> {
    let header = PatchHeader::decode(patch)?;
    let codec = codec::for_id(header.codec_id).ok_or_else(|| {
        ApplyError::Format(format!(
            "unknown codec id {:#04x} in magic tag",
            header.codec_id
        ))
    })?;
    decode_with(patch, &header, codec.as_ref())
}

/// Decode a container framed with a caller-provided codec.
///
/// The supplied codec's id must match the container's eighth magic byte;
/// built-in ids keep working through [`decode_container`].
pub fn decode_container_with_codec(
    patch: &[u8],
    codec: &dyn ByteCodec,
) -> Result<DecodedPatch, ApplyError> {
    let header = PatchHeader::decode(patch)?;
    if header.codec_id != codec.id() {
        return Err(ApplyError::Format(format!(
            "container codec id {:#04x} does not match supplied codec id {:#04x}",
            header.codec_id,
            codec.id()
        )));
    }
    decode_with(patch, &header, codec)
}

fn decode_with(
    patch: &[u8],
    header: &PatchHeader,
    codec: &dyn ByteCodec,
) -> Result<DecodedPatch, ApplyError> {
    let body = &patch[HEADER_LEN..];
    let ctrl_len = stream_len(header.ctrl_len, "control")?;
    let diff_len = stream_len(header.diff_len, "diff")?;

    let total = ctrl_len
        .checked_add(diff_len)
        .filter(|&total| total <= body.len())
        .ok_or_else(|| {
            ApplyError::Format(format!(
                "declared stream lengths {}+{} overrun container body of {} bytes",
                ctrl_len,
                diff_len,
                body.len()
            ))
        })?;
    debug_assert!(total <= body.len());

    let (control_c, rest) = body.split_at(ctrl_len);
    let (diff_c, extra_c) = rest.split_at(diff_len);

    let control = codec.decompress(control_c)?;
    let diff = codec.decompress(diff_c)?;
    let extra = codec.decompress(extra_c)?;

    Ok(DecodedPatch {
        control,
        diff,
        extra,
        new_len: header.new_len,
        codec_id: header.codec_id,
    })
}

fn stream_len(len: u64, name: &str) -> Result<usize, ApplyError> {
    usize::try_from(len)
        .map_err(|_| ApplyError::Format(format!("{name} length exceeds address space")))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::RawCodec;

    fn sample_records() -> Vec<ControlRecord> {
        vec![
            ControlRecord {
                copy: 10,
                extra: 2,
                seek: -4,
            },
            ControlRecord {
                copy: 0,
                extra: 7,
                seek: 0,
            },
        ]
    }

    fn roundtrip_with(codec: &dyn ByteCodec) {
        let records = sample_records();
        let diff = vec![0u8, 0, 1, 0, 0, 0, 0, 0, 0, 255];
        let extra = b"extrabytes".to_vec();

        let blob = encode_container(&records, &diff, &extra, 19, codec).unwrap();
        let decoded = decode_container(&blob).unwrap();

        assert_eq!(decoded.codec_id, codec.id());
        assert_eq!(decoded.new_len, 19);
        assert_eq!(decoded.diff, diff);
        assert_eq!(decoded.extra, extra);
        assert_eq!(
            crate::patch::control::parse_stream(&decoded.control).unwrap(),
            records
        );
    }

    #[test]
    fn roundtrip_raw() {
        roundtrip_with(&RawCodec);
    }

    #[cfg(feature = "zlib-codec")]
    #[test]
    fn roundtrip_zlib() {
        roundtrip_with(&crate::codec::ZlibCodec::default());
    }

    #[cfg(feature = "lzma-codec")]
    #[test]
    fn roundtrip_lzma() {
        roundtrip_with(&crate::codec::LzmaCodec);
    }

    #[test]
    fn rejects_unknown_codec_id() {
        let mut blob = encode_container(&sample_records(), &[0; 12], b"x", 13, &RawCodec).unwrap();
        blob[7] = b'?';
        let err = decode_container(&blob).unwrap_err();
        assert!(matches!(err, ApplyError::Format(_)), "{err}");
    }

    #[test]
    fn rejects_stream_lengths_overrunning_body() {
        let blob = encode_container(&sample_records(), &[0; 12], b"x", 13, &RawCodec).unwrap();
        for at in [8usize, 16] {
            let mut bad = blob.clone();
            bad[at..at + 8]
                .copy_from_slice(&crate::patch::offt::encode_i64(blob.len() as i64));
            let err = decode_container(&bad).unwrap_err();
            assert!(matches!(err, ApplyError::Format(_)), "field at {at}: {err}");
        }
    }

    #[test]
    fn raw_truncation_shortens_extra_stream_only() {
        // With the raw codec a trailing cut is invisible to the framing
        // layer; the replay loop is what catches it.
        let blob = encode_container(&sample_records(), &[0; 12], b"extrabytes", 19, &RawCodec)
            .unwrap();
        let decoded = decode_container(&blob[..blob.len() - 4]).unwrap();
        assert_eq!(decoded.extra, b"extrab");
    }

    #[test]
    fn mismatched_custom_codec_is_rejected() {
        struct Tagged(u8);
        impl ByteCodec for Tagged {
            fn id(&self) -> u8 {
                self.0
            }
            fn compress(&self, data: &[u8]) -> io::Result<Vec<u8>> {
                Ok(data.to_vec())
            }
            fn decompress(&self, data: &[u8]) -> Result<Vec<u8>, ApplyError> {
                Ok(data.to_vec())
            }
        }

        let blob = encode_container(&[], &[], &[], 0, &Tagged(b'A')).unwrap();
        assert!(decode_container_with_codec(&blob, &Tagged(b'A')).is_ok());
        let err = decode_container_with_codec(&blob, &Tagged(b'B')).unwrap_err();
        assert!(matches!(err, ApplyError::Format(_)), "{err}");
        // Unknown to the built-in table.
        assert!(decode_container(&blob).is_err());
    }

    #[test]
    fn empty_streams_frame_cleanly() {
        let blob = encode_container(&[], &[], &[], 0, &RawCodec).unwrap();
        assert_eq!(blob.len(), HEADER_LEN);
        let decoded = decode_container(&blob).unwrap();
        assert!(decoded.control.is_empty());
        assert!(decoded.diff.is_empty());
        assert!(decoded.extra.is_empty());
        assert_eq!(decoded.new_len, 0);
    }
}
