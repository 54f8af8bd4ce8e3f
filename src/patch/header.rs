// Patch container header.
//
// Fixed 32-byte layout:
//   offset  0: 8-byte magic tag ("BSDELTA" + one codec id byte)
//   offset  8: compressed control-stream length
//   offset 16: compressed diff-stream length
//   offset 24: declared length of the reconstructed new file
// The three length fields use the sign-magnitude encoding from `offt`.

use super::apply::ApplyError;
use super::offt::{self, OFFT_SIZE};

/// First seven bytes of every patch container.
pub const MAGIC_STEM: &[u8; 7] = b"BSDELTA";

/// Total magic length including the codec id byte.
pub const MAGIC_LEN: usize = 8;

/// Fixed header length.
pub const HEADER_LEN: usize = 32;

/// Decoded container header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatchHeader {
    /// Stream codec identifier, stored as the eighth magic byte.
    pub codec_id: u8,
    /// Byte length of the compressed control stream.
    pub ctrl_len: u64,
    /// Byte length of the compressed diff stream.
    pub diff_len: u64,
    /// Declared length of the reconstructed file.
    pub new_len: u64,
}

impl PatchHeader {
    /// Serialize into the fixed 32-byte wire form.
    pub fn encode(&self) -> [u8; HEADER_LEN] {
        let mut buf = [0u8; HEADER_LEN];
        buf[..7].copy_from_slice(MAGIC_STEM);
        buf[7] = self.codec_id;
        buf[8..16].copy_from_slice(&offt::encode_i64(self.ctrl_len as i64));
        buf[16..24].copy_from_slice(&offt::encode_i64(self.diff_len as i64));
        buf[24..32].copy_from_slice(&offt::encode_i64(self.new_len as i64));
        buf
    }

    /// Parse and validate the header at the front of `patch`.
    ///
    /// Rejects short input, a foreign magic stem, and negative length
    /// fields. The codec id byte is validated later, when the container
    /// decoder resolves it to a codec.
    pub fn decode(patch: &[u8]) -> Result<Self, ApplyError> {
        if patch.len() < HEADER_LEN {
            return Err(ApplyError::Format(format!(
                "container too short: {} bytes, fixed header needs {HEADER_LEN}",
                patch.len()
            )));
        }
        if &patch[..7] != MAGIC_STEM {
            return Err(ApplyError::Format("bad magic tag".into()));
        }

        let ctrl_len = field(patch, 8);
        let diff_len = field(patch, 16);
        let new_len = field(patch, 24);
        for (name, value) in [
            ("control length", ctrl_len),
            ("diff length", diff_len),
            ("new-file length", new_len),
        ] {
            if value < 0 {
                return Err(ApplyError::Format(format!(
                    "negative {name} field: {value}"
                )));
            }
        }

        Ok(Self {
            codec_id: patch[7],
            ctrl_len: ctrl_len as u64,
            diff_len: diff_len as u64,
            new_len: new_len as u64,
        })
    }
}

fn field(patch: &[u8], at: usize) -> i64 {
    let mut chunk = [0u8; OFFT_SIZE];
    chunk.copy_from_slice(&patch[at..at + OFFT_SIZE]);
    offt::decode_i64(&chunk)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
