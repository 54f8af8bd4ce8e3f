// Control records: the replay instructions of a patch.
//
// One record reconstructs one contiguous piece of the new file: `copy`
// bytes taken from the old file and combined with diff-stream bytes, then
// `extra` literal bytes from the extra stream, then a signed `seek` of the
// old-file cursor before the next record's copy begins.

use super::offt::{self, OFFT_SIZE};

/// Serialized size of one control record.
pub const CONTROL_SIZE: usize = 3 * OFFT_SIZE;

/// One reconstruction step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlRecord {
    /// Bytes copied from the old file and adjusted with diff-stream bytes.
    pub copy: u64,
    /// Literal bytes appended from the extra stream.
    pub extra: u64,
    /// Old-file cursor adjustment applied after the copy is consumed.
    pub seek: i64,
}

impl ControlRecord {
    /// Append the 24-byte wire form to `out`.
    pub fn write_into(&self, out: &mut Vec<u8>) {
        offt::write_i64(out, self.copy as i64);
        offt::write_i64(out, self.extra as i64);
        offt::write_i64(out, self.seek);
    }

    /// Build a record from decoded wire integers.
    ///
    /// Returns `None` when `copy` or `extra` is negative; those fields are
    /// lengths and a negative value can only come from corrupt data.
    pub fn from_wire(copy: i64, extra: i64, seek: i64) -> Option<Self> {
        if copy < 0 || extra < 0 {
            return None;
        }
        Some(Self {
            copy: copy as u64,
            extra: extra as u64,
            seek,
        })
    }
}

/// Parse a complete control stream into records.
///
/// Returns `None` if the stream length is not a whole number of records or
/// any record carries a negative length. The replay path in
/// [`apply`](super::apply) does its own incremental reads; this helper
/// serves inspection tools and tests.
pub fn parse_stream(mut buf: &[u8]) -> Option<Vec<ControlRecord>> {
    if buf.len() % CONTROL_SIZE != 0 {
        return None;
    }
    let mut records = Vec::with_capacity(buf.len() / CONTROL_SIZE);
    while !buf.is_empty() {
        let (copy, rest) = offt::read_i64(buf)?;
        let (extra, rest) = offt::read_i64(rest)?;
        let (seek, rest) = offt::read_i64(rest)?;
        records.push(ControlRecord::from_wire(copy, extra, seek)?);
        buf = rest;
    }
    Some(records)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
