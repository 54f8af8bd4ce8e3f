// Patch replay: reconstruct the new file from old file + decoded streams.
//
// The replay loop is strict: every copy is bounds-checked against the old
// file, every stream read against its stream, and every output advance
// against the declared length. A patch built against a different old file
// of the same length still reconstructs silently-wrong output (the format
// carries no old-file checksum); everything else is rejected.

use thiserror::Error;

use super::container;
use super::control::ControlRecord;
use super::offt;

/// Errors from container decoding and patch replay.
#[derive(Debug, Error)]
pub enum ApplyError {
    /// The container framing is invalid (magic, header fields, stream
    /// lengths that overrun the buffer).
    #[error("invalid patch container: {0}")]
    Format(String),
    /// A compressed stream was rejected by its codec.
    #[error("stream decompression failed: {0}")]
    Decompression(String),
    /// Control-record replay violated a bound or exhausted a stream.
    #[error("corrupt patch: {0}")]
    Corrupt(String),
    /// An output or stream buffer could not be allocated.
    #[error("failed to allocate {bytes} bytes")]
    Alloc {
        /// Requested allocation size.
        bytes: usize,
    },
}

/// Apply a patch container to `old`, returning the reconstructed file.
///
/// # Example
///
/// ```
/// let old = b"hello old world";
/// let new = b"hello new world";
/// let patch = bsdelta::engine::create_patch(old, new).unwrap();
/// assert_eq!(bsdelta::patch::apply::apply(old, &patch).unwrap(), new);
/// ```
pub fn apply(old: &[u8], patch: &[u8]) -> Result<Vec<u8>, ApplyError> {
    let decoded = container::decode_container(patch)?;
    let new_len = usize::try_from(decoded.new_len)
        .map_err(|_| ApplyError::Format("declared length exceeds address space".into()))?;
    apply_streams(old, &decoded.control, &decoded.diff, &decoded.extra, new_len)
}

/// Replay decoded raw streams against `old`.
///
/// `new_len` is the declared output length; replay stops exactly there.
/// Control records remaining after that point are ignored, matching the
/// classic decoder's loop condition.
pub fn apply_streams(
    old: &[u8],
    control: &[u8],
    diff: &[u8],
    extra: &[u8],
    new_len: usize,
) -> Result<Vec<u8>, ApplyError> {
    let mut new = Vec::new();
    new.try_reserve_exact(new_len)
        .map_err(|_| ApplyError::Alloc { bytes: new_len })?;

    let mut ctrl = control;
    let mut old_pos: i64 = 0;
    let mut diff_pos: usize = 0;
    let mut extra_pos: usize = 0;
    let mut records: u64 = 0;

    while new.len() < new_len {
        let rec = next_record(&mut ctrl)?;
        records += 1;

        let copy = usize::try_from(rec.copy)
            .map_err(|_| ApplyError::Corrupt("copy length exceeds address space".into()))?;
        let extra_len = usize::try_from(rec.extra)
            .map_err(|_| ApplyError::Corrupt("extra length exceeds address space".into()))?;

        if copy > 0 {
            if copy > new_len - new.len() {
                return Err(ApplyError::Corrupt(format!(
                    "copy of {copy} overruns declared length {new_len}"
                )));
            }
            if old_pos < 0 {
                return Err(ApplyError::Corrupt(format!(
                    "old cursor at {old_pos} before a copy of {copy}"
                )));
            }
            let start = old_pos as usize;
            let end = start
                .checked_add(copy)
                .filter(|&end| end <= old.len())
                .ok_or_else(|| {
                    ApplyError::Corrupt(format!(
                        "copy of {copy} at old offset {start} overruns old length {}",
                        old.len()
                    ))
                })?;
            let adjust = diff
                .get(diff_pos..diff_pos + copy)
                .ok_or_else(|| ApplyError::Corrupt("diff stream exhausted".into()))?;
            for (o, d) in old[start..end].iter().zip(adjust) {
                new.push(o.wrapping_add(*d));
            }
            diff_pos += copy;
            old_pos += copy as i64;
        }

        if extra_len > 0 {
            if extra_len > new_len - new.len() {
                return Err(ApplyError::Corrupt(format!(
                    "extra of {extra_len} overruns declared length {new_len}"
                )));
            }
            let literal = extra
                .get(extra_pos..extra_pos + extra_len)
                .ok_or_else(|| ApplyError::Corrupt("extra stream exhausted".into()))?;
            new.extend_from_slice(literal);
            extra_pos += extra_len;
        }

        old_pos = old_pos
            .checked_add(rec.seek)
            .ok_or_else(|| ApplyError::Corrupt("old cursor overflow".into()))?;
    }

    log::debug!(
        "replayed {records} control records into {} bytes (diff {diff_pos}, extra {extra_pos})",
        new.len()
    );
    Ok(new)
}

fn next_record(ctrl: &mut &[u8]) -> Result<ControlRecord, ApplyError> {
    let copy = take_i64(ctrl)?;
    let extra = take_i64(ctrl)?;
    let seek = take_i64(ctrl)?;
    ControlRecord::from_wire(copy, extra, seek)
        .ok_or_else(|| ApplyError::Corrupt("negative length in control record".into()))
}

fn take_i64(ctrl: &mut &[u8]) -> Result<i64, ApplyError> {
    let (value, rest) = offt::read_i64(ctrl)
        .ok_or_else(|| ApplyError::Corrupt("control stream exhausted".into()))?;
    *ctrl = rest;
    Ok(value)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
