// The encode scan.
//
// Walks the new file left to right. At each probe position the suffix
// index supplies the longest old-file match; the drift score tracks how
// well the previous record's alignment still covers the probed bytes.
// A record is emitted when the fresh match beats that alignment, with
// forward and backward extension growing the copy regions around it.

use crate::patch::control::ControlRecord;
use crate::suffix::SuffixIndex;

use super::extend::{extend_backward, extend_forward, resolve_overlap};
use super::DiffError;

/// A fresh match must beat the drifted alignment by more than this many
/// bytes to force a new record while the old alignment still covers the
/// probe position.
const SCORE_SLACK: i64 = 8;

/// Raw scan output, before container framing and compression.
#[derive(Debug, Default, Clone)]
pub struct RawPatch {
    /// Control records in emission order.
    pub controls: Vec<ControlRecord>,
    /// Byte-wise differences backing the copy region of every record.
    pub diff: Vec<u8>,
    /// Literal bytes backing the extra region of every record.
    pub extra: Vec<u8>,
}

/// Cursor state of the scan. One [`step`](ScanState::step) call advances
/// past one candidate match and emits at most one control record.
#[derive(Debug, Default, Clone)]
pub struct ScanState {
    /// Next probe position in the new file.
    scan: usize,
    /// Length of the current candidate match.
    match_len: usize,
    /// Old-file offset of the current candidate match.
    match_pos: usize,
    /// End of the last emitted record in the new file.
    new_pos: usize,
    /// Old-file position paired with `new_pos`.
    old_pos: usize,
    /// Alignment shift (old minus new) carried by the last record.
    drift: i64,
}

impl ScanState {
    pub fn new() -> Self {
        Self::default()
    }

    /// True once every new-file byte is covered by an emitted record.
    pub fn finished(&self, new: &[u8]) -> bool {
        self.scan >= new.len()
    }

    /// Advance past the current candidate, probe for the next one and
    /// emit a control record if the alignment broke. Appends the
    /// record's stream fragments to `diff` and `extra`.
    pub fn step(
        &mut self,
        index: &SuffixIndex<'_>,
        new: &[u8],
        diff: &mut Vec<u8>,
        extra: &mut Vec<u8>,
    ) -> Option<ControlRecord> {
        let old = index.old();
        self.scan += self.match_len;
        let mut scored_to = self.scan;
        let mut old_score: i64 = 0;

        while self.scan < new.len() {
            let hint = (self.scan as i64 + self.drift).clamp(0, old.len() as i64) as usize;
            let found = index.longest_match(&new[self.scan..], hint);
            self.match_pos = found.offset;
            self.match_len = found.len;

            while scored_to < self.scan + self.match_len {
                if drifted_byte(old, scored_to, self.drift) == Some(new[scored_to]) {
                    old_score += 1;
                }
                scored_to += 1;
            }

            let len = self.match_len as i64;
            if (len == old_score && len != 0) || len > old_score + SCORE_SLACK {
                break;
            }

            // The probe byte leaves the scoring window.
            if drifted_byte(old, self.scan, self.drift) == Some(new[self.scan]) {
                old_score -= 1;
            }
            self.scan += 1;
        }

        if self.match_len as i64 != old_score || self.scan == new.len() {
            Some(self.emit(old, new, diff, extra))
        } else {
            None
        }
    }

    fn emit(
        &mut self,
        old: &[u8],
        new: &[u8],
        diff: &mut Vec<u8>,
        extra: &mut Vec<u8>,
    ) -> ControlRecord {
        let mut lenf = extend_forward(old, new, self.old_pos, self.new_pos, self.scan);
        let mut lenb = 0;
        if self.scan < new.len() {
            lenb = extend_backward(old, new, self.match_pos, self.scan, self.new_pos);
        }
        (lenf, lenb) = resolve_overlap(
            old,
            new,
            self.old_pos,
            self.new_pos,
            lenf,
            self.match_pos,
            self.scan,
            lenb,
        );

        for (n, o) in new[self.new_pos..self.new_pos + lenf]
            .iter()
            .zip(&old[self.old_pos..self.old_pos + lenf])
        {
            diff.push(n.wrapping_sub(*o));
        }
        let gap_start = self.new_pos + lenf;
        let gap_end = self.scan - lenb;
        extra.extend_from_slice(&new[gap_start..gap_end]);

        let record = ControlRecord {
            copy: lenf as u64,
            extra: (gap_end - gap_start) as u64,
            seek: (self.match_pos as i64 - lenb as i64) - (self.old_pos as i64 + lenf as i64),
        };

        self.new_pos = self.scan - lenb;
        self.old_pos = self.match_pos - lenb;
        self.drift = self.old_pos as i64 - self.new_pos as i64;
        record
    }
}

/// Old-file byte at `pos` shifted by `drift`, if in bounds.
#[inline]
fn drifted_byte(old: &[u8], pos: usize, drift: i64) -> Option<u8> {
    let at = pos as i64 + drift;
    if 0 <= at && at < old.len() as i64 {
        Some(old[at as usize])
    } else {
        None
    }
}

/// Scan `new` against an already-built index.
pub fn encode_with_index(index: &SuffixIndex<'_>, new: &[u8]) -> RawPatch {
    let mut patch = RawPatch::default();
    let mut state = ScanState::new();
    while !state.finished(new) {
        if let Some(record) = state.step(index, new, &mut patch.diff, &mut patch.extra) {
            patch.controls.push(record);
        }
    }
    log::debug!(
        "scan emitted {} records ({} diff bytes, {} extra bytes)",
        patch.controls.len(),
        patch.diff.len(),
        patch.extra.len()
    );
    patch
}

/// Index `old`, then scan `new` against it.
pub fn encode(old: &[u8], new: &[u8]) -> Result<RawPatch, DiffError> {
    let index = SuffixIndex::build(old)?;
    Ok(encode_with_index(&index, new))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patch::apply::apply_streams;

    fn replay(old: &[u8], patch: &RawPatch, new_len: usize) -> Vec<u8> {
        let mut control = Vec::new();
        for record in &patch.controls {
            record.write_into(&mut control);
        }
        apply_streams(old, &control, &patch.diff, &patch.extra, new_len).unwrap()
    }

    #[test]
    fn identity_produces_a_single_covering_record() {
        let data = b"identical on both sides";
        let patch = encode(data, data).unwrap();
        assert_eq!(patch.controls.len(), 1);
        assert_eq!(patch.controls[0].copy, data.len() as u64);
        assert_eq!(patch.controls[0].extra, 0);
        assert!(patch.diff.iter().all(|&b| b == 0));
        assert!(patch.extra.is_empty());
    }

    #[test]
    fn single_byte_change_stays_one_record() {
        let old = b"abcdefgh";
        let new = b"abcXefgh";
        let patch = encode(old, new).unwrap();
        assert_eq!(patch.controls.len(), 1);
        assert_eq!(
            patch.controls[0],
            ControlRecord {
                copy: 8,
                extra: 0,
                seek: -4,
            }
        );
        let expect = [0, 0, 0, b'X'.wrapping_sub(b'd'), 0, 0, 0, 0];
        assert_eq!(patch.diff, expect);
        assert!(patch.extra.is_empty());
    }

    #[test]
    fn empty_old_emits_pure_literals() {
        let patch = encode(b"", b"payload").unwrap();
        assert_eq!(patch.controls.len(), 1);
        assert_eq!(patch.controls[0].copy, 0);
        assert_eq!(patch.controls[0].extra, 7);
        assert_eq!(patch.controls[0].seek, 0);
        assert!(patch.diff.is_empty());
        assert_eq!(patch.extra, b"payload");
    }

    #[test]
    fn empty_new_emits_nothing() {
        let patch = encode(b"some old bytes", b"").unwrap();
        assert!(patch.controls.is_empty());
        assert!(patch.diff.is_empty());
        assert!(patch.extra.is_empty());
    }

    #[test]
    fn appended_tail_lands_in_the_extra_stream() {
        let old = b"The quick brown fox";
        let new = b"The quick brown fox jumps";
        let patch = encode(old, new).unwrap();
        assert_eq!(patch.controls.len(), 1);
        assert_eq!(patch.controls[0].copy, 19);
        assert_eq!(patch.controls[0].extra, 6);
        assert!(patch.diff.iter().all(|&b| b == 0));
        assert_eq!(patch.extra, b" jumps");
    }

    #[test]
    fn records_cover_the_new_file_exactly() {
        let old = b"the five boxing wizards jump quickly over the lazy dog";
        let new = b"the five BOXING wizards quickly jump over one lazy dog!";
        let patch = encode(old, new).unwrap();
        let covered: u64 = patch
            .controls
            .iter()
            .map(|r| r.copy + r.extra)
            .sum();
        assert_eq!(covered, new.len() as u64);
        assert_eq!(patch.diff.len() + patch.extra.len(), new.len());
        assert_eq!(replay(old, &patch, new.len()), new);
    }

    #[test]
    fn replay_round_trips_shuffled_blocks() {
        let mut state = 0x9E37_79B9_7F4A_7C15u64;
        let mut old = Vec::with_capacity(4096);
        for _ in 0..4096 {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            old.push((state >> 33) as u8);
        }
        // Swap two blocks and corrupt a few bytes in between.
        let mut new = old.clone();
        new.copy_within(0..1024, 2048);
        new.copy_within(1024..2048, 0);
        for i in (1500..1600).step_by(7) {
            new[i] ^= 0x5A;
        }
        let patch = encode(&old, &new).unwrap();
        assert!(patch.controls.len() > 1);
        assert_eq!(replay(&old, &patch, new.len()), new);
    }

    #[test]
    fn step_holds_fire_while_the_alignment_covers_the_probe() {
        let data = b"stable prefix stable suffix";
        let index = SuffixIndex::build(data).unwrap();
        let mut state = ScanState::new();
        let mut diff = Vec::new();
        let mut extra = Vec::new();

        // First step locks onto the full-length match without emitting.
        assert!(state.step(&index, data, &mut diff, &mut extra).is_none());
        assert!(!state.finished(data));

        // Second step runs off the end and flushes the single record.
        let record = state.step(&index, data, &mut diff, &mut extra).unwrap();
        assert_eq!(record.copy, data.len() as u64);
        assert!(state.finished(data));
    }
}
