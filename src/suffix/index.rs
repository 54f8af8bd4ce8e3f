// Searchable suffix index over the old file.
//
// A thin wrapper around the sorted suffix order: binary search narrows to
// the neighborhood with the longest shared prefix, then a short bounded
// walk over tied entries picks the offset closest to the caller's hint.
// The hint bias keeps consecutive matches near each other in the old
// file, which shrinks the seek deltas the control stream has to encode.

use std::cmp::Ordering;

use super::sort::{self, SuffixAllocError};

/// How many tied entries to examine on each side of the binary search
/// result when applying the hint. Ties beyond the cap keep the nearest
/// offset found inside it.
const TIE_SCAN_CAP: usize = 32;

/// A match located in the indexed old file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuffixMatch {
    /// Offset in the old file where the match starts.
    pub offset: usize,
    /// Number of leading query bytes that match.
    pub len: usize,
}

/// Sorted suffix order over a borrowed old file.
#[derive(Debug)]
pub struct SuffixIndex<'a> {
    old: &'a [u8],
    order: Vec<i64>,
}

impl<'a> SuffixIndex<'a> {
    /// Build the index. Cost is O(N log N) time and two N+1 word arrays;
    /// the index borrows `old` and can serve any number of queries.
    pub fn build(old: &'a [u8]) -> Result<Self, SuffixAllocError> {
        let order = sort::suffix_order(old)?;
        log::debug!("suffix index built over {} bytes", old.len());
        Ok(Self { old, order })
    }

    /// The bytes this index was built over.
    pub fn old(&self) -> &'a [u8] {
        self.old
    }

    /// Find the longest old-file prefix of `query`. Among equally long
    /// matches the offset nearest `hint` wins, then the smaller offset,
    /// so results are deterministic.
    pub fn longest_match(&self, query: &[u8], hint: usize) -> SuffixMatch {
        if self.old.is_empty() || query.is_empty() {
            return SuffixMatch { offset: 0, len: 0 };
        }

        let mut lo = 0usize;
        let mut hi = self.order.len() - 1;
        while hi - lo >= 2 {
            let mid = lo + (hi - lo) / 2;
            if suffix_less(self.old, self.order[mid] as usize, query) {
                lo = mid;
            } else {
                hi = mid;
            }
        }

        let lo_len = common_prefix(self.old, self.order[lo] as usize, query);
        let hi_len = common_prefix(self.old, self.order[hi] as usize, query);
        let len = lo_len.max(hi_len);
        if len == 0 {
            return SuffixMatch { offset: 0, len: 0 };
        }

        // Entries tied on the match length sit next to each other in the
        // order; walk a capped band around the anchor and keep the offset
        // closest to the hint.
        let anchor = if lo_len >= hi_len { lo } else { hi };
        let mut best = self.order[anchor] as usize;
        let mut dist = best.abs_diff(hint);

        let mut consider = |offset: usize| {
            let d = offset.abs_diff(hint);
            if d < dist || (d == dist && offset < best) {
                best = offset;
                dist = d;
            }
        };

        for pos in (anchor.saturating_sub(TIE_SCAN_CAP)..anchor).rev() {
            let offset = self.order[pos] as usize;
            if common_prefix(self.old, offset, query) < len {
                break;
            }
            consider(offset);
        }
        for pos in anchor + 1..(anchor + 1 + TIE_SCAN_CAP).min(self.order.len()) {
            let offset = self.order[pos] as usize;
            if common_prefix(self.old, offset, query) < len {
                break;
            }
            consider(offset);
        }

        SuffixMatch { offset: best, len }
    }
}

/// Is the suffix starting at `start` strictly smaller than `query`? A
/// suffix that runs out first counts as smaller, matching the sentinel
/// ordering the sorter uses.
fn suffix_less(old: &[u8], start: usize, query: &[u8]) -> bool {
    let suffix = &old[start..];
    let n = suffix.len().min(query.len());
    match suffix[..n].cmp(&query[..n]) {
        Ordering::Less => true,
        Ordering::Greater => false,
        Ordering::Equal => suffix.len() < query.len(),
    }
}

fn common_prefix(old: &[u8], start: usize, query: &[u8]) -> usize {
    old[start..]
        .iter()
        .zip(query)
        .take_while(|(a, b)| a == b)
        .count()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
