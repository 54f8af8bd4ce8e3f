// Approximate match extension.
//
// Copy regions are allowed to contain mismatching bytes as long as at
// least half the bytes agree: every extension picks the length that
// maximizes 2 * matches - length. Mismatches inside a copy cost one
// diff byte each, while a matching byte costs nothing, so the score
// charges each extra byte of length against the bytes it saves.

/// Extend a match forward from `(old_start, new_start)`, stopping at
/// `new_limit` and at the end of the old file. Returns the best length,
/// possibly zero.
pub(crate) fn extend_forward(
    old: &[u8],
    new: &[u8],
    old_start: usize,
    new_start: usize,
    new_limit: usize,
) -> usize {
    let mut matches = 0i64;
    let mut best_matches = 0i64;
    let mut best_len = 0usize;
    let mut i = 0usize;
    while new_start + i < new_limit && old_start + i < old.len() {
        if old[old_start + i] == new[new_start + i] {
            matches += 1;
        }
        i += 1;
        if matches * 2 - i as i64 > best_matches * 2 - best_len as i64 {
            best_matches = matches;
            best_len = i;
        }
    }
    best_len
}

/// Extend a match backward from just before `(old_end, new_end)`,
/// stopping at `new_floor` and at the start of the old file.
pub(crate) fn extend_backward(
    old: &[u8],
    new: &[u8],
    old_end: usize,
    new_end: usize,
    new_floor: usize,
) -> usize {
    let mut matches = 0i64;
    let mut best_matches = 0i64;
    let mut best_len = 0usize;
    let mut i = 1usize;
    while new_end >= new_floor + i && old_end >= i {
        if old[old_end - i] == new[new_end - i] {
            matches += 1;
        }
        if matches * 2 - i as i64 > best_matches * 2 - best_len as i64 {
            best_matches = matches;
            best_len = i;
        }
        i += 1;
    }
    best_len
}

/// Shrink a forward extension and the following backward extension when
/// they overlap in the new file. The overlap is assigned byte by byte to
/// whichever side matches more of it; returns the adjusted pair.
pub(crate) fn resolve_overlap(
    old: &[u8],
    new: &[u8],
    last_pos: usize,
    last_scan: usize,
    lenf: usize,
    pos: usize,
    scan: usize,
    lenb: usize,
) -> (usize, usize) {
    if last_scan + lenf <= scan - lenb {
        return (lenf, lenb);
    }
    let overlap = (last_scan + lenf) - (scan - lenb);
    let mut score = 0i64;
    let mut best_score = 0i64;
    let mut best_split = 0usize;
    for i in 0..overlap {
        if new[last_scan + lenf - overlap + i] == old[last_pos + lenf - overlap + i] {
            score += 1;
        }
        if new[scan - lenb + i] == old[pos - lenb + i] {
            score -= 1;
        }
        if score > best_score {
            best_score = score;
            best_split = i + 1;
        }
    }
    (lenf + best_split - overlap, lenb - best_split)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
