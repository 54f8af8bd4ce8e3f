// Suffix ordering via bucket sort plus prefix doubling (Larsson-Sadakane
// qsufsort, the sorter the classic bsdiff tools use).
//
// Suffixes are compared as if the text ended with a sentinel smaller than
// every byte, so a suffix that is a proper prefix of another sorts first
// and the empty suffix sorts before everything. After round h the order
// is correct on the first h bytes; sorted groups are collapsed into
// negative runs so later rounds skip them, giving O(N log N) overall.

use thiserror::Error;

/// Allocation failure while building the suffix order.
#[derive(Debug, Error)]
#[error("failed to allocate {bytes} bytes for the suffix sort")]
pub struct SuffixAllocError {
    /// Requested allocation size.
    pub bytes: usize,
}

/// Groups below this size are sorted by repeated minimum selection
/// instead of partitioning.
const SMALL_GROUP: usize = 16;

/// Compute the sorted suffix order of `text`.
///
/// Returns a permutation of length `text.len() + 1` mapping sorted
/// position to suffix start offset; position 0 always holds the empty
/// suffix (offset `text.len()`).
pub fn suffix_order(text: &[u8]) -> Result<Vec<i64>, SuffixAllocError> {
    let n = text.len();
    let mut order = try_zeroed(n + 1)?;
    let mut rank = try_zeroed(n + 1)?;

    // Bucket sort on the first byte.
    let mut buckets = [0i64; 256];
    for &b in text {
        buckets[b as usize] += 1;
    }
    for i in 1..256 {
        buckets[i] += buckets[i - 1];
    }
    for i in (1..256).rev() {
        buckets[i] = buckets[i - 1];
    }
    buckets[0] = 0;

    for (i, &b) in text.iter().enumerate() {
        buckets[b as usize] += 1;
        order[idx(buckets[b as usize])] = i as i64;
    }
    order[0] = n as i64;
    for (i, &b) in text.iter().enumerate() {
        rank[i] = buckets[b as usize];
    }
    rank[n] = 0;

    // Single-suffix buckets are already in final position.
    for i in 1..256 {
        if buckets[i] == buckets[i - 1] + 1 {
            order[idx(buckets[i])] = -1;
        }
    }
    order[0] = -1;

    // Prefix doubling: each round extends the sorted depth from h to 2h.
    let mut h: i64 = 1;
    while order[0] != -(n as i64 + 1) {
        let mut run: i64 = 0;
        let mut i: i64 = 0;
        while i < n as i64 + 1 {
            if order[idx(i)] < 0 {
                run -= order[idx(i)];
                i -= order[idx(i)];
            } else {
                if run != 0 {
                    order[idx(i - run)] = -run;
                }
                let group = rank[idx(order[idx(i)])] + 1 - i;
                split(&mut order, &mut rank, idx(i), idx(group), h);
                i += group;
                run = 0;
            }
        }
        if run != 0 {
            order[idx(i - run)] = -run;
        }
        h += h;
    }

    // The ranks are final; invert them back into an order permutation.
    for i in 0..=n {
        order[idx(rank[i])] = i as i64;
    }
    Ok(order)
}

fn try_zeroed(len: usize) -> Result<Vec<i64>, SuffixAllocError> {
    let mut v = Vec::new();
    v.try_reserve_exact(len).map_err(|_| SuffixAllocError {
        bytes: len * size_of::<i64>(),
    })?;
    v.resize(len, 0);
    Ok(v)
}

#[inline]
fn idx(i: i64) -> usize {
    debug_assert!(i >= 0);
    i as usize
}

/// Sort one group of suffixes by their rank at depth `h`, iterating on the
/// right partition instead of recursing.
fn split(order: &mut [i64], rank: &mut [i64], start: usize, len: usize, h: i64) {
    let mut next = Some((start, len));
    while let Some((start, len)) = next {
        next = split_once(order, rank, start, len, h);
    }
}

fn split_once(
    order: &mut [i64],
    rank: &mut [i64],
    start: usize,
    len: usize,
    h: i64,
) -> Option<(usize, usize)> {
    if len < SMALL_GROUP {
        // Select the minimum-rank subgroup to the front, repeatedly.
        let mut k = start;
        while k < start + len {
            let mut kept = 1;
            let mut min = rank[idx(order[k] + h)];
            for i in 1..start + len - k {
                let r = rank[idx(order[k + i] + h)];
                if r < min {
                    min = r;
                    kept = 0;
                }
                if r == min {
                    order.swap(k + kept, k + i);
                    kept += 1;
                }
            }
            for &o in &order[k..k + kept] {
                rank[idx(o)] = (k + kept) as i64 - 1;
            }
            if kept == 1 {
                order[k] = -1;
            }
            k += kept;
        }
        return None;
    }

    // Ternary partition around the middle element's rank.
    let pivot = rank[idx(order[start + len / 2] + h)];
    let mut less = 0;
    let mut equal = 0;
    for &o in &order[start..start + len] {
        let r = rank[idx(o + h)];
        if r < pivot {
            less += 1;
        }
        if r == pivot {
            equal += 1;
        }
    }
    let mid = start + less;
    let high = mid + equal;

    let mut placed_eq = 0;
    let mut placed_gt = 0;
    let mut i = start;
    while i < mid {
        match rank[idx(order[i] + h)].cmp(&pivot) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Equal => {
                order.swap(i, mid + placed_eq);
                placed_eq += 1;
            }
            std::cmp::Ordering::Greater => {
                order.swap(i, high + placed_gt);
                placed_gt += 1;
            }
        }
    }
    while mid + placed_eq < high {
        if rank[idx(order[mid + placed_eq] + h)] == pivot {
            placed_eq += 1;
        } else {
            order.swap(mid + placed_eq, high + placed_gt);
            placed_gt += 1;
        }
    }

    if mid > start {
        split(order, rank, start, mid - start, h);
    }

    for &o in &order[mid..high] {
        rank[idx(o)] = high as i64 - 1;
    }
    if mid == high - 1 {
        order[mid] = -1;
    }

    if start + len > high {
        Some((high, start + len - high))
    } else {
        None
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn naive_order(text: &[u8]) -> Vec<i64> {
        let mut order: Vec<i64> = (0..=text.len() as i64).collect();
        order.sort_by(|&a, &b| text[a as usize..].cmp(&text[b as usize..]));
        order
    }

    fn check(text: &[u8]) {
        assert_eq!(
            suffix_order(text).unwrap(),
            naive_order(text),
            "input {text:?}"
        );
    }

    #[test]
    fn matches_naive_sort_on_small_inputs() {
        check(b"");
        check(b"a");
        check(b"banana");
        check(b"abracadabra");
        check(b"mississippi");
        check(b"abcabcabc");
    }

    #[test]
    fn handles_uniform_and_extreme_bytes() {
        check(&[0u8; 40]);
        check(&[255u8; 40]);
        check(b"aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa");
        check(&[0, 255, 0, 255, 0, 255, 1]);
    }

    #[test]
    fn matches_naive_sort_on_pseudorandom_input() {
        // Deterministic LCG so the case is reproducible.
        let mut state = 0x2545_F491_4F6C_DD1Du64;
        let mut data = Vec::with_capacity(512);
        for _ in 0..512 {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            data.push((state >> 56) as u8);
        }
        check(&data);
        // Narrow alphabet stresses large equal groups.
        let narrow: Vec<u8> = data.iter().map(|b| b % 4).collect();
        check(&narrow);
    }

    #[test]
    fn empty_suffix_sorts_first() {
        let order = suffix_order(b"zyx").unwrap();
        assert_eq!(order[0], 3);
    }

    #[test]
    fn result_is_a_permutation() {
        let text = b"the quick brown fox";
        let mut order = suffix_order(text).unwrap();
        order.sort_unstable();
        let expect: Vec<i64> = (0..=text.len() as i64).collect();
        assert_eq!(order, expect);
    }
}
