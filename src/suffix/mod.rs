// Suffix-array construction and search.
//
// This module owns the expensive half of patch creation:
//
// - `sort`: suffix ordering by bucket sort plus prefix doubling
// - `index`: binary search over the order with hint-biased tie breaks

pub mod index;
pub mod sort;

// Re-export key types for convenience.
pub use index::{SuffixIndex, SuffixMatch};
pub use sort::{suffix_order, SuffixAllocError};
