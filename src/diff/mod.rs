// Patch creation.
//
// Splits into:
//
// - `scan`: the left-to-right encode scan over the new file
// - `extend`: forward/backward match extension and overlap trimming
//
// The scan consumes a `suffix::SuffixIndex` and produces raw control,
// diff and extra streams; container framing and compression live in
// `patch`.

use thiserror::Error;

use crate::suffix::SuffixAllocError;

mod extend;
pub mod scan;

// Re-export key types for convenience.
pub use scan::{encode, encode_with_index, RawPatch, ScanState};

/// Errors from patch creation.
#[derive(Debug, Error)]
pub enum DiffError {
    /// A working buffer for the given input size could not be allocated.
    #[error(transparent)]
    Alloc(#[from] SuffixAllocError),

    /// Stream compression failed.
    #[error("compression failed: {0}")]
    Compress(#[from] std::io::Error),
}
