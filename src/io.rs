// File-level helpers for patch creation and application.
//
// Provides `create_patch_file()` and `apply_patch_file()` convenience
// functions that wrap the in-memory engine with whole-file reads and
// writes. Optionally computes SHA-256 checksums of the files involved
// (feature-gated behind `file-io`).
//
// Everything is held in memory at once: the suffix index needs random
// access to the whole old file, and replay needs random access to all
// three decoded streams, so there is nothing to gain from streaming.

use std::path::Path;

#[cfg(feature = "file-io")]
use sha2::Digest;

use thiserror::Error;

use crate::diff::DiffError;
use crate::engine::{self, PatchOptions};
use crate::patch::apply::ApplyError;

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

/// Statistics returned by `create_patch_file()`.
#[derive(Debug, Clone)]
pub struct DiffStats {
    /// Old file size in bytes.
    pub old_size: u64,
    /// New file size in bytes.
    pub new_size: u64,
    /// Patch output size in bytes.
    pub patch_size: u64,
    /// SHA-256 of the old file (if the `file-io` feature is enabled).
    pub old_sha256: Option<[u8; 32]>,
    /// SHA-256 of the new file (if the `file-io` feature is enabled).
    pub new_sha256: Option<[u8; 32]>,
}

/// Statistics returned by `apply_patch_file()`.
#[derive(Debug, Clone)]
pub struct ApplyStats {
    /// Old file size in bytes.
    pub old_size: u64,
    /// Patch file size in bytes.
    pub patch_size: u64,
    /// Reconstructed output size in bytes.
    pub output_size: u64,
    /// SHA-256 of the reconstructed output (if the `file-io` feature is
    /// enabled).
    pub output_sha256: Option<[u8; 32]>,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Error type for file-level operations.
#[derive(Debug, Error)]
pub enum FileError {
    /// I/O failure (file open, read, write).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Patch creation failed.
    #[error("diff error: {0}")]
    Diff(#[from] DiffError),

    /// Patch application failed.
    #[error("apply error: {0}")]
    Apply(#[from] ApplyError),
}

// ---------------------------------------------------------------------------
// create_patch_file
// ---------------------------------------------------------------------------

/// Create a patch between two files, writing it to `patch_path`.
///
/// When the `file-io` feature is enabled, SHA-256 checksums of both
/// inputs are computed and returned in the stats.
pub fn create_patch_file(
    old_path: &Path,
    new_path: &Path,
    patch_path: &Path,
    opts: &PatchOptions,
) -> Result<DiffStats, FileError> {
    let old = std::fs::read(old_path)?;
    let new = std::fs::read(new_path)?;

    let patch = engine::create_patch_with_options(&old, &new, opts)?;
    std::fs::write(patch_path, &patch)?;

    log::info!(
        "diff {} -> {}: wrote {} ({} bytes)",
        old_path.display(),
        new_path.display(),
        patch_path.display(),
        patch.len()
    );

    Ok(DiffStats {
        old_size: old.len() as u64,
        new_size: new.len() as u64,
        patch_size: patch.len() as u64,
        old_sha256: digest(&old),
        new_sha256: digest(&new),
    })
}

// ---------------------------------------------------------------------------
// apply_patch_file
// ---------------------------------------------------------------------------

/// Apply a patch file to `old_path`, writing the result to `output_path`.
///
/// When the `file-io` feature is enabled, a SHA-256 checksum of the
/// output is computed and returned in the stats.
pub fn apply_patch_file(
    old_path: &Path,
    patch_path: &Path,
    output_path: &Path,
) -> Result<ApplyStats, FileError> {
    let old = std::fs::read(old_path)?;
    let patch = std::fs::read(patch_path)?;

    let output = engine::apply_patch(&old, &patch)?;
    std::fs::write(output_path, &output)?;

    log::info!(
        "patch {} + {}: wrote {} ({} bytes)",
        old_path.display(),
        patch_path.display(),
        output_path.display(),
        output.len()
    );

    Ok(ApplyStats {
        old_size: old.len() as u64,
        patch_size: patch.len() as u64,
        output_size: output.len() as u64,
        output_sha256: digest(&output),
    })
}

#[cfg(feature = "file-io")]
fn digest(data: &[u8]) -> Option<[u8; 32]> {
    let mut hasher = sha2::Sha256::new();
    hasher.update(data);
    Some(hasher.finalize().into())
}

#[cfg(not(feature = "file-io"))]
fn digest(_data: &[u8]) -> Option<[u8; 32]> {
    None
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn write_file(dir: &tempfile::TempDir, name: &str, data: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, data).unwrap();
        path
    }

    #[test]
    fn create_apply_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let old_data = b"The quick brown fox jumps over the lazy dog. 1234567890";
        let new_data = b"The quick brown cat sits on the lazy mat. 1234567890!!!";

        let old_path = write_file(&dir, "old.bin", old_data);
        let new_path = write_file(&dir, "new.bin", new_data);
        let patch_path = dir.path().join("delta.bsdelta");
        let output_path = dir.path().join("output.bin");

        let diff_stats = create_patch_file(
            &old_path,
            &new_path,
            &patch_path,
            &PatchOptions::default(),
        )
        .unwrap();

        assert_eq!(diff_stats.old_size, old_data.len() as u64);
        assert_eq!(diff_stats.new_size, new_data.len() as u64);
        assert!(diff_stats.patch_size > 0);

        let apply_stats = apply_patch_file(&old_path, &patch_path, &output_path).unwrap();

        assert_eq!(apply_stats.old_size, old_data.len() as u64);
        assert_eq!(apply_stats.patch_size, diff_stats.patch_size);
        assert_eq!(apply_stats.output_size, new_data.len() as u64);

        assert_eq!(std::fs::read(&output_path).unwrap(), new_data);
    }

    #[test]
    fn empty_old_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let new_data = b"standalone data without any base";

        let old_path = write_file(&dir, "empty.bin", b"");
        let new_path = write_file(&dir, "new.bin", new_data);
        let patch_path = dir.path().join("delta.bsdelta");
        let output_path = dir.path().join("output.bin");

        create_patch_file(&old_path, &new_path, &patch_path, &PatchOptions::default()).unwrap();
        apply_patch_file(&old_path, &patch_path, &output_path).unwrap();

        assert_eq!(std::fs::read(&output_path).unwrap(), new_data);
    }

    #[test]
    fn missing_input_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("does-not-exist.bin");
        let new_path = write_file(&dir, "new.bin", b"data");
        let patch_path = dir.path().join("delta.bsdelta");

        let err = create_patch_file(&missing, &new_path, &patch_path, &PatchOptions::default())
            .unwrap_err();
        assert!(matches!(err, FileError::Io(_)));
    }

    #[test]
    fn corrupt_patch_file_is_an_apply_error() {
        let dir = tempfile::tempdir().unwrap();
        let old_path = write_file(&dir, "old.bin", b"some contents");
        let patch_path = write_file(&dir, "bad.bsdelta", b"not a patch at all");
        let output_path = dir.path().join("output.bin");

        let err = apply_patch_file(&old_path, &patch_path, &output_path).unwrap_err();
        assert!(matches!(err, FileError::Apply(_)));
        assert!(!output_path.exists());
    }

    #[cfg(feature = "file-io")]
    #[test]
    fn sha256_checksums_are_computed() {
        let dir = tempfile::tempdir().unwrap();
        let old_data = b"old contents for the checksum test";
        let new_data = b"new contents for the checksum test";

        let old_path = write_file(&dir, "old.bin", old_data);
        let new_path = write_file(&dir, "new.bin", new_data);
        let patch_path = dir.path().join("delta.bsdelta");
        let output_path = dir.path().join("output.bin");

        let diff_stats =
            create_patch_file(&old_path, &new_path, &patch_path, &PatchOptions::default())
                .unwrap();
        assert!(diff_stats.old_sha256.is_some());
        assert!(diff_stats.new_sha256.is_some());

        let apply_stats = apply_patch_file(&old_path, &patch_path, &output_path).unwrap();

        // The reconstructed output hashes identically to the new input.
        assert_eq!(apply_stats.output_sha256, diff_stats.new_sha256);
    }
}
