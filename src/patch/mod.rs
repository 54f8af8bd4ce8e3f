// Patch container format and replay.
//
// This module owns everything on the wire: the fixed-width integer
// encoding, control records, the 32-byte container header, stream framing
// with pluggable compression, and the strict replay loop that reconstructs
// the new file.
//
// # Modules
//
// - `offt`      — 8-byte little-endian sign-magnitude integer encoding
// - `control`   — control records (copy, extra, seek) and their wire form
// - `header`    — container magic and fixed header
// - `container` — stream compression and framing
// - `apply`     — control replay against the old file

pub mod apply;
pub mod container;
pub mod control;
pub mod header;
pub mod offt;

// Re-export key types for convenience.
pub use apply::{ApplyError, apply, apply_streams};
pub use container::{
    DecodedPatch, decode_container, decode_container_with_codec, encode_container,
};
pub use control::{CONTROL_SIZE, ControlRecord, parse_stream};
pub use header::{HEADER_LEN, MAGIC_LEN, MAGIC_STEM, PatchHeader};
