//! Bsdelta: bsdiff-style binary delta compression in Rust.
//!
//! The crate provides:
//! - Suffix-array matching over the old file (`suffix`)
//! - The encode scan producing control/diff/extra streams (`diff`)
//! - The patch container format and replay (`patch`)
//! - Pluggable stream compression (`codec`)
//! - High-level create/apply APIs (`engine`)
//! - File-oriented helpers (`io`)
//! - An optional CLI (`cli` feature)
//!
//! # Quick Start
//!
//! ```
//! use bsdelta::engine;
//!
//! let old = b"hello old world";
//! let new = b"hello new world";
//!
//! let patch = engine::create_patch(old, new).unwrap();
//! let rebuilt = engine::apply_patch(old, &patch).unwrap();
//! assert_eq!(rebuilt, new);
//! ```

pub mod codec;
pub mod diff;
pub mod engine;
pub mod io;
pub mod patch;
pub mod suffix;

#[cfg(feature = "cli")]
pub mod cli;
