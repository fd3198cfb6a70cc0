//! Skein Core: shared errors and utilities.
//!
//! This crate provides the foundational types used across all Skein crates.
//! It has no internal Skein dependencies (dependency level 0).
//!
//! # Modules
//!
//! - [`error`]: Error types and Result alias
//! - [`util`]: Content hashing helpers

#![doc = include_str!("../README.md")]

pub mod error;
pub mod util;

// Re-export key types at crate root for convenience
pub use error::{Error, Result};

// Convenience re-exports from util
pub use util::hash::content_hash;
