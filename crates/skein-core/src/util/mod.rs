//! Utility modules shared across Skein crates.
//!
//! # Modules
//!
//! - [`hash`]: Content-addressed keys for embedding reuse

pub mod hash;
