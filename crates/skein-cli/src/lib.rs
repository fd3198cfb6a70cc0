//! Command-line harness for the Skein retrieval engine.
//!
//! # Key Abstractions
//!
//! - [`SkeinCli`]: loads configuration, initialises logging, dispatches commands
//! - [`SkeinConfig`]: `[embedding]` and `[search]` sections loaded via `confyg`

#![doc = include_str!("../README.md")]

pub mod app;
pub mod cli;
pub mod config;
pub mod config_handlers;

pub use app::{EmbedOptions, SkeinCli};
pub use cli::{CliArgs, Command, ConfigAction, ConfigCommand};
pub use config::SkeinConfig;
