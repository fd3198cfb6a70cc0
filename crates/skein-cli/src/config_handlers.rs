//! Handler functions for config CLI commands.
//!
//! Implements `skein config {show,path,init}`.

use crate::cli::ConfigAction;
use crate::config::SkeinConfig;
use skein_core::{Error, Result};
use std::path::{Path, PathBuf};

/// Handle a config subcommand.
///
/// Receives the raw `--config` path (not a loaded config) because some
/// commands (path, init) work before a config file exists.
pub fn handle_config_command(config_path: Option<&str>, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = SkeinConfig::load(config_path)?;
            print!("{}", config.to_toml_string()?);
            Ok(())
        }
        ConfigAction::Path => cmd_config_path(config_path),
        ConfigAction::Init { file, force } => {
            let path = match file {
                Some(p) => PathBuf::from(p),
                None => SkeinConfig::default_config_path()
                    .ok_or_else(|| Error::config("Could not determine config directory"))?,
            };
            write_default_config(&path, force)?;
            println!("Config file created at {}", path.display());
            Ok(())
        }
    }
}

/// Show the resolved config file path.
fn cmd_config_path(config_path: Option<&str>) -> Result<()> {
    match SkeinConfig::resolve_config_path(config_path) {
        Some(path) => {
            println!("{}", path.display());
            if !path.exists() {
                eprintln!("(file does not exist; run `skein config init` to create it)");
            }
            Ok(())
        }
        None => Err(Error::config(
            "Could not determine config directory for this platform",
        )),
    }
}

/// Write the default configuration to `path`.
///
/// Refuses to overwrite an existing file unless `force` is set.
pub fn write_default_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(Error::config(format!(
            "Config file already exists at {}. Use --force to overwrite.",
            path.display()
        )));
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| Error::io_with_path(e, parent))?;
    }

    let toml_str = SkeinConfig::default().to_toml_string()?;
    std::fs::write(path, toml_str).map_err(|e| Error::io_with_path(e, path))?;
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
