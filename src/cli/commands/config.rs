//! Configuration inspection command.

use std::path::{Path, PathBuf};

use crate::config::{self, Config};

/// Show the config file location or contents
pub fn cmd_config(
    loaded: &Config,
    override_path: Option<&PathBuf>,
    path_only: bool,
    defaults: bool,
    init: bool,
) -> anyhow::Result<()> {
    let path = override_path.cloned().or_else(config::config_path);

    if path_only {
        match &path {
            Some(path) => println!("{}", path.display()),
            None => anyhow::bail!("Could not determine config directory"),
        }
        return Ok(());
    }

    if init {
        let Some(path) = path else {
            anyhow::bail!("Could not determine config directory");
        };
        return init_config(&path);
    }

    let shown = if defaults {
        Config::default()
    } else {
        loaded.clone()
    };
    print!("{}", toml::to_string_pretty(&shown)?);
    Ok(())
}

/// Write the defaults to `path` unless a file is already there
fn init_config(path: &Path) -> anyhow::Result<()> {
    if path.exists() {
        println!("Config already exists: {}", path.display());
        return Ok(());
    }
    config::save_to(&Config::default(), path)?;
    println!("✓ Wrote default config to {}", path.display());
    Ok(())
}
