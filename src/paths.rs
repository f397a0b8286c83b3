use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub fn config_file_path() -> Result<PathBuf> {
    let base = dirs::config_dir().context("unable to resolve config directory")?;
    Ok(base.join("podtrack").join("config.json"))
}

pub fn default_store_path() -> Result<PathBuf> {
    let base = dirs::data_dir().context("unable to resolve data directory")?;
    Ok(base.join("podtrack").join("store.json"))
}

/// Expands a leading `~/` to the home directory.
pub fn expand_home(raw: &str) -> PathBuf {
    expand_home_with(raw, dirs::home_dir().as_deref())
}

pub(crate) fn expand_home_with(raw: &str, home: Option<&Path>) -> PathBuf {
    match (raw.strip_prefix("~/"), home) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(raw),
    }
}
