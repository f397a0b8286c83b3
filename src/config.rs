use std::env;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::info;

use crate::error::{Error, Result};
use crate::paths::expand_home;

const DEFAULT_PLAYER: &str = "mpv";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct RawConfig {
    store: Option<String>,
    notify: Option<bool>,
    player: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub store: PathBuf,
    pub notify: bool,
    pub player: PathBuf,
}

impl Config {
    /// Reads the config file, falling back to defaults when it does not exist.
    pub fn load(path: &Path, default_store: PathBuf) -> Result<Self> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => Self::parse(path, &raw)?,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(path = %path.display(), "no config file found, using defaults");
                RawConfig::default()
            }
            Err(err) => {
                return Err(Error::Config {
                    path: path.to_path_buf(),
                    reason: format!("read failed: {err}"),
                });
            }
        };

        let mut config = Self::from_raw(raw, default_store);
        if let Some(store) = env::var_os("PODTRACK_STORE").filter(|value| !value.is_empty()) {
            config.store = expand_home(&store.to_string_lossy());
        }
        if let Some(player) = env::var_os("PODTRACK_PLAYER_BIN").filter(|value| !value.is_empty())
        {
            config.player = PathBuf::from(player);
        }
        Ok(config)
    }

    fn parse(path: &Path, raw: &str) -> Result<RawConfig> {
        serde_json::from_str(raw).map_err(|err| Error::Config {
            path: path.to_path_buf(),
            reason: format!("invalid config: {err}"),
        })
    }

    fn from_raw(raw: RawConfig, default_store: PathBuf) -> Self {
        Self {
            store: raw
                .store
                .filter(|store| !store.trim().is_empty())
                .map(|store| expand_home(store.trim()))
                .unwrap_or(default_store),
            notify: raw.notify.unwrap_or(true),
            player: raw
                .player
                .filter(|player| !player.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_PLAYER)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paths::expand_home_with;

    #[test]
    fn partial_config_keeps_defaults_for_missing_keys() {
        let raw = Config::parse(Path::new("config.json"), r#"{"notify": false}"#).unwrap();
        let config = Config::from_raw(raw, PathBuf::from("/data/store.json"));
        assert_eq!(config.store, PathBuf::from("/data/store.json"));
        assert!(!config.notify);
        assert_eq!(config.player, PathBuf::from("mpv"));
    }

    #[test]
    fn explicit_values_override_defaults() {
        let raw = Config::parse(
            Path::new("config.json"),
            r#"{"store": "/tmp/pods.json", "notify": true, "player": "/usr/bin/mpv"}"#,
        )
        .unwrap();
        let config = Config::from_raw(raw, PathBuf::from("/data/store.json"));
        assert_eq!(config.store, PathBuf::from("/tmp/pods.json"));
        assert_eq!(config.player, PathBuf::from("/usr/bin/mpv"));
    }

    #[test]
    fn invalid_json_is_a_config_error() {
        let err = Config::parse(Path::new("config.json"), "{\"notify\": ").unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(
            &dir.path().join("absent.json"),
            dir.path().join("store.json"),
        )
        .expect("absent config is not an error");
        assert!(config.notify);
    }

    #[test]
    fn expand_home_replaces_leading_tilde_only() {
        let home = Path::new("/home/listener");
        assert_eq!(
            expand_home_with("~/.config/podtrack/store.json", Some(home)),
            PathBuf::from("/home/listener/.config/podtrack/store.json")
        );
        assert_eq!(
            expand_home_with("/srv/~/store.json", Some(home)),
            PathBuf::from("/srv/~/store.json")
        );
        assert_eq!(
            expand_home_with("~/store.json", None),
            PathBuf::from("~/store.json")
        );
    }
}
