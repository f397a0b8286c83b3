use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::model::Feed;

/// Every feed the user subscribed to, backed by a JSON file.
#[derive(Debug)]
pub struct Store {
    path: PathBuf,
    pub feeds: Vec<Feed>,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|err| Error::Config {
                path: path.to_path_buf(),
                reason: format!("cannot create directory {}: {err}", parent.display()),
            })?;
        }

        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(path = %path.display(), "no store found, starting with a blank one");
                return Ok(Self::empty(path));
            }
            Err(err) => {
                return Err(Error::Persistence {
                    path: path.to_path_buf(),
                    reason: format!("read failed: {err}"),
                });
            }
        };

        let feeds = if raw.trim().is_empty() {
            Vec::new()
        } else {
            serde_json::from_str(&raw).map_err(|err| Error::Persistence {
                path: path.to_path_buf(),
                reason: format!("invalid store contents: {err}"),
            })?
        };
        debug!(path = %path.display(), "store loaded");
        Ok(Self {
            path: path.to_path_buf(),
            feeds,
        })
    }

    pub fn empty(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            feeds: Vec::new(),
        }
    }

    pub fn save(&self) -> Result<()> {
        let persistence = |reason: String| Error::Persistence {
            path: self.path.clone(),
            reason,
        };
        let encoded = serde_json::to_string_pretty(&self.feeds)
            .map_err(|err| persistence(format!("encode failed: {err}")))?;

        let mut tmp_name = self.path.clone().into_os_string();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);
        fs::write(&tmp_path, encoded)
            .map_err(|err| persistence(format!("write to {} failed: {err}", tmp_path.display())))?;
        fs::rename(&tmp_path, &self.path)
            .map_err(|err| persistence(format!("replace failed: {err}")))?;
        debug!(path = %self.path.display(), feeds = self.feeds.len(), "store saved");
        Ok(())
    }

    pub fn contains_title(&self, title: &str) -> bool {
        self.feeds.iter().any(|feed| feed.title == title)
    }

    /// Most recently updated feed first.
    pub fn sort_by_updated(&mut self) {
        self.feeds.sort_by(|left, right| right.updated.cmp(&left.updated));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn feed(title: &str, day: u32) -> Feed {
        Feed {
            title: title.to_string(),
            url: format!("https://{title}.example"),
            rss: format!("https://{title}.example/rss"),
            updated: Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap(),
            episodes: Vec::new(),
            playlists: Default::default(),
        }
    }

    #[test]
    fn open_missing_file_yields_empty_store_and_creates_parent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("store.json");

        let store = Store::open(&path).expect("missing store is not an error");
        assert!(store.feeds.is_empty());
        assert!(path.parent().unwrap().is_dir());
    }

    #[test]
    fn open_reports_config_error_when_parent_is_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "x").unwrap();

        let err = Store::open(&blocker.join("store.json")).unwrap_err();
        assert!(matches!(err, Error::Config { .. }), "unexpected: {err}");
    }

    #[test]
    fn open_rejects_corrupt_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        fs::write(&path, "{not json").unwrap();

        let err = Store::open(&path).unwrap_err();
        assert!(matches!(err, Error::Persistence { .. }), "unexpected: {err}");
    }

    #[test]
    fn saved_store_reopens_with_same_feeds() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        let mut store = Store::open(&path).unwrap();
        store.feeds.push(feed("alpha", 1));
        store.feeds[0].playlists.insert("later".to_string(), vec![2, 0]);
        store.save().unwrap();

        let reopened = Store::open(&path).unwrap();
        assert_eq!(reopened.feeds, store.feeds);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn sort_by_updated_puts_newest_first() {
        let mut store = Store::empty(Path::new("unused.json"));
        store.feeds = vec![feed("old", 1), feed("new", 9), feed("mid", 5)];
        store.sort_by_updated();
        let titles: Vec<_> = store.feeds.iter().map(|f| f.title.as_str()).collect();
        assert_eq!(titles, vec!["new", "mid", "old"]);
        assert!(store.contains_title("mid"));
        assert!(!store.contains_title("missing"));
    }
}
