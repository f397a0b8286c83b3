use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    pub id: usize,
    pub title: String,
    pub url: String,
    pub media_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<String>,
    pub published: DateTime<Utc>,
    #[serde(default)]
    pub played: bool,
    /// Seconds listened so far; zero unless a session was interrupted.
    #[serde(default)]
    pub elapsed: u64,
}

impl Episode {
    /// Resets listening progress, as every mark operation does.
    pub fn mark(&mut self, played: bool) {
        self.played = played;
        self.elapsed = 0;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feed {
    pub title: String,
    pub url: String,
    /// Source the feed is fetched from; may carry credentials.
    pub rss: String,
    pub updated: DateTime<Utc>,
    /// Sorted oldest first.
    #[serde(default)]
    pub episodes: Vec<Episode>,
    #[serde(default)]
    pub playlists: BTreeMap<String, Vec<usize>>,
}

impl Feed {
    pub fn played_count(&self) -> usize {
        self.episodes.iter().filter(|ep| ep.played).count()
    }

    pub fn playlist(&self, name: &str) -> Option<&[usize]> {
        self.playlists.get(name).map(Vec::as_slice)
    }
}
