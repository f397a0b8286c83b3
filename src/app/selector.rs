use regex::Regex;
use tracing::warn;

use crate::error::{Error, Result};
use crate::model::{Episode, Feed};

/// An addressing expression over one feed's episodes.
#[derive(Debug, Clone)]
pub(crate) enum Selector {
    All,
    Single(usize),
    Range { first: usize, last: usize },
    Set(Vec<usize>),
    Playlist(String),
    Filter(Regex),
}

impl Selector {
    /// Parses the index grammar: empty, `N`, `N-M` or `N,M,...`.
    pub(crate) fn parse(expr: &str) -> Result<Self> {
        let trimmed = expr.trim();
        if trimmed.is_empty() {
            return Ok(Self::All);
        }
        if let Some(index) = parse_index(trimmed) {
            return Ok(Self::Single(index));
        }
        if let Some((first, last)) = trimmed.split_once('-') {
            return match (parse_index(first), parse_index(last)) {
                (Some(first), Some(last)) => Ok(Self::Range { first, last }),
                _ => Err(Error::selector(expr, "expected a range like 0-4")),
            };
        }
        if trimmed.contains(',') {
            return trimmed
                .split(',')
                .map(parse_index)
                .collect::<Option<Vec<_>>>()
                .map(Self::Set)
                .ok_or_else(|| Error::selector(expr, "expected a set like 0,5,3"));
        }
        Err(Error::selector(
            expr,
            "expected an index, a range (0-4) or a set (0,5,3)",
        ))
    }

    pub(crate) fn filter(pattern: &str) -> Result<Self> {
        Regex::new(pattern)
            .map(Self::Filter)
            .map_err(|err| Error::selector(pattern, format!("invalid filter: {err}")))
    }

    /// Picks one form from the command's inputs: an index expression wins over
    /// a playlist, which wins over a title filter.
    pub(crate) fn from_inputs(
        episodes: Option<&str>,
        playlist: Option<&str>,
        filter: Option<&str>,
    ) -> Result<Self> {
        if let Some(expr) = episodes.filter(|expr| !expr.trim().is_empty()) {
            return Self::parse(expr);
        }
        if let Some(name) = playlist.filter(|name| !name.is_empty()) {
            return Ok(Self::Playlist(name.to_string()));
        }
        if let Some(pattern) = filter {
            return Self::filter(pattern);
        }
        Ok(Self::All)
    }

    /// An individually addressed episode plays even when already played.
    pub(crate) fn is_individual(&self) -> bool {
        matches!(self, Self::Single(_))
    }

    /// Positions in `feed.episodes`, in selection order. Positions may repeat.
    pub(crate) fn resolve(&self, feed: &Feed) -> Result<Vec<usize>> {
        let count = feed.episodes.len();
        let positions = match self {
            Self::All => (0..count).collect(),
            Self::Single(index) => {
                if *index < count {
                    vec![*index]
                } else {
                    Vec::new()
                }
            }
            Self::Range { first, last } => match count.checked_sub(1) {
                Some(max) => (*first..=(*last).min(max)).collect(),
                None => Vec::new(),
            },
            Self::Set(indices) => indices.iter().copied().filter(|idx| *idx < count).collect(),
            Self::Playlist(name) => {
                let ids = feed
                    .playlist(name)
                    .ok_or_else(|| Error::selector(name, "no such playlist"))?;
                let mut positions = Vec::with_capacity(ids.len());
                for &id in ids {
                    if id < count {
                        positions.push(id);
                    } else {
                        warn!(playlist = %name, id, "playlist entry points past the episode list");
                    }
                }
                positions
            }
            Self::Filter(regex) => feed
                .episodes
                .iter()
                .enumerate()
                .filter(|(_, ep)| regex.is_match(&ep.title))
                .map(|(idx, _)| idx)
                .collect(),
        };
        Ok(positions)
    }

    pub(crate) fn episodes<'a>(&self, feed: &'a Feed) -> Result<Vec<&'a Episode>> {
        Ok(self
            .resolve(feed)?
            .into_iter()
            .map(|idx| &feed.episodes[idx])
            .collect())
    }
}

/// Digit groups too large for `usize` saturate, so they clamp or skip like any
/// other index past the end.
fn parse_index(raw: &str) -> Option<usize> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(raw.parse().unwrap_or(usize::MAX))
}
