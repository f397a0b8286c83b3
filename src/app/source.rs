use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::debug;

use super::display::format_elapsed;
use crate::error::{Error, Result, redact_url};
use crate::http::get_bytes;
use crate::model::{Episode, Feed};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const READ_TIMEOUT: Duration = Duration::from_secs(30);

/// One feed item as delivered by the source, before ordering.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SourceItem {
    pub(crate) title: String,
    pub(crate) link: String,
    pub(crate) media_url: Option<String>,
    pub(crate) length: Option<String>,
    pub(crate) published: Option<DateTime<Utc>>,
}

/// Channel-level data plus items in fetch order.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SourceFeed {
    pub(crate) title: String,
    pub(crate) link: Option<String>,
    pub(crate) updated: Option<DateTime<Utc>>,
    pub(crate) items: Vec<SourceItem>,
}

/// A freshly built feed: episodes oldest first with IDs assigned by position.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct FeedSnapshot {
    pub(crate) title: String,
    pub(crate) url: String,
    pub(crate) rss: String,
    pub(crate) updated: DateTime<Utc>,
    pub(crate) episodes: Vec<Episode>,
}

impl FeedSnapshot {
    pub(crate) fn from_source(
        rss: &str,
        source: SourceFeed,
        fetched_at: DateTime<Utc>,
    ) -> Result<Self> {
        let mut episodes = Vec::with_capacity(source.items.len());
        for item in source.items {
            let Some(media_url) = item.media_url.filter(|url| !url.trim().is_empty()) else {
                return Err(Error::Format {
                    url: redact_url(rss),
                    item: item.title,
                    reason: "has no media enclosure".to_string(),
                });
            };
            let Some(published) = item.published else {
                return Err(Error::Format {
                    url: redact_url(rss),
                    item: item.title,
                    reason: "has no publish date".to_string(),
                });
            };
            episodes.push(Episode {
                id: 0,
                title: item.title,
                url: item.link,
                media_url,
                length: item.length,
                published,
                played: false,
                elapsed: 0,
            });
        }

        // Stable, so items sharing a timestamp keep their fetch order.
        episodes.sort_by_key(|ep| ep.published);
        for (id, ep) in episodes.iter_mut().enumerate() {
            ep.id = id;
        }

        let updated = source
            .updated
            .or_else(|| episodes.iter().map(|ep| ep.published).max())
            .unwrap_or(fetched_at);
        Ok(Self {
            title: source.title,
            url: source.link.unwrap_or_else(|| rss.to_string()),
            rss: rss.to_string(),
            updated,
            episodes,
        })
    }

    pub(crate) fn into_feed(self) -> Feed {
        Feed {
            title: self.title,
            url: self.url,
            rss: self.rss,
            updated: self.updated,
            episodes: self.episodes,
            playlists: Default::default(),
        }
    }
}

pub(crate) trait FeedSource {
    fn fetch(&self, rss: &str) -> Result<FeedSnapshot>;
}

#[derive(Debug, Default)]
pub(crate) struct HttpFeedSource;

impl FeedSource for HttpFeedSource {
    fn fetch(&self, rss: &str) -> Result<FeedSnapshot> {
        debug!(url = %redact_url(rss), "fetching feed");
        let body = get_bytes(rss, CONNECT_TIMEOUT, READ_TIMEOUT)
            .map_err(|reason| Error::fetch(rss, reason))?;
        let source = parse_feed(rss, &body)?;
        FeedSnapshot::from_source(rss, source, Utc::now())
    }
}

pub(crate) fn parse_feed(rss: &str, body: &[u8]) -> Result<SourceFeed> {
    let feed = feed_rs::parser::parse(body)
        .map_err(|err| Error::fetch(rss, format!("feed parse error: {err}")))?;

    let link = feed
        .links
        .iter()
        .find(|link| link.rel.as_deref() != Some("self"))
        .or_else(|| feed.links.first())
        .map(|link| link.href.clone());

    let items = feed
        .entries
        .into_iter()
        .map(|entry| {
            let content = entry
                .media
                .iter()
                .flat_map(|media| media.content.iter())
                .find(|content| content.url.is_some());
            let duration = entry
                .media
                .iter()
                .find_map(|media| media.duration)
                .or_else(|| content.and_then(|content| content.duration));
            let length = duration
                .map(|duration| format_elapsed(duration.as_secs()))
                .or_else(|| content.and_then(|content| content.size).map(format_size));
            SourceItem {
                title: entry
                    .title
                    .map(|text| text.content.trim().to_string())
                    .unwrap_or_default(),
                link: entry
                    .links
                    .first()
                    .map(|link| link.href.clone())
                    .unwrap_or_default(),
                media_url: content
                    .and_then(|content| content.url.as_ref())
                    .map(|url| url.to_string()),
                length,
                published: entry.published.or(entry.updated),
            }
        })
        .collect();

    Ok(SourceFeed {
        title: feed
            .title
            .map(|text| text.content.trim().to_string())
            .unwrap_or_default(),
        link,
        updated: feed.published.or(feed.updated),
        items,
    })
}

pub(crate) fn format_size(bytes: u64) -> String {
    const MB: f64 = 1024.0 * 1024.0;
    if bytes as f64 >= MB {
        format!("{:.1} MB", bytes as f64 / MB)
    } else {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    }
}
