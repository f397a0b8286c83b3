use tracing::{info, warn};

use crate::error::{Result, redact_url};
use crate::model::Feed;
use crate::store::Store;

use super::source::{FeedSnapshot, FeedSource};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct ReconcileReport {
    /// Stored episodes whose content was overwritten from the snapshot.
    pub(crate) refreshed: usize,
    pub(crate) appended: usize,
    /// Stored episodes the snapshot no longer lists; kept as they were.
    pub(crate) retained: usize,
}

/// Merges a fresh snapshot into a stored feed.
///
/// Content fields come from the snapshot at the same position, play state stays
/// with the stored episode, extra snapshot entries are appended and stored
/// episodes beyond the snapshot are never removed.
pub(crate) fn reconcile(feed: &mut Feed, snapshot: FeedSnapshot) -> ReconcileReport {
    feed.updated = snapshot.updated;

    let mut report = ReconcileReport::default();
    let mut appended = Vec::new();
    let mut existing = feed.episodes.iter_mut();
    let mut incoming = snapshot.episodes.into_iter();
    loop {
        match (existing.next(), incoming.next()) {
            (Some(stored), Some(fresh)) => {
                stored.id = fresh.id;
                stored.title = fresh.title;
                stored.url = fresh.url;
                stored.media_url = fresh.media_url;
                stored.length = fresh.length;
                stored.published = fresh.published;
                report.refreshed += 1;
            }
            (Some(_), None) => {
                report.retained = 1 + existing.count();
                break;
            }
            (None, Some(fresh)) => {
                appended.push(fresh);
                appended.extend(incoming.by_ref());
                break;
            }
            (None, None) => break,
        }
    }

    for ep in &mut appended {
        ep.played = false;
        ep.elapsed = 0;
    }
    report.appended = appended.len();
    feed.episodes.extend(appended);
    report
}

/// Fetches one feed and merges it; on failure the feed is left untouched.
pub(crate) fn update_feed(feed: &mut Feed, source: &dyn FeedSource) -> Result<ReconcileReport> {
    let snapshot = source.fetch(&feed.rss)?;
    let report = reconcile(feed, snapshot);
    info!(
        feed = %feed.title,
        refreshed = report.refreshed,
        appended = report.appended,
        retained = report.retained,
        "feed reconciled"
    );
    Ok(report)
}

#[derive(Debug, Default)]
pub(crate) struct UpdatePass {
    pub(crate) updated: Vec<(String, ReconcileReport)>,
    pub(crate) failed: Vec<(String, String)>,
}

/// Refreshes every feed, saving after each success. A feed that fails to fetch
/// or parse is logged and skipped. Feeds are resorted by last update at the end.
pub(crate) fn update_all(store: &mut Store, source: &dyn FeedSource) -> Result<UpdatePass> {
    let mut pass = UpdatePass::default();
    for idx in 0..store.feeds.len() {
        let feed = &mut store.feeds[idx];
        match update_feed(feed, source) {
            Ok(report) => {
                pass.updated.push((feed.title.clone(), report));
                store.save()?;
            }
            Err(err) if err.is_fetch() => {
                warn!(
                    feed = %feed.title,
                    url = %redact_url(&feed.rss),
                    error = %err,
                    "feed update failed"
                );
                pass.failed.push((feed.title.clone(), err.to_string()));
            }
            Err(err) => return Err(err),
        }
    }

    store.sort_by_updated();
    store.save()?;
    Ok(pass)
}
