use std::fmt::Write as _;

use chrono::{DateTime, Local, Utc};

use crate::error::redact_url;
use crate::model::{Episode, Feed};

pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

pub(crate) fn truncate(s: &str, max: usize) -> String {
    let mut out = s.to_string();
    if out.chars().count() > max {
        out = out.chars().take(max.saturating_sub(3)).collect::<String>() + "...";
    }
    out
}

pub(crate) fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format(DATE_FORMAT).to_string()
}

/// Renders a second count as `H:MM:SS`.
pub(crate) fn format_elapsed(seconds: u64) -> String {
    format!(
        "{}:{:02}:{:02}",
        seconds / 3600,
        (seconds % 3600) / 60,
        seconds % 60
    )
}

pub(crate) fn played_label(played: bool) -> &'static str {
    if played { "Yes" } else { "No" }
}

pub(crate) fn feed_table(feeds: &[Feed]) -> String {
    let mut out = format!(
        "{:<4} {:<40} {:<6} {:<8} {:<16}\n",
        "ID", "NAME", "EPS", "PLAYED", "LAST UPDATED"
    );
    for (idx, feed) in feeds.iter().enumerate() {
        let _ = writeln!(
            out,
            "{:<4} {:<40} {:<6} {:<8} {:<16}",
            idx,
            truncate(&feed.title, 40),
            feed.episodes.len(),
            feed.played_count(),
            format_timestamp(&feed.updated)
        );
    }
    out
}

pub(crate) fn episode_table<'a>(rows: impl IntoIterator<Item = (usize, &'a Episode)>) -> String {
    let mut out = format!(
        "{:<5} {:<50} {:<7} {:<16}\n",
        "ID", "NAME", "PLAYED", "PUB DATE"
    );
    for (idx, ep) in rows {
        let _ = writeln!(
            out,
            "{:<5} {:<50} {:<7} {:<16}",
            idx,
            truncate(&ep.title, 50),
            played_label(ep.played),
            format_timestamp(&ep.published)
        );
    }
    out
}

pub(crate) fn feed_details(feed: &Feed) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Title:    {}", feed.title);
    let _ = writeln!(out, "URL:      {}", feed.url);
    let _ = writeln!(out, "RSS:      {}", redact_url(&feed.rss));
    let _ = writeln!(out, "Updated:  {}", format_timestamp(&feed.updated));
    let _ = writeln!(
        out,
        "Episodes: {} ({} played)",
        feed.episodes.len(),
        feed.played_count()
    );
    if feed.playlists.is_empty() {
        let _ = writeln!(out, "Playlists: none");
    } else {
        let _ = writeln!(out, "Playlists:");
        for (name, ids) in &feed.playlists {
            let ids = ids.iter().map(usize::to_string).collect::<Vec<_>>().join(",");
            let _ = writeln!(out, "  {name}: {ids}");
        }
    }
    out
}

pub(crate) fn episode_details(ep: &Episode) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "ID:        {}", ep.id);
    let _ = writeln!(out, "Title:     {}", ep.title);
    let _ = writeln!(out, "URL:       {}", ep.url);
    let _ = writeln!(out, "Media:     {}", ep.media_url);
    if let Some(length) = &ep.length {
        let _ = writeln!(out, "Length:    {length}");
    }
    let _ = writeln!(out, "Published: {}", format_timestamp(&ep.published));
    let _ = writeln!(out, "Played:    {}", played_label(ep.played));
    if ep.elapsed > 0 {
        let _ = writeln!(out, "Resume at: {}", format_elapsed(ep.elapsed));
    }
    out
}
