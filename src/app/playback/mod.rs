mod notify;
mod process;
mod session;
mod status;

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::store::Store;

#[cfg(test)]
pub(crate) use process::{CaptureGuard, InterruptSource};
pub(crate) use process::{OsInterrupts, Player};
pub(crate) use session::Session;
#[cfg(test)]
pub(crate) use status::StatusSink;
pub(crate) use status::TerminalStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SessionState {
    Idle,
    Starting,
    Playing,
    Completed,
    Interrupted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SessionOutcome {
    Completed,
    Interrupted { detail: String },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct BatchReport {
    pub(crate) completed: usize,
    pub(crate) skipped: usize,
}

/// Plays the selected episodes one after another, saving the store after each
/// session. Stops at the first interrupted session and reports it as an error.
pub(crate) fn play_batch(
    store: &mut Store,
    feed_idx: usize,
    positions: &[usize],
    skip_played: bool,
    session: &Session<'_>,
) -> Result<BatchReport> {
    let feed_title = store.feeds[feed_idx].title.clone();
    let mut report = BatchReport::default();

    for &pos in positions {
        let episode = &mut store.feeds[feed_idx].episodes[pos];
        if skip_played && episode.played {
            debug!(episode = %episode.title, "skipping played episode");
            report.skipped += 1;
            continue;
        }

        let outcome = session.play(&feed_title, episode);
        let episode_title = episode.title.clone();
        store.save()?;
        match outcome? {
            SessionOutcome::Completed => {
                info!(episode = %episode_title, "episode finished");
                report.completed += 1;
            }
            SessionOutcome::Interrupted { detail } => {
                return Err(Error::Playback {
                    episode: episode_title,
                    reason: format!("was interrupted ({detail})"),
                });
            }
        }
    }
    Ok(report)
}
