use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread;
use std::time::Duration;

use crossbeam_channel::{Receiver, select};
use tracing::{debug, info, warn};

use super::notify::send_notification;
use super::process::{InterruptSource, Player, forward_signal};
use super::status::StatusSink;
use super::{SessionOutcome, SessionState};
use crate::error::{Error, Result};
use crate::model::Episode;

const RESUME_COUNTDOWN: u32 = 3;
const SIGNAL_POLL: Duration = Duration::from_millis(50);

/// Plays single episodes through the external player.
pub(crate) struct Session<'a> {
    pub(crate) player: &'a Player,
    pub(crate) status: &'a dyn StatusSink,
    pub(crate) interrupts: &'a dyn InterruptSource,
    pub(crate) tick: Duration,
    pub(crate) countdown_step: Duration,
    pub(crate) notify: bool,
}

impl Session<'_> {
    /// Runs one episode to a terminal state, updating its progress in place.
    ///
    /// The caller persists the episode afterwards whatever the outcome.
    pub(crate) fn play(&self, feed_title: &str, episode: &mut Episode) -> Result<SessionOutcome> {
        let mut state = SessionState::Idle;
        advance(&mut state, SessionState::Starting, &episode.title);

        if self.notify {
            send_notification(feed_title, &episode.title);
        }
        if episode.elapsed > 0 {
            for remaining in (1..=RESUME_COUNTDOWN).rev() {
                self.status
                    .countdown(feed_title, &episode.title, episode.elapsed, remaining);
                thread::sleep(self.countdown_step);
            }
        }

        let playback_error = |reason: String| Error::Playback {
            episode: episode.title.clone(),
            reason,
        };
        let _capture = self
            .interrupts
            .capture()
            .map_err(|err| playback_error(format!("could not capture signals: {err}")))?;
        let mut child = self
            .player
            .spawn(&episode.media_url, episode.elapsed)
            .map_err(|err| {
                playback_error(format!(
                    "failed to launch {}: {err}",
                    self.player.bin().display()
                ))
            })?;
        advance(&mut state, SessionState::Playing, &episode.title);

        let pid = child.id();
        let elapsed = AtomicU64::new(episode.elapsed);
        let interrupted = AtomicBool::new(false);
        let (done_tx, done_rx) = crossbeam_channel::bounded::<()>(0);
        let episode_title = episode.title.as_str();

        let wait_result = thread::scope(|scope| {
            scope.spawn(|| {
                run_ticker(
                    self.tick,
                    &elapsed,
                    &interrupted,
                    &done_rx,
                    self.status,
                    feed_title,
                    episode_title,
                )
            });
            scope.spawn(|| run_signal_listener(pid, self.interrupts, &interrupted, &done_rx));

            let result = child.wait();
            // Disconnecting the channel stops both background tasks.
            drop(done_tx);
            result
        });

        episode.elapsed = elapsed.into_inner();
        let status = wait_result.map_err(|err| Error::Playback {
            episode: episode.title.clone(),
            reason: format!("failed waiting on player: {err}"),
        })?;

        if status.success() && !interrupted.into_inner() {
            episode.mark(true);
            advance(&mut state, SessionState::Completed, &episode.title);
            Ok(SessionOutcome::Completed)
        } else {
            advance(&mut state, SessionState::Interrupted, &episode.title);
            info!(
                episode = %episode.title,
                elapsed = episode.elapsed,
                %status,
                "playback interrupted"
            );
            Ok(SessionOutcome::Interrupted {
                detail: format!("player exited with {status}"),
            })
        }
    }
}

fn advance(state: &mut SessionState, next: SessionState, episode_title: &str) {
    debug!(episode = %episode_title, from = ?*state, to = ?next, "session state");
    *state = next;
}

fn run_ticker(
    tick: Duration,
    elapsed: &AtomicU64,
    interrupted: &AtomicBool,
    done: &Receiver<()>,
    status: &dyn StatusSink,
    feed_title: &str,
    episode_title: &str,
) {
    let ticks = crossbeam_channel::tick(tick);
    loop {
        let stopped = select! {
            recv(done) -> _ => true,
            recv(ticks) -> _ => false,
        };
        if stopped || interrupted.load(Ordering::SeqCst) {
            return;
        }
        let now = elapsed.fetch_add(1, Ordering::SeqCst) + 1;
        status.playing(feed_title, episode_title, now);
    }
}

fn run_signal_listener(
    pid: u32,
    interrupts: &dyn InterruptSource,
    interrupted: &AtomicBool,
    done: &Receiver<()>,
) {
    let polls = crossbeam_channel::tick(SIGNAL_POLL);
    loop {
        let stopped = select! {
            recv(done) -> _ => true,
            recv(polls) -> _ => false,
        };
        if stopped {
            return;
        }
        if let Some(signum) = interrupts.take_pending() {
            interrupted.store(true, Ordering::SeqCst);
            debug!(signum, pid, "forwarding signal to player");
            if let Err(err) = forward_signal(pid, signum) {
                warn!(error = %err, pid, "failed to forward signal to player");
            }
            return;
        }
    }
}
