use std::io::{self, Write};

use crossterm::cursor::MoveTo;
use crossterm::execute;
use crossterm::terminal::{Clear, ClearType};

use super::super::display::format_elapsed;

/// Receives the on-screen updates of a session.
pub(crate) trait StatusSink: Sync {
    fn countdown(&self, feed_title: &str, episode_title: &str, resume_at: u64, remaining: u32);

    fn playing(&self, feed_title: &str, episode_title: &str, elapsed: u64);
}

/// Redraws the whole terminal on every update.
#[derive(Debug, Default)]
pub(crate) struct TerminalStatus;

impl TerminalStatus {
    fn redraw(lines: &[String]) -> io::Result<()> {
        let mut out = io::stdout().lock();
        execute!(out, Clear(ClearType::All), MoveTo(0, 0))?;
        for line in lines {
            writeln!(out, "{line}")?;
        }
        out.flush()
    }
}

impl StatusSink for TerminalStatus {
    fn countdown(&self, feed_title: &str, episode_title: &str, resume_at: u64, remaining: u32) {
        let _ = Self::redraw(&[
            format!("Feed: {feed_title}"),
            format!("Playing: {episode_title}"),
            format!(
                "-> Resuming at {} in {remaining}",
                format_elapsed(resume_at)
            ),
        ]);
    }

    fn playing(&self, feed_title: &str, episode_title: &str, elapsed: u64) {
        let _ = Self::redraw(&[
            format!("Feed: {feed_title}"),
            format!("Playing: {episode_title}"),
            format!("Elapsed: {}", format_elapsed(elapsed)),
        ]);
    }
}
