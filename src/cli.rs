use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "podtrack",
    version,
    about = "Podcast aggregator that plays episodes in order and tracks listening progress"
)]
pub struct Cli {
    /// Config file (default: <config dir>/podtrack/config.json)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Ways to pick episodes within a feed. An index expression wins over a
/// playlist, which wins over a filter.
#[derive(Debug, Clone, Default, Args)]
pub struct SelectionArgs {
    /// Episode index, range (0-4) or set (0,5,3). Sets cannot contain spaces.
    #[arg(short, long)]
    pub episodes: Option<String>,

    /// Saved playlist name
    #[arg(short = 'l', long)]
    pub playlist: Option<String>,

    /// Regular expression matched against episode titles
    #[arg(short = 'r', long)]
    pub filter: Option<String>,
}

impl SelectionArgs {
    pub fn is_empty(&self) -> bool {
        self.episodes.is_none() && self.playlist.is_none() && self.filter.is_none()
    }
}

#[derive(Debug, Clone, Copy, Default, Args)]
#[group(multiple = false)]
pub struct MarkArgs {
    /// Mark selected episodes played
    #[arg(short = 'p', long = "played")]
    pub played: bool,

    /// Mark selected episodes unplayed
    #[arg(short = 'u', long = "unplayed")]
    pub unplayed: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Subscribe to an RSS feed
    Add { url: String },

    /// List feeds, or the episodes of one feed
    List {
        /// Feed to list episodes for
        #[arg(short, long)]
        feed: Option<usize>,

        #[command(flatten)]
        selection: SelectionArgs,

        /// Save the listed episodes as a playlist
        #[arg(short, long)]
        save: Option<String>,

        /// Mark the listed episodes played
        #[arg(short = 'p', long, conflicts_with = "mark_unplayed")]
        mark_played: bool,

        /// Mark the listed episodes unplayed
        #[arg(short = 'u', long)]
        mark_unplayed: bool,
    },

    /// Print details of a feed or of selected episodes
    Details {
        #[arg(short, long, default_value_t = 0)]
        feed: usize,

        #[command(flatten)]
        selection: SelectionArgs,
    },

    /// Mark episodes played or unplayed; toggles when neither flag is given
    Mark {
        #[arg(short, long)]
        feed: usize,

        #[command(flatten)]
        selection: SelectionArgs,

        #[command(flatten)]
        mark: MarkArgs,
    },

    /// Delete a feed or one of its playlists
    Delete {
        #[arg(short, long)]
        feed: usize,

        /// Playlist to delete instead of the feed
        #[arg(short = 'l', long)]
        playlist: Option<String>,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Play a feed, an episode, a range/set of episodes or a playlist
    Play {
        #[arg(short, long, default_value_t = 0)]
        feed: usize,

        /// Episode index, range (0-4) or set (0,5,3)
        #[arg(short, long)]
        episodes: Option<String>,

        /// Saved playlist name
        #[arg(short = 'l', long)]
        playlist: Option<String>,

        /// Playback speed between 0.01 and 100
        #[arg(short, long, default_value_t = 1.0, value_parser = parse_speed)]
        speed: f32,
    },

    /// Refresh every feed, or just one
    Update {
        #[arg(short, long)]
        feed: Option<usize>,
    },
}

pub(crate) fn parse_speed(raw: &str) -> Result<f32, String> {
    let speed = raw
        .trim()
        .parse::<f32>()
        .map_err(|err| format!("invalid speed '{raw}': {err}"))?;
    if (0.01..=100.0).contains(&speed) {
        Ok(speed)
    } else {
        Err(format!("speed must be between 0.01 and 100, got {speed}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_speed_accepts_bounds_and_rejects_outside() {
        assert_eq!(parse_speed("1.5"), Ok(1.5));
        assert_eq!(parse_speed("0.01"), Ok(0.01));
        assert_eq!(parse_speed("100"), Ok(100.0));
        assert!(parse_speed("0").is_err());
        assert!(parse_speed("100.5").is_err());
        assert!(parse_speed("fast").is_err());
    }

    #[test]
    fn play_command_parses_selection_and_speed() {
        let cli = Cli::try_parse_from(["podtrack", "play", "-f", "2", "-e", "1-3", "-s", "1.25"])
            .expect("valid arguments");
        match cli.command {
            Command::Play {
                feed,
                episodes,
                playlist,
                speed,
            } => {
                assert_eq!(feed, 2);
                assert_eq!(episodes.as_deref(), Some("1-3"));
                assert!(playlist.is_none());
                assert_eq!(speed, 1.25);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn mark_rejects_played_and_unplayed_together() {
        let parsed = Cli::try_parse_from(["podtrack", "mark", "-f", "0", "-p", "-u"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn list_rejects_conflicting_mark_flags() {
        let parsed = Cli::try_parse_from(["podtrack", "list", "-f", "0", "-p", "-u"]);
        assert!(parsed.is_err());
    }
}
