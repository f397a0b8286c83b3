mod display;
mod playback;
mod reconcile;
mod selector;
mod source;


use std::env;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use tracing::info;

use crate::cli::{Cli, Command, MarkArgs, SelectionArgs};
use crate::config::Config;
use crate::model::Feed;
use crate::paths::{config_file_path, default_store_path};
use crate::store::Store;

use self::display::{episode_details, episode_table, feed_details, feed_table};
use self::playback::{OsInterrupts, Player, Session, TerminalStatus, play_batch};
use self::reconcile::{update_all, update_feed};
use self::selector::Selector;
use self::source::{FeedSource, HttpFeedSource};

const TICK: Duration = Duration::from_secs(1);

pub fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;
    let mut store = Store::open(&config.store)?;

    match cli.command {
        Command::Add { url } => run_add(&mut store, &HttpFeedSource, &url)?,
        Command::List {
            feed,
            selection,
            save,
            mark_played,
            mark_unplayed,
        } => {
            let mark = match (mark_played, mark_unplayed) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            };
            run_list(&mut store, feed, &selection, save.as_deref(), mark)?
        }
        Command::Details { feed, selection } => run_details(&store, feed, &selection)?,
        Command::Mark {
            feed,
            selection,
            mark,
        } => run_mark(&mut store, feed, &selection, MarkMode::from(mark))?,
        Command::Delete {
            feed,
            playlist,
            yes,
        } => run_delete(&mut store, feed, playlist.as_deref(), yes)?,
        Command::Play {
            feed,
            episodes,
            playlist,
            speed,
        } => run_play(
            &mut store,
            &config,
            feed,
            episodes.as_deref(),
            playlist.as_deref(),
            speed,
        )?,
        Command::Update { feed } => run_update(&mut store, &HttpFeedSource, feed)?,
    }

    Ok(())
}

fn load_config(explicit: Option<&Path>) -> Result<Config> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => match env::var_os("PODTRACK_CONFIG").filter(|value| !value.is_empty()) {
            Some(path) => PathBuf::from(path),
            None => config_file_path()?,
        },
    };
    let config = Config::load(&path, default_store_path()?)?;
    Ok(config)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MarkMode {
    Played,
    Unplayed,
    Toggle,
}

impl From<MarkArgs> for MarkMode {
    fn from(args: MarkArgs) -> Self {
        match (args.played, args.unplayed) {
            (true, _) => Self::Played,
            (_, true) => Self::Unplayed,
            _ => Self::Toggle,
        }
    }
}

/// Applies a mark to every selected position; progress is always reset.
pub(crate) fn apply_mark(feed: &mut Feed, positions: &[usize], mode: MarkMode) {
    for &pos in positions {
        let episode = &mut feed.episodes[pos];
        let played = match mode {
            MarkMode::Played => true,
            MarkMode::Unplayed => false,
            MarkMode::Toggle => !episode.played,
        };
        episode.mark(played);
    }
}

/// Sets the played flag from a listing; listening progress is kept.
pub(crate) fn flag_played(feed: &mut Feed, positions: &[usize], played: bool) {
    for &pos in positions {
        feed.episodes[pos].played = played;
    }
}

fn feed_index(store: &Store, feed: usize) -> Result<usize> {
    if feed >= store.feeds.len() {
        bail!("no feed with id {feed}");
    }
    Ok(feed)
}

fn selector_for(selection: &SelectionArgs) -> Result<Selector> {
    let selector = Selector::from_inputs(
        selection.episodes.as_deref(),
        selection.playlist.as_deref(),
        selection.filter.as_deref(),
    )?;
    Ok(selector)
}

pub(crate) fn run_add(store: &mut Store, source: &dyn FeedSource, url: &str) -> Result<()> {
    println!("Loading {}", crate::error::redact_url(url));
    let snapshot = source.fetch(url)?;
    if store.contains_title(&snapshot.title) {
        println!("Existing feed with name [{}] found.", snapshot.title);
        return Ok(());
    }

    let feed = snapshot.into_feed();
    println!("Added {} ({} episodes)", feed.title, feed.episodes.len());
    info!(feed = %feed.title, episodes = feed.episodes.len(), "feed added");
    store.feeds.push(feed);
    store.save()?;
    Ok(())
}

fn run_list(
    store: &mut Store,
    feed: Option<usize>,
    selection: &SelectionArgs,
    save: Option<&str>,
    mark: Option<bool>,
) -> Result<()> {
    let Some(feed) = feed else {
        if save.is_some() || mark.is_some() || !selection.is_empty() {
            bail!("select a feed with --feed to filter, mark or save episodes");
        }
        if store.feeds.is_empty() {
            println!("No feeds yet. Run `podtrack add <url>` first.");
            return Ok(());
        }
        print!("{}", feed_table(&store.feeds));
        return Ok(());
    };

    let feed_idx = feed_index(store, feed)?;
    let positions = selector_for(selection)?.resolve(&store.feeds[feed_idx])?;
    if let Some(played) = mark {
        flag_played(&mut store.feeds[feed_idx], &positions, played);
        store.save()?;
    }

    let feed = &store.feeds[feed_idx];
    print!(
        "{}",
        episode_table(positions.iter().map(|&pos| (pos, &feed.episodes[pos])))
    );

    if let Some(name) = save {
        save_playlist(store, feed_idx, name, &positions)?;
        println!("Playlist saved");
    }
    Ok(())
}

pub(crate) fn save_playlist(
    store: &mut Store,
    feed_idx: usize,
    name: &str,
    positions: &[usize],
) -> Result<()> {
    let feed = &mut store.feeds[feed_idx];
    let ids = positions
        .iter()
        .map(|&pos| feed.episodes[pos].id)
        .collect::<Vec<_>>();
    feed.playlists.insert(name.to_string(), ids);
    store.save()?;
    Ok(())
}

fn run_details(store: &Store, feed: usize, selection: &SelectionArgs) -> Result<()> {
    let feed = &store.feeds[feed_index(store, feed)?];
    if selection.is_empty() {
        print!("{}", feed_details(feed));
        return Ok(());
    }

    let episodes = selector_for(selection)?.episodes(feed)?;
    if episodes.is_empty() {
        println!("Nothing selected.");
    }
    for (idx, episode) in episodes.into_iter().enumerate() {
        if idx > 0 {
            println!();
        }
        print!("{}", episode_details(episode));
    }
    Ok(())
}

fn run_mark(
    store: &mut Store,
    feed: usize,
    selection: &SelectionArgs,
    mode: MarkMode,
) -> Result<()> {
    let feed_idx = feed_index(store, feed)?;
    if selection.is_empty() {
        bail!("select episodes to mark with --episodes, --playlist or --filter");
    }
    let positions = selector_for(selection)?.resolve(&store.feeds[feed_idx])?;
    apply_mark(&mut store.feeds[feed_idx], &positions, mode);
    store.save()?;

    let verb = match mode {
        MarkMode::Played => "Marked played",
        MarkMode::Unplayed => "Marked unplayed",
        MarkMode::Toggle => "Toggled",
    };
    println!("{verb}: {} episode(s)", positions.len());
    Ok(())
}

fn run_delete(store: &mut Store, feed: usize, playlist: Option<&str>, yes: bool) -> Result<()> {
    let feed_idx = feed_index(store, feed)?;

    if let Some(name) = playlist {
        if store.feeds[feed_idx].playlist(name).is_none() {
            bail!("playlist '{name}' not found");
        }
        if yes || confirm(&format!("Delete playlist '{name}', "))? {
            store.feeds[feed_idx].playlists.remove(name);
            store.save()?;
            println!("Playlist '{name}' deleted.");
        }
        return Ok(());
    }

    let title = store.feeds[feed_idx].title.clone();
    if yes || confirm(&format!("Delete feed '{title}', "))? {
        store.feeds.remove(feed_idx);
        store.save()?;
        println!("Feed '{title}' deleted.");
    }
    Ok(())
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{prompt}are you sure? [y/N]: ");
    io::stdout().flush().context("failed to flush prompt")?;
    let mut answer = String::new();
    io::stdin()
        .lock()
        .read_line(&mut answer)
        .context("failed to read confirmation")?;
    Ok(is_confirmation(&answer))
}

pub(crate) fn is_confirmation(answer: &str) -> bool {
    matches!(answer.trim(), "y" | "Y")
}

fn run_play(
    store: &mut Store,
    config: &Config,
    feed: usize,
    episodes: Option<&str>,
    playlist: Option<&str>,
    speed: f32,
) -> Result<()> {
    let feed_idx = feed_index(store, feed)?;
    let selector = Selector::from_inputs(episodes, playlist, None)?;
    let positions = play_positions(&store.feeds[feed_idx], &selector)?;
    if positions.is_empty() {
        println!("Nothing selected.");
        return Ok(());
    }

    let player = Player::new(config.player.clone(), speed);
    let session = Session {
        player: &player,
        status: &TerminalStatus,
        interrupts: &OsInterrupts,
        tick: TICK,
        countdown_step: TICK,
        notify: config.notify,
    };
    let report = play_batch(
        store,
        feed_idx,
        &positions,
        !selector.is_individual(),
        &session,
    )?;
    println!(
        "Played {} episode(s), skipped {} already played.",
        report.completed, report.skipped
    );
    Ok(())
}

/// Like `Selector::resolve`, except an individually addressed episode must exist.
pub(crate) fn play_positions(feed: &Feed, selector: &Selector) -> Result<Vec<usize>> {
    let positions = selector.resolve(feed)?;
    if let Selector::Single(index) = selector
        && positions.is_empty()
    {
        bail!("invalid episode id [{index}]");
    }
    Ok(positions)
}

pub(crate) fn run_update(
    store: &mut Store,
    source: &dyn FeedSource,
    feed: Option<usize>,
) -> Result<()> {
    if let Some(feed) = feed {
        let feed_idx = feed_index(store, feed)?;
        let report = update_feed(&mut store.feeds[feed_idx], source)?;
        store.save()?;
        println!(
            "{}: {} refreshed, {} new",
            store.feeds[feed_idx].title, report.refreshed, report.appended
        );
        return Ok(());
    }

    let pass = update_all(store, source)?;
    for (title, report) in &pass.updated {
        println!(
            "{title}: {} refreshed, {} new",
            report.refreshed, report.appended
        );
    }
    for (title, err) in &pass.failed {
        println!("{title}: update failed: {err}");
    }
    Ok(())
}
