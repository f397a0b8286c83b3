use std::process::{Command as ProcessCommand, Stdio};
use std::thread;

use tracing::debug;

const NOTIFY_BIN: &str = "notify-send";
const EXPIRE_MS: u32 = 10_000;

/// Fire-and-forget desktop notification; failures only reach the debug log.
pub(crate) fn send_notification(feed_title: &str, episode_title: &str) {
    let body = format!("{feed_title}\n{episode_title}");
    let spawned = thread::Builder::new()
        .name("notify".into())
        .spawn(move || {
            let result = ProcessCommand::new(NOTIFY_BIN)
                .arg("--app-name=podtrack")
                .arg(format!("--expire-time={EXPIRE_MS}"))
                .arg("Podcast")
                .arg(body)
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status();
            match result {
                Ok(status) if status.success() => {}
                Ok(status) => debug!(%status, "notification command failed"),
                Err(err) => debug!(error = %err, "notification command unavailable"),
            }
        });
    if let Err(err) = spawned {
        debug!(error = %err, "failed to start notification thread");
    }
}
