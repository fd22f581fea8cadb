use std::future::Future;
use std::time::Duration;

use anyhow::anyhow;
use qbdeck_core::{PollConfig, TorrentSnapshot, poll_torrents};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::cli::{OutputFormat, WatchArgs};
use crate::client::{AppContext, CliError, CliResult};
use crate::commands::torrents::compose_filters;
use crate::output::render_snapshot;

/// Render every refresh until interrupted or `--ticks` refreshes were shown.
///
/// A failed refresh suspends the poller; the handler logs in again with the
/// configured credentials and resumes it.
pub(crate) async fn handle_watch(
    ctx: &AppContext,
    args: WatchArgs,
    output: OutputFormat,
) -> CliResult<()> {
    let filters = compose_filters(&args.filter, ctx.policy(args.filter.policy))?;
    let config = match args.interval {
        Some(0) => return Err(CliError::validation("--interval must be at least 1 second")),
        Some(secs) => PollConfig {
            interval: Duration::from_secs(secs),
        },
        None => ctx.config.poll_config(),
    };

    let (update_tx, mut updates) = mpsc::unbounded_channel::<TorrentSnapshot>();
    let (auth_tx, mut auth_required) = mpsc::unbounded_channel::<()>();
    let handle = poll_torrents(
        ctx.source(),
        config,
        move |snapshot| {
            let _ = update_tx.send(snapshot);
        },
        move || {
            let _ = auth_tx.send(());
        },
    );

    let mut shown = 0_u64;
    let outcome = loop {
        tokio::select! {
            Some(snapshot) = updates.recv() => {
                let visible = filters.apply(&snapshot.torrents);
                if let Err(err) = render_snapshot(&snapshot, &visible, output) {
                    break Err(err);
                }
                shown += 1;
                if args.ticks.is_some_and(|ticks| shown >= ticks) {
                    break Ok(());
                }
            }
            Some(()) = auth_required.recv() => {
                if !ctx.has_credentials() {
                    break Err(CliError::validation(
                        "refresh failed and no credentials are configured to log in again",
                    ));
                }
                warn!("refresh failed; logging in again");
                if interrupted_during(config.interval, tokio::signal::ctrl_c()).await {
                    info!("interrupted");
                    break Ok(());
                }
                if let Err(err) = ctx.login().await {
                    break Err(err);
                }
                if !handle.resume() {
                    break Err(CliError::failure(anyhow!("poll loop stopped unexpectedly")));
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted");
                break Ok(());
            }
        }
    };
    handle.cancel();
    outcome
}

/// Wait `delay` unless `interrupt` completes first; `true` when interrupted.
async fn interrupted_during<F: Future>(delay: Duration, interrupt: F) -> bool {
    tokio::select! {
        () = tokio::time::sleep(delay) => false,
        _ = interrupt => true,
    }
}
