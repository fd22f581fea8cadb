//! Output renderers and formatting helpers for CLI commands.

use anyhow::anyhow;
use qbdeck_core::format::{
    format_duration, format_epoch, format_eta, format_progress, format_size, format_speed,
};
use qbdeck_core::{DetailView, PieceBucket, Taxonomies, Torrent, TorrentSnapshot};
use serde::Serialize;

use crate::cli::OutputFormat;
use crate::client::{CliError, CliResult};

const PIECE_BAR_WIDTH: usize = 64;

/// One line emitted per refresh by `watch --output json`.
#[derive(Serialize)]
struct SnapshotLine<'a> {
    sequence: u64,
    fetched_at: String,
    total: usize,
    torrents: &'a [&'a Torrent],
}

fn to_json<T: Serialize + ?Sized>(value: &T, pretty: bool) -> CliResult<String> {
    let text = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    text.map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}")))
}

pub(crate) fn render_torrent_list(torrents: &[&Torrent], format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => println!("{}", to_json(torrents, true)?),
        OutputFormat::Table => {
            println!("{}", torrent_header());
            for torrent in torrents {
                println!("{}", torrent_row(torrent));
            }
        }
    }
    Ok(())
}

fn torrent_header() -> String {
    format!(
        "{:<40} {:<18} {:>7} {:>11} {:>12} {:>12} {:>8} NAME",
        "HASH", "STATE", "PROG", "SIZE", "DOWN", "UP", "ETA"
    )
}

pub(crate) fn torrent_row(torrent: &Torrent) -> String {
    format!(
        "{:<40} {:<18} {:>7} {:>11} {:>12} {:>12} {:>8} {}",
        torrent.hash,
        torrent.state.as_str(),
        format_progress(torrent.progress),
        format_size(torrent.size),
        format_speed(torrent.dlspeed),
        format_speed(torrent.upspeed),
        format_eta(torrent.eta),
        torrent.name
    )
}

pub(crate) fn render_sidebar(trees: &Taxonomies, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => println!("{}", to_json(trees, true)?),
        OutputFormat::Table => {
            for row in sidebar_rows(trees) {
                println!("{row}");
            }
        }
    }
    Ok(())
}

pub(crate) fn sidebar_rows(trees: &Taxonomies) -> Vec<String> {
    [&trees.status, &trees.trackers, &trees.folders]
        .into_iter()
        .flat_map(|tree| tree.walk())
        .map(|(depth, node)| {
            let label = format!("{}{}", "  ".repeat(depth), node.label);
            format!(
                "{label:<40} {:>6} {:>11}  {}",
                node.aggregate.count,
                format_size(node.aggregate.size),
                node.key
            )
        })
        .collect()
}

pub(crate) fn render_detail(view: &DetailView, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => println!("{}", to_json(view, true)?),
        OutputFormat::Table => {
            for line in detail_lines(view) {
                println!("{line}");
            }
        }
    }
    Ok(())
}

pub(crate) fn detail_lines(view: &DetailView) -> Vec<String> {
    let mut lines = vec![format!("hash: {}", view.hash)];
    match &view.properties {
        Some(props) => {
            lines.push(format!("save path: {}", props.save_path));
            if props.pieces_num < 0 {
                lines.push("size: unknown (waiting for metadata)".to_string());
            } else {
                lines.push(format!(
                    "size: {} ({} pieces of {}, {} done)",
                    known_size(props.total_size),
                    props.pieces_num,
                    known_size(props.piece_size),
                    props.pieces_have.max(0)
                ));
            }
            lines.push(format!(
                "transferred: down {} / up {} (ratio {:.2})",
                format_size(props.total_downloaded),
                format_size(props.total_uploaded),
                props.share_ratio
            ));
            lines.push(format!(
                "speed: down {} / up {}",
                format_speed(props.dl_speed),
                format_speed(props.up_speed)
            ));
            lines.push(format!(
                "elapsed: {} (seeding {})  eta: {}",
                format_duration(props.time_elapsed, 2),
                format_duration(props.seeding_time, 2),
                format_eta(props.eta)
            ));
            lines.push(format!("added: {}", format_epoch(props.addition_date)));
            lines.push(format!("completed: {}", format_epoch(props.completion_date)));
            if !props.comment.is_empty() {
                lines.push(format!("comment: {}", props.comment));
            }
        }
        None => lines.push("properties: unavailable".to_string()),
    }

    lines.push(format!("pieces: {}", view.piece_count));
    let bar = piece_bar(&view.pieces);
    let cells: Vec<char> = bar.chars().collect();
    lines.extend(
        cells
            .chunks(PIECE_BAR_WIDTH)
            .map(|row| format!("  [{}]", row.iter().collect::<String>())),
    );

    lines.push(format!("trackers: {}", view.trackers.len()));
    for tracker in &view.trackers {
        lines.push(format!(
            "  {:<12} {:>5} {:>5} {:>5}  {}",
            tracker.status.label(),
            tracker.num_seeds,
            tracker.num_leeches,
            tracker.num_peers,
            tracker.url
        ));
    }

    lines.push(format!("peers: {}", view.peers.len()));
    for peer in &view.peers {
        lines.push(format!(
            "  {:<40} {:>7} {:>12} {:>12}  {}",
            format!("{}:{}", peer.ip, peer.port),
            format_progress(peer.progress),
            format_speed(peer.dl_speed),
            format_speed(peer.up_speed),
            peer.client
        ));
    }

    lines.push(format!("files: {}", view.files.len()));
    for file in &view.files {
        lines.push(format!(
            "  {:>5} {:>11} {:>7} {:<8} {}",
            file.index,
            format_size(file.size),
            format_progress(file.progress),
            file.priority.label(),
            file.name
        ));
    }
    lines
}

// Sizes the server reports as `-1` before metadata arrives.
fn known_size(bytes: i64) -> String {
    u64::try_from(bytes).map_or_else(|_| "unknown".to_string(), format_size)
}

/// One character per bucket: `*` in flight, then `.` `-` `+` `#` by share done.
pub(crate) fn piece_bar(buckets: &[PieceBucket]) -> String {
    buckets
        .iter()
        .map(|bucket| match bucket.fraction() {
            None => '*',
            Some(share) if share >= 1.0 => '#',
            Some(share) if share >= 0.5 => '+',
            Some(share) if share > 0.0 => '-',
            Some(_) => '.',
        })
        .collect()
}

pub(crate) fn render_snapshot(
    snapshot: &TorrentSnapshot,
    visible: &[&Torrent],
    format: OutputFormat,
) -> CliResult<()> {
    match format {
        OutputFormat::Json => {
            let line = SnapshotLine {
                sequence: snapshot.sequence,
                fetched_at: snapshot.fetched_at.to_rfc3339(),
                total: snapshot.torrents.len(),
                torrents: visible,
            };
            println!("{}", to_json(&line, false)?);
        }
        OutputFormat::Table => {
            println!(
                "-- refresh #{} at {}: {} of {} torrents --",
                snapshot.sequence,
                snapshot.fetched_at.format("%H:%M:%S"),
                visible.len(),
                snapshot.torrents.len()
            );
            render_torrent_list(visible, OutputFormat::Table)?;
        }
    }
    Ok(())
}
