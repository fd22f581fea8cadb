//! Display helpers shared by renderers.

use chrono::DateTime;

use crate::model::TorrentState;
use crate::status::StatusGroup;

/// ETA reported by the backend when no estimate exists.
pub const ETA_INFINITE: i64 = 8_640_000;

const SIZE_UNITS: [&str; 7] = ["B", "KB", "MB", "GB", "TB", "PB", "EB"];

/// Byte count in binary steps with two decimals, e.g. `1.50 MB`.
#[must_use]
pub fn format_size(bytes: u64) -> String {
    #[allow(clippy::cast_precision_loss)]
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit + 1 < SIZE_UNITS.len() {
        size /= 1024.0;
        unit += 1;
    }
    format!("{size:.2} {}", SIZE_UNITS[unit])
}

/// Transfer rate, e.g. `12.00 KB/s`.
#[must_use]
pub fn format_speed(bytes_per_second: u64) -> String {
    format!("{}/s", format_size(bytes_per_second))
}

/// Duration using at most `max_units` of `d`, `h`, `m`, `s`, e.g. `1d 4h`.
///
/// Zero and negative durations render as `0s`.
#[must_use]
pub fn format_duration(seconds: i64, max_units: usize) -> String {
    const STEPS: [(i64, &str); 4] = [(86_400, "d"), (3_600, "h"), (60, "m"), (1, "s")];
    if seconds <= 0 {
        return "0s".to_string();
    }
    let mut remaining = seconds;
    let parts: Vec<String> = STEPS
        .iter()
        .filter_map(|&(step, suffix)| {
            let amount = remaining / step;
            remaining %= step;
            (amount > 0).then(|| format!("{amount}{suffix}"))
        })
        .take(max_units.max(1))
        .collect();
    parts.join(" ")
}

/// ETA with the unbounded sentinel rendered as `∞`.
#[must_use]
pub fn format_eta(eta: i64) -> String {
    if eta == ETA_INFINITE {
        "∞".to_string()
    } else {
        format_duration(eta, 2)
    }
}

/// Epoch seconds as a UTC timestamp, `-` when unset.
#[must_use]
pub fn format_epoch(epoch: i64) -> String {
    if epoch <= 0 {
        return "-".to_string();
    }
    DateTime::from_timestamp(epoch, 0).map_or_else(
        || "-".to_string(),
        |moment| moment.format("%Y-%m-%d %H:%M:%S").to_string(),
    )
}

/// Completion as a percentage with one decimal.
#[must_use]
pub fn format_progress(progress: f64) -> String {
    format!("{:.1}%", (progress * 100.0).clamp(0.0, 100.0))
}

/// Icon of the first matching group among download, upload, pause, check
/// and error.
#[must_use]
pub fn state_icon(state: TorrentState) -> Option<&'static str> {
    [
        StatusGroup::Download,
        StatusGroup::Upload,
        StatusGroup::Pause,
        StatusGroup::Check,
        StatusGroup::Error,
    ]
    .into_iter()
    .find(|group| group.contains(state))
    .map(StatusGroup::icon)
}
