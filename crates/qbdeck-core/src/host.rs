//! Tracker URL to hostname derivation.

use url::Url;

/// Host used when a tracker URL is empty or cannot be parsed.
pub const UNKNOWN_HOST: &str = "unknown";

/// Hostname portion of a tracker URL, or [`UNKNOWN_HOST`].
///
/// Never fails: malformed input lands under the sentinel so that a single
/// bad record cannot break classification.
#[must_use]
pub fn host_name(url: &str) -> String {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return UNKNOWN_HOST.to_string();
    }
    Url::parse(trimmed)
        .ok()
        .and_then(|parsed| parsed.host_str().map(str::to_ascii_lowercase))
        .filter(|host| !host.is_empty())
        .unwrap_or_else(|| UNKNOWN_HOST.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_url_is_unknown() {
        assert_eq!(host_name(""), UNKNOWN_HOST);
        assert_eq!(host_name("   "), UNKNOWN_HOST);
    }

    #[test]
    fn http_tracker_yields_hostname() {
        assert_eq!(
            host_name("http://tracker.example.com:6969/announce"),
            "tracker.example.com"
        );
    }

    #[test]
    fn udp_tracker_yields_hostname() {
        assert_eq!(
            host_name("udp://open.tracker.org:1337/announce"),
            "open.tracker.org"
        );
    }

    #[test]
    fn malformed_url_is_unknown() {
        assert_eq!(host_name("not a url"), UNKNOWN_HOST);
        assert_eq!(host_name("** [DHT] **"), UNKNOWN_HOST);
    }
}
