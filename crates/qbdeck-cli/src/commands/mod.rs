//! Command handlers grouped by concern.

pub(crate) mod detail;
pub(crate) mod files;
pub(crate) mod sidebar;
pub(crate) mod torrents;
pub(crate) mod watch;
