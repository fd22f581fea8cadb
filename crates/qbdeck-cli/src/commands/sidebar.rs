use qbdeck_core::{TorrentSource, classify};

use crate::cli::OutputFormat;
use crate::client::{AppContext, CliResult, source_failure};
use crate::output::render_sidebar;

pub(crate) async fn handle_sidebar(ctx: &AppContext, output: OutputFormat) -> CliResult<()> {
    let torrents = ctx.client.fetch_torrents().await.map_err(source_failure)?;
    render_sidebar(&classify(&torrents), output)
}
