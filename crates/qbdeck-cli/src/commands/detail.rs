use anyhow::anyhow;
use qbdeck_core::{DetailGuard, PeerTable, load_detail};

use crate::cli::{OutputFormat, ShowArgs};
use crate::client::{AppContext, CliError, CliResult};
use crate::output::render_detail;

pub(crate) async fn handle_show(
    ctx: &AppContext,
    args: ShowArgs,
    output: OutputFormat,
) -> CliResult<()> {
    let hash = args.hash.trim();
    if hash.is_empty() {
        return Err(CliError::validation("torrent hash must not be empty"));
    }
    let guard = DetailGuard::default();
    let ticket = guard.select(hash);
    let mut peers = PeerTable::default();
    let view = load_detail(&ctx.client, &guard, &ticket, &mut peers)
        .await
        .ok_or_else(|| CliError::failure(anyhow!("selection of {hash} changed while loading")))?;
    render_detail(&view, output)
}
