use qbdeck_core::{FilterComposer, FilterSet, SelectionPolicy, TorrentSource};

use crate::cli::{AddArgs, FilterArgs, OutputFormat};
use crate::client::{AppContext, CliError, CliResult, source_failure};
use crate::output::render_torrent_list;

/// Apply the selected nodes in order, then the search.
pub(crate) fn compose_filters(args: &FilterArgs, policy: SelectionPolicy) -> CliResult<FilterSet> {
    let mut composer = FilterComposer::new(policy);
    for key in &args.nodes {
        composer.select_node(key);
    }
    if let Some(query) = &args.search {
        composer
            .set_search(query, args.regex)
            .map_err(|err| CliError::validation(format!("{:#}", anyhow::Error::new(err))))?;
    }
    Ok(composer.snapshot())
}

pub(crate) async fn handle_list(
    ctx: &AppContext,
    args: FilterArgs,
    output: OutputFormat,
) -> CliResult<()> {
    let filters = compose_filters(&args, ctx.policy(args.policy))?;
    let torrents = ctx.client.fetch_torrents().await.map_err(source_failure)?;
    let visible = filters.apply(&torrents);
    tracing::debug!(
        total = torrents.len(),
        visible = visible.len(),
        "torrent list filtered"
    );
    render_torrent_list(&visible, output)
}

pub(crate) async fn handle_add(ctx: &AppContext, args: AddArgs) -> CliResult<()> {
    let urls: Vec<String> = args
        .urls
        .iter()
        .map(|url| url.trim().to_string())
        .filter(|url| !url.is_empty())
        .collect();
    if urls.is_empty() {
        return Err(CliError::validation("at least one URL is required"));
    }
    ctx.client
        .add_torrent_urls(&urls)
        .await
        .map_err(source_failure)?;
    println!("Submitted {} torrent(s)", urls.len());
    Ok(())
}
