use qbdeck_core::TorrentSource;

use crate::cli::PriorityArgs;
use crate::client::{AppContext, CliError, CliResult, source_failure};

pub(crate) async fn handle_priority(ctx: &AppContext, args: PriorityArgs) -> CliResult<()> {
    let hash = args.hash.trim();
    if hash.is_empty() {
        return Err(CliError::validation("torrent hash must not be empty"));
    }
    ctx.client
        .set_file_priority(hash, &args.ids, args.priority)
        .await
        .map_err(source_failure)?;
    println!(
        "Set priority of {} file(s) in {hash} to {}",
        args.ids.len(),
        args.priority.label()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::context_for;
    use httpmock::MockServer;
    use httpmock::prelude::*;
    use qbdeck_core::FilePriority;

    #[tokio::test]
    async fn priority_change_posts_to_file_prio() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST).path("/api/v2/torrents/filePrio");
            then.status(200);
        });

        let ctx = context_for(&server.base_url());
        handle_priority(
            &ctx,
            PriorityArgs {
                hash: "a1".to_string(),
                priority: FilePriority::DoNotDownload,
                ids: vec![1, 2],
            },
        )
        .await
        .expect("priority set");
        mock.assert();
    }

    #[tokio::test]
    async fn invalid_file_id_surfaces_backend_status() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/api/v2/torrents/filePrio");
            then.status(409).body("File IDs must be integers");
        });

        let ctx = context_for(&server.base_url());
        let err = handle_priority(
            &ctx,
            PriorityArgs {
                hash: "a1".to_string(),
                priority: FilePriority::High,
                ids: vec![99],
            },
        )
        .await
        .expect_err("conflict");
        assert_eq!(
            err.display_message(),
            "torrents.file_prio: status 409: File IDs must be integers"
        );
    }
}
