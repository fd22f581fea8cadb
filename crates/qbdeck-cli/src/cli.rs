//! Argument parsing and command dispatch.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use qbdeck_config::DeckConfig;
use qbdeck_core::{FilePriority, NodeKey, SelectionPolicy};
use qbdeck_telemetry::{LogFormat, LoggingConfig, command_span, init_logging};
use tracing::Instrument;
use url::Url;
use uuid::Uuid;

use crate::client::{AppContext, CliResult, load_config, parse_url};
use crate::commands::detail::handle_show;
use crate::commands::files::handle_priority;
use crate::commands::sidebar::handle_sidebar;
use crate::commands::torrents::{handle_add, handle_list};
use crate::commands::watch::handle_watch;

/// Parses CLI arguments, executes the requested command, and reports
/// failures on stderr. Returns the process exit code.
pub async fn run() -> i32 {
    let cli = Cli::parse();
    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {}", err.display_message());
            return err.exit_code();
        }
    };

    let logging = LoggingConfig {
        level: &config.logging.level,
        format: LogFormat::parse_or_infer(config.logging.format.as_deref()),
        build_sha: option_env!("QBDECK_BUILD_SHA").unwrap_or("dev"),
    };
    if let Err(err) = init_logging(&logging) {
        eprintln!("warning: {err:#}");
    }

    let trace_id = Uuid::new_v4().to_string();
    let span = command_span(command_label(&cli.command), &trace_id);
    match dispatch(cli.command, cli.output, config, &trace_id)
        .instrument(span)
        .await
    {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("error: {}", err.display_message());
            err.exit_code()
        }
    }
}

async fn dispatch(
    command: Command,
    output: OutputFormat,
    config: DeckConfig,
    trace_id: &str,
) -> CliResult<()> {
    let ctx = AppContext::connect(config, trace_id).await?;
    match command {
        Command::Ls(args) => handle_list(&ctx, args, output).await,
        Command::Sidebar => handle_sidebar(&ctx, output).await,
        Command::Show(args) => handle_show(&ctx, args, output).await,
        Command::Prio(args) => handle_priority(&ctx, args).await,
        Command::Add(args) => handle_add(&ctx, args).await,
        Command::Watch(args) => handle_watch(&ctx, args, output).await,
    }
}

#[derive(Parser)]
#[command(
    name = "qbdeck",
    version,
    about = "Terminal front-end for the qBittorrent WebUI"
)]
pub(crate) struct Cli {
    #[arg(
        long,
        global = true,
        env = "QBDECK_CONFIG",
        help = "YAML configuration file"
    )]
    pub(crate) config: Option<PathBuf>,
    #[arg(long, global = true, value_parser = parse_url, help = "WebUI base URL")]
    pub(crate) api_url: Option<Url>,
    #[arg(long, global = true)]
    pub(crate) username: Option<String>,
    #[arg(long, global = true)]
    pub(crate) password: Option<String>,
    #[arg(long, global = true, help = "HTTP timeout in seconds")]
    pub(crate) timeout: Option<u64>,
    #[arg(long, global = true, help = "Log level used when RUST_LOG is unset")]
    pub(crate) log_level: Option<String>,
    #[arg(
        long = "output",
        alias = "format",
        global = true,
        value_enum,
        default_value_t = OutputFormat::Table,
        help = "Select output format for commands that render structured data"
    )]
    pub(crate) output: OutputFormat,
    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// List torrents, optionally filtered by sidebar nodes and a search.
    Ls(FilterArgs),
    /// Show the status, tracker, and folder navigation trees.
    Sidebar,
    /// Show properties, pieces, trackers, peers, and files of one torrent.
    Show(ShowArgs),
    /// Change the download priority of files.
    Prio(PriorityArgs),
    /// Add torrents by magnet link or URL.
    Add(AddArgs),
    /// Poll the torrent list until interrupted.
    Watch(WatchArgs),
}

#[derive(Args, Default, Clone)]
pub(crate) struct FilterArgs {
    #[arg(
        long = "node",
        value_parser = parse_node,
        help = "Sidebar node to select, e.g. status:download, tracker:example.org, folder:/data"
    )]
    pub(crate) nodes: Vec<NodeKey>,
    #[arg(long, help = "Case-insensitive name search")]
    pub(crate) search: Option<String>,
    #[arg(long, requires = "search", help = "Treat --search as a regular expression")]
    pub(crate) regex: bool,
    #[arg(
        long,
        value_parser = parse_policy,
        help = "exclusive: one taxonomy filters at a time; stacked: filters combine"
    )]
    pub(crate) policy: Option<SelectionPolicy>,
}

#[derive(Args)]
pub(crate) struct ShowArgs {
    #[arg(help = "Torrent hash")]
    pub(crate) hash: String,
}

#[derive(Args)]
pub(crate) struct PriorityArgs {
    #[arg(help = "Torrent hash")]
    pub(crate) hash: String,
    #[arg(value_parser = parse_priority, help = "skip, normal, high, or maximal")]
    pub(crate) priority: FilePriority,
    #[arg(required = true, help = "File indices")]
    pub(crate) ids: Vec<u64>,
}

#[derive(Args)]
pub(crate) struct AddArgs {
    #[arg(required = true, help = "Magnet links or torrent URLs")]
    pub(crate) urls: Vec<String>,
}

#[derive(Args, Default)]
pub(crate) struct WatchArgs {
    #[command(flatten)]
    pub(crate) filter: FilterArgs,
    #[arg(long, help = "Seconds between refreshes (defaults to the configured interval)")]
    pub(crate) interval: Option<u64>,
    #[arg(long, help = "Stop after this many refreshes")]
    pub(crate) ticks: Option<u64>,
}

#[derive(Copy, Clone, Debug, Default, ValueEnum)]
pub(crate) enum OutputFormat {
    #[default]
    Table,
    Json,
}

fn parse_node(input: &str) -> Result<NodeKey, String> {
    input.parse()
}

fn parse_policy(input: &str) -> Result<SelectionPolicy, String> {
    input.parse()
}

fn parse_priority(input: &str) -> Result<FilePriority, String> {
    input.parse()
}

const fn command_label(command: &Command) -> &'static str {
    match command {
        Command::Ls(_) => "ls",
        Command::Sidebar => "sidebar",
        Command::Show(_) => "show",
        Command::Prio(_) => "prio",
        Command::Add(_) => "add",
        Command::Watch(_) => "watch",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qbdeck_core::{StatusGroup, Taxonomy};

    #[test]
    fn ls_accepts_repeated_nodes() {
        let cli = Cli::parse_from([
            "qbdeck",
            "ls",
            "--node",
            "status:download",
            "--node",
            "tracker:example.org",
            "--search",
            "iso",
        ]);
        let Command::Ls(args) = cli.command else {
            panic!("expected ls");
        };
        assert_eq!(
            args.nodes,
            vec![
                NodeKey::Status(StatusGroup::Download),
                NodeKey::Tracker("example.org".to_string())
            ]
        );
        assert_eq!(args.search.as_deref(), Some("iso"));
    }

    #[test]
    fn root_nodes_parse() {
        let cli = Cli::parse_from(["qbdeck", "ls", "--node", "folders"]);
        let Command::Ls(args) = cli.command else {
            panic!("expected ls");
        };
        assert_eq!(args.nodes, vec![NodeKey::Root(Taxonomy::Folder)]);
    }

    #[test]
    fn regex_requires_search() {
        assert!(Cli::try_parse_from(["qbdeck", "ls", "--regex"]).is_err());
    }

    #[test]
    fn prio_parses_named_priority_and_ids() {
        let cli = Cli::parse_from(["qbdeck", "prio", "abc", "high", "0", "2"]);
        let Command::Prio(args) = cli.command else {
            panic!("expected prio");
        };
        assert_eq!(args.priority, FilePriority::High);
        assert_eq!(args.ids, vec![0, 2]);
    }

    #[test]
    fn global_output_flag_applies_after_subcommand() {
        let cli = Cli::parse_from(["qbdeck", "sidebar", "--output", "json"]);
        assert!(matches!(cli.output, OutputFormat::Json));
        assert_eq!(command_label(&cli.command), "sidebar");
    }
}
