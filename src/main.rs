use anyhow::{Context, Result};
use clap::Parser;
use relay_status_feed::logging::init_logging;
use relay_status_feed::render::{render_board, render_json, BoardStyle};
use relay_status_feed::{FeedConfig, StatusFeed, StatusSnapshot};
use std::path::PathBuf;
use tracing::info;

/// Print the synthetic relay-node status board
#[derive(Debug, Parser)]
#[command(name = "relay-status", version, about)]
struct Cli {
    /// Configuration file (defaults to ./relay-status.toml if present)
    #[arg(short, long, env = "RELAY_STATUS_CONFIG")]
    config: Option<PathBuf>,

    /// Exit after this many ticks
    #[arg(short = 'n', long)]
    ticks: Option<u64>,

    /// Print snapshots as JSON
    #[arg(long)]
    json: bool,

    /// Disable ANSI colours
    #[arg(long)]
    no_color: bool,

    /// Print a sample configuration file and exit
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.print_config {
        print!("{}", FeedConfig::sample_toml()?);
        return Ok(());
    }

    let config = match FeedConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) if e.is_config_error() => {
            eprintln!("invalid configuration: {e}");
            eprintln!("run `relay-status --print-config` for a sample file");
            std::process::exit(2);
        }
        Err(e) => return Err(e).context("failed to load configuration"),
    };
    let _log_guard = init_logging(&config.log_config())?;

    let roster = config.roster()?;
    let options = config.feed_options();
    let style = BoardStyle {
        color: !cli.no_color,
        interval: Some(options.interval),
    };

    let feed = StatusFeed::start(roster, options);
    let mut subscription = feed.subscribe();
    print_snapshot(&feed.latest(), &style, cli.json)?;

    let ctrl_c = async {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted, shutting down");
        }
    };
    subscription
        .run_until(cli.ticks, ctrl_c, |snapshot| {
            print_snapshot(snapshot, &style, cli.json)
        })
        .await?;

    feed.shutdown().await;
    Ok(())
}

fn print_snapshot(snapshot: &StatusSnapshot, style: &BoardStyle, json: bool) -> Result<()> {
    if json {
        println!("{}", render_json(snapshot)?);
    } else {
        println!("{}", render_board(snapshot, style));
    }
    Ok(())
}
