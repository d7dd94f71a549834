mod events;
mod output;
mod watch;

use clap::Parser;
use dash_transport::{FeedConfig, TopicBundle};
use std::path::PathBuf;
use std::time::{Duration, Instant};

#[derive(Parser)]
#[command(name = "dash-watch", about = "Watch a node's dashboard feed and emit JSONL summaries")]
struct Cli {
    /// Feed address (`host:port`). Defaults to $DASH_FEED_ADDR, then 127.0.0.1:8081.
    #[arg(long)]
    addr: Option<String>,

    /// Topic bundles to register on every connect (comma-separated).
    /// The main bundle is always registered.
    #[arg(long, value_delimiter = ',', default_value = "main")]
    bundle: Vec<TopicBundle>,

    /// Delay before reconnecting after a loss, in seconds.
    #[arg(long, default_value = "5")]
    reconnect_delay: u64,

    /// Dial timeout in seconds.
    #[arg(long, default_value = "10")]
    connect_timeout: u64,

    /// Seconds between summary lines.
    #[arg(long, default_value = "10")]
    summary_interval: u64,

    /// Max inbound frame size in bytes.
    #[arg(long, default_value = "1048576")]
    max_frame_size: usize,

    /// Also append the JSONL stream to a timestamped file in this directory.
    #[arg(long)]
    output_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let start = Instant::now();

    let mut feed = FeedConfig::new()
        .reconnect_delay(Duration::from_secs(cli.reconnect_delay))
        .connect_timeout(Duration::from_secs(cli.connect_timeout))
        .max_frame_size(cli.max_frame_size);
    if let Some(addr) = cli.addr {
        feed = feed.addr(addr);
    }

    if let Some(dir) = &cli.output_dir {
        let path = output::resolve_output_path(dir, &feed.addr)?;
        output::init_jsonl_writer(&path)?;
        eprintln!("JSONL: {}", path.display());
    }

    eprintln!("dash-watch v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("Feed: {}", feed.addr);
    eprintln!();

    watch::run(
        watch::WatchConfig {
            feed,
            bundles: normalize_bundles(cli.bundle),
            summary_interval: Duration::from_secs(cli.summary_interval.max(1)),
        },
        start,
    )
    .await
}

/// Main first, then the requested bundles in order, without duplicates.
fn normalize_bundles(requested: Vec<TopicBundle>) -> Vec<TopicBundle> {
    let mut bundles = vec![TopicBundle::Main];
    for bundle in requested {
        if !bundles.contains(&bundle) {
            bundles.push(bundle);
        }
    }
    bundles
}
