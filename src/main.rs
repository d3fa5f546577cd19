use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tokio::sync::{mpsc, watch};
use tracing::{error, info};

use signalpulse::analytics::AnalyticsStore;
use signalpulse::api::{self, ActivityTracker, AppState};
use signalpulse::config::EngineConfig;
use signalpulse::engine::Engine;
use signalpulse::feed::{BinanceRest, FeedSupervisor, NoPushFeed};
use signalpulse::types::SymbolSpec;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Symbols to track (comma-separated)
    #[arg(
        short,
        long,
        env = "SIGNALPULSE_SYMBOLS",
        default_value = "BTCUSDT,THETAUSDT,SOLUSDT,ETHUSDT,BNBUSDT"
    )]
    symbols: String,

    /// Port to run the web server on
    #[arg(short, long, env = "SIGNALPULSE_PORT", default_value = "3000")]
    port: u16,

    /// REST poll interval in seconds while no live connection is up
    #[arg(long, env = "SIGNALPULSE_POLL_INTERVAL", default_value = "15")]
    poll_interval: u64,

    /// Pause polling while no WebSocket client is connected
    #[arg(long, default_value = "false")]
    pause_when_idle: bool,
}

fn parse_symbols(raw: &str) -> Vec<SymbolSpec> {
    let known = SymbolSpec::default_set();
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|symbol| {
            known
                .iter()
                .find(|spec| spec.symbol == symbol)
                .cloned()
                .unwrap_or_else(|| SymbolSpec::infer(symbol))
        })
        .collect()
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("signalpulse=info".parse()?),
        )
        .init();

    let args = Args::parse();
    let symbols = parse_symbols(&args.symbols);
    info!(
        symbols = %args.symbols,
        port = args.port,
        "starting signalpulse"
    );

    let mut cfg = EngineConfig::default();
    cfg.feed.refresh_poll = Duration::from_secs(args.poll_interval.max(1));
    let cfg = Arc::new(cfg);
    let store = Arc::new(AnalyticsStore::new(symbols.clone(), cfg.feed.candle_limit));
    let engine = Arc::new(Engine::new(store.clone(), cfg.clone()));

    let (feed_tx, feed_rx) = mpsc::channel(1024);
    // The gate starts open unless the idle pause is on, in which case
    // the first WebSocket client opens it.
    let (activity_tx, activity_rx) = watch::channel(!args.pause_when_idle);

    let rest = BinanceRest::new(&cfg.feed)?;
    let supervisor = FeedSupervisor::<NoPushFeed>::new(
        rest,
        None,
        symbols,
        cfg.feed.clone(),
        feed_tx,
        activity_rx,
    );
    tokio::spawn(async move {
        if let Err(e) = supervisor.run().await {
            error!(error = %e, "feed supervisor stopped");
        }
    });

    let engine_task = engine.clone();
    tokio::spawn(async move {
        if let Err(e) = engine_task.run(feed_rx).await {
            error!(error = %e, "engine stopped");
        }
    });

    let state = Arc::new(AppState {
        store,
        signals: engine.signal_sender(),
        activity: ActivityTracker::new(activity_tx, args.pause_when_idle),
    });
    let app = api::router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    info!("listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
