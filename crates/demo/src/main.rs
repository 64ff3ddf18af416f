// File: crates/demo/src/main.rs
// Summary: Headless dashboard run. Loads one symbol through the dashboard actor (or a
// CSV file straight into a session) and writes panels, forecast band and gauge as PNGs.

mod cli;
mod csv_loader;
mod logger;

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use sextant_core::{IndicatorSet, LayoutHost, MarketSnapshot, PanelDescriptor, PanelKind, SessionManager};
use sextant_feed::{
    Dashboard, DashboardSettings, ForecastPayload, HttpTransport, MarketPayload, MemoryTransport, SextantConfig,
    Status, StatsPoller, Transport,
};

use crate::cli::{Args, Command, Source};

fn main() {
    let command = match cli::parse_args(std::env::args().skip(1)) {
        Ok(command) => command,
        Err(err) => {
            eprintln!("{}", err.message);
            std::process::exit(err.code);
        }
    };
    match command {
        Command::Help => print!("{}", cli::help_text("sextant-demo")),
        Command::Version => println!("{}", cli::version_text()),
        Command::Run(args) => {
            if let Err(e) = run(args) {
                eprintln!("error: {e:#}");
                std::process::exit(1);
            }
        }
    }
}

fn run(args: Args) -> Result<()> {
    let config = SextantConfig::resolve(args.config.as_deref()).context("loading configuration")?;
    let _guard = logger::init(&config.logging);
    std::fs::create_dir_all(&args.out).with_context(|| format!("creating {}", args.out.display()))?;

    match &args.source {
        Source::Csv(path) => render_csv(&config, &args, path),
        Source::Offline(path) => {
            let market: MarketPayload = read_json(path)?;
            let mut transport = MemoryTransport::new().with_market(market);
            let forecast = match &args.forecast {
                Some(path) => {
                    let payload: ForecastPayload = read_json(path)?;
                    transport = transport.with_forecast(&args.symbol, payload);
                    true
                }
                None => false,
            };
            block_on(render_dashboard(Arc::new(transport), &config, &args, forecast, None))
        }
        Source::Remote => {
            let transport = Arc::new(HttpTransport::new(&config.api.base_url, config.api.timeout())?);
            tracing::info!(base_url = transport.base_url(), "using analytics service");
            block_on(async {
                let poller = config.poller.enabled.then(|| StatsPoller::spawn(transport.clone(), config.poller.settings()));
                render_dashboard(transport, &config, &args, true, poller).await
            })
        }
    }
}

fn block_on<F: std::future::Future<Output = Result<()>>>(fut: F) -> Result<()> {
    tokio::runtime::Builder::new_current_thread().enable_all().build().context("starting runtime")?.block_on(fut)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_slice(&bytes).with_context(|| format!("parsing {}", path.display()))
}

fn write(out: &Path, name: &str, png: &[u8]) -> Result<PathBuf> {
    let path = out.join(name);
    std::fs::write(&path, png).with_context(|| format!("writing {}", path.display()))?;
    println!("Wrote {}", path.display());
    Ok(path)
}

async fn render_dashboard<T: Transport>(
    transport: Arc<T>,
    config: &SextantConfig,
    args: &Args,
    expect_forecast: bool,
    poller: Option<StatsPoller>,
) -> Result<()> {
    let host = LayoutHost::new(config.panels.initial_layout(&config.panels.descriptors()));
    let (dash, handle) = Dashboard::new(transport, host.subscribe(), DashboardSettings::from_config(config))?;
    let wait_forecast = config.api.timeout();

    let driver = async move {
        handle.load(&args.symbol, args.period)?;
        match handle.wait_settled().await? {
            Status::Ready { session, panels, rejected, .. } => {
                tracing::info!(%session, panels, rejected, "session live");
                if rejected > 0 {
                    println!("{rejected} malformed candles dropped");
                }
            }
            Status::Failed { message, retryable } => {
                handle.shutdown()?;
                bail!("{message}{}", if retryable { " (try again later)" } else { "" });
            }
            other => bail!("unexpected dashboard state {other:?}"),
        }

        for (kind, png) in handle.export_png().await? {
            write(&args.out, &format!("{}_{}.png", args.symbol, kind.label()), &png)?;
        }

        if expect_forecast {
            let mut rx = handle.subscribe_forecast();
            match tokio::time::timeout(wait_forecast, rx.wait_for(Option::is_some)).await {
                Ok(Ok(view)) => {
                    if let Some(view) = &*view {
                        write(&args.out, &format!("{}_forecast.png", args.symbol), &view.png)?;
                        write(&args.out, &format!("{}_gauge.png", args.symbol), &view.gauge_png)?;
                        println!(
                            "{}: {} ({:.0}/100), trend {}",
                            view.symbol,
                            view.gauge.label(),
                            view.gauge.score,
                            view.summary.trend
                        );
                        if let Some(target) = &view.layout.target_label {
                            println!("{target}");
                        }
                    }
                }
                _ => tracing::warn!(symbol = %args.symbol, "no forecast available"),
            }
        }

        if let Some(stats) = poller.as_ref().and_then(StatsPoller::latest) {
            println!(
                "Model accuracy {:.1}% over {} predictions (avg error {:.2})",
                stats.accuracy, stats.total_predictions, stats.avg_error
            );
        }

        handle.shutdown()?;
        anyhow::Ok(())
    };

    let ((), result) = tokio::join!(dash.run(), driver);
    result
}

/// CSV input carries no indicators, so only the price and volume panels are built.
fn render_csv(config: &SextantConfig, args: &Args, path: &Path) -> Result<()> {
    let candles = csv_loader::load_ohlc_csv(path)?;
    if candles.is_empty() {
        bail!("no candles in {}; check headers and delimiter", path.display());
    }
    let snapshot = MarketSnapshot::normalize(&args.symbol, args.period, &candles, IndicatorSet::new())?;
    tracing::info!(points = snapshot.ohlc.len(), rejected = snapshot.ohlc.rejected, "csv loaded");

    let descriptors: Vec<PanelDescriptor> = config
        .panels
        .descriptors()
        .into_iter()
        .filter(|d| matches!(d.kind, PanelKind::Price | PanelKind::Volume))
        .collect();
    let layout = config.panels.initial_layout(&descriptors);
    let mut manager = SessionManager::new(descriptors, config.panels.build_options(), Duration::ZERO);
    manager.begin(snapshot, BTreeSet::new());
    let id = manager.build(&layout)?;
    let session = manager.live_session_mut(id).context("session disposed during build")?;
    for (kind, png) in session.export_png()? {
        write(&args.out, &format!("{}_{}.png", args.symbol, kind.label()), &png)?;
    }
    manager.dispose();
    Ok(())
}
