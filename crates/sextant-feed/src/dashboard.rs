// File: crates/sextant-feed/src/dashboard.rs
// Summary: Dashboard actor. Owns the session manager, the forecast renderer and all
// in-flight loads; the UI talks to it through a cloneable handle.
// Notes:
// - Runs on one thread. Panels are not Send, so the actor future is awaited in place
//   (block_on / join!), never spawned.
// - A Load disposes the current session immediately; results of older loads are
//   dropped by the fetch coordinator when they arrive.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::stream::FuturesUnordered;
use futures::{FutureExt, StreamExt};
use sextant_core::forecast::{ForecastLayout, ForecastStyle};
use sextant_core::gauge::GaugeGeometry;
use sextant_core::{
    BuildError, BuildOptions, ForecastRenderer, ForecastSeries, GaugeRenderer, LayoutSnapshot, OverlayKind,
    PanelDescriptor, PanelKind, Period, RenderError, ResizeCoordinator, SessionId, SessionManager, SessionReport,
    SessionState, Size,
};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};

use crate::config::SextantConfig;
use crate::coordinator::{FetchCoordinator, LoadOutcome, Loaded};
use crate::payload::{ForecastPayload, ForecastSummary, MarketPayload, TradeSignal};
use crate::transport::Transport;

/// What the UI shows while the dashboard works.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Status {
    #[default]
    Idle,
    Loading { symbol: String, period: Period },
    Ready { symbol: String, period: Period, session: SessionId, panels: usize, rejected: usize },
    Failed { message: String, retryable: bool },
}

/// Latest rendered forecast for the loaded symbol.
#[derive(Clone, Debug, PartialEq)]
pub struct ForecastView {
    pub symbol: String,
    pub series: ForecastSeries,
    pub summary: ForecastSummary,
    pub signal: Option<TradeSignal>,
    pub layout: ForecastLayout,
    pub gauge: GaugeGeometry,
    pub png: Vec<u8>,
    pub gauge_png: Vec<u8>,
}

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("dashboard has shut down")]
    Closed,
    #[error("no live session")]
    NoSession,
    #[error(transparent)]
    Render(#[from] RenderError),
}

pub type PanelImages = Vec<(PanelKind, Vec<u8>)>;

#[derive(Debug)]
pub enum Command {
    Load { symbol: String, period: Period },
    SetOverlay { kind: OverlayKind, enabled: bool },
    Teardown,
    Inspect(oneshot::Sender<Option<SessionReport>>),
    ExportPng(oneshot::Sender<Result<PanelImages, DashboardError>>),
    Shutdown,
}

/// Everything the actor needs besides a transport and a layout source.
#[derive(Clone, Debug)]
pub struct DashboardSettings {
    pub descriptors: Vec<PanelDescriptor>,
    pub build_options: BuildOptions,
    pub settle_delay: Duration,
    pub forecast_style: ForecastStyle,
    pub gauge_size: Size,
}

impl DashboardSettings {
    pub fn from_config(config: &SextantConfig) -> Self {
        Self {
            descriptors: config.panels.descriptors(),
            build_options: config.panels.build_options(),
            settle_delay: config.panels.settle_delay(),
            forecast_style: config.forecast.style(&config.panels.theme),
            gauge_size: config.forecast.gauge_size(),
        }
    }

    /// Turn text rendering off everywhere (tests, golden images).
    pub fn without_labels(mut self) -> Self {
        self.build_options.draw_labels = false;
        self.forecast_style.draw_labels = false;
        self
    }
}

#[derive(Clone)]
pub struct DashboardHandle {
    tx: mpsc::UnboundedSender<Command>,
    status: watch::Receiver<Status>,
    forecast: watch::Receiver<Option<Arc<ForecastView>>>,
}

impl DashboardHandle {
    fn send(&self, cmd: Command) -> Result<(), DashboardError> {
        self.tx.send(cmd).map_err(|_| DashboardError::Closed)
    }

    pub fn load(&self, symbol: impl Into<String>, period: Period) -> Result<(), DashboardError> {
        self.send(Command::Load { symbol: symbol.into(), period })
    }

    pub fn set_overlay(&self, kind: OverlayKind, enabled: bool) -> Result<(), DashboardError> {
        self.send(Command::SetOverlay { kind, enabled })
    }

    pub fn teardown(&self) -> Result<(), DashboardError> {
        self.send(Command::Teardown)
    }

    pub fn shutdown(&self) -> Result<(), DashboardError> {
        self.send(Command::Shutdown)
    }

    pub async fn inspect(&self) -> Result<Option<SessionReport>, DashboardError> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Inspect(tx))?;
        rx.await.map_err(|_| DashboardError::Closed)
    }

    pub async fn export_png(&self) -> Result<PanelImages, DashboardError> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::ExportPng(tx))?;
        rx.await.map_err(|_| DashboardError::Closed)?
    }

    pub fn status(&self) -> Status {
        self.status.borrow().clone()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<Status> {
        self.status.clone()
    }

    /// Wait until the status satisfies `pred`.
    pub async fn wait_for(&self, mut pred: impl FnMut(&Status) -> bool) -> Result<Status, DashboardError> {
        let mut rx = self.status.clone();
        let status = rx.wait_for(|s| pred(s)).await.map_err(|_| DashboardError::Closed)?;
        Ok(status.clone())
    }

    /// Wait until a load settles, successfully or not.
    pub async fn wait_settled(&self) -> Result<Status, DashboardError> {
        self.wait_for(|s| matches!(s, Status::Ready { .. } | Status::Failed { .. })).await
    }

    pub fn forecast(&self) -> Option<Arc<ForecastView>> {
        self.forecast.borrow().clone()
    }

    pub fn subscribe_forecast(&self) -> watch::Receiver<Option<Arc<ForecastView>>> {
        self.forecast.clone()
    }
}

enum Fetched {
    Market(Loaded<MarketPayload>),
    Forecast(Loaded<ForecastPayload>),
}

pub struct Dashboard<T: Transport> {
    transport: Arc<T>,
    coordinator: FetchCoordinator,
    manager: SessionManager,
    layout: watch::Receiver<LayoutSnapshot>,
    resize: Option<ResizeCoordinator>,
    overlays: BTreeSet<OverlayKind>,
    forecast_renderer: ForecastRenderer,
    gauge_renderer: GaugeRenderer,
    inflight: FuturesUnordered<BoxFuture<'static, Fetched>>,
    commands: mpsc::UnboundedReceiver<Command>,
    status: watch::Sender<Status>,
    forecast: watch::Sender<Option<Arc<ForecastView>>>,
    rejected: usize,
}

impl<T: Transport> Dashboard<T> {
    pub fn new(
        transport: Arc<T>,
        layout: watch::Receiver<LayoutSnapshot>,
        settings: DashboardSettings,
    ) -> Result<(Self, DashboardHandle), RenderError> {
        let draw_labels = settings.forecast_style.draw_labels;
        let theme = settings.forecast_style.theme;
        let forecast_renderer = ForecastRenderer::new(settings.forecast_style)?;
        let gauge_renderer = GaugeRenderer::new(settings.gauge_size, theme, draw_labels)?;
        let overlays = settings.build_options.overlays.clone();
        let manager = SessionManager::new(settings.descriptors, settings.build_options, settings.settle_delay);

        let (tx, commands) = mpsc::unbounded_channel();
        let (status, status_rx) = watch::channel(Status::Idle);
        let (forecast, forecast_rx) = watch::channel(None);
        let dashboard = Self {
            transport,
            coordinator: FetchCoordinator::new(),
            manager,
            layout,
            resize: None,
            overlays,
            forecast_renderer,
            gauge_renderer,
            inflight: FuturesUnordered::new(),
            commands,
            status,
            forecast,
            rejected: 0,
        };
        Ok((dashboard, DashboardHandle { tx, status: status_rx, forecast: forecast_rx }))
    }

    /// Process commands, load results, settle timers and layout changes until
    /// shutdown or until every handle is dropped.
    pub async fn run(mut self) {
        tracing::debug!("dashboard running");
        loop {
            tokio::select! {
                cmd = self.commands.recv() => match cmd {
                    Some(Command::Shutdown) | None => break,
                    Some(cmd) => self.handle(cmd),
                },
                Some(fetched) = self.inflight.next(), if !self.inflight.is_empty() => self.on_fetched(fetched),
                _ = self.manager.settled(), if self.manager.has_pending_build() => self.on_settled(),
                layout = next_layout(&mut self.resize), if self.resize.is_some() => self.on_layout(layout),
            }
        }
        self.manager.dispose();
        tracing::debug!("dashboard stopped");
    }

    fn handle(&mut self, cmd: Command) {
        match cmd {
            Command::Load { symbol, period } => self.load(symbol, period),
            Command::SetOverlay { kind, enabled } => {
                if enabled {
                    self.overlays.insert(kind);
                } else {
                    self.overlays.remove(&kind);
                }
                if self.manager.set_overlay(kind, enabled) {
                    tracing::debug!(?kind, enabled, "overlay toggled");
                }
            }
            Command::Teardown => {
                self.coordinator.invalidate();
                self.release();
                self.forecast.send_replace(None);
                self.status.send_replace(Status::Idle);
            }
            Command::Inspect(reply) => {
                let live = self.manager.session().filter(|s| s.state() == SessionState::Live);
                let _ = reply.send(live.map(|s| s.report()));
            }
            Command::ExportPng(reply) => {
                let _ = reply.send(self.export_png());
            }
            Command::Shutdown => {}
        }
    }

    fn load(&mut self, symbol: String, period: Period) {
        tracing::info!(%symbol, %period, "load requested");
        // the old session goes away now, not when the new data shows up
        self.release();
        self.forecast.send_replace(None);
        let ticket = self.coordinator.begin(symbol.clone(), period);
        let market = self.transport.market(&symbol, period);
        let forecast = self.transport.forecast(&symbol);
        self.inflight.push(self.coordinator.load(ticket.clone(), market).map(Fetched::Market).boxed());
        self.inflight.push(self.coordinator.load(ticket, forecast).map(Fetched::Forecast).boxed());
        self.status.send_replace(Status::Loading { symbol, period });
    }

    fn release(&mut self) {
        self.resize = None;
        self.manager.dispose();
    }

    fn on_fetched(&mut self, fetched: Fetched) {
        match fetched {
            Fetched::Market(loaded) => match self.coordinator.resolve(loaded) {
                LoadOutcome::Stale { .. } => {}
                LoadOutcome::Failed { ticket, error } => {
                    tracing::error!(symbol = %ticket.symbol, error = %error, "market data request failed");
                    self.status.send_replace(Status::Failed {
                        message: format!("could not load {}: {error}", ticket.symbol),
                        retryable: error.is_retryable(),
                    });
                }
                LoadOutcome::Fresh { ticket, value } => match value.into_snapshot(ticket.period) {
                    Ok(snapshot) => {
                        self.rejected = snapshot.ohlc.rejected;
                        self.manager.begin(snapshot, self.overlays.clone());
                    }
                    Err(e) => {
                        tracing::error!(symbol = %ticket.symbol, error = %e, "market data unusable");
                        self.status.send_replace(Status::Failed { message: format!("{}: {e}", ticket.symbol), retryable: false });
                    }
                },
            },
            Fetched::Forecast(loaded) => match self.coordinator.resolve(loaded) {
                LoadOutcome::Stale { .. } => {}
                LoadOutcome::Failed { ticket, error } => {
                    tracing::warn!(symbol = %ticket.symbol, error = %error, "forecast unavailable");
                }
                LoadOutcome::Fresh { ticket, value } => match self.render_forecast(&ticket.symbol, value) {
                    Ok(view) => {
                        self.forecast.send_replace(Some(Arc::new(view)));
                    }
                    Err(e) => tracing::warn!(symbol = %ticket.symbol, error = %e, "forecast render failed"),
                },
            },
        }
    }

    fn render_forecast(&mut self, symbol: &str, payload: ForecastPayload) -> Result<ForecastView, RenderError> {
        let series = payload.series();
        let layout = self.forecast_renderer.draw(&series);
        let png = self.forecast_renderer.render_to_png_bytes()?;
        let gauge = self.gauge_renderer.draw(payload.gauge_score());
        let gauge_png = self.gauge_renderer.render_to_png_bytes()?;
        Ok(ForecastView {
            symbol: symbol.to_string(),
            series,
            summary: payload.summary,
            signal: payload.signal,
            layout,
            gauge,
            png,
            gauge_png,
        })
    }

    fn on_settled(&mut self) {
        let layout = self.layout.borrow().clone();
        match self.manager.build(&layout) {
            Ok(id) => {
                self.resize = Some(ResizeCoordinator::from_receiver(self.layout.clone(), id));
                let Some(session) = self.manager.session() else { return };
                self.status.send_replace(Status::Ready {
                    symbol: session.symbol().to_string(),
                    period: session.period(),
                    session: id,
                    panels: session.panels().len(),
                    rejected: self.rejected,
                });
            }
            Err(BuildError::NoPendingSession) => {}
            Err(e) => {
                tracing::error!(error = %e, "session build failed");
                self.status.send_replace(Status::Failed { message: e.to_string(), retryable: false });
            }
        }
    }

    fn on_layout(&mut self, layout: Option<LayoutSnapshot>) {
        let Some(resize) = &self.resize else { return };
        match layout {
            Some(layout) => {
                resize.reflow(&mut self.manager, &layout);
            }
            None => {
                tracing::debug!("layout source closed; resize tracking stopped");
                self.resize = None;
            }
        }
    }

    fn export_png(&mut self) -> Result<PanelImages, DashboardError> {
        let id = self.manager.session().map(|s| s.id()).ok_or(DashboardError::NoSession)?;
        let session = self.manager.live_session_mut(id).ok_or(DashboardError::NoSession)?;
        Ok(session.export_png()?)
    }
}

async fn next_layout(resize: &mut Option<ResizeCoordinator>) -> Option<LayoutSnapshot> {
    match resize {
        Some(r) => r.changed().await,
        None => std::future::pending().await,
    }
}
