// File: crates/sextant-core/src/session.rs
// Summary: Session lifecycle: the set of live panels for one symbol and period, and the
// manager that drives it through Empty -> Building -> Live -> Disposing -> Empty.
// Notes:
// - Only the manager constructs or disposes panels. A session's surfaces are released
//   exactly once, in dispose().
// - Async paths look sessions up by id through live_session_mut(), which returns None
//   once the session is gone. Direct mutation of a disposed session panics.

use std::collections::BTreeSet;
use std::time::Duration;

use crate::deferred::Deferred;
use crate::geometry::Size;
use crate::layout::LayoutSnapshot;
use crate::overlay::{self, OverlayKind};
use crate::panel::{BuildError, BuildOptions, PanelDescriptor, PanelFactory, PanelInstance, PanelKind};
use crate::raster::RenderError;
use crate::scale::TimeWindow;
use crate::series::MarketSnapshot;
use crate::types::Period;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u64);

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "session#{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Building,
    Live,
    Disposing,
    Disposed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ManagerState {
    Empty,
    Building,
    Live,
    Disposing,
}

/// Point-in-time description of a session, cheap to send across a channel.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionReport {
    pub id: SessionId,
    pub symbol: String,
    pub period: Period,
    pub state: SessionState,
    pub overlays: Vec<OverlayKind>,
    pub panels: Vec<PanelReport>,
    pub window: TimeWindow,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PanelReport {
    pub kind: PanelKind,
    pub size: Size,
    pub overlays: Vec<OverlayKind>,
    pub renders: u64,
}

/// Panels for the displayed instrument and period. Sole owner of its panels.
pub struct Session {
    id: SessionId,
    symbol: String,
    period: Period,
    overlay_flags: BTreeSet<OverlayKind>,
    panels: Vec<PanelInstance>,
    state: SessionState,
    disposed: bool,
    snapshot: MarketSnapshot,
    settle: Option<Deferred>,
    window: TimeWindow,
}

impl Session {
    fn new(id: SessionId, snapshot: MarketSnapshot, overlay_flags: BTreeSet<OverlayKind>, settle: Option<Deferred>) -> Self {
        let window = TimeWindow::covering(&snapshot.ohlc.times());
        Self {
            id,
            symbol: snapshot.symbol.clone(),
            period: snapshot.period,
            overlay_flags,
            panels: Vec::new(),
            state: SessionState::Building,
            disposed: false,
            snapshot,
            settle,
            window,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn period(&self) -> Period {
        self.period
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn overlay_flags(&self) -> &BTreeSet<OverlayKind> {
        &self.overlay_flags
    }

    pub fn snapshot(&self) -> &MarketSnapshot {
        &self.snapshot
    }

    pub fn window(&self) -> TimeWindow {
        self.window
    }

    pub fn panels(&self) -> &[PanelInstance] {
        &self.panels
    }

    pub fn panel(&self, kind: PanelKind) -> Option<&PanelInstance> {
        self.panels.iter().find(|p| p.kind() == kind)
    }

    pub(crate) fn panels_mut(&mut self) -> &mut [PanelInstance] {
        &mut self.panels
    }

    fn assert_usable(&self, what: &str) {
        assert!(!self.disposed, "{what} on disposed {}", self.id);
    }

    /// Toggle an overlay. On a live session the price panel is updated in place.
    /// Returns whether the flag set changed.
    ///
    /// # Panics
    /// If the session has been disposed.
    pub fn set_overlay(&mut self, kind: OverlayKind, enabled: bool) -> bool {
        self.assert_usable("set_overlay");
        let changed = if enabled { self.overlay_flags.insert(kind) } else { self.overlay_flags.remove(&kind) };
        if changed && self.state == SessionState::Live {
            let Self { panels, overlay_flags, snapshot, .. } = self;
            if let Some(price) = panels.iter_mut().find(|p| p.kind() == PanelKind::Price) {
                overlay::sync_overlays(price, overlay_flags, snapshot);
            }
        }
        changed
    }

    /// Apply one visible time range to every panel so their time axes stay aligned.
    ///
    /// # Panics
    /// If the session has been disposed.
    pub fn sync_time_window(&mut self, window: TimeWindow) {
        self.assert_usable("sync_time_window");
        self.window = window;
        for panel in &mut self.panels {
            panel.set_window(window);
        }
    }

    /// PNG bytes of every panel, in build order.
    pub fn export_png(&mut self) -> Result<Vec<(PanelKind, Vec<u8>)>, RenderError> {
        self.panels.iter_mut().map(|p| Ok((p.kind(), p.to_png_bytes()?))).collect()
    }

    pub fn report(&self) -> SessionReport {
        SessionReport {
            id: self.id,
            symbol: self.symbol.clone(),
            period: self.period,
            state: self.state,
            overlays: self.overlay_flags.iter().copied().collect(),
            panels: self
                .panels
                .iter()
                .map(|p| PanelReport { kind: p.kind(), size: p.size(), overlays: p.overlay_kinds(), renders: p.render_count() })
                .collect(),
            window: self.window,
        }
    }

    /// Release every panel exactly once. Returns false when already disposed.
    pub(crate) fn dispose(&mut self, factory: &mut PanelFactory) -> bool {
        if self.disposed {
            return false;
        }
        self.state = SessionState::Disposing;
        if let Some(settle) = self.settle.take() {
            settle.cancel();
        }
        for panel in self.panels.drain(..) {
            factory.dispose(panel);
        }
        self.disposed = true;
        self.state = SessionState::Disposed;
        tracing::debug!(session = %self.id, symbol = %self.symbol, "session disposed");
        true
    }
}

/// Owns the current session and the panel factory.
pub struct SessionManager {
    descriptors: Vec<PanelDescriptor>,
    options: BuildOptions,
    settle_delay: Duration,
    factory: PanelFactory,
    current: Option<Session>,
    state: ManagerState,
    next_id: u64,
}

impl SessionManager {
    /// `settle_delay` of zero builds as soon as `build` is called, without a timer.
    pub fn new(descriptors: Vec<PanelDescriptor>, options: BuildOptions, settle_delay: Duration) -> Self {
        Self {
            descriptors,
            options,
            settle_delay,
            factory: PanelFactory::new(),
            current: None,
            state: ManagerState::Empty,
            next_id: 1,
        }
    }

    pub fn state(&self) -> ManagerState {
        self.state
    }

    pub fn descriptors(&self) -> &[PanelDescriptor] {
        &self.descriptors
    }

    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    /// Panels currently holding a surface, across every session.
    pub fn live_panel_count(&self) -> usize {
        self.factory.live_count()
    }

    pub fn session(&self) -> Option<&Session> {
        self.current.as_ref()
    }

    /// The session with `id`, only while it is Live.
    pub fn live_session_mut(&mut self, id: SessionId) -> Option<&mut Session> {
        self.current.as_mut().filter(|s| s.id == id && s.state == SessionState::Live)
    }

    /// New data arrived: dispose the current session synchronously, then start a new
    /// one in Building. The settle timer (if any) restarts from now.
    pub fn begin(&mut self, snapshot: MarketSnapshot, overlays: BTreeSet<OverlayKind>) -> SessionId {
        self.dispose();
        let id = SessionId(self.next_id);
        self.next_id += 1;
        let settle = (!self.settle_delay.is_zero()).then(|| Deferred::after("settle", self.settle_delay));
        tracing::debug!(session = %id, symbol = %snapshot.symbol, period = %snapshot.period, "session building");
        self.current = Some(Session::new(id, snapshot, overlays, settle));
        self.state = ManagerState::Building;
        id
    }

    pub fn has_pending_build(&self) -> bool {
        self.state == ManagerState::Building
    }

    /// Resolves when the pending session's settle delay has elapsed. Pending forever
    /// when there is nothing to build; guard `select!` branches with `has_pending_build`.
    pub async fn settled(&mut self) {
        match self.current.as_mut() {
            Some(Session { state: SessionState::Building, settle: Some(settle), .. }) => settle.wait().await,
            Some(Session { state: SessionState::Building, settle: None, .. }) => {}
            _ => std::future::pending().await,
        }
    }

    /// Construct every panel of the pending session. One failure disposes the panels
    /// already built and leaves the manager Empty.
    pub fn build(&mut self, layout: &LayoutSnapshot) -> Result<SessionId, BuildError> {
        let Some(session) = self.current.as_mut().filter(|s| s.state == SessionState::Building) else {
            return Err(BuildError::NoPendingSession);
        };
        assert!(!session.disposed, "build on disposed {}", session.id);
        session.settle = None;

        let options = BuildOptions { overlays: session.overlay_flags.clone(), ..self.options.clone() };
        let mut built = Vec::with_capacity(self.descriptors.len());
        let mut failure = None;
        for descriptor in &self.descriptors {
            match self.factory.build(*descriptor, &session.snapshot, session.window, &options, layout) {
                Ok(panel) => built.push(panel),
                Err(e) => {
                    failure = Some((descriptor.kind, e));
                    break;
                }
            }
        }
        session.panels = built;

        if let Some((kind, e)) = failure {
            tracing::warn!(session = %session.id, ?kind, error = %e, "panel construction failed; aborting session");
            session.dispose(&mut self.factory);
            self.current = None;
            self.state = ManagerState::Empty;
            return Err(e);
        }

        session.state = SessionState::Live;
        self.state = ManagerState::Live;
        tracing::info!(session = %session.id, symbol = %session.symbol, panels = session.panels.len(), "session live");
        Ok(session.id)
    }

    /// Tear down the current session. Returns false if there was nothing to dispose.
    pub fn dispose(&mut self) -> bool {
        let Some(mut session) = self.current.take() else {
            return false;
        };
        self.state = ManagerState::Disposing;
        let released = session.dispose(&mut self.factory);
        self.state = ManagerState::Empty;
        released
    }

    /// Toggle an overlay on the current session, Building or Live. No-op when Empty.
    pub fn set_overlay(&mut self, kind: OverlayKind, enabled: bool) -> bool {
        match self.current.as_mut() {
            Some(session) => session.set_overlay(kind, enabled),
            None => false,
        }
    }
}

impl Drop for SessionManager {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::ContainerId;
    use crate::series::{OhlcPoint, OhlcSeries};

    fn snapshot() -> MarketSnapshot {
        let points = (0..5)
            .map(|i| OhlcPoint { time: i * 86_400, open: 10.0, high: 11.0, low: 9.0, close: 10.5, volume: 10 })
            .collect();
        MarketSnapshot {
            symbol: "AAA".into(),
            period: Period::OneMonth,
            ohlc: OhlcSeries { points, rejected: 0 },
            indicators: Default::default(),
        }
    }

    fn manager() -> (SessionManager, LayoutSnapshot) {
        let descriptors = vec![
            PanelDescriptor::new(PanelKind::Price, ContainerId(1), 200),
            PanelDescriptor::new(PanelKind::Volume, ContainerId(2), 80),
        ];
        let layout = LayoutSnapshot::new().with(ContainerId(1), Size::new(320, 200)).with(ContainerId(2), Size::new(320, 80));
        let options = BuildOptions { draw_labels: false, ..BuildOptions::default() };
        (SessionManager::new(descriptors, options, Duration::ZERO), layout)
    }

    #[test]
    fn session_dispose_is_idempotent() {
        let (mut m, layout) = manager();
        m.begin(snapshot(), BTreeSet::new());
        m.build(&layout).unwrap();
        let mut session = m.current.take().unwrap();
        assert!(session.dispose(&mut m.factory));
        assert!(!session.dispose(&mut m.factory));
        assert!(session.is_disposed());
        assert_eq!(m.factory.live_count(), 0);
    }

    #[test]
    #[should_panic(expected = "disposed")]
    fn overlay_on_disposed_session_panics() {
        let (mut m, layout) = manager();
        m.begin(snapshot(), BTreeSet::new());
        m.build(&layout).unwrap();
        let mut session = m.current.take().unwrap();
        session.dispose(&mut m.factory);
        session.set_overlay(OverlayKind::Sma, true);
    }

    #[test]
    fn build_without_pending_session_is_an_error() {
        let (mut m, layout) = manager();
        assert!(matches!(m.build(&layout), Err(BuildError::NoPendingSession)));
        assert_eq!(m.state(), ManagerState::Empty);
    }
}
