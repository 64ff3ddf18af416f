// File: crates/sextant-core/src/panel.rs
// Summary: Panel descriptors, the panel factory and live panel instances.
// Notes:
// - A PanelInstance owns its raster surface exclusively. Disposal consumes the
//   instance, so a surface can only ever be released once.
// - The factory tracks the set of container ids that currently have a live
//   instance; building a second instance for the same container is a logic bug
//   and panics.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use skia_safe as skia;
use thiserror::Error;

use crate::draw;
use crate::geometry::{RectI32, Size};
use crate::layout::{ContainerId, LayoutSnapshot};
use crate::overlay::{self, OverlayKind, OverlayLines};
use crate::raster::{self, RenderError};
use crate::scale::{TimeScale, TimeWindow, ValueScale};
use crate::series::{definite_runs, names, to_indicator_series, DefinitePoint, MarketSnapshot, OhlcPoint};
use crate::text::{Anchor, TextShaper};
use crate::theme::Theme;
use crate::types::Insets;

/// What a panel shows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PanelKind {
    Price,
    OscillatorRsi,
    OscillatorMacd,
    Volume,
}

impl PanelKind {
    pub const fn label(&self) -> &'static str {
        match self {
            PanelKind::Price => "price",
            PanelKind::OscillatorRsi => "rsi",
            PanelKind::OscillatorMacd => "macd",
            PanelKind::Volume => "volume",
        }
    }
}

/// Binds a panel kind to a drawing region. Immutable once its panel is built.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PanelDescriptor {
    pub kind: PanelKind,
    pub container: ContainerId,
    pub height_hint: u32,
}

impl PanelDescriptor {
    pub const fn new(kind: PanelKind, container: ContainerId, height_hint: u32) -> Self {
        Self { kind, container, height_hint }
    }
}

/// Construction options shared by every panel of a session.
#[derive(Clone, Debug)]
pub struct BuildOptions {
    pub theme: Theme,
    /// Overlays drawn on the price panel right after construction.
    pub overlays: BTreeSet<OverlayKind>,
    /// Oscillator guides: RSI 30/70 and the MACD zero line.
    pub reference_lines: bool,
    pub draw_labels: bool,
    pub insets: Insets,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            theme: Theme::dark(),
            overlays: BTreeSet::new(),
            reference_lines: true,
            draw_labels: true,
            insets: Insets::panel(),
        }
    }
}

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("{0} is not part of the current layout")]
    UnknownContainer(ContainerId),
    #[error("{0} has zero width")]
    ZeroWidth(ContainerId),
    #[error("indicator `{indicator}` missing for {kind:?} panel")]
    MissingIndicator { kind: PanelKind, indicator: &'static str },
    #[error("no session is waiting to be built")]
    NoPendingSession,
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Primary series of a panel, extracted from the snapshot at build time.
#[derive(Clone, Debug)]
pub enum PanelContent {
    Price { candles: Vec<OhlcPoint> },
    Rsi { runs: Vec<Vec<DefinitePoint>> },
    Macd { macd: Vec<Vec<DefinitePoint>>, signal: Vec<Vec<DefinitePoint>>, histogram: Vec<DefinitePoint> },
    Volume { bars: Vec<(i64, f64, bool)> },
}

impl PanelContent {
    fn extract(kind: PanelKind, snapshot: &MarketSnapshot) -> Result<Self, BuildError> {
        let need = |indicator: &'static str| {
            snapshot.indicator(indicator).ok_or(BuildError::MissingIndicator { kind, indicator })
        };
        Ok(match kind {
            PanelKind::Price => PanelContent::Price { candles: snapshot.ohlc.points.clone() },
            PanelKind::OscillatorRsi => PanelContent::Rsi { runs: definite_runs(need(names::RSI)?) },
            PanelKind::OscillatorMacd => PanelContent::Macd {
                macd: definite_runs(need(names::MACD)?),
                signal: definite_runs(need(names::MACD_SIGNAL)?),
                histogram: to_indicator_series(need(names::MACD_HIST)?),
            },
            PanelKind::Volume => PanelContent::Volume {
                bars: snapshot.ohlc.points.iter().map(|p| (p.time, p.volume as f64, p.is_up())).collect(),
            },
        })
    }

    /// Value range of the primary series inside `window`.
    fn value_range(&self, window: &TimeWindow) -> Option<(f64, f64)> {
        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;
        let mut take = |v: f64| { lo = lo.min(v); hi = hi.max(v); };
        match self {
            PanelContent::Price { candles } => {
                for c in candles.iter().filter(|c| window.contains(c.time)) { take(c.low); take(c.high); }
            }
            PanelContent::Rsi { .. } => { take(0.0); take(100.0); }
            PanelContent::Macd { macd, signal, histogram } => {
                take(0.0);
                for p in macd.iter().chain(signal.iter()).flatten().chain(histogram.iter()) {
                    if window.contains(p.time) { take(p.value); }
                }
            }
            PanelContent::Volume { bars } => {
                take(0.0);
                for &(t, v, _) in bars { if window.contains(t) { take(v); } }
            }
        }
        (lo.is_finite() && hi.is_finite()).then_some((lo, hi))
    }
}

/// A live chart panel: one raster surface plus its series and overlays.
pub struct PanelInstance {
    descriptor: PanelDescriptor,
    surface: skia::Surface,
    size: Size,
    content: PanelContent,
    overlays: BTreeMap<OverlayKind, OverlayLines>,
    window: TimeWindow,
    options: BuildOptions,
    text: Option<Rc<TextShaper>>,
    renders: u64,
}

impl PanelInstance {
    pub fn descriptor(&self) -> &PanelDescriptor {
        &self.descriptor
    }

    pub fn kind(&self) -> PanelKind {
        self.descriptor.kind
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn window(&self) -> TimeWindow {
        self.window
    }

    pub fn content(&self) -> &PanelContent {
        &self.content
    }

    /// Number of full redraws performed on this panel's surface.
    pub fn render_count(&self) -> u64 {
        self.renders
    }

    pub fn overlay_kinds(&self) -> Vec<OverlayKind> {
        self.overlays.keys().copied().collect()
    }

    pub fn overlay(&self, kind: OverlayKind) -> Option<&OverlayLines> {
        self.overlays.get(&kind)
    }

    pub(crate) fn overlays_mut(&mut self) -> &mut BTreeMap<OverlayKind, OverlayLines> {
        &mut self.overlays
    }

    /// Re-size the native surface and redraw. No-op when the size is unchanged.
    pub fn resize(&mut self, size: Size) -> Result<bool, RenderError> {
        if size == self.size {
            return Ok(false);
        }
        self.surface = raster::allocate(size)?;
        self.size = size;
        self.render();
        Ok(true)
    }

    /// Move the shared time window and redraw.
    pub fn set_window(&mut self, window: TimeWindow) {
        if self.window != window {
            self.window = window;
            self.render();
        }
    }

    pub fn to_png_bytes(&mut self) -> Result<Vec<u8>, RenderError> {
        raster::to_png_bytes(&mut self.surface)
    }

    pub fn to_rgba8(&mut self) -> Result<(Vec<u8>, u32, u32, usize), RenderError> {
        raster::to_rgba8(&mut self.surface)
    }

    /// Full redraw of the panel: background, grid, primary series, overlays, guides, labels.
    pub fn render(&mut self) {
        self.renders += 1;
        let theme = self.options.theme;
        let plot = RectI32::plot_area(self.size, &self.options.insets);
        let ts = TimeScale::new(self.window, &plot);

        let mut range = self.content.value_range(&self.window).unwrap_or((0.0, 1.0));
        if self.descriptor.kind == PanelKind::Price {
            for lines in self.overlays.values() {
                if let Some((lo, hi)) = lines.value_range(&self.window) {
                    range = (range.0.min(lo), range.1.max(hi));
                }
            }
        }
        let margin = match self.content {
            PanelContent::Rsi { .. } => 0.0,
            PanelContent::Volume { .. } => 0.05,
            _ => 0.04,
        };
        let vs = ValueScale::with_margin(&plot, range, margin);

        let canvas = self.surface.canvas();
        canvas.clear(theme.background);
        draw::draw_grid(canvas, &plot, theme.grid, 5, 8);

        match &self.content {
            PanelContent::Price { candles } => {
                for (kind, lines) in &self.overlays {
                    overlay::draw_fill(canvas, &ts, &vs, *kind, lines, &theme);
                }
                draw::draw_candles(canvas, &ts, &vs, candles, theme.candle_up, theme.candle_down);
                for (kind, lines) in &self.overlays {
                    overlay::draw_lines(canvas, &ts, &vs, *kind, lines, &theme);
                }
            }
            PanelContent::Rsi { runs } => {
                if self.options.reference_lines {
                    draw::draw_reference(canvas, &plot, &vs, 30.0, theme.reference_line);
                    draw::draw_reference(canvas, &plot, &vs, 70.0, theme.reference_line);
                }
                let paint = draw::stroke(theme.rsi_line, 1.5);
                for run in runs { draw::draw_line(canvas, &ts, &vs, run, &paint); }
            }
            PanelContent::Macd { macd, signal, histogram } => {
                if self.options.reference_lines {
                    draw::draw_reference(canvas, &plot, &vs, 0.0, theme.reference_line);
                }
                let bars: Vec<(i64, f64)> = histogram.iter().map(|p| (p.time, p.value)).collect();
                draw::draw_bars(canvas, &ts, &vs, &bars, 0.0, |_, v| if v >= 0.0 { theme.volume_up } else { theme.volume_down });
                let macd_paint = draw::stroke(theme.macd_line, 1.5);
                for run in macd { draw::draw_line(canvas, &ts, &vs, run, &macd_paint); }
                let signal_paint = draw::stroke(theme.macd_signal, 1.5);
                for run in signal { draw::draw_line(canvas, &ts, &vs, run, &signal_paint); }
            }
            PanelContent::Volume { bars } => {
                let values: Vec<(i64, f64)> = bars.iter().map(|&(t, v, _)| (t, v)).collect();
                draw::draw_bars(canvas, &ts, &vs, &values, 0.0, |i, _| {
                    if bars[i].2 { theme.volume_up } else { theme.volume_down }
                });
            }
        }

        draw::draw_axis_frame(canvas, &plot, theme.axis_line);

        if let (true, Some(text)) = (self.options.draw_labels, self.text.as_ref()) {
            text.draw(canvas, self.descriptor.kind.label(), plot.left as f32 + 6.0, plot.top as f32 + 14.0, 12.0, theme.axis_label, Anchor::Left, false);
            for v in crate::grid::linspace(vs.vmin, vs.vmax, 5) {
                let y = vs.to_px(v);
                text.draw(canvas, &format_value(v), plot.right as f32 + 6.0, y + 4.0, 11.0, theme.axis_label, Anchor::Left, true);
            }
        }
    }
}

fn format_value(v: f64) -> String {
    let a = v.abs();
    if a >= 1e9 { format!("{:.2}B", v / 1e9) }
    else if a >= 1e6 { format!("{:.2}M", v / 1e6) }
    else if a >= 1e4 { format!("{:.1}K", v / 1e3) }
    else { format!("{v:.2}") }
}

/// Builds panel instances and tracks which descriptors currently own one.
#[derive(Default)]
pub struct PanelFactory {
    live: HashSet<ContainerId>,
    text: Option<Rc<TextShaper>>,
}

impl PanelFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `descriptor` currently has a live instance.
    pub fn is_live(&self, descriptor: &PanelDescriptor) -> bool {
        self.live.contains(&descriptor.container)
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Build a panel for `descriptor`, sized to its container, populated with its
    /// primary series (and overlays for the price panel), and drawn once.
    ///
    /// # Panics
    /// If `descriptor` already has a live instance that was not disposed.
    pub fn build(
        &mut self,
        descriptor: PanelDescriptor,
        snapshot: &MarketSnapshot,
        window: TimeWindow,
        options: &BuildOptions,
        layout: &LayoutSnapshot,
    ) -> Result<PanelInstance, BuildError> {
        assert!(
            !self.live.contains(&descriptor.container),
            "panel for {} built twice without dispose",
            descriptor.container
        );

        let region = layout.size_of(descriptor.container).ok_or(BuildError::UnknownContainer(descriptor.container))?;
        if region.width == 0 {
            return Err(BuildError::ZeroWidth(descriptor.container));
        }
        let size = Size::new(region.width, if region.height > 0 { region.height } else { descriptor.height_hint });

        let content = PanelContent::extract(descriptor.kind, snapshot)?;
        let surface = raster::allocate(size)?;
        let text = if options.draw_labels {
            Some(Rc::clone(self.text.get_or_insert_with(|| Rc::new(TextShaper::new()))))
        } else {
            None
        };

        let mut panel = PanelInstance {
            descriptor,
            surface,
            size,
            content,
            overlays: BTreeMap::new(),
            window,
            options: options.clone(),
            text,
            renders: 0,
        };
        if descriptor.kind == PanelKind::Price {
            overlay::sync_overlays(&mut panel, &options.overlays, snapshot);
        }
        panel.render();

        self.live.insert(descriptor.container);
        tracing::debug!(kind = ?descriptor.kind, container = %descriptor.container, width = size.width, height = size.height, "panel built");
        Ok(panel)
    }

    /// Release a panel's surface and free its descriptor for a future build.
    pub fn dispose(&mut self, panel: PanelInstance) {
        let container = panel.descriptor.container;
        self.live.remove(&container);
        drop(panel);
        tracing::debug!(container = %container, "panel disposed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::{IndicatorPoint, IndicatorSet, OhlcSeries};
    use crate::types::Period;

    fn snapshot() -> MarketSnapshot {
        let points: Vec<OhlcPoint> = (0..10)
            .map(|i| OhlcPoint { time: i * 60, open: 10.0, high: 12.0, low: 9.0, close: 11.0, volume: 1000 })
            .collect();
        let mut indicators = IndicatorSet::new();
        indicators.insert(names::RSI.into(), (0..10).map(|i| IndicatorPoint::new(i * 60, (i > 2).then_some(55.0))).collect());
        MarketSnapshot { symbol: "T".into(), period: Period::OneMonth, ohlc: OhlcSeries { points, rejected: 0 }, indicators }
    }

    fn opts() -> BuildOptions {
        BuildOptions { draw_labels: false, ..BuildOptions::default() }
    }

    #[test]
    fn height_hint_used_when_container_reports_zero_height() {
        let snap = snapshot();
        let layout = LayoutSnapshot::new().with(ContainerId(1), Size::new(300, 0));
        let mut f = PanelFactory::new();
        let d = PanelDescriptor::new(PanelKind::Volume, ContainerId(1), 120);
        let p = f.build(d, &snap, TimeWindow::covering(&snap.ohlc.times()), &opts(), &layout).unwrap();
        assert_eq!(p.size(), Size::new(300, 120));
        assert_eq!(p.render_count(), 1);
        assert!(f.is_live(&d));
        f.dispose(p);
        assert!(!f.is_live(&d));
    }

    #[test]
    fn missing_indicator_is_a_build_error() {
        let snap = snapshot();
        let layout = LayoutSnapshot::new().with(ContainerId(2), Size::new(300, 100));
        let mut f = PanelFactory::new();
        let d = PanelDescriptor::new(PanelKind::OscillatorMacd, ContainerId(2), 100);
        let err = f.build(d, &snap, TimeWindow::covering(&snap.ohlc.times()), &opts(), &layout).err().unwrap();
        assert!(matches!(err, BuildError::MissingIndicator { indicator: "macd", .. }));
        assert_eq!(f.live_count(), 0);
    }

    #[test]
    #[should_panic(expected = "built twice")]
    fn building_twice_without_dispose_panics() {
        let snap = snapshot();
        let layout = LayoutSnapshot::new().with(ContainerId(3), Size::new(300, 100));
        let mut f = PanelFactory::new();
        let d = PanelDescriptor::new(PanelKind::OscillatorRsi, ContainerId(3), 100);
        let w = TimeWindow::covering(&snap.ohlc.times());
        let _first = f.build(d, &snap, w, &opts(), &layout).unwrap();
        let _second = f.build(d, &snap, w, &opts(), &layout);
    }

    #[test]
    fn resize_reallocates_only_on_change() {
        let snap = snapshot();
        let layout = LayoutSnapshot::new().with(ContainerId(4), Size::new(200, 100));
        let mut f = PanelFactory::new();
        let d = PanelDescriptor::new(PanelKind::Price, ContainerId(4), 100);
        let mut p = f.build(d, &snap, TimeWindow::covering(&snap.ohlc.times()), &opts(), &layout).unwrap();
        assert!(!p.resize(Size::new(200, 100)).unwrap());
        assert!(p.resize(Size::new(260, 90)).unwrap());
        let (px, w, h, _) = p.to_rgba8().unwrap();
        assert_eq!((w, h), (260, 90));
        assert_eq!(px.len(), 260 * 90 * 4);
        assert_eq!(p.render_count(), 2);
    }
}
