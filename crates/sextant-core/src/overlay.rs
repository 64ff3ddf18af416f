// File: crates/sextant-core/src/overlay.rs
// Summary: Overlay composer: moving averages and Bollinger bands layered onto a live
// price panel in place, without rebuilding the panel.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use skia_safe as skia;

use crate::draw;
use crate::panel::{PanelInstance, PanelKind};
use crate::scale::{TimeScale, TimeWindow, ValueScale};
use crate::series::{definite_runs, names, DefinitePoint, IndicatorPoint, MarketSnapshot};
use crate::theme::Theme;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlayKind {
    Bollinger,
    Sma,
    Ema,
}

impl OverlayKind {
    pub const ALL: [OverlayKind; 3] = [OverlayKind::Bollinger, OverlayKind::Sma, OverlayKind::Ema];

    /// Indicator series feeding this overlay, in drawing order.
    pub const fn sources(&self) -> &'static [&'static str] {
        match self {
            OverlayKind::Bollinger => &[names::BB_UPPER, names::BB_MIDDLE, names::BB_LOWER],
            OverlayKind::Sma => &[names::SMA],
            OverlayKind::Ema => &[names::EMA],
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bollinger" | "bb" => Some(OverlayKind::Bollinger),
            "sma" => Some(OverlayKind::Sma),
            "ema" => Some(OverlayKind::Ema),
            _ => None,
        }
    }
}

/// Overlay lines already filtered to definite values, one entry per source line,
/// each split into runs at warm-up gaps.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OverlayLines {
    pub lines: Vec<Vec<Vec<DefinitePoint>>>,
}

impl OverlayLines {
    pub fn from_series(series: &[&[IndicatorPoint]]) -> Self {
        Self { lines: series.iter().map(|s| definite_runs(s)).collect() }
    }

    pub fn point_count(&self) -> usize {
        self.lines.iter().flatten().map(Vec::len).sum()
    }

    pub(crate) fn value_range(&self, window: &TimeWindow) -> Option<(f64, f64)> {
        let mut it = self.lines.iter().flatten().flatten().filter(|p| window.contains(p.time)).map(|p| p.value);
        let first = it.next()?;
        Some(it.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
    }
}

fn assert_price(panel: &PanelInstance) {
    assert_eq!(panel.kind(), PanelKind::Price, "overlays can only be applied to the price panel");
}

/// Add or replace the overlay `kind` on a price panel and redraw it.
/// Calling twice with the same kind replaces the previous lines.
///
/// # Panics
/// If `panel` is not a price panel.
pub fn apply_overlay(panel: &mut PanelInstance, kind: OverlayKind, series: &[&[IndicatorPoint]]) {
    assert_price(panel);
    let lines = OverlayLines::from_series(series);
    tracing::debug!(?kind, points = lines.point_count(), "applying overlay");
    panel.overlays_mut().insert(kind, lines);
    panel.render();
}

/// Remove overlay `kind`; no-op if it was never applied. Returns whether anything changed.
pub fn remove_overlay(panel: &mut PanelInstance, kind: OverlayKind) -> bool {
    assert_price(panel);
    if panel.overlays_mut().remove(&kind).is_none() {
        return false;
    }
    panel.render();
    true
}

/// Reconcile the panel with `flags`: apply missing overlays from `snapshot`, remove
/// the ones no longer wanted. Overlays whose indicator data is missing are skipped.
pub fn sync_overlays(panel: &mut PanelInstance, flags: &BTreeSet<OverlayKind>, snapshot: &MarketSnapshot) {
    for kind in OverlayKind::ALL {
        let present = panel.overlay(kind).is_some();
        let wanted = flags.contains(&kind);
        if wanted && !present {
            match overlay_series(kind, snapshot) {
                Some(series) => apply_overlay(panel, kind, &series),
                None => tracing::warn!(?kind, symbol = %snapshot.symbol, "overlay data missing; skipping"),
            }
        } else if !wanted && present {
            remove_overlay(panel, kind);
        }
    }
}

/// Look up every source series of `kind`; `None` if any is missing.
pub fn overlay_series(kind: OverlayKind, snapshot: &MarketSnapshot) -> Option<Vec<&[IndicatorPoint]>> {
    kind.sources().iter().map(|name| snapshot.indicator(name)).collect()
}

fn color_of(kind: OverlayKind, theme: &Theme) -> skia::Color {
    match kind {
        OverlayKind::Bollinger => theme.bollinger,
        OverlayKind::Sma => theme.sma,
        OverlayKind::Ema => theme.ema,
    }
}

/// Band fill drawn underneath the candles (Bollinger only).
pub(crate) fn draw_fill(canvas: &skia::Canvas, ts: &TimeScale, vs: &ValueScale, kind: OverlayKind, lines: &OverlayLines, theme: &Theme) {
    if kind != OverlayKind::Bollinger || lines.lines.len() < 3 {
        return;
    }
    // runs of the upper bound are matched against every lower point by timestamp
    let lower: Vec<DefinitePoint> = lines.lines[2].iter().flatten().copied().collect();
    for run in &lines.lines[0] {
        draw::fill_between(canvas, ts, vs, run, &lower, theme.bollinger_fill);
    }
}

pub(crate) fn draw_lines(canvas: &skia::Canvas, ts: &TimeScale, vs: &ValueScale, kind: OverlayKind, lines: &OverlayLines, theme: &Theme) {
    let mut paint = draw::stroke(color_of(kind, theme), 1.5);
    for (i, line) in lines.lines.iter().enumerate() {
        // Bollinger middle line dashed, outer bounds solid
        if kind == OverlayKind::Bollinger && i == 1 {
            paint.set_path_effect(skia::PathEffect::dash(&[5.0, 3.0], 0.0));
        } else {
            paint.set_path_effect(None);
        }
        for run in line {
            draw::draw_line(canvas, ts, vs, run, &paint);
        }
    }
}
