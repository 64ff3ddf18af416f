// File: crates/sextant-core/src/scale.rs
// Summary: Shared time window (X) and value (Y) scale transforms used by every panel.

use crate::geometry::RectI32;

/// Visible time range shared by all panels of a session, in epoch seconds.
/// Panels never own their own X range: they all map through the same window,
/// which is what keeps candles, oscillators and volume bars vertically aligned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: i64,
    pub end: i64,
    /// Typical spacing between consecutive bars, used for bar widths and edge padding.
    pub step: i64,
}

impl TimeWindow {
    pub fn new(start: i64, end: i64, step: i64) -> Self {
        let (start, end) = if end < start { (end, start) } else { (start, end) };
        Self { start, end, step: step.max(1) }
    }

    /// Window covering `times` (assumed ascending), with the median gap as bar step.
    pub fn covering(times: &[i64]) -> Self {
        match (times.first(), times.last()) {
            (Some(&first), Some(&last)) => {
                let mut gaps: Vec<i64> = times.windows(2).map(|w| w[1] - w[0]).filter(|g| *g > 0).collect();
                gaps.sort_unstable();
                let step = gaps.get(gaps.len() / 2).copied().unwrap_or(86_400);
                Self::new(first, last, step)
            }
            _ => Self::new(0, 1, 1),
        }
    }

    pub fn contains(&self, t: i64) -> bool {
        t >= self.start && t <= self.end
    }
}

/// Horizontal time scale: maps epoch seconds onto the plot area of one panel.
/// Half a bar of padding is kept on each side so edge candles are not clipped.
#[derive(Clone, Copy, Debug)]
pub struct TimeScale {
    left_px: f32,
    right_px: f32,
    start: f64,
    span: f64,
    bar_px: f32,
}

impl TimeScale {
    pub fn new(window: TimeWindow, plot: &RectI32) -> Self {
        let pad = window.step as f64 * 0.5;
        let start = window.start as f64 - pad;
        let span = ((window.end - window.start) as f64 + 2.0 * pad).max(1e-9);
        let width = plot.width().max(1) as f32;
        let bar_px = (window.step as f64 / span) as f32 * width;
        Self { left_px: plot.left as f32, right_px: plot.right as f32, start, span, bar_px }
    }

    #[inline]
    pub fn to_px(&self, t: i64) -> f32 {
        self.left_px + (((t as f64) - self.start) / self.span) as f32 * (self.right_px - self.left_px)
    }

    /// Width in pixels of one bar slot.
    pub fn bar_px(&self) -> f32 {
        self.bar_px
    }
}

/// Vertical linear value scale mapping a data range to [top, bottom] pixels.
#[derive(Clone, Copy, Debug)]
pub struct ValueScale {
    pub top_px: f32,
    pub bottom_px: f32,
    pub vmin: f64,
    pub vmax: f64,
}

impl ValueScale {
    pub fn new_linear(top_px: f32, bottom_px: f32, vmin: f64, vmax: f64) -> Self {
        let mut s = Self { top_px, bottom_px, vmin, vmax };
        if (s.vmax - s.vmin).abs() < 1e-12 { s.vmax = s.vmin + 1.0; }
        s
    }

    /// Scale over `range` with a fractional margin added above and below.
    pub fn with_margin(plot: &RectI32, range: (f64, f64), margin: f64) -> Self {
        let m = (range.1 - range.0).abs() * margin;
        Self::new_linear(plot.top as f32, plot.bottom as f32, range.0 - m, range.1 + m)
    }

    #[inline]
    pub fn to_px(&self, y: f64) -> f32 {
        let span = (self.vmax - self.vmin).max(1e-12);
        self.bottom_px - ((y - self.vmin) / span) as f32 * (self.bottom_px - self.top_px)
    }
}
