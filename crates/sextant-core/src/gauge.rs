// File: crates/sextant-core/src/gauge.rs
// Summary: Radial signal gauge: exact score-to-angle mapping and its raster routine.
// Angles are Skia degrees (clockwise from +x, y down): the track runs over the upper
// half circle from 180 (left, score 0) through 270 (top, score 50) to 360 (right, 100).

use std::path::Path;

use skia_safe as skia;

use crate::draw;
use crate::geometry::{clamp, Size};
use crate::raster::{self, RenderError};
use crate::text::{Anchor, TextShaper};
use crate::theme::Theme;

pub const START_ANGLE: f32 = 180.0;
pub const SWEEP_ANGLE: f32 = 180.0;
pub const END_ANGLE: f32 = START_ANGLE + SWEEP_ANGLE;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GaugeGeometry {
    /// Score after clamping into 0..=100.
    pub score: f64,
    /// (score - 50) / 50, in [-1, 1].
    pub normalized: f64,
    /// Share of the track covered by the foreground arc, in [0, 1].
    pub fraction: f64,
    pub start_angle: f32,
    pub sweep_angle: f32,
    pub needle_angle: f32,
}

impl GaugeGeometry {
    pub fn for_score(score: f64) -> Self {
        let score = if score.is_nan() { 50.0 } else { clamp(score, 0.0, 100.0) };
        let normalized = (score - 50.0) / 50.0;
        let fraction = (normalized + 1.0) / 2.0;
        Self {
            score,
            normalized,
            fraction,
            start_angle: START_ANGLE,
            sweep_angle: SWEEP_ANGLE,
            needle_angle: START_ANGLE + SWEEP_ANGLE * fraction as f32,
        }
    }

    /// Sweep of the foreground arc in degrees.
    pub fn filled_sweep(&self) -> f32 {
        self.sweep_angle * self.fraction as f32
    }

    /// End of a needle of length `radius` pivoting at `center`.
    pub fn needle_tip(&self, center: (f32, f32), radius: f32) -> (f32, f32) {
        let rad = self.needle_angle.to_radians();
        (center.0 + radius * rad.cos(), center.1 + radius * rad.sin())
    }

    pub fn label(&self) -> &'static str {
        signal_label(self.score)
    }
}

pub fn signal_label(score: f64) -> &'static str {
    match score {
        s if s >= 75.0 => "Strong Buy",
        s if s >= 60.0 => "Buy",
        s if s > 40.0 => "Neutral",
        s if s > 25.0 => "Sell",
        _ => "Strong Sell",
    }
}

fn zone_color(score: f64, theme: &Theme) -> skia::Color {
    if score >= 60.0 {
        theme.gauge_bullish
    } else if score > 40.0 {
        theme.gauge_neutral
    } else {
        theme.gauge_bearish
    }
}

/// Draw the gauge centered horizontally on `canvas`, pivot near the bottom of `size`.
pub fn draw_gauge(canvas: &skia::Canvas, size: Size, geometry: &GaugeGeometry, theme: &Theme, text: Option<&TextShaper>) {
    let (w, h) = (size.width as f32, size.height as f32);
    let thickness = (w.min(h) * 0.08).max(4.0);
    let radius = ((w * 0.5).min(h * 0.8) - thickness).max(1.0);
    let center = (w * 0.5, h * 0.85);
    let oval = skia::Rect::from_xywh(center.0 - radius, center.1 - radius, radius * 2.0, radius * 2.0);

    let mut track = draw::stroke(theme.gauge_track, thickness);
    track.set_stroke_cap(skia::paint::Cap::Round);
    canvas.draw_arc(oval, geometry.start_angle, geometry.sweep_angle, false, &track);

    if geometry.fraction > 0.0 {
        let mut fg = draw::stroke(zone_color(geometry.score, theme), thickness);
        fg.set_stroke_cap(skia::paint::Cap::Round);
        canvas.draw_arc(oval, geometry.start_angle, geometry.filled_sweep(), false, &fg);
    }

    let tip = geometry.needle_tip(center, radius * 0.9);
    canvas.draw_line(center, tip, &draw::stroke(theme.needle, 3.0));
    canvas.draw_circle(center, thickness * 0.6, &draw::fill(theme.needle));

    if let Some(text) = text {
        text.draw(canvas, &format!("{:.0}", geometry.score), center.0, center.1 - radius * 0.35, 22.0, theme.axis_label, Anchor::Center, true);
        text.draw(canvas, geometry.label(), center.0, center.1 - radius * 0.1, 13.0, zone_color(geometry.score, theme), Anchor::Center, false);
    }
}

/// Gauge on its own surface.
pub struct GaugeRenderer {
    size: Size,
    theme: Theme,
    surface: skia::Surface,
    text: Option<TextShaper>,
}

impl GaugeRenderer {
    pub fn new(size: Size, theme: Theme, draw_labels: bool) -> Result<Self, RenderError> {
        let surface = raster::allocate(size)?;
        Ok(Self { size, theme, surface, text: draw_labels.then(TextShaper::new) })
    }

    pub fn draw(&mut self, score: f64) -> GaugeGeometry {
        let geometry = GaugeGeometry::for_score(score);
        let canvas = self.surface.canvas();
        canvas.clear(self.theme.background);
        draw_gauge(canvas, self.size, &geometry, &self.theme, self.text.as_ref());
        geometry
    }

    pub fn to_rgba8(&mut self) -> Result<(Vec<u8>, u32, u32, usize), RenderError> {
        raster::to_rgba8(&mut self.surface)
    }

    pub fn render_to_png_bytes(&mut self) -> Result<Vec<u8>, RenderError> {
        raster::to_png_bytes(&mut self.surface)
    }

    pub fn write_png(&mut self, path: impl AsRef<Path>) -> Result<(), RenderError> {
        raster::write_png(&mut self.surface, path)
    }
}
