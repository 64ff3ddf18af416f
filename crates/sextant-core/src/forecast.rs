// File: crates/sextant-core/src/forecast.rs
// Summary: Forecast band renderer: grid, gradient confidence cone, smoothed prediction
// curve, anchor marker, date labels and target-price callout on an owned raster surface.
// Notes:
// - Draw order is fixed; later steps occlude earlier ones.
// - The surface is redrawn from scratch on every call (horizons are short).
// - Fewer than two band points draws background and grid only.

use std::path::Path;

use skia_safe as skia;

use crate::draw;
use crate::geometry::{RectI32, Size};
use crate::grid::{linspace, subsample_indices};
use crate::raster::{self, RenderError};
use crate::series::ForecastSeries;
use crate::text::{Anchor, TextShaper};
use crate::theme::Theme;
use crate::types::{Insets, HEIGHT, WIDTH};

pub const TODAY_LABEL: &str = "Today";

#[derive(Clone, Debug)]
pub struct ForecastStyle {
    pub width: u32,
    pub height: u32,
    pub insets: Insets,
    /// Fraction of the lowest value added below the price range.
    pub pad_below: f64,
    /// Fraction of the highest value added above the price range.
    pub pad_above: f64,
    pub grid_intervals: usize,
    pub max_date_labels: usize,
    pub draw_labels: bool,
    pub theme: Theme,
}

impl Default for ForecastStyle {
    fn default() -> Self {
        Self {
            width: WIDTH,
            height: HEIGHT,
            insets: Insets::new(24, 72, 16, 28),
            pad_below: 0.03,
            pad_above: 0.07,
            grid_intervals: 5,
            max_date_labels: 7,
            draw_labels: true,
            theme: Theme::dark(),
        }
    }
}

/// What the last draw produced, in data and pixel terms.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ForecastLayout {
    /// Padded (bottom, top) price range mapped onto the plot height.
    pub price_range: (f64, f64),
    pub grid_levels: Vec<f64>,
    pub anchor_x: f32,
    /// X of each horizon point, in date order.
    pub point_x: Vec<f32>,
    /// Horizon indices that received a date label.
    pub label_indices: Vec<usize>,
    /// Every label placed under the axis, "Today" first.
    pub labels: Vec<(f32, String)>,
    pub target_price: Option<f64>,
    pub target_label: Option<String>,
    pub band_drawn: bool,
    pub curve_drawn: bool,
}

/// One step of a smoothed polyline.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Segment {
    MoveTo((f32, f32)),
    QuadTo { ctrl: (f32, f32), end: (f32, f32) },
    LineTo((f32, f32)),
}

/// Quadratic midpoint smoothing: each interior point becomes the control point of a
/// curve ending halfway to its successor; the last point is reached with a line.
/// The path passes through the first and last points exactly.
pub fn smooth_segments(points: &[(f32, f32)]) -> Vec<Segment> {
    let Some(&first) = points.first() else { return Vec::new() };
    let mut out = Vec::with_capacity(points.len() + 1);
    out.push(Segment::MoveTo(first));
    if points.len() < 2 {
        return out;
    }
    for i in 1..points.len() - 1 {
        let (p, q) = (points[i], points[i + 1]);
        out.push(Segment::QuadTo { ctrl: p, end: ((p.0 + q.0) * 0.5, (p.1 + q.1) * 0.5) });
    }
    out.push(Segment::LineTo(points[points.len() - 1]));
    out
}

/// Append `segments` to `path`. With `connect`, the leading move becomes a line so the
/// segments continue the current contour.
fn extend_path(path: &mut skia::Path, segments: &[Segment], connect: bool) {
    for seg in segments {
        match *seg {
            Segment::MoveTo(p) if connect => { path.line_to(p); }
            Segment::MoveTo(p) => { path.move_to(p); }
            Segment::QuadTo { ctrl, end } => { path.quad_to(ctrl, end); }
            Segment::LineTo(p) => { path.line_to(p); }
        }
    }
}

pub struct ForecastRenderer {
    style: ForecastStyle,
    surface: skia::Surface,
    text: Option<TextShaper>,
}

impl ForecastRenderer {
    pub fn new(style: ForecastStyle) -> Result<Self, RenderError> {
        let surface = raster::allocate(Size::new(style.width, style.height))?;
        let text = style.draw_labels.then(TextShaper::new);
        Ok(Self { style, surface, text })
    }

    pub fn style(&self) -> &ForecastStyle {
        &self.style
    }

    /// Redraw the whole surface for `series`.
    pub fn draw(&mut self, series: &ForecastSeries) -> ForecastLayout {
        let st = &self.style;
        let theme = st.theme;
        let plot = RectI32::plot_area(Size::new(st.width, st.height), &st.insets);
        let (l, t, r, b) = (plot.left as f32, plot.top as f32, plot.right as f32, plot.bottom as f32);

        let (lo, hi) = series.value_range();
        let price_range = (lo * (1.0 - st.pad_below), hi * (1.0 + st.pad_above));
        let span = (price_range.1 - price_range.0).max(1e-9);
        let y_of = |v: f64| b - ((v - price_range.0) / span) as f32 * (b - t);

        let n = series.points.len();
        let slot = (r - l) / n.max(1) as f32;
        let anchor_x = l;
        let point_x: Vec<f32> = (1..=n).map(|i| l + slot * i as f32).collect();

        let mut layout = ForecastLayout {
            price_range,
            grid_levels: linspace(price_range.0, price_range.1, st.grid_intervals + 1),
            anchor_x,
            point_x,
            ..ForecastLayout::default()
        };

        let canvas = self.surface.canvas();
        // 1. background
        canvas.clear(theme.background);

        // 2. grid at equal price intervals
        let grid = draw::stroke(theme.grid, 1.0);
        for &level in &layout.grid_levels {
            let y = y_of(level);
            canvas.draw_line((l, y), (r, y), &grid);
        }
        if let Some(text) = &self.text {
            for &level in &layout.grid_levels {
                text.draw(canvas, &format!("${level:.2}"), r + 6.0, y_of(level) + 4.0, 11.0, theme.axis_label, Anchor::Left, true);
            }
        }

        if n < 2 {
            tracing::debug!(points = n, "forecast too short; drawing grid only");
            return layout;
        }

        let anchor = (anchor_x, y_of(series.anchor_price));
        let along = |f: fn(&crate::series::ConfidenceBandPoint) -> f64| -> Vec<(f32, f32)> {
            std::iter::once(anchor)
                .chain(series.points.iter().zip(&layout.point_x).map(|(p, &x)| (x, y_of(f(p)))))
                .collect()
        };
        let upper = along(|p| p.upper_bound);
        let lower = along(|p| p.lower_bound);
        let center = along(|p| p.predicted);

        // 3. confidence band as a cone opening from the anchor
        let mut band = skia::Path::new();
        extend_path(&mut band, &smooth_segments(&upper), false);
        let lower_rev: Vec<(f32, f32)> = lower.iter().rev().copied().collect();
        extend_path(&mut band, &smooth_segments(&lower_rev), true);
        band.close();
        let mut band_paint = draw::fill(theme.band_top);
        let top_y = upper.iter().map(|p| p.1).fold(f32::INFINITY, f32::min);
        let bottom_y = lower.iter().map(|p| p.1).fold(f32::NEG_INFINITY, f32::max);
        band_paint.set_shader(skia::Shader::linear_gradient(
            ((0.0, top_y), (0.0, bottom_y.max(top_y + 1.0))),
            &[theme.band_top, theme.band_bottom][..],
            None,
            skia::TileMode::Clamp,
            None,
            None,
        ));
        canvas.draw_path(&band, &band_paint);
        layout.band_drawn = true;

        // 4. prediction curve from the anchor
        let mut curve = skia::Path::new();
        extend_path(&mut curve, &smooth_segments(&center), false);
        canvas.draw_path(&curve, &draw::stroke(theme.forecast_line, 2.5));
        layout.curve_drawn = true;

        // 5. anchor price reference
        canvas.draw_line((l, anchor.1), (r, anchor.1), &draw::dashed(theme.anchor_marker, 1.0, 4.0, 4.0));

        // 6. markers
        let marker = draw::fill(theme.forecast_marker);
        for &(x, y) in &center[1..] {
            canvas.draw_circle((x, y), 3.5, &marker);
        }
        canvas.draw_circle(anchor, 5.0, &draw::fill(theme.anchor_marker));

        // 7. date labels, subsampled, plus "Today" under the anchor
        layout.label_indices = subsample_indices(n, st.max_date_labels);
        layout.labels.push((anchor_x, TODAY_LABEL.to_string()));
        for &i in &layout.label_indices {
            layout.labels.push((layout.point_x[i], series.points[i].date.format("%b %d").to_string()));
        }

        // 8. target callout at the final predicted price
        if let Some(target) = series.target() {
            let y = y_of(target.predicted);
            canvas.draw_line((l, y), (r, y), &draw::dashed(theme.target_line, 1.0, 6.0, 4.0));
            layout.target_price = Some(target.predicted);
            layout.target_label = Some(format!("Target ${:.2}", target.predicted));
        }

        if let Some(text) = &self.text {
            for (x, label) in &layout.labels {
                text.draw(canvas, label, *x, b + 18.0, 11.0, theme.axis_label, Anchor::Center, false);
            }
            if let (Some(price), Some(label)) = (layout.target_price, &layout.target_label) {
                text.draw(canvas, label, r - 4.0, y_of(price) - 6.0, 12.0, theme.target_line, Anchor::Right, true);
            }
        }

        layout
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
