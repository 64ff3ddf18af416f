// File: crates/sextant-core/src/draw.rs
// Summary: Canvas drawing primitives shared by panel kinds (grid, candles, lines, bars, guides).

use skia_safe as skia;

use crate::geometry::RectI32;
use crate::grid::linspace;
use crate::scale::{TimeScale, ValueScale};
use crate::series::{DefinitePoint, OhlcPoint};

pub(crate) fn stroke(color: skia::Color, width: f32) -> skia::Paint {
    let mut paint = skia::Paint::default();
    paint.set_anti_alias(true);
    paint.set_style(skia::paint::Style::Stroke);
    paint.set_stroke_width(width);
    paint.set_color(color);
    paint
}

pub(crate) fn fill(color: skia::Color) -> skia::Paint {
    let mut paint = skia::Paint::default();
    paint.set_anti_alias(true);
    paint.set_style(skia::paint::Style::Fill);
    paint.set_color(color);
    paint
}

pub(crate) fn dashed(color: skia::Color, width: f32, on: f32, off: f32) -> skia::Paint {
    let mut paint = stroke(color, width);
    paint.set_path_effect(skia::PathEffect::dash(&[on, off], 0.0));
    paint
}

/// Horizontal grid at `rows` evenly spaced levels plus vertical lines every `cols`.
pub(crate) fn draw_grid(canvas: &skia::Canvas, plot: &RectI32, color: skia::Color, rows: usize, cols: usize) {
    let paint = stroke(color, 1.0);
    let (l, t, r, b) = (plot.left as f32, plot.top as f32, plot.right as f32, plot.bottom as f32);
    for x in linspace(l as f64, r as f64, cols) {
        canvas.draw_line((x as f32, t), (x as f32, b), &paint);
    }
    for y in linspace(t as f64, b as f64, rows) {
        canvas.draw_line((l, y as f32), (r, y as f32), &paint);
    }
}

pub(crate) fn draw_candles(
    canvas: &skia::Canvas,
    ts: &TimeScale,
    vs: &ValueScale,
    candles: &[OhlcPoint],
    up: skia::Color,
    down: skia::Color,
) {
    if candles.is_empty() { return; }

    let mut wick = stroke(up, 1.0);
    let mut body = fill(up);

    // body width in pixels (a fraction of one bar slot)
    let bar_px = ts.bar_px().max(3.0) * 0.7;

    for c in candles {
        let x = ts.to_px(c.time);
        let y_o = vs.to_px(c.open);
        let y_h = vs.to_px(c.high);
        let y_l = vs.to_px(c.low);
        let y_c = vs.to_px(c.close);

        let color = if c.is_up() { up } else { down };
        wick.set_color(color);
        body.set_color(color);

        canvas.draw_line((x, y_h), (x, y_l), &wick);

        let half = bar_px * 0.5;
        let top = y_o.min(y_c);
        let bot = y_o.max(y_c);
        let rect = skia::Rect::from_ltrb(x - half, top, x + half, bot.max(top + 1.0));
        canvas.draw_rect(rect, &body);
    }
}

/// Polyline through definite points; callers pass one run per call so gaps stay open.
pub(crate) fn draw_line(canvas: &skia::Canvas, ts: &TimeScale, vs: &ValueScale, run: &[DefinitePoint], paint: &skia::Paint) {
    if run.len() < 2 {
        if let Some(p) = run.first() {
            // isolated value between two gaps: draw a dot so it stays visible
            let mut dot = paint.clone();
            dot.set_style(skia::paint::Style::Fill);
            canvas.draw_circle((ts.to_px(p.time), vs.to_px(p.value)), paint.stroke_width().max(1.0), &dot);
        }
        return;
    }
    let mut path = skia::Path::new();
    path.move_to((ts.to_px(run[0].time), vs.to_px(run[0].value)));
    for p in &run[1..] {
        path.line_to((ts.to_px(p.time), vs.to_px(p.value)));
    }
    canvas.draw_path(&path, paint);
}

/// (time, upper, lower) for every timestamp present in both runs. Both inputs must be
/// sorted by time.
pub(crate) fn pair_by_time(upper: &[DefinitePoint], lower: &[DefinitePoint]) -> Vec<(i64, f64, f64)> {
    let mut out = Vec::with_capacity(upper.len().min(lower.len()));
    let (mut i, mut j) = (0, 0);
    while i < upper.len() && j < lower.len() {
        let (u, l) = (&upper[i], &lower[j]);
        match u.time.cmp(&l.time) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                out.push((u.time, u.value, l.value));
                i += 1;
                j += 1;
            }
        }
    }
    out
}

/// Filled region between two runs sampled at the same timestamps.
pub(crate) fn fill_between(
    canvas: &skia::Canvas,
    ts: &TimeScale,
    vs: &ValueScale,
    upper: &[DefinitePoint],
    lower: &[DefinitePoint],
    color: skia::Color,
) {
    let pairs = pair_by_time(upper, lower);
    if pairs.len() < 2 { return; }
    let mut path = skia::Path::new();
    path.move_to((ts.to_px(pairs[0].0), vs.to_px(pairs[0].1)));
    for &(t, u, _) in &pairs[1..] {
        path.line_to((ts.to_px(t), vs.to_px(u)));
    }
    for &(t, _, l) in pairs.iter().rev() {
        path.line_to((ts.to_px(t), vs.to_px(l)));
    }
    path.close();
    canvas.draw_path(&path, &fill(color));
}

/// Vertical bars from `baseline` to each value, colored by `color_of`.
pub(crate) fn draw_bars<F>(canvas: &skia::Canvas, ts: &TimeScale, vs: &ValueScale, bars: &[(i64, f64)], baseline: f64, color_of: F)
where
    F: Fn(usize, f64) -> skia::Color,
{
    let half = (ts.bar_px() * 0.8).max(1.0) * 0.5;
    let y0 = vs.to_px(baseline);
    let mut paint = fill(skia::Color::TRANSPARENT);
    for (i, &(t, v)) in bars.iter().enumerate() {
        let x = ts.to_px(t);
        let y = vs.to_px(v);
        paint.set_color(color_of(i, v));
        let rect = skia::Rect::from_ltrb(x - half, y.min(y0), x + half, y.max(y0).max(y.min(y0) + 1.0));
        canvas.draw_rect(rect, &paint);
    }
}

/// Dashed horizontal guide at `value`, spanning the plot width.
pub(crate) fn draw_reference(canvas: &skia::Canvas, plot: &RectI32, vs: &ValueScale, value: f64, color: skia::Color) {
    let y = vs.to_px(value);
    let paint = dashed(color, 1.0, 4.0, 4.0);
    canvas.draw_line((plot.left as f32, y), (plot.right as f32, y), &paint);
}

pub(crate) fn draw_axis_frame(canvas: &skia::Canvas, plot: &RectI32, color: skia::Color) {
    let paint = stroke(color, 1.0);
    let (l, t, r, b) = (plot.left as f32, plot.top as f32, plot.right as f32, plot.bottom as f32);
    canvas.draw_line((r, t), (r, b), &paint);
    canvas.draw_line((l, b), (r, b), &paint);
}
