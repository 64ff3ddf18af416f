// File: crates/sextant-core/src/theme.rs
// Summary: Light/Dark palettes for panels, overlays, the forecast band and the gauge.

use skia_safe as skia;

#[derive(Clone, Copy, Debug)]
pub struct Theme {
    pub name: &'static str,
    pub background: skia::Color,
    pub grid: skia::Color,
    pub axis_line: skia::Color,
    pub axis_label: skia::Color,
    pub candle_up: skia::Color,
    pub candle_down: skia::Color,
    pub volume_up: skia::Color,
    pub volume_down: skia::Color,
    pub reference_line: skia::Color,
    pub rsi_line: skia::Color,
    pub macd_line: skia::Color,
    pub macd_signal: skia::Color,
    pub sma: skia::Color,
    pub ema: skia::Color,
    pub bollinger: skia::Color,
    pub bollinger_fill: skia::Color,
    pub band_top: skia::Color,
    pub band_bottom: skia::Color,
    pub forecast_line: skia::Color,
    pub forecast_marker: skia::Color,
    pub anchor_marker: skia::Color,
    pub target_line: skia::Color,
    pub gauge_track: skia::Color,
    pub gauge_bearish: skia::Color,
    pub gauge_neutral: skia::Color,
    pub gauge_bullish: skia::Color,
    pub needle: skia::Color,
}

impl Theme {
    pub fn dark() -> Self {
        Self {
            name: "dark",
            background: skia::Color::from_argb(255, 18, 18, 20),
            grid: skia::Color::from_argb(255, 40, 40, 45),
            axis_line: skia::Color::from_argb(255, 180, 180, 190),
            axis_label: skia::Color::from_argb(255, 235, 235, 245),
            candle_up: skia::Color::from_argb(255, 40, 200, 120),
            candle_down: skia::Color::from_argb(255, 220, 80, 80),
            volume_up: skia::Color::from_argb(128, 40, 200, 120),
            volume_down: skia::Color::from_argb(128, 220, 80, 80),
            reference_line: skia::Color::from_argb(160, 150, 150, 160),
            rsi_line: skia::Color::from_argb(255, 167, 139, 250),
            macd_line: skia::Color::from_argb(255, 64, 160, 255),
            macd_signal: skia::Color::from_argb(255, 255, 152, 0),
            sma: skia::Color::from_argb(255, 255, 193, 7),
            ema: skia::Color::from_argb(255, 236, 72, 153),
            bollinger: skia::Color::from_argb(200, 96, 156, 255),
            bollinger_fill: skia::Color::from_argb(28, 96, 156, 255),
            band_top: skia::Color::from_argb(110, 64, 160, 255),
            band_bottom: skia::Color::from_argb(20, 64, 160, 255),
            forecast_line: skia::Color::from_argb(255, 64, 160, 255),
            forecast_marker: skia::Color::from_argb(255, 64, 160, 255),
            anchor_marker: skia::Color::from_argb(255, 255, 230, 70),
            target_line: skia::Color::from_argb(255, 40, 200, 120),
            gauge_track: skia::Color::from_argb(255, 48, 48, 54),
            gauge_bearish: skia::Color::from_argb(255, 220, 80, 80),
            gauge_neutral: skia::Color::from_argb(255, 255, 193, 7),
            gauge_bullish: skia::Color::from_argb(255, 40, 200, 120),
            needle: skia::Color::from_argb(255, 235, 235, 245),
        }
    }

    pub fn light() -> Self {
        Self {
            name: "light",
            background: skia::Color::from_argb(255, 250, 250, 252),
            grid: skia::Color::from_argb(255, 230, 230, 235),
            axis_line: skia::Color::from_argb(255, 60, 60, 70),
            axis_label: skia::Color::from_argb(255, 20, 20, 30),
            candle_up: skia::Color::from_argb(255, 20, 160, 90),
            candle_down: skia::Color::from_argb(255, 200, 60, 60),
            volume_up: skia::Color::from_argb(120, 20, 160, 90),
            volume_down: skia::Color::from_argb(120, 200, 60, 60),
            reference_line: skia::Color::from_argb(160, 100, 100, 110),
            rsi_line: skia::Color::from_argb(255, 124, 58, 237),
            macd_line: skia::Color::from_argb(255, 32, 120, 200),
            macd_signal: skia::Color::from_argb(255, 230, 120, 0),
            sma: skia::Color::from_argb(255, 202, 138, 4),
            ema: skia::Color::from_argb(255, 219, 39, 119),
            bollinger: skia::Color::from_argb(200, 40, 120, 200),
            bollinger_fill: skia::Color::from_argb(24, 40, 120, 200),
            band_top: skia::Color::from_argb(100, 32, 120, 200),
            band_bottom: skia::Color::from_argb(16, 32, 120, 200),
            forecast_line: skia::Color::from_argb(255, 32, 120, 200),
            forecast_marker: skia::Color::from_argb(255, 32, 120, 200),
            anchor_marker: skia::Color::from_argb(255, 230, 120, 0),
            target_line: skia::Color::from_argb(255, 20, 160, 90),
            gauge_track: skia::Color::from_argb(255, 225, 225, 232),
            gauge_bearish: skia::Color::from_argb(255, 200, 60, 60),
            gauge_neutral: skia::Color::from_argb(255, 202, 138, 4),
            gauge_bullish: skia::Color::from_argb(255, 20, 160, 90),
            needle: skia::Color::from_argb(255, 20, 20, 30),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}

/// Return a list of built-in theme presets.
pub fn presets() -> Vec<Theme> {
    vec![Theme::dark(), Theme::light()]
}

/// Find a theme by its `name`, falling back to dark.
pub fn find(name: &str) -> Theme {
    for t in presets() { if t.name.eq_ignore_ascii_case(name) { return t; } }
    Theme::dark()
}
