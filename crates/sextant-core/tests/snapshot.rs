// File: crates/sextant-core/tests/snapshot.rs
// Purpose: Golden snapshot harness with bless flow.
// Behavior:
// - Renders a deterministic forecast band and gauge to PNG bytes (labels off).
// - If env UPDATE_SNAPSHOTS=1, (re)writes the snapshot files.
// - Else, if a snapshot exists, compares decoded pixels for an exact match.
// - Else, logs a note and skips without failing to ease first run.

use chrono::NaiveDate;
use sextant_core::{ConfidenceBandPoint, ForecastRenderer, ForecastSeries, ForecastStyle, GaugeRenderer, Size, Theme};

fn forecast_bytes() -> Vec<u8> {
    let d = |day| NaiveDate::from_ymd_opt(2024, 5, day).unwrap();
    let raw = [
        ConfidenceBandPoint { date: d(2), predicted: 100.0, lower_bound: 95.0, upper_bound: 105.0 },
        ConfidenceBandPoint { date: d(3), predicted: 103.0, lower_bound: 97.0, upper_bound: 109.0 },
        ConfidenceBandPoint { date: d(4), predicted: 101.5, lower_bound: 94.0, upper_bound: 110.0 },
        ConfidenceBandPoint { date: d(5), predicted: 104.0, lower_bound: 95.5, upper_bound: 112.0 },
    ];
    let style = ForecastStyle { width: 320, height: 180, draw_labels: false, ..ForecastStyle::default() };
    let mut r = ForecastRenderer::new(style).expect("surface");
    r.draw(&ForecastSeries::normalize(98.0, &raw));
    r.render_to_png_bytes().expect("png")
}

fn gauge_bytes() -> Vec<u8> {
    let mut g = GaugeRenderer::new(Size::new(160, 100), Theme::dark(), false).expect("surface");
    g.draw(68.0);
    g.render_to_png_bytes().expect("png")
}

fn check_golden(name: &str, bytes: &[u8]) {
    let snap_dir = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/__snapshots__");
    let snap_path = snap_dir.join(name);

    let update = std::env::var("UPDATE_SNAPSHOTS").ok().map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);

    if update {
        std::fs::create_dir_all(&snap_dir).expect("create snapshots dir");
        std::fs::write(&snap_path, bytes).expect("write snapshot");
        eprintln!("[snapshot] Updated {} ({} bytes)", snap_path.display(), bytes.len());
        return;
    }

    if snap_path.exists() {
        let want = std::fs::read(&snap_path).expect("read snapshot");
        // Compare decoded pixel buffers to avoid PNG encoder variance
        let got_img = image::load_from_memory(bytes).expect("decode got").to_rgba8();
        let want_img = image::load_from_memory(&want).expect("decode want").to_rgba8();
        assert_eq!(got_img.as_raw(), want_img.as_raw(), "rendered pixels differ from golden snapshot: {}", snap_path.display());
    } else {
        eprintln!("[snapshot] Missing snapshot {}; set UPDATE_SNAPSHOTS=1 to bless.", snap_path.display());
    }
}

#[test]
fn golden_forecast_band() {
    check_golden("forecast_band.png", &forecast_bytes());
}

#[test]
fn golden_signal_gauge() {
    check_golden("signal_gauge.png", &gauge_bytes());
}
