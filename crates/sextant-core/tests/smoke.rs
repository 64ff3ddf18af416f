// File: crates/sextant-core/tests/smoke.rs
// Purpose: End-to-end smoke test: build a full session and write every surface to disk.

mod common;

use std::collections::BTreeSet;

use chrono::NaiveDate;
use sextant_core::{ConfidenceBandPoint, ForecastRenderer, ForecastSeries, ForecastStyle, OverlayKind};

#[test]
fn render_smoke_png() {
    let out = std::path::PathBuf::from("target/test_out");
    std::fs::create_dir_all(&out).unwrap();

    // labels on: exercises text shaping too
    let mut m = sextant_core::SessionManager::new(common::descriptors(), sextant_core::BuildOptions::default(), std::time::Duration::ZERO);
    let id = m.begin(common::snapshot("SMOKE", 90), BTreeSet::from(OverlayKind::ALL));
    m.build(&common::layout(640)).expect("session builds");
    for (kind, bytes) in m.live_session_mut(id).unwrap().export_png().expect("export") {
        assert!(bytes.starts_with(&[137, 80, 78, 71]), "should be PNG header");
        std::fs::write(out.join(format!("smoke_{}.png", kind.label())), bytes).unwrap();
    }

    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let raw: Vec<ConfidenceBandPoint> = (1..=10)
        .map(|i| {
            let p = 100.0 + i as f64 * 0.8;
            let w = 1.5 + i as f64 * 0.4;
            ConfidenceBandPoint { date: start + chrono::Days::new(i), predicted: p, lower_bound: p - w, upper_bound: p + w }
        })
        .collect();
    let mut r = ForecastRenderer::new(ForecastStyle::default()).unwrap();
    r.draw(&ForecastSeries::normalize(100.0, &raw));
    let path = out.join("smoke_forecast.png");
    r.write_png(&path).expect("write forecast");
    assert!(std::fs::metadata(&path).expect("output exists").len() > 0, "png should be non-empty");
}
