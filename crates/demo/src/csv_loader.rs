// File: crates/demo/src/csv_loader.rs
// Summary: Reads exchange-style OHLC CSV exports into raw candles.
// Notes:
// - Header names are matched case-insensitively against common aliases.
// - Rows missing any of open/high/low/close are skipped; volume defaults to zero.
// - Time may be epoch seconds, epoch milliseconds, RFC 3339 or a plain date.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use sextant_core::RawCandle;

pub fn load_ohlc_csv(path: &Path) -> Result<Vec<RawCandle>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;
    let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.trim().to_lowercase()).collect();
    tracing::debug!(?headers, "csv headers");

    let idx = |names: &[&str]| headers.iter().position(|h| names.contains(&h.as_str()));
    let i_time = idx(&["time", "timestamp", "open_time", "date", "datetime"])
        .context("no time column (time/timestamp/open_time/date)")?;
    let i_open = idx(&["open", "o"]).context("no open column")?;
    let i_high = idx(&["high", "h"]).context("no high column")?;
    let i_low = idx(&["low", "l"]).context("no low column")?;
    let i_close = idx(&["close", "c", "adj_close", "close_price"]).context("no close column")?;
    let i_volume = idx(&["volume", "vol", "v"]);

    let mut out = Vec::new();
    let mut skipped = 0usize;
    for rec in rdr.records() {
        let rec = rec?;
        let num = |i: usize| rec.get(i).and_then(|s| s.trim().parse::<f64>().ok());
        let time = rec.get(i_time).and_then(parse_time);
        match (time, num(i_open), num(i_high), num(i_low), num(i_close)) {
            (Some(time), Some(open), Some(high), Some(low), Some(close)) => out.push(RawCandle {
                time,
                open,
                high,
                low,
                close,
                volume: i_volume.and_then(num).unwrap_or(0.0),
            }),
            _ => skipped += 1,
        }
    }
    if skipped > 0 {
        tracing::warn!(skipped, path = %path.display(), "csv rows without a usable time or price skipped");
    }
    Ok(out)
}

/// Epoch seconds from the formats exchanges commonly export.
pub fn parse_time(s: &str) -> Option<i64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(n) = s.parse::<i64>() {
        // epoch ms
        return Some(if n > 10_i64.pow(12) { n / 1000 } else { n });
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.and_utc().timestamp());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok().and_then(|d| d.and_hms_opt(0, 0, 0)).map(|dt| dt.and_utc().timestamp())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_formats() {
        assert_eq!(parse_time("1700000000"), Some(1_700_000_000));
        assert_eq!(parse_time("1700000000123"), Some(1_700_000_000));
        assert_eq!(parse_time("2023-11-14"), Some(1_699_920_000));
        assert_eq!(parse_time("2023-11-14T00:00:00Z"), Some(1_699_920_000));
        assert_eq!(parse_time("2023-11-14 00:00:00"), Some(1_699_920_000));
        assert_eq!(parse_time("yesterday"), None);
        assert_eq!(parse_time(" "), None);
    }

    #[test]
    fn loads_rows_and_skips_broken_ones() {
        let dir = std::env::temp_dir().join(format!("sextant-csv-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("ohlc.csv");
        std::fs::write(
            &path,
            "Open_Time,Open,High,Low,Close,Volume\n\
             1700000000,10,12,9,11,100\n\
             1700086400,11,13,10,12.5,\n\
             1700172800,bad,13,10,12,50\n",
        )
        .unwrap();
        let rows = load_ohlc_csv(&path).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].close, 11.0);
        assert_eq!(rows[1].volume, 0.0);
        std::fs::remove_dir_all(&dir).ok();
    }
}
