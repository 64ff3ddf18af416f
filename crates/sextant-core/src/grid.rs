// File: crates/sextant-core/src/grid.rs
// Summary: Simple grid/tick layout helpers.

pub fn linspace(start: f64, end: f64, steps: usize) -> Vec<f64> {
    if steps < 2 { return vec![start, end]; }
    let step = (end - start) / (steps as f64 - 1.0);
    (0..steps).map(|i| start + step * i as f64).collect()
}

/// Pick at most `max` indices out of `0..n`, evenly spread, always keeping the
/// first and last index when more than one label fits.
pub fn subsample_indices(n: usize, max: usize) -> Vec<usize> {
    if n == 0 || max == 0 { return Vec::new(); }
    if n <= max { return (0..n).collect(); }
    if max == 1 { return vec![0]; }
    let last = (n - 1) as f64;
    let mut out: Vec<usize> = (0..max)
        .map(|i| ((i as f64) * last / (max - 1) as f64).round() as usize)
        .collect();
    out.dedup();
    out
}
