/// Nearest-rank percentile of an ascending slice.
///
/// `index = ceil(p / 100 * n) - 1`, clamped to `[0, n - 1]`. No interpolation
/// between ranks. Returns 0 for an empty slice.
pub fn nearest_rank(sorted: &[u64], p: f64) -> u64 {
    if sorted.is_empty() {
        return 0;
    }
    let idx = ((p / 100.0) * sorted.len() as f64).ceil() as usize;
    let idx = idx.saturating_sub(1).min(sorted.len() - 1);
    sorted[idx]
}
