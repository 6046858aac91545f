/// Round to `decimals` places and normalize `-0.0` to `0.0`.
///
/// Rounding is decided on the exact decimal expansion of the binary
/// value (fixed-precision formatting), not on `value * 10^n`.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let decimals = decimals as usize;
    let rounded = format!("{value:.decimals$}").parse::<f64>().unwrap_or(value);
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// Signed difference `a - b`, rounded; `None` if either side is missing.
pub fn height_diff(a: Option<f64>, b: Option<f64>, decimals: u32) -> Option<f64> {
    match (a, b) {
        (Some(a), Some(b)) => Some(round_to(a - b, decimals)),
        _ => None,
    }
}
