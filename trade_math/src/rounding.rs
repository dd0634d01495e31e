//! Display rounding. Accumulators stay at full precision; only presented values
//! pass through here.

/// Round half away from zero to `decimals` places
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let scale = 10f64.powi(decimals as i32);
    (value * scale).round() / scale
}

/// Round to cents
pub fn round2(value: f64) -> f64 {
    round_to(value, 2)
}
