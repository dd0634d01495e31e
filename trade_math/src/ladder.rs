//! Ladder geometry for laddered limit orders
//!
//! A ladder is a schedule of limit prices spaced by a fixed percentage step. Buy
//! ladders descend from an anchor price, sell ladders ascend from it. The step
//! count solve answers "how many rungs lie between these two prices" and is the
//! only place a logarithm is taken, so every guard against NaN or infinity lives
//! here.

use serde::{Deserialize, Serialize};

/// Direction a ladder walks away from its anchor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LadderSide {
    /// Rungs below the anchor: `anchor * (1 - gap)^step`
    Buy,
    /// Rungs above the anchor: `anchor * (1 + gap)^step`
    Sell,
}

/// Solve the integer number of `gap` steps separating `reference` from `target`.
///
/// Computes `floor(ln(target / reference) / ln(1 + gap))`.
///
/// Preconditions, each returning zero when violated:
/// * `held_shares > 0` (a ladder only exists around an open position)
/// * `reference` is finite and positive
/// * `target / reference` is finite and positive
/// * `gap` is finite and positive
///
/// A negative solve (target below reference) also clamps to zero.
///
/// # Examples
///
/// ```
/// use trade_math::ladder_step_count;
///
/// // 100 -> 125 spans two full 10% steps
/// assert_eq!(ladder_step_count(125.0, 100.0, 0.1, 10), 2);
/// // no position, no ladder
/// assert_eq!(ladder_step_count(125.0, 100.0, 0.1, 0), 0);
/// ```
pub fn ladder_step_count(target: f64, reference: f64, gap: f64, held_shares: u64) -> u64 {
    if held_shares == 0 {
        return 0;
    }
    if !reference.is_finite() || reference <= 0.0 {
        return 0;
    }
    if !gap.is_finite() || gap <= 0.0 {
        return 0;
    }

    let ratio = target / reference;
    if !ratio.is_finite() || ratio <= 0.0 {
        return 0;
    }

    let steps = (ratio.ln() / (1.0 + gap).ln()).floor();
    if !steps.is_finite() || steps < 0.0 {
        return 0;
    }

    steps as u64
}

/// Price of rung `step` of a ladder anchored at `anchor`
pub fn ladder_price(anchor: f64, gap: f64, step: u64, side: LadderSide) -> f64 {
    let factor = match side {
        LadderSide::Buy => 1.0 - gap,
        LadderSide::Sell => 1.0 + gap,
    };
    anchor * factor.powf(step as f64)
}

/// Average fill price of `count` rungs that follow the first `skip` rungs.
///
/// The fill is approximated by the arithmetic mean of the first and last rung
/// filled: rung `skip + 1` and rung `skip + count`. Returns `None` when no rung
/// is filled.
pub fn ladder_mean_price(
    anchor: f64,
    gap: f64,
    skip: u64,
    count: u64,
    side: LadderSide,
) -> Option<f64> {
    if count == 0 {
        return None;
    }
    let first = ladder_price(anchor, gap, skip + 1, side);
    let last = ladder_price(anchor, gap, skip + count, side);
    Some((first + last) / 2.0)
}
