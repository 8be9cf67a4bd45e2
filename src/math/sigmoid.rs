//! The logistic sigmoid used throughout the halo models.
//!
//! Every smooth transition in this crate — halo mass growth in log-time, the
//! median transition time vs. halo mass, the dwarf/cluster scatter blend, and
//! the post-quenching suppression — is the same four-parameter curve:
//!
//! `sigmoid(x, x0, k, ymin, ymax) = ymin + (ymax - ymin) / (1 + exp(-k (x - x0)))`
//!
//! Numerical notes:
//! - For `k (x - x0) << 0` the exponential overflows to `+inf`; IEEE division
//!   then yields exactly `ymin`, so no explicit clamping is needed.
//! - The curve is strictly monotonic in `x` whenever `k != 0` and
//!   `ymin != ymax`, which is what the MAH generator's monotonicity invariant
//!   rests on.

/// Evaluate the four-parameter logistic sigmoid.
///
/// Increasing from `ymin` to `ymax` when `k > 0` and `ymax > ymin`;
/// decreasing when the height is inverted (`ymax < ymin`).
pub fn sigmoid(x: f64, x0: f64, k: f64, ymin: f64, ymax: f64) -> f64 {
    ymin + (ymax - ymin) / (1.0 + (-k * (x - x0)).exp())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sigmoid_midpoint_and_limits() {
        let mid = sigmoid(2.0, 2.0, 5.0, -1.0, 3.0);
        assert!((mid - 1.0).abs() < 1e-12, "midpoint should be (ymin+ymax)/2, got {mid}");

        let lo = sigmoid(-1e3, 2.0, 5.0, -1.0, 3.0);
        let hi = sigmoid(1e3, 2.0, 5.0, -1.0, 3.0);
        assert!((lo - -1.0).abs() < 1e-12);
        assert!((hi - 3.0).abs() < 1e-12);
    }

    #[test]
    fn sigmoid_strictly_increasing_for_positive_k() {
        let mut prev = sigmoid(-5.0, 0.0, 2.0, 0.0, 1.0);
        for i in 1..100 {
            let x = -5.0 + i as f64 * 0.1;
            let y = sigmoid(x, 0.0, 2.0, 0.0, 1.0);
            assert!(y > prev, "not increasing at x={x}");
            prev = y;
        }
    }

    #[test]
    fn sigmoid_inverted_height_decreases() {
        let early = sigmoid(0.0, 5.0, 3.0, 1.0, 0.01);
        let late = sigmoid(10.0, 5.0, 3.0, 1.0, 0.01);
        assert!(early > 0.99);
        assert!(late < 0.02);
    }
}
