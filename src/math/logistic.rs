//! Stable logistic (sigmoid) evaluation.
//!
//! The classifier produces a log-odds score `z`; the churn probability is
//! `σ(z) = 1 / (1 + exp(-z))`.
//!
//! Numerical notes:
//! - For large negative `z`, the naive form computes `1 / (1 + huge)` and can
//!   overflow `exp(-z)` to infinity (fine) or, worse, lose the tiny result to
//!   rounding. We branch on the sign and evaluate `exp(z) / (1 + exp(z))` for
//!   `z < 0` so the exponential argument is always non-positive.
//! - The output is clamped to `[0, 1]` by construction; no post-clamp needed.

/// Compute `σ(z)` in a numerically stable way.
pub fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sigmoid_midpoint_and_symmetry() {
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-15);
        for &z in &[0.1, 0.5, 1.0, 3.0, 10.0] {
            let s = sigmoid(z) + sigmoid(-z);
            assert!((s - 1.0).abs() < 1e-12, "σ(z)+σ(-z) should be 1, got {s}");
        }
    }

    #[test]
    fn sigmoid_saturates_without_nan() {
        let hi = sigmoid(1000.0);
        let lo = sigmoid(-1000.0);
        assert!(hi.is_finite() && (hi - 1.0).abs() < 1e-12);
        assert!(lo.is_finite() && lo >= 0.0 && lo < 1e-12);
    }

    #[test]
    fn sigmoid_is_monotone() {
        let mut prev = sigmoid(-20.0);
        for i in -19..=20 {
            let cur = sigmoid(i as f64);
            assert!(cur > prev, "σ must be strictly increasing");
            prev = cur;
        }
    }
}
