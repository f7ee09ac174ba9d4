//! A/B significance — two-proportion z-test with pooled variance.

use crate::stats::normal_cdf;
use insights_core::error::InsightsResult;
use insights_core::types::VariantSummary;
use serde::{Deserialize, Serialize};

/// p-values below this are reported as significant.
pub const SIGNIFICANCE_LEVEL: f64 = 0.05;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignificanceResult {
    pub p_value: f64,
    pub is_significant: bool,
    pub z_score: f64,
    pub rate_a: f64,
    pub rate_b: f64,
    pub pooled_rate: f64,
    pub standard_error: f64,
    /// Relative change of B over A. `None` when A never converted.
    pub relative_lift: Option<f64>,
}

impl SignificanceResult {
    /// Result used when the test cannot be evaluated.
    fn inconclusive(rate_a: f64, rate_b: f64, pooled_rate: f64) -> Self {
        Self {
            p_value: 1.0,
            is_significant: false,
            z_score: 0.0,
            rate_a,
            rate_b,
            pooled_rate,
            standard_error: 0.0,
            relative_lift: lift(rate_a, rate_b),
        }
    }
}

/// Compare the click rates of two variants. Rejects variants with more
/// clicks than sends.
pub fn evaluate(variant_a: &VariantSummary, variant_b: &VariantSummary) -> InsightsResult<SignificanceResult> {
    variant_a.validate()?;
    variant_b.validate()?;
    Ok(two_proportion_z_test(variant_a, variant_b))
}

fn two_proportion_z_test(a: &VariantSummary, b: &VariantSummary) -> SignificanceResult {
    let p1 = rate(a);
    let p2 = rate(b);
    // Summed in f64: two u64 counts can overflow.
    let total_sent = a.sent as f64 + b.sent as f64;
    let p = if total_sent > 0.0 {
        (a.clicks as f64 + b.clicks as f64) / total_sent
    } else {
        0.0
    };

    // An arm without sends cannot be compared; rates of any arm that did
    // send are still reported.
    if a.sent == 0 || b.sent == 0 {
        return SignificanceResult::inconclusive(p1, p2, p);
    }

    let se = (p * (1.0 - p) * (1.0 / a.sent as f64 + 1.0 / b.sent as f64)).sqrt();

    // No clicks anywhere, or every send clicked: variance is zero.
    if se == 0.0 || !se.is_finite() {
        return SignificanceResult::inconclusive(p1, p2, p);
    }

    let z = (p1 - p2).abs() / se;
    // erf(0) is only accurate to ~1e-9, so equal rates are pinned to 1.
    let p_value = if z == 0.0 {
        1.0
    } else {
        (2.0 * (1.0 - normal_cdf(z))).clamp(0.0, 1.0)
    };

    SignificanceResult {
        p_value,
        is_significant: p_value < SIGNIFICANCE_LEVEL,
        z_score: z,
        rate_a: p1,
        rate_b: p2,
        pooled_rate: p,
        standard_error: se,
        relative_lift: lift(p1, p2),
    }
}

fn rate(variant: &VariantSummary) -> f64 {
    if variant.sent > 0 {
        variant.clicks as f64 / variant.sent as f64
    } else {
        0.0
    }
}

fn lift(rate_a: f64, rate_b: f64) -> Option<f64> {
    if rate_a > 0.0 {
        Some((rate_b - rate_a) / rate_a)
    } else {
        None
    }
}
