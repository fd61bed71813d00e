// Statistical functions for comparing the baseline and enhanced classifiers
//
// - Pooled two-proportion z-test with a two-tailed p-value
// - Normal-approximation (Wald) confidence interval for one accuracy
// - Cohen's d from two means and variances
// - McNemar's test on discordant pairs (advisory, paired design)
//
// Degenerate inputs (no samples, zero variance) resolve to neutral values
// instead of errors, so callers never special-case them.
//
// Normal tail and quantile come from statrs.

use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};
use std::fmt;

/// Significance level used by [`significance_test`]
pub const DEFAULT_ALPHA: f64 = 0.05;

/// Outcome of the pooled two-proportion z-test
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignificanceTest {
    /// z statistic, positive when enhanced beats baseline
    pub z: f64,

    /// Two-tailed p-value under H0: both variants have the same accuracy
    pub p_value: f64,

    /// `p_value < alpha`
    pub significant: bool,
}

impl SignificanceTest {
    /// No detectable effect
    pub fn neutral() -> Self {
        Self {
            z: 0.0,
            p_value: 1.0,
            significant: false,
        }
    }
}

/// Confidence interval for a single proportion, clamped to `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    pub lower: f64,
    pub upper: f64,
}

impl ConfidenceInterval {
    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }

    pub fn contains(&self, value: f64) -> bool {
        (self.lower..=self.upper).contains(&value)
    }
}

/// McNemar's test over discordant pairs
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairedTest {
    /// χ² with continuity correction (df = 1)
    pub chi_squared: f64,
    pub p_value: f64,
    /// Events where exactly one variant was correct
    pub discordant: u64,
}

/// Cohen's magnitude conventions for an effect size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EffectSizeInterpretation {
    Negligible,
    Small,
    Medium,
    Large,
}

impl EffectSizeInterpretation {
    /// Classify |d| against 0.2 / 0.5 / 0.8
    pub fn from_d(d: f64) -> Self {
        let magnitude = d.abs();
        if magnitude < 0.2 {
            Self::Negligible
        } else if magnitude < 0.5 {
            Self::Small
        } else if magnitude < 0.8 {
            Self::Medium
        } else {
            Self::Large
        }
    }
}

impl fmt::Display for EffectSizeInterpretation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Negligible => "negligible",
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
        };
        f.write_str(label)
    }
}

/// Pooled two-proportion z-test at the default 5% level
///
/// Both variants classified the same `n` events.
///
/// # Example
/// ```
/// use ascenso::evaluation::significance_test;
///
/// let test = significance_test(50, 70, 100);
/// assert!((test.z - 2.886).abs() < 0.001);
/// assert!(test.significant);
/// ```
pub fn significance_test(
    baseline_successes: u64,
    enhanced_successes: u64,
    n: u64,
) -> SignificanceTest {
    significance_test_with_alpha(baseline_successes, enhanced_successes, n, DEFAULT_ALPHA)
}

/// Pooled two-proportion z-test at an explicit significance level
pub fn significance_test_with_alpha(
    baseline_successes: u64,
    enhanced_successes: u64,
    n: u64,
    alpha: f64,
) -> SignificanceTest {
    debug_assert!(baseline_successes <= n && enhanced_successes <= n);

    if n == 0 {
        return SignificanceTest::neutral();
    }

    let total = n as f64;
    let p_baseline = baseline_successes.min(n) as f64 / total;
    let p_enhanced = enhanced_successes.min(n) as f64 / total;
    let p_pool = (p_baseline + p_enhanced) / 2.0;

    let se = (p_pool * (1.0 - p_pool) * (2.0 / total)).sqrt();
    if !(se > 0.0) || !se.is_finite() {
        // Pooled proportion is 0 or 1: no variation to test against
        return SignificanceTest::neutral();
    }

    let z = (p_enhanced - p_baseline) / se;
    let p_value = two_tailed_p_value(z);

    SignificanceTest {
        z,
        p_value,
        significant: p_value < alpha,
    }
}

/// Normal-approximation confidence interval for `successes / n`
///
/// `n == 0` yields `[0, 0]`.
pub fn confidence_interval(successes: u64, n: u64, confidence: f64) -> ConfidenceInterval {
    if n == 0 {
        return ConfidenceInterval {
            lower: 0.0,
            upper: 0.0,
        };
    }

    let p_hat = successes.min(n) as f64 / n as f64;
    let z_crit = critical_value(confidence);
    let margin = z_crit * (p_hat * (1.0 - p_hat) / n as f64).sqrt();

    ConfidenceInterval {
        lower: (p_hat - margin).clamp(0.0, p_hat),
        upper: (p_hat + margin).clamp(p_hat, 1.0),
    }
}

/// Cohen's d for `b` relative to `a`
///
/// Uses the pooled SD `sqrt((var_a + var_b) / 2)`; a zero (or invalid)
/// pooled SD gives 0.
pub fn cohens_d(mean_a: f64, mean_b: f64, var_a: f64, var_b: f64) -> f64 {
    let pooled_sd = ((var_a + var_b) / 2.0).sqrt();
    if !(pooled_sd > 0.0) || !pooled_sd.is_finite() {
        return 0.0;
    }

    (mean_b - mean_a) / pooled_sd
}

/// McNemar's test with continuity correction
///
/// `baseline_only` / `enhanced_only` are the discordant counts: events only
/// one of the variants classified correctly.
pub fn mcnemar_test(baseline_only: u64, enhanced_only: u64) -> PairedTest {
    let discordant = baseline_only + enhanced_only;
    if discordant == 0 {
        return PairedTest {
            chi_squared: 0.0,
            p_value: 1.0,
            discordant,
        };
    }

    let diff = (enhanced_only as f64 - baseline_only as f64).abs();
    let corrected = (diff - 1.0).max(0.0);
    let chi_squared = corrected * corrected / discordant as f64;

    // χ²(1) upper tail is the two-sided normal tail at sqrt(χ²)
    PairedTest {
        chi_squared,
        p_value: two_tailed_p_value(chi_squared.sqrt()),
        discordant,
    }
}

/// Two-tailed p-value for a standard normal statistic
pub fn two_tailed_p_value(z: f64) -> f64 {
    if z == 0.0 || z.is_nan() {
        return 1.0;
    }
    (2.0 * Normal::standard().sf(z.abs())).clamp(0.0, 1.0)
}

/// Standard normal CDF
pub fn normal_cdf(x: f64) -> f64 {
    Normal::standard().cdf(x)
}

/// Two-sided critical value for a confidence level, e.g. 0.95 → 1.96
pub fn critical_value(confidence: f64) -> f64 {
    let confidence = confidence.clamp(1e-9, 1.0 - 1e-9);
    Normal::standard().inverse_cdf(1.0 - (1.0 - confidence) / 2.0)
}
