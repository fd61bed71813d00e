// Configuration for baseline vs enhanced evaluation
//
// Significance level, interval confidence, category sample floor, and the
// five deployment gate thresholds. Everything has a default so an empty
// [evaluation] table in a settings file is valid.

use crate::error::{EvalError, Result};
use serde::{Deserialize, Serialize};

/// Thresholds for the deployment gate
///
/// All five must hold for the enhanced variant to be considered ready.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateThresholds {
    /// Minimum number of analyzed records
    pub min_sample_size: usize,

    /// Minimum enhanced accuracy, in percent (absolute target)
    pub min_enhanced_accuracy: f64,

    /// Minimum improvement over baseline, in percentage points (relative target)
    pub min_improvement: f64,

    /// Minimum |Cohen's d|
    ///
    /// 0.5 is a "medium" effect by Cohen's convention.
    pub min_effect_size: f64,
}

impl Default for GateThresholds {
    fn default() -> Self {
        Self {
            min_sample_size: 100,
            min_enhanced_accuracy: 76.0,
            min_improvement: 15.0,
            min_effect_size: 0.5,
        }
    }
}

/// Configuration for the analysis engine and deployment gate
///
/// # Example
/// ```
/// use ascenso::evaluation::EvaluationConfig;
///
/// let config = EvaluationConfig::default();
/// assert_eq!(config.significance_level, 0.05); // 95% confidence
/// assert_eq!(config.min_category_count, 3);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    /// Statistical significance level (alpha) for the two-proportion z-test
    ///
    /// - 0.05 (default): 95% confidence level
    /// - 0.01: stricter, fewer false promotions
    /// - 0.10: looser, more false promotions
    pub significance_level: f64,

    /// Confidence level for the per-variant accuracy intervals
    pub confidence_level: f64,

    /// Categories with fewer records than this are left out of the breakdown
    pub min_category_count: usize,

    /// Deployment gate thresholds
    pub gate: GateThresholds,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            significance_level: 0.05,
            confidence_level: 0.95,
            min_category_count: 3,
            gate: GateThresholds::default(),
        }
    }
}

impl EvaluationConfig {
    /// Create a strict configuration (fewer false promotions)
    pub fn strict() -> Self {
        Self {
            significance_level: 0.01,
            confidence_level: 0.99,
            min_category_count: 10,
            gate: GateThresholds {
                min_sample_size: 500,
                min_effect_size: 0.8,
                ..GateThresholds::default()
            },
        }
    }

    /// Create a permissive configuration for early experiments
    pub fn permissive() -> Self {
        Self {
            significance_level: 0.10,
            confidence_level: 0.90,
            min_category_count: 3,
            gate: GateThresholds {
                min_sample_size: 50,
                min_effect_size: 0.2,
                ..GateThresholds::default()
            },
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if !(self.significance_level > 0.0 && self.significance_level < 1.0) {
            return Err(EvalError::InvalidConfig(format!(
                "significance_level must be in (0, 1), got {}",
                self.significance_level
            )));
        }

        if !(self.confidence_level > 0.0 && self.confidence_level < 1.0) {
            return Err(EvalError::InvalidConfig(format!(
                "confidence_level must be in (0, 1), got {}",
                self.confidence_level
            )));
        }

        if self.min_category_count == 0 {
            return Err(EvalError::InvalidConfig(
                "min_category_count must be >= 1".to_string(),
            ));
        }

        if !(0.0..=100.0).contains(&self.gate.min_enhanced_accuracy) {
            return Err(EvalError::InvalidConfig(format!(
                "gate.min_enhanced_accuracy must be a percentage, got {}",
                self.gate.min_enhanced_accuracy
            )));
        }

        if self.gate.min_effect_size < 0.0 {
            return Err(EvalError::InvalidConfig(format!(
                "gate.min_effect_size must be non-negative, got {}",
                self.gate.min_effect_size
            )));
        }

        Ok(())
    }
}
