// Deployment gate: five independent promotion checks
//
// Readiness is advisory. Nothing here deploys; the auto-tuner combines a
// ready report with the auto-deploy policy before asking for a deployment.

use crate::evaluation::analysis::AnalysisResult;
use crate::evaluation::config::GateThresholds;
use serde::{Deserialize, Serialize};

pub const CHECK_SAMPLE_SIZE: &str = "sample_size";
pub const CHECK_SIGNIFICANCE: &str = "significance";
pub const CHECK_ENHANCED_ACCURACY: &str = "enhanced_accuracy";
pub const CHECK_IMPROVEMENT: &str = "improvement";
pub const CHECK_EFFECT_SIZE: &str = "effect_size";

/// One named gate criterion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateCheck {
    pub name: String,
    pub pass: bool,
    /// What was measured against what was required
    pub detail: String,
}

/// Outcome of all five checks; `ready` is their conjunction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadinessReport {
    pub ready: bool,
    pub checks: Vec<GateCheck>,
}

impl ReadinessReport {
    /// Checks that did not pass, in gate order
    pub fn failing(&self) -> impl Iterator<Item = &GateCheck> {
        self.checks.iter().filter(|check| !check.pass)
    }

    /// Look up a check by name
    pub fn check(&self, name: &str) -> Option<&GateCheck> {
        self.checks.iter().find(|check| check.name == name)
    }

    /// Generate human-readable report
    pub fn to_report_string(&self) -> String {
        let mut report = String::new();

        if self.ready {
            report.push_str("READY TO DEPLOY\n\n");
        } else {
            report.push_str(&format!(
                "NOT READY ({} of {} checks failing)\n\n",
                self.failing().count(),
                self.checks.len()
            ));
        }

        for check in &self.checks {
            report.push_str(&format!(
                "  [{}] {}: {}\n",
                if check.pass { "PASS" } else { "FAIL" },
                check.name,
                check.detail
            ));
        }

        report
    }
}

/// Evaluate the gate with the default thresholds
pub fn check_readiness(result: &AnalysisResult) -> ReadinessReport {
    check_readiness_with(result, &GateThresholds::default())
}

/// Evaluate the gate against explicit thresholds
///
/// # Example
/// ```
/// use ascenso::evaluation::{analyze, check_readiness};
/// use ascenso::records::OutcomeRecord;
///
/// let records: Vec<OutcomeRecord> = (0..40)
///     .map(|i| OutcomeRecord::new(i.to_string(), i < 20, i < 30))
///     .collect();
/// let report = check_readiness(&analyze(&records).unwrap());
///
/// // 40 records is below the 100 sample floor
/// assert!(!report.ready);
/// assert!(!report.check("sample_size").unwrap().pass);
/// ```
pub fn check_readiness_with(
    result: &AnalysisResult,
    thresholds: &GateThresholds,
) -> ReadinessReport {
    let checks = vec![
        GateCheck {
            name: CHECK_SAMPLE_SIZE.to_string(),
            pass: result.total >= thresholds.min_sample_size,
            detail: format!(
                "{} records (need >= {})",
                result.total, thresholds.min_sample_size
            ),
        },
        GateCheck {
            name: CHECK_SIGNIFICANCE.to_string(),
            pass: result.statistics.significant,
            detail: format!("p={:.4}", result.statistics.p_value),
        },
        GateCheck {
            name: CHECK_ENHANCED_ACCURACY.to_string(),
            pass: result.enhanced_accuracy >= thresholds.min_enhanced_accuracy,
            detail: format!(
                "{:.1}% (need >= {:.1}%)",
                result.enhanced_accuracy, thresholds.min_enhanced_accuracy
            ),
        },
        GateCheck {
            name: CHECK_IMPROVEMENT.to_string(),
            pass: result.improvement >= thresholds.min_improvement,
            detail: format!(
                "{:+.1} pp (need >= {:.1})",
                result.improvement, thresholds.min_improvement
            ),
        },
        GateCheck {
            name: CHECK_EFFECT_SIZE.to_string(),
            pass: result.effect_size.abs() >= thresholds.min_effect_size,
            detail: format!(
                "|d|={:.3} (need >= {:.2})",
                result.effect_size.abs(),
                thresholds.min_effect_size
            ),
        },
    ];

    ReadinessReport {
        ready: checks.iter().all(|check| check.pass),
        checks,
    }
}
