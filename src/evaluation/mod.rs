// Baseline vs Enhanced Classifier Evaluation
//
// Two classifiers label the same stream of events. This module decides
// whether the enhanced one is a real improvement:
//
// - statistics: pooled two-proportion z-test, Wald intervals, Cohen's d,
//   McNemar's paired diagnostic
// - archetype: per-category accuracy deltas with a minimum sample floor
// - analysis: one immutable AnalysisResult per record set
// - gate: the five deployment readiness checks
//
// Every function here is pure and synchronous; none of it touches the
// tuning state.

mod analysis;
mod archetype;
mod config;
mod gate;
mod statistics;

pub use analysis::{
    analyze, analyze_batch, analyze_with_config, AnalysisResult, Breakdown, StatisticsBlock,
};
pub use archetype::{aggregate, aggregate_with_min, CategoryImprovement, MIN_CATEGORY_COUNT};
pub use config::{EvaluationConfig, GateThresholds};
pub use gate::{
    check_readiness, check_readiness_with, GateCheck, ReadinessReport, CHECK_EFFECT_SIZE,
    CHECK_ENHANCED_ACCURACY, CHECK_IMPROVEMENT, CHECK_SAMPLE_SIZE, CHECK_SIGNIFICANCE,
};
pub use statistics::{
    cohens_d, confidence_interval, critical_value, mcnemar_test, normal_cdf, significance_test,
    significance_test_with_alpha, two_tailed_p_value, ConfidenceInterval,
    EffectSizeInterpretation, PairedTest, SignificanceTest, DEFAULT_ALPHA,
};

#[cfg(test)]
mod tests;
