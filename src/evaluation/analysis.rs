// Analysis engine: one record set in, one immutable AnalysisResult out
//
// Pure and deterministic. Calling analyze twice on the same records yields
// bit-identical results, which is what lets the auto-tuner recognise a
// replayed evaluation by fingerprint.

use crate::error::{EvalError, Result};
use crate::evaluation::archetype::{aggregate_with_min, CategoryImprovement};
use crate::evaluation::config::EvaluationConfig;
use crate::evaluation::statistics::{
    cohens_d, confidence_interval, mcnemar_test, significance_test_with_alpha,
    ConfidenceInterval, EffectSizeInterpretation, PairedTest,
};
use crate::records::{OutcomeRecord, RecordBatch};
use serde::{Deserialize, Serialize};
use std::hash::Hasher;

/// Agreement quadrant between the two classifiers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Breakdown {
    pub both_correct: usize,
    pub both_wrong: usize,
    pub baseline_only: usize,
    pub enhanced_only: usize,
}

impl Breakdown {
    /// Sum of all four cells; equals the analyzed record count
    pub fn total(&self) -> usize {
        self.both_correct + self.both_wrong + self.baseline_only + self.enhanced_only
    }

    fn record(&mut self, baseline_correct: bool, enhanced_correct: bool) {
        match (baseline_correct, enhanced_correct) {
            (true, true) => self.both_correct += 1,
            (false, false) => self.both_wrong += 1,
            (true, false) => self.baseline_only += 1,
            (false, true) => self.enhanced_only += 1,
        }
    }
}

/// Significance test, accuracy intervals, and the paired diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticsBlock {
    pub z: f64,
    pub p_value: f64,
    pub significant: bool,
    #[serde(rename = "baselineCI")]
    pub baseline_ci: ConfidenceInterval,
    #[serde(rename = "enhancedCI")]
    pub enhanced_ci: ConfidenceInterval,
    /// McNemar's test on the discordant pairs (advisory only)
    pub paired: PairedTest,
}

/// Result of comparing the baseline and enhanced classifiers
///
/// Field names are serialized in camelCase; downstream dashboards and
/// exporters depend on them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// Records analyzed
    pub total: usize,
    /// Malformed entries excluded before analysis
    pub skipped: usize,
    /// Percent
    pub baseline_accuracy: f64,
    /// Percent
    pub enhanced_accuracy: f64,
    /// `enhanced_accuracy - baseline_accuracy`, in percentage points
    pub improvement: f64,
    pub breakdown: Breakdown,
    /// Categories with enough records, best improvement first
    pub categories: Vec<CategoryImprovement>,
    pub mean_richness: f64,
    pub mean_complexity: f64,
    pub statistics: StatisticsBlock,
    /// Cohen's d
    pub effect_size: f64,
    pub effect_interpretation: EffectSizeInterpretation,
}

impl AnalysisResult {
    /// Deterministic 64-bit FNV-1a hash of the serialized result
    ///
    /// Identical record sets produce identical fingerprints.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = fnv::FnvHasher::default();
        match serde_json::to_vec(self) {
            Ok(bytes) => hasher.write(&bytes),
            // Not reached for plain data; serde_json writes non-finite floats as null
            Err(_) => hasher.write(format!("{:?}", self).as_bytes()),
        }
        hasher.finish()
    }

    /// Pretty JSON for report writers
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Generate human-readable report
    pub fn to_report_string(&self) -> String {
        let mut report = String::new();

        report.push_str(&format!(
            "Records analyzed: {} ({} skipped)\n",
            self.total, self.skipped
        ));
        report.push_str(&format!(
            "Baseline accuracy: {:.1}% (CI {:.1}%-{:.1}%)\n",
            self.baseline_accuracy,
            self.statistics.baseline_ci.lower * 100.0,
            self.statistics.baseline_ci.upper * 100.0
        ));
        report.push_str(&format!(
            "Enhanced accuracy: {:.1}% (CI {:.1}%-{:.1}%)\n",
            self.enhanced_accuracy,
            self.statistics.enhanced_ci.lower * 100.0,
            self.statistics.enhanced_ci.upper * 100.0
        ));
        report.push_str(&format!("Improvement: {:+.1} pp\n", self.improvement));
        report.push_str(&format!(
            "Significance: z={:.3}, p={:.4} ({})\n",
            self.statistics.z,
            self.statistics.p_value,
            if self.statistics.significant {
                "significant"
            } else {
                "not significant"
            }
        ));
        report.push_str(&format!(
            "Effect size: d={:.3} ({})\n",
            self.effect_size, self.effect_interpretation
        ));
        report.push_str(&format!(
            "Paired (McNemar): chi2={:.3}, p={:.4}, discordant={}\n",
            self.statistics.paired.chi_squared,
            self.statistics.paired.p_value,
            self.statistics.paired.discordant
        ));
        report.push_str(&format!(
            "Breakdown: both correct {}, both wrong {}, baseline only {}, enhanced only {}\n",
            self.breakdown.both_correct,
            self.breakdown.both_wrong,
            self.breakdown.baseline_only,
            self.breakdown.enhanced_only
        ));

        if !self.categories.is_empty() {
            report.push_str("\nCategories:\n");
            for category in &self.categories {
                report.push_str(&format!(
                    "  {} (n={}): {:.1}% -> {:.1}% ({:+.1} pp)\n",
                    category.category,
                    category.count,
                    category.baseline_accuracy,
                    category.enhanced_accuracy,
                    category.improvement
                ));
            }
        }

        report
    }
}

/// Analyze with the default configuration
///
/// # Example
/// ```
/// use ascenso::evaluation::analyze;
/// use ascenso::records::OutcomeRecord;
///
/// let records: Vec<OutcomeRecord> = (0..10)
///     .map(|i| OutcomeRecord::new(i.to_string(), i % 2 == 0, i % 5 != 0))
///     .collect();
///
/// let result = analyze(&records).unwrap();
/// assert_eq!(result.total, 10);
/// assert_eq!(result.breakdown.total(), 10);
/// ```
pub fn analyze(records: &[OutcomeRecord]) -> Result<AnalysisResult> {
    analyze_with_config(records, &EvaluationConfig::default())
}

/// Analyze a decoded batch, carrying its skipped count into the result
pub fn analyze_batch(batch: &RecordBatch, config: &EvaluationConfig) -> Result<AnalysisResult> {
    analyze_records(&batch.records, batch.skipped, config)
}

/// Analyze paired outcome records
///
/// Records failing validation are skipped and counted. Fails with
/// [`EvalError::EmptyDataset`] when nothing usable remains.
pub fn analyze_with_config(
    records: &[OutcomeRecord],
    config: &EvaluationConfig,
) -> Result<AnalysisResult> {
    analyze_records(records, 0, config)
}

fn analyze_records(
    records: &[OutcomeRecord],
    already_skipped: usize,
    config: &EvaluationConfig,
) -> Result<AnalysisResult> {
    config.validate()?;

    let mut skipped = already_skipped;
    let mut usable: Vec<&OutcomeRecord> = Vec::with_capacity(records.len());
    for record in records {
        match record.validate() {
            Ok(()) => usable.push(record),
            Err(reason) => {
                tracing::warn!("Skipping malformed record: {}", reason);
                skipped += 1;
            }
        }
    }

    if usable.is_empty() {
        return Err(EvalError::EmptyDataset { skipped });
    }

    let mut breakdown = Breakdown::default();
    let mut richness_sum = 0.0;
    // Complexity is unbounded above; a running mean cannot overflow
    let mut mean_complexity = 0.0;
    for (seen, record) in usable.iter().enumerate() {
        breakdown.record(record.baseline_correct, record.enhanced_correct);
        richness_sum += record.richness;
        mean_complexity += (record.complexity - mean_complexity) / (seen + 1) as f64;
    }

    let total = usable.len();
    let n = total as u64;
    let baseline_successes = (breakdown.both_correct + breakdown.baseline_only) as u64;
    let enhanced_successes = (breakdown.both_correct + breakdown.enhanced_only) as u64;

    // Multiply first so whole percentages stay exact
    let baseline_accuracy = baseline_successes as f64 * 100.0 / total as f64;
    let enhanced_accuracy = enhanced_successes as f64 * 100.0 / total as f64;

    let test = significance_test_with_alpha(
        baseline_successes,
        enhanced_successes,
        n,
        config.significance_level,
    );

    let statistics = StatisticsBlock {
        z: test.z,
        p_value: test.p_value,
        significant: test.significant,
        baseline_ci: confidence_interval(baseline_successes, n, config.confidence_level),
        enhanced_ci: confidence_interval(enhanced_successes, n, config.confidence_level),
        paired: mcnemar_test(
            breakdown.baseline_only as u64,
            breakdown.enhanced_only as u64,
        ),
    };

    let baseline_variance = baseline_accuracy * (100.0 - baseline_accuracy) / 100.0;
    let enhanced_variance = enhanced_accuracy * (100.0 - enhanced_accuracy) / 100.0;
    let effect_size = cohens_d(
        baseline_accuracy,
        enhanced_accuracy,
        baseline_variance,
        enhanced_variance,
    );

    let categories = aggregate_with_min(usable.iter().copied(), config.min_category_count);

    let result = AnalysisResult {
        total,
        skipped,
        baseline_accuracy,
        enhanced_accuracy,
        improvement: enhanced_accuracy - baseline_accuracy,
        breakdown,
        categories,
        mean_richness: richness_sum / total as f64,
        mean_complexity,
        statistics,
        effect_size,
        effect_interpretation: EffectSizeInterpretation::from_d(effect_size),
    };

    tracing::debug!(
        total = result.total,
        skipped = result.skipped,
        improvement = result.improvement,
        p_value = result.statistics.p_value,
        "Analysis complete"
    );

    Ok(result)
}
