// End-to-end evaluation scenarios
//
// Records → analyze → gate, with record sets shaped like real signature
// extractor output (mixed archetypes, partial overlap between variants).

use super::*;
use crate::error::EvalError;
use crate::records::{OutcomeRecord, RecordBatch};

/// `n` records where the first `baseline` are baseline-correct and the first
/// `enhanced` are enhanced-correct
fn paired(n: usize, baseline: usize, enhanced: usize) -> Vec<OutcomeRecord> {
    (0..n)
        .map(|i| OutcomeRecord::new(format!("pos-{i}"), i < baseline, i < enhanced))
        .collect()
}

fn tagged(category: &str, outcomes: &[(bool, bool)]) -> Vec<OutcomeRecord> {
    outcomes
        .iter()
        .enumerate()
        .map(|(i, &(b, e))| {
            OutcomeRecord::new(format!("{category}-{i}"), b, e)
                .with_category(category)
                .with_features(0.5, 2.0)
        })
        .collect()
}

/// Scenario: n=100, 50 vs 70 correct
///
/// pPool = 0.6, SE ≈ 0.0693, z ≈ 2.886, p ≈ 0.0039
#[test]
fn test_significant_twenty_point_gain() {
    let result = analyze(&paired(100, 50, 70)).unwrap();

    assert_eq!(result.improvement, 20.0);
    assert!((result.statistics.z - 2.886).abs() < 1e-3);
    assert!((result.statistics.p_value - 0.0039).abs() < 1e-4);
    assert!(result.statistics.significant);
}

/// Scenario: n=100, 61 vs 61 correct
#[test]
fn test_identical_accuracy_is_not_significant() {
    let result = analyze(&paired(100, 61, 61)).unwrap();

    assert_eq!(result.improvement, 0.0);
    assert_eq!(result.statistics.z, 0.0);
    assert!((result.statistics.p_value - 1.0).abs() < 1e-9);
    assert!(!result.statistics.significant);
}

/// Scenario: one category below the floor, one above
#[test]
fn test_only_categories_with_three_or_more_records_reported() {
    let mut records = tagged("minority_attack", &[(true, true), (false, true)]);
    records.extend(tagged(
        "isolated_queen_pawn",
        &[(true, true), (false, true), (false, false), (true, true), (false, true)],
    ));

    let result = analyze(&records).unwrap();
    assert_eq!(result.categories.len(), 1);
    assert_eq!(result.categories[0].category, "isolated_queen_pawn");
    assert_eq!(result.categories[0].improvement, 40.0);
}

/// Scenario: empty record list
#[test]
fn test_empty_records_never_produce_a_result() {
    assert!(matches!(
        analyze(&[]),
        Err(EvalError::EmptyDataset { skipped: 0 })
    ));
}

/// A strong, well-sampled improvement passes every gate check
#[test]
fn test_strong_improvement_is_ready() {
    // 60% → 80% on 150 positions
    let result = analyze(&paired(150, 90, 120)).unwrap();
    let report = check_readiness(&result);

    assert!(result.statistics.significant);
    assert!(report.ready, "{}", report.to_report_string());
}

/// Same effect on too few positions is blocked by sample size alone
#[test]
fn test_small_sample_blocks_readiness() {
    // 60% → 80% on 80 positions
    let result = analyze(&paired(80, 48, 64)).unwrap();
    let report = check_readiness(&result);

    assert!(!report.ready);
    let failing: Vec<&str> = report.failing().map(|c| c.name.as_str()).collect();
    assert_eq!(failing, vec![CHECK_SAMPLE_SIZE]);
}

/// Improvement below the relative target blocks readiness
#[test]
fn test_modest_improvement_is_not_ready() {
    // 70% → 80%: absolute target met, relative target missed
    let result = analyze(&paired(400, 280, 320)).unwrap();
    let report = check_readiness(&result);

    assert!(!report.ready);
    assert!(!report.check(CHECK_IMPROVEMENT).unwrap().pass);
    assert!(report.check(CHECK_ENHANCED_ACCURACY).unwrap().pass);
}

/// Breakdown cells always account for every analyzed record
#[test]
fn test_breakdown_sums_to_total() {
    let mut records = tagged(
        "fortress",
        &[(true, false), (true, true), (false, false), (false, true)],
    );
    records.extend(tagged("king_hunt", &[(false, true), (false, true), (true, true)]));
    records.push(OutcomeRecord::new("untagged", true, false));

    let result = analyze(&records).unwrap();
    assert_eq!(result.breakdown.total(), result.total);
    assert_eq!(result.total, 8);
    assert_eq!(result.breakdown.baseline_only, 2);
    assert_eq!(result.breakdown.enhanced_only, 3);
}

/// Malformed JSON entries are excluded and counted, not defaulted
#[test]
fn test_malformed_entries_do_not_sink_the_batch() {
    let json = r#"[
        {"id": "a", "baselineCorrect": true,  "enhancedCorrect": true,  "category": "iqp", "richness": 0.3, "complexity": 4.0},
        {"id": "b", "baselineCorrect": false, "enhancedCorrect": true,  "category": "iqp", "richness": 0.5, "complexity": 2.0},
        {"id": "c", "baselineCorrect": false, "enhancedCorrect": false, "category": "iqp", "richness": 0.7, "complexity": 0.0},
        {"id": "d", "baselineCorrect": null,  "enhancedCorrect": true,  "richness": 0.1, "complexity": 1.0},
        {"id": "e", "baselineCorrect": true,  "enhancedCorrect": true,  "richness": 7.0, "complexity": 1.0},
        42
    ]"#;

    let batch = RecordBatch::from_json_str(json).unwrap();
    let result = analyze_batch(&batch, &EvaluationConfig::default()).unwrap();

    assert_eq!(result.total, 3);
    assert_eq!(result.skipped, 3);
    assert!((result.mean_richness - 0.5).abs() < 1e-12);
    assert_eq!(result.categories[0].category, "iqp");
}

/// A batch with nothing usable is an empty dataset, reporting what was skipped
#[test]
fn test_all_malformed_batch_is_empty_dataset() {
    let batch = RecordBatch::from_json_str(r#"[{"id": "x"}, "junk"]"#).unwrap();
    match analyze_batch(&batch, &EvaluationConfig::default()) {
        Err(EvalError::EmptyDataset { skipped }) => assert_eq!(skipped, 2),
        other => panic!("Expected EmptyDataset, got {:?}", other),
    }
}

/// Paired diagnostic reflects the discordant cells
#[test]
fn test_paired_diagnostic_uses_discordant_pairs() {
    let result = analyze(&paired(100, 50, 70)).unwrap();
    assert_eq!(result.statistics.paired.discordant, 20);
    assert!(result.statistics.paired.p_value < 0.001);
}

/// Stricter configuration can flip significance and category visibility
#[test]
fn test_strict_config_changes_verdict() {
    // 50% → 62%: p ≈ 0.087
    let records = paired(100, 50, 62);

    let default = analyze(&records).unwrap();
    let permissive = analyze_with_config(&records, &EvaluationConfig::permissive()).unwrap();

    assert!(!default.statistics.significant);
    assert!(permissive.statistics.significant);
}

/// Accuracy intervals bracket the point estimates
#[test]
fn test_intervals_bracket_accuracy() {
    let result = analyze(&paired(120, 70, 95)).unwrap();
    let ci = result.statistics.enhanced_ci;

    let point = result.enhanced_accuracy / 100.0;
    assert!(ci.lower <= point && point <= ci.upper);
    assert!(ci.lower > 0.7 && ci.upper < 0.87);
}
