// Per-category (archetype) accuracy breakdown
//
// Groups paired outcomes by category label and reports how much the enhanced
// classifier moved accuracy inside each group. Groups below the sample floor
// are dropped: two or three positions say nothing about an archetype.

use crate::records::OutcomeRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Minimum records a category needs to be reported
pub const MIN_CATEGORY_COUNT: usize = 3;

/// Accuracy comparison for one category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryImprovement {
    pub category: String,
    pub count: usize,
    /// Percent
    pub baseline_accuracy: f64,
    /// Percent
    pub enhanced_accuracy: f64,
    /// Enhanced minus baseline, in percentage points
    pub improvement: f64,
}

#[derive(Default)]
struct Tally {
    count: usize,
    baseline_correct: usize,
    enhanced_correct: usize,
}

/// Aggregate with the default floor of [`MIN_CATEGORY_COUNT`]
pub fn aggregate(records: &[OutcomeRecord]) -> Vec<CategoryImprovement> {
    aggregate_with_min(records, MIN_CATEGORY_COUNT)
}

/// Aggregate by category, keeping groups with at least `min_count` records
///
/// Sorted by improvement (descending), ties by category name (ascending).
pub fn aggregate_with_min<'a>(
    records: impl IntoIterator<Item = &'a OutcomeRecord>,
    min_count: usize,
) -> Vec<CategoryImprovement> {
    let mut tallies: BTreeMap<&'a str, Tally> = BTreeMap::new();

    for record in records {
        let tally = tallies.entry(record.category_label()).or_default();
        tally.count += 1;
        tally.baseline_correct += usize::from(record.baseline_correct);
        tally.enhanced_correct += usize::from(record.enhanced_correct);
    }

    let mut categories: Vec<CategoryImprovement> = tallies
        .into_iter()
        .filter(|(_, tally)| tally.count >= min_count)
        .map(|(category, tally)| {
            let count = tally.count as f64;
            CategoryImprovement {
                category: category.to_string(),
                count: tally.count,
                baseline_accuracy: tally.baseline_correct as f64 * 100.0 / count,
                enhanced_accuracy: tally.enhanced_correct as f64 * 100.0 / count,
                improvement: (tally.enhanced_correct as f64 - tally.baseline_correct as f64)
                    * 100.0
                    / count,
            }
        })
        .collect();

    categories.sort_by(|a, b| {
        b.improvement
            .total_cmp(&a.improvement)
            .then_with(|| a.category.cmp(&b.category))
    });

    categories
}
