//! Paired outcome records produced by the external signature extractor
//!
//! Each record says whether the baseline and the enhanced classifier got the
//! same underlying event right. Records arrive as a JSON array; entries that
//! do not deserialize or fail validation are skipped and counted rather than
//! silently defaulted.

use crate::error::Result;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;
use thiserror::Error;

/// Category label used when a record carries no (or a blank) category
pub const UNKNOWN_CATEGORY: &str = "unknown";

/// One classified event, as seen by both algorithm variants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeRecord {
    /// Extractor-assigned identifier (strings and integers are both accepted)
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    /// Baseline classifier was correct
    pub baseline_correct: bool,
    /// Enhanced classifier was correct
    pub enhanced_correct: bool,
    /// Archetype/category tag, `None` maps to [`UNKNOWN_CATEGORY`]
    #[serde(default)]
    pub category: Option<String>,
    /// Signature richness in `[0, 1]`
    pub richness: f64,
    /// Position complexity, `>= 0`
    pub complexity: f64,
}

/// Why a record was excluded from analysis
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MalformedRecord {
    #[error("entry {index} could not be decoded: {reason}")]
    Undecodable { index: usize, reason: String },

    #[error("record {id}: richness {value} outside [0, 1]")]
    RichnessOutOfRange { id: String, value: f64 },

    #[error("record {id}: complexity {value} must be finite and non-negative")]
    InvalidComplexity { id: String, value: f64 },
}

impl OutcomeRecord {
    /// Create a record with no category and neutral features
    pub fn new(id: impl Into<String>, baseline_correct: bool, enhanced_correct: bool) -> Self {
        Self {
            id: id.into(),
            baseline_correct,
            enhanced_correct,
            category: None,
            richness: 0.0,
            complexity: 0.0,
        }
    }

    /// Set the category tag
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Set richness and complexity
    pub fn with_features(mut self, richness: f64, complexity: f64) -> Self {
        self.richness = richness;
        self.complexity = complexity;
        self
    }

    /// Category used for grouping; blank or missing becomes `"unknown"`
    pub fn category_label(&self) -> &str {
        match self.category.as_deref().map(str::trim) {
            Some(label) if !label.is_empty() => label,
            _ => UNKNOWN_CATEGORY,
        }
    }

    /// Check the numeric feature ranges
    pub fn validate(&self) -> std::result::Result<(), MalformedRecord> {
        if !self.richness.is_finite() || !(0.0..=1.0).contains(&self.richness) {
            return Err(MalformedRecord::RichnessOutOfRange {
                id: self.id.clone(),
                value: self.richness,
            });
        }

        if !self.complexity.is_finite() || self.complexity < 0.0 {
            return Err(MalformedRecord::InvalidComplexity {
                id: self.id.clone(),
                value: self.complexity,
            });
        }

        Ok(())
    }
}

fn deserialize_id<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Integer(i64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Integer(n) => n.to_string(),
    })
}

/// Validated records plus the number of entries that were dropped
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordBatch {
    pub records: Vec<OutcomeRecord>,
    pub skipped: usize,
}

impl RecordBatch {
    /// Validate already-typed records, dropping out-of-range ones
    pub fn from_records(records: Vec<OutcomeRecord>) -> Self {
        let mut batch = Self::default();
        for record in records {
            batch.push_checked(record);
        }
        batch
    }

    /// Decode a JSON array of records
    ///
    /// The document itself must be a JSON array; individual entries that do
    /// not decode are skipped.
    pub fn from_json_str(content: &str) -> Result<Self> {
        let entries: Vec<serde_json::Value> = serde_json::from_str(content)?;
        let mut batch = Self::default();

        for (index, entry) in entries.into_iter().enumerate() {
            match serde_json::from_value::<OutcomeRecord>(entry) {
                Ok(record) => batch.push_checked(record),
                Err(e) => batch.skip(MalformedRecord::Undecodable {
                    index,
                    reason: e.to_string(),
                }),
            }
        }

        tracing::debug!(
            "Decoded {} records ({} skipped)",
            batch.records.len(),
            batch.skipped
        );
        Ok(batch)
    }

    /// Read and decode a JSON records file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&content)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn push_checked(&mut self, record: OutcomeRecord) {
        match record.validate() {
            Ok(()) => self.records.push(record),
            Err(reason) => self.skip(reason),
        }
    }

    fn skip(&mut self, reason: MalformedRecord) {
        tracing::warn!("Skipping malformed record: {}", reason);
        self.skipped += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_label_defaults_to_unknown() {
        let record = OutcomeRecord::new("a", true, false);
        assert_eq!(record.category_label(), "unknown");

        let blank = OutcomeRecord::new("b", true, false).with_category("   ");
        assert_eq!(blank.category_label(), "unknown");

        let tagged = OutcomeRecord::new("c", true, false).with_category("minority_attack");
        assert_eq!(tagged.category_label(), "minority_attack");
    }

    #[test]
    fn test_validate_rejects_out_of_range_features() {
        let rich = OutcomeRecord::new("r", true, true).with_features(1.5, 0.0);
        assert!(matches!(
            rich.validate(),
            Err(MalformedRecord::RichnessOutOfRange { .. })
        ));

        let complex = OutcomeRecord::new("c", true, true).with_features(0.5, -1.0);
        assert!(matches!(
            complex.validate(),
            Err(MalformedRecord::InvalidComplexity { .. })
        ));

        let nan = OutcomeRecord::new("n", true, true).with_features(f64::NAN, 0.0);
        assert!(nan.validate().is_err());

        let ok = OutcomeRecord::new("ok", true, true).with_features(0.0, 12.5);
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn test_from_json_skips_undecodable_entries() {
        let json = r#"[
            {"id": "1", "baselineCorrect": true, "enhancedCorrect": false,
             "category": "iqp", "richness": 0.4, "complexity": 3.0},
            {"id": 2, "baselineCorrect": false, "enhancedCorrect": true,
             "richness": 0.9, "complexity": 1.0},
            {"id": "3", "baselineCorrect": "yes", "enhancedCorrect": true,
             "richness": 0.1, "complexity": 0.0},
            {"id": "4", "enhancedCorrect": true, "richness": 0.1, "complexity": 0.0},
            {"id": "5", "baselineCorrect": true, "enhancedCorrect": true,
             "richness": 2.0, "complexity": 0.0}
        ]"#;

        let batch = RecordBatch::from_json_str(json).unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.skipped, 3);
        assert_eq!(batch.records[1].id, "2");
        assert_eq!(batch.records[1].category_label(), "unknown");
    }

    #[test]
    fn test_from_json_requires_array() {
        assert!(RecordBatch::from_json_str(r#"{"id": "1"}"#).is_err());
        assert!(RecordBatch::from_json_str("not json").is_err());
    }

    #[test]
    fn test_from_json_empty_array() {
        let batch = RecordBatch::from_json_str("[]").unwrap();
        assert!(batch.is_empty());
        assert_eq!(batch.skipped, 0);
    }

    #[test]
    fn test_from_records_counts_invalid() {
        let batch = RecordBatch::from_records(vec![
            OutcomeRecord::new("a", true, true),
            OutcomeRecord::new("b", true, true).with_features(-0.1, 0.0),
        ]);
        assert_eq!(batch.len(), 1);
        assert_eq!(batch.skipped, 1);
    }
}
