//! Persisted auto-tuning state
//!
//! Generation, weights, and phase are updated in place; history is
//! append-only; `deployed` only ever goes from false to true.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Weight used for a key that has never been tuned
pub const NEUTRAL_WEIGHT: f64 = 1.0;

/// Controller phase
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TuningPhase {
    /// Watching results, nothing pending
    #[default]
    Monitoring,
    /// Weight adjustment in progress (never outlives one invocation)
    Tuning,
    /// Every gate check passed, waiting for a deployment
    ReadyToDeploy,
    /// Enhanced variant has been promoted
    Deployed,
}

impl fmt::Display for TuningPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Monitoring => "monitoring",
            Self::Tuning => "tuning",
            Self::ReadyToDeploy => "ready_to_deploy",
            Self::Deployed => "deployed",
        };
        f.write_str(label)
    }
}

/// One evaluated generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub generation: u64,
    pub improvement: f64,
    pub p_value: f64,
    /// [`AnalysisResult::fingerprint`](crate::evaluation::AnalysisResult::fingerprint)
    /// of the evaluated result
    #[serde(default)]
    pub fingerprint: u64,
}

/// Tuning state shared by every caller through a [`TuningStore`](super::TuningStore)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TuningState {
    pub generation: u64,
    /// Opaque enhanced-algorithm weights, keyed by name
    pub weights: BTreeMap<String, f64>,
    pub history: Vec<HistoryEntry>,
    pub deployed: bool,
    #[serde(default)]
    pub phase: TuningPhase,
}

impl Default for TuningState {
    fn default() -> Self {
        Self::new(BTreeMap::new())
    }
}

impl TuningState {
    /// First-run state
    pub fn new(default_weights: BTreeMap<String, f64>) -> Self {
        Self {
            generation: 0,
            weights: default_weights,
            history: Vec::new(),
            deployed: false,
            phase: TuningPhase::Monitoring,
        }
    }

    /// Current weight for `key`, [`NEUTRAL_WEIGHT`] if never set
    pub fn weight(&self, key: &str) -> f64 {
        self.weights.get(key).copied().unwrap_or(NEUTRAL_WEIGHT)
    }

    pub fn last_entry(&self) -> Option<&HistoryEntry> {
        self.history.last()
    }

    /// Fingerprint of the most recently applied analysis
    pub fn last_fingerprint(&self) -> Option<u64> {
        self.last_entry().map(|entry| entry.fingerprint)
    }

    /// Start the next generation and record what was evaluated
    pub(crate) fn begin_generation(&mut self, improvement: f64, p_value: f64, fingerprint: u64) {
        self.generation += 1;
        self.history.push(HistoryEntry {
            generation: self.generation,
            improvement,
            p_value,
            fingerprint,
        });
    }

    /// Mark deployed; there is no way back
    pub(crate) fn mark_deployed(&mut self) {
        self.deployed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state() {
        let mut defaults = BTreeMap::new();
        defaults.insert("iqp".to_string(), 1.2);

        let state = TuningState::new(defaults);
        assert_eq!(state.generation, 0);
        assert!(state.history.is_empty());
        assert!(!state.deployed);
        assert_eq!(state.phase, TuningPhase::Monitoring);
        assert_eq!(state.weight("iqp"), 1.2);
        assert_eq!(state.weight("fortress"), NEUTRAL_WEIGHT);
    }

    #[test]
    fn test_begin_generation_appends_history() {
        let mut state = TuningState::default();
        state.begin_generation(4.0, 0.2, 11);
        state.begin_generation(9.0, 0.03, 22);

        assert_eq!(state.generation, 2);
        assert_eq!(state.history.len(), 2);
        assert_eq!(state.history[0].generation, 1);
        assert_eq!(state.last_fingerprint(), Some(22));
    }

    #[test]
    fn test_json_shape() {
        let mut state = TuningState::default();
        state.begin_generation(4.0, 0.2, 7);
        state.phase = TuningPhase::ReadyToDeploy;

        let json = serde_json::to_string(&state).unwrap();
        assert!(json.contains("\"pValue\":0.2"));
        assert!(json.contains("\"phase\":\"ready_to_deploy\""));

        let back: TuningState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }

    #[test]
    fn test_phase_defaults_when_absent() {
        let json = r#"{"generation": 3, "weights": {}, "history": [], "deployed": true}"#;
        let state: TuningState = serde_json::from_str(json).unwrap();
        assert_eq!(state.phase, TuningPhase::Monitoring);
        assert!(state.deployed);
    }
}
