//! Auto-tune controller
//!
//! One invocation turns an [`AnalysisResult`] and the current [`TuningState`]
//! into the next state plus a [`TuningDecision`]. The transition itself is
//! [`AutoTuneController::step`]; [`AutoTuneController::evaluate`] runs it
//! inside a store transaction so concurrent callers never interleave writes.

use crate::error::{EvalError, Result};
use crate::evaluation::{check_readiness_with, AnalysisResult, GateThresholds, ReadinessReport};
use crate::tuning::config::TuningConfig;
use crate::tuning::state::{TuningPhase, TuningState, NEUTRAL_WEIGHT};
use crate::tuning::store::{Commit, TuningStore};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

/// Output of one controller invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TuningDecision {
    pub recommendations: Vec<String>,
    /// Weights were adjusted this invocation
    pub tuned: bool,
    /// State is deployed after this invocation
    pub deployed: bool,
    pub next_state: TuningPhase,
    pub generation: u64,
    /// Same analysis as the last applied one; nothing changed
    pub replayed: bool,
    pub readiness: ReadinessReport,
}

/// One weight moved by a strategy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightChange {
    pub key: String,
    pub from: f64,
    pub to: f64,
}

/// Policy deciding how weights move when improvement is positive but short
/// of target
pub trait WeightStrategy {
    /// Proposed weights; the input map is never modified
    fn adjust(
        &self,
        weights: &BTreeMap<String, f64>,
        result: &AnalysisResult,
    ) -> (BTreeMap<String, f64>, Vec<WeightChange>);
}

/// Raise the weight of every category doing worse than the overall result
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CategoryFocusStrategy {
    pub step: f64,
    pub max_weight: f64,
}

impl CategoryFocusStrategy {
    pub fn from_config(config: &TuningConfig) -> Self {
        Self {
            step: config.weight_step,
            max_weight: config.max_weight,
        }
    }
}

impl WeightStrategy for CategoryFocusStrategy {
    fn adjust(
        &self,
        weights: &BTreeMap<String, f64>,
        result: &AnalysisResult,
    ) -> (BTreeMap<String, f64>, Vec<WeightChange>) {
        let mut next = weights.clone();
        let mut changes = Vec::new();

        for category in &result.categories {
            if category.improvement >= result.improvement {
                continue;
            }

            let from = weights
                .get(&category.category)
                .copied()
                .unwrap_or(NEUTRAL_WEIGHT);
            let to = (from + self.step).min(self.max_weight);
            if to > from {
                next.insert(category.category.clone(), to);
                changes.push(WeightChange {
                    key: category.category.clone(),
                    from,
                    to,
                });
            }
        }

        (next, changes)
    }
}

/// External collaborator that performs the actual promotion
///
/// Only consulted on the ready-to-deployed transition with auto-deploy
/// enabled. `Ok(false)` means the deployment was declined; an error aborts
/// the whole invocation.
pub trait DeployTrigger {
    fn request_deployment(&self, state: &TuningState, result: &AnalysisResult) -> Result<bool>;
}

impl<F> DeployTrigger for F
where
    F: Fn(&TuningState, &AnalysisResult) -> Result<bool>,
{
    fn request_deployment(&self, state: &TuningState, result: &AnalysisResult) -> Result<bool> {
        self(state, result)
    }
}

/// Trigger that declines every request
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDeploy;

impl DeployTrigger for NoDeploy {
    fn request_deployment(&self, _state: &TuningState, _result: &AnalysisResult) -> Result<bool> {
        Ok(false)
    }
}

/// Flips a runtime flag file that the serving side watches
///
/// Writes `{"enhancedEnabled": true, "generation": n}`.
#[derive(Debug, Clone)]
pub struct FlagFileTrigger {
    path: PathBuf,
}

impl FlagFileTrigger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DeployTrigger for FlagFileTrigger {
    fn request_deployment(&self, state: &TuningState, _result: &AnalysisResult) -> Result<bool> {
        let flag = serde_json::json!({
            "enhancedEnabled": true,
            "generation": state.generation,
        });
        let body = serde_json::to_string_pretty(&flag)?;
        fs::write(&self.path, body).map_err(|err| {
            EvalError::Deployment(format!("writing {}: {}", self.path.display(), err))
        })?;

        tracing::info!(path = %self.path.display(), "Deployment flag written");
        Ok(true)
    }
}

/// Auto-tune state machine bound to a store, weight strategy, and trigger
pub struct AutoTuneController<S, W = CategoryFocusStrategy, D = NoDeploy> {
    store: S,
    strategy: W,
    trigger: D,
    config: TuningConfig,
    gate: GateThresholds,
}

impl<S: TuningStore> AutoTuneController<S> {
    /// Controller with the default strategy and no deployment collaborator
    pub fn new(store: S, config: TuningConfig) -> Self {
        Self {
            store,
            strategy: CategoryFocusStrategy::from_config(&config),
            trigger: NoDeploy,
            config,
            gate: GateThresholds::default(),
        }
    }
}

impl<S, W, D> AutoTuneController<S, W, D>
where
    S: TuningStore,
    W: WeightStrategy,
    D: DeployTrigger,
{
    pub fn with_strategy<W2: WeightStrategy>(self, strategy: W2) -> AutoTuneController<S, W2, D> {
        AutoTuneController {
            store: self.store,
            strategy,
            trigger: self.trigger,
            config: self.config,
            gate: self.gate,
        }
    }

    pub fn with_trigger<D2: DeployTrigger>(self, trigger: D2) -> AutoTuneController<S, W, D2> {
        AutoTuneController {
            store: self.store,
            strategy: self.strategy,
            trigger,
            config: self.config,
            gate: self.gate,
        }
    }

    pub fn with_gate_thresholds(mut self, gate: GateThresholds) -> Self {
        self.gate = gate;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &TuningConfig {
        &self.config
    }

    /// Committed state without waiting on writers
    pub fn snapshot(&self) -> Result<Option<TuningState>> {
        self.store.snapshot()
    }

    /// Apply one analysis under the store's exclusive lock
    ///
    /// Re-submitting the analysis that was applied last is a no-op that
    /// reports `replayed`, except while a pending deployment can now go
    /// ahead: a ready state under an auto-deploy policy asks the trigger
    /// again without starting a new generation.
    pub fn evaluate(&self, result: &AnalysisResult) -> Result<TuningDecision> {
        self.config.validate()?;
        let fingerprint = result.fingerprint();

        self.store.transact(|current| {
            let state =
                current.unwrap_or_else(|| TuningState::new(self.config.default_weights.clone()));

            if state.last_fingerprint() == Some(fingerprint) {
                if self.deployment_pending(&state, result) {
                    return self.retry_deployment(state, result);
                }

                tracing::info!(
                    generation = state.generation,
                    "Analysis already applied, skipping"
                );
                return Ok(Commit::skip(self.replay(&state, result)));
            }

            let (next, decision) = self.step(state, result)?;
            Ok(Commit::write(next, decision))
        })
    }

    /// Pure transition; calls the deployment trigger at most once
    pub fn step(
        &self,
        mut state: TuningState,
        result: &AnalysisResult,
    ) -> Result<(TuningState, TuningDecision)> {
        let readiness = check_readiness_with(result, &self.gate);
        state.begin_generation(
            result.improvement,
            result.statistics.p_value,
            result.fingerprint(),
        );

        let mut recommendations = Vec::new();
        let mut tuned = false;

        let phase = if result.improvement <= 0.0 {
            tracing::warn!(
                improvement = result.improvement,
                "Enhanced classifier is not ahead of baseline"
            );
            recommendations.push(format!(
                "Regression: enhanced is {:+.1} pp against baseline (p={:.4}); weights left unchanged, investigate before tuning further",
                result.improvement, result.statistics.p_value
            ));
            TuningPhase::Monitoring
        } else if readiness.ready {
            self.on_ready(&mut state, result, &mut recommendations)?
        } else if result.improvement < self.config.target_improvement {
            tracing::debug!(phase = %TuningPhase::Tuning, "Adjusting weights");
            let (weights, changes) = self.strategy.adjust(&state.weights, result);
            state.weights = weights;
            tuned = true;

            recommendations.push(format!(
                "Improvement {:+.1} pp is below the {:.1} pp target; adjusted {} weight(s)",
                result.improvement,
                self.config.target_improvement,
                changes.len()
            ));
            for change in &changes {
                recommendations.push(format!(
                    "Weight '{}': {:.3} -> {:.3}",
                    change.key, change.from, change.to
                ));
            }
            TuningPhase::Monitoring
        } else {
            for check in readiness.failing() {
                recommendations.push(format!(
                    "Target improvement met but '{}' check failing: {}",
                    check.name, check.detail
                ));
            }
            TuningPhase::Monitoring
        };

        if phase != state.phase {
            tracing::info!(
                from = %state.phase,
                to = %phase,
                generation = state.generation,
                "Tuning phase changed"
            );
        }
        state.phase = phase;

        let decision = TuningDecision {
            recommendations,
            tuned,
            deployed: state.deployed,
            next_state: phase,
            generation: state.generation,
            replayed: false,
            readiness,
        };

        Ok((state, decision))
    }

    fn on_ready(
        &self,
        state: &mut TuningState,
        result: &AnalysisResult,
        recommendations: &mut Vec<String>,
    ) -> Result<TuningPhase> {
        if state.deployed {
            recommendations
                .push("Enhanced classifier already deployed; all checks still pass".to_string());
            return Ok(TuningPhase::Deployed);
        }

        if !self.config.auto_deploy {
            recommendations.push(
                "All deployment checks pass; enable auto-deploy or promote manually".to_string(),
            );
            return Ok(TuningPhase::ReadyToDeploy);
        }

        if self.trigger.request_deployment(state, result)? {
            state.mark_deployed();
            tracing::info!(generation = state.generation, "Enhanced classifier deployed");
            recommendations.push(format!(
                "Deployed enhanced classifier at generation {}",
                state.generation
            ));
            Ok(TuningPhase::Deployed)
        } else {
            tracing::warn!("Deployment trigger declined");
            recommendations
                .push("All deployment checks pass but the deployment was declined".to_string());
            Ok(TuningPhase::ReadyToDeploy)
        }
    }

    fn deployment_pending(&self, state: &TuningState, result: &AnalysisResult) -> bool {
        state.phase == TuningPhase::ReadyToDeploy
            && !state.deployed
            && self.config.auto_deploy
            && result.improvement > 0.0
            && check_readiness_with(result, &self.gate).ready
    }

    /// Ask the trigger again for an analysis that is already recorded
    ///
    /// Only a successful deployment is written; a declined request leaves
    /// the stored state as it was.
    fn retry_deployment(
        &self,
        mut state: TuningState,
        result: &AnalysisResult,
    ) -> Result<Commit<TuningDecision>> {
        tracing::info!(
            generation = state.generation,
            "Retrying pending deployment for unchanged analysis"
        );

        let mut recommendations = Vec::new();
        let phase = self.on_ready(&mut state, result, &mut recommendations)?;
        let decision = TuningDecision {
            recommendations,
            tuned: false,
            deployed: state.deployed,
            next_state: phase,
            generation: state.generation,
            replayed: false,
            readiness: check_readiness_with(result, &self.gate),
        };

        if state.deployed {
            state.phase = phase;
            Ok(Commit::write(state, decision))
        } else {
            Ok(Commit::skip(decision))
        }
    }

    fn replay(&self, state: &TuningState, result: &AnalysisResult) -> TuningDecision {
        TuningDecision {
            recommendations: vec![format!(
                "Analysis unchanged since generation {}; no action taken",
                state.generation
            )],
            tuned: false,
            deployed: state.deployed,
            next_state: state.phase,
            generation: state.generation,
            replayed: true,
            readiness: check_readiness_with(result, &self.gate),
        }
    }
}

impl TuningDecision {
    /// Generate human-readable report
    pub fn to_report_string(&self) -> String {
        let mut report = format!(
            "Generation {}: {}{}\n",
            self.generation,
            self.next_state,
            if self.replayed { " (replayed)" } else { "" }
        );
        report.push_str(&format!(
            "Tuned: {}, deployed: {}\n",
            if self.tuned { "yes" } else { "no" },
            if self.deployed { "yes" } else { "no" }
        ));

        for recommendation in &self.recommendations {
            report.push_str(&format!("  - {}\n", recommendation));
        }

        report
    }
}
