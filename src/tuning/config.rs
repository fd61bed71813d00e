// Configuration for the auto-tune controller
//
// Auto-deploy is off unless explicitly enabled: readiness alone never
// promotes the enhanced variant.

use crate::error::{EvalError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Bounded retry budget for the exclusive tuning-state lock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockPolicy {
    pub max_attempts: u32,
    pub retry_delay: Duration,
}

impl Default for LockPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            retry_delay: Duration::from_millis(20),
        }
    }
}

/// Controller configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TuningConfig {
    /// Improvement (percentage points) below which weights are tuned
    pub target_improvement: f64,

    /// Request a deployment as soon as the gate reports ready
    pub auto_deploy: bool,

    /// Lock acquisition attempts before giving up with a conflict
    pub max_lock_attempts: u32,

    /// Pause between lock attempts
    pub lock_retry_delay_ms: u64,

    /// Amount a lagging category weight is raised per tuning step
    pub weight_step: f64,

    /// Upper bound for any tuned weight
    pub max_weight: f64,

    /// Weights for a freshly created state
    pub default_weights: BTreeMap<String, f64>,
}

impl Default for TuningConfig {
    fn default() -> Self {
        Self {
            target_improvement: 15.0,
            auto_deploy: false,
            max_lock_attempts: 5,
            lock_retry_delay_ms: 20,
            weight_step: 0.05,
            max_weight: 2.0,
            default_weights: BTreeMap::new(),
        }
    }
}

impl TuningConfig {
    pub fn with_auto_deploy(mut self, auto_deploy: bool) -> Self {
        self.auto_deploy = auto_deploy;
        self
    }

    /// Lock policy derived from the retry settings
    pub fn lock_policy(&self) -> LockPolicy {
        LockPolicy {
            max_attempts: self.max_lock_attempts,
            retry_delay: Duration::from_millis(self.lock_retry_delay_ms),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if !(self.target_improvement > 0.0) {
            return Err(EvalError::InvalidConfig(format!(
                "target_improvement must be positive, got {}",
                self.target_improvement
            )));
        }

        if self.max_lock_attempts == 0 {
            return Err(EvalError::InvalidConfig(
                "max_lock_attempts must be >= 1".to_string(),
            ));
        }

        if !(self.weight_step > 0.0) || !(self.max_weight > 0.0) {
            return Err(EvalError::InvalidConfig(format!(
                "weight_step and max_weight must be positive, got {} and {}",
                self.weight_step, self.max_weight
            )));
        }

        if let Some((key, value)) = self
            .default_weights
            .iter()
            .find(|(_, value)| !value.is_finite())
        {
            return Err(EvalError::InvalidConfig(format!(
                "default weight '{}' must be finite, got {}",
                key, value
            )));
        }

        Ok(())
    }
}
