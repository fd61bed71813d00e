// Auto-tuning of the enhanced classifier
//
// Consumes analysis results, moves weights while the enhanced variant is
// ahead but short of target, and asks an external collaborator to deploy
// once every gate check passes and auto-deploy is enabled. All state
// mutation happens inside a store transaction under an exclusive lock.

mod config;
mod controller;
mod state;
mod store;

pub use config::{LockPolicy, TuningConfig};
pub use controller::{
    AutoTuneController, CategoryFocusStrategy, DeployTrigger, FlagFileTrigger, NoDeploy,
    TuningDecision, WeightChange, WeightStrategy,
};
pub use state::{HistoryEntry, TuningPhase, TuningState, NEUTRAL_WEIGHT};
pub use store::{Commit, JsonFileTuningStore, MemoryTuningStore, TuningStore, TUNING_STATE_KEY};
