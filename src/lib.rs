//! Ascenso - baseline vs enhanced classifier evaluation
//!
//! Compares two classifiers scored on the same positions, decides whether the
//! enhanced variant is statistically and practically better, gates its
//! promotion behind five checks, and drives an auto-tune loop whose state is
//! shared safely between concurrent callers.
//!
//! ```
//! use ascenso::evaluation::{analyze, check_readiness};
//! use ascenso::records::OutcomeRecord;
//! use ascenso::tuning::{AutoTuneController, MemoryTuningStore, TuningConfig};
//!
//! let records: Vec<OutcomeRecord> = (0..120)
//!     .map(|i| OutcomeRecord::new(i.to_string(), i < 60, i < 66))
//!     .collect();
//!
//! let result = analyze(&records).unwrap();
//! assert!(!check_readiness(&result).ready);
//!
//! let config = TuningConfig::default();
//! let controller = AutoTuneController::new(MemoryTuningStore::new(config.lock_policy()), config);
//! let decision = controller.evaluate(&result).unwrap();
//! assert!(decision.tuned);
//! ```

pub mod cli;
pub mod error;
pub mod evaluation;
pub mod records;
pub mod settings;
pub mod tuning;
