//! TOML settings file
//!
//! ```toml
//! [evaluation]
//! significance_level = 0.05
//! confidence_level = 0.95
//! min_category_count = 3
//!
//! [evaluation.gate]
//! min_sample_size = 100
//!
//! [tuning]
//! target_improvement = 15.0
//! auto_deploy = false
//!
//! [tuning.default_weights]
//! isolated_queen_pawn = 1.0
//! ```
//!
//! Every section and key is optional; missing values take their defaults.

use crate::error::Result;
use crate::evaluation::EvaluationConfig;
use crate::tuning::TuningConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub evaluation: EvaluationConfig,
    pub tuning: TuningConfig,
}

impl Settings {
    /// Load settings from a TOML file
    ///
    /// # Example
    ///
    /// ```no_run
    /// use ascenso::settings::Settings;
    ///
    /// # fn main() -> ascenso::error::Result<()> {
    /// let settings = Settings::from_file("ascenso.toml")?;
    /// println!("target: {}", settings.tuning.target_improvement);
    /// # Ok(())
    /// # }
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate settings from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let settings: Settings = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        self.evaluation.validate()?;
        self.tuning.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EvalError;

    #[test]
    fn test_empty_document_uses_defaults() {
        let settings = Settings::from_toml_str("").unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_partial_sections() {
        let toml = r#"
[evaluation]
significance_level = 0.01

[evaluation.gate]
min_sample_size = 250

[tuning]
auto_deploy = true
weight_step = 0.1

[tuning.default_weights]
isolated_queen_pawn = 1.25
"#;

        let settings = Settings::from_toml_str(toml).unwrap();
        assert_eq!(settings.evaluation.significance_level, 0.01);
        assert_eq!(settings.evaluation.confidence_level, 0.95);
        assert_eq!(settings.evaluation.gate.min_sample_size, 250);
        assert_eq!(settings.evaluation.gate.min_improvement, 15.0);
        assert!(settings.tuning.auto_deploy);
        assert_eq!(settings.tuning.weight_step, 0.1);
        assert_eq!(settings.tuning.target_improvement, 15.0);
        assert_eq!(
            settings.tuning.default_weights.get("isolated_queen_pawn"),
            Some(&1.25)
        );
    }

    #[test]
    fn test_invalid_values_rejected() {
        let toml = "[tuning]\nmax_lock_attempts = 0\n";
        assert!(matches!(
            Settings::from_toml_str(toml),
            Err(EvalError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_malformed_toml() {
        assert!(matches!(
            Settings::from_toml_str("[tuning\nauto_deploy = yes"),
            Err(EvalError::Toml(_))
        ));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("ascenso.toml");
        std::fs::write(&path, "[tuning]\ntarget_improvement = 10.0\n").unwrap();

        let settings = Settings::from_file(&path).unwrap();
        assert_eq!(settings.tuning.target_improvement, 10.0);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        assert!(matches!(
            Settings::from_file("/nonexistent/ascenso.toml"),
            Err(EvalError::Io(_))
        ));
    }
}
