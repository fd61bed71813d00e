use anyhow::{Context, Result};
use ascenso::cli::{Cli, Command, OutputFormat};
use ascenso::error::EvalError;
use ascenso::evaluation::{analyze_batch, check_readiness_with, AnalysisResult};
use ascenso::records::RecordBatch;
use ascenso::settings::Settings;
use ascenso::tuning::{AutoTuneController, FlagFileTrigger, JsonFileTuningStore};
use clap::Parser;
use std::io::Write;
use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    } else if std::env::var_os("RUST_LOG").is_some() {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_writer(std::io::stderr)
            .init();
    }
}

fn load_settings(path: Option<&Path>) -> Result<Settings> {
    match path {
        Some(path) => Settings::from_file(path)
            .with_context(|| format!("Failed to load settings from {}", path.display())),
        None => Ok(Settings::default()),
    }
}

/// Analyze a record file; `None` means there was nothing usable to analyze
fn load_and_analyze(path: &Path, settings: &Settings) -> Result<Option<AnalysisResult>> {
    let batch = RecordBatch::from_file(path)
        .with_context(|| format!("Failed to read records from {}", path.display()))?;

    match analyze_batch(&batch, &settings.evaluation) {
        Ok(result) => Ok(Some(result)),
        Err(EvalError::EmptyDataset { skipped }) => {
            tracing::warn!(skipped, "No usable records, skipping this cycle");
            eprintln!(
                "No usable records in {} ({} malformed entries skipped); nothing to do",
                path.display(),
                skipped
            );
            Ok(None)
        }
        Err(err) => Err(err.into()),
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> Result<()> {
    let args = Cli::parse();

    // Initialize tracing if --debug flag is set
    init_tracing(args.debug);

    let settings = load_settings(args.config.as_deref())?;

    match args.command {
        Command::Analyze { records, format } => {
            let Some(result) = load_and_analyze(&records, &settings)? else {
                return Ok(());
            };
            match format {
                OutputFormat::Text => print!("{}", result.to_report_string()),
                OutputFormat::Json => print_json(&result)?,
            }
        }

        Command::Gate { records, format } => {
            let Some(result) = load_and_analyze(&records, &settings)? else {
                return Ok(());
            };
            let report = check_readiness_with(&result, &settings.evaluation.gate);
            match format {
                OutputFormat::Text => print!("{}", report.to_report_string()),
                OutputFormat::Json => print_json(&report)?,
            }
            if !report.ready {
                std::io::stdout().flush()?;
                std::process::exit(1);
            }
        }

        Command::Tune {
            records,
            state,
            auto_deploy,
            deploy_flag,
            format,
        } => {
            let Some(result) = load_and_analyze(&records, &settings)? else {
                return Ok(());
            };

            let mut config = settings.tuning.clone();
            config.auto_deploy |= auto_deploy;
            let store = JsonFileTuningStore::new(&state, config.lock_policy());
            let controller = AutoTuneController::new(store, config)
                .with_gate_thresholds(settings.evaluation.gate.clone());

            let outcome = match deploy_flag {
                Some(flag) => controller
                    .with_trigger(FlagFileTrigger::new(flag))
                    .evaluate(&result),
                None => controller.evaluate(&result),
            };

            let decision = match outcome {
                Ok(decision) => decision,
                Err(err) if err.is_retryable() => {
                    return Err(err).with_context(|| {
                        format!(
                            "Another tuning run holds {}; retry on the next cycle",
                            state.display()
                        )
                    });
                }
                Err(err) => return Err(err).context("Tuning cycle failed"),
            };

            match format {
                OutputFormat::Text => print!("{}", decision.to_report_string()),
                OutputFormat::Json => print_json(&decision)?,
            }
        }
    }

    Ok(())
}
