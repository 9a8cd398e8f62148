// src/main.rs

use anyhow::{Context, Result};
use clap::Parser;
use log::LevelFilter;
use log4rs::{
    append::console::{ConsoleAppender, Target},
    append::file::FileAppender,
    config::{Appender, Root},
    encode::pattern::PatternEncoder,
    filter::threshold::ThresholdFilter,
    Config,
};
use serde::Serialize;
use std::fs;
use std::io::Write;
use tubesift::config::{env_var_string, CommandLineInput, PipelineSettings};
use tubesift::{summarize, AppError, CollectionResult, CollectorEngine, RunSummary};

/// Sets up logging configuration.
///
/// Console output goes to stderr so JSON on stdout stays clean.
fn setup_logging(verbose: bool) -> Result<()> {
    let log_level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };

    let log_file_path = std::env::temp_dir().join("tubesift.log");
    if let Some(parent) = log_file_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let pattern = if verbose {
        "{d(%Y-%m-%d %H:%M:%S)} [{l}] - {m}{n}"
    } else {
        "{m}{n}"
    };

    let stderr_appender = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new(pattern)))
        .build();

    let file_appender = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(
            "{d(%Y-%m-%d %H:%M:%S)} [{l}] {M} - {m}{n}",
        )))
        .build(&log_file_path)
        .with_context(|| format!("Opening log file {}", log_file_path.display()))?;

    let config = Config::builder()
        .appender(Appender::builder().build("stderr", Box::new(stderr_appender)))
        .appender(
            Appender::builder()
                .filter(Box::new(ThresholdFilter::new(LevelFilter::Info)))
                .build("file", Box::new(file_appender)),
        )
        .build(
            Root::builder()
                .appender("stderr")
                .appender("file")
                .build(log_level.max(LevelFilter::Info)),
        )?;

    log4rs::init_config(config)?;
    log::info!("Logging initialized. Log file: {}", log_file_path.display());
    Ok(())
}

/// One keyword's entry in the JSON report.
#[derive(Serialize)]
struct KeywordReport {
    keyword: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<RunSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<CollectionResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Runs every keyword in order with its own engine.
///
/// Upstream failures skip to the next keyword; credential exhaustion
/// stops the run because later keywords share the same keys.
fn execute_pipeline(settings: &PipelineSettings) -> Result<Vec<KeywordReport>, AppError> {
    let mut reports = Vec::with_capacity(settings.queries.len());

    for query in &settings.queries {
        let mut engine =
            CollectorEngine::connect(settings.collector.clone(), settings.api_keys.clone())?;

        match engine.collect(query) {
            Ok(result) => {
                let summary = summarize(&result, engine.filter());
                log::info!("{}", summary);
                reports.push(KeywordReport {
                    keyword: query.keyword.clone(),
                    summary: Some(summary),
                    result: Some(result),
                    error: None,
                });
            }
            Err(err) if err.is_credentials_exhausted() => {
                log::error!("Stopping at '{}': {}", query.keyword, err);
                let message = err.to_string();
                let partial = err.into_partial();
                reports.push(KeywordReport {
                    keyword: query.keyword.clone(),
                    summary: partial
                        .as_ref()
                        .map(|result| summarize(result, engine.filter())),
                    result: partial,
                    error: Some(message),
                });
                break;
            }
            Err(err) if err.is_upstream() => {
                log::error!("Skipping '{}': {}", query.keyword, err);
                reports.push(KeywordReport {
                    keyword: query.keyword.clone(),
                    summary: None,
                    result: None,
                    error: Some(err.to_string()),
                });
            }
            Err(err) => return Err(err),
        }
    }

    Ok(reports)
}

fn write_reports(settings: &PipelineSettings, reports: &[KeywordReport]) -> Result<()> {
    match &settings.output_file {
        Some(path) => {
            let file = fs::File::create(path)
                .with_context(|| format!("Creating output file {}", path.display()))?;
            serde_json::to_writer_pretty(file, reports)?;
            eprintln!("✓ Results saved to {}", path.display());
        }
        None => {
            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            serde_json::to_writer_pretty(&mut handle, reports)?;
            writeln!(handle)?;
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = CommandLineInput::parse();

    setup_logging(cli.verbose)?;

    let settings = PipelineSettings::resolve(cli, env_var_string)?;
    log::info!(
        "{} keyword(s), {} API key(s)",
        settings.queries.len(),
        settings.api_keys.len()
    );

    let reports = execute_pipeline(&settings)?;
    write_reports(&settings, &reports)?;

    let collected: usize = reports
        .iter()
        .filter_map(|report| report.result.as_ref())
        .map(|result| result.filtered_items.len())
        .sum();
    eprintln!(
        "📼 Collected {} passing video(s) across {} keyword(s).",
        collected,
        reports.len()
    );

    Ok(())
}
