mod cli;
mod logging;
mod report;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::Serialize;

use cli::{Cli, Commands, ExportKind, OutputFormat};
use jtlcompare_core::compare::{compare_files, ComparisonMetric, DiffMode};
use jtlcompare_core::export::{
    export_apdex_csv, export_comparison_csv, export_json, export_records_csv,
    export_statistics_csv,
};
use jtlcompare_core::settings::Settings;
use jtlcompare_core::upload::{process_file, process_files, ProcessedFile};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(&cli.log_level);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let settings = load_settings(&cli).await?;

    match cli.command {
        Commands::Analyze { files, format } => cmd_analyze(&settings, files, format).await,
        Commands::Compare {
            baseline,
            candidate,
            metrics,
            threshold,
            mode,
            format,
        } => {
            cmd_compare(
                settings, &baseline, &candidate, metrics, threshold, mode, format,
            )
            .await
        }
        Commands::Export {
            files,
            kind,
            output,
        } => cmd_export(&settings, files, kind, output).await,
    }
}

/// Settings file (if any) overlaid with the threshold flags.
async fn load_settings(cli: &Cli) -> Result<Settings> {
    let mut settings = match &cli.config {
        Some(path) => Settings::load(path)
            .await
            .with_context(|| format!("failed to load settings from {}", path.display()))?,
        None => Settings::default(),
    };
    if let Some(toleration) = cli.toleration {
        settings.apdex.toleration = toleration;
    }
    if let Some(frustration) = cli.frustration {
        settings.apdex.frustration = frustration;
    }
    settings.validate()?;
    tracing::debug!(?settings, "resolved settings");
    Ok(settings)
}

/// Process every file, reporting each failure. Fails if any file failed.
async fn process_all(settings: &Settings, files: Vec<PathBuf>) -> Result<Vec<ProcessedFile>> {
    let total = files.len();
    let outcomes = process_files(files.clone(), settings.apdex).await;

    let mut processed = Vec::with_capacity(total);
    let mut failed = 0usize;
    for (path, outcome) in files.iter().zip(outcomes) {
        match outcome {
            Ok(file) => processed.push(file),
            Err(e) => {
                failed += 1;
                eprintln!("{}: {e}", path.display());
            }
        }
    }
    if failed > 0 {
        bail!("{failed} of {total} file(s) could not be processed");
    }
    Ok(processed)
}

// ---------------------------------------------------------------------------
// analyze
// ---------------------------------------------------------------------------

#[derive(Serialize)]
#[serde(untagged)]
enum AnalyzeOutput<'a> {
    Processed(&'a ProcessedFile),
    Failed { name: String, error: String },
}

async fn cmd_analyze(settings: &Settings, files: Vec<PathBuf>, format: OutputFormat) -> Result<()> {
    let total = files.len();
    let outcomes = process_files(files.clone(), settings.apdex).await;
    let failed = outcomes.iter().filter(|o| o.is_err()).count();

    match format {
        OutputFormat::Json => {
            let rows: Vec<AnalyzeOutput<'_>> = files
                .iter()
                .zip(&outcomes)
                .map(|(path, outcome)| match outcome {
                    Ok(file) => AnalyzeOutput::Processed(file),
                    Err(e) => AnalyzeOutput::Failed {
                        name: path.display().to_string(),
                        error: e.to_string(),
                    },
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        OutputFormat::Text => {
            let mut history = settings.new_history();
            for (path, outcome) in files.iter().zip(outcomes) {
                match outcome {
                    Ok(file) => {
                        println!("{}", report::FileSummary(&file));
                        history.add(file);
                    }
                    Err(e) => eprintln!("{}: {e}\n", path.display()),
                }
            }
            if history.len() > 1 {
                print!("{}", report::Overview(&history.list()));
            }
        }
    }

    if failed > 0 {
        bail!("{failed} of {total} file(s) could not be processed");
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// compare
// ---------------------------------------------------------------------------

async fn cmd_compare(
    mut settings: Settings,
    baseline: &Path,
    candidate: &Path,
    metrics: Vec<ComparisonMetric>,
    threshold: Option<f64>,
    mode: Option<DiffMode>,
    format: OutputFormat,
) -> Result<()> {
    if !metrics.is_empty() {
        settings.comparison.metrics = metrics;
    }
    if let Some(threshold) = threshold {
        settings.comparison.significance_threshold = threshold;
    }
    if let Some(mode) = mode {
        settings.comparison.diff_mode = mode;
    }
    settings.validate()?;

    let (a, b) = tokio::try_join!(
        process_file(baseline, settings.apdex),
        process_file(candidate, settings.apdex),
    )
    .context("failed to process input files")?;

    let comparison = compare_files(&a, &b, &settings.comparison_options());
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&comparison)?),
        OutputFormat::Text => print!(
            "{}",
            report::ComparisonTable {
                comparison: &comparison,
                mode: settings.comparison.diff_mode,
            }
        ),
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// export
// ---------------------------------------------------------------------------

async fn cmd_export(
    settings: &Settings,
    files: Vec<PathBuf>,
    kind: ExportKind,
    output: Option<PathBuf>,
) -> Result<()> {
    if kind == ExportKind::Comparison && files.len() != 2 {
        bail!("comparison export needs exactly two files (baseline, candidate)");
    }

    let processed = process_all(settings, files).await?;
    let content = match kind {
        ExportKind::Statistics => export_statistics_csv(&processed)?,
        ExportKind::Apdex => export_apdex_csv(&processed)?,
        ExportKind::Records => export_records_csv(&processed)?,
        ExportKind::Comparison => {
            let comparison =
                compare_files(&processed[0], &processed[1], &settings.comparison_options());
            export_comparison_csv(&comparison)?
        }
        ExportKind::Json => match processed.as_slice() {
            [single] => export_json(&single.result)?,
            many => serde_json::to_string_pretty(many)?,
        },
    };

    match output {
        Some(path) => {
            tokio::fs::write(&path, content)
                .await
                .with_context(|| format!("failed to write {}", path.display()))?;
            tracing::info!(path = %path.display(), "export written");
        }
        None => print!("{content}"),
    }
    Ok(())
}
