//! # `kbrefine` Library Crate
//!
//! Core logic of the `kbrefine` command-line tool: load a knowledge-base CSV,
//! refine a range of its entries, and save the enriched table.

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use kbrefine::{
    config::ProviderKind,
    load_config,
    providers::{
        ai::factory::create_provider,
        search::{duckduckgo::DuckDuckGoSearch, SearchProvider},
        store::csv_store::CsvRecordStore,
    },
    BatchReport, BatchRunner, PipelineConfig, RefinementOrchestrator, RunStatus,
};
use std::{path::PathBuf, sync::Arc};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

// --- CLI Argument Structs ---

#[derive(Parser, Debug)]
#[command(author, version, about = "Refine knowledge-base entries with an LLM pipeline", long_about = None)]
pub struct Cli {
    /// Input CSV with `Article title`, `Article subtitle` and `Article body` columns.
    pub input: PathBuf,
    /// Where to write the enriched CSV.
    pub output: PathBuf,
    /// The AI provider to use (openai, gemini or local).
    #[arg(short, long)]
    pub provider: Option<ProviderKind>,
    /// Overrides the configured model name.
    #[arg(short, long)]
    pub model: Option<String>,
    /// Index of the first entry to process.
    #[arg(long, default_value_t = 0)]
    pub start: usize,
    /// Number of entries to process. Defaults to all remaining entries.
    #[arg(long)]
    pub batch_size: Option<usize>,
    /// Number of entries refined at the same time.
    #[arg(long)]
    pub concurrency: Option<usize>,
    /// Path to a YAML configuration file.
    #[arg(long)]
    pub config: Option<String>,
}

/// Applies command-line overrides on top of the loaded configuration.
pub fn apply_overrides(cli: &Cli, config: &mut PipelineConfig) -> Result<()> {
    if let Some(kind) = cli.provider {
        if kind != config.provider.kind && cli.model.is_none() {
            config.provider.model_name = kind.default_model().to_string();
        }
        config.provider.kind = kind;
    }
    if let Some(model) = &cli.model {
        config.provider.model_name = model.clone();
    }
    if let Some(concurrency) = cli.concurrency {
        config.batch.concurrency = concurrency;
    }
    config.validate().context("Invalid configuration after applying CLI overrides")?;
    Ok(())
}

/// One line per status plus store failures.
pub fn format_summary(report: &BatchReport) -> String {
    format!(
        "accepted: {}, accepted_with_issues: {}, failed: {}, store_failures: {}, cancelled: {}",
        report.count(RunStatus::Accepted),
        report.count(RunStatus::AcceptedWithIssues),
        report.count(RunStatus::Failed),
        report.store_failures(),
        report.cancelled()
    )
}

pub async fn run(cli: Cli) -> Result<()> {
    let mut config = load_config(cli.config.as_deref()).context("Failed to load configuration")?;
    apply_overrides(&cli, &mut config)?;

    let ai_provider = create_provider(&config.provider)?;
    let search_provider: Arc<dyn SearchProvider> =
        Arc::new(DuckDuckGoSearch::new().context("Failed to build search client")?);
    let store = Arc::new(
        CsvRecordStore::open(&cli.input)
            .with_context(|| format!("Failed to load entries from {}", cli.input.display()))?,
    );

    let orchestrator = RefinementOrchestrator::new(ai_provider, search_provider, &config);
    let runner = BatchRunner::new(orchestrator, store.clone(), config.batch.concurrency);

    let cancel = CancellationToken::new();
    let ctrl_c_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling in-flight runs");
            ctrl_c_token.cancel();
        }
    });

    let report = runner
        .run_range(cli.start, cli.batch_size, &cancel)
        .await
        .context("Failed to list entries")?;

    store
        .save(&cli.output)
        .await
        .with_context(|| format!("Failed to save results to {}", cli.output.display()))?;

    let summary = format_summary(&report);
    info!(output = %cli.output.display(), "{summary}");
    println!("{summary}");

    if report.cancelled() > 0 {
        return Err(anyhow!(
            "interrupted: {} entries were left unprocessed",
            report.cancelled()
        ));
    }
    if !report.is_success() {
        return Err(anyhow!(
            "{} entries failed intent analysis and {} hit store errors",
            report.intent_failures(),
            report.store_failures()
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use kbrefine::batch::EntryOutcome;

    #[test]
    fn provider_switch_picks_matching_model() {
        let cli = Cli::parse_from(["kbrefine", "in.csv", "out.csv", "-p", "gemini"]);
        let mut config = PipelineConfig::default();
        apply_overrides(&cli, &mut config).unwrap();
        assert_eq!(config.provider.kind, ProviderKind::Gemini);
        assert_eq!(config.provider.model_name, "gemini-2.0-flash");
    }

    #[test]
    fn explicit_model_wins() {
        let cli = Cli::parse_from([
            "kbrefine", "in.csv", "out.csv", "-p", "local", "--model", "llama3", "--start", "5",
            "--batch-size", "3",
        ]);
        let mut config = PipelineConfig::default();
        apply_overrides(&cli, &mut config).unwrap();
        assert_eq!(config.provider.model_name, "llama3");
        assert_eq!(cli.start, 5);
        assert_eq!(cli.batch_size, Some(3));
    }

    #[test]
    fn summary_counts_cancelled_entries() {
        let report = BatchReport {
            outcomes: vec![
                EntryOutcome::Cancelled { entry_id: "VXLAN".into() },
                EntryOutcome::Cancelled { entry_id: "EVPN".into() },
            ],
        };
        assert_eq!(
            format_summary(&report),
            "accepted: 0, accepted_with_issues: 0, failed: 0, store_failures: 0, cancelled: 2"
        );
        assert!(report.is_success());
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let cli = Cli::parse_from(["kbrefine", "in.csv", "out.csv", "--concurrency", "0"]);
        let mut config = PipelineConfig::default();
        assert!(apply_overrides(&cli, &mut config).is_err());
    }
}
