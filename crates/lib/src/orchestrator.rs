//! # Refinement Orchestrator
//!
//! Drives one entry through the fixed stage sequence:
//!
//! ```text
//! Start -> Intent -> Research -> Generate -> Evaluate -> Accepted
//!                                   ^            |
//!                                   +-- Retry <--+--> Exhausted
//! ```
//!
//! Intent and research run exactly once per run. Generation and evaluation
//! alternate until a verdict passes or `max_iterations` attempts have been made.
//! Every run ends in a [`RunResult`]; nothing is raised to the caller. A
//! cancelled run keeps its intent and research but never an unjudged draft.

use crate::{
    config::PipelineConfig,
    errors::ModelError,
    generation::ContentGenerator,
    intent::IntentAnalyzer,
    providers::{ai::AiProvider, search::SearchProvider},
    quality::QualityGate,
    research::ResearchCollector,
    types::{Draft, Entry, IntentRecord, QualityVerdict, ResearchRecord, RunResult, RunStatus},
};
use chrono::{DateTime, Utc};
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

pub const CANCELLED_REASON: &str = "run cancelled";
pub const GENERATION_FAILED_REASON: &str = "content generation failed";

/// The stage a run is currently in. Used for log context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Start,
    Intent,
    Research,
    Generate,
    Evaluate,
    Retry,
    Accepted,
    Exhausted,
}

// Everything produced so far in a run, finished into a `RunResult`.
struct RunTrace {
    entry_id: String,
    started_at: DateTime<Utc>,
    intent: Option<IntentRecord>,
    research: Option<ResearchRecord>,
    draft: Option<Draft>,
    verdict: Option<QualityVerdict>,
    iterations: u32,
    cancelled: bool,
}

impl RunTrace {
    fn new(entry_id: &str) -> Self {
        Self {
            entry_id: entry_id.to_string(),
            started_at: Utc::now(),
            intent: None,
            research: None,
            draft: None,
            verdict: None,
            iterations: 0,
            cancelled: false,
        }
    }

    fn cancel(mut self) -> RunResult {
        warn!(entry_id = %self.entry_id, iterations = self.iterations, "Run cancelled");
        self.draft = None;
        self.verdict = None;
        self.cancelled = true;
        self.finish(RunStatus::Failed, CANCELLED_REASON.to_string())
    }

    fn finish(self, status: RunStatus, reason: String) -> RunResult {
        info!(
            entry_id = %self.entry_id,
            status = %status,
            iterations = self.iterations,
            "Run finished"
        );
        RunResult {
            entry_id: self.entry_id,
            status,
            reason,
            draft: self.draft,
            intent: self.intent,
            research: self.research,
            verdict: self.verdict,
            iterations: self.iterations,
            cancelled: self.cancelled,
            started_at: self.started_at,
            finished_at: Utc::now(),
        }
    }
}

// Resolves to `None` if the token fires before the future completes.
async fn until_cancelled<F: Future>(cancel: &CancellationToken, fut: F) -> Option<F::Output> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => None,
        output = fut => Some(output),
    }
}

fn transition(entry_id: &str, state: RunState) {
    debug!(entry_id, state = ?state, "Run state transition");
}

/// Runs the intent, research, generate and evaluate stages for an entry.
#[derive(Debug, Clone)]
pub struct RefinementOrchestrator {
    intent: IntentAnalyzer,
    research: ResearchCollector,
    generator: ContentGenerator,
    gate: QualityGate,
    max_iterations: u32,
}

impl RefinementOrchestrator {
    /// Builds every stage from one pair of injected providers.
    pub fn new(
        ai_provider: Arc<dyn AiProvider>,
        search_provider: Arc<dyn SearchProvider>,
        config: &PipelineConfig,
    ) -> Self {
        Self {
            intent: IntentAnalyzer::new(ai_provider.clone(), config.generation.clone()),
            research: ResearchCollector::new(
                ai_provider.clone(),
                search_provider,
                config.research.clone(),
                config.generation.clone(),
            ),
            generator: ContentGenerator::new(ai_provider.clone(), config.generation.clone()),
            gate: QualityGate::new(ai_provider, config.generation.clone(), config.quality.clone()),
            max_iterations: config.generation.max_iterations.max(1),
        }
    }

    pub async fn run(&self, entry: &Entry) -> RunResult {
        self.run_with_cancel(entry, &CancellationToken::new()).await
    }

    /// Runs the pipeline, stopping early with a failed result if `cancel` fires.
    pub async fn run_with_cancel(&self, entry: &Entry, cancel: &CancellationToken) -> RunResult {
        let mut trace = RunTrace::new(&entry.id);
        transition(&entry.id, RunState::Start);
        info!(entry_id = %entry.id, title = %entry.title, "Starting refinement run");

        // --- 1. Intent ---
        transition(&entry.id, RunState::Intent);
        let intent = match until_cancelled(cancel, self.intent.analyze(entry)).await {
            None => return trace.cancel(),
            Some(Err(e)) => {
                error!(entry_id = %entry.id, error = %e, "Intent analysis failed");
                return trace.finish(RunStatus::Failed, format!("intent analysis failed: {e}"));
            }
            Some(Ok(intent)) => intent,
        };
        let intent = trace.intent.insert(intent).clone();

        // --- 2. Research ---
        transition(&entry.id, RunState::Research);
        let Some(research) = until_cancelled(cancel, self.research.collect(entry, &intent)).await else {
            return trace.cancel();
        };
        let research = trace.research.insert(research).clone();

        // --- 3. Generate / Evaluate ---
        // `trace.verdict` always judges `trace.draft`; `feedback` carries the latest
        // verdict forward even when a later evaluation fails.
        let mut feedback = String::new();
        let mut generation_error: Option<ModelError> = None;
        let mut evaluation_error: Option<ModelError> = None;
        while trace.iterations < self.max_iterations {
            if cancel.is_cancelled() {
                return trace.cancel();
            }
            trace.iterations += 1;
            let attempt = trace.iterations;

            transition(&entry.id, RunState::Generate);
            let generated = until_cancelled(
                cancel,
                self.generator.generate(entry, &research, &intent, &feedback),
            )
            .await;
            let draft = match generated {
                None => return trace.cancel(),
                Some(Err(e)) => {
                    warn!(entry_id = %entry.id, attempt, error = %e, kind = ?e.kind(), "Generation attempt failed");
                    generation_error = Some(e);
                    continue;
                }
                Some(Ok(draft)) => {
                    trace.verdict = None;
                    trace.draft.insert(draft).clone()
                }
            };

            transition(&entry.id, RunState::Evaluate);
            let evaluated = until_cancelled(
                cancel,
                self.gate.evaluate(&draft, entry, &intent, &research),
            )
            .await;
            match evaluated {
                None => return trace.cancel(),
                Some(Err(e)) => {
                    warn!(entry_id = %entry.id, attempt, error = %e, kind = ?e.kind(), "Evaluation attempt failed");
                    evaluation_error = Some(e);
                }
                Some(Ok(verdict)) => {
                    let passed = verdict.passed();
                    let overall = verdict.overall;
                    feedback = verdict.feedback.clone();
                    trace.verdict = Some(verdict);
                    if passed {
                        transition(&entry.id, RunState::Accepted);
                        return trace.finish(
                            RunStatus::Accepted,
                            format!("passed quality gate on attempt {attempt} with overall score {overall:.2}"),
                        );
                    }
                    info!(entry_id = %entry.id, attempt, overall, "Draft failed quality gate");
                }
            }
            if trace.iterations < self.max_iterations {
                transition(&entry.id, RunState::Retry);
            }
        }

        // --- 4. Exhausted ---
        transition(&entry.id, RunState::Exhausted);
        if trace.draft.is_none() {
            let reason = match &generation_error {
                Some(e) => format!("{GENERATION_FAILED_REASON}: {e}"),
                None => GENERATION_FAILED_REASON.to_string(),
            };
            return trace.finish(RunStatus::Failed, reason);
        }

        let caveat = match (&trace.verdict, &evaluation_error) {
            (Some(verdict), _) => verdict.feedback.clone(),
            (None, Some(e)) => format!("quality evaluation unavailable: {e}"),
            (None, None) => "quality evaluation unavailable".to_string(),
        };
        let reason = format!(
            "quality gate not passed after {} attempts; issues:\n{caveat}",
            trace.iterations
        );
        trace.finish(RunStatus::AcceptedWithIssues, reason)
    }
}
