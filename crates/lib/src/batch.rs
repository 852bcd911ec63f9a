//! # Batch Processing
//!
//! Reads entries from a [`RecordStore`], refines a bounded number of them at the
//! same time, and writes each outcome back as metadata columns. Runs are
//! isolated: a store failure or a failed run on one entry never stops the rest.

use crate::{
    errors::StoreError,
    orchestrator::RefinementOrchestrator,
    providers::store::{
        RecordStore, BODY_COLUMN, ISSUES_COLUMN, KEYWORDS_COLUMN, REFERENCE_URLS_COLUMN,
        RELEVANT_SNIPPETS_COLUMN, STATUS_COLUMN, SUBTITLE_COLUMN, TIMESTAMP_COLUMN,
    },
    types::{RunResult, RunStatus},
};
use futures::{stream::FuturesUnordered, StreamExt};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// The outcome for one entry of a batch.
#[derive(Debug)]
pub enum EntryOutcome {
    /// The run completed and its result was written back.
    Completed(RunResult),
    /// The entry could not be read, or its result could not be written.
    StoreFailed { entry_id: String, error: StoreError },
    /// Cancellation arrived before or during the run. Nothing was written.
    Cancelled { entry_id: String },
}

impl EntryOutcome {
    pub fn entry_id(&self) -> &str {
        match self {
            EntryOutcome::Completed(result) => &result.entry_id,
            EntryOutcome::StoreFailed { entry_id, .. } | EntryOutcome::Cancelled { entry_id } => {
                entry_id
            }
        }
    }
}

/// Per-entry outcomes of a batch, in input order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<EntryOutcome>,
}

impl BatchReport {
    pub fn results(&self) -> impl Iterator<Item = &RunResult> {
        self.outcomes.iter().filter_map(|o| match o {
            EntryOutcome::Completed(result) => Some(result),
            EntryOutcome::StoreFailed { .. } | EntryOutcome::Cancelled { .. } => None,
        })
    }

    pub fn count(&self, status: RunStatus) -> usize {
        self.results().filter(|r| r.status == status).count()
    }

    pub fn store_failures(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, EntryOutcome::StoreFailed { .. }))
            .count()
    }

    pub fn intent_failures(&self) -> usize {
        self.results().filter(|r| r.is_intent_failure()).count()
    }

    pub fn cancelled(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, EntryOutcome::Cancelled { .. }))
            .count()
    }

    /// False when any entry hit a store failure or an intent-class failure.
    pub fn is_success(&self) -> bool {
        self.store_failures() == 0 && self.intent_failures() == 0
    }
}

/// The metadata columns written back for a finished run.
pub fn result_fields(result: &RunResult) -> BTreeMap<String, String> {
    let mut fields = BTreeMap::new();
    // Only accepted drafts replace the entry's content.
    if let (RunStatus::Accepted | RunStatus::AcceptedWithIssues, Some(draft)) = (result.status, &result.draft) {
        fields.insert(SUBTITLE_COLUMN.to_string(), draft.subtitle.clone());
        fields.insert(BODY_COLUMN.to_string(), draft.body.clone());
        fields.insert(KEYWORDS_COLUMN.to_string(), draft.unique_keywords().join(", "));
    }
    let issues = match result.status {
        RunStatus::Accepted => String::new(),
        RunStatus::AcceptedWithIssues => match &result.verdict {
            Some(verdict) if !verdict.blocking_issues.is_empty() => verdict.blocking_issues.join("; "),
            _ => result.reason.clone(),
        },
        RunStatus::Failed => result.reason.clone(),
    };
    fields.insert(STATUS_COLUMN.to_string(), result.status.to_string());
    fields.insert(ISSUES_COLUMN.to_string(), issues);
    fields.insert(TIMESTAMP_COLUMN.to_string(), result.finished_at.to_rfc3339());
    let (urls, snippets) = match &result.research {
        Some(research) => (research.reference_urls.join("; "), research.connection_summary.clone()),
        None => (String::new(), String::new()),
    };
    fields.insert(REFERENCE_URLS_COLUMN.to_string(), urls);
    fields.insert(RELEVANT_SNIPPETS_COLUMN.to_string(), snippets);
    fields
}

#[derive(Debug, Clone)]
pub struct BatchRunner {
    orchestrator: RefinementOrchestrator,
    store: Arc<dyn RecordStore>,
    concurrency: usize,
}

impl BatchRunner {
    pub fn new(orchestrator: RefinementOrchestrator, store: Arc<dyn RecordStore>, concurrency: usize) -> Self {
        Self {
            orchestrator,
            store,
            concurrency: concurrency.max(1),
        }
    }

    /// Processes up to `limit` entries starting at position `start` in the store.
    pub async fn run_range(
        &self,
        start: usize,
        limit: Option<usize>,
        cancel: &CancellationToken,
    ) -> Result<BatchReport, StoreError> {
        let ids: Vec<String> = self
            .store
            .ids()
            .await?
            .into_iter()
            .skip(start)
            .take(limit.unwrap_or(usize::MAX))
            .collect();
        info!(start, entries = ids.len(), concurrency = self.concurrency, "Starting batch");
        Ok(self.run(&ids, cancel).await)
    }

    /// Processes the given entries. Outcomes are returned in the order of `ids`.
    pub async fn run(&self, ids: &[String], cancel: &CancellationToken) -> BatchReport {
        let semaphore = Semaphore::new(self.concurrency);
        let mut tasks = FuturesUnordered::new();

        for (index, entry_id) in ids.iter().enumerate() {
            let semaphore = &semaphore;
            tasks.push(async move {
                let _permit = semaphore.acquire().await.ok();
                (index, self.process(entry_id, cancel).await)
            });
        }

        let mut indexed = Vec::with_capacity(ids.len());
        while let Some(item) = tasks.next().await {
            indexed.push(item);
        }
        indexed.sort_by_key(|(index, _)| *index);

        let report = BatchReport {
            outcomes: indexed.into_iter().map(|(_, outcome)| outcome).collect(),
        };
        info!(
            accepted = report.count(RunStatus::Accepted),
            accepted_with_issues = report.count(RunStatus::AcceptedWithIssues),
            failed = report.count(RunStatus::Failed),
            store_failures = report.store_failures(),
            cancelled = report.cancelled(),
            "Batch complete"
        );
        report
    }

    async fn process(&self, entry_id: &str, cancel: &CancellationToken) -> EntryOutcome {
        let skipped = || EntryOutcome::Cancelled {
            entry_id: entry_id.to_string(),
        };
        if cancel.is_cancelled() {
            return skipped();
        }
        let entry = match self.store.read(entry_id).await {
            Ok(entry) => entry,
            Err(error) => {
                error!(entry_id, %error, "Failed to read entry");
                return EntryOutcome::StoreFailed {
                    entry_id: entry_id.to_string(),
                    error,
                };
            }
        };

        let result = self.orchestrator.run_with_cancel(&entry, cancel).await;
        if result.cancelled {
            warn!(entry_id, "Run cancelled, leaving entry unchanged");
            return skipped();
        }

        if let Err(error) = self.store.write(entry_id, &result_fields(&result)).await {
            error!(entry_id, %error, "Failed to write run result");
            return EntryOutcome::StoreFailed {
                entry_id: entry_id.to_string(),
                error,
            };
        }
        EntryOutcome::Completed(result)
    }
}
