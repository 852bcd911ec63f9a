//! # Intent Analysis
//!
//! The first stage of a run. It asks the model what a term actually means
//! before anything is researched or written, and turns the answer into an
//! [`IntentRecord`]. A failure here is fatal for the run: without an intended
//! meaning the later stages have nothing to anchor to.

use crate::{
    config::GenerationConfig,
    errors::IntentError,
    parser::{decode_structured, extract},
    prompts::{
        intent::{INTENT_SYSTEM_PROMPT, INTENT_TAG, INTENT_USER_PROMPT},
        render,
    },
    providers::ai::{generate_with_timeout, AiProvider},
    types::{Classification, CoreDefinition, Entry, IntentRecord, ProductHint, ResearchGuidance, UsageContexts},
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

// Mirrors `IntentRecord` with every top-level field optional so that a missing
// mandatory field is reported by name instead of as a generic decode error.
#[derive(Deserialize)]
struct RawIntent {
    classification: Option<Classification>,
    #[serde(default)]
    usage_contexts: Option<UsageContexts>,
    core_definition: Option<CoreDefinition>,
    hedgehog_hints: Option<Vec<ProductHint>>,
    research_guidance: Option<ResearchGuidance>,
}

impl TryFrom<RawIntent> for IntentRecord {
    type Error = IntentError;

    fn try_from(raw: RawIntent) -> Result<Self, Self::Error> {
        Ok(IntentRecord {
            classification: raw
                .classification
                .ok_or(IntentError::MissingField("classification"))?,
            usage_contexts: raw.usage_contexts.unwrap_or_default(),
            core_definition: raw
                .core_definition
                .ok_or(IntentError::MissingField("core_definition"))?,
            hedgehog_hints: raw
                .hedgehog_hints
                .ok_or(IntentError::MissingField("hedgehog_hints"))?,
            research_guidance: raw
                .research_guidance
                .ok_or(IntentError::MissingField("research_guidance"))?,
        })
    }
}

/// Determines the intended meaning of an entry with a single generation call.
#[derive(Debug, Clone)]
pub struct IntentAnalyzer {
    ai_provider: Arc<dyn AiProvider>,
    config: GenerationConfig,
}

impl IntentAnalyzer {
    pub fn new(ai_provider: Arc<dyn AiProvider>, config: GenerationConfig) -> Self {
        Self {
            ai_provider,
            config,
        }
    }

    /// Analyzes `entry` and returns its intent record.
    ///
    /// Only the title is required; an empty subtitle or body is sent as-is.
    /// There is no retry: any model, marker or decode failure is returned.
    pub async fn analyze(&self, entry: &Entry) -> Result<IntentRecord, IntentError> {
        if entry.title.trim().is_empty() {
            return Err(IntentError::EmptyTitle);
        }

        let user_prompt = render(
            INTENT_USER_PROMPT,
            &[
                ("title", &entry.title),
                ("category", entry.category.as_deref().unwrap_or("Uncategorized")),
                ("subtitle", &entry.subtitle),
                ("body", &entry.body),
            ],
        );

        info!(entry_id = %entry.id, "Analyzing term intent");
        let response = generate_with_timeout(
            self.ai_provider.as_ref(),
            INTENT_SYSTEM_PROMPT,
            &user_prompt,
            &self.config.intent.params(),
            self.config.timeout(),
        )
        .await?;

        let section = extract(&response, INTENT_TAG).ok_or_else(|| {
            warn!(entry_id = %entry.id, "Intent response has no <{INTENT_TAG}> section");
            IntentError::MissingSection(INTENT_TAG)
        })?;

        let raw: RawIntent = decode_structured(section)?;
        let record = IntentRecord::try_from(raw)?;
        debug!(
            entry_id = %entry.id,
            scope = %record.classification.scope,
            hints = record.hedgehog_hints.len(),
            "Intent analysis complete"
        );
        Ok(record)
    }
}
