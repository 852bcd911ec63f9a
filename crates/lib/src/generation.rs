//! # Content Generation
//!
//! Produces one [`Draft`] per call from the entry, its intent record, the
//! synthesized research and any feedback left by the previous review.

use crate::{
    config::GenerationConfig,
    errors::ModelError,
    parser::{extract, extract_trimmed},
    prompts::{
        generation::{
            BODY_TAG, ENTRY_TAG, FOOTNOTES_TAG, KEYWORDS_TAG, KEYWORD_DELIMITER, NO_FEEDBACK,
            SUBTITLE_TAG, WRITER_SYSTEM_PROMPT, WRITER_USER_PROMPT,
        },
        render,
    },
    providers::ai::{generate_with_timeout, AiProvider},
    types::{Draft, Entry, IntentRecord, ResearchRecord},
};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct ContentGenerator {
    ai_provider: Arc<dyn AiProvider>,
    config: GenerationConfig,
}

impl ContentGenerator {
    pub fn new(ai_provider: Arc<dyn AiProvider>, config: GenerationConfig) -> Self {
        Self {
            ai_provider,
            config,
        }
    }

    /// Generates a draft. `prior_feedback` is embedded in the prompt verbatim.
    pub async fn generate(
        &self,
        entry: &Entry,
        research: &ResearchRecord,
        intent: &IntentRecord,
        prior_feedback: &str,
    ) -> Result<Draft, ModelError> {
        let intent_json = serde_json::to_string_pretty(intent).unwrap_or_default();
        let research_json = serde_json::to_string_pretty(research).unwrap_or_default();
        let feedback = if prior_feedback.trim().is_empty() {
            NO_FEEDBACK
        } else {
            prior_feedback
        };
        let user_prompt = render(
            WRITER_USER_PROMPT,
            &[
                ("title", &entry.title),
                ("current_subtitle", &entry.subtitle),
                ("current_body", &entry.body),
                ("intent", &intent_json),
                ("research", &research_json),
                ("feedback", feedback),
            ],
        );

        info!(entry_id = %entry.id, revision = !prior_feedback.trim().is_empty(), "Generating draft");
        let response = generate_with_timeout(
            self.ai_provider.as_ref(),
            WRITER_SYSTEM_PROMPT,
            &user_prompt,
            &self.config.writer.params(),
            self.config.timeout(),
        )
        .await?;

        let draft = parse_draft(&response);
        if draft.body.is_empty() {
            warn!(entry_id = %entry.id, "Draft response has no body section");
        }
        debug!(
            entry_id = %entry.id,
            keywords = draft.keywords.len(),
            body_chars = draft.body.len(),
            "Draft parsed"
        );
        Ok(draft)
    }
}

/// Parses a writer response. Missing sections become empty values.
pub fn parse_draft(response: &str) -> Draft {
    let scope = extract(response, ENTRY_TAG).unwrap_or(response);
    let section = |tag: &str| {
        extract_trimmed(scope, tag)
            .unwrap_or_default()
            .to_string()
    };

    Draft {
        subtitle: section(SUBTITLE_TAG),
        body: section(BODY_TAG),
        keywords: extract(scope, KEYWORDS_TAG)
            .map(split_keywords)
            .unwrap_or_default(),
        footnotes: extract_trimmed(scope, FOOTNOTES_TAG).map(str::to_string),
    }
}

fn split_keywords(raw: &str) -> Vec<String> {
    raw.split(KEYWORD_DELIMITER)
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_wrapped_entry() {
        let draft = parse_draft(
            "preamble <entry><subtitle> A sub </subtitle><body><p>Text</p></body>\
             <keywords>vxlan, , overlay network ,VXLAN</keywords></entry>",
        );
        assert_eq!(draft.subtitle, "A sub");
        assert_eq!(draft.body, "<p>Text</p>");
        assert_eq!(draft.keywords, vec!["vxlan", "overlay network", "VXLAN"]);
        assert_eq!(draft.unique_keywords(), vec!["vxlan", "overlay network"]);
        assert!(draft.footnotes.is_none());
    }

    #[test]
    fn missing_sections_are_empty() {
        let draft = parse_draft("<subtitle>Only a subtitle</subtitle>");
        assert_eq!(draft.subtitle, "Only a subtitle");
        assert!(draft.body.is_empty());
        assert!(draft.keywords.is_empty());
    }
}
