//! # Quality Gate
//!
//! Scores a draft on four gated dimensions and decides pass or fail.
//!
//! Structure and SEO fit are computed locally from the draft. Technical accuracy,
//! educational value (the traditional-to-modern narrative) and the advisory
//! product-integration check come from one review generation call. The verdict's
//! feedback text is written to be handed back to the writer unchanged.

pub mod seo;
pub mod structure;

use crate::{
    config::{GenerationConfig, QualityConfig, QualityThresholds, QualityWeights},
    errors::ModelError,
    parser::{decode_structured, extract},
    prompts::{
        quality::{REVIEW_SYSTEM_PROMPT, REVIEW_TAG, REVIEW_USER_PROMPT},
        render,
    },
    providers::ai::{generate_with_timeout, AiProvider},
    types::{Draft, Entry, IntentRecord, QualityScores, QualityVerdict, ResearchRecord, VerdictStatus},
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Default, Deserialize)]
struct TechnicalReview {
    score: f64,
    #[serde(default)]
    notes: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct EvolutionReview {
    score: f64,
    #[serde(default)]
    missing_elements: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ProductReview {
    score: f64,
    #[serde(default)]
    missed_opportunities: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ReviewPayload {
    technical_integration: TechnicalReview,
    content_evolution: EvolutionReview,
    #[serde(default)]
    product_integration: ProductReview,
}

/// Linear combination of the four scores with the configured weights.
pub fn weighted_overall(scores: &QualityScores, weights: &QualityWeights) -> f64 {
    scores.technical_accuracy * weights.technical_accuracy
        + scores.educational_value * weights.educational_value
        + scores.seo_optimization * weights.seo_optimization
        + scores.content_structure * weights.content_structure
}

/// Names of the dimensions below their thresholds, as blocking-issue text.
pub fn blocking_issues(scores: &QualityScores, overall: f64, thresholds: &QualityThresholds) -> Vec<String> {
    [
        ("technical_accuracy", scores.technical_accuracy, thresholds.technical_accuracy),
        ("educational_value", scores.educational_value, thresholds.educational_value),
        ("seo_optimization", scores.seo_optimization, thresholds.seo_optimization),
        ("content_structure", scores.content_structure, thresholds.content_structure),
        ("overall", overall, thresholds.overall),
    ]
    .into_iter()
    .filter(|(_, score, minimum)| score < minimum)
    .map(|(name, score, minimum)| format!("{name} score {score:.2} is below the minimum of {minimum:.1}"))
    .collect()
}

fn push_section(feedback: &mut Vec<String>, heading: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    let mut section = format!("{heading}:");
    for item in items {
        section.push_str("\n- ");
        section.push_str(item);
    }
    feedback.push(section);
}

/// Evaluates drafts against the weighted rubric.
#[derive(Debug, Clone)]
pub struct QualityGate {
    ai_provider: Arc<dyn AiProvider>,
    generation: GenerationConfig,
    config: QualityConfig,
}

impl QualityGate {
    pub fn new(ai_provider: Arc<dyn AiProvider>, generation: GenerationConfig, config: QualityConfig) -> Self {
        Self {
            ai_provider,
            generation,
            config,
        }
    }

    /// Produces a verdict for `draft`. Only the review call can fail.
    pub async fn evaluate(
        &self,
        draft: &Draft,
        entry: &Entry,
        intent: &IntentRecord,
        research: &ResearchRecord,
    ) -> Result<QualityVerdict, ModelError> {
        let structure = structure::check(draft, &self.config);
        let seo = seo::evaluate(&entry.title, draft);

        let response = self.request_review(draft, entry, intent, research).await?;

        let mut blocking = Vec::new();
        let review = match extract(&response, REVIEW_TAG) {
            Some(section) => match decode_structured::<ReviewPayload>(section) {
                Ok(review) => review,
                Err(e) => {
                    warn!(entry_id = %entry.id, line = e.line, column = e.column, error = %e.message, "Quality review is malformed");
                    blocking.push(format!("Quality review could not be parsed: {}", e.message));
                    ReviewPayload::default()
                }
            },
            None => {
                warn!(entry_id = %entry.id, "Quality review has no <{REVIEW_TAG}> section");
                blocking.push(format!("Quality review response had no <{REVIEW_TAG}> section"));
                ReviewPayload::default()
            }
        };

        let scores = QualityScores {
            technical_accuracy: clamp_score(review.technical_integration.score),
            educational_value: clamp_score(review.content_evolution.score),
            seo_optimization: clamp_score(seo.score),
            content_structure: clamp_score(structure.score),
        };
        let overall = weighted_overall(&scores, &self.config.weights);
        let thresholds = &self.config.thresholds;
        blocking.extend(blocking_issues(&scores, overall, thresholds));

        let product_score = clamp_score(review.product_integration.score);
        let status = if blocking.is_empty() {
            VerdictStatus::Pass
        } else {
            VerdictStatus::Fail
        };

        let mut sections = Vec::new();
        push_section(&mut sections, "Blocking issues", &blocking);
        push_section(&mut sections, "Structural issues", &structure.issues);
        if scores.seo_optimization < thresholds.seo_optimization {
            push_section(&mut sections, "SEO notes", &seo.notes);
        }
        push_section(
            &mut sections,
            "Missing evolution elements",
            &review.content_evolution.missing_elements,
        );
        push_section(&mut sections, "Technical notes", &review.technical_integration.notes);
        if product_score < thresholds.product_integration {
            push_section(
                &mut sections,
                "Missed product integration opportunities",
                &review.product_integration.missed_opportunities,
            );
        }

        info!(
            entry_id = %entry.id,
            status = ?status,
            overall,
            technical = scores.technical_accuracy,
            educational = scores.educational_value,
            seo = scores.seo_optimization,
            structure = scores.content_structure,
            product = product_score,
            "Quality evaluation complete"
        );

        Ok(QualityVerdict {
            scores,
            overall,
            status,
            blocking_issues: blocking,
            feedback: sections.join("\n\n"),
            structure_issues: structure.issues,
            missing_evolution_elements: review.content_evolution.missing_elements,
            missed_opportunities: review.product_integration.missed_opportunities,
        })
    }

    async fn request_review(
        &self,
        draft: &Draft,
        entry: &Entry,
        intent: &IntentRecord,
        research: &ResearchRecord,
    ) -> Result<String, ModelError> {
        let intent_json = serde_json::to_string_pretty(intent).unwrap_or_default();
        let evidence_json = serde_json::to_string_pretty(&research.direct_connections).unwrap_or_default();
        let evolution_json = match &research.evolution {
            Some(evolution) => serde_json::to_string_pretty(evolution).unwrap_or_default(),
            None => "None provided.".to_string(),
        };
        let user_prompt = render(
            REVIEW_USER_PROMPT,
            &[
                ("title", &entry.title),
                ("subtitle", &draft.subtitle),
                ("body", &draft.body),
                ("intent", &intent_json),
                ("evidence", &evidence_json),
                ("evolution", &evolution_json),
            ],
        );

        generate_with_timeout(
            self.ai_provider.as_ref(),
            REVIEW_SYSTEM_PROMPT,
            &user_prompt,
            &self.generation.review.params(),
            self.generation.timeout(),
        )
        .await
    }
}

fn clamp_score(score: f64) -> f64 {
    if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, 10.0)
    }
}
