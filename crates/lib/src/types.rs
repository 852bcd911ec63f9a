//! # Pipeline Data Model
//!
//! Records threaded between the refinement stages. Every record is produced once
//! by its stage and treated as read-only afterwards; optional sub-sections are
//! modelled with `Option` or empty collections rather than sentinel values.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

// --- Entry ---

/// A knowledge-base entry as read from the record store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub category: Option<String>,
}

impl Entry {
    /// Creates an entry whose id is its title.
    pub fn new(title: &str, subtitle: &str, body: &str) -> Self {
        Self {
            id: title.to_string(),
            title: title.to_string(),
            subtitle: subtitle.to_string(),
            body: body.to_string(),
            category: None,
        }
    }
}

// --- Intent ---

/// Whether a term has one meaning everywhere or a meaning specific to a context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TermScope {
    Universal,
    #[serde(alias = "context-specific", alias = "contextual")]
    ContextSpecific,
}

impl fmt::Display for TermScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TermScope::Universal => write!(f, "universal"),
            TermScope::ContextSpecific => write!(f, "context_specific"),
        }
    }
}

/// Confidence attached to a model-suggested relationship.
///
/// Matching ignores case and surrounding whitespace. Unrecognized values collapse
/// to `Low` so the three-level invariant always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    #[default]
    Low,
}

impl<'de> Deserialize<'de> for Confidence {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
        Ok(match raw.trim().to_ascii_lowercase().as_str() {
            "high" => Confidence::High,
            "medium" => Confidence::Medium,
            _ => Confidence::Low,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    #[serde(alias = "type")]
    pub scope: TermScope,
    #[serde(default)]
    pub primary_domain: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageContexts {
    #[serde(default)]
    pub accepted: Vec<String>,
    #[serde(default)]
    pub rejected: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoreDefinition {
    #[serde(default)]
    pub essence: String,
    #[serde(default)]
    pub elements: Vec<String>,
}

/// A possible connection between the term and a product component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductHint {
    pub component: String,
    #[serde(default)]
    pub relationship: String,
    #[serde(default)]
    pub confidence: Confidence,
    #[serde(default)]
    pub verification_needed: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResearchGuidance {
    #[serde(default)]
    pub primary_focus: Vec<String>,
    #[serde(default)]
    pub scope_notes: Vec<String>,
    #[serde(default)]
    pub verification_needs: Vec<String>,
}

/// The structured outcome of intent analysis. One per run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentRecord {
    pub classification: Classification,
    #[serde(default)]
    pub usage_contexts: UsageContexts,
    pub core_definition: CoreDefinition,
    pub hedgehog_hints: Vec<ProductHint>,
    pub research_guidance: ResearchGuidance,
}

// --- Research ---

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DirectConnection {
    #[serde(default)]
    pub claim: String,
    #[serde(default)]
    pub evidence: String,
    #[serde(default)]
    pub source: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatternMatch {
    #[serde(default)]
    pub pattern: String,
    #[serde(default)]
    pub relevance: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureMapping {
    #[serde(default)]
    pub feature: String,
    #[serde(default)]
    pub relationship: String,
    #[serde(default)]
    pub confidence: Confidence,
}

/// Traditional versus modern treatment of the concept.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvolutionComparison {
    #[serde(default)]
    pub traditional: String,
    #[serde(default)]
    pub modern: String,
    #[serde(default)]
    pub key_shifts: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BenefitMapping {
    #[serde(default)]
    pub benefit: String,
    #[serde(default)]
    pub mechanism: String,
}

/// Synthesized research for one run. Every sub-section may legitimately be empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResearchRecord {
    pub direct_connections: Vec<DirectConnection>,
    pub architectural_patterns: Vec<PatternMatch>,
    pub feature_mappings: Vec<FeatureMapping>,
    pub evolution: Option<EvolutionComparison>,
    pub benefit_mappings: Vec<BenefitMapping>,
    pub connection_summary: String,
    pub reference_urls: Vec<String>,
    pub hits_considered: usize,
}

impl ResearchRecord {
    /// An empty record whose summary explains why nothing was synthesized.
    pub fn empty(summary: impl Into<String>) -> Self {
        Self {
            connection_summary: summary.into(),
            ..Default::default()
        }
    }

    /// True when no structured sub-section carries content.
    pub fn is_empty(&self) -> bool {
        self.direct_connections.is_empty()
            && self.architectural_patterns.is_empty()
            && self.feature_mappings.is_empty()
            && self.evolution.is_none()
            && self.benefit_mappings.is_empty()
    }
}

// --- Search ---

/// A named source domain that lookups are scoped to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceDomain {
    pub name: String,
    /// The `site:` restriction handed to the search backend.
    pub site: String,
}

impl SourceDomain {
    pub fn new(name: &str, site: &str) -> Self {
        Self {
            name: name.to_string(),
            site: site.to_string(),
        }
    }
}

/// One raw result returned by a search backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub content: String,
    pub source_domain: String,
    #[serde(default)]
    pub url: Option<String>,
    pub observed_at: DateTime<Utc>,
}

// --- Draft ---

/// One candidate entry produced by a single generation attempt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Draft {
    pub subtitle: String,
    pub body: String,
    pub keywords: Vec<String>,
    #[serde(default)]
    pub footnotes: Option<String>,
}

impl Draft {
    /// Keywords with case-insensitive duplicates removed, first occurrence wins.
    pub fn unique_keywords(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.keywords
            .iter()
            .filter(|k| seen.insert(k.to_lowercase()))
            .cloned()
            .collect()
    }
}

// --- Quality ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VerdictStatus {
    Pass,
    Fail,
}

/// The four gated rubric dimensions, each within 0..=10.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityScores {
    pub technical_accuracy: f64,
    pub educational_value: f64,
    pub seo_optimization: f64,
    pub content_structure: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityVerdict {
    pub scores: QualityScores,
    pub overall: f64,
    pub status: VerdictStatus,
    pub blocking_issues: Vec<String>,
    pub feedback: String,
    #[serde(default)]
    pub structure_issues: Vec<String>,
    #[serde(default)]
    pub missing_evolution_elements: Vec<String>,
    #[serde(default)]
    pub missed_opportunities: Vec<String>,
}

impl QualityVerdict {
    pub fn passed(&self) -> bool {
        self.status == VerdictStatus::Pass
    }
}

// --- Run ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Accepted,
    AcceptedWithIssues,
    Failed,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Accepted => write!(f, "accepted"),
            RunStatus::AcceptedWithIssues => write!(f, "accepted_with_issues"),
            RunStatus::Failed => write!(f, "failed"),
        }
    }
}

/// The terminal record of one refinement run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    pub entry_id: String,
    pub status: RunStatus,
    pub reason: String,
    pub draft: Option<Draft>,
    pub intent: Option<IntentRecord>,
    pub research: Option<ResearchRecord>,
    pub verdict: Option<QualityVerdict>,
    pub iterations: u32,
    /// Set when the run was stopped by cancellation rather than by a stage outcome.
    #[serde(default)]
    pub cancelled: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunResult {
    /// True when the run failed before any content could be produced because intent analysis failed.
    pub fn is_intent_failure(&self) -> bool {
        self.status == RunStatus::Failed && self.intent.is_none() && !self.cancelled
    }
}
