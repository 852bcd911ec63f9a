pub const REVIEW_TAG: &str = "quality_review";

pub const REVIEW_SYSTEM_PROMPT: &str = r#"You are a senior technical editor reviewing glossary entries for Hedgehog's knowledge base. Score each dimension from 0 to 10.

- technical_integration: factual correctness, appropriate depth, and whether claims are backed by the direct-connection evidence provided.
- content_evolution: whether the entry walks the reader from the traditional approach to the modern one. List any expected narrative element that is missing.
- product_integration: whether the Hedgehog connection is present, specific and supported. List missed opportunities for a stronger, evidence-backed connection.

Respond ONLY with a JSON object wrapped in <quality_review> and </quality_review> tags."#;

/// Placeholders: `{title}`, `{subtitle}`, `{body}`, `{intent}`, `{evidence}`, `{evolution}`
pub const REVIEW_USER_PROMPT: &str = r#"# Term
{title}

# Entry Under Review
Subtitle: {subtitle}
Body: {body}

# Intent Analysis
{intent}

# Direct-Connection Evidence
{evidence}

# Expected Evolution Narrative
{evolution}

# JSON Output Schema
<quality_review>
{
  "technical_integration": {"score": 0.0, "notes": ["string"]},
  "content_evolution": {"score": 0.0, "missing_elements": ["string"]},
  "product_integration": {"score": 0.0, "missed_opportunities": ["string"]}
}
</quality_review>"#;
