/// The boundary tag wrapping the intent analysis payload.
pub const INTENT_TAG: &str = "intent_analysis";

pub const INTENT_SYSTEM_PROMPT: &str = r#"You are a technical taxonomist for Hedgehog's (githedgehog.com) cloud networking knowledge base. Your task is to determine the precise intended meaning of a knowledge-base term before any research or writing happens.

Decide whether the term has one universal industry meaning or a meaning specific to a context, name its primary technical domain, and list which usage contexts apply and which do not. Identify possible relationships to Hedgehog components, rating each as high, medium or low confidence and flagging whether it needs verification.

Respond ONLY with a JSON object wrapped in <intent_analysis> and </intent_analysis> tags. Do not include any other text."#;

/// Placeholders: `{title}`, `{category}`, `{subtitle}`, `{body}`
pub const INTENT_USER_PROMPT: &str = r#"# Entry
Title: {title}
Category: {category}
Subtitle: {subtitle}
Body: {body}

# JSON Output Schema
<intent_analysis>
{
  "classification": {"scope": "universal | context_specific", "primary_domain": "string"},
  "usage_contexts": {"accepted": ["string"], "rejected": ["string"]},
  "core_definition": {"essence": "string", "elements": ["string"]},
  "hedgehog_hints": [
    {"component": "string", "relationship": "string", "confidence": "high | medium | low", "verification_needed": true}
  ],
  "research_guidance": {"primary_focus": ["string"], "scope_notes": ["string"], "verification_needs": ["string"]}
}
</intent_analysis>"#;
