pub const DIRECT_CONNECTIONS_TAG: &str = "direct_connections";
pub const PATTERNS_TAG: &str = "architectural_patterns";
pub const FEATURE_MAPPINGS_TAG: &str = "feature_mappings";
pub const EVOLUTION_TAG: &str = "evolution_comparison";
pub const BENEFITS_TAG: &str = "benefit_mappings";
pub const SUMMARY_TAG: &str = "connection_summary";

pub const SYNTHESIS_SYSTEM_PROMPT: &str = r#"You are a research analyst connecting a technical concept to Hedgehog's open network fabric. You receive raw search snippets and a structured intent analysis. Use only the snippets as evidence; when evidence is thin, return fewer items rather than inventing connections.

Answer with six sections, each wrapped in its own tags. The first five contain JSON; the last contains two or three plain sentences. Do not include any other text."#;

/// Placeholders: `{title}`, `{intent}`, `{hits}`
pub const SYNTHESIS_USER_PROMPT: &str = r#"# Term
{title}

# Intent Analysis
{intent}

# Raw Research Snippets
{hits}

# Output Format
<direct_connections>
[{"claim": "string", "evidence": "verbatim snippet text", "source": "url or null"}]
</direct_connections>
<architectural_patterns>
[{"pattern": "string", "relevance": "string"}]
</architectural_patterns>
<feature_mappings>
[{"feature": "string", "relationship": "string", "confidence": "high | medium | low"}]
</feature_mappings>
<evolution_comparison>
{"traditional": "string", "modern": "string", "key_shifts": ["string"]}
</evolution_comparison>
<benefit_mappings>
[{"benefit": "string", "mechanism": "string"}]
</benefit_mappings>
<connection_summary>
Plain-text summary of how the term connects to Hedgehog.
</connection_summary>"#;
