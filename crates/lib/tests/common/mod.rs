#![allow(dead_code)]
//! # Common Test Utilities
//!
//! Shared fixtures for the pipeline tests: tracing setup, keys matching each
//! stage's system prompt, and canned model responses.

use kbrefine::config::PipelineConfig;
use kbrefine::types::Entry;
use std::sync::Once;

static INIT: Once = Once::new();

/// Initializes the tracing subscriber once per test binary.
pub fn setup_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

// --- System prompt keys for `MockAiProvider` ---

pub const INTENT_KEY: &str = "technical taxonomist";
pub const SYNTHESIS_KEY: &str = "research analyst";
pub const WRITER_KEY: &str = "expert technical educator";
pub const REVIEW_KEY: &str = "senior technical editor";

/// Default configuration with lookup spacing disabled.
pub fn test_config() -> PipelineConfig {
    let mut config = PipelineConfig::default();
    config.research.lookup_interval_ms = 0;
    config
}

pub fn vxlan_entry() -> Entry {
    Entry::new("VXLAN", "", "")
}

/// `n` filler words.
pub fn filler(n: usize) -> String {
    vec!["filler"; n].join(" ")
}

// --- Canned responses ---

pub fn intent_response() -> String {
    r#"Here is my analysis.
<intent_analysis>
{
  "classification": {"scope": "universal", "primary_domain": "network virtualization"},
  "usage_contexts": {"accepted": ["data center overlays"], "rejected": ["video codecs"]},
  "core_definition": {"essence": "An L2-over-L3 encapsulation", "elements": ["VNI", "VTEP"]},
  "hedgehog_hints": [
    {"component": "VPC", "relationship": "VPCs are built on VXLAN overlays", "confidence": "high", "verification_needed": true},
    {"component": "Gateway", "relationship": "possible", "confidence": "somewhat", "verification_needed": false}
  ],
  "research_guidance": {
    "primary_focus": ["VPC overlay"],
    "scope_notes": ["focus on data center use"],
    "verification_needs": ["EVPN control plane"]
  }
}
</intent_analysis>"#
        .to_string()
}

pub fn synthesis_response() -> String {
    r#"<direct_connections>
[{"claim": "Hedgehog VPCs use VXLAN", "evidence": "Hedgehog fabric uses VXLAN EVPN for VPC isolation", "source": "https://docs.githedgehog.com/vpc"}]
</direct_connections>
<architectural_patterns>
[{"pattern": "leaf spine fabric", "relevance": "VXLAN runs over the routed underlay"}]
</architectural_patterns>
<feature_mappings>
[{"feature": "VPC", "relationship": "implemented with VXLAN VNIs", "confidence": "high"}]
</feature_mappings>
<evolution_comparison>
{"traditional": "VLAN stretching", "modern": "VXLAN overlays", "key_shifts": ["16M segments"]}
</evolution_comparison>
<benefit_mappings>
[{"benefit": "tenant isolation", "mechanism": "separate VNIs"}]
</benefit_mappings>
<connection_summary>Hedgehog builds VPCs on VXLAN EVPN overlays.</connection_summary>"#
        .to_string()
}

/// A writer response whose body is `paragraphs` and whose subtitle has `subtitle_words` words.
pub fn writer_response(subtitle_words: usize, paragraphs: &[String], keywords: &str) -> String {
    let body: String = paragraphs.iter().map(|p| format!("<p>{p}</p>")).collect();
    format!(
        "<entry>\n<subtitle>{}</subtitle>\n<body>{body}</body>\n<keywords>{keywords}</keywords>\n</entry>",
        filler(subtitle_words)
    )
}

/// A draft that passes every deterministic check: a 60-word subtitle, four
/// 100-word paragraphs and one keyword near the target density.
pub fn passing_writer_response() -> String {
    let paragraphs: Vec<String> = (0..4).map(|_| format!("overlay {}", filler(99))).collect();
    writer_response(60, &paragraphs, "overlay")
}

/// Same as [`passing_writer_response`] but with a distinctive subtitle marker.
pub fn tagged_writer_response(tag: &str) -> String {
    passing_writer_response().replacen("<subtitle>", &format!("<subtitle>{tag} "), 1)
}

/// A draft whose body contains an `<h2>` header.
pub fn header_writer_response() -> String {
    let paragraphs: Vec<String> = (0..3).map(|_| format!("overlay {}", filler(99))).collect();
    writer_response(60, &paragraphs, "overlay")
        .replacen("<body>", "<body><h2>Overview</h2>", 1)
}

pub fn review_response(technical: f64, evolution: f64, product: f64) -> String {
    format!(
        r#"<quality_review>
{{
  "technical_integration": {{"score": {technical}, "notes": ["Clarify the VTEP role"]}},
  "content_evolution": {{"score": {evolution}, "missing_elements": ["Explain why VLAN limits mattered"]}},
  "product_integration": {{"score": {product}, "missed_opportunities": ["Mention VPC peering"]}}
}}
</quality_review>"#
    )
}

pub fn passing_review() -> String {
    review_response(9.0, 8.0, 7.0)
}

pub fn failing_review() -> String {
    review_response(5.0, 8.0, 7.0)
}
