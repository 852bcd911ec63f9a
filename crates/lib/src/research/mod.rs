//! # Research Collection
//!
//! Builds a query set for a term, fans lookups out over every configured source
//! domain, collapses duplicate hits by fingerprint, and asks the model to
//! synthesize what was found into a [`ResearchRecord`].
//!
//! Research never fails a run. Lookup failures contribute nothing, and a failed
//! synthesis call degrades to an empty record whose summary says why.

pub mod catalog;
pub mod fingerprint;
pub mod limiter;

use crate::{
    config::{GenerationConfig, ResearchConfig},
    errors::SearchError,
    parser::{decode_section_or_default, extract_trimmed},
    prompts::{
        render,
        research::{
            BENEFITS_TAG, DIRECT_CONNECTIONS_TAG, EVOLUTION_TAG, FEATURE_MAPPINGS_TAG, PATTERNS_TAG,
            SUMMARY_TAG, SYNTHESIS_SYSTEM_PROMPT, SYNTHESIS_USER_PROMPT,
        },
    },
    providers::{
        ai::{generate_with_timeout, AiProvider},
        search::SearchProvider,
    },
    types::{Entry, EvolutionComparison, IntentRecord, ResearchRecord, SearchHit, SourceDomain},
};
use futures::{stream::FuturesUnordered, StreamExt};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

pub use limiter::IntervalLimiter;

/// Summary recorded when no lookup produced a usable hit.
pub const NO_MATERIAL_SUMMARY: &str = "No research material was found for this term.";

/// Gathers and synthesizes supporting research for one entry.
#[derive(Debug, Clone)]
pub struct ResearchCollector {
    ai_provider: Arc<dyn AiProvider>,
    search_provider: Arc<dyn SearchProvider>,
    limiter: Arc<IntervalLimiter>,
    config: ResearchConfig,
    generation: GenerationConfig,
}

impl ResearchCollector {
    pub fn new(
        ai_provider: Arc<dyn AiProvider>,
        search_provider: Arc<dyn SearchProvider>,
        config: ResearchConfig,
        generation: GenerationConfig,
    ) -> Self {
        let limiter = Arc::new(IntervalLimiter::new(config.lookup_interval()));
        Self {
            ai_provider,
            search_provider,
            limiter,
            config,
            generation,
        }
    }

    /// Builds the deduplicated query set for a term.
    ///
    /// Order: the raw title, the title with each catalog phrase, then the title
    /// with each research focus and verification need from the intent record.
    pub fn build_queries(&self, entry: &Entry, intent: &IntentRecord) -> Vec<String> {
        let title = entry.title.trim();
        let mut candidates = vec![title.to_string()];
        if self.config.use_pattern_catalog {
            candidates.extend(catalog::all_phrases().map(|phrase| format!("{title} {phrase}")));
        }
        let guidance = &intent.research_guidance;
        candidates.extend(
            guidance
                .primary_focus
                .iter()
                .chain(guidance.verification_needs.iter())
                .map(|focus| focus.trim())
                .filter(|focus| !focus.is_empty())
                .map(|focus| format!("{title} {focus}")),
        );

        let mut seen = HashSet::new();
        let mut queries: Vec<String> = candidates
            .into_iter()
            .filter(|q| seen.insert(q.to_lowercase()))
            .collect();
        queries.truncate(self.config.max_queries);
        queries
    }

    /// Collects research for `entry`. Always returns a record.
    pub async fn collect(&self, entry: &Entry, intent: &IntentRecord) -> ResearchRecord {
        let queries = self.build_queries(entry, intent);
        info!(
            entry_id = %entry.id,
            queries = queries.len(),
            sources = self.config.sources.len(),
            "Starting research lookups"
        );

        let raw_hits = self.run_lookups(&queries).await;
        let hits = merge_hits(raw_hits, self.config.min_hit_words);
        let reference_urls = unique_urls(&hits);
        info!(entry_id = %entry.id, unique_hits = hits.len(), "Research lookups complete");

        if hits.is_empty() {
            let mut record = ResearchRecord::empty(NO_MATERIAL_SUMMARY);
            record.reference_urls = reference_urls;
            return record;
        }

        let mut record = match self.synthesize(entry, intent, &hits).await {
            Ok(record) => record,
            Err(summary) => ResearchRecord::empty(summary),
        };
        record.reference_urls = reference_urls;
        record.hits_considered = hits.len();
        record
    }

    async fn run_lookups(&self, queries: &[String]) -> Vec<SearchHit> {
        let semaphore = Semaphore::new(self.config.lookup_concurrency.max(1));
        let lookup_timeout = self.config.lookup_timeout();
        let mut lookups = FuturesUnordered::new();

        for query in queries {
            for source in &self.config.sources {
                let semaphore = &semaphore;
                lookups.push(async move {
                    let Ok(_permit) = semaphore.acquire().await else {
                        return Vec::new();
                    };
                    self.limiter.acquire().await;
                    self.lookup(query, source, lookup_timeout).await
                });
            }
        }

        let mut hits = Vec::new();
        while let Some(batch) = lookups.next().await {
            hits.extend(batch);
        }
        hits
    }

    async fn lookup(
        &self,
        query: &str,
        source: &SourceDomain,
        lookup_timeout: std::time::Duration,
    ) -> Vec<SearchHit> {
        let searched = tokio::time::timeout(lookup_timeout, self.search_provider.search(query, source))
            .await
            .unwrap_or(Err(SearchError::Timeout(lookup_timeout)));
        match searched {
            Ok(hits) => {
                debug!(query, source = %source.name, hits = hits.len(), "Lookup returned");
                hits
            }
            Err(e) => {
                warn!(query, source = %source.name, error = %e, "Lookup failed, skipping");
                Vec::new()
            }
        }
    }

    // Returns the failure summary on error.
    async fn synthesize(
        &self,
        entry: &Entry,
        intent: &IntentRecord,
        hits: &[SearchHit],
    ) -> Result<ResearchRecord, String> {
        let intent_json = serde_json::to_string_pretty(intent).unwrap_or_default();
        let hits_text = format_hits(&hits[..hits.len().min(self.config.max_hits_in_prompt)]);
        let user_prompt = render(
            SYNTHESIS_USER_PROMPT,
            &[
                ("title", &entry.title),
                ("intent", &intent_json),
                ("hits", &hits_text),
            ],
        );

        let response = generate_with_timeout(
            self.ai_provider.as_ref(),
            SYNTHESIS_SYSTEM_PROMPT,
            &user_prompt,
            &self.generation.synthesis.params(),
            self.generation.timeout(),
        )
        .await
        .map_err(|e| {
            warn!(entry_id = %entry.id, error = %e, "Research synthesis failed, continuing with empty research");
            format!("Research synthesis failed: {e}")
        })?;

        Ok(parse_synthesis(&response))
    }
}

/// Decodes every synthesis section independently, defaulting the ones that are missing or malformed.
pub fn parse_synthesis(response: &str) -> ResearchRecord {
    ResearchRecord {
        direct_connections: decode_section_or_default(response, DIRECT_CONNECTIONS_TAG),
        architectural_patterns: decode_section_or_default(response, PATTERNS_TAG),
        feature_mappings: decode_section_or_default(response, FEATURE_MAPPINGS_TAG),
        evolution: decode_section_or_default::<Option<EvolutionComparison>>(response, EVOLUTION_TAG),
        benefit_mappings: decode_section_or_default(response, BENEFITS_TAG),
        connection_summary: extract_trimmed(response, SUMMARY_TAG)
            .unwrap_or_default()
            .to_string(),
        ..Default::default()
    }
}

/// Collapses hits by content fingerprint and drops ones too short to be useful.
///
/// On a fingerprint collision the earliest observation wins, with ties broken
/// by URL, so the result does not depend on the order hits arrived in. The
/// output is ordered by observation time.
pub fn merge_hits(hits: impl IntoIterator<Item = SearchHit>, min_words: usize) -> Vec<SearchHit> {
    let mut merged: HashMap<String, SearchHit> = HashMap::new();
    for hit in hits {
        let normalized = fingerprint::normalize(&hit.content);
        if fingerprint::word_count(&normalized) < min_words {
            continue;
        }
        let key = fingerprint::fingerprint(&normalized, &hit.source_domain);
        match merged.get(&key) {
            Some(existing) if !is_earlier(&hit, existing) => {}
            _ => {
                merged.insert(key, hit);
            }
        }
    }

    let mut unique: Vec<(String, SearchHit)> = merged.into_iter().collect();
    unique.sort_by(|(ka, a), (kb, b)| a.observed_at.cmp(&b.observed_at).then_with(|| ka.cmp(kb)));
    unique.into_iter().map(|(_, hit)| hit).collect()
}

fn is_earlier(candidate: &SearchHit, existing: &SearchHit) -> bool {
    (candidate.observed_at, &candidate.url) < (existing.observed_at, &existing.url)
}

fn unique_urls(hits: &[SearchHit]) -> Vec<String> {
    let mut seen = HashSet::new();
    hits.iter()
        .filter_map(|hit| hit.url.clone())
        .filter(|url| seen.insert(url.clone()))
        .collect()
}

fn format_hits(hits: &[SearchHit]) -> String {
    hits.iter()
        .enumerate()
        .map(|(i, hit)| match &hit.url {
            Some(url) => format!("[{}] ({}) {}\nSource: {}", i + 1, hit.source_domain, hit.content, url),
            None => format!("[{}] ({}) {}", i + 1, hit.source_domain, hit.content),
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn hit(content: &str, domain: &str, url: &str, offset_secs: i64) -> SearchHit {
        SearchHit {
            content: content.to_string(),
            source_domain: domain.to_string(),
            url: Some(url.to_string()),
            observed_at: Utc::now() + Duration::seconds(offset_secs),
        }
    }

    #[test]
    fn merge_keeps_earliest_regardless_of_order() {
        let text = "Hedgehog fabric uses VXLAN for VPC isolation";
        let early = hit(text, "documentation", "https://docs/a", 0);
        let late = hit(&text.to_uppercase(), "documentation", "https://docs/b", 5);

        let forward = merge_hits(vec![early.clone(), late.clone()], 6);
        let backward = merge_hits(vec![late, early.clone()], 6);
        assert_eq!(forward, vec![early.clone()]);
        assert_eq!(backward, vec![early]);
    }

    #[test]
    fn merge_drops_short_hits() {
        let hits = vec![hit("too short", "blog", "https://b", 0)];
        assert!(merge_hits(hits, 6).is_empty());
    }

    #[test]
    fn parse_synthesis_defaults_bad_sections() {
        let response = r#"
<direct_connections>[{"claim": "c", "evidence": "e"}]</direct_connections>
<architectural_patterns>{not json</architectural_patterns>
<evolution_comparison>{"traditional": "VLANs", "modern": "VXLAN", "key_shifts": ["scale"]}</evolution_comparison>
<connection_summary>  Fabric overlays.  </connection_summary>"#;
        let record = parse_synthesis(response);
        assert_eq!(record.direct_connections.len(), 1);
        assert!(record.architectural_patterns.is_empty());
        assert!(record.feature_mappings.is_empty());
        assert_eq!(record.evolution.unwrap().modern, "VXLAN");
        assert_eq!(record.connection_summary, "Fabric overlays.");
    }
}
