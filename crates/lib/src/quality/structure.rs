//! Deterministic structural checks on a draft's HTML body and subtitle.

use crate::config::QualityConfig;
use crate::types::Draft;
use scraper::{ElementRef, Html};

const HEADER_TAGS: [&str; 6] = ["h1", "h2", "h3", "h4", "h5", "h6"];

const HEADER_PENALTY: f64 = 3.0;
const MISSING_PARAGRAPH_PENALTY: f64 = 3.0;
const SUBTITLE_LENGTH_PENALTY: f64 = 1.0;
const EMPTY_LIST_PENALTY: f64 = 1.0;
const FLOW_PENALTY: f64 = 1.0;

#[derive(Debug, Clone, PartialEq)]
pub struct StructureReport {
    pub score: f64,
    pub issues: Vec<String>,
    pub paragraph_count: usize,
    /// Distinct header tags found in the body, in document order.
    pub header_tags: Vec<String>,
}

/// Scores a draft's structure out of 10.
pub fn check(draft: &Draft, config: &QualityConfig) -> StructureReport {
    let mut issues = Vec::new();
    let mut score = 10.0;

    let subtitle_words = draft.subtitle.split_whitespace().count();
    if subtitle_words < config.subtitle_min_words || subtitle_words > config.subtitle_max_words {
        score -= SUBTITLE_LENGTH_PENALTY;
        issues.push(format!(
            "Subtitle has {subtitle_words} words; it must be between {} and {} words.",
            config.subtitle_min_words, config.subtitle_max_words
        ));
    }

    if draft.body.trim().is_empty() {
        issues.push("Body is empty; write the entry as <p> paragraphs.".to_string());
        return StructureReport {
            score: 0.0,
            issues,
            paragraph_count: 0,
            header_tags: Vec::new(),
        };
    }

    let fragment = Html::parse_fragment(&draft.body);
    let mut header_tags: Vec<String> = Vec::new();
    let mut paragraph_count = 0;
    let mut empty_lists = 0;

    for element in fragment.root_element().descendants().filter_map(ElementRef::wrap) {
        let name = element.value().name();
        if HEADER_TAGS.contains(&name) {
            if !header_tags.iter().any(|t| t == name) {
                header_tags.push(name.to_string());
            }
        } else if name == "p" {
            paragraph_count += 1;
        } else if (name == "ul" || name == "ol")
            && !element
                .children()
                .filter_map(ElementRef::wrap)
                .any(|child| child.value().name() == "li")
        {
            empty_lists += 1;
        }
    }

    if !header_tags.is_empty() {
        score -= HEADER_PENALTY;
        let tags = header_tags
            .iter()
            .map(|t| format!("<{t}>"))
            .collect::<Vec<_>>()
            .join(", ");
        issues.push(format!(
            "Body contains section header tags ({tags}); use paragraph-only markup without headers."
        ));
    }

    if paragraph_count == 0 {
        score -= MISSING_PARAGRAPH_PENALTY;
        issues.push("Body has no <p> paragraph tags.".to_string());
    }

    if empty_lists > 0 {
        score -= EMPTY_LIST_PENALTY;
        issues.push(format!("Body contains {empty_lists} list(s) without <li> items."));
    }

    if paragraph_count > config.max_paragraphs {
        score -= FLOW_PENALTY;
        issues.push(format!(
            "Flow: body has {paragraph_count} paragraphs; consolidate into at most {}.",
            config.max_paragraphs
        ));
    }

    StructureReport {
        score: f64::max(score, 0.0),
        issues,
        paragraph_count,
        header_tags,
    }
}
