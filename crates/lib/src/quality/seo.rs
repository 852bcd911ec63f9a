//! Keyword density and content length scoring.

use crate::types::Draft;
use regex::{escape, RegexBuilder};
use scraper::Html;

/// Keyword density (percent of words) that scores a full 10.
pub const TARGET_DENSITY: f64 = 1.5;
const DENSITY_WEIGHT: f64 = 0.7;
const LENGTH_WEIGHT: f64 = 0.3;

#[derive(Debug, Clone, PartialEq)]
pub struct SeoReport {
    pub score: f64,
    pub word_count: usize,
    /// (keyword, density percent) for each distinct keyword.
    pub densities: Vec<(String, f64)>,
    pub notes: Vec<String>,
}

/// Visible text of an HTML fragment with whitespace collapsed.
pub fn plain_text(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    fragment
        .root_element()
        .text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Occurrences of `keyword` as a whole phrase, case-insensitively, per hundred words.
pub fn keyword_density(text: &str, word_count: usize, keyword: &str) -> f64 {
    if word_count == 0 {
        return 0.0;
    }
    let pattern = format!(r"\b{}\b", escape(keyword));
    let occurrences = RegexBuilder::new(&pattern)
        .case_insensitive(true)
        .build()
        .map(|re| re.find_iter(text).count())
        .unwrap_or(0);
    occurrences as f64 / word_count as f64 * 100.0
}

pub fn density_score(density: f64) -> f64 {
    (10.0 - (TARGET_DENSITY - density).abs() * 4.0).clamp(0.0, 10.0)
}

/// Full marks between 300 and 1000 words.
pub fn length_score(word_count: usize) -> f64 {
    let words = word_count as f64;
    if word_count < 300 {
        words / 30.0
    } else if word_count > 1000 {
        f64::max(0.0, 10.0 - (words - 1000.0) / 100.0)
    } else {
        10.0
    }
}

/// Scores a draft's keyword fit over its title, subtitle and body text.
pub fn evaluate(title: &str, draft: &Draft) -> SeoReport {
    let text = format!("{title} {} {}", draft.subtitle, plain_text(&draft.body));
    let word_count = text.split_whitespace().count();

    let densities: Vec<(String, f64)> = draft
        .unique_keywords()
        .into_iter()
        .map(|keyword| {
            let density = keyword_density(&text, word_count, &keyword);
            (keyword, density)
        })
        .collect();

    let density_average = if densities.is_empty() {
        0.0
    } else {
        densities.iter().map(|(_, d)| density_score(*d)).sum::<f64>() / densities.len() as f64
    };
    let length = length_score(word_count);
    let score = (density_average * DENSITY_WEIGHT + length * LENGTH_WEIGHT).clamp(0.0, 10.0);

    let mut notes = Vec::new();
    if densities.is_empty() {
        notes.push("No keywords were provided.".to_string());
    }
    for (keyword, density) in &densities {
        if density_score(*density) < 5.0 {
            notes.push(format!(
                "Keyword '{keyword}' density is {density:.2}%; aim for about {TARGET_DENSITY}%."
            ));
        }
    }
    if length < 10.0 {
        notes.push(format!(
            "Content is {word_count} words; aim for 300 to 1000 words."
        ));
    }

    SeoReport {
        score,
        word_count,
        densities,
        notes,
    }
}
