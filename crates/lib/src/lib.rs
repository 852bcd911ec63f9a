//! # kbrefine: Iterative Knowledge-Base Entry Refinement
//!
//! This crate enriches knowledge-base entries (a term with its title, subtitle and
//! body) by driving a language model through a fixed sequence of stages:
//!
//! 1. **Intent analysis** ([`intent`]): what does the term mean here?
//! 2. **Research** ([`research`]): concurrent, rate-limited web lookups, deduplicated
//!    and synthesized into structured findings.
//! 3. **Generation** ([`generation`]): a draft subtitle, body and keyword list.
//! 4. **Quality control** ([`quality`]): a weighted rubric with pass/fail thresholds.
//!
//! Generation and quality control alternate under the [`orchestrator`] until a draft
//! passes or the retry budget is spent, with each failed verdict's feedback handed
//! to the next attempt. The [`batch`] module runs many entries against a
//! [`providers::store::RecordStore`].
//!
//! All external collaborators are traits injected at construction time:
//! [`providers::ai::AiProvider`], [`providers::search::SearchProvider`] and
//! [`providers::store::RecordStore`].

pub mod batch;
pub mod config;
pub mod constants;
pub mod errors;
pub mod generation;
pub mod intent;
pub mod orchestrator;
pub mod parser;
pub mod prompts;
pub mod providers;
pub mod quality;
pub mod research;
pub mod types;

pub use batch::{BatchReport, BatchRunner, EntryOutcome};
pub use config::{load_config, PipelineConfig};
pub use errors::{ConfigError, IntentError, ModelError, ParseError, SearchError, StoreError};
pub use orchestrator::RefinementOrchestrator;
pub use types::{Draft, Entry, IntentRecord, QualityVerdict, ResearchRecord, RunResult, RunStatus};
