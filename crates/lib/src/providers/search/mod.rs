pub mod duckduckgo;

use crate::errors::SearchError;
use crate::types::{SearchHit, SourceDomain};
use async_trait::async_trait;
use dyn_clone::DynClone;
use std::fmt::Debug;

/// A web search backend scoped to a named source domain.
///
/// Implementations report failures as `SearchError`; the research stage treats
/// every failure as "no results" and never lets one escape.
#[async_trait]
pub trait SearchProvider: Send + Sync + Debug + DynClone {
    async fn search(
        &self,
        query: &str,
        source_domain: &SourceDomain,
    ) -> Result<Vec<SearchHit>, SearchError>;
}

dyn_clone::clone_trait_object!(SearchProvider);
