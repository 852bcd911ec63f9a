pub mod csv_store;

use crate::errors::StoreError;
use crate::types::Entry;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::fmt::Debug;

/// The column holding an entry's title.
pub const TITLE_COLUMN: &str = "Article title";
/// The column holding an entry's subtitle.
pub const SUBTITLE_COLUMN: &str = "Article subtitle";
/// The column holding an entry's body.
pub const BODY_COLUMN: &str = "Article body";
pub const CATEGORY_COLUMN: &str = "Category";

pub const STATUS_COLUMN: &str = "processing_status";
pub const ISSUES_COLUMN: &str = "validation_issues";
pub const TIMESTAMP_COLUMN: &str = "processing_timestamp";
pub const REFERENCE_URLS_COLUMN: &str = "reference_urls";
pub const KEYWORDS_COLUMN: &str = "keywords";
pub const RELEVANT_SNIPPETS_COLUMN: &str = "relevant_snippets";

/// A tabular store of knowledge-base entries.
#[async_trait]
pub trait RecordStore: Send + Sync + Debug {
    /// Ids of all stored entries, in storage order.
    async fn ids(&self) -> Result<Vec<String>, StoreError>;

    async fn read(&self, entry_id: &str) -> Result<Entry, StoreError>;

    /// Writes the given fields onto an existing entry, adding columns as needed.
    async fn write(
        &self,
        entry_id: &str,
        fields: &BTreeMap<String, String>,
    ) -> Result<(), StoreError>;
}
