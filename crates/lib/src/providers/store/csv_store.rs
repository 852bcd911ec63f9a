//! # CSV Record Store
//!
//! Loads a knowledge-base export into memory, applies per-entry writes and
//! saves the whole table back with every field quoted.

use crate::{
    errors::StoreError,
    providers::store::{
        RecordStore, BODY_COLUMN, CATEGORY_COLUMN, SUBTITLE_COLUMN, TITLE_COLUMN,
    },
    types::Entry,
};
use async_trait::async_trait;
use csv::{QuoteStyle, ReaderBuilder, WriterBuilder};
use std::collections::BTreeMap;
use std::path::Path;
use tokio::sync::RwLock;
use tracing::info;

#[derive(Debug, Clone)]
struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    fn ensure_column(&mut self, name: &str) -> usize {
        if let Some(idx) = self.column(name) {
            return idx;
        }
        self.headers.push(name.to_string());
        for row in &mut self.rows {
            row.push(String::new());
        }
        self.headers.len() - 1
    }

    fn row_index(&self, entry_id: &str) -> Result<usize, StoreError> {
        let title_idx = self
            .column(TITLE_COLUMN)
            .ok_or_else(|| StoreError::MissingColumn(TITLE_COLUMN.to_string()))?;
        self.rows
            .iter()
            .position(|row| row.get(title_idx).map(String::as_str) == Some(entry_id))
            .ok_or_else(|| StoreError::NotFound(entry_id.to_string()))
    }

    fn cell(&self, row: usize, column: &str) -> String {
        self.column(column)
            .and_then(|idx| self.rows[row].get(idx))
            .cloned()
            .unwrap_or_default()
    }
}

/// An in-memory table backed by a CSV file.
#[derive(Debug)]
pub struct CsvRecordStore {
    table: RwLock<Table>,
}

impl CsvRecordStore {
    /// Parses CSV text. The title column is required.
    pub fn from_reader<R: std::io::Read>(reader: R) -> Result<Self, StoreError> {
        let mut csv_reader = ReaderBuilder::new().flexible(true).from_reader(reader);
        let headers: Vec<String> = csv_reader.headers()?.iter().map(str::to_string).collect();
        if !headers.iter().any(|h| h == TITLE_COLUMN) {
            return Err(StoreError::MissingColumn(TITLE_COLUMN.to_string()));
        }

        let mut rows = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            let mut row: Vec<String> = record.iter().map(str::to_string).collect();
            row.resize(headers.len(), String::new());
            rows.push(row);
        }

        Ok(Self {
            table: RwLock::new(Table { headers, rows }),
        })
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)?;
        let store = Self::from_reader(file)?;
        info!(path = %path.display(), "Loaded entry dataset");
        Ok(store)
    }

    /// Writes the full table to `path`, quoting every field.
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<(), StoreError> {
        let table = self.table.read().await;
        let mut writer = WriterBuilder::new()
            .quote_style(QuoteStyle::Always)
            .from_path(path.as_ref())?;
        writer.write_record(&table.headers)?;
        for row in &table.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        info!(path = %path.as_ref().display(), rows = table.rows.len(), "Saved entry dataset");
        Ok(())
    }

    /// Reads an arbitrary column of an entry, if present.
    pub async fn field(&self, entry_id: &str, column: &str) -> Result<String, StoreError> {
        let table = self.table.read().await;
        let row = table.row_index(entry_id)?;
        Ok(table.cell(row, column))
    }
}

#[async_trait]
impl RecordStore for CsvRecordStore {
    async fn ids(&self) -> Result<Vec<String>, StoreError> {
        let table = self.table.read().await;
        let title_idx = table
            .column(TITLE_COLUMN)
            .ok_or_else(|| StoreError::MissingColumn(TITLE_COLUMN.to_string()))?;
        Ok(table
            .rows
            .iter()
            .filter_map(|row| row.get(title_idx).cloned())
            .collect())
    }

    async fn read(&self, entry_id: &str) -> Result<Entry, StoreError> {
        let table = self.table.read().await;
        let row = table.row_index(entry_id)?;
        let category = table.cell(row, CATEGORY_COLUMN);
        Ok(Entry {
            id: entry_id.to_string(),
            title: table.cell(row, TITLE_COLUMN),
            subtitle: table.cell(row, SUBTITLE_COLUMN),
            body: table.cell(row, BODY_COLUMN),
            category: (!category.is_empty()).then_some(category),
        })
    }

    async fn write(
        &self,
        entry_id: &str,
        fields: &BTreeMap<String, String>,
    ) -> Result<(), StoreError> {
        let mut table = self.table.write().await;
        let row = table.row_index(entry_id)?;
        for (column, value) in fields {
            let idx = table.ensure_column(column);
            table.rows[row][idx] = value.clone();
        }
        Ok(())
    }
}
