//! In-memory tariff schedule.
//!
//! Holds every leaf entry sorted by canonical code, so a branch lookup is a
//! range scan. Loadable from a JSON array of [`LeafEntry`], from Arrow
//! RecordBatches with the [`schedule_schema`](tariffscope_core::schedule::schedule_schema)
//! columns, or from a Parquet file with those columns.

use std::collections::BTreeMap;
use std::path::Path;

use arrow::array::{Array, LargeStringArray, StringArray};
use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use tariffscope_core::{LEAF_CODE_LEN, LeafEntry, canonical_code, is_leaf_under, schedule};
use tracing::info;

use crate::{CandidateSource, StoreError};

/// Leaf entries keyed by canonical code.
#[derive(Debug, Clone, Default)]
pub struct Schedule {
    entries: BTreeMap<String, LeafEntry>,
    leaf_len: usize,
}

impl Schedule {
    /// Build from entries. Later entries with the same code replace earlier ones.
    pub fn from_leaves(leaves: impl IntoIterator<Item = LeafEntry>) -> Self {
        let entries = leaves
            .into_iter()
            .map(|mut leaf| {
                leaf.code = canonical_code(&leaf.code);
                (leaf.code.clone(), leaf)
            })
            .collect();
        Self {
            entries,
            leaf_len: LEAF_CODE_LEN,
        }
    }

    /// Override the finest-granularity code length (10 for statistical suffixes).
    pub fn with_leaf_len(mut self, leaf_len: usize) -> Self {
        self.leaf_len = leaf_len;
        self
    }

    /// Load a JSON array of leaf entries.
    pub fn from_json_file(path: &Path) -> Result<Self, StoreError> {
        if !path.exists() {
            return Err(StoreError::FileNotFound(path.to_path_buf()));
        }
        let bytes = std::fs::read(path)?;
        let leaves: Vec<LeafEntry> = serde_json::from_slice(&bytes)?;
        let schedule = Self::from_leaves(leaves);
        info!(entries = schedule.len(), path = %path.display(), "loaded schedule json");
        Ok(schedule)
    }

    /// Load a Parquet file with `code`, `description` and `duty_rate` columns.
    pub fn from_parquet(path: &Path) -> Result<Self, StoreError> {
        if !path.exists() {
            return Err(StoreError::FileNotFound(path.to_path_buf()));
        }
        let batches = read_parquet(path)?;
        let schedule = Self::from_leaves(leaves_from_batches(&batches)?);
        info!(entries = schedule.len(), path = %path.display(), "loaded schedule parquet");
        Ok(schedule)
    }

    /// Load by file extension: `.parquet` or anything else as JSON.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("parquet") => Self::from_parquet(path),
            _ => Self::from_json_file(path),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Leaves under `branch_prefix`, in code order.
    pub fn leaves_under_branch(&self, branch_prefix: &str) -> Vec<LeafEntry> {
        let prefix = canonical_code(branch_prefix);
        self.entries
            .range(prefix.clone()..)
            .take_while(|(code, _)| code.starts_with(&prefix))
            .filter(|(code, _)| is_leaf_under(code, &prefix, self.leaf_len))
            .map(|(_, leaf)| leaf.clone())
            .collect()
    }
}

#[async_trait]
impl CandidateSource for Schedule {
    async fn fetch_leaves_under_branch(
        &self,
        branch_prefix: &str,
    ) -> Result<Vec<LeafEntry>, StoreError> {
        if branch_prefix.trim().is_empty() {
            return Err(StoreError::InvalidBranch(branch_prefix.to_string()));
        }
        Ok(self.leaves_under_branch(branch_prefix))
    }
}

/// Read a Parquet file into Arrow RecordBatches.
pub fn read_parquet(path: &Path) -> Result<Vec<RecordBatch>, StoreError> {
    let file = std::fs::File::open(path)?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;
    let batches: Result<Vec<RecordBatch>, _> = reader.collect();
    Ok(batches?)
}

/// Convert schedule RecordBatches into leaf entries.
///
/// `code` and `description` must be non-null; a null `duty_rate` becomes an
/// empty string, which the duty calculator later excludes from its scan.
pub fn leaves_from_batches(batches: &[RecordBatch]) -> Result<Vec<LeafEntry>, StoreError> {
    let mut leaves = Vec::new();

    for batch in batches {
        let code_col = batch
            .column_by_name(schedule::CODE)
            .ok_or(StoreError::MissingColumn(schedule::CODE))?;
        let desc_col = batch
            .column_by_name(schedule::DESCRIPTION)
            .ok_or(StoreError::MissingColumn(schedule::DESCRIPTION))?;
        let rate_col = batch.column_by_name(schedule::DUTY_RATE);

        for row in 0..batch.num_rows() {
            let code = get_string(code_col.as_ref(), row).ok_or(StoreError::NullValue {
                column: schedule::CODE,
                row,
            })?;
            let description =
                get_string(desc_col.as_ref(), row).ok_or(StoreError::NullValue {
                    column: schedule::DESCRIPTION,
                    row,
                })?;
            let rate = rate_col
                .and_then(|col| get_string(col.as_ref(), row))
                .unwrap_or_default();

            leaves.push(LeafEntry::new(code, description, rate));
        }
    }

    Ok(leaves)
}

/// Extract a string value from an Arrow array (handles Utf8 and LargeUtf8).
fn get_string(col: &dyn Array, row: usize) -> Option<String> {
    if col.is_null(row) {
        return None;
    }
    col.as_any()
        .downcast_ref::<StringArray>()
        .map(|arr| arr.value(row).to_string())
        .or_else(|| {
            col.as_any()
                .downcast_ref::<LargeStringArray>()
                .map(|arr| arr.value(row).to_string())
        })
}
