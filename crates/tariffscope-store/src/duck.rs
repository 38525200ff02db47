//! DuckDB-backed schedule for large tariff tables.
//!
//! The `schedule` table holds one row per entry with the
//! [`schedule_schema`](tariffscope_core::schedule::schedule_schema) columns.
//! Branch lookups run as a prefix query and come back as Arrow batches.

use std::path::Path;
use std::sync::Mutex;

use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use duckdb::Connection;
use tariffscope_core::{LEAF_CODE_LEN, LeafEntry, canonical_code};
use tracing::info;

use crate::{CandidateSource, StoreError, leaves_from_batches};

/// DuckDB store for the tariff schedule.
///
/// Supports both in-memory (ephemeral) and persistent (file-backed) modes.
/// The connection is not `Sync`, so it sits behind a mutex for use as a
/// [`CandidateSource`].
pub struct DuckSchedule {
    conn: Mutex<Connection>,
}

impl DuckSchedule {
    /// Open an in-memory DuckDB database with an empty `schedule` table.
    pub fn open() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.ensure_table()?;
        Ok(store)
    }

    /// Open or create a persistent DuckDB database at the given path.
    pub fn open_persistent(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.ensure_table()?;
        Ok(store)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Connection> {
        // A poisoned lock only means another lookup panicked mid-query;
        // the connection itself is still usable.
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn ensure_table(&self) -> Result<(), StoreError> {
        self.lock().execute_batch(
            "CREATE TABLE IF NOT EXISTS schedule (
                code        VARCHAR NOT NULL,
                description VARCHAR NOT NULL,
                duty_rate   VARCHAR
            )",
        )?;
        Ok(())
    }

    /// Replace the `schedule` table with the contents of a Parquet file.
    ///
    /// Codes are stored in canonical (dot-free) form.
    pub fn load_parquet(&self, path: &Path) -> Result<usize, StoreError> {
        if !path.exists() {
            return Err(StoreError::FileNotFound(path.to_path_buf()));
        }
        let sql = format!(
            "CREATE OR REPLACE TABLE schedule AS
             SELECT regexp_replace(code, '[^0-9A-Za-z]', '', 'g') AS code,
                    description,
                    duty_rate
             FROM read_parquet('{}')",
            path.display()
        );
        self.lock().execute_batch(&sql)?;
        let count = self.count()?;
        info!(count, "loaded schedule table");
        Ok(count)
    }

    /// Insert entries into the `schedule` table.
    pub fn insert(&self, leaves: &[LeafEntry]) -> Result<(), StoreError> {
        let conn = self.lock();
        let mut stmt =
            conn.prepare("INSERT INTO schedule (code, description, duty_rate) VALUES (?, ?, ?)")?;
        for leaf in leaves {
            stmt.execute([
                canonical_code(&leaf.code).as_str(),
                leaf.legal_description.as_str(),
                leaf.base_duty_rate_text.as_str(),
            ])?;
        }
        Ok(())
    }

    /// Number of rows in the `schedule` table.
    pub fn count(&self) -> Result<usize, StoreError> {
        let conn = self.lock();
        let count: i64 = conn.query_row("SELECT count(*) FROM schedule", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Leaves under `branch_prefix`, in code order.
    pub fn leaves_under_branch(&self, branch_prefix: &str) -> Result<Vec<LeafEntry>, StoreError> {
        let prefix = canonical_code(branch_prefix);
        let sql = format!(
            "SELECT code, description, duty_rate FROM schedule
             WHERE starts_with(code, ?) AND length(code) = {LEAF_CODE_LEN}
             ORDER BY code"
        );
        let conn = self.lock();
        let mut stmt = conn.prepare(&sql)?;
        let batches: Vec<RecordBatch> = stmt.query_arrow([prefix.as_str()])?.collect();
        leaves_from_batches(&batches)
    }
}

#[async_trait]
impl CandidateSource for DuckSchedule {
    async fn fetch_leaves_under_branch(
        &self,
        branch_prefix: &str,
    ) -> Result<Vec<LeafEntry>, StoreError> {
        if branch_prefix.trim().is_empty() {
            return Err(StoreError::InvalidBranch(branch_prefix.to_string()));
        }
        self.leaves_under_branch(branch_prefix)
    }
}
