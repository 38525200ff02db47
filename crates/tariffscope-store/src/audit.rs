//! Assumption audit trail.
//!
//! Compliance consumers record every assumption verbatim. One row per
//! assumption, written with the
//! [`assumption_log_schema`](tariffscope_core::schedule::assumption_log_schema).

use std::path::Path;
use std::sync::Arc;

use arrow::array::StringArray;
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use tariffscope_core::{AmbiguityAnalysis, schedule};
use tracing::info;

use crate::StoreError;

/// Flatten the assumptions of one analysis into a RecordBatch.
pub fn assumption_batch(analysis: &AmbiguityAnalysis) -> Result<RecordBatch, StoreError> {
    let n = analysis.assumptions.len();
    let branch = StringArray::from(vec![analysis.branch_prefix.as_str(); n]);
    let likely = StringArray::from(vec![analysis.likely_code.as_deref(); n]);
    let ids = StringArray::from_iter_values(analysis.assumptions.iter().map(|a| &a.variable_id));
    let names =
        StringArray::from_iter_values(analysis.assumptions.iter().map(|a| &a.variable_name));
    let values =
        StringArray::from_iter_values(analysis.assumptions.iter().map(|a| &a.assumed_value));
    let rationales =
        StringArray::from_iter_values(analysis.assumptions.iter().map(|a| &a.rationale));

    Ok(RecordBatch::try_new(
        Arc::new(schedule::assumption_log_schema()),
        vec![
            Arc::new(branch),
            Arc::new(likely),
            Arc::new(ids),
            Arc::new(names),
            Arc::new(values),
            Arc::new(rationales),
        ],
    )?)
}

/// Write the assumptions of several analyses to one Parquet file,
/// replacing it. Returns the number of rows written.
pub fn write_assumptions(
    path: &Path,
    analyses: &[AmbiguityAnalysis],
) -> Result<usize, StoreError> {
    let file = std::fs::File::create(path)?;
    let mut writer = ArrowWriter::try_new(
        file,
        Arc::new(schedule::assumption_log_schema()),
        None,
    )?;
    let mut rows = 0;
    for analysis in analyses {
        let batch = assumption_batch(analysis)?;
        rows += batch.num_rows();
        writer.write(&batch)?;
    }
    writer.close()?;
    info!(rows, analyses = analyses.len(), path = %path.display(), "wrote assumption log");
    Ok(rows)
}
