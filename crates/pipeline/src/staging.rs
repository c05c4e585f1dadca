//! CSV staging files exchanged between stages.
//!
//! The header row names the fields; an empty cell is a missing value.

use std::collections::BTreeSet;
use std::path::Path;

use normativa_core::validation::record::{RawRecord, RejectedRecord};

use crate::error::PipelineError;

/// Read a staged batch, preserving row order.
pub fn read_batch(path: &Path) -> Result<Vec<RawRecord>, PipelineError> {
    let mut reader = csv::Reader::from_path(path)?;
    read_records(&mut reader)
}

fn read_records<R: std::io::Read>(
    reader: &mut csv::Reader<R>,
) -> Result<Vec<RawRecord>, PipelineError> {
    let headers = reader.headers()?.clone();
    let mut batch = Vec::new();
    for row in reader.records() {
        let row = row?;
        let record: RawRecord = headers
            .iter()
            .zip(row.iter())
            .map(|(field, value)| {
                let value = (!value.is_empty()).then(|| value.to_string());
                (field.to_string(), value)
            })
            .collect();
        batch.push(record);
    }
    Ok(batch)
}

/// Write rejected records for manual triage.
///
/// Columns: `source_index`, `reasons`, then every field seen in any rejected
/// record, in name order.
pub fn write_rejected(path: &Path, rejected: &[RejectedRecord]) -> Result<(), PipelineError> {
    let mut writer = csv::Writer::from_path(path)?;

    let fields: BTreeSet<&str> = rejected
        .iter()
        .flat_map(|r| r.record.keys().map(String::as_str))
        .collect();

    let mut header = vec!["source_index", "reasons"];
    header.extend(fields.iter().copied());
    writer.write_record(&header)?;

    for record in rejected {
        let mut row = vec![record.index.to_string(), record.summary()];
        row.extend(fields.iter().map(|field| {
            record
                .record
                .get(*field)
                .and_then(Clone::clone)
                .unwrap_or_default()
        }));
        writer.write_record(&row)?;
    }

    writer.flush()?;
    Ok(())
}
