//! Report exports.
//!
//! Exports contain exactly the rows of a filtered report with the log's
//! column set. CSV is the spreadsheet export; TSV is the plain delimited
//! text export. JSON carries the same rows for scripts.

use std::io::Write;

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::record::{DeliveryRecord, COLUMNS};
use crate::store::codec;

/// Export encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    /// Comma-separated, opens in any spreadsheet.
    #[default]
    Csv,
    /// Tab-separated plain text.
    Tsv,
    /// JSON array of records.
    Json,
}

/// Write `records` to `out` in `format`, with timestamps in `offset`.
///
/// # Errors
///
/// Returns an error if writing to `out` fails.
pub fn write_export<W: Write>(
    records: &[DeliveryRecord],
    format: ExportFormat,
    offset: FixedOffset,
    out: W,
) -> Result<()> {
    match format {
        ExportFormat::Csv => write_delimited(records, b',', offset, out),
        ExportFormat::Tsv => write_delimited(records, b'\t', offset, out),
        ExportFormat::Json => {
            let local: Vec<DeliveryRecord> =
                records.iter().map(|r| r.in_offset(offset)).collect();
            serde_json::to_writer_pretty(out, &local)?;
            Ok(())
        }
    }
}

fn write_delimited<W: Write>(
    records: &[DeliveryRecord],
    delimiter: u8,
    offset: FixedOffset,
    out: W,
) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .from_writer(out);
    writer.write_record(COLUMNS).map_err(Error::Export)?;
    for record in records {
        writer
            .write_record(codec::encode(record, offset))
            .map_err(Error::Export)?;
    }
    writer.flush()?;
    Ok(())
}
