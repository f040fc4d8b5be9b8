//! Row encoding for the delivery log file.
//!
//! One data row per record, in [`COLUMNS`] order. Amounts are written with
//! two fractional digits and timestamps as `YYYY-MM-DD HH:MM:SS` in the
//! business timezone.

use std::str::FromStr;

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone};
use csv::StringRecord;
use rust_decimal::Decimal;
use tracing::{trace, warn};

use crate::record::{format_timestamp, Courier, DeliveryRecord, COLUMNS, TIMESTAMP_FORMAT};

/// Render a record as a row of cells, timestamps in `offset`.
#[must_use]
pub fn encode(record: &DeliveryRecord, offset: FixedOffset) -> [String; 6] {
    let stamp = |time: Option<DateTime<FixedOffset>>| {
        time.map(|t| format_timestamp(&t.with_timezone(&offset)))
            .unwrap_or_default()
    };
    [
        record.user.to_string(),
        record.client.clone(),
        record.ticket.clone(),
        format!("{:.2}", record.amount.round_dp(2)),
        stamp(record.departure_time),
        stamp(record.arrival_time),
    ]
}

/// Parse a row back into a record.
///
/// Malformed timestamps become `None`. Rows with an unknown courier or an
/// unparsable amount are dropped.
#[must_use]
pub fn decode(row: &StringRecord, offset: FixedOffset) -> Option<DeliveryRecord> {
    let cell = |i: usize| row.get(i).unwrap_or("");
    let line = row.position().map_or(0, csv::Position::line);

    let user = match Courier::from_str(cell(0)) {
        Ok(user) => user,
        Err(e) => {
            warn!("Skipping log line {}: {}", line, e);
            return None;
        }
    };
    let amount = match Decimal::from_str(cell(3).trim()) {
        Ok(amount) => amount,
        Err(e) => {
            warn!(
                "Skipping log line {}: invalid amount {:?}: {}",
                line,
                cell(3),
                e
            );
            return None;
        }
    };

    Some(DeliveryRecord {
        user,
        client: cell(1).to_string(),
        ticket: cell(2).to_string(),
        amount,
        departure_time: parse_timestamp(cell(4), offset),
        arrival_time: parse_timestamp(cell(5), offset),
    })
}

/// Parse a stored timestamp in the business offset.
#[must_use]
pub fn parse_timestamp(raw: &str, offset: FixedOffset) -> Option<DateTime<FixedOffset>> {
    let parsed = NaiveDateTime::parse_from_str(raw.trim(), TIMESTAMP_FORMAT)
        .ok()
        .and_then(|naive| offset.from_local_datetime(&naive).single());
    if parsed.is_none() {
        trace!("Malformed timestamp {:?}", raw);
    }
    parsed
}

/// Whether a header row is exactly the canonical column set.
#[must_use]
pub fn is_canonical_header(header: &StringRecord) -> bool {
    header.len() == COLUMNS.len() && header.iter().zip(COLUMNS).all(|(a, b)| a.trim() == b)
}
