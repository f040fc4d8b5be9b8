//! Assembled report views: the courier ledger and the admin dashboard.

use std::collections::BTreeMap;

use chrono::{FixedOffset, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;

use super::{
    by_user, mean_duration, summarize, top_clients, total_amount, CourierSummary, ReportPeriod,
};
use crate::record::{Courier, DeliveryRecord};

/// A courier's own deliveries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ledger {
    /// Whose ledger this is.
    pub courier: Courier,
    /// Every record of the courier, in log order.
    pub records: Vec<DeliveryRecord>,
    /// Sum of amounts.
    pub total_amount: Decimal,
}

impl Ledger {
    /// Collect the ledger of `courier`.
    #[must_use]
    pub fn new(records: &[DeliveryRecord], courier: Courier) -> Self {
        let records = by_user(records, courier);
        let total_amount = total_amount(&records);
        Self {
            courier,
            records,
            total_amount,
        }
    }

    /// Whether the courier has no deliveries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Occurrences of one client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientCount {
    /// Client name.
    pub client: String,
    /// Number of deliveries.
    pub count: usize,
}

/// Admin summary of one period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    /// Period kind.
    pub period: ReportPeriod,
    /// First day covered.
    pub start: NaiveDate,
    /// Last day covered.
    pub end: NaiveDate,
    /// Courier filter, if any.
    pub courier: Option<Courier>,
    /// Rows in the period, in log order.
    pub records: Vec<DeliveryRecord>,
    /// Per-courier count and total.
    pub summary: BTreeMap<Courier, CourierSummary>,
    /// Number of rows.
    pub total_count: usize,
    /// Sum of amounts.
    pub total_amount: Decimal,
    /// Mean delivery time, if any row has both timestamps.
    pub mean_duration_minutes: Option<f64>,
    /// Most frequent clients.
    pub top_clients: Vec<ClientCount>,
}

impl Dashboard {
    /// Build the dashboard for the period ending at `anchor`, bucketing
    /// departures by their day in `offset`.
    #[must_use]
    pub fn build(
        records: &[DeliveryRecord],
        period: ReportPeriod,
        anchor: NaiveDate,
        offset: FixedOffset,
        courier: Option<Courier>,
        top_n: usize,
    ) -> Self {
        let (start, end) = period.range(anchor);
        let mut rows = period.select(records, anchor, offset);
        if let Some(courier) = courier {
            rows = by_user(&rows, courier);
        }

        Self {
            period,
            start,
            end,
            courier,
            summary: summarize(&rows),
            total_count: rows.len(),
            total_amount: total_amount(&rows),
            mean_duration_minutes: mean_duration(&rows),
            top_clients: top_clients(&rows, top_n)
                .into_iter()
                .map(|(client, count)| ClientCount { client, count })
                .collect(),
            records: rows,
        }
    }

    /// Whether the period has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
