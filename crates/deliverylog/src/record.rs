//! Core delivery types.
//!
//! A [`DeliveryRecord`] is one row of the delivery log. Records are created
//! fully formed by the [`builder`](crate::builder) and never mutated after.

use std::str::FromStr;

use chrono::{DateTime, FixedOffset, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Canonical column set of the delivery log, in file order.
pub const COLUMNS: [&str; 6] = [
    "user",
    "client",
    "ticket",
    "amount",
    "departure_time",
    "arrival_time",
];

/// Rendering of timestamps in the log and in exports.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// The courier roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Courier {
    /// Isra.
    Isra,
    /// Said.
    Said,
    /// Gabo.
    Gabo,
}

impl Courier {
    /// Every courier on the roster.
    pub const ALL: [Courier; 3] = [Self::Isra, Self::Said, Self::Gabo];

    /// Identifier as written to the log.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Isra => "ISRA",
            Self::Said => "SAID",
            Self::Gabo => "GABO",
        }
    }
}

impl std::fmt::Display for Courier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Courier {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        Self::ALL
            .into_iter()
            .find(|courier| courier.as_str().eq_ignore_ascii_case(name))
            .ok_or_else(|| Error::UnknownCourier {
                name: name.to_string(),
            })
    }
}

/// One registered delivery.
///
/// Timestamps are optional only because rows loaded from disk may carry
/// malformed values; records built in-process always have both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryRecord {
    /// Courier who made the delivery.
    pub user: Courier,
    /// Destination or customer name.
    pub client: String,
    /// Ticket identifier.
    pub ticket: String,
    /// Amount collected, two decimal places.
    pub amount: Decimal,
    /// When the courier left.
    pub departure_time: Option<DateTime<FixedOffset>>,
    /// When the courier arrived.
    pub arrival_time: Option<DateTime<FixedOffset>>,
}

impl DeliveryRecord {
    /// Calendar date of departure in the business timezone.
    #[must_use]
    pub fn departure_date(&self, offset: FixedOffset) -> Option<NaiveDate> {
        self.departure_time
            .map(|t| t.with_timezone(&offset).date_naive())
    }

    /// The same record with both timestamps expressed in `offset`.
    #[must_use]
    pub fn in_offset(&self, offset: FixedOffset) -> Self {
        Self {
            departure_time: self.departure_time.map(|t| t.with_timezone(&offset)),
            arrival_time: self.arrival_time.map(|t| t.with_timezone(&offset)),
            ..self.clone()
        }
    }
}

/// Render a timestamp the way the log stores it.
#[must_use]
pub fn format_timestamp(time: &DateTime<FixedOffset>) -> String {
    time.format(TIMESTAMP_FORMAT).to_string()
}
