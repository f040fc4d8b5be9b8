//! Report periods.

use chrono::{Datelike, Days, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::record::DeliveryRecord;

/// Date window a report covers, relative to an anchor day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportPeriod {
    /// The anchor day only.
    #[default]
    Daily,
    /// The anchor day and the six days before it.
    Weekly,
    /// From the first of the anchor's month to the anchor.
    Monthly,
}

impl ReportPeriod {
    /// Inclusive `(start, end)` dates for `anchor`.
    #[must_use]
    pub fn range(self, anchor: NaiveDate) -> (NaiveDate, NaiveDate) {
        let start = match self {
            Self::Daily => anchor,
            Self::Weekly => anchor
                .checked_sub_days(Days::new(6))
                .unwrap_or(NaiveDate::MIN),
            Self::Monthly => {
                NaiveDate::from_ymd_opt(anchor.year(), anchor.month(), 1).unwrap_or(anchor)
            }
        };
        (start, anchor)
    }

    /// Records whose business-day departure falls in the period ending at
    /// `anchor`.
    #[must_use]
    pub fn select(
        self,
        records: &[DeliveryRecord],
        anchor: NaiveDate,
        offset: FixedOffset,
    ) -> Vec<DeliveryRecord> {
        let (start, end) = self.range(anchor);
        super::window(records, start, end, offset)
    }
}

impl std::fmt::Display for ReportPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Daily => write!(f, "daily"),
            Self::Weekly => write!(f, "weekly"),
            Self::Monthly => write!(f, "monthly"),
        }
    }
}
