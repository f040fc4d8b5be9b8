//! Reporting over the delivery log.
//!
//! Every function here is pure over a loaded record slice. Date filters
//! bucket by the departure's calendar day in the business offset. Records
//! whose departure is unknown are left out of date-filtered views and
//! duration averages but stay in raw listings.

pub mod period;
pub mod views;

use std::collections::{BTreeMap, HashMap};

use chrono::{FixedOffset, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::record::{Courier, DeliveryRecord};

pub use period::ReportPeriod;
pub use views::{ClientCount, Dashboard, Ledger};

/// Count and total of one courier's deliveries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CourierSummary {
    /// Number of deliveries.
    pub count: usize,
    /// Sum of amounts.
    pub total_amount: Decimal,
}

/// Records of one courier, in log order.
#[must_use]
pub fn by_user(records: &[DeliveryRecord], user: Courier) -> Vec<DeliveryRecord> {
    records.iter().filter(|r| r.user == user).cloned().collect()
}

/// Sum of amounts; zero for no records.
#[must_use]
pub fn total_amount(records: &[DeliveryRecord]) -> Decimal {
    records.iter().map(|r| r.amount).sum()
}

/// Records that departed on `date` in the business offset.
#[must_use]
pub fn by_date(
    records: &[DeliveryRecord],
    date: NaiveDate,
    offset: FixedOffset,
) -> Vec<DeliveryRecord> {
    window(records, date, date, offset)
}

/// Records that departed within `start..=end` in the business offset.
#[must_use]
pub fn window(
    records: &[DeliveryRecord],
    start: NaiveDate,
    end: NaiveDate,
    offset: FixedOffset,
) -> Vec<DeliveryRecord> {
    records
        .iter()
        .filter(|r| {
            r.departure_date(offset)
                .is_some_and(|date| start <= date && date <= end)
        })
        .cloned()
        .collect()
}

/// Per-courier count and total.
///
/// Every courier present in `records` gets an entry.
#[must_use]
pub fn summarize(records: &[DeliveryRecord]) -> BTreeMap<Courier, CourierSummary> {
    let mut summary: BTreeMap<Courier, CourierSummary> = BTreeMap::new();
    for record in records {
        let entry = summary.entry(record.user).or_default();
        entry.count += 1;
        entry.total_amount += record.amount;
    }
    summary
}

/// Minutes between departure and arrival, if both are known.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn duration_minutes(record: &DeliveryRecord) -> Option<f64> {
    let departure = record.departure_time?;
    let arrival = record.arrival_time?;
    Some((arrival - departure).num_seconds() as f64 / 60.0)
}

/// Mean of the known durations, or `None` when there are none.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn mean_duration(records: &[DeliveryRecord]) -> Option<f64> {
    let durations: Vec<f64> = records.iter().filter_map(duration_minutes).collect();
    if durations.is_empty() {
        return None;
    }
    Some(durations.iter().sum::<f64>() / durations.len() as f64)
}

/// The `n` most frequent clients, most frequent first.
///
/// Ties keep the order in which clients first appear.
#[must_use]
pub fn top_clients(records: &[DeliveryRecord], n: usize) -> Vec<(String, usize)> {
    let mut order: Vec<(String, usize)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for record in records {
        match index.get(record.client.as_str()) {
            Some(&i) => order[i].1 += 1,
            None => {
                index.insert(record.client.as_str(), order.len());
                order.push((record.client.clone(), 1));
            }
        }
    }
    // Stable sort keeps first-seen order among equal counts.
    order.sort_by(|a, b| b.1.cmp(&a.1));
    order.truncate(n);
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::codec::parse_timestamp;
    use chrono::TimeZone;

    fn offset() -> FixedOffset {
        FixedOffset::west_opt(6 * 3600).unwrap()
    }

    fn record(
        user: Courier,
        client: &str,
        cents: i64,
        departure: &str,
        arrival: &str,
    ) -> DeliveryRecord {
        DeliveryRecord {
            user,
            client: client.to_string(),
            ticket: format!("T-{client}"),
            amount: Decimal::new(cents, 2),
            departure_time: parse_timestamp(departure, offset()),
            arrival_time: parse_timestamp(arrival, offset()),
        }
    }

    fn sample() -> Vec<DeliveryRecord> {
        vec![
            record(Courier::Isra, "Taller X", 15_000, "2024-01-01 09:00:00", "2024-01-01 09:30:00"),
            record(Courier::Said, "Taller Y", 2_000, "2024-01-02 11:00:00", "2024-01-02 11:10:00"),
            record(Courier::Isra, "Taller Y", 7_550, "2024-01-01 10:00:00", "2024-01-01 10:20:00"),
            record(Courier::Gabo, "Taller Z", 1_000, "2024-01-05 08:00:00", "2024-01-05 09:00:00"),
        ]
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_by_user_preserves_order() {
        let isra = by_user(&sample(), Courier::Isra);
        assert_eq!(isra.len(), 2);
        assert_eq!(isra[0].client, "Taller X");
        assert_eq!(isra[1].client, "Taller Y");
    }

    #[test]
    fn test_total_amount() {
        assert_eq!(
            total_amount(&by_user(&sample(), Courier::Isra)),
            Decimal::new(22_550, 2)
        );
        assert_eq!(total_amount(&[]), Decimal::ZERO);
    }

    #[test]
    fn test_per_user_totals_sum_to_total() {
        let records = sample();
        let per_user: Decimal = Courier::ALL
            .iter()
            .map(|c| total_amount(&by_user(&records, *c)))
            .sum();
        assert_eq!(per_user, total_amount(&records));
    }

    #[test]
    fn test_by_date() {
        let jan1 = by_date(&sample(), date(2024, 1, 1), offset());
        assert_eq!(jan1.len(), 2);
        assert!(by_date(&sample(), date(2023, 12, 31), offset()).is_empty());
    }

    #[test]
    fn test_by_date_buckets_foreign_offsets_in_business_day() {
        // 03:00 UTC on the 2nd is 21:00 on the 1st at -06:00.
        let departure = FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2024, 1, 2, 3, 0, 0)
            .unwrap();
        let mut late = sample()[0].clone();
        late.departure_time = Some(departure);
        late.arrival_time = Some(departure);
        let records = vec![late];

        assert_eq!(by_date(&records, date(2024, 1, 1), offset()).len(), 1);
        assert!(by_date(&records, date(2024, 1, 2), offset()).is_empty());
    }

    #[test]
    fn test_window_inclusive() {
        let records = window(&sample(), date(2024, 1, 2), date(2024, 1, 5), offset());
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].user, Courier::Said);
        assert_eq!(records[1].user, Courier::Gabo);
    }

    #[test]
    fn test_single_day_window_matches_by_date() {
        let records = sample();
        for day in 1..=5 {
            let d = date(2024, 1, day);
            assert_eq!(window(&records, d, d, offset()), by_date(&records, d, offset()));
        }
    }

    #[test]
    fn test_window_excludes_unknown_departure() {
        let mut records = sample();
        records[0].departure_time = None;
        assert_eq!(by_date(&records, date(2024, 1, 1), offset()).len(), 1);
    }

    #[test]
    fn test_summarize_partitions_all_records() {
        let records = sample();
        let summary = summarize(&records);

        assert_eq!(summary.len(), 3);
        assert_eq!(
            summary[&Courier::Isra],
            CourierSummary {
                count: 2,
                total_amount: Decimal::new(22_550, 2)
            }
        );
        assert_eq!(summary[&Courier::Gabo].count, 1);
        assert_eq!(
            summary.values().map(|s| s.count).sum::<usize>(),
            records.len()
        );
    }

    #[test]
    fn test_summarize_empty() {
        assert!(summarize(&[]).is_empty());
    }

    #[test]
    fn test_duration_minutes() {
        let records = sample();
        assert_eq!(duration_minutes(&records[0]), Some(30.0));
        assert_eq!(duration_minutes(&records[3]), Some(60.0));

        let mut unknown = records[0].clone();
        unknown.arrival_time = None;
        assert_eq!(duration_minutes(&unknown), None);
    }

    #[test]
    fn test_mean_duration_skips_unknown() {
        let mut records = by_user(&sample(), Courier::Isra);
        assert_eq!(mean_duration(&records), Some(25.0));

        records[0].departure_time = None;
        assert_eq!(mean_duration(&records), Some(20.0));
    }

    #[test]
    fn test_mean_duration_no_data() {
        assert_eq!(mean_duration(&[]), None);

        let mut records = sample();
        for r in &mut records {
            r.arrival_time = None;
        }
        assert_eq!(mean_duration(&records), None);
    }

    #[test]
    fn test_top_clients() {
        let top = top_clients(&sample(), 2);
        assert_eq!(
            top,
            vec![("Taller Y".to_string(), 2), ("Taller X".to_string(), 1)]
        );
    }

    #[test]
    fn test_top_clients_ties_keep_first_seen() {
        let records = vec![
            record(Courier::Isra, "B", 100, "", ""),
            record(Courier::Isra, "A", 100, "", ""),
            record(Courier::Isra, "C", 100, "", ""),
            record(Courier::Isra, "A", 100, "", ""),
            record(Courier::Isra, "B", 100, "", ""),
        ];
        let top = top_clients(&records, 3);
        assert_eq!(
            top,
            vec![
                ("B".to_string(), 2),
                ("A".to_string(), 2),
                ("C".to_string(), 1)
            ]
        );
    }

    #[test]
    fn test_top_clients_zero() {
        assert!(top_clients(&sample(), 0).is_empty());
    }
}
