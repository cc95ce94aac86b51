//! Derived per-record metrics.

use crate::model::Record;

/// Active ("sick") cases: confirmed minus deaths minus recovered, missing
/// counts taken as zero.
///
/// Not clamped. A record with deaths or recoveries but no confirmed count
/// goes negative, and that value is kept as computed. Saturates at the `i64`
/// bounds instead of overflowing.
pub fn sick_count(record: &Record) -> i64 {
    signed(record.count_confirmed)
        .saturating_sub(signed(record.count_deaths))
        .saturating_sub(signed(record.count_recovered))
}

fn signed(count: Option<u64>) -> i64 {
    count.map_or(0, |c| i64::try_from(c).unwrap_or(i64::MAX))
}

/// Fill `count_sick` on every record.
pub fn apply_metrics(records: &mut [Record]) {
    for record in records {
        record.count_sick = sick_count(record);
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::model::{Coordinates, MetricKind, ObservationFragment};

    fn record(confirmed: Option<u64>, deaths: Option<u64>, recovered: Option<u64>) -> Record {
        let mut r = Record::from_fragment(&ObservationFragment {
            country: "Country A".into(),
            state: None,
            coordinates: Coordinates::new(1.0, 2.0),
            date: NaiveDate::from_ymd_opt(2020, 1, 22).unwrap(),
            kind: MetricKind::Confirmed,
            count: 0,
            is_latest: false,
        });
        r.count_confirmed = confirmed;
        r.count_deaths = deaths;
        r.count_recovered = recovered;
        r
    }

    #[test]
    fn all_three_counts() {
        assert_eq!(sick_count(&record(Some(100), Some(7), Some(40))), 53);
    }

    #[test]
    fn missing_counts_are_zero() {
        assert_eq!(sick_count(&record(Some(7), Some(2), None)), 5);
        assert_eq!(sick_count(&record(None, None, None)), 0);
    }

    #[test]
    fn negative_result_is_preserved() {
        assert_eq!(sick_count(&record(None, Some(3), Some(4))), -7);
        assert_eq!(sick_count(&record(Some(1), Some(3), None)), -2);
    }

    #[test]
    fn extreme_counts_saturate() {
        let max = i64::MAX as u64;
        assert_eq!(sick_count(&record(None, Some(max), Some(max))), i64::MIN);
        assert_eq!(sick_count(&record(Some(max), None, None)), i64::MAX);
        assert_eq!(sick_count(&record(Some(max), Some(max), Some(0))), 0);
        assert_eq!(sick_count(&record(None, Some(u64::MAX), None)), -i64::MAX);
    }

    #[test]
    fn largest_parsed_counts_do_not_overflow() {
        use crate::merge::merge_fragments;
        use crate::normalize::normalize_row;
        use crate::source::RawRow;

        let row = RawRow {
            line: 2,
            state: None,
            country: "X".into(),
            lat: "1".into(),
            lng: "2".into(),
            columns: vec![("1/22/20".into(), "9223372036854775807".into())],
        };
        let deaths = normalize_row(&row, MetricKind::Deaths).unwrap();
        let recovered = normalize_row(&row, MetricKind::Recovered).unwrap();
        let mut records = merge_fragments(&[], &deaths, Some(recovered.as_slice()));
        apply_metrics(&mut records);
        assert_eq!(records[0].count_sick, i64::MIN);
    }

    #[test]
    fn apply_metrics_fills_every_record() {
        let mut records = vec![record(Some(5), Some(1), None), record(Some(7), Some(2), None)];
        apply_metrics(&mut records);
        assert_eq!(records[0].count_sick, 4);
        assert_eq!(records[1].count_sick, 5);
    }
}
