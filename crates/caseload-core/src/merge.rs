//! Multi-source merge of observation fragments into [`Record`]s.
//!
//! Records are keyed by `(coordinates, date)` only. Province/state is not
//! part of the identity, so two source rows that share exact coordinates
//! land on the same record: the first fragment seen under a key fixes the
//! record's country, state, location, date and `is_current` flag, and every
//! later fragment under that key only overwrites its own count slot.
//!
//! Sources are applied confirmed → deaths → recovered. Output order is the
//! order in which keys were first seen, so a run over the same inputs always
//! yields the same sequence.

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::model::{Coordinates, ObservationFragment, Record};

/// Identity key: `"<lng>|<lat>|<yyyy-mm-dd>"`.
pub fn merge_key(coordinates: &Coordinates, date: NaiveDate) -> String {
    format!("{}|{}", coordinates.key(), date.format("%Y-%m-%d"))
}

/// Accumulates fragments into one record per key.
#[derive(Debug, Default)]
pub struct FragmentMerger {
    index: HashMap<String, usize>,
    records: Vec<Record>,
}

impl FragmentMerger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Find-or-create the record for this fragment's key and set its count.
    pub fn apply(&mut self, fragment: &ObservationFragment) {
        let key = merge_key(&fragment.coordinates, fragment.date);
        let idx = match self.index.get(&key) {
            Some(&idx) => idx,
            None => {
                self.records.push(Record::from_fragment(fragment));
                let idx = self.records.len() - 1;
                self.index.insert(key, idx);
                idx
            }
        };
        *self.records[idx].count_mut(fragment.kind) = Some(fragment.count);
    }

    pub fn absorb<'a>(&mut self, fragments: impl IntoIterator<Item = &'a ObservationFragment>) {
        for fragment in fragments {
            self.apply(fragment);
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn into_records(self) -> Vec<Record> {
        self.records
    }
}

/// Merge the per-metric fragment streams in the fixed confirmed → deaths →
/// recovered order. `recovered` is absent for exports that no longer ship it.
pub fn merge_fragments(
    confirmed: &[ObservationFragment],
    deaths: &[ObservationFragment],
    recovered: Option<&[ObservationFragment]>,
) -> Vec<Record> {
    let mut merger = FragmentMerger::new();
    merger.absorb(confirmed);
    merger.absorb(deaths);
    if let Some(recovered) = recovered {
        merger.absorb(recovered);
    }
    merger.into_records()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MetricKind;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 1, d).unwrap()
    }

    fn frag(
        state: Option<&str>,
        at: (f64, f64),
        day: u32,
        kind: MetricKind,
        count: u64,
        is_latest: bool,
    ) -> ObservationFragment {
        ObservationFragment {
            country: "Country A".into(),
            state: state.map(str::to_string),
            coordinates: Coordinates::new(at.0, at.1),
            date: date(day),
            kind,
            count,
            is_latest,
        }
    }

    #[test]
    fn key_distinguishes_both_components() {
        let a = Coordinates::new(1.0, 2.0);
        let b = Coordinates::new(2.0, 1.0);
        assert_eq!(merge_key(&a, date(22)), "1|2|2020-01-22");
        assert_ne!(merge_key(&a, date(22)), merge_key(&b, date(22)));
        assert_ne!(merge_key(&a, date(22)), merge_key(&a, date(23)));
    }

    #[test]
    fn confirmed_and_deaths_share_records() {
        let at = (10.0, 20.0);
        let confirmed = vec![
            frag(None, at, 22, MetricKind::Confirmed, 5, false),
            frag(None, at, 23, MetricKind::Confirmed, 7, true),
        ];
        let deaths = vec![
            frag(None, at, 22, MetricKind::Deaths, 1, false),
            frag(None, at, 23, MetricKind::Deaths, 2, true),
        ];
        let records = merge_fragments(&confirmed, &deaths, None);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].date, date(22));
        assert_eq!(records[0].count_confirmed, Some(5));
        assert_eq!(records[0].count_deaths, Some(1));
        assert_eq!(records[0].count_recovered, None);
        assert!(!records[0].is_current);
        assert_eq!(records[1].count_confirmed, Some(7));
        assert_eq!(records[1].count_deaths, Some(2));
        assert!(records[1].is_current);
    }

    #[test]
    fn same_fragment_twice_keeps_one_record() {
        let f = frag(None, (1.0, 1.0), 22, MetricKind::Confirmed, 3, true);
        let mut merger = FragmentMerger::new();
        merger.apply(&f);
        merger.apply(&f);
        assert_eq!(merger.len(), 1);
        assert_eq!(merger.into_records()[0].count_confirmed, Some(3));
    }

    #[test]
    fn first_fragment_fixes_shared_fields() {
        let at = (5.0, 5.0);
        let confirmed = vec![frag(Some("North"), at, 22, MetricKind::Confirmed, 10, false)];
        let deaths = vec![frag(Some("South"), at, 22, MetricKind::Deaths, 4, true)];
        let records = merge_fragments(&confirmed, &deaths, None);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].state.as_deref(), Some("North"));
        assert!(!records[0].is_current);
        assert_eq!(records[0].count_deaths, Some(4));
    }

    #[test]
    fn colliding_states_last_count_wins() {
        // Two provinces reported at the same centroid collide on one key.
        let at = (5.0, 5.0);
        let confirmed = vec![
            frag(Some("North"), at, 22, MetricKind::Confirmed, 10, true),
            frag(Some("South"), at, 22, MetricKind::Confirmed, 3, true),
        ];
        let records = merge_fragments(&confirmed, &[], None);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].state.as_deref(), Some("North"));
        assert_eq!(records[0].count_confirmed, Some(3));
    }

    #[test]
    fn record_created_by_later_source_when_confirmed_missing() {
        let deaths = vec![frag(None, (7.0, 8.0), 22, MetricKind::Deaths, 2, true)];
        let recovered = vec![frag(None, (7.0, 8.0), 22, MetricKind::Recovered, 1, true)];
        let records = merge_fragments(&[], &deaths, Some(recovered.as_slice()));
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].count_confirmed, None);
        assert_eq!(records[0].count_deaths, Some(2));
        assert_eq!(records[0].count_recovered, Some(1));
        assert!(records[0].is_current);
    }

    #[test]
    fn output_order_follows_first_sighting() {
        let confirmed = vec![frag(None, (1.0, 1.0), 22, MetricKind::Confirmed, 1, true)];
        let deaths = vec![
            frag(None, (2.0, 2.0), 22, MetricKind::Deaths, 1, true),
            frag(None, (1.0, 1.0), 22, MetricKind::Deaths, 0, true),
        ];
        let recovered = vec![frag(None, (3.0, 3.0), 22, MetricKind::Recovered, 1, true)];
        let records = merge_fragments(&confirmed, &deaths, Some(recovered.as_slice()));
        let lngs: Vec<f64> = records.iter().map(|r| r.location.lng).collect();
        assert_eq!(lngs, vec![1.0, 2.0, 3.0]);
    }
}
