//! Deduplicating accumulator and the finished, read-only result set.

use std::{cmp::Ordering, collections::HashSet};

use common::result::{base::NormalizedRecord, enums::Sort};
use tracing::trace;

#[derive(Debug, Default)]
pub struct ResultSink {
    seen: HashSet<String>,
    records: Vec<NormalizedRecord>,
    duplicates: usize,
}

impl ResultSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// First occurrence of an identity key wins. Returns `false` when the
    /// record was dropped as a duplicate.
    pub fn accumulate(&mut self, record: NormalizedRecord) -> bool {
        let key = record.identity_key();

        if !self.seen.insert(key) {
            trace!("Dropping duplicate {}", record.identity_key());
            self.duplicates += 1;
            return false;
        }

        self.records.push(record);
        true
    }

    pub fn accumulate_all(&mut self, records: impl IntoIterator<Item = NormalizedRecord>) {
        for record in records {
            self.accumulate(record);
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn duplicates(&self) -> usize {
        self.duplicates
    }

    /// Consumes the sink, nothing can be added afterwards.
    pub fn finalize(self) -> ResultSet {
        ResultSet {
            records: self.records,
        }
    }
}

/// Accumulates into a fresh sink and finalizes it.
pub fn accumulate(records: impl IntoIterator<Item = NormalizedRecord>) -> ResultSet {
    let mut sink = ResultSink::new();
    sink.accumulate_all(records);
    sink.finalize()
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct ResultSet {
    records: Vec<NormalizedRecord>,
}

// absent values always sort last
fn compare_present(a: Option<f64>, b: Option<f64>, descending: bool) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) if descending => b.total_cmp(&a),
        (Some(a), Some(b)) => a.total_cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

impl ResultSet {
    pub fn records(&self) -> &[NormalizedRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, NormalizedRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn into_records(self) -> Vec<NormalizedRecord> {
        self.records
    }

    /// Stable, ties keep page order.
    pub fn sorted(&self, sort: Sort) -> Vec<&NormalizedRecord> {
        let mut records: Vec<&NormalizedRecord> = self.records.iter().collect();

        match sort {
            Sort::PageOrder => {}
            Sort::PriceAsc => {
                records.sort_by(|a, b| compare_present(a.price_amount, b.price_amount, false))
            }
            Sort::PriceDesc => {
                records.sort_by(|a, b| compare_present(a.price_amount, b.price_amount, true))
            }
            Sort::PricePerArea => {
                records.sort_by(|a, b| {
                    compare_present(a.price_per_area(), b.price_per_area(), false)
                })
            }
        }

        records
    }

    /// Highest score first, records the scorer has no opinion on go last.
    pub fn ranked_by<F>(&self, scorer: F) -> Vec<(&NormalizedRecord, Option<f64>)>
    where
        F: Fn(&NormalizedRecord) -> Option<f64>,
    {
        let mut ranked: Vec<(&NormalizedRecord, Option<f64>)> = self
            .records
            .iter()
            .map(|record| (record, scorer(record)))
            .collect();

        ranked.sort_by(|(_, a), (_, b)| compare_present(*a, *b, true));

        ranked
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a NormalizedRecord;
    type IntoIter = std::slice::Iter<'a, NormalizedRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
