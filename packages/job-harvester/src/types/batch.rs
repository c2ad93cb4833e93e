//! The deduplicated scrape batch of one run.

use indexmap::IndexMap;
use std::collections::HashSet;

use super::job::JobRecord;

/// Deduplicated union of every record harvested in one run.
///
/// Duplicate ids keep the record seen last (later data in a run is
/// fresher) at the position where the id was first seen.
#[derive(Debug, Clone, Default)]
pub struct ScrapeBatch {
    records: IndexMap<String, JobRecord>,
}

impl ScrapeBatch {
    /// Create an empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a batch from records in iteration order.
    pub fn from_records(records: impl IntoIterator<Item = JobRecord>) -> Self {
        let mut batch = Self::new();
        batch.extend(records);
        batch
    }

    /// Add a record, replacing any earlier record with the same id.
    ///
    /// Returns true if the id was already present.
    pub fn push(&mut self, record: JobRecord) -> bool {
        self.records
            .insert(record.job_id.clone(), record)
            .is_some()
    }

    /// Add records in order.
    pub fn extend(&mut self, records: impl IntoIterator<Item = JobRecord>) {
        for record in records {
            self.push(record);
        }
    }

    pub fn get(&self, job_id: &str) -> Option<&JobRecord> {
        self.records.get(job_id)
    }

    pub fn contains(&self, job_id: &str) -> bool {
        self.records.contains_key(job_id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in first-seen order.
    pub fn records(&self) -> impl Iterator<Item = &JobRecord> {
        self.records.values()
    }

    /// Set of ids in the batch.
    pub fn ids(&self) -> HashSet<String> {
        self.records.keys().cloned().collect()
    }
}

impl FromIterator<JobRecord> for ScrapeBatch {
    fn from_iter<I: IntoIterator<Item = JobRecord>>(iter: I) -> Self {
        Self::from_records(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn record(id: &str, title: &str) -> JobRecord {
        JobRecord::new(id, title, "https://www.linkedin.com/jobs/search/?keywords=x")
    }

    #[test]
    fn test_last_occurrence_wins() {
        let batch = ScrapeBatch::from_records(vec![record("1", "A"), record("1", "B")]);

        assert_eq!(batch.len(), 1);
        assert_eq!(batch.get("1").unwrap().title, "B");
    }

    #[test]
    fn test_keeps_first_seen_position() {
        let batch = ScrapeBatch::from_records(vec![
            record("1", "A"),
            record("2", "B"),
            record("1", "C"),
        ]);

        let order: Vec<_> = batch.records().map(|r| (r.job_id.as_str(), r.title.as_str())).collect();
        assert_eq!(order, vec![("1", "C"), ("2", "B")]);
    }

    proptest! {
        #[test]
        fn prop_one_record_per_id_and_it_is_the_last(ids in proptest::collection::vec(0u8..8, 0..40)) {
            let records: Vec<_> = ids
                .iter()
                .enumerate()
                .map(|(i, id)| record(&id.to_string(), &format!("t{}", i)))
                .collect();
            let batch = ScrapeBatch::from_records(records.clone());

            let distinct: std::collections::HashSet<_> = ids.iter().collect();
            prop_assert_eq!(batch.len(), distinct.len());

            for id in distinct {
                let id = id.to_string();
                let last = records.iter().rev().find(|r| r.job_id == id).unwrap();
                prop_assert_eq!(&batch.get(&id).unwrap().title, &last.title);
            }
        }
    }
}
