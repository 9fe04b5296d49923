use chrono::NaiveDateTime;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use crate::models::{StationFileKey, StationMetadata, Timestamped, VariableMetadata};

/// A series row with its file provenance and whatever glossary/registry rows
/// matched. Metadata is shared by `Arc` between all rows of one series.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedRecord {
    pub timestamp: NaiveDateTime,
    pub value: f64,
    pub source_file: Arc<str>,
    pub variable_tag: Arc<str>,
    pub station_code: u64,
    pub variable: Option<Arc<VariableMetadata>>,
    pub station: Option<Arc<StationMetadata>>,
}

impl EnrichedRecord {
    pub fn parameter(&self) -> Option<&str> {
        self.variable.as_deref().map(|v| v.parameter.as_str())
    }

    pub fn unit(&self) -> Option<&str> {
        self.variable.as_deref().map(|v| v.unit.as_str())
    }

    pub fn station_name(&self) -> Option<&str> {
        self.station.as_deref().map(|s| s.name.as_str())
    }

    pub fn department(&self) -> Option<&str> {
        self.station.as_deref().map(|s| s.department.as_str())
    }

    pub fn municipality(&self) -> Option<&str> {
        self.station.as_deref().map(|s| s.municipality.as_str())
    }
}

impl Timestamped for EnrichedRecord {
    fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }
}

/// Optional restriction of a dataset to one file, tag and/or station.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatasetSelection {
    pub source_file: Option<String>,
    pub variable_tag: Option<String>,
    pub station_code: Option<u64>,
}

impl DatasetSelection {
    pub fn is_empty(&self) -> bool {
        self.source_file.is_none() && self.variable_tag.is_none() && self.station_code.is_none()
    }

    pub fn matches(&self, record: &EnrichedRecord) -> bool {
        self.source_file
            .as_deref()
            .map_or(true, |f| &*record.source_file == f)
            && self
                .variable_tag
                .as_deref()
                .map_or(true, |t| &*record.variable_tag == t)
            && self
                .station_code
                .map_or(true, |c| record.station_code == c)
    }
}

/// All enriched rows of a run, concatenated in catalog order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConsolidatedDataset {
    pub records: Vec<EnrichedRecord>,
}

impl ConsolidatedDataset {
    pub fn new(records: Vec<EnrichedRecord>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, EnrichedRecord> {
        self.records.iter()
    }

    /// Earliest and latest timestamp in the dataset.
    pub fn time_span(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        let mut iter = self.records.iter().map(|r| r.timestamp);
        let first = iter.next()?;
        Some(iter.fold((first, first), |(lo, hi), t| (lo.min(t), hi.max(t))))
    }

    pub fn select(&self, selection: &DatasetSelection) -> ConsolidatedDataset {
        if selection.is_empty() {
            return self.clone();
        }
        ConsolidatedDataset::new(
            self.records
                .iter()
                .filter(|r| selection.matches(r))
                .cloned()
                .collect(),
        )
    }

    /// `(timestamp, value)` pairs of each `<tag>@<station>` series, in order
    /// of first appearance. Values of different variables are never mixed.
    pub fn series_points(&self) -> Vec<(StationFileKey, Vec<(NaiveDateTime, f64)>)> {
        let mut groups: Vec<(StationFileKey, Vec<(NaiveDateTime, f64)>)> = Vec::new();
        let mut index: HashMap<(&str, u64), usize> = HashMap::new();

        for record in &self.records {
            let slot = *index
                .entry((&*record.variable_tag, record.station_code))
                .or_insert_with(|| {
                    groups.push((
                        StationFileKey::new(&*record.variable_tag, record.station_code),
                        Vec::new(),
                    ));
                    groups.len() - 1
                });
            groups[slot].1.push((record.timestamp, record.value));
        }

        groups
    }

    pub fn source_file_count(&self) -> usize {
        self.records
            .iter()
            .map(|r| &*r.source_file)
            .collect::<BTreeSet<_>>()
            .len()
    }
}

impl<'a> IntoIterator for &'a ConsolidatedDataset {
    type Item = &'a EnrichedRecord;
    type IntoIter = std::slice::Iter<'a, EnrichedRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
