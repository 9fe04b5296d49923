use crate::models::{EnrichedRecord, ParsedSeries, ReferenceTables};
use std::sync::Arc;
use tracing::debug;

/// Which reference rows were found for a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetadataMatch {
    pub variable: bool,
    pub station: bool,
}

impl MetadataMatch {
    /// Human readable note on missing metadata, if any.
    pub fn describe_missing(&self) -> Option<&'static str> {
        match (self.variable, self.station) {
            (true, true) => None,
            (false, true) => Some("no glossary entry for tag"),
            (true, false) => Some("no registry entry for station"),
            (false, false) => Some("no glossary or registry entry"),
        }
    }
}

/// Broadcasts glossary and registry rows onto every record of a series.
/// Missing reference rows are not an error; the fields are left empty.
pub struct MetadataJoiner {
    tables: Arc<ReferenceTables>,
}

impl MetadataJoiner {
    pub fn new(tables: Arc<ReferenceTables>) -> Self {
        Self { tables }
    }

    /// Join a series and report which reference rows were found.
    pub fn join_with_match(&self, series: &ParsedSeries) -> (Vec<EnrichedRecord>, MetadataMatch) {
        let provenance = &series.provenance;
        let variable = self.tables.variable(&provenance.variable_tag).cloned();
        let station = self.tables.station(provenance.station_code).cloned();

        let matched = MetadataMatch {
            variable: variable.is_some(),
            station: station.is_some(),
        };
        if let Some(note) = matched.describe_missing() {
            debug!("{}: {}", provenance.source_file, note);
        }

        let source_file: Arc<str> = Arc::from(provenance.source_file.as_str());
        let variable_tag: Arc<str> = Arc::from(provenance.variable_tag.as_str());

        let records = series
            .records
            .iter()
            .map(|record| EnrichedRecord {
                timestamp: record.timestamp,
                value: record.value,
                source_file: Arc::clone(&source_file),
                variable_tag: Arc::clone(&variable_tag),
                station_code: provenance.station_code,
                variable: variable.clone(),
                station: station.clone(),
            })
            .collect();

        (records, matched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        SeriesProvenance, StationMetadata, TimeSeriesRecord, VariableMetadata,
    };
    use chrono::NaiveDate;

    fn tables() -> Arc<ReferenceTables> {
        Arc::new(ReferenceTables::new(
            vec![VariableMetadata::new("TBS", "Temperatura bulbo seco", "°C")],
            vec![StationMetadata::new(
                47045010,
                "APTO SIMON BOLIVAR",
                "MAGDALENA",
                "SANTA MARTA",
                Some(11.1197),
                Some(-74.2306),
            )],
        ))
    }

    fn series(tag: &str, code: u64, values: &[f64]) -> ParsedSeries {
        let base = NaiveDate::from_ymd_opt(2020, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        ParsedSeries {
            header: String::new(),
            records: values
                .iter()
                .enumerate()
                .map(|(i, v)| TimeSeriesRecord::new(base + chrono::Duration::hours(i as i64), *v))
                .collect(),
            provenance: SeriesProvenance {
                source_file: format!("{}@{}.data", tag, code),
                variable_tag: tag.to_string(),
                station_code: code,
                total_lines: values.len(),
                valid_lines: values.len(),
            },
            line_errors: Vec::new(),
        }
    }

    #[test]
    fn test_join_broadcasts_metadata() {
        let joiner = MetadataJoiner::new(tables());
        let (records, matched) = joiner.join_with_match(&series("TBS", 47045010, &[27.0, 28.5]));

        assert_eq!(matched.describe_missing(), None);
        assert_eq!(records.len(), 2);
        for record in &records {
            assert_eq!(record.unit(), Some("°C"));
            assert_eq!(record.station_name(), Some("APTO SIMON BOLIVAR"));
            assert_eq!(record.department(), Some("MAGDALENA"));
            assert_eq!(&*record.source_file, "TBS@47045010.data");
        }
        assert_eq!(records[1].value, 28.5);
        // One shared metadata row, not a copy per record
        assert!(Arc::ptr_eq(
            records[0].station.as_ref().unwrap(),
            records[1].station.as_ref().unwrap()
        ));
    }

    #[test]
    fn test_missing_metadata_is_omitted() {
        let joiner = MetadataJoiner::new(tables());
        let (records, matched) = joiner.join_with_match(&series("PT", 99, &[1.0, 2.0, 3.0]));

        assert_eq!(records.len(), 3);
        assert_eq!(
            matched,
            MetadataMatch {
                variable: false,
                station: false
            }
        );
        assert!(records.iter().all(|r| r.variable.is_none() && r.station.is_none()));
        assert_eq!(matched.describe_missing(), Some("no glossary or registry entry"));
    }

    #[test]
    fn test_partial_match() {
        let joiner = MetadataJoiner::new(tables());
        let (records, matched) = joiner.join_with_match(&series("TBS", 1, &[1.0]));
        assert!(matched.variable);
        assert!(!matched.station);
        assert_eq!(records[0].unit(), Some("°C"));
        assert!(records[0].station_name().is_none());
    }
}
