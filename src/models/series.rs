use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::LineFormatError;
use crate::utils::constants::TIMESTAMP_FORMAT;

/// Anything positioned on the time axis; lets filters work on every row type.
pub trait Timestamped {
    fn timestamp(&self) -> NaiveDateTime;
}

/// Serialize a timestamp in the `.data` file format (`YYYY-MM-DD HH:MM:SS`).
pub fn serialize_timestamp<S>(ts: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_str(&ts.format(TIMESTAMP_FORMAT))
}

pub fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    NaiveDateTime::parse_from_str(raw.trim(), TIMESTAMP_FORMAT).map_err(serde::de::Error::custom)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesRecord {
    #[serde(
        serialize_with = "serialize_timestamp",
        deserialize_with = "deserialize_timestamp"
    )]
    pub timestamp: NaiveDateTime,
    pub value: f64,
}

impl TimeSeriesRecord {
    pub fn new(timestamp: NaiveDateTime, value: f64) -> Self {
        Self { timestamp, value }
    }
}

impl Timestamped for TimeSeriesRecord {
    fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }
}

/// Where a series came from and how much of it survived parsing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeriesProvenance {
    pub source_file: String,
    pub variable_tag: String,
    pub station_code: u64,
    /// Data lines read, header excluded
    pub total_lines: usize,
    pub valid_lines: usize,
}

impl SeriesProvenance {
    pub fn error_lines(&self) -> usize {
        self.total_lines - self.valid_lines
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineError {
    /// 1-based physical line number in the source file
    pub line_number: usize,
    pub error: LineFormatError,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedSeries {
    /// First physical line of the file, verbatim
    pub header: String,
    pub records: Vec<TimeSeriesRecord>,
    pub provenance: SeriesProvenance,
    /// First few discarded lines; `provenance.error_lines()` has the full count
    pub line_errors: Vec<LineError>,
}

impl ParsedSeries {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn summary(&self) -> Option<SeriesSummary> {
        let first = self.records.first()?;

        let mut summary = SeriesSummary {
            total_lines: self.provenance.total_lines,
            valid_lines: self.provenance.valid_lines,
            first_timestamp: first.timestamp,
            last_timestamp: first.timestamp,
            min_value: first.value,
            max_value: first.value,
            mean_value: 0.0,
        };

        let mut sum = 0.0;
        for record in &self.records {
            summary.first_timestamp = summary.first_timestamp.min(record.timestamp);
            summary.last_timestamp = summary.last_timestamp.max(record.timestamp);
            summary.min_value = summary.min_value.min(record.value);
            summary.max_value = summary.max_value.max(record.value);
            sum += record.value;
        }
        summary.mean_value = sum / self.records.len() as f64;

        Some(summary)
    }
}

/// Descriptive statistics of one parsed file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesSummary {
    pub total_lines: usize,
    pub valid_lines: usize,
    pub first_timestamp: NaiveDateTime,
    pub last_timestamp: NaiveDateTime,
    pub min_value: f64,
    pub max_value: f64,
    pub mean_value: f64,
}

impl SeriesSummary {
    /// Percentage of data lines that parsed.
    pub fn success_rate(&self) -> f64 {
        if self.total_lines == 0 {
            0.0
        } else {
            (self.valid_lines as f64 / self.total_lines as f64) * 100.0
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "Valid lines: {} / {} ({:.1}%)\n\
            - First timestamp: {}\n\
            - Last timestamp: {}\n\
            - Minimum value: {}\n\
            - Maximum value: {}\n\
            - Mean value: {:.2}",
            self.valid_lines,
            self.total_lines,
            self.success_rate(),
            self.first_timestamp.format(TIMESTAMP_FORMAT),
            self.last_timestamp.format(TIMESTAMP_FORMAT),
            self.min_value,
            self.max_value,
            self.mean_value
        )
    }
}
