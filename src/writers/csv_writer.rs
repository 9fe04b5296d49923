use crate::error::Result;
use crate::models::series::serialize_timestamp;
use crate::models::{
    EnrichedRecord, FileOutcome, PeriodMean, PeriodMeans, SeriesPeriodMeans, ThermalIndexRow,
    TimeSeriesRecord,
};
use crate::utils::constants::{DEFAULT_BUFFER_SIZE, FIELD_DELIMITER, TIMESTAMP_FORMAT};
use chrono::NaiveDateTime;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

/// Flat CSV row of the consolidated dataset; missing metadata is left blank.
#[derive(Serialize)]
struct DatasetRow<'a> {
    #[serde(serialize_with = "serialize_timestamp")]
    timestamp: NaiveDateTime,
    value: f64,
    source_file: &'a str,
    variable_tag: &'a str,
    station_code: u64,
    parameter: Option<&'a str>,
    unit: Option<&'a str>,
    description: Option<&'a str>,
    station_name: Option<&'a str>,
    category: Option<&'a str>,
    department: Option<&'a str>,
    municipality: Option<&'a str>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    elevation: Option<f64>,
}

impl<'a> From<&'a EnrichedRecord> for DatasetRow<'a> {
    fn from(record: &'a EnrichedRecord) -> Self {
        let variable = record.variable.as_deref();
        let station = record.station.as_deref();

        Self {
            timestamp: record.timestamp,
            value: record.value,
            source_file: &record.source_file,
            variable_tag: &record.variable_tag,
            station_code: record.station_code,
            parameter: record.parameter(),
            unit: record.unit(),
            description: variable.and_then(|v| v.description.as_deref()),
            station_name: record.station_name(),
            category: station.and_then(|s| s.category.as_deref()),
            department: record.department(),
            municipality: record.municipality(),
            latitude: station.and_then(|s| s.latitude),
            longitude: station.and_then(|s| s.longitude),
            elevation: station.and_then(|s| s.elevation),
        }
    }
}

#[derive(Serialize)]
struct PeriodRow<'a> {
    period: &'a str,
    label: &'a str,
    mean: Option<f64>,
    count: usize,
}

#[derive(Serialize)]
struct SeriesPeriodRow<'a> {
    variable_tag: &'a str,
    station_code: u64,
    period: &'a str,
    label: &'a str,
    mean: Option<f64>,
    count: usize,
}

/// Monthly rows first (January to December), then annual rows.
fn periods(means: &PeriodMeans) -> impl Iterator<Item = (&'static str, &PeriodMean)> {
    means
        .monthly
        .iter()
        .map(|p| ("month", p))
        .chain(means.annual.iter().map(|p| ("year", p)))
}

/// Comma-separated UTF-8 exports. Floats are written in shortest
/// round-trip form and timestamps in the `.data` format, so exported
/// columns can be parsed back by the series reader.
pub struct CsvWriter;

impl CsvWriter {
    pub fn new() -> Self {
        Self
    }

    pub fn write_dataset(&self, records: &[EnrichedRecord], path: &Path) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)?;
        for record in records {
            writer.serialize(DatasetRow::from(record))?;
        }
        writer.flush()?;

        info!("Wrote {} consolidated rows to {}", records.len(), path.display());
        Ok(())
    }

    pub fn write_thermal(&self, rows: &[ThermalIndexRow], path: &Path) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)?;
        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush()?;

        info!("Wrote {} thermal index rows to {}", rows.len(), path.display());
        Ok(())
    }

    pub fn write_period_means(&self, means: &PeriodMeans, path: &Path) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)?;

        for (period, mean) in periods(means) {
            writer.serialize(PeriodRow {
                period,
                label: &mean.label,
                mean: mean.mean,
                count: mean.count,
            })?;
        }
        writer.flush()?;

        Ok(())
    }

    /// Period means keyed by variable tag and station code, one block per series.
    pub fn write_series_means(&self, series: &[SeriesPeriodMeans], path: &Path) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)?;

        for entry in series {
            for (period, mean) in periods(&entry.means) {
                writer.serialize(SeriesPeriodRow {
                    variable_tag: &entry.key.variable_tag,
                    station_code: entry.key.station_code,
                    period,
                    label: &mean.label,
                    mean: mean.mean,
                    count: mean.count,
                })?;
            }
        }
        writer.flush()?;

        info!("Wrote period means of {} series to {}", series.len(), path.display());
        Ok(())
    }

    pub fn write_outcomes(&self, outcomes: &[FileOutcome], path: &Path) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)?;
        for outcome in outcomes {
            writer.serialize(outcome)?;
        }
        writer.flush()?;

        Ok(())
    }

    /// Write a series back in the `.data` format: `header`, then one
    /// `timestamp|value` line per record.
    pub fn write_series_data(
        &self,
        header: &str,
        records: &[TimeSeriesRecord],
        path: &Path,
    ) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::with_capacity(DEFAULT_BUFFER_SIZE, file);

        writeln!(writer, "{}", header)?;
        for record in records {
            writeln!(
                writer,
                "{}{}{}",
                record.timestamp.format(TIMESTAMP_FORMAT),
                FIELD_DELIMITER,
                record.value
            )?;
        }
        writer.flush()?;

        Ok(())
    }
}

impl Default for CsvWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PeriodMean, StationFileKey, StationMetadata, VariableMetadata};
    use crate::processors::derive_row;
    use crate::readers::{parse_data_line, SeriesReader};
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn ts(hour: u32, second: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2021, 2, 28)
            .unwrap()
            .and_hms_opt(hour, 0, second)
            .unwrap()
    }

    fn record(hour: u32, value: f64, with_station: bool) -> EnrichedRecord {
        EnrichedRecord {
            timestamp: ts(hour, 7),
            value,
            source_file: Arc::from("TBS@1.data"),
            variable_tag: Arc::from("TBS"),
            station_code: 1,
            variable: Some(Arc::new(VariableMetadata::new(
                "TBS",
                "Temperatura bulbo seco",
                "°C",
            ))),
            station: with_station.then(|| {
                Arc::new(StationMetadata::new(
                    1,
                    "Uno, Dos",
                    "CESAR",
                    "VALLEDUPAR",
                    Some(10.4),
                    None,
                ))
            }),
        }
    }

    #[test]
    fn test_dataset_columns_round_trip() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("dataset.csv");
        let records = vec![
            record(0, 0.1 + 0.2, true),
            record(1, -1234.5678e-3, false),
        ];

        CsvWriter::new().write_dataset(&records, &path)?;

        let mut reader = csv::Reader::from_path(&path)?;
        let headers = reader.headers()?.clone();
        assert_eq!(&headers[0], "timestamp");
        assert_eq!(&headers[8], "station_name");
        assert_eq!(headers.len(), 15);

        let rows: Vec<csv::StringRecord> = reader.records().collect::<std::result::Result<_, _>>()?;
        assert_eq!(&rows[0][8], "Uno, Dos");
        assert_eq!(&rows[0][13], "");
        assert_eq!(&rows[1][8], "");

        // Timestamp and value re-parse through the series line parser unchanged
        for (row, original) in rows.iter().zip(&records) {
            let line = format!("{}|{}", &row[0], &row[1]);
            let parsed = parse_data_line(&line).unwrap();
            assert_eq!(parsed.timestamp, original.timestamp);
            assert_eq!(parsed.value.to_bits(), original.value.to_bits());
        }
        Ok(())
    }

    #[test]
    fn test_thermal_headers() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("indices.csv");
        let rows = vec![derive_row(ts(12, 0), 30.0, 22.0, 20.0, 4.0)];

        CsvWriter::new().write_thermal(&rows, &path)?;

        let mut reader = csv::Reader::from_path(&path)?;
        let headers: Vec<String> = reader.headers()?.iter().map(String::from).collect();
        assert_eq!(
            headers,
            vec!["timestamp", "Tbs", "Tbh", "Tr", "Vv", "Tgn", "ITH", "ITGH", "CTR"]
        );
        let row = reader.records().next().unwrap()?;
        assert_eq!(&row[0], "2021-02-28 12:00:00");
        assert_eq!(row[6].parse::<f64>().unwrap(), rows[0].ith);
        Ok(())
    }

    #[test]
    fn test_period_means_blank_for_empty() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("means.csv");
        let means = PeriodMeans {
            monthly: vec![
                PeriodMean::new("January", 10.0, 4),
                PeriodMean::new("February", 0.0, 0),
            ],
            annual: vec![PeriodMean::new("2021", 10.0, 4)],
        };

        CsvWriter::new().write_period_means(&means, &path)?;

        let content = std::fs::read_to_string(&path)?;
        assert_eq!(
            content,
            "period,label,mean,count\n\
             month,January,2.5,4\n\
             month,February,,0\n\
             year,2021,2.5,4\n"
        );
        Ok(())
    }

    #[test]
    fn test_series_means_keyed_by_tag_and_station() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("means.csv");
        let one_month = |label: &str, sum: f64| PeriodMeans {
            monthly: vec![PeriodMean::new("January", sum, 1)],
            annual: vec![PeriodMean::new(label, sum, 1)],
        };
        let series = vec![
            SeriesPeriodMeans {
                key: StationFileKey::new("TBS", 1),
                means: one_month("2020", 30.0),
            },
            SeriesPeriodMeans {
                key: StationFileKey::new("VV", 1),
                means: one_month("2020", 2.0),
            },
        ];

        CsvWriter::new().write_series_means(&series, &path)?;

        let content = std::fs::read_to_string(&path)?;
        assert_eq!(
            content,
            "variable_tag,station_code,period,label,mean,count\n\
             TBS,1,month,January,30.0,1\n\
             TBS,1,year,2020,30.0,1\n\
             VV,1,month,January,2.0,1\n\
             VV,1,year,2020,2.0,1\n"
        );
        Ok(())
    }

    #[test]
    fn test_outcomes_csv() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("outcomes.csv");
        let outcomes = vec![FileOutcome::failure("bad-name.data", "malformed name")];

        CsvWriter::new().write_outcomes(&outcomes, &path)?;

        let content = std::fs::read_to_string(&path)?;
        assert!(content.starts_with("file_name,status,detail,valid_lines,total_lines\n"));
        assert!(content.contains("bad-name.data,failure,malformed name,0,0"));
        Ok(())
    }

    #[test]
    fn test_series_data_round_trip() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("TBS@1.data");
        let records = vec![
            TimeSeriesRecord::new(ts(0, 0), 27.4),
            TimeSeriesRecord::new(ts(1, 59), 1.0 / 3.0),
            TimeSeriesRecord::new(ts(2, 0), -0.0001),
        ];

        CsvWriter::new().write_series_data("TBS@1", &records, &path)?;

        let series = SeriesReader::new().read_series(&path, &StationFileKey::new("TBS", 1))?;
        assert_eq!(series.header, "TBS@1");
        assert_eq!(series.records, records);
        assert_eq!(series.provenance.error_lines(), 0);
        Ok(())
    }
}
