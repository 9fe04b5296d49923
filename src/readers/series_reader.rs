use crate::error::{LineFormatError, ProcessingError, Result};
use crate::models::{LineError, ParsedSeries, SeriesProvenance, StationFileKey, TimeSeriesRecord};
use crate::utils::constants::{
    DEFAULT_BUFFER_SIZE, FIELD_DELIMITER, MAX_RECORDED_LINE_ERRORS, TIMESTAMP_FORMAT,
};
use chrono::NaiveDateTime;
use memmap2::Mmap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::debug;

/// Reads one `<tag>@<code>.data` file: a free-form header line followed by
/// `YYYY-MM-DD HH:MM:SS|value` lines. Bad lines are dropped and counted.
pub struct SeriesReader {
    use_mmap: bool,
}

impl SeriesReader {
    pub fn new() -> Self {
        Self { use_mmap: false }
    }

    pub fn with_mmap(use_mmap: bool) -> Self {
        Self { use_mmap }
    }

    /// Parse a data file. Only I/O and UTF-8 failures are errors; a file
    /// without a single valid line yields an empty series.
    pub fn read_series(&self, path: &Path, key: &StationFileKey) -> Result<ParsedSeries> {
        let source_file = path
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let series = if self.use_mmap {
            self.read_series_mmap(path, &source_file, key)?
        } else {
            self.read_series_buffered(path, &source_file, key)?
        };

        debug!(
            "Parsed {}: {} of {} data lines valid",
            source_file, series.provenance.valid_lines, series.provenance.total_lines
        );

        Ok(series)
    }

    fn read_series_buffered(
        &self,
        path: &Path,
        source_file: &str,
        key: &StationFileKey,
    ) -> Result<ParsedSeries> {
        let file = File::open(path)?;
        let reader = BufReader::with_capacity(DEFAULT_BUFFER_SIZE, file);
        let mut builder = SeriesBuilder::new(source_file, key);

        for line_result in reader.lines() {
            builder.push_line(&line_result?);
        }

        Ok(builder.finish())
    }

    fn read_series_mmap(
        &self,
        path: &Path,
        source_file: &str,
        key: &StationFileKey,
    ) -> Result<ParsedSeries> {
        let file = File::open(path)?;
        if file.metadata()?.len() == 0 {
            return Ok(SeriesBuilder::new(source_file, key).finish());
        }

        let mmap = unsafe { Mmap::map(&file)? };
        let content = std::str::from_utf8(&mmap)
            .map_err(|e| ProcessingError::InvalidFormat(format!("Invalid UTF-8: {}", e)))?;

        Ok(self.parse_text(source_file, key, content))
    }

    /// Parse already-loaded file contents.
    pub fn parse_text(&self, source_file: &str, key: &StationFileKey, text: &str) -> ParsedSeries {
        let mut builder = SeriesBuilder::new(source_file, key);
        for line in text.lines() {
            builder.push_line(line);
        }
        builder.finish()
    }
}

impl Default for SeriesReader {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse one `timestamp|value` data line.
pub fn parse_data_line(line: &str) -> std::result::Result<TimeSeriesRecord, LineFormatError> {
    let fields: Vec<&str> = line.split(FIELD_DELIMITER).collect();
    if fields.len() != 2 {
        return Err(LineFormatError::FieldCount(fields.len()));
    }

    let timestamp_str = fields[0].trim();
    let timestamp = NaiveDateTime::parse_from_str(timestamp_str, TIMESTAMP_FORMAT)
        .map_err(|_| LineFormatError::Timestamp(timestamp_str.to_string()))?;

    let value_str = fields[1].trim();
    let value = value_str
        .parse::<f64>()
        .map_err(|_| LineFormatError::Value(value_str.to_string()))?;
    if !value.is_finite() {
        return Err(LineFormatError::NonFinite(value_str.to_string()));
    }

    Ok(TimeSeriesRecord::new(timestamp, value))
}

/// Line-by-line accumulator shared by the buffered and mmap paths.
struct SeriesBuilder {
    header: Option<String>,
    records: Vec<TimeSeriesRecord>,
    provenance: SeriesProvenance,
    line_errors: Vec<LineError>,
}

impl SeriesBuilder {
    fn new(source_file: &str, key: &StationFileKey) -> Self {
        Self {
            header: None,
            records: Vec::new(),
            provenance: SeriesProvenance {
                source_file: source_file.to_string(),
                variable_tag: key.variable_tag.clone(),
                station_code: key.station_code,
                total_lines: 0,
                valid_lines: 0,
            },
            line_errors: Vec::new(),
        }
    }

    fn push_line(&mut self, line: &str) {
        if self.header.is_none() {
            self.header = Some(line.to_string());
            return;
        }

        self.provenance.total_lines += 1;
        match parse_data_line(line) {
            Ok(record) => {
                self.provenance.valid_lines += 1;
                self.records.push(record);
            }
            Err(error) => {
                // +1 for the header line
                let line_number = self.provenance.total_lines + 1;
                debug!(
                    "{}:{}: discarded line: {}",
                    self.provenance.source_file, line_number, error
                );
                if self.line_errors.len() < MAX_RECORDED_LINE_ERRORS {
                    self.line_errors.push(LineError { line_number, error });
                }
            }
        }
    }

    fn finish(self) -> ParsedSeries {
        ParsedSeries {
            header: self.header.unwrap_or_default(),
            records: self.records,
            provenance: self.provenance,
            line_errors: self.line_errors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn key() -> StationFileKey {
        StationFileKey::new("TBS", 47045010)
    }

    #[test]
    fn test_parse_data_line() {
        let record = parse_data_line("2020-03-01 07:00:00|27.4").unwrap();
        assert_eq!(
            record.timestamp,
            NaiveDate::from_ymd_opt(2020, 3, 1)
                .unwrap()
                .and_hms_opt(7, 0, 0)
                .unwrap()
        );
        assert_eq!(record.value, 27.4);

        // Whitespace around fields is tolerated
        let padded = parse_data_line(" 2020-03-01 07:00:00 | -3.5 ").unwrap();
        assert_eq!(padded.value, -3.5);
    }

    #[test]
    fn test_parse_is_idempotent() {
        let line = "2019-12-31 23:00:00|0.1";
        assert_eq!(parse_data_line(line), parse_data_line(line));
    }

    #[test]
    fn test_line_errors() {
        assert_eq!(
            parse_data_line("2020-03-01 07:00:00"),
            Err(LineFormatError::FieldCount(1))
        );
        assert_eq!(
            parse_data_line("2020-03-01 07:00:00|1|2"),
            Err(LineFormatError::FieldCount(3))
        );
        assert_eq!(parse_data_line(""), Err(LineFormatError::FieldCount(1)));
        assert_eq!(
            parse_data_line("2020-03-01|27.4"),
            Err(LineFormatError::Timestamp("2020-03-01".to_string()))
        );
        assert_eq!(
            parse_data_line("2020-03-01 07:00:00|abc"),
            Err(LineFormatError::Value("abc".to_string()))
        );
        assert_eq!(
            parse_data_line("2020-03-01 07:00:00|NaN"),
            Err(LineFormatError::NonFinite("NaN".to_string()))
        );
        assert_eq!(
            parse_data_line("2020-03-01 07:00:00|inf"),
            Err(LineFormatError::NonFinite("inf".to_string()))
        );
    }

    #[test]
    fn test_parse_text_counts() {
        let text = "TBS@47045010\n\
                    2020-03-01 07:00:00|27.4\n\
                    2020-03-01 08:00:00|oops\n\
                    \n\
                    2020-03-01 09:00:00|28.0\n";
        let series = SeriesReader::new().parse_text("TBS@47045010.data", &key(), text);

        assert_eq!(series.header, "TBS@47045010");
        assert_eq!(series.len(), 2);
        assert_eq!(series.provenance.total_lines, 4);
        assert_eq!(series.provenance.valid_lines, 2);
        assert_eq!(
            series.provenance.valid_lines + series.provenance.error_lines(),
            series.provenance.total_lines
        );
        assert_eq!(series.line_errors.len(), 2);
        assert_eq!(series.line_errors[0].line_number, 3);
        assert_eq!(series.line_errors[1].line_number, 4);
        assert_eq!(series.provenance.variable_tag, "TBS");
        assert_eq!(series.provenance.station_code, 47045010);
    }

    #[test]
    fn test_header_only_and_empty_files_are_empty_series() {
        let reader = SeriesReader::new();

        let header_only = reader.parse_text("x", &key(), "just a label\n");
        assert!(header_only.is_empty());
        assert_eq!(header_only.provenance.total_lines, 0);

        let empty = reader.parse_text("x", &key(), "");
        assert!(empty.is_empty());
        assert_eq!(empty.header, "");
    }

    #[test]
    fn test_recorded_errors_are_capped() {
        let mut text = String::from("header\n");
        for _ in 0..(MAX_RECORDED_LINE_ERRORS + 5) {
            text.push_str("garbage\n");
        }
        let series = SeriesReader::new().parse_text("x", &key(), &text);
        assert_eq!(series.line_errors.len(), MAX_RECORDED_LINE_ERRORS);
        assert_eq!(series.provenance.error_lines(), MAX_RECORDED_LINE_ERRORS + 5);
    }

    #[test]
    fn test_read_file_buffered_and_mmap_agree() -> Result<()> {
        let mut temp_file = NamedTempFile::new()?;
        writeln!(temp_file, "TBS@47045010")?;
        writeln!(temp_file, "2020-03-01 07:00:00|27.4")?;
        writeln!(temp_file, "2020-03-01 08:00:00|28.1")?;
        write!(temp_file, "2020-03-01 09:00:00|bad\r\n")?;

        let buffered = SeriesReader::new().read_series(temp_file.path(), &key())?;
        let mapped = SeriesReader::with_mmap(true).read_series(temp_file.path(), &key())?;

        assert_eq!(buffered, mapped);
        assert_eq!(buffered.len(), 2);
        assert_eq!(buffered.provenance.total_lines, 3);
        Ok(())
    }

    #[test]
    fn test_empty_file_with_mmap() -> Result<()> {
        let temp_file = NamedTempFile::new()?;
        let series = SeriesReader::with_mmap(true).read_series(temp_file.path(), &key())?;
        assert!(series.is_empty());
        Ok(())
    }

    #[test]
    fn test_missing_file_is_error() {
        let result = SeriesReader::new().read_series(Path::new("/no/such/TBS@1.data"), &key());
        assert!(matches!(result, Err(ProcessingError::Io(_))));
    }

    #[test]
    fn test_invalid_utf8_is_error() -> Result<()> {
        let mut temp_file = NamedTempFile::new()?;
        temp_file.write_all(b"header\n2020-03-01 07:00:00|\xff\xfe\n")?;
        assert!(SeriesReader::new().read_series(temp_file.path(), &key()).is_err());
        assert!(SeriesReader::with_mmap(true)
            .read_series(temp_file.path(), &key())
            .is_err());
        Ok(())
    }
}
