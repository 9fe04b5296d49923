use crate::error::{ProcessingError, Result};
use crate::models::{ReferenceTables, StationMetadata, VariableMetadata};
use crate::utils::constants::DEFAULT_REFERENCE_DELIMITER;
use encoding_rs::{UTF_8, WINDOWS_1252};
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::path::Path;
use tracing::{info, warn};
use validator::Validate;

/// Loads the variable glossary and the station registry from delimited
/// text exports (header row required).
pub struct ReferenceReader {
    delimiter: u8,
}

impl ReferenceReader {
    pub fn new() -> Self {
        Self {
            delimiter: DEFAULT_REFERENCE_DELIMITER,
        }
    }

    pub fn with_delimiter(delimiter: u8) -> Self {
        Self { delimiter }
    }

    /// Load both tables; any failure here aborts the run.
    pub fn load_tables(&self, glossary_path: &Path, stations_path: &Path) -> Result<ReferenceTables> {
        let variables = self.read_variables(glossary_path)?;
        let stations = self.read_stations(stations_path)?;
        let tables = ReferenceTables::new(variables, stations);

        info!(
            "Loaded reference tables: {} variables, {} stations",
            tables.variable_count(),
            tables.station_count()
        );

        Ok(tables)
    }

    pub fn read_variables(&self, path: &Path) -> Result<Vec<VariableMetadata>> {
        self.read_rows(path)
    }

    pub fn read_stations(&self, path: &Path) -> Result<Vec<StationMetadata>> {
        self.read_rows(path)
    }

    /// Deserialize and validate every row; bad rows are skipped with a warning.
    /// A table whose rows are all bad is treated as unreadable.
    fn read_rows<T>(&self, path: &Path) -> Result<Vec<T>>
    where
        T: DeserializeOwned + Validate,
    {
        let table_error = |message: String| ProcessingError::ReferenceTable {
            path: path.display().to_string(),
            message,
        };

        let bytes = std::fs::read(path).map_err(|e| table_error(e.to_string()))?;
        let text = decode_reference_bytes(&bytes);

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(text.as_bytes());

        let mut rows = Vec::new();
        let mut skipped = 0;
        let mut first_error = None;

        for (index, result) in reader.deserialize::<T>().enumerate() {
            // Header is line 1
            let line = index + 2;
            let row = match result {
                Ok(row) => row,
                Err(e) => {
                    warn!("{}:{}: skipping row: {}", path.display(), line, e);
                    first_error.get_or_insert_with(|| e.to_string());
                    skipped += 1;
                    continue;
                }
            };

            if let Err(e) = row.validate() {
                warn!("{}:{}: skipping invalid row: {}", path.display(), line, e);
                first_error.get_or_insert_with(|| e.to_string());
                skipped += 1;
                continue;
            }

            rows.push(row);
        }

        if rows.is_empty() {
            if let Some(error) = first_error {
                return Err(table_error(format!(
                    "no usable rows ({} rejected), first error: {}",
                    skipped, error
                )));
            }
            warn!("{}: reference table has no rows", path.display());
        }

        Ok(rows)
    }
}

impl Default for ReferenceReader {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode reference table bytes: UTF-8 (BOM stripped) when valid, otherwise
/// Windows-1252, the usual encoding of spreadsheet CSV exports.
pub fn decode_reference_bytes(bytes: &[u8]) -> Cow<'_, str> {
    let (text, _, had_errors) = UTF_8.decode(bytes);
    if !had_errors {
        return text;
    }
    let (text, _, _) = WINDOWS_1252.decode(bytes);
    text
}
