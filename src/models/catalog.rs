use crate::error::NameFormatError;
use crate::utils::constants::STATION_KEY_SEPARATOR;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

/// Identity of a station data file, decoded from `<variableTag>@<stationCode>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StationFileKey {
    pub variable_tag: String,
    pub station_code: u64,
}

impl StationFileKey {
    pub fn new(variable_tag: impl Into<String>, station_code: u64) -> Self {
        Self {
            variable_tag: variable_tag.into(),
            station_code,
        }
    }

    /// Decode a file stem (file name without extension), e.g. `TBS@47045010`.
    pub fn from_stem(stem: &str) -> Result<Self, NameFormatError> {
        let parts: Vec<&str> = stem.split(STATION_KEY_SEPARATOR).collect();
        if parts.len() != 2 {
            return Err(NameFormatError::WrongPartCount(parts.len()));
        }

        let (tag, code) = (parts[0], parts[1]);
        if tag.is_empty() {
            return Err(NameFormatError::EmptyTag);
        }

        // Digits only: `u64::from_str` would also accept a leading '+'
        if code.is_empty() || !code.bytes().all(|b| b.is_ascii_digit()) {
            return Err(NameFormatError::InvalidStationCode(code.to_string()));
        }
        let station_code = code
            .parse::<u64>()
            .map_err(|_| NameFormatError::InvalidStationCode(code.to_string()))?;

        Ok(Self::new(tag, station_code))
    }
}

impl fmt::Display for StationFileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}",
            self.variable_tag, STATION_KEY_SEPARATOR, self.station_code
        )
    }
}

/// One candidate data file, with its decoded key or the reason it was rejected.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    pub file_name: String,
    pub path: PathBuf,
    pub key: Result<StationFileKey, NameFormatError>,
}

/// Ordered set of data files found for one run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileCatalog {
    pub entries: Vec<CatalogEntry>,
}

impl FileCatalog {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn resolved(&self) -> impl Iterator<Item = (&CatalogEntry, &StationFileKey)> {
        self.entries
            .iter()
            .filter_map(|e| e.key.as_ref().ok().map(|k| (e, k)))
    }

    pub fn rejected(&self) -> impl Iterator<Item = (&CatalogEntry, &NameFormatError)> {
        self.entries
            .iter()
            .filter_map(|e| e.key.as_ref().err().map(|err| (e, err)))
    }

    /// Distinct variable tags, sorted.
    pub fn variable_tags(&self) -> Vec<String> {
        self.resolved()
            .map(|(_, k)| k.variable_tag.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Distinct station codes, sorted.
    pub fn station_codes(&self) -> Vec<u64> {
        self.resolved()
            .map(|(_, k)| k.station_code)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn find(&self, variable_tag: &str, station_code: u64) -> Option<&CatalogEntry> {
        self.resolved()
            .find(|(_, k)| k.variable_tag == variable_tag && k.station_code == station_code)
            .map(|(e, _)| e)
    }
}
