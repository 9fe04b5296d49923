use crate::error::{ProcessingError, Result};
use crate::models::{
    CatalogEntry, FileCatalog, ParsedSeries, ReferenceTables, StationFileKey, ThermalIndexTable,
    VariableMetadata,
};
use crate::processors::ThermalIndexCalculator;
use crate::readers::SeriesReader;
use std::fmt;
use std::path::Path;
use tracing::{debug, info};

/// The four inputs of the thermal index calculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThermalRole {
    DryBulb,
    WetBulb,
    DewPoint,
    WindSpeed,
}

impl ThermalRole {
    pub const ALL: [ThermalRole; 4] = [
        ThermalRole::DryBulb,
        ThermalRole::WetBulb,
        ThermalRole::DewPoint,
        ThermalRole::WindSpeed,
    ];

    /// Column name in the index table.
    pub fn column(&self) -> &'static str {
        match self {
            ThermalRole::DryBulb => "Tbs",
            ThermalRole::WetBulb => "Tbh",
            ThermalRole::DewPoint => "Tr",
            ThermalRole::WindSpeed => "Vv",
        }
    }

    /// Whether a glossary parameter name describes this role.
    pub fn matches(&self, variable: &VariableMetadata) -> bool {
        match self {
            ThermalRole::DryBulb => variable.parameter_contains("bulbo seco"),
            ThermalRole::WetBulb => variable.parameter_contains("bulbo húmedo"),
            ThermalRole::DewPoint => variable.parameter_contains("rocío"),
            // Excludes wind direction
            ThermalRole::WindSpeed => {
                variable.parameter_contains("viento") && variable.parameter_contains("velocidad")
            }
        }
    }
}

impl fmt::Display for ThermalRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// The data files selected for Tbs, Tbh, Tr and Vv.
#[derive(Debug, Clone, PartialEq)]
pub struct ThermalInputs {
    pub station_code: Option<u64>,
    pub tbs: CatalogEntry,
    pub tbh: CatalogEntry,
    pub tr: CatalogEntry,
    pub vv: CatalogEntry,
}

impl ThermalInputs {
    /// Inputs given as explicit file paths; names must still be `<tag>@<code>.<ext>`.
    pub fn from_paths(tbs: &Path, tbh: &Path, tr: &Path, vv: &Path) -> Result<Self> {
        let tbs = entry_for_path(tbs)?;
        let tbh = entry_for_path(tbh)?;
        let tr = entry_for_path(tr)?;
        let vv = entry_for_path(vv)?;

        let codes: Vec<u64> = [&tbs, &tbh, &tr, &vv]
            .iter()
            .filter_map(|e| e.key.as_ref().ok().map(|k| k.station_code))
            .collect();
        let station_code = codes
            .first()
            .copied()
            .filter(|first| codes.iter().all(|c| c == first));

        Ok(Self {
            station_code,
            tbs,
            tbh,
            tr,
            vv,
        })
    }

    pub fn entry(&self, role: ThermalRole) -> &CatalogEntry {
        match role {
            ThermalRole::DryBulb => &self.tbs,
            ThermalRole::WetBulb => &self.tbh,
            ThermalRole::DewPoint => &self.tr,
            ThermalRole::WindSpeed => &self.vv,
        }
    }

    /// Parse the four files and run the calculator on them.
    pub fn compute(&self, reader: &SeriesReader) -> Result<ThermalIndexTable> {
        let tbs = read_entry(reader, &self.tbs)?;
        let tbh = read_entry(reader, &self.tbh)?;
        let tr = read_entry(reader, &self.tr)?;
        let vv = read_entry(reader, &self.vv)?;

        ThermalIndexCalculator::new().compute(&tbs, &tbh, &tr, &vv)
    }
}

fn entry_for_path(path: &Path) -> Result<CatalogEntry> {
    let file_name = path
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .ok_or_else(|| ProcessingError::MissingData(format!("{} is not a file", path.display())))?;
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let key = StationFileKey::from_stem(&stem).map_err(|source| ProcessingError::InvalidFileName {
        file_name: file_name.clone(),
        source,
    })?;

    Ok(CatalogEntry {
        file_name,
        path: path.to_path_buf(),
        key: Ok(key),
    })
}

fn read_entry(reader: &SeriesReader, entry: &CatalogEntry) -> Result<ParsedSeries> {
    let key = entry
        .key
        .as_ref()
        .map_err(|e| ProcessingError::InvalidFileName {
            file_name: entry.file_name.clone(),
            source: e.clone(),
        })?;
    reader.read_series(&entry.path, key)
}

/// Finds the Tbs/Tbh/Tr/Vv files of one station by matching glossary
/// parameter names against the catalog.
pub struct ThermalRoleResolver<'a> {
    tables: &'a ReferenceTables,
}

impl<'a> ThermalRoleResolver<'a> {
    pub fn new(tables: &'a ReferenceTables) -> Self {
        Self { tables }
    }

    /// Glossary tags describing `role`, in glossary order.
    pub fn tags_for(&self, role: ThermalRole) -> Vec<&'a str> {
        self.tables
            .variables()
            .filter(|v| role.matches(v))
            .map(|v| v.tag.as_str())
            .collect()
    }

    /// Select the four inputs for `station`, or for the first station
    /// (by code) whose files cover every role.
    pub fn resolve(&self, catalog: &FileCatalog, station: Option<u64>) -> Result<ThermalInputs> {
        let role_tags: Vec<(ThermalRole, Vec<&str>)> = ThermalRole::ALL
            .iter()
            .map(|role| (*role, self.tags_for(*role)))
            .collect();

        for (role, tags) in &role_tags {
            if tags.is_empty() {
                return Err(ProcessingError::MissingData(format!(
                    "no glossary variable describes {}",
                    role
                )));
            }
            debug!("{} candidates: {:?}", role, tags);
        }

        let candidates = match station {
            Some(code) => vec![code],
            None => catalog.station_codes(),
        };

        for code in &candidates {
            let found: Vec<Option<&CatalogEntry>> = role_tags
                .iter()
                .map(|(_, tags)| tags.iter().find_map(|tag| catalog.find(tag, *code)))
                .collect();

            if let [Some(tbs), Some(tbh), Some(tr), Some(vv)] = found.as_slice() {
                info!(
                    "Station {}: Tbs={}, Tbh={}, Tr={}, Vv={}",
                    code, tbs.file_name, tbh.file_name, tr.file_name, vv.file_name
                );
                return Ok(ThermalInputs {
                    station_code: Some(*code),
                    tbs: (*tbs).clone(),
                    tbh: (*tbh).clone(),
                    tr: (*tr).clone(),
                    vv: (*vv).clone(),
                });
            }

            let missing: Vec<&str> = role_tags
                .iter()
                .zip(&found)
                .filter(|(_, entry)| entry.is_none())
                .map(|((role, _), _)| role.column())
                .collect();
            debug!("Station {} lacks {}", code, missing.join(", "));

            if station.is_some() {
                return Err(ProcessingError::MissingData(format!(
                    "station {} has no data file for {}",
                    code,
                    missing.join(", ")
                )));
            }
        }

        Err(ProcessingError::MissingData(
            "no station has data files for Tbs, Tbh, Tr and Vv".to_string(),
        ))
    }
}
