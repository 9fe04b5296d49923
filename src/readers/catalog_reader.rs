use crate::error::Result;
use crate::models::{CatalogEntry, FileCatalog, StationFileKey};
use crate::utils::constants::DATA_FILE_EXTENSION;
use std::path::Path;
use tracing::{debug, info};

/// Turns the file names of a directory into a `FileCatalog`.
/// Only the names are inspected; file contents are never opened.
pub struct CatalogReader {
    extension: String,
}

impl CatalogReader {
    pub fn new() -> Self {
        Self {
            extension: DATA_FILE_EXTENSION.to_string(),
        }
    }

    pub fn with_extension(extension: &str) -> Self {
        Self {
            extension: extension.trim_start_matches('.').to_string(),
        }
    }

    /// Resolve an ordered list of file names located in `base_dir`.
    /// Names without the data extension are ignored; the others keep their order.
    pub fn resolve_names<I, S>(&self, base_dir: &Path, names: I) -> FileCatalog
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let suffix = format!(".{}", self.extension);
        let mut entries = Vec::new();

        for name in names {
            let name = name.as_ref();
            let Some(stem) = name.strip_suffix(&suffix) else {
                debug!("Ignoring non-data file: {}", name);
                continue;
            };

            let key = StationFileKey::from_stem(stem);
            if let Err(e) = &key {
                debug!("Rejecting file name {}: {}", name, e);
            }

            entries.push(CatalogEntry {
                file_name: name.to_string(),
                path: base_dir.join(name),
                key,
            });
        }

        FileCatalog { entries }
    }

    /// List `dir` and resolve its data files in file-name order.
    pub fn scan_directory(&self, dir: &Path) -> Result<FileCatalog> {
        let mut names = Vec::new();

        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            } else {
                debug!("Skipping non UTF-8 file name: {:?}", entry.file_name());
            }
        }

        names.sort();
        let catalog = self.resolve_names(dir, names);

        info!(
            "Catalog of {}: {} data files ({} with malformed names)",
            dir.display(),
            catalog.len(),
            catalog.rejected().count()
        );

        Ok(catalog)
    }
}

impl Default for CatalogReader {
    fn default() -> Self {
        Self::new()
    }
}
