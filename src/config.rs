//! Layered run settings: built-in defaults, an optional TOML file, then
//! `CATTLE_CLIMATE_*` environment variables. CLI flags are applied last by the caller.

use crate::error::{ProcessingError, Result};
use crate::utils::constants::{
    COMPRESSION_SNAPPY, DATA_FILE_EXTENSION, DEFAULT_ROW_GROUP_SIZE, ENV_PREFIX,
};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct Settings {
    pub data_dir: Option<PathBuf>,
    pub glossary_path: Option<PathBuf>,
    pub stations_path: Option<PathBuf>,

    #[validate(length(min = 1))]
    pub data_extension: String,

    #[validate(length(equal = 1))]
    pub reference_delimiter: String,

    #[validate(range(min = 1))]
    pub max_workers: usize,

    pub use_mmap: bool,

    pub compression: String,

    #[validate(range(min = 1))]
    pub row_group_size: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: None,
            glossary_path: None,
            stations_path: None,
            data_extension: DATA_FILE_EXTENSION.to_string(),
            reference_delimiter: ",".to_string(),
            max_workers: num_cpus::get(),
            use_mmap: false,
            compression: COMPRESSION_SNAPPY.to_string(),
            row_group_size: DEFAULT_ROW_GROUP_SIZE,
        }
    }
}

impl Settings {
    /// Load settings from defaults, `config_file` (if given) and the environment.
    pub fn load(config_file: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(path) = config_file {
            builder = builder.add_source(File::from(path).required(true));
        }

        builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true));

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Delimiter byte for the reference tables.
    pub fn reference_delimiter_byte(&self) -> Result<u8> {
        match self.reference_delimiter.as_bytes() {
            [b] if b.is_ascii() => Ok(*b),
            _ => Err(ProcessingError::Config(format!(
                "reference_delimiter must be a single ASCII character, got '{}'",
                self.reference_delimiter
            ))),
        }
    }

    pub fn require_data_dir(&self) -> Result<&Path> {
        self.data_dir
            .as_deref()
            .ok_or_else(|| ProcessingError::Config("data_dir is not set".to_string()))
    }
}
