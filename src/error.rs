use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProcessingError>;

#[derive(Error, Debug)]
pub enum ProcessingError {
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Parquet write error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configuration load error: {0}")]
    ConfigLoad(#[from] config::ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Invalid coordinate format: {0}")]
    InvalidCoordinate(String),

    #[error("Malformed file name '{file_name}': {source}")]
    InvalidFileName {
        file_name: String,
        source: NameFormatError,
    },

    #[error("Reference table {path}: {message}")]
    ReferenceTable { path: String, message: String },

    #[error("No data files found in {0}")]
    EmptyCatalog(String),

    #[error("No valid data lines in {file_name} ({total_lines} lines read)")]
    EmptySeries {
        file_name: String,
        total_lines: usize,
    },

    #[error("No overlapping timestamps: {0}")]
    AlignmentEmpty(String),

    #[error("Missing required data: {0}")]
    MissingData(String),

    #[error("Invalid data format: {0}")]
    InvalidFormat(String),
}

/// Why a file name does not decompose into `<tag>@<station code>`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NameFormatError {
    #[error("expected exactly 2 '@'-separated parts, found {0}")]
    WrongPartCount(usize),

    #[error("variable tag is empty")]
    EmptyTag,

    #[error("station code '{0}' is not a non-negative integer")]
    InvalidStationCode(String),
}

/// Why a single data line was discarded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LineFormatError {
    #[error("expected 2 '|'-separated fields, found {0}")]
    FieldCount(usize),

    #[error("invalid timestamp '{0}'")]
    Timestamp(String),

    #[error("invalid value '{0}'")]
    Value(String),

    #[error("non-finite value '{0}'")]
    NonFinite(String),
}
