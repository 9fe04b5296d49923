/// Station data files
pub const DATA_FILE_EXTENSION: &str = "data";
pub const STATION_KEY_SEPARATOR: char = '@';
pub const FIELD_DELIMITER: char = '|';
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Reference table defaults
pub const DEFAULT_REFERENCE_DELIMITER: u8 = b',';

/// Processing defaults
pub const DEFAULT_ROW_GROUP_SIZE: usize = 10000;
pub const DEFAULT_BUFFER_SIZE: usize = 8192 * 16; // 128KB

/// Line errors kept per file for reporting; the rest are only counted
pub const MAX_RECORDED_LINE_ERRORS: usize = 20;

/// Parquet compression options
pub const COMPRESSION_SNAPPY: &str = "snappy";
pub const COMPRESSION_GZIP: &str = "gzip";
pub const COMPRESSION_LZ4: &str = "lz4";
pub const COMPRESSION_ZSTD: &str = "zstd";
pub const COMPRESSION_NONE: &str = "none";

/// Environment prefix for settings overrides
pub const ENV_PREFIX: &str = "CATTLE_CLIMATE";
