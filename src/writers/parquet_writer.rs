use crate::error::{ProcessingError, Result};
use crate::models::{EnrichedRecord, ThermalIndexRow};
use crate::utils::constants::{
    COMPRESSION_GZIP, COMPRESSION_LZ4, COMPRESSION_NONE, COMPRESSION_SNAPPY, COMPRESSION_ZSTD,
    DEFAULT_ROW_GROUP_SIZE,
};
use arrow::array::*;
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::record_batch::RecordBatch;
use chrono::NaiveDateTime;
use parquet::arrow::ArrowWriter;
use parquet::basic::{Compression, GzipLevel, ZstdLevel};
use parquet::file::properties::WriterProperties;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

pub struct ParquetWriter {
    compression: Compression,
    row_group_size: usize,
}

impl ParquetWriter {
    pub fn new() -> Self {
        Self {
            compression: Compression::SNAPPY,
            row_group_size: DEFAULT_ROW_GROUP_SIZE,
        }
    }

    pub fn with_compression(mut self, compression: &str) -> Result<Self> {
        self.compression = match compression.to_lowercase().as_str() {
            COMPRESSION_SNAPPY => Compression::SNAPPY,
            COMPRESSION_GZIP => Compression::GZIP(GzipLevel::default()),
            COMPRESSION_LZ4 => Compression::LZ4,
            COMPRESSION_ZSTD => Compression::ZSTD(ZstdLevel::default()),
            COMPRESSION_NONE => Compression::UNCOMPRESSED,
            _ => {
                return Err(ProcessingError::Config(format!(
                    "Unsupported compression: {}",
                    compression
                )))
            }
        };
        Ok(self)
    }

    pub fn with_row_group_size(mut self, size: usize) -> Self {
        self.row_group_size = size.max(1);
        self
    }

    /// Write the consolidated dataset, one row group per `row_group_size` records.
    pub fn write_dataset(&self, records: &[EnrichedRecord], path: &Path) -> Result<()> {
        let schema = Self::dataset_schema();
        self.write_batches(records, path, schema, Self::dataset_batch)?;
        info!("Wrote {} consolidated rows to {}", records.len(), path.display());
        Ok(())
    }

    pub fn write_thermal(&self, rows: &[ThermalIndexRow], path: &Path) -> Result<()> {
        let schema = Self::thermal_schema();
        self.write_batches(rows, path, schema, Self::thermal_batch)?;
        info!("Wrote {} thermal index rows to {}", rows.len(), path.display());
        Ok(())
    }

    fn write_batches<T>(
        &self,
        rows: &[T],
        path: &Path,
        schema: Arc<Schema>,
        to_batch: fn(&[T], Arc<Schema>) -> Result<RecordBatch>,
    ) -> Result<()> {
        let file = File::create(path)?;
        let props = WriterProperties::builder()
            .set_compression(self.compression)
            .set_max_row_group_size(self.row_group_size)
            .build();

        let mut writer = ArrowWriter::try_new(file, schema.clone(), Some(props))?;

        for chunk in rows.chunks(self.row_group_size) {
            let batch = to_batch(chunk, schema.clone())?;
            writer.write(&batch)?;
        }

        writer.close()?;
        Ok(())
    }

    fn timestamp_field() -> Field {
        Field::new(
            "timestamp",
            DataType::Timestamp(TimeUnit::Second, None),
            false,
        )
    }

    fn dataset_schema() -> Arc<Schema> {
        let fields = vec![
            Self::timestamp_field(),
            Field::new("value", DataType::Float64, false),
            Field::new("source_file", DataType::Utf8, false),
            Field::new("variable_tag", DataType::Utf8, false),
            Field::new("station_code", DataType::UInt64, false),
            Field::new("parameter", DataType::Utf8, true),
            Field::new("unit", DataType::Utf8, true),
            Field::new("description", DataType::Utf8, true),
            Field::new("station_name", DataType::Utf8, true),
            Field::new("category", DataType::Utf8, true),
            Field::new("department", DataType::Utf8, true),
            Field::new("municipality", DataType::Utf8, true),
            Field::new("latitude", DataType::Float64, true),
            Field::new("longitude", DataType::Float64, true),
            Field::new("elevation", DataType::Float64, true),
        ];

        Arc::new(Schema::new(fields))
    }

    fn dataset_batch(records: &[EnrichedRecord], schema: Arc<Schema>) -> Result<RecordBatch> {
        let timestamps: Vec<i64> = records.iter().map(|r| epoch_seconds(r.timestamp)).collect();
        let values: Vec<f64> = records.iter().map(|r| r.value).collect();
        let source_files: Vec<&str> = records.iter().map(|r| &*r.source_file).collect();
        let tags: Vec<&str> = records.iter().map(|r| &*r.variable_tag).collect();
        let codes: Vec<u64> = records.iter().map(|r| r.station_code).collect();

        let parameters: Vec<Option<&str>> = records.iter().map(|r| r.parameter()).collect();
        let units: Vec<Option<&str>> = records.iter().map(|r| r.unit()).collect();
        let descriptions: Vec<Option<&str>> = records
            .iter()
            .map(|r| r.variable.as_ref().and_then(|v| v.description.as_deref()))
            .collect();
        let station_names: Vec<Option<&str>> = records.iter().map(|r| r.station_name()).collect();
        let categories: Vec<Option<&str>> = records
            .iter()
            .map(|r| r.station.as_ref().and_then(|s| s.category.as_deref()))
            .collect();
        let departments: Vec<Option<&str>> = records.iter().map(|r| r.department()).collect();
        let municipalities: Vec<Option<&str>> = records.iter().map(|r| r.municipality()).collect();
        let latitudes: Vec<Option<f64>> = records
            .iter()
            .map(|r| r.station.as_ref().and_then(|s| s.latitude))
            .collect();
        let longitudes: Vec<Option<f64>> = records
            .iter()
            .map(|r| r.station.as_ref().and_then(|s| s.longitude))
            .collect();
        let elevations: Vec<Option<f64>> = records
            .iter()
            .map(|r| r.station.as_ref().and_then(|s| s.elevation))
            .collect();

        let columns: Vec<ArrayRef> = vec![
            Arc::new(TimestampSecondArray::from(timestamps)),
            Arc::new(Float64Array::from(values)),
            Arc::new(StringArray::from(source_files)),
            Arc::new(StringArray::from(tags)),
            Arc::new(UInt64Array::from(codes)),
            Arc::new(StringArray::from(parameters)),
            Arc::new(StringArray::from(units)),
            Arc::new(StringArray::from(descriptions)),
            Arc::new(StringArray::from(station_names)),
            Arc::new(StringArray::from(categories)),
            Arc::new(StringArray::from(departments)),
            Arc::new(StringArray::from(municipalities)),
            Arc::new(Float64Array::from(latitudes)),
            Arc::new(Float64Array::from(longitudes)),
            Arc::new(Float64Array::from(elevations)),
        ];

        Ok(RecordBatch::try_new(schema, columns)?)
    }

    fn thermal_schema() -> Arc<Schema> {
        let mut fields = vec![Self::timestamp_field()];
        fields.extend(
            ThermalIndexRow::COLUMNS
                .iter()
                .map(|name| Field::new(*name, DataType::Float64, false)),
        );
        Arc::new(Schema::new(fields))
    }

    fn thermal_batch(rows: &[ThermalIndexRow], schema: Arc<Schema>) -> Result<RecordBatch> {
        let timestamps: Vec<i64> = rows.iter().map(|r| epoch_seconds(r.timestamp)).collect();

        let mut columns: Vec<ArrayRef> = vec![Arc::new(TimestampSecondArray::from(timestamps))];
        for name in ThermalIndexRow::COLUMNS {
            let values: Vec<f64> = rows
                .iter()
                .map(|r| r.value(name).unwrap_or(f64::NAN))
                .collect();
            columns.push(Arc::new(Float64Array::from(values)));
        }

        Ok(RecordBatch::try_new(schema, columns)?)
    }

    /// Get file statistics
    pub fn get_file_info(&self, path: &Path) -> Result<ParquetFileInfo> {
        use parquet::file::reader::{FileReader, SerializedFileReader};

        let file = File::open(path)?;
        let reader = SerializedFileReader::new(file)?;
        let metadata = reader.metadata();

        let file_metadata = metadata.file_metadata();
        let row_groups = metadata.num_row_groups();
        let total_rows = file_metadata.num_rows();
        let file_size = std::fs::metadata(path)?.len();

        let row_group_sizes = (0..row_groups)
            .map(|i| metadata.row_group(i).num_rows())
            .collect();

        Ok(ParquetFileInfo {
            total_rows,
            row_groups: row_groups as i32,
            row_group_sizes,
            file_size,
            compression: self.compression,
        })
    }
}

impl Default for ParquetWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Naive timestamps are written as-is, without a zone.
fn epoch_seconds(timestamp: NaiveDateTime) -> i64 {
    timestamp.and_utc().timestamp()
}

#[derive(Debug)]
pub struct ParquetFileInfo {
    pub total_rows: i64,
    pub row_groups: i32,
    pub row_group_sizes: Vec<i64>,
    pub file_size: u64,
    pub compression: Compression,
}

impl ParquetFileInfo {
    pub fn summary(&self) -> String {
        let avg_rows = if self.row_groups > 0 {
            self.total_rows as f64 / self.row_groups as f64
        } else {
            0.0
        };
        format!(
            "Parquet File Summary:\n\
            - Total rows: {}\n\
            - Row groups: {}\n\
            - File size: {:.2} MB\n\
            - Compression: {:?}\n\
            - Avg rows per group: {:.0}",
            self.total_rows,
            self.row_groups,
            self.file_size as f64 / 1_048_576.0, // Convert to MB
            self.compression,
            avg_rows
        )
    }
}
