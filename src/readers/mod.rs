pub mod catalog_reader;
pub mod reference_reader;
pub mod series_reader;

pub use catalog_reader::CatalogReader;
pub use reference_reader::{decode_reference_bytes, ReferenceReader};
pub use series_reader::{parse_data_line, SeriesReader};
