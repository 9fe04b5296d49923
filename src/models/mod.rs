pub mod catalog;
pub mod enriched;
pub mod outcome;
pub mod period;
pub mod reference;
pub mod series;
pub mod station;
pub mod thermal;
pub mod variable;

pub use catalog::{CatalogEntry, FileCatalog, StationFileKey};
pub use enriched::{ConsolidatedDataset, DatasetSelection, EnrichedRecord};
pub use outcome::{FileOutcome, OutcomeStatus};
pub use period::{PeriodMean, PeriodMeans, SeriesPeriodMeans};
pub use reference::ReferenceTables;
pub use series::{
    LineError, ParsedSeries, SeriesProvenance, SeriesSummary, TimeSeriesRecord, Timestamped,
};
pub use station::StationMetadata;
pub use thermal::{ThermalIndexRow, ThermalIndexTable, ThermalSources};
pub use variable::VariableMetadata;
