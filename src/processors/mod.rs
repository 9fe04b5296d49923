pub mod aggregator;
pub mod consolidator;
pub mod date_filter;
pub mod metadata_joiner;
pub mod thermal_index;
pub mod thermal_roles;

pub use aggregator::{TemporalAggregator, MONTH_NAMES};
pub use consolidator::{ConsolidationResult, Consolidator};
pub use date_filter::{DateRange, DateRangeFilter};
pub use metadata_joiner::{MetadataJoiner, MetadataMatch};
pub use thermal_index::{derive_row, ThermalIndexCalculator};
pub use thermal_roles::{ThermalInputs, ThermalRole, ThermalRoleResolver};
