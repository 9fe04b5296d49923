use crate::models::{ConsolidatedDataset, ThermalIndexTable, Timestamped};
use chrono::NaiveDate;
use tracing::debug;

/// Inclusive date bounds; a missing bound falls back to the data's own extent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    pub fn between(start: NaiveDate, end: NaiveDate) -> Self {
        Self::new(Some(start), Some(end))
    }

    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// Concrete bounds for `rows`: unspecified ends become the earliest and
    /// latest row date. `None` when `rows` is empty.
    pub fn resolve<T: Timestamped>(&self, rows: &[T]) -> Option<(NaiveDate, NaiveDate)> {
        let mut dates = rows.iter().map(|r| r.timestamp().date());
        let first = dates.next()?;
        let (min, max) = dates.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d)));
        Some((self.start.unwrap_or(min), self.end.unwrap_or(max)))
    }
}

/// Keeps rows whose date lies in a `DateRange`. Never fails; a range that
/// misses the data, or whose start is after its end, selects nothing.
pub struct DateRangeFilter {
    range: DateRange,
}

impl DateRangeFilter {
    pub fn new(range: DateRange) -> Self {
        Self { range }
    }

    pub fn apply<T: Timestamped + Clone>(&self, rows: &[T]) -> Vec<T> {
        let Some((start, end)) = self.range.resolve(rows) else {
            return Vec::new();
        };

        let kept: Vec<T> = rows
            .iter()
            .filter(|r| {
                let date = r.timestamp().date();
                start <= date && date <= end
            })
            .cloned()
            .collect();

        debug!(
            "Date filter {}..={} kept {} of {} rows",
            start,
            end,
            kept.len(),
            rows.len()
        );
        kept
    }

    pub fn apply_dataset(&self, dataset: &ConsolidatedDataset) -> ConsolidatedDataset {
        if self.range.is_unbounded() {
            return dataset.clone();
        }
        ConsolidatedDataset::new(self.apply(&dataset.records))
    }

    pub fn apply_thermal(&self, table: &ThermalIndexTable) -> ThermalIndexTable {
        ThermalIndexTable {
            rows: self.apply(&table.rows),
            sources: table.sources.clone(),
        }
    }
}
