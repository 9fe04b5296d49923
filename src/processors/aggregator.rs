use crate::models::{ConsolidatedDataset, PeriodMean, PeriodMeans, SeriesPeriodMeans};
use chrono::{Datelike, NaiveDateTime};
use std::collections::BTreeMap;
use tracing::debug;

pub const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Calendar means over `(timestamp, value)` points. Non-finite values are ignored.
pub struct TemporalAggregator;

impl TemporalAggregator {
    pub fn new() -> Self {
        Self
    }

    /// Twelve entries, January first, whatever the input order.
    pub fn monthly_means<I>(&self, points: I) -> Vec<PeriodMean>
    where
        I: IntoIterator<Item = (NaiveDateTime, f64)>,
    {
        let mut sums = [(0.0_f64, 0_usize); 12];

        for (timestamp, value) in points {
            if !value.is_finite() {
                continue;
            }
            let slot = &mut sums[timestamp.month0() as usize];
            slot.0 += value;
            slot.1 += 1;
        }

        MONTH_NAMES
            .iter()
            .zip(sums)
            .map(|(name, (sum, count))| PeriodMean::new(*name, sum, count))
            .collect()
    }

    /// One entry per year from the first to the last observed year; years
    /// without observations in between keep an absent mean.
    pub fn annual_means<I>(&self, points: I) -> Vec<PeriodMean>
    where
        I: IntoIterator<Item = (NaiveDateTime, f64)>,
    {
        let mut sums: BTreeMap<i32, (f64, usize)> = BTreeMap::new();

        for (timestamp, value) in points {
            if !value.is_finite() {
                continue;
            }
            let slot = sums.entry(timestamp.year()).or_insert((0.0, 0));
            slot.0 += value;
            slot.1 += 1;
        }

        let (Some(first), Some(last)) = (
            sums.keys().next().copied(),
            sums.keys().next_back().copied(),
        ) else {
            return Vec::new();
        };

        (first..=last)
            .map(|year| {
                let (sum, count) = sums.get(&year).copied().unwrap_or((0.0, 0));
                PeriodMean::new(year.to_string(), sum, count)
            })
            .collect()
    }

    pub fn aggregate<I>(&self, points: I) -> PeriodMeans
    where
        I: IntoIterator<Item = (NaiveDateTime, f64)>,
    {
        let points: Vec<(NaiveDateTime, f64)> = points.into_iter().collect();
        debug!("Aggregating {} points", points.len());

        PeriodMeans {
            monthly: self.monthly_means(points.iter().copied()),
            annual: self.annual_means(points),
        }
    }

    /// One set of means per `<tag>@<station>` series, so that different
    /// variables are never averaged together.
    pub fn aggregate_series(&self, dataset: &ConsolidatedDataset) -> Vec<SeriesPeriodMeans> {
        dataset
            .series_points()
            .into_iter()
            .map(|(key, points)| SeriesPeriodMeans {
                key,
                means: self.aggregate(points),
            })
            .collect()
    }
}

impl Default for TemporalAggregator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn point(year: i32, month: u32, day: u32, value: f64) -> (NaiveDateTime, f64) {
        (
            NaiveDate::from_ymd_opt(year, month, day)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
            value,
        )
    }

    #[test]
    fn test_monthly_calendar_order() {
        let points = vec![
            point(2020, 12, 1, 10.0),
            point(2020, 3, 5, 20.0),
            point(2021, 3, 9, 30.0),
            point(2020, 1, 2, 5.0),
        ];
        let monthly = TemporalAggregator::new().monthly_means(points);

        let labels: Vec<&str> = monthly.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, MONTH_NAMES.to_vec());

        assert_eq!(monthly[0].mean, Some(5.0));
        assert_eq!(monthly[1].mean, None);
        assert_eq!(monthly[1].count, 0);
        assert_eq!(monthly[2].mean, Some(25.0));
        assert_eq!(monthly[2].count, 2);
        assert_eq!(monthly[11].mean, Some(10.0));
    }

    #[test]
    fn test_annual_fills_gaps() {
        let points = vec![
            point(2022, 5, 1, 4.0),
            point(2019, 5, 1, 1.0),
            point(2019, 6, 1, 3.0),
        ];
        let annual = TemporalAggregator::new().annual_means(points);

        let summary: Vec<(&str, Option<f64>)> =
            annual.iter().map(|p| (p.label.as_str(), p.mean)).collect();
        assert_eq!(
            summary,
            vec![
                ("2019", Some(2.0)),
                ("2020", None),
                ("2021", None),
                ("2022", Some(4.0)),
            ]
        );
    }

    #[test]
    fn test_non_finite_values_skipped() {
        let points = vec![point(2020, 7, 1, f64::NAN), point(2020, 7, 2, 6.0)];
        let means = TemporalAggregator::new().aggregate(points);
        assert_eq!(means.monthly[6].mean, Some(6.0));
        assert_eq!(means.monthly[6].count, 1);
        assert_eq!(means.annual.len(), 1);
    }

    #[test]
    fn test_series_aggregated_separately() {
        use crate::models::{EnrichedRecord, StationFileKey};
        use std::sync::Arc;

        let record = |tag: &str, value: f64| {
            let (timestamp, value) = point(2020, 1, 1, value);
            EnrichedRecord {
                timestamp,
                value,
                source_file: Arc::from(format!("{}@1.data", tag)),
                variable_tag: Arc::from(tag),
                station_code: 1,
                variable: None,
                station: None,
            }
        };
        let dataset = ConsolidatedDataset::new(vec![record("TBS", 30.0), record("VV", 2.0)]);

        let grouped = TemporalAggregator::new().aggregate_series(&dataset);
        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[0].key, StationFileKey::new("TBS", 1));
        assert_eq!(grouped[0].means.monthly[0].mean, Some(30.0));
        assert_eq!(grouped[1].key, StationFileKey::new("VV", 1));
        assert_eq!(grouped[1].means.annual[0].mean, Some(2.0));
    }

    #[test]
    fn test_empty_input() {
        let means = TemporalAggregator::new().aggregate(Vec::new());
        assert_eq!(means.monthly.len(), 12);
        assert!(means.monthly.iter().all(|p| p.count == 0 && p.mean.is_none()));
        assert!(means.annual.is_empty());
    }
}
