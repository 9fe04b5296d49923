use crate::models::StationFileKey;
use serde::Serialize;

/// Mean of one calendar period; `mean` is `None` when the period has no
/// observations, so charts keep every slot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodMean {
    pub label: String,
    pub mean: Option<f64>,
    pub count: usize,
}

impl PeriodMean {
    pub fn new(label: impl Into<String>, sum: f64, count: usize) -> Self {
        Self {
            label: label.into(),
            mean: (count > 0).then(|| sum / count as f64),
            count,
        }
    }
}

/// Monthly (January to December) and annual means of one value column.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PeriodMeans {
    pub monthly: Vec<PeriodMean>,
    pub annual: Vec<PeriodMean>,
}

impl PeriodMeans {
    pub fn summary(&self) -> String {
        let mut summary = String::from("Monthly means:\n");
        for period in &self.monthly {
            summary.push_str(&format_period(period));
        }
        summary.push_str("Annual means:\n");
        for period in &self.annual {
            summary.push_str(&format_period(period));
        }
        summary
    }
}

/// Period means of one `<tag>@<station>` series in a consolidated dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPeriodMeans {
    pub key: StationFileKey,
    pub means: PeriodMeans,
}

fn format_period(period: &PeriodMean) -> String {
    match period.mean {
        Some(mean) => format!("  {:<10} {:>10.2} ({} obs)\n", period.label, mean, period.count),
        None => format!("  {:<10} {:>10}\n", period.label, "-"),
    }
}
