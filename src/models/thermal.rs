use chrono::NaiveDateTime;
use serde::Serialize;

use crate::models::series::serialize_timestamp;
use crate::models::Timestamped;

/// One aligned timestamp with the four inputs and the derived indices.
/// Derived values that are not finite are stored as NaN.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ThermalIndexRow {
    #[serde(serialize_with = "serialize_timestamp")]
    pub timestamp: NaiveDateTime,
    #[serde(rename = "Tbs")]
    pub tbs: f64,
    #[serde(rename = "Tbh")]
    pub tbh: f64,
    #[serde(rename = "Tr")]
    pub tr: f64,
    #[serde(rename = "Vv")]
    pub vv: f64,
    #[serde(rename = "Tgn")]
    pub tgn: f64,
    #[serde(rename = "ITH")]
    pub ith: f64,
    #[serde(rename = "ITGH")]
    pub itgh: f64,
    #[serde(rename = "CTR")]
    pub ctr: f64,
}

impl ThermalIndexRow {
    pub const COLUMNS: [&'static str; 8] = ["Tbs", "Tbh", "Tr", "Vv", "Tgn", "ITH", "ITGH", "CTR"];

    pub fn value(&self, column: &str) -> Option<f64> {
        match column {
            "Tbs" => Some(self.tbs),
            "Tbh" => Some(self.tbh),
            "Tr" => Some(self.tr),
            "Vv" => Some(self.vv),
            "Tgn" => Some(self.tgn),
            "ITH" => Some(self.ith),
            "ITGH" => Some(self.itgh),
            "CTR" => Some(self.ctr),
            _ => None,
        }
    }

    /// True when every derived index is a finite number.
    pub fn is_valid(&self) -> bool {
        [self.tgn, self.ith, self.itgh, self.ctr]
            .iter()
            .all(|v| v.is_finite())
    }
}

impl Timestamped for ThermalIndexRow {
    fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }
}

/// Files the four input roles were read from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ThermalSources {
    pub tbs: String,
    pub tbh: String,
    pub tr: String,
    pub vv: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThermalIndexTable {
    /// Ordered by timestamp
    pub rows: Vec<ThermalIndexRow>,
    pub sources: ThermalSources,
}

impl ThermalIndexTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn invalid_rows(&self) -> usize {
        self.rows.iter().filter(|r| !r.is_valid()).count()
    }

    /// `(timestamp, value)` pairs of one column, by name (`ITH`, `ITGH`, `CTR`, `Tgn`, ...).
    pub fn column(&self, name: &str) -> Option<Vec<(NaiveDateTime, f64)>> {
        if !ThermalIndexRow::COLUMNS.contains(&name) {
            return None;
        }
        Some(
            self.rows
                .iter()
                .filter_map(|r| r.value(name).map(|v| (r.timestamp, v)))
                .collect(),
        )
    }

    pub fn summary(&self) -> String {
        format!(
            "Thermal Index Table:\n\
            - Rows: {}\n\
            - Rows with invalid indices: {}\n\
            - Sources: Tbs={}, Tbh={}, Tr={}, Vv={}",
            self.len(),
            self.invalid_rows(),
            self.sources.tbs,
            self.sources.tbh,
            self.sources.tr,
            self.sources.vv
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn row(hour: u32, ith: f64, ctr: f64) -> ThermalIndexRow {
        ThermalIndexRow {
            timestamp: NaiveDate::from_ymd_opt(2020, 1, 1)
                .unwrap()
                .and_hms_opt(hour, 0, 0)
                .unwrap(),
            tbs: 30.0,
            tbh: 22.0,
            tr: 20.0,
            vv: 4.0,
            tgn: 39.3,
            ith,
            itgh: 88.0,
            ctr,
        }
    }

    #[test]
    fn test_column_by_name() {
        let table = ThermalIndexTable {
            rows: vec![row(0, 77.0, 500.0), row(1, 78.5, f64::NAN)],
            sources: ThermalSources::default(),
        };

        let ith = table.column("ITH").unwrap();
        assert_eq!(ith.iter().map(|(_, v)| *v).collect::<Vec<_>>(), vec![77.0, 78.5]);
        assert_eq!(ith[1].0, table.rows[1].timestamp);

        let ctr = table.column("CTR").unwrap();
        assert!(ctr[1].1.is_nan());
        assert_eq!(table.invalid_rows(), 1);

        assert!(table.column("ith").is_none());
    }
}
