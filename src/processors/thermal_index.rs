use crate::error::{ProcessingError, Result};
use crate::models::{ParsedSeries, ThermalIndexRow, ThermalIndexTable, ThermalSources};
use chrono::NaiveDateTime;
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Stefan-Boltzmann constant, W m⁻² K⁻⁴
const STEFAN_BOLTZMANN: f64 = 5.67e-8;

/// Temperature-humidity index.
pub fn ith(tbs: f64, tbh: f64) -> f64 {
    0.72 * (tbs + tbh) + 40.6
}

/// Globe temperature estimated from the dry-bulb temperature.
pub fn tgn(tbs: f64) -> f64 {
    0.0162 * tbs * tbs + 0.8562 * tbs - 0.9387
}

/// Globe-temperature-humidity index.
pub fn itgh(tgn: f64, tr: f64) -> f64 {
    tgn + 0.36 * tr + 41.5
}

/// Radiant thermal load.
///
/// The square root argument is negative whenever `tgn < tbs` (dry bulb roughly
/// between -4.4 and 13.2 °C) or `vv < 0`; the result is then NaN.
pub fn ctr(vv: f64, tgn: f64, tbs: f64) -> f64 {
    let convective = 100.0 * (2.51 * vv.powf(0.5) * (tgn - tbs)).sqrt();
    let radiant = (tgn / 100.0).powi(44);
    STEFAN_BOLTZMANN * (convective + radiant).powi(4)
}

fn finite_or_nan(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        f64::NAN
    }
}

/// Compute all derived columns for one aligned timestamp.
/// Non-finite results are stored as NaN; they only affect this row.
pub fn derive_row(timestamp: NaiveDateTime, tbs: f64, tbh: f64, tr: f64, vv: f64) -> ThermalIndexRow {
    let tgn_value = finite_or_nan(tgn(tbs));

    ThermalIndexRow {
        timestamp,
        tbs,
        tbh,
        tr,
        vv,
        tgn: tgn_value,
        ith: finite_or_nan(ith(tbs, tbh)),
        itgh: finite_or_nan(itgh(tgn_value, tr)),
        ctr: finite_or_nan(ctr(vv, tgn_value, tbs)),
    }
}

/// Aligns the Tbs, Tbh, Tr and Vv series on their shared timestamps and
/// derives ITH, ITGH and CTR for every aligned row.
pub struct ThermalIndexCalculator;

impl ThermalIndexCalculator {
    pub fn new() -> Self {
        Self
    }

    pub fn compute(
        &self,
        tbs: &ParsedSeries,
        tbh: &ParsedSeries,
        tr: &ParsedSeries,
        vv: &ParsedSeries,
    ) -> Result<ThermalIndexTable> {
        let inputs = [("Tbs", tbs), ("Tbh", tbh), ("Tr", tr), ("Vv", vv)];

        for (role, series) in &inputs {
            if series.is_empty() {
                return Err(ProcessingError::AlignmentEmpty(format!(
                    "{} series {} has no valid observations",
                    role, series.provenance.source_file
                )));
            }
        }

        let tbh_index = index_by_timestamp(tbh);
        let tr_index = index_by_timestamp(tr);
        let vv_index = index_by_timestamp(vv);

        let rows: Vec<ThermalIndexRow> = index_by_timestamp(tbs)
            .into_iter()
            .filter_map(|(timestamp, tbs_value)| {
                let tbh_value = tbh_index.get(&timestamp)?;
                let tr_value = tr_index.get(&timestamp)?;
                let vv_value = vv_index.get(&timestamp)?;
                Some(derive_row(timestamp, tbs_value, *tbh_value, *tr_value, *vv_value))
            })
            .collect();

        if rows.is_empty() {
            return Err(ProcessingError::AlignmentEmpty(format!(
                "{}, {}, {} and {} share no timestamp",
                tbs.provenance.source_file,
                tbh.provenance.source_file,
                tr.provenance.source_file,
                vv.provenance.source_file
            )));
        }

        let table = ThermalIndexTable {
            rows,
            sources: ThermalSources {
                tbs: tbs.provenance.source_file.clone(),
                tbh: tbh.provenance.source_file.clone(),
                tr: tr.provenance.source_file.clone(),
                vv: vv.provenance.source_file.clone(),
            },
        };

        info!("Computed thermal indices for {} aligned timestamps", table.len());
        let invalid = table.invalid_rows();
        if invalid > 0 {
            warn!("{} rows have non-finite derived indices", invalid);
        }

        Ok(table)
    }
}

impl Default for ThermalIndexCalculator {
    fn default() -> Self {
        Self::new()
    }
}

/// Timestamp-ordered values of a series; the first value wins on duplicates.
fn index_by_timestamp(series: &ParsedSeries) -> BTreeMap<NaiveDateTime, f64> {
    let mut index = BTreeMap::new();
    for record in &series.records {
        index.entry(record.timestamp).or_insert(record.value);
    }
    index
}
