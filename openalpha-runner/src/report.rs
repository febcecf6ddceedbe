//! Per-alpha report artifacts.
//!
//! Layout under the report root:
//! - `{alpha}/perf.csv`: `date,return,turnover`, one row per scored date
//! - `{alpha}/summary.json`: metrics, resolved config and an option fingerprint
//!
//! Floats in `perf.csv` use the shortest representation that round-trips.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use openalpha_core::{Alpha, AlphaConfig, ParamMap};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::metrics::PerfSummary;

/// Version of the `summary.json` layout. Newer versions are rejected on load.
pub const SCHEMA_VERSION: u32 = 1;

pub const PERF_FILE: &str = "perf.csv";
pub const SUMMARY_FILE: &str = "summary.json";

/// One scored date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerfRow {
    /// Calendar date, `yyyymmdd`.
    pub date: i64,
    #[serde(rename = "return")]
    pub ret: f64,
    pub turnover: f64,
}

/// Daily performance of one alpha.
#[derive(Debug, Clone, PartialEq)]
pub struct PerfReport {
    pub alpha: String,
    pub rows: Vec<PerfRow>,
}

impl PerfReport {
    /// Collect every date with a finite return.
    pub fn from_alpha(alpha: &Alpha) -> Self {
        let calendar = alpha.calendar();
        let rows = alpha
            .daily_returns()
            .iter()
            .zip(alpha.daily_turnover())
            .enumerate()
            .filter(|(_, (ret, _))| ret.is_finite())
            .filter_map(|(d, (&ret, &turnover))| {
                calendar
                    .date_at(d)
                    .map(|date| PerfRow { date, ret, turnover })
            })
            .collect();
        Self {
            alpha: alpha.name().to_string(),
            rows,
        }
    }

    pub fn summary(&self) -> PerfSummary {
        let returns: Vec<f64> = self.rows.iter().map(|r| r.ret).collect();
        let turnover: Vec<f64> = self.rows.iter().map(|r| r.turnover).collect();
        PerfSummary::compute(&returns, &turnover)
    }

    /// Render as CSV with header `date,return,turnover`.
    pub fn to_csv(&self) -> Result<String> {
        let mut wtr = csv::Writer::from_writer(vec![]);
        wtr.write_record(["date", "return", "turnover"])?;
        for row in &self.rows {
            wtr.write_record([
                row.date.to_string(),
                row.ret.to_string(),
                row.turnover.to_string(),
            ])?;
        }
        let bytes = wtr.into_inner().context("failed to flush CSV writer")?;
        String::from_utf8(bytes).context("CSV output is not UTF-8")
    }

    /// Parse a `perf.csv` produced by [`PerfReport::to_csv`].
    pub fn from_csv(alpha: impl Into<String>, content: &str) -> Result<Self> {
        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let rows = rdr
            .deserialize()
            .collect::<Result<Vec<PerfRow>, _>>()
            .context("failed to parse perf CSV")?;
        Ok(Self {
            alpha: alpha.into(),
            rows,
        })
    }
}

/// Contents of `summary.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlphaSummary {
    pub schema_version: u32,
    pub alpha: String,
    pub generator: Option<String>,
    pub config: AlphaConfig,
    pub params: ParamMap,
    /// blake3 hex digest of the option map.
    pub fingerprint: String,
    pub first_date: Option<i64>,
    pub last_date: Option<i64>,
    pub metrics: PerfSummary,
}

impl AlphaSummary {
    pub fn new(alpha: &Alpha, report: &PerfReport) -> Result<Self> {
        Ok(Self {
            schema_version: SCHEMA_VERSION,
            alpha: alpha.name().to_string(),
            generator: alpha.params().get(openalpha_core::generator::GENERATOR_KEY).cloned(),
            config: alpha.config().clone(),
            params: alpha.params().clone(),
            fingerprint: fingerprint(alpha.params())?,
            first_date: report.rows.first().map(|r| r.date),
            last_date: report.rows.last().map(|r| r.date),
            metrics: report.summary(),
        })
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("failed to serialize alpha summary")
    }

    /// Deserialize, rejecting unknown schema versions.
    pub fn from_json(json: &str) -> Result<Self> {
        let summary: Self =
            serde_json::from_str(json).context("failed to deserialize alpha summary")?;
        if summary.schema_version > SCHEMA_VERSION {
            bail!(
                "unsupported schema version {} (max supported: {})",
                summary.schema_version,
                SCHEMA_VERSION
            );
        }
        Ok(summary)
    }
}

/// Deterministic content hash of an option map.
///
/// `ParamMap` is ordered, so equal maps always hash equally.
pub fn fingerprint(params: &ParamMap) -> Result<String> {
    let json = serde_json::to_string(params).context("failed to serialize options")?;
    Ok(blake3::hash(json.as_bytes()).to_hex().to_string())
}

/// Paths written for one alpha.
#[derive(Debug, Clone)]
pub struct WrittenReport {
    pub perf_csv: PathBuf,
    pub summary_json: PathBuf,
    pub summary: AlphaSummary,
}

/// Write `perf.csv` and `summary.json` under `{root}/{alpha}/`.
pub fn write_alpha_report(alpha: &Alpha, root: &Path) -> Result<WrittenReport> {
    let report = PerfReport::from_alpha(alpha);
    let dir = root.join(alpha.name());
    fs::create_dir_all(&dir).with_context(|| format!("failed to create {}", dir.display()))?;

    let perf_csv = dir.join(PERF_FILE);
    fs::write(&perf_csv, report.to_csv()?)
        .with_context(|| format!("failed to write {}", perf_csv.display()))?;

    let summary = AlphaSummary::new(alpha, &report)?;
    let summary_json = dir.join(SUMMARY_FILE);
    fs::write(&summary_json, summary.to_json()?)
        .with_context(|| format!("failed to write {}", summary_json.display()))?;

    info!(
        alpha = alpha.name(),
        rows = report.rows.len(),
        path = %dir.display(),
        "report written"
    );
    Ok(WrittenReport {
        perf_csv,
        summary_json,
        summary,
    })
}
