//! Run artifacts: CSV tables and the JSON summary.
//!
//! A run directory holds:
//! - `records.csv` — one end-of-day ledger row per simulated day
//! - `broker_updates.csv` — one row per session
//! - `summary.json` — the `RunSummary`

use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::investor::Session;
use crate::ledger::{LedgerRecord, SessionUpdate};
use crate::runner::{RunResult, RunSummary, SCHEMA_VERSION};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("CSV export failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON export failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported summary schema version {found}")]
    SchemaVersion { found: u32 },
}

/// Paths written by `save_artifacts`.
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactPaths {
    pub dir: PathBuf,
    pub records_csv: PathBuf,
    pub broker_updates_csv: PathBuf,
    pub summary_json: PathBuf,
}

#[derive(Serialize)]
struct BrokerUpdateRow {
    date: chrono::NaiveDate,
    session: Session,
    money_to_invest: f64,
    invested_money: f64,
    non_invested_money: f64,
}

/// Ledger records as CSV text.
pub fn export_records_csv(records: &[LedgerRecord]) -> Result<String, ExportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    for record in records {
        wtr.serialize(record)?;
    }
    into_string(wtr)
}

/// Broker updates as CSV text, one row per session.
pub fn export_broker_updates_csv(updates: &[SessionUpdate]) -> Result<String, ExportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    for SessionUpdate { session, update } in updates {
        wtr.serialize(BrokerUpdateRow {
            date: update.date,
            session: *session,
            money_to_invest: update.money_to_invest,
            invested_money: update.invested_money,
            non_invested_money: update.non_invested_money,
        })?;
    }
    into_string(wtr)
}

fn into_string(wtr: csv::Writer<Vec<u8>>) -> Result<String, ExportError> {
    let bytes = wtr
        .into_inner()
        .map_err(|e| ExportError::Csv(csv::Error::from(e.into_error())))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

pub fn export_summary_json(summary: &RunSummary) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(summary)?)
}

/// Parse a summary, rejecting unknown schema versions.
pub fn import_summary_json(json: &str) -> Result<RunSummary, ExportError> {
    let summary: RunSummary = serde_json::from_str(json)?;
    if summary.schema_version != SCHEMA_VERSION {
        return Err(ExportError::SchemaVersion {
            found: summary.schema_version,
        });
    }
    Ok(summary)
}

fn write(path: &Path, contents: &str) -> Result<(), ExportError> {
    std::fs::write(path, contents).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Write all artifacts of `result` into `output_dir/<run id prefix>`.
pub fn save_artifacts(result: &RunResult, output_dir: &Path) -> Result<ArtifactPaths, ExportError> {
    let run_id = &result.summary.run_id;
    let dirname = run_id.get(..16).unwrap_or(run_id);
    let dir = output_dir.join(dirname);
    std::fs::create_dir_all(&dir).map_err(|source| ExportError::Io {
        path: dir.clone(),
        source,
    })?;

    let paths = ArtifactPaths {
        records_csv: dir.join("records.csv"),
        broker_updates_csv: dir.join("broker_updates.csv"),
        summary_json: dir.join("summary.json"),
        dir,
    };
    write(&paths.records_csv, &export_records_csv(&result.report.records)?)?;
    write(
        &paths.broker_updates_csv,
        &export_broker_updates_csv(&result.report.broker_updates)?,
    )?;
    write(&paths.summary_json, &export_summary_json(&result.summary)?)?;

    tracing::info!("artifacts written to {}", paths.dir.display());
    Ok(paths)
}

/// Load the summary of a saved run.
pub fn load_summary(dir: &Path) -> Result<RunSummary, ExportError> {
    let path = dir.join("summary.json");
    let json = std::fs::read_to_string(&path).map_err(|source| ExportError::Io { path, source })?;
    import_summary_json(&json)
}
