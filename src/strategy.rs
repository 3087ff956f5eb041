//! Decoding the scoring response into renderable tables, and the download
//! artifact built from them.
//!
//! This is the workflow's error boundary: every fault between "status 200"
//! and "three decoded tables" funnels into `StrategyError`, so callers render
//! a message instead of aborting the session. Partial results never escape; a
//! bundle exists only when all three tables decoded.

use crate::client::ScoringResponse;
use crate::table::{Table, TableError};
use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StrategyError {
    #[error("response body is not the expected JSON envelope: {0}")]
    Envelope(#[from] serde_json::Error),
    #[error("`{key}` payload is not a table: {source}")]
    Payload {
        key: &'static str,
        source: TableError,
    },
}

/// The three tabular payloads a successful scoring response must carry.
#[derive(Deserialize)]
struct ResponseEnvelope {
    lead_strategy: Value,
    expected_value: Value,
    thresh_optim_table: Value,
}

#[derive(Debug, Clone)]
pub struct StrategyBundle {
    /// Per-lead decision output, ranked by the service.
    pub lead_strategy: Table,
    /// Aggregate summary of projected outcomes.
    pub expected_value: Table,
    /// Threshold sweep used for the optimization plot.
    pub thresh_optim: Table,
}

/// Outcome of one Run Analysis press, branched strictly on status code.
#[derive(Debug)]
pub enum RunOutcome {
    Strategy(StrategyBundle),
    HttpFailure { status: u16, body: String },
    DecodeFailure { message: String },
}

pub fn decode_strategy(body: &str) -> Result<StrategyBundle, StrategyError> {
    let envelope: ResponseEnvelope = serde_json::from_str(body)?;
    Ok(StrategyBundle {
        lead_strategy: decode_table("lead_strategy", &envelope.lead_strategy)?,
        expected_value: decode_table("expected_value", &envelope.expected_value)?,
        thresh_optim: decode_table("thresh_optim_table", &envelope.thresh_optim_table)?,
    })
}

/// A payload is usually a JSON-encoded string (dataframe serialization), but
/// an inline array or map decodes too.
fn decode_table(key: &'static str, payload: &Value) -> Result<Table, StrategyError> {
    let decoded = match payload {
        Value::String(raw) => Table::from_payload_str(raw),
        other => Table::from_payload_value(other.clone()),
    };
    decoded.map_err(|source| StrategyError::Payload { key, source })
}

pub fn outcome_from_response(response: &ScoringResponse) -> RunOutcome {
    if response.status == 200 {
        match decode_strategy(&response.body) {
            Ok(bundle) => RunOutcome::Strategy(bundle),
            Err(err) => {
                tracing::warn!(error = %err, "scoring response failed to decode");
                RunOutcome::DecodeFailure {
                    message: err.to_string(),
                }
            }
        }
    } else {
        RunOutcome::HttpFailure {
            status: response.status,
            body: response.body.clone(),
        }
    }
}

/// File name for the downloadable strategy artifact; the tag keeps the two
/// source modes' downloads apart.
pub fn download_file_name(tag: &str) -> String {
    format!("lead_strategy_{tag}.csv")
}

/// Write the full lead strategy as CSV into `dir`, returning the path.
pub fn write_strategy_csv(strategy: &Table, tag: &str, dir: &Path) -> Result<PathBuf> {
    let path = dir.join(download_file_name(tag));
    let csv = strategy
        .to_csv_string()
        .context("serialize lead strategy CSV")?;
    fs::write(&path, csv).with_context(|| format!("write {}", path.display()))?;
    tracing::info!(
        path = %path.display(),
        rows = strategy.len(),
        "wrote lead strategy download"
    );
    Ok(path)
}
