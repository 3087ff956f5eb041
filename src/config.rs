//! Startup configuration: scoring endpoint, bundled dataset path, download
//! directory.
//!
//! The endpoint is resolved once here and injected into the scoring client at
//! construction; nothing else in the workflow reads the environment.

use anyhow::{anyhow, Result};
use std::env;
use std::path::PathBuf;

pub const ENDPOINT_ENV: &str = "LEAD_SCORING_ENDPOINT";
pub const BUNDLED_LEADS_PATH: &str = "data/leads.csv";

#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the scoring service.
    pub endpoint: String,
    /// Known-good leads CSV used by the default source mode.
    pub bundled_leads: PathBuf,
    /// Where downloaded strategy files are written.
    pub download_dir: PathBuf,
}

impl Config {
    pub fn resolve(
        endpoint: Option<String>,
        leads: Option<PathBuf>,
        out_dir: Option<PathBuf>,
    ) -> Result<Config> {
        let endpoint = resolve_endpoint(endpoint, env::var(ENDPOINT_ENV).ok())?;
        let bundled_leads = leads.unwrap_or_else(|| PathBuf::from(BUNDLED_LEADS_PATH));
        let download_dir = out_dir
            .or_else(dirs::download_dir)
            .unwrap_or_else(|| PathBuf::from("."));
        Ok(Config {
            endpoint,
            bundled_leads,
            download_dir,
        })
    }
}

fn resolve_endpoint(flag: Option<String>, env_value: Option<String>) -> Result<String> {
    let raw = flag
        .filter(|value| !value.trim().is_empty())
        .or(env_value)
        .ok_or_else(|| {
            anyhow!("no scoring endpoint configured (pass --endpoint or set {ENDPOINT_ENV})")
        })?;
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(anyhow!("scoring endpoint is empty"));
    }
    Ok(trimmed.to_string())
}
