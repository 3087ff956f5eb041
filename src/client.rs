//! Synchronous client for the remote lead-scoring service.
//!
//! One blocking POST per analysis run. Non-2xx statuses are ordinary,
//! inspectable responses rather than errors; only transport failures (refused
//! connection, broken stream) surface as `Err`. No timeout or retry: the
//! endpoint's availability is an external dependency this workflow does not
//! compensate for.

use crate::params::ScoringParams;
use anyhow::{Context, Result};
use ureq::Agent;

const SCORING_PATH: &str = "/calculate_lead_strategy";
const RESPONSE_BODY_LIMIT: u64 = 64 * 1024 * 1024;

pub struct ScoringClient {
    agent: Agent,
    endpoint: String,
}

/// Status and raw body of one scoring call. The body stays text here; only
/// the success branch of the renderer ever decodes it.
#[derive(Debug, Clone)]
pub struct ScoringResponse {
    pub status: u16,
    pub body: String,
}

impl ScoringClient {
    /// Build a client for the given base endpoint (no trailing slash).
    pub fn new(endpoint: impl Into<String>) -> ScoringClient {
        let config = Agent::config_builder()
            .http_status_as_error(false)
            .build();
        ScoringClient {
            agent: config.into(),
            endpoint: endpoint.into(),
        }
    }

    /// POST the serialized dataset with the parameter map as query string and
    /// return whatever the service answers.
    pub fn calculate_lead_strategy(
        &self,
        dataset_json: &str,
        params: &ScoringParams,
    ) -> Result<ScoringResponse> {
        let url = format!("{}{}", self.endpoint, SCORING_PATH);
        let pairs = params.query_pairs();
        tracing::info!(url = %url, body_bytes = dataset_json.len(), "dispatching scoring request");
        let mut response = self
            .agent
            .post(url.as_str())
            .query_pairs(pairs.iter().map(|(key, value)| (*key, value.as_str())))
            .header("content-type", "application/json")
            .send(dataset_json)
            .with_context(|| format!("dispatch scoring request to {url}"))?;
        let status = response.status().as_u16();
        let body = response
            .body_mut()
            .with_config()
            .limit(RESPONSE_BODY_LIMIT)
            .read_to_string()
            .context("read scoring response body")?;
        tracing::info!(status, body_bytes = body.len(), "scoring response received");
        Ok(ScoringResponse { status, body })
    }
}
