//! Integration tests for the headless analysis workflow, driven through the
//! binary against a canned-response scoring service.

mod common;

use common::{strategy_response_body, write_leads_csv, MockScoringServer, STRATEGY_ROWS};
use std::process::Command;

fn leadscore() -> Command {
    Command::new(env!("CARGO_BIN_EXE_leadscore"))
}

#[test]
fn analyze_renders_strategy_and_writes_download() {
    let server = MockScoringServer::start(200, &strategy_response_body(), 1);
    let dir = tempfile::tempdir().expect("tempdir");
    let leads = write_leads_csv(dir.path());

    let output = leadscore()
        .args(["analyze", "--endpoint", &server.base_url, "--upload"])
        .arg(&leads)
        .arg("--out-dir")
        .arg(dir.path())
        .output()
        .expect("run leadscore");
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Scoring 3 leads"), "stdout: {stdout}");
    assert!(stdout.contains("Monthly sales will not go below: $225,000"));
    assert!(stdout.contains("Response status code: 200"));
    assert!(stdout.contains("Lead strategy summary:"));
    assert!(stdout.contains("expected_monthly_sales"));
    assert!(stdout.contains("safeguard at 0.90"));
    assert!(stdout.contains("hana.yoshida@example.com"));

    let download = dir.path().join("lead_strategy_uploaded.csv");
    let csv = std::fs::read_to_string(&download).expect("download exists");
    assert_eq!(csv.lines().count(), 1 + STRATEGY_ROWS);

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.method, "POST");
    assert!(
        request.target.starts_with("/calculate_lead_strategy?"),
        "target: {}",
        request.target
    );
    for pair in [
        "monthly_sales_reduction_safe_guard=0.9",
        "email_list_size=100000",
        "unsub_rate_per_sales_email=0.005",
        "sales_emails_per_month=5",
        "avg_sales_per_month=250000.0",
        "avg_sales_emails_per_month=5",
        "customer_conversion_rate=0.05",
        "avg_customer_value=2000.0",
    ] {
        assert!(
            request.target.contains(pair),
            "missing {pair} in {}",
            request.target
        );
    }
    // row-oriented records in the body, row order preserved
    assert!(request.body.starts_with('['));
    let records: serde_json::Value = serde_json::from_str(&request.body).expect("body json");
    let records = records.as_array().expect("records array");
    assert_eq!(records.len(), 3);
    assert_eq!(records[1]["user_email"], "bob@example.com");
}

#[test]
fn analyze_uses_the_bundled_leads_by_default() {
    let server = MockScoringServer::start(200, &strategy_response_body(), 1);
    let dir = tempfile::tempdir().expect("tempdir");

    let output = leadscore()
        .args(["analyze", "--endpoint", &server.base_url, "--out-dir"])
        .arg(dir.path())
        .output()
        .expect("run leadscore");
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("data/leads.csv"), "stdout: {stdout}");
    assert!(dir.path().join("lead_strategy_default.csv").is_file());

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    // all twenty bundled rows went out
    let records: serde_json::Value =
        serde_json::from_str(&requests[0].body).expect("body json");
    assert_eq!(records.as_array().expect("records").len(), 20);
}

#[test]
fn analyze_surfaces_http_failure_without_decoding() {
    let server = MockScoringServer::start(500, "internal error", 1);

    let output = leadscore()
        .args(["analyze", "--endpoint", &server.base_url])
        .output()
        .expect("run leadscore");
    assert!(
        output.status.success(),
        "http failure should exit cleanly; stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Response status code: 500"));
    assert!(stdout.contains("Request failed with status 500"));
    assert!(stdout.contains("internal error"));
    assert!(!stdout.contains("Lead strategy summary"));

    drop(server.requests());
}

#[test]
fn analyze_reports_a_missing_table_payload() {
    let body = serde_json::json!({
        "lead_strategy": "[]",
        "expected_value": "[]",
    })
    .to_string();
    let server = MockScoringServer::start(200, &body, 1);

    let output = leadscore()
        .args(["analyze", "--endpoint", &server.base_url])
        .output()
        .expect("run leadscore");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("An error occurred while processing the response"));
    assert!(stdout.contains("thresh_optim_table"));
    assert!(!stdout.contains("Lead strategy summary"));

    drop(server.requests());
}

#[test]
fn analyze_rejects_an_out_of_range_safeguard() {
    let output = leadscore()
        .args([
            "analyze",
            "--endpoint",
            "http://127.0.0.1:1",
            "--safe-guard",
            "1.5",
        ])
        .output()
        .expect("run leadscore");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("safe-guard"), "stderr: {stderr}");
}

#[test]
fn analyze_fails_fast_when_the_bundled_dataset_is_missing() {
    let output = leadscore()
        .args([
            "analyze",
            "--endpoint",
            "http://127.0.0.1:1",
            "--leads",
            "does/not/exist.csv",
        ])
        .output()
        .expect("run leadscore");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("does/not/exist.csv"), "stderr: {stderr}");
}
