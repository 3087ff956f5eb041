//! Shared test infrastructure: a canned-response scoring service and CSV
//! fixtures.

use serde_json::json;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread::{self, JoinHandle};

/// One request as observed by the mock service.
#[derive(Debug)]
pub struct CapturedRequest {
    pub method: String,
    /// Path including the query string.
    pub target: String,
    pub body: String,
}

/// Minimal HTTP/1.1 listener that answers every request with one canned
/// status and body, then hands the captured requests back to the test.
pub struct MockScoringServer {
    pub base_url: String,
    handle: JoinHandle<()>,
    requests: mpsc::Receiver<CapturedRequest>,
}

impl MockScoringServer {
    /// Serve exactly `count` requests with the given status/body, then stop.
    pub fn start(status: u16, body: &str, count: usize) -> MockScoringServer {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind mock server");
        let base_url = format!("http://{}", listener.local_addr().expect("local addr"));
        let (sender, requests) = mpsc::channel();
        let body = body.to_string();
        let handle = thread::spawn(move || {
            for _ in 0..count {
                let Ok((mut stream, _)) = listener.accept() else {
                    return;
                };
                let request = read_request(&mut stream);
                let reason = match status {
                    200 => "OK",
                    500 => "Internal Server Error",
                    _ => "Error",
                };
                let response = format!(
                    "HTTP/1.1 {status} {reason}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                    body.len(),
                );
                let _ = stream.write_all(response.as_bytes());
                let _ = sender.send(request);
            }
        });
        MockScoringServer {
            base_url,
            handle,
            requests,
        }
    }

    /// Wait for the server to finish and return what it saw.
    pub fn requests(self) -> Vec<CapturedRequest> {
        self.handle.join().expect("mock server thread");
        self.requests.try_iter().collect()
    }
}

fn read_request(stream: &mut TcpStream) -> CapturedRequest {
    let mut reader = BufReader::new(stream);
    let mut request_line = String::new();
    reader.read_line(&mut request_line).expect("request line");
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or_default().to_string();
    let target = parts.next().unwrap_or_default().to_string();

    let mut content_length = 0usize;
    loop {
        let mut line = String::new();
        reader.read_line(&mut line).expect("header line");
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some(value) = line.to_ascii_lowercase().strip_prefix("content-length:") {
            content_length = value.trim().parse().unwrap_or(0);
        }
    }

    let mut body = vec![0u8; content_length];
    reader.read_exact(&mut body).expect("request body");
    CapturedRequest {
        method,
        target,
        body: String::from_utf8_lossy(&body).into_owned(),
    }
}

/// A well-formed scoring response: three JSON-encoded table payloads, the
/// threshold sweep in the column-oriented form a dataframe serializer emits.
pub fn strategy_response_body() -> String {
    let lead_strategy = json!([
        {"user_email": "hana.yoshida@example.com", "lead_score": 0.97, "rank": 1, "action": "keep"},
        {"user_email": "aisha.bello@example.com", "lead_score": 0.94, "rank": 2, "action": "keep"},
        {"user_email": "sofia.herrera@example.com", "lead_score": 0.91, "rank": 3, "action": "keep"},
        {"user_email": "marcus.deluca@example.com", "lead_score": 0.22, "rank": 4, "action": "drop"},
        {"user_email": "diego.fuentes@example.com", "lead_score": 0.08, "rank": 5, "action": "drop"},
    ]);
    let expected_value = json!([
        {"expected_monthly_sales": 241_350.0, "saved_emails_per_month": 320, "monthly_sales_reduction": 0.035},
    ]);
    let thresh_optim_table = json!({
        "thresh": {"0": 0.0, "1": 0.25, "2": 0.5, "3": 0.75, "4": 1.0},
        "expected_value": {"0": 180_000.0, "1": 230_000.0, "2": 244_000.0, "3": 210_000.0, "4": 120_000.0},
    });
    json!({
        "lead_strategy": lead_strategy.to_string(),
        "expected_value": expected_value.to_string(),
        "thresh_optim_table": thresh_optim_table.to_string(),
    })
    .to_string()
}

/// Number of rows in the canned `lead_strategy` payload.
pub const STRATEGY_ROWS: usize = 5;

/// Write a small subscriber CSV and return its path.
pub fn write_leads_csv(dir: &Path) -> PathBuf {
    let path = dir.join("subscribers.csv");
    std::fs::write(
        &path,
        "user_email,member_rating,optin_days\n\
         ann@example.com,5,142\n\
         bob@example.com,3,9\n\
         carol@example.com,4,88\n",
    )
    .expect("write subscriber fixture");
    path
}
