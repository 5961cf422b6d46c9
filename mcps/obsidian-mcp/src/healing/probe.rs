//! Candidate URL probing and selection
//!
//! A probe is one authenticated `GET /` against a candidate base URL.
//! Probes never fail: every error collapses into `success: false` while the
//! elapsed time is still recorded for diagnostics.

use std::time::Duration;

use futures_util::future::join_all;
use reqwest::header;
use reqwest::Client;
use tokio::time::Instant;

/// Outcome of probing one candidate URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResult {
    pub url: String,
    pub success: bool,
    /// Wall-clock time from request start until success or failure
    pub latency: Duration,
}

impl ProbeResult {
    pub fn new(url: impl Into<String>, success: bool, latency: Duration) -> Self {
        Self {
            url: url.into(),
            success,
            latency,
        }
    }
}

/// Probe a single candidate URL
pub async fn probe(url: &str, api_key: &str, timeout: Duration) -> ProbeResult {
    let start = Instant::now();
    let outcome = send_probe(url, api_key, timeout).await;
    let latency = start.elapsed();

    match outcome {
        Ok(()) => {
            tracing::debug!(url, latency_ms = latency.as_millis() as u64, "Probe succeeded");
            ProbeResult::new(url, true, latency)
        }
        Err(e) => {
            tracing::debug!(
                url,
                latency_ms = latency.as_millis() as u64,
                error = %e,
                "Probe failed"
            );
            ProbeResult::new(url, false, latency)
        }
    }
}

async fn send_probe(url: &str, api_key: &str, timeout: Duration) -> Result<(), reqwest::Error> {
    let client = Client::builder()
        .danger_accept_invalid_certs(true)
        .timeout(timeout)
        .build()?;

    client
        .get(format!("{}/", url.trim_end_matches('/')))
        .header(header::AUTHORIZATION, format!("Bearer {}", api_key))
        .send()
        .await?
        .error_for_status()?;

    Ok(())
}

/// Probe every URL concurrently; results come back in input order
pub async fn probe_all(urls: &[String], api_key: &str, timeout: Duration) -> Vec<ProbeResult> {
    tracing::debug!(
        count = urls.len(),
        timeout_ms = timeout.as_millis() as u64,
        "Probing candidate URLs"
    );

    let results = join_all(urls.iter().map(|url| probe(url, api_key, timeout))).await;

    let reachable = results.iter().filter(|r| r.success).count();
    tracing::debug!(reachable, total = results.len(), "Probing complete");

    results
}

/// Pick the lowest-latency successful candidate
///
/// Ties go to the earliest result. Returns `None` when nothing succeeded.
pub fn select_best(results: &[ProbeResult]) -> Option<String> {
    results
        .iter()
        .filter(|r| r.success)
        .min_by_key(|r| r.latency)
        .map(|r| r.url.clone())
}
