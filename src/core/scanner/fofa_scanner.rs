// src/core/scanner/fofa_scanner.rs

use tracing::{debug, info, warn};

use crate::config::FofaCredentials;
use crate::core::models::DomainFinding;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::Deserialize;
use std::time::Duration;

const FOFA_API: &str = "https://fofa.info/api/v1/search/all";
const RESULT_FIELDS: &str = "host,ip,title";
const RESULT_SIZE: usize = 100;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// The slice of the FOFA search response this scanner consumes. Each result
/// row carries the fields requested in `RESULT_FIELDS`, in order.
#[derive(Debug, Deserialize)]
struct FofaResponse {
    #[serde(default)]
    error: bool,
    #[serde(default)]
    errmsg: Option<String>,
    #[serde(default)]
    results: Vec<Vec<String>>,
}

/// Queries the FOFA search API for hosts of the target domain.
///
/// The query is the base64 form of `domain="<target>"`, the way the API
/// wants it. Hosts outside the target domain are discarded, whatever the
/// index claims.
pub async fn search(
    credentials: &FofaCredentials,
    target: &str,
) -> Result<Vec<DomainFinding>, String> {
    info!(target, "Starting FOFA search.");

    let client = reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(|e| format!("HTTP client error: {}", e))?;

    let qbase64 = STANDARD.encode(format!("domain=\"{}\"", target));
    let size = RESULT_SIZE.to_string();
    let response = client
        .get(FOFA_API)
        .query(&[
            ("email", credentials.email.as_str()),
            ("key", credentials.key.as_str()),
            ("qbase64", qbase64.as_str()),
            ("fields", RESULT_FIELDS),
            ("size", size.as_str()),
        ])
        .send()
        .await
        .map_err(|e| {
            warn!(error = %e, "FOFA request failed.");
            format!("FOFA request failed: {}", e)
        })?;

    let body: FofaResponse = response.json().await.map_err(|e| {
        warn!(error = %e, "FOFA response was not valid JSON.");
        format!("FOFA response malformed: {}", e)
    })?;

    if body.error {
        let msg = body.errmsg.unwrap_or_else(|| "unspecified error".to_string());
        warn!(target, error = %msg, "FOFA reported an error.");
        return Err(format!("FOFA error: {}", msg));
    }

    let mut findings: Vec<DomainFinding> = Vec::new();
    for row in &body.results {
        let Some(domain) = row.first().and_then(|host| host_to_domain(host)) else {
            continue;
        };
        if !belongs_to(&domain, target) {
            debug!(host = %domain, target, "Discarding off-domain FOFA result.");
            continue;
        }
        if findings.iter().any(|f| f.domain == domain) {
            continue;
        }

        let mut finding = DomainFinding::new(&domain);
        finding.ip = row.get(1).map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        finding.title = row.get(2).map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        findings.push(finding);
    }

    info!(target, found = findings.len(), "FOFA search finished.");
    Ok(findings)
}

/// Reduces a FOFA host entry (possibly `scheme://name:port`) to a bare
/// domain name. Entries that are raw addresses yield `None`; the domain
/// inventory only grows through names here.
fn host_to_domain(host: &str) -> Option<String> {
    let stripped = host
        .trim()
        .trim_start_matches("https://")
        .trim_start_matches("http://");
    let name = stripped.split([':', '/']).next()?.to_lowercase();
    if name.is_empty() || name.parse::<std::net::IpAddr>().is_ok() {
        None
    } else {
        Some(name)
    }
}

/// Whether `domain` is the target itself or one of its subdomains.
fn belongs_to(domain: &str, target: &str) -> bool {
    let target = target.to_lowercase();
    domain == target || domain.ends_with(&format!(".{}", target))
}
