// src/core/scanner/title_scanner.rs

use tracing::{debug, info, warn};

use crate::core::models::ScanResult;
use scraper::{Html, Selector};
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const USER_AGENT: &str = "OutpostRS/0.1";

/// Fetches the page title of a target.
///
/// Tries HTTPS first, falling back to plain HTTP, since inventoried hosts
/// expose either. `Ok(None)` means the page answered but carries no usable
/// title; `Err` means no scheme produced a response at all.
pub async fn fetch_title(target: &str) -> ScanResult<String> {
    info!(target, "Starting web title scan.");

    let client = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(|e| format!("Failed to build HTTP client: {}", e))?;

    let mut last_error = String::new();
    for scheme in ["https", "http"] {
        let url = format!("{scheme}://{target}");
        match client.get(&url).send().await {
            Ok(response) => {
                debug!(url = %url, status = %response.status(), "Received HTTP response.");
                let body = response
                    .text()
                    .await
                    .map_err(|e| format!("Failed to read response body: {}", e))?;
                let title = extract_title(&body);
                info!(target, found = title.is_some(), "Web title scan finished.");
                return Ok(title);
            }
            Err(e) => {
                debug!(url = %url, error = %e, "Request failed, trying next scheme.");
                last_error = format!("HTTP request failed: {}", e);
            }
        }
    }

    warn!(target, error = %last_error, "Web title scan failed on every scheme.");
    Err(last_error)
}

/// Pulls the text of the first `<title>` element out of an HTML document.
/// Whitespace runs are collapsed; an empty or missing element yields `None`.
fn extract_title(body: &str) -> Option<String> {
    let document = Html::parse_document(body);
    let selector = Selector::parse("title").ok()?;
    let element = document.select(&selector).next()?;

    let raw: String = element.text().collect();
    let title = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if title.is_empty() { None } else { Some(title) }
}
