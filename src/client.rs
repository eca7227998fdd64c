// src/client.rs

use crate::core::models::{
    DomainListResponse, ListQuery, ScanOptions, StatusResponse, TaskInfoResponse,
    TaskStartResponse,
};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
const USER_AGENT: &str = "OutpostRS/0.1";

/// The dashboard's handle on the gateway.
///
/// Every call is one request/response round trip; errors come back as plain
/// strings because the presenter only ever shows a generic notice. A body
/// whose status field is not `success` counts as failure no matter what the
/// HTTP status says.
pub struct ApiClient {
    http: reqwest::Client,
    base: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, String> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| format!("Failed to build HTTP client: {}", e))?;
        Ok(Self {
            http,
            base: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Submits a scan task; returns the fresh task identifier.
    pub async fn submit_task(
        &self,
        target_text: &str,
        org_id: u64,
        options: &ScanOptions,
    ) -> Result<String, String> {
        let form = [
            ("target", target_text.to_string()),
            ("org_id", org_id.to_string()),
            ("subdomain", options.subdomain.to_string()),
            ("webtitle", options.webtitle.to_string()),
            ("whatweb", options.whatweb.to_string()),
            ("portscan", options.portscan.to_string()),
            ("fofasearch", options.fofasearch.to_string()),
            ("networkscan", options.networkscan.to_string()),
        ];

        let body: Value = self
            .post_form("/task-start-domainscan", &form)
            .await?
            .json()
            .await
            .map_err(|e| format!("Malformed submission response: {}", e))?;

        if body["status"] != "success" {
            warn!(body = %body, "Submission rejected by the gateway.");
            return Err(body["msg"].as_str().unwrap_or("task submission failed").to_string());
        }
        let body: TaskStartResponse = serde_json::from_value(body)
            .map_err(|e| format!("Malformed submission response: {}", e))?;
        Ok(body.result.task_id)
    }

    /// Fetches one page of the domain inventory.
    pub async fn list_domains(&self, query: &ListQuery) -> Result<DomainListResponse, String> {
        let mut form: Vec<(&str, String)> = vec![
            ("start", query.offset.to_string()),
            ("length", query.length.to_string()),
        ];
        if let Some(org_id) = query.org_id {
            form.push(("org_id", org_id.to_string()));
        }
        if let Some(ip) = &query.ip {
            form.push(("ip_address", ip.clone()));
        }
        if let Some(domain) = &query.domain {
            form.push(("domain_address", domain.clone()));
        }
        if let Some(search) = &query.search {
            form.push(("search", search.clone()));
        }

        let response = self.post_form("/domain-list", &form).await?;
        if !response.status().is_success() {
            return Err(failure_message(response).await);
        }
        response
            .json::<DomainListResponse>()
            .await
            .map_err(|e| format!("Malformed list response: {}", e))
    }

    /// Deletes one domain record by its row id.
    pub async fn delete_domain(&self, id: u64) -> Result<(), String> {
        let body: StatusResponse = self
            .post_form(&format!("/domain-delete/{id}"), &[] as &[(&str, String)])
            .await?
            .json()
            .await
            .map_err(|e| format!("Malformed delete response: {}", e))?;

        if body.status != "success" {
            return Err(body.msg.unwrap_or_else(|| "delete failed".to_string()));
        }
        Ok(())
    }

    /// Fetches the aggregate task summary for the status poll.
    pub async fn task_status(&self) -> Result<String, String> {
        let response = self
            .post_form("/dashboard-task-info", &[] as &[(&str, String)])
            .await?;
        if !response.status().is_success() {
            return Err(failure_message(response).await);
        }
        response
            .json::<TaskInfoResponse>()
            .await
            .map(|body| body.task_info)
            .map_err(|e| format!("Malformed status response: {}", e))
    }

    async fn post_form<T: serde::Serialize + ?Sized>(
        &self,
        path: &str,
        form: &T,
    ) -> Result<reqwest::Response, String> {
        let url = format!("{}{}", self.base, path);
        debug!(url = %url, "Issuing gateway request.");
        self.http
            .post(&url)
            .form(form)
            .send()
            .await
            .map_err(|e| format!("Request failed: {}", e))
    }
}

/// Pulls the gateway's failure message out of an error response, falling
/// back to the bare HTTP status.
async fn failure_message(response: reqwest::Response) -> String {
    let status = response.status();
    match response.json::<Value>().await {
        Ok(body) => body["msg"]
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| format!("request failed with {}", status)),
        Err(_) => format!("request failed with {}", status),
    }
}
