// src/core/models.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// --- Tipi di Risultato Riutilizzabili ---
// Reusable Result Types
// A custom type alias for a Result that can hold an optional success value or a String error.
// Used by the scanners, where "nothing found" and "lookup failed" are different outcomes.
pub type ScanResult<T> = Result<Option<T>, String>;

// --- Ciclo di Vita dei Task ---
// Task Lifecycle

/// Lifecycle state of a submitted scan task.
///
/// States only move forward: `Created -> Running -> {Completed, Failed}`.
/// `Completed` and `Failed` are terminal; a retry is a fresh task, never a
/// resurrected one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    Created,
    Running,
    Completed,
    Failed,
}

impl TaskState {
    /// Whether this state admits no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskState::Completed | TaskState::Failed)
    }

    /// The only transitions the registry accepts.
    pub fn can_advance_to(&self, next: TaskState) -> bool {
        matches!(
            (self, next),
            (TaskState::Created, TaskState::Running)
                | (TaskState::Running, TaskState::Completed)
                | (TaskState::Running, TaskState::Failed)
        )
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskState::Created => write!(f, "created"),
            TaskState::Running => write!(f, "running"),
            TaskState::Completed => write!(f, "completed"),
            TaskState::Failed => write!(f, "failed"),
        }
    }
}

/// The scanner feature flags carried by a submission.
///
/// Each flag enables one scanner for every target of the task. `networkscan`
/// widens the port scan to every address the targets resolve to.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ScanOptions {
    pub subdomain: bool,
    pub webtitle: bool,
    pub whatweb: bool,
    pub portscan: bool,
    pub fofasearch: bool,
    pub networkscan: bool,
}

/// A submitted scanning job.
///
/// The identifier is assigned by the registry on submission and is immutable
/// afterwards. The target list is guaranteed non-empty by the registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanTask {
    pub id: String,
    pub targets: Vec<String>,
    pub org_id: u64,
    pub options: ScanOptions,
    pub state: TaskState,
    pub created_at: DateTime<Utc>,
}

// --- Modelli Inventario Domini ---
// Domain Inventory Models

/// A persisted result row describing one discovered domain.
///
/// `domain` is the natural key within an organization scope; `id` is the
/// store-assigned row identifier exposed on the wire. IP, title and banner
/// stay empty until a scanner resolves them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainRecord {
    pub id: u64,
    pub domain: String,
    pub ip: String,
    pub title: String,
    pub banner: String,
    pub org_id: u64,
    pub created_at: DateTime<Utc>,
}

/// A partial scan finding for one domain, produced by the scanners and
/// merged into the store. `None` fields never clobber resolved data.
#[derive(Debug, Clone, Default)]
pub struct DomainFinding {
    pub domain: String,
    pub ip: Option<String>,
    pub title: Option<String>,
    pub banner: Option<String>,
}

impl DomainFinding {
    pub fn new(domain: &str) -> Self {
        Self {
            domain: domain.to_string(),
            ..Default::default()
        }
    }
}

/// A technology identified by the fingerprint scanner.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Technology {
    pub name: String,
    pub category: String,
    pub version: Option<String>,
}

impl fmt::Display for Technology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(v) => write!(f, "{}/{} ({})", self.name, v, self.category),
            None => write!(f, "{} ({})", self.name, self.category),
        }
    }
}

// --- Query di Listato ---
// List Query

/// The value object for one paginated listing request.
///
/// Built once per request and passed down whole; handlers never read filter
/// state piecemeal. All filters are conjunctive, absent or empty fields
/// impose no constraint.
#[derive(Debug, Clone)]
pub struct ListQuery {
    pub offset: usize,
    pub length: usize,
    pub org_id: Option<u64>,
    pub ip: Option<String>,
    pub domain: Option<String>,
    pub search: Option<String>,
}

impl ListQuery {
    pub fn new(offset: usize, length: usize) -> Self {
        Self {
            offset,
            length,
            org_id: None,
            ip: None,
            domain: None,
            search: None,
        }
    }

    /// Whether a record satisfies every non-empty filter of this query.
    ///
    /// Organization ids match exactly; ip and domain filters are
    /// case-insensitive substring matches; the free-text search term is a
    /// case-insensitive substring match across domain, ip, title and banner.
    pub fn matches(&self, record: &DomainRecord) -> bool {
        if let Some(org_id) = self.org_id {
            if record.org_id != org_id {
                return false;
            }
        }
        if let Some(ip) = non_empty(&self.ip) {
            if !contains_ci(&record.ip, ip) {
                return false;
            }
        }
        if let Some(domain) = non_empty(&self.domain) {
            if !contains_ci(&record.domain, domain) {
                return false;
            }
        }
        if let Some(term) = non_empty(&self.search) {
            let hit = contains_ci(&record.domain, term)
                || contains_ci(&record.ip, term)
                || contains_ci(&record.title, term)
                || contains_ci(&record.banner, term);
            if !hit {
                return false;
            }
        }
        true
    }
}

fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Splits the newline-delimited target text of a submission into a clean
/// target list. Blank lines and surrounding whitespace are dropped,
/// duplicates are kept in first-seen position only.
pub fn parse_targets(raw: &str) -> Vec<String> {
    let mut targets: Vec<String> = Vec::new();
    for line in raw.lines() {
        let target = line.trim();
        if target.is_empty() {
            continue;
        }
        if !targets.iter().any(|t| t == target) {
            targets.push(target.to_string());
        }
    }
    targets
}

// --- Contratto di Rete ---
// Wire Contract

/// Form body of `POST /task-start-domainscan`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskStartRequest {
    pub target: String,
    #[serde(default)]
    pub org_id: u64,
    #[serde(default)]
    pub subdomain: bool,
    #[serde(default)]
    pub webtitle: bool,
    #[serde(default)]
    pub whatweb: bool,
    #[serde(default)]
    pub portscan: bool,
    #[serde(default)]
    pub fofasearch: bool,
    #[serde(default)]
    pub networkscan: bool,
}

impl TaskStartRequest {
    pub fn options(&self) -> ScanOptions {
        ScanOptions {
            subdomain: self.subdomain,
            webtitle: self.webtitle,
            whatweb: self.whatweb,
            portscan: self.portscan,
            fofasearch: self.fofasearch,
            networkscan: self.networkscan,
        }
    }
}

/// Response body of a successful submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskStartResponse {
    pub status: String,
    pub result: TaskStartResult,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskStartResult {
    #[serde(rename = "task-id")]
    pub task_id: String,
}

/// Form body of `POST /domain-list`. Pagination fields arrive signed so the
/// gateway can reject negative values explicitly instead of wrapping them.
/// The organization filter arrives as raw text because an empty selection is
/// sent as an empty string.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainListRequest {
    #[serde(default)]
    pub start: i64,
    #[serde(default = "default_page_length")]
    pub length: i64,
    #[serde(default)]
    pub org_id: Option<String>,
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub domain_address: Option<String>,
    #[serde(default)]
    pub search: Option<String>,
}

fn default_page_length() -> i64 {
    20
}

/// One row of a listing response. `index` is the 1-based display sequence
/// within the full filtered result set, not an identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainRow {
    pub id: u64,
    pub index: usize,
    pub domain: String,
    pub ip: String,
    pub title: String,
    pub banner: String,
}

/// Response body of `POST /domain-list`.
///
/// `records_filtered` is the match count after filtering, used by the caller
/// to compute the page count; `records_total` is the row count of the
/// unfiltered inventory in the same organization scope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainListResponse {
    pub data: Vec<DomainRow>,
    #[serde(rename = "recordsFiltered")]
    pub records_filtered: usize,
    #[serde(rename = "recordsTotal")]
    pub records_total: usize,
}

/// Response body of `POST /dashboard-task-info`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskInfoResponse {
    pub task_info: String,
}

/// Minimal acknowledgement body shared by delete and failure responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
}
