// src/app.rs

use crate::core::models::{DomainListResponse, DomainRow, ListQuery, ScanOptions};
use ratatui::widgets::TableState;
use url::Url;

/// Which part of the dashboard owns the keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Browsing the table: navigation, delete, open the task form.
    Browse,
    /// Editing one of the filter fields.
    Filter(FilterField),
    /// The new-task form is open.
    TaskForm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterField {
    Org,
    Ip,
    Domain,
    Search,
}

impl FilterField {
    pub fn next(self) -> Self {
        match self {
            FilterField::Org => FilterField::Ip,
            FilterField::Ip => FilterField::Domain,
            FilterField::Domain => FilterField::Search,
            FilterField::Search => FilterField::Org,
        }
    }
}

/// Which field of the task form is being edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskField {
    Target,
    Org,
}

/// The new-task form. Targets are typed space- or comma-separated and sent
/// newline-delimited, the way the wire contract wants them.
#[derive(Debug, Default)]
pub struct TaskForm {
    pub target: String,
    pub org: String,
    pub options: ScanOptions,
    pub field: Option<TaskField>,
}

impl TaskForm {
    /// The newline-delimited target text for submission. Pasted URLs are
    /// reduced to their host name on the way out.
    pub fn target_text(&self) -> String {
        self.target
            .split([' ', ',', ';'])
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(normalize_target)
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn toggle_option(&mut self, index: u8) {
        match index {
            1 => self.options.subdomain = !self.options.subdomain,
            2 => self.options.webtitle = !self.options.webtitle,
            3 => self.options.whatweb = !self.options.whatweb,
            4 => self.options.portscan = !self.options.portscan,
            5 => self.options.fofasearch = !self.options.fofasearch,
            6 => self.options.networkscan = !self.options.networkscan,
            _ => {}
        }
    }
}

/// Reduces a pasted URL to its host name; anything else passes through
/// untouched.
fn normalize_target(raw: &str) -> String {
    if raw.starts_with("http://") || raw.starts_with("https://") {
        Url::parse(raw)
            .ok()
            .and_then(|url| url.host_str().map(String::from))
            .unwrap_or_else(|| raw.to_string())
    } else {
        raw.to_string()
    }
}

/// The whole state of the dashboard.
///
/// Listing requests carry a monotonically increasing sequence token; a
/// response older than the one already rendered is discarded, so late
/// replies can never overwrite a newer page.
pub struct App {
    pub should_quit: bool,
    pub mode: Mode,

    // Filter state, committed into a ListQuery per request.
    pub filter_org: String,
    pub filter_ip: String,
    pub filter_domain: String,
    pub filter_search: String,

    // The rendered page.
    pub page: usize,
    pub page_len: usize,
    pub rows: Vec<DomainRow>,
    pub records_filtered: usize,
    pub records_total: usize,
    pub table_state: TableState,

    // Poll and notice lines.
    pub task_info: String,
    pub notice: Option<String>,

    pub task_form: TaskForm,
    pub list_in_flight: bool,

    issued_seq: u64,
    applied_seq: u64,
}

impl App {
    pub fn new(page_len: usize) -> Self {
        Self {
            should_quit: false,
            mode: Mode::Browse,
            filter_org: String::new(),
            filter_ip: String::new(),
            filter_domain: String::new(),
            filter_search: String::new(),
            page: 0,
            page_len,
            rows: Vec::new(),
            records_filtered: 0,
            records_total: 0,
            table_state: TableState::default(),
            task_info: "no status yet".to_string(),
            notice: None,
            task_form: TaskForm::default(),
            list_in_flight: false,
            issued_seq: 0,
            applied_seq: 0,
        }
    }

    /// Builds the query value object for the current page and filters.
    ///
    /// Filter validation happens here, before any network call: a non-numeric
    /// organization filter never leaves the dashboard.
    pub fn current_query(&self) -> Result<ListQuery, String> {
        let org_id = match self.filter_org.trim() {
            "" => None,
            raw => Some(
                raw.parse::<u64>()
                    .map_err(|_| format!("org filter {raw:?} is not a number"))?,
            ),
        };

        let mut query = ListQuery::new(self.page * self.page_len, self.page_len);
        query.org_id = org_id;
        query.ip = Some(self.filter_ip.clone()).filter(|s| !s.trim().is_empty());
        query.domain = Some(self.filter_domain.clone()).filter(|s| !s.trim().is_empty());
        query.search = Some(self.filter_search.clone()).filter(|s| !s.trim().is_empty());
        Ok(query)
    }

    /// Hands out the sequence token for the next listing request.
    pub fn next_seq(&mut self) -> u64 {
        self.issued_seq += 1;
        self.issued_seq
    }

    /// Applies a listing response unless a newer one already rendered.
    /// Returns whether the response was used.
    pub fn apply_list(&mut self, seq: u64, response: DomainListResponse) -> bool {
        if seq <= self.applied_seq {
            return false;
        }
        self.applied_seq = seq;
        self.records_filtered = response.records_filtered;
        self.records_total = response.records_total;
        self.rows = response.data;

        if self.rows.is_empty() {
            self.table_state.select(None);
        } else {
            let selected = self.table_state.selected().unwrap_or(0);
            self.table_state.select(Some(selected.min(self.rows.len() - 1)));
        }
        true
    }

    pub fn page_count(&self) -> usize {
        self.records_filtered.div_ceil(self.page_len).max(1)
    }

    /// Moves one page forward; returns whether the page changed.
    pub fn next_page(&mut self) -> bool {
        if self.page + 1 < self.page_count() {
            self.page += 1;
            true
        } else {
            false
        }
    }

    /// Moves one page back; returns whether the page changed.
    pub fn prev_page(&mut self) -> bool {
        if self.page > 0 {
            self.page -= 1;
            true
        } else {
            false
        }
    }

    /// Resets pagination after a filter change.
    pub fn reset_page(&mut self) {
        self.page = 0;
        self.table_state.select(None);
    }

    pub fn select_next_row(&mut self) {
        if self.rows.is_empty() {
            return;
        }
        let next = match self.table_state.selected() {
            Some(i) => (i + 1).min(self.rows.len() - 1),
            None => 0,
        };
        self.table_state.select(Some(next));
    }

    pub fn select_prev_row(&mut self) {
        if self.rows.is_empty() {
            return;
        }
        let prev = self.table_state.selected().unwrap_or(0).saturating_sub(1);
        self.table_state.select(Some(prev));
    }

    /// The row id the delete action would target.
    pub fn selected_row_id(&self) -> Option<u64> {
        self.table_state
            .selected()
            .and_then(|i| self.rows.get(i))
            .map(|r| r.id)
    }

    pub fn active_filter_mut(&mut self) -> Option<&mut String> {
        match self.mode {
            Mode::Filter(FilterField::Org) => Some(&mut self.filter_org),
            Mode::Filter(FilterField::Ip) => Some(&mut self.filter_ip),
            Mode::Filter(FilterField::Domain) => Some(&mut self.filter_domain),
            Mode::Filter(FilterField::Search) => Some(&mut self.filter_search),
            _ => None,
        }
    }

    pub fn reset_task_form(&mut self) {
        self.task_form = TaskForm::default();
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }
}
