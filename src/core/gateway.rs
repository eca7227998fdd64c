// src/core/gateway.rs

use crate::core::error::{Error, Result};
use crate::core::models::{
    DomainListRequest, DomainListResponse, ListQuery, TaskStartRequest, parse_targets,
};
use crate::core::registry::TaskRegistry;
use crate::core::store::DomainStore;
use axum::{
    Form, Json, Router,
    extract::{Path, State},
    routing::post,
};
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{info, warn};

/// Shared handles behind every gateway handler. The gateway itself keeps no
/// state of its own; it only translates wire requests into registry and
/// store calls.
#[derive(Clone)]
pub struct GatewayState {
    pub registry: Arc<TaskRegistry>,
    pub store: Arc<DomainStore>,
}

/// Builds the protocol router. All four endpoints are POST, matching the
/// dashboard's request contract.
pub fn router(state: GatewayState) -> Router {
    Router::new()
        .route("/task-start-domainscan", post(start_task))
        .route("/domain-list", post(domain_list))
        .route("/domain-delete/{id}", post(domain_delete))
        .route("/dashboard-task-info", post(task_info))
        .with_state(state)
}

/// `POST /task-start-domainscan` — validates and registers a scan job.
///
/// Returns the fresh task identifier synchronously; the scan itself runs in
/// the orchestrator, fire-and-forget.
async fn start_task(
    State(state): State<GatewayState>,
    Form(req): Form<TaskStartRequest>,
) -> Result<Json<Value>> {
    let targets = parse_targets(&req.target);
    if targets.is_empty() {
        warn!(org_id = req.org_id, "Submission rejected, no usable target.");
        return Err(Error::validation("at least one target is required"));
    }

    let task_id = state
        .registry
        .submit(targets, req.org_id, req.options())
        .await?;

    Ok(Json(json!({
        "status": "success",
        "result": { "task-id": task_id },
    })))
}

/// `POST /domain-list` — server-side pagination over the domain inventory.
async fn domain_list(
    State(state): State<GatewayState>,
    Form(req): Form<DomainListRequest>,
) -> Result<Json<DomainListResponse>> {
    let query = build_query(&req)?;
    Ok(Json(state.store.list(&query).await))
}

/// `POST /domain-delete/{id}` — removes one domain record by its row id.
async fn domain_delete(
    State(state): State<GatewayState>,
    Path(id): Path<u64>,
) -> Result<Json<Value>> {
    let (org_id, domain) = state.store.delete_row(id).await?;
    info!(%domain, org_id, "Domain deleted on operator request.");
    Ok(Json(json!({ "status": "success" })))
}

/// `POST /dashboard-task-info` — the aggregate task summary for the
/// dashboard's status poll.
async fn task_info(State(state): State<GatewayState>) -> Json<Value> {
    let summary = state.registry.aggregate_status().await;
    Json(json!({ "task_info": summary }))
}

/// Turns the raw wire request into the one `ListQuery` value object the rest
/// of the stack works with. Negative pagination values are malformed input;
/// sort hints from generic table controls are not honored and simply absent
/// here.
fn build_query(req: &DomainListRequest) -> Result<ListQuery> {
    if req.start < 0 {
        return Err(Error::validation("start must not be negative"));
    }
    if req.length <= 0 {
        return Err(Error::validation("length must be positive"));
    }

    let org_id = match req
        .org_id
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        Some(raw) => Some(
            raw.parse::<u64>()
                .map_err(|_| Error::validation(format!("org_id {raw:?} is not a number")))?,
        ),
        None => None,
    };

    let mut query = ListQuery::new(req.start as usize, req.length as usize);
    query.org_id = org_id;
    query.ip = req.ip_address.clone();
    query.domain = req.domain_address.clone();
    query.search = req.search.clone();
    Ok(query)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(start: i64, length: i64) -> DomainListRequest {
        DomainListRequest {
            start,
            length,
            org_id: None,
            ip_address: None,
            domain_address: None,
            search: None,
        }
    }

    #[test]
    fn negative_pagination_is_rejected_before_any_store_access() {
        assert!(matches!(
            build_query(&request(-1, 20)),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            build_query(&request(0, 0)),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            build_query(&request(0, -5)),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn blank_org_selection_imposes_no_constraint() {
        let mut req = request(0, 20);
        req.org_id = Some("  ".to_string());
        let query = build_query(&req).unwrap();
        assert_eq!(query.org_id, None);
    }

    #[test]
    fn non_numeric_org_is_malformed() {
        let mut req = request(0, 20);
        req.org_id = Some("acme".to_string());
        assert!(matches!(build_query(&req), Err(Error::Validation(_))));
    }
}
