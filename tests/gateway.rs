// tests/gateway.rs
//
// Drives the gateway router in-process, request by request, the way the
// dashboard does over the wire. No orchestrator is attached: submissions
// park in the created state, which is exactly what the protocol promises
// before a scan completes.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

use outpost_rs_recon::core::gateway::{self, GatewayState};
use outpost_rs_recon::core::models::DomainFinding;
use outpost_rs_recon::core::registry::TaskRegistry;
use outpost_rs_recon::core::store::DomainStore;

fn test_state() -> (Router, Arc<DomainStore>) {
    let (registry, _wakeups) = TaskRegistry::new();
    let store = Arc::new(DomainStore::new());
    let router = gateway::router(GatewayState {
        registry: Arc::new(registry),
        store: store.clone(),
    });
    (router, store)
}

async fn post_form(router: &Router, path: &str, body: &str) -> (StatusCode, Value) {
    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(path)
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn seed(store: &DomainStore) {
    for (domain, ip, title, banner) in [
        ("www.example.com", "10.0.0.1", "Example", "nginx/1.18.0"),
        ("mail.example.com", "10.0.0.2", "Webmail", "Postfix"),
        ("dev.example.com", "192.168.1.9", "Dev portal", ""),
        ("api.example.com", "10.0.0.3", "", ""),
        ("vpn.example.com", "10.0.0.4", "", "OpenVPN"),
    ] {
        let mut finding = DomainFinding::new(domain);
        finding.ip = Some(ip.to_string()).filter(|s| !s.is_empty());
        finding.title = Some(title.to_string()).filter(|s| !s.is_empty());
        finding.banner = Some(banner.to_string()).filter(|s| !s.is_empty());
        store.upsert(1, finding).await;
    }
}

#[tokio::test]
async fn submitting_a_task_returns_a_fresh_task_id() {
    let (router, _store) = test_state();

    let (status, body) = post_form(
        &router,
        "/task-start-domainscan",
        "target=example.com&org_id=1&portscan=true",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    let task_id = body["result"]["task-id"].as_str().unwrap();
    assert!(!task_id.is_empty());

    // Before the scan completes the inventory legitimately has no trace of
    // the target; the submission makes no claims about completion timing.
    let (_, listed) = post_form(&router, "/domain-list", "start=0&length=20&org_id=1").await;
    assert_eq!(listed["recordsFiltered"], 0);
    assert_eq!(listed["data"].as_array().unwrap().len(), 0);

    // The aggregate summary observes the parked task.
    let (_, info) = post_form(&router, "/dashboard-task-info", "").await;
    assert!(info["task_info"].as_str().unwrap().contains("1 created"));
}

#[tokio::test]
async fn an_empty_target_list_never_creates_a_task() {
    let (router, _store) = test_state();

    for body in ["target=&org_id=1", "target=%20%0A%20&org_id=1"] {
        let (status, response) = post_form(&router, "/task-start-domainscan", body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(response["status"], "fail");
    }

    let (_, info) = post_form(&router, "/dashboard-task-info", "").await;
    assert_eq!(info["task_info"], "no tasks submitted");
}

#[tokio::test]
async fn listing_pages_through_the_filtered_set_in_stable_order() {
    let (router, store) = test_state();
    seed(&store).await;

    let (status, page) = post_form(&router, "/domain-list", "start=0&length=2&org_id=1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["recordsFiltered"], 5);
    assert_eq!(page["recordsTotal"], 5);
    let rows = page["data"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["domain"], "www.example.com");
    assert_eq!(rows[0]["index"], 1);
    assert_eq!(rows[1]["index"], 2);

    let (_, page) = post_form(&router, "/domain-list", "start=4&length=2&org_id=1").await;
    let rows = page["data"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["domain"], "vpn.example.com");
    assert_eq!(rows[0]["index"], 5);
}

#[tokio::test]
async fn an_offset_past_the_end_is_empty_but_not_an_error() {
    let (router, store) = test_state();
    seed(&store).await;

    let (status, page) = post_form(&router, "/domain-list", "start=1000&length=20&org_id=1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["data"].as_array().unwrap().len(), 0);
    assert_eq!(page["recordsFiltered"], 5);
}

#[tokio::test]
async fn wire_filters_combine_conjunctively() {
    let (router, store) = test_state();
    seed(&store).await;

    // The ip filter alone matches four 10.0.0.* records; adding the search
    // term narrows it to the one whose banner mentions OpenVPN.
    let (_, page) = post_form(&router, "/domain-list", "start=0&length=20&ip_address=10.0.0").await;
    assert_eq!(page["recordsFiltered"], 4);

    let (_, page) = post_form(
        &router,
        "/domain-list",
        "start=0&length=20&ip_address=10.0.0&search=openvpn",
    )
    .await;
    assert_eq!(page["recordsFiltered"], 1);
    assert_eq!(page["data"][0]["domain"], "vpn.example.com");
}

#[tokio::test]
async fn an_unknown_org_filter_yields_zero_matches_not_an_error() {
    let (router, store) = test_state();
    seed(&store).await;

    let (status, page) = post_form(&router, "/domain-list", "start=0&length=20&org_id=999").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["recordsFiltered"], 0);
}

#[tokio::test]
async fn malformed_pagination_is_rejected_up_front() {
    let (router, store) = test_state();
    seed(&store).await;

    for body in ["start=-1&length=20", "start=0&length=0", "start=0&length=-5"] {
        let (status, response) = post_form(&router, "/domain-list", body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body {body:?}");
        assert_eq!(response["status"], "fail");
    }

    let (status, response) = post_form(&router, "/domain-list", "start=0&length=20&org_id=acme").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["status"], "fail");
}

#[tokio::test]
async fn deleting_a_domain_removes_it_exactly_once() {
    let (router, store) = test_state();
    seed(&store).await;

    let (_, page) = post_form(&router, "/domain-list", "start=0&length=20").await;
    let row = &page["data"][0];
    assert_eq!(row["domain"], "www.example.com");
    let id = row["id"].as_u64().unwrap();

    let (status, response) = post_form(&router, &format!("/domain-delete/{id}"), "").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["status"], "success");

    // The domain is gone from an unfiltered listing.
    let (_, page) = post_form(&router, "/domain-list", "start=0&length=20").await;
    assert_eq!(page["recordsFiltered"], 4);
    assert!(
        page["data"]
            .as_array()
            .unwrap()
            .iter()
            .all(|r| r["domain"] != "www.example.com")
    );

    // A second delete of the same key reports the absence.
    let (status, response) = post_form(&router, &format!("/domain-delete/{id}"), "").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(response["status"], "fail");

    // And alters nothing.
    let (_, page) = post_form(&router, "/domain-list", "start=0&length=20").await;
    assert_eq!(page["recordsFiltered"], 4);
}

#[tokio::test]
async fn every_page_window_has_the_promised_row_count() {
    let (router, store) = test_state();
    seed(&store).await;

    // rows.len() == min(length, max(0, filtered - offset)) across the set.
    for (start, length, expected) in [(0, 3, 3), (3, 3, 2), (5, 3, 0), (0, 20, 5), (4, 1, 1)] {
        let (_, page) = post_form(
            &router,
            "/domain-list",
            &format!("start={start}&length={length}"),
        )
        .await;
        assert_eq!(
            page["data"].as_array().unwrap().len(),
            expected,
            "start={start} length={length}"
        );
        assert_eq!(page["recordsFiltered"], 5);
    }
}
