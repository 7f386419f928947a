//! REST surface tests driven through the router with `oneshot`

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::{DateTime, TimeZone, Utc};
use kpi_engine::FixedClock;
use kpi_service::{bootstrap, create_router, ServiceConfig};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

const ADMIN: (&str, &str, &str) = ("qm@acme", "QUALITY_MANAGER", "acme");
const PILOT: (&str, &str, &str) = ("pilot@acme", "PROCESS_PILOT", "acme");
const AUDITOR: (&str, &str, &str) = ("audit@acme", "AUDITOR", "acme");
const OUTSIDER: (&str, &str, &str) = ("pilot@globex", "PROCESS_PILOT", "globex");

fn at(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, day, 10, 0, 0).unwrap()
}

struct Harness {
    app: Router,
    clock: Arc<FixedClock>,
}

impl Harness {
    async fn new() -> Self {
        let clock = Arc::new(FixedClock::new(at(5)));
        let state = bootstrap(&ServiceConfig::default(), clock.clone())
            .await
            .unwrap();
        Self {
            app: create_router(state),
            clock,
        }
    }

    async fn send(
        &self,
        method: &str,
        uri: &str,
        caller: Option<(&str, &str, &str)>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some((id, role, tenant)) = caller {
            builder = builder
                .header("x-actor-id", id)
                .header("x-actor-role", role)
                .header("x-tenant-id", tenant);
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.dispatch(request).await
    }

    /// Posts `body` verbatim, for payloads `Value` cannot represent.
    async fn post_raw(
        &self,
        uri: &str,
        (id, role, tenant): (&str, &str, &str),
        body: &str,
    ) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("x-actor-id", id)
            .header("x-actor-role", role)
            .header("x-tenant-id", tenant)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.dispatch(request).await
    }

    async fn dispatch(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, body)
    }

    /// Registers process PR-ACH with a monthly and a quarterly indicator.
    /// Returns (process_id, monthly_id, quarterly_id).
    async fn seed_catalog(&self) -> (String, String, String) {
        let (status, process) = self
            .send(
                "POST",
                "/api/v1/catalog/processes",
                Some(ADMIN),
                Some(json!({ "code": "PR-ACH", "label": "Purchasing" })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        let process_id = process["id"].as_str().unwrap().to_string();

        let mut ids = Vec::new();
        for (code, frequency) in [("IND-01", "MONTHLY"), ("IND-09", "QUARTERLY")] {
            let (status, indicator) = self
                .send(
                    "POST",
                    "/api/v1/catalog/indicators",
                    Some(ADMIN),
                    Some(json!({
                        "code": code,
                        "label": format!("Indicator {}", code),
                        "unit": "%",
                        "target": 90,
                        "process_id": process_id,
                        "frequency": frequency,
                    })),
                )
                .await;
            assert_eq!(status, StatusCode::CREATED, "{}", indicator);
            ids.push(indicator["id"].as_str().unwrap().to_string());
        }

        (process_id, ids[0].clone(), ids[1].clone())
    }

    async fn save(&self, caller: (&str, &str, &str), indicator_id: &str, value: Value) -> Value {
        let (status, body) = self
            .send(
                "POST",
                "/api/v1/grid/save",
                Some(caller),
                Some(json!({
                    "month": 3,
                    "year": 2025,
                    "values": [{ "indicator_id": indicator_id, "value": value }],
                })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        body
    }
}

fn submission_uri(process_id: &str, action: &str) -> String {
    format!("/api/v1/submissions/{}/2025/3/{}", process_id, action)
}

#[tokio::test]
async fn health_reports_current_period_and_window() {
    let h = Harness::new().await;
    let (status, body) = h.send("GET", "/api/v1/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["current_period"], json!({ "year": 2025, "month": 3 }));
    assert_eq!(body["window_open"], true);
    assert_eq!(body["audit_chain_intact"], true);
}

#[tokio::test]
async fn missing_or_invalid_caller_headers_are_bad_requests() {
    let h = Harness::new().await;

    let (status, body) = h.send("GET", "/api/v1/grid", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");

    let (status, _) = h
        .send(
            "GET",
            "/api/v1/grid",
            Some(("someone", "JANITOR", "acme")),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn full_monthly_cycle() {
    let h = Harness::new().await;
    let (process_id, monthly, quarterly) = h.seed_catalog().await;

    // March closes Q1, so both indicators are due.
    let (status, grid) = h
        .send(
            "GET",
            &format!("/api/v1/grid?process_id={}&month=3&year=2025", process_id),
            Some(PILOT),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let process = &grid["processes"][0];
    assert_eq!(process["status"], "DRAFT");
    assert_eq!(process["window_open"], true);
    assert_eq!(process["completion"], json!({ "due": 2, "filled": 0 }));
    assert!(process["rows"]
        .as_array()
        .unwrap()
        .iter()
        .all(|row| row["editable"] == true));

    let saved = h.save(PILOT, &monthly, json!("92,5")).await;
    assert_eq!(saved["saved"], 1);
    assert_eq!(saved["results"][0]["value"], 92.5);
    let saved = h.save(PILOT, &quarterly, json!(88)).await;
    assert_eq!(saved["saved"], 1);

    let (status, submitted) = h
        .send("POST", &submission_uri(&process_id, "submit"), Some(PILOT), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(submitted["status"], "SUBMITTED");

    let (status, body) = h
        .send("POST", &submission_uri(&process_id, "submit"), Some(PILOT), None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "INVALID_TRANSITION");
    assert_eq!(body["details"]["from"], "SUBMITTED");

    // Locked while submitted.
    let saved = h.save(PILOT, &monthly, json!(95)).await;
    assert_eq!(saved["saved"], 0);
    assert_eq!(saved["results"][0]["error_code"], "EDIT_NOT_PERMITTED");

    let (status, validated) = h
        .send(
            "POST",
            &submission_uri(&process_id, "validate"),
            Some(ADMIN),
            Some(json!({ "note": "ok" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(validated["status"], "VALIDATED");
    assert_eq!(validated["surfaced_status"], "VALIDATED");

    let (status, trail) = h
        .send("GET", &submission_uri(&process_id, "audit"), Some(AUDITOR), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let kinds: Vec<&str> = trail
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["event"]["kind"].as_str().unwrap())
        .collect();
    assert_eq!(
        kinds,
        ["value_recorded", "value_recorded", "status_changed", "status_changed"]
    );
}

#[tokio::test]
async fn values_are_refused_outside_the_window_and_submit_is_locked() {
    let h = Harness::new().await;
    let (process_id, monthly, _) = h.seed_catalog().await;
    h.save(PILOT, &monthly, json!(91)).await;

    h.clock.set(at(15));

    let saved = h.save(PILOT, &monthly, json!(93)).await;
    assert_eq!(saved["saved"], 0);
    assert_eq!(saved["results"][0]["error_code"], "EDIT_NOT_PERMITTED");

    let (status, body) = h
        .send("POST", &submission_uri(&process_id, "submit"), Some(PILOT), None)
        .await;
    assert_eq!(status, StatusCode::LOCKED);
    assert_eq!(body["code"], "WINDOW_CLOSED");
    assert_eq!(body["details"]["day"], 15);

    // Administrators may still correct the value.
    let saved = h.save(ADMIN, &monthly, json!(93)).await;
    assert_eq!(saved["saved"], 1);
}

#[tokio::test]
async fn rejection_is_surfaced_until_resubmitted() {
    let h = Harness::new().await;
    let (process_id, monthly, _) = h.seed_catalog().await;
    h.save(PILOT, &monthly, json!(70)).await;
    h.send("POST", &submission_uri(&process_id, "submit"), Some(PILOT), None)
        .await;

    let (status, rejected) = h
        .send(
            "POST",
            &submission_uri(&process_id, "reject"),
            Some(ADMIN),
            Some(json!({ "note": "IND-01 looks wrong" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rejected["status"], "DRAFT");
    assert_eq!(rejected["surfaced_status"], "REJECTED");

    let (_, grid) = h
        .send(
            "GET",
            &format!("/api/v1/grid?process_id={}", process_id),
            Some(PILOT),
            None,
        )
        .await;
    assert_eq!(grid["processes"][0]["status"], "REJECTED");
    assert_eq!(grid["processes"][0]["rejection_note"], "IND-01 looks wrong");

    // The pilot corrects and resubmits.
    assert_eq!(h.save(PILOT, &monthly, json!(91)).await["saved"], 1);
    let (status, resubmitted) = h
        .send("POST", &submission_uri(&process_id, "submit"), Some(PILOT), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resubmitted["surfaced_status"], "SUBMITTED");
}

#[tokio::test]
async fn pilots_cannot_approve_and_auditors_cannot_write() {
    let h = Harness::new().await;
    let (process_id, monthly, _) = h.seed_catalog().await;
    h.save(PILOT, &monthly, json!(95)).await;
    h.send("POST", &submission_uri(&process_id, "submit"), Some(PILOT), None)
        .await;

    let (status, body) = h
        .send("POST", &submission_uri(&process_id, "validate"), Some(PILOT), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "NOT_AUTHORIZED");

    let (status, _) = h
        .send(
            "POST",
            "/api/v1/catalog/processes",
            Some(AUDITOR),
            Some(json!({ "code": "PR-X", "label": "X" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn other_tenants_see_nothing() {
    let h = Harness::new().await;
    let (process_id, monthly, _) = h.seed_catalog().await;

    let (status, body) = h
        .send(
            "GET",
            &format!("/api/v1/grid?process_id={}&month=3&year=2025", process_id),
            Some(OUTSIDER),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");

    let (_, processes) = h
        .send("GET", "/api/v1/catalog/processes", Some(OUTSIDER), None)
        .await;
    assert_eq!(processes, json!([]));

    let saved = h.save(OUTSIDER, &monthly, json!(50)).await;
    assert_eq!(saved["results"][0]["error_code"], "NOT_FOUND");
}

#[tokio::test]
async fn invalid_periods_and_values_are_unprocessable() {
    let h = Harness::new().await;
    let (_, monthly, _) = h.seed_catalog().await;

    let (status, body) = h
        .send("GET", "/api/v1/grid?month=13&year=2025", Some(PILOT), None)
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "INVALID_PERIOD");

    let (status, _) = h
        .send("GET", "/api/v1/grid?month=3", Some(PILOT), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let saved = h.save(PILOT, &monthly, json!("n/a")).await;
    assert_eq!(saved["results"][0]["error_code"], "INVALID_VALUE");
}

#[tokio::test]
async fn non_numeric_values_fail_per_item_in_a_bulk_save() {
    let h = Harness::new().await;
    let (_, monthly, quarterly) = h.seed_catalog().await;

    let (status, body) = h
        .send(
            "POST",
            "/api/v1/grid/save",
            Some(PILOT),
            Some(json!({
                "month": 3,
                "year": 2025,
                "values": [
                    { "indicator_id": monthly, "value": 91 },
                    { "indicator_id": quarterly, "value": null },
                    { "indicator_id": quarterly, "value": true },
                    { "indicator_id": quarterly, "value": { "x": 1 } },
                ],
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["saved"], 1);
    assert_eq!(body["failed"], 3);
    assert_eq!(body["results"][0]["saved"], true);
    for i in 1..4 {
        assert_eq!(body["results"][i]["error_code"], "INVALID_VALUE");
    }
}

#[tokio::test]
async fn malformed_query_path_and_body_get_the_error_body() {
    let h = Harness::new().await;
    let (process_id, monthly, _) = h.seed_catalog().await;

    let (status, body) = h
        .send("GET", "/api/v1/grid?month=abc&year=2025", Some(PILOT), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");

    let (status, body) = h
        .send("GET", "/api/v1/matrix?year=next", Some(PILOT), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");

    let uri = format!("/api/v1/submissions/{}/twenty/3", process_id);
    let (status, body) = h.send("GET", &uri, Some(PILOT), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");

    let (status, body) = h
        .send(
            "POST",
            "/api/v1/grid/save",
            Some(PILOT),
            Some(json!({ "month": 3, "year": 2025 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");

    // Out of f64 range: the JSON itself is refused before any item is read.
    let raw = format!(
        r#"{{"month":3,"year":2025,"values":[{{"indicator_id":"{}","value":1e400}}]}}"#,
        monthly
    );
    let (status, body) = h.post_raw("/api/v1/grid/save", PILOT, &raw).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn annual_matrix_reports_cells_and_summary() {
    let h = Harness::new().await;
    let (process_id, monthly, _) = h.seed_catalog().await;
    h.save(PILOT, &monthly, json!(85)).await;

    let (status, matrix) = h
        .send(
            "GET",
            &format!("/api/v1/matrix?process_id={}&year=2025", process_id),
            Some(AUDITOR),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(matrix["year"], 2025);

    let rows = matrix["processes"][0]["rows"].as_array().unwrap();
    let row = rows.iter().find(|r| r["code"] == "IND-01").unwrap();
    let cells = row["cells"].as_array().unwrap();
    assert_eq!(cells.len(), 12);
    assert_eq!(cells[2]["actual"], 85.0);
    assert_eq!(cells[2]["conforms"], false);
    assert_eq!(cells[2]["status"], "DRAFT");
    assert_eq!(cells[0]["actual"], Value::Null);
    assert_eq!(row["summary"]["filled"], 1);
}

#[tokio::test]
async fn deactivated_indicators_leave_the_grid() {
    let h = Harness::new().await;
    let (process_id, monthly, _) = h.seed_catalog().await;

    let (status, updated) = h
        .send(
            "PUT",
            &format!("/api/v1/catalog/indicators/{}", monthly),
            Some(ADMIN),
            Some(json!({ "target": 95, "direction": "LOWER_IS_BETTER" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", updated);
    assert_eq!(updated["target"], 95.0);

    let (status, deactivated) = h
        .send(
            "POST",
            &format!("/api/v1/catalog/indicators/{}/deactivate", monthly),
            Some(ADMIN),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deactivated["active"], false);

    let (_, grid) = h
        .send(
            "GET",
            &format!("/api/v1/grid?process_id={}", process_id),
            Some(PILOT),
            None,
        )
        .await;
    let rows = grid["processes"][0]["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["code"], "IND-09");
}
