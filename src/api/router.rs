//! HTTP router.
//!
//! Returns a composable `Router` that can be mounted on any axum server.
//! JSON routes are nested under `/api/`; snapshot listeners live under
//! `/ws/`.
//!
//! Middleware stack (outermost → innermost):
//! 1. Context extension → 2. CORS → 3. Access log

use std::sync::Arc;

use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::ApiContext;
use crate::api::websocket;
use crate::core_state::CoreState;

/// Build the API router.
///
/// Middleware uses `Extension<ApiContext>` (injected as the outermost layer).
/// Endpoint handlers use `State<ApiContext>` (provided via `with_state`).
pub fn api_router(core: Arc<CoreState>) -> Router {
    let ctx = ApiContext::new(core);

    // NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
    let api = Router::new()
        .route("/health", get(endpoints::health::check))
        .route("/dashboard", get(endpoints::dashboard::overview))
        .route("/status-badges", get(endpoints::badges::table))
        // Raw collections
        .route(
            "/collections/:collection",
            get(endpoints::collections::list).post(endpoints::collections::create),
        )
        .route("/collections/:collection/query", post(endpoints::collections::query))
        .route("/collections/:collection/batch", post(endpoints::collections::batch))
        .route(
            "/collections/:collection/:id",
            get(endpoints::collections::get)
                .patch(endpoints::collections::patch)
                .delete(endpoints::collections::delete),
        )
        // Waiting list
        .route(
            "/waiting-list",
            get(endpoints::waiting_list::list).post(endpoints::waiting_list::add),
        )
        .route("/waiting-list/stats", get(endpoints::waiting_list::stats))
        .route("/waiting-list/estimate", post(endpoints::waiting_list::estimate))
        .route("/waiting-list/:id", axum::routing::delete(endpoints::waiting_list::remove))
        .route("/waiting-list/:id/move", post(endpoints::waiting_list::move_entry))
        .route("/waiting-list/:id/status", put(endpoints::waiting_list::set_status))
        .route("/waiting-list/:id/call", post(endpoints::waiting_list::call))
        .route("/waiting-list/:id/no-response", post(endpoints::waiting_list::no_response))
        .route("/waiting-list/:id/recall", post(endpoints::waiting_list::recall))
        .route("/waiting-list/:id/seen", post(endpoints::waiting_list::seen))
        .route("/waiting-list/:id/remind", post(endpoints::waiting_list::remind))
        // Appointments
        .route("/appointments", get(endpoints::appointments::list))
        .route("/appointments/:id/status", put(endpoints::appointments::set_status))
        // Pharmacy
        .route("/pharmacy/alerts", get(endpoints::pharmacy::alerts))
        .route("/prescriptions/:id/dispense", post(endpoints::pharmacy::dispense))
        // Billing
        .route("/invoices", post(endpoints::billing::create_invoice))
        .route("/invoices/mark-overdue", post(endpoints::billing::mark_overdue))
        .route("/invoices/:id/payments", post(endpoints::billing::record_payment))
        .route("/billing/summary", get(endpoints::billing::summary))
        .route("/claims/:id/submit", post(endpoints::billing::submit_claim))
        .route("/claims/:id/decision", post(endpoints::billing::decide_claim))
        // Staff
        .route("/staff", get(endpoints::staff::list))
        .route("/staff/on-duty", get(endpoints::staff::on_duty))
        // Listeners
        .route("/listeners", get(endpoints::listeners::count))
        .route("/listeners/unsubscribe-all", post(endpoints::listeners::unsubscribe_all));

    let ws_routes = Router::new().route("/ws/collections/:collection", get(websocket::ws_subscribe));

    Router::new()
        .nest("/api", api)
        .merge(ws_routes)
        .with_state(ctx.clone())
        // Middleware stack (innermost first, outermost last):
        .layer(axum::middleware::from_fn(middleware::audit::log_access))
        .layer(CorsLayer::permissive())
        // Extension must be outermost so middleware can extract ApiContext
        .layer(axum::Extension(ctx))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use chrono::Utc;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::config::Config;
    use crate::db::DocumentStore;
    use crate::demo::seed_demo_data;
    use crate::models::enums::Collection;

    fn empty_core() -> Arc<CoreState> {
        Arc::new(CoreState::with_store(
            DocumentStore::open_in_memory().unwrap(),
            Config::default(),
        ))
    }

    fn seeded_core() -> Arc<CoreState> {
        let store = DocumentStore::open_in_memory().unwrap();
        let now = Utc::now();
        seed_demo_data(&store, now.date_naive(), now).unwrap();
        Arc::new(CoreState::with_store(store, Config::default()))
    }

    fn make_request(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
        let builder = Request::builder().method(method).uri(uri);
        match body {
            Some(json) => builder
                .header("Content-Type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn send(core: &Arc<CoreState>, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let response = api_router(core.clone())
            .oneshot(make_request(method, uri, body))
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), 1 << 20).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    async fn send_raw(core: &Arc<CoreState>, method: &str, uri: &str, content_type: Option<&str>, body: &str) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(content_type) = content_type {
            builder = builder.header("Content-Type", content_type);
        }
        let response = api_router(core.clone())
            .oneshot(builder.body(Body::from(body.to_string())).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), 1 << 20).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn assert_bad_request(status: StatusCode, body: &Value) {
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "BAD_REQUEST");
        assert!(body["error"]["message"].is_string());
    }

    fn patient(first: &str) -> Value {
        json!({ "firstName": first, "lastName": "Test" })
    }

    // ─── Health & misc ──────────────────────────────────────

    #[tokio::test]
    async fn health_reports_ok() {
        let core = empty_core();
        let (status, body) = send(&core, "GET", "/api/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["demo"], false);
        assert_eq!(body["activeListeners"], 0);
    }

    #[tokio::test]
    async fn requests_are_counted_by_access_log() {
        let core = empty_core();
        send(&core, "GET", "/api/health", None).await;
        send(&core, "GET", "/api/dashboard", None).await;
        assert_eq!(core.requests_served(), 2);
    }

    #[tokio::test]
    async fn unknown_route_returns_404() {
        let core = empty_core();
        let (status, _) = send(&core, "GET", "/api/nonexistent", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn status_badges_cover_every_kind() {
        let core = empty_core();
        let (status, body) = send(&core, "GET", "/api/status-badges", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["waitingStatus"]["no-response"]["tone"], "danger");
        assert!(body["invoiceStatus"]["overdue"].is_object());
    }

    #[tokio::test]
    async fn dashboard_on_seeded_store() {
        let core = seeded_core();
        let (status, body) = send(&core, "GET", "/api/dashboard", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["queue"]["total"], 3);
        assert!(body["patients"].as_u64().unwrap() > 0);
    }

    // ─── Raw collections ────────────────────────────────────

    #[tokio::test]
    async fn collection_crud_round() {
        let core = empty_core();
        let (status, created) = send(&core, "POST", "/api/collections/patients", Some(patient("Ali"))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["version"], 1);
        let id = created["id"].as_str().unwrap().to_string();

        let (status, fetched) = send(&core, "GET", &format!("/api/collections/patients/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched["firstName"], "Ali");

        let (status, patched) = send(
            &core,
            "PATCH",
            &format!("/api/collections/patients/{id}"),
            Some(json!({ "phone": "+20 100 555 0199" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(patched["version"], 2);
        assert_eq!(patched["firstName"], "Ali");

        let (status, _) = send(&core, "DELETE", &format!("/api/collections/patients/{id}"), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, body) = send(&core, "GET", &format!("/api/collections/patients/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn unknown_collection_is_404() {
        let core = empty_core();
        let (status, body) = send(&core, "GET", "/api/collections/secrets", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn create_rejects_invalid_documents() {
        let core = empty_core();
        let (status, body) = send(
            &core,
            "POST",
            "/api/collections/waitingList",
            Some(json!({ "patientName": "Ali", "status": "lost" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "BAD_REQUEST");

        let (status, _) = send(&core, "POST", "/api/collections/patients", Some(json!([1, 2]))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(core.store().count(Collection::WaitingList).unwrap(), 0);
    }

    #[tokio::test]
    async fn patch_with_stale_version_conflicts() {
        let core = empty_core();
        let doc = core.store().create(Collection::Patients, patient("Ali")).unwrap();
        core.store()
            .update(Collection::Patients, &doc.id, json!({ "phone": "1" }), None)
            .unwrap();

        let (status, body) = send(
            &core,
            "PATCH",
            &format!("/api/collections/patients/{}?expectedVersion=1", doc.id),
            Some(json!({ "phone": "2" })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "VERSION_CONFLICT");
    }

    #[tokio::test]
    async fn patch_that_breaks_the_record_is_refused() {
        let core = empty_core();
        let doc = core.store().create(Collection::Patients, patient("Ali")).unwrap();
        let (status, _) = send(
            &core,
            "PATCH",
            &format!("/api/collections/patients/{}", doc.id),
            Some(json!({ "firstName": 42 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(core.store().get_by_id(Collection::Patients, &doc.id).unwrap().version, 1);
    }

    #[tokio::test]
    async fn query_filters_and_orders() {
        let core = empty_core();
        for name in ["Youssef", "Ali", "Mariam"] {
            core.store().create(Collection::Patients, patient(name)).unwrap();
        }
        let (status, body) = send(
            &core,
            "POST",
            "/api/collections/patients/query",
            Some(json!({
                "filters": [{ "field": "firstName", "op": "!=", "value": "Mariam" }],
                "orderBy": [{ "field": "firstName", "direction": "asc" }]
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let names: Vec<&str> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|d| d["firstName"].as_str().unwrap())
            .collect();
        assert_eq!(names, ["Ali", "Youssef"]);
    }

    #[tokio::test]
    async fn query_with_bad_field_path_is_400() {
        let core = empty_core();
        let (status, _) = send(
            &core,
            "POST",
            "/api/collections/patients/query",
            Some(json!({ "filters": [{ "field": "x'); DROP", "op": "==", "value": 1 }] })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn batch_commits_all_or_nothing() {
        let core = empty_core();
        let keep = core.store().create(Collection::Patients, patient("Ali")).unwrap();

        let (status, body) = send(
            &core,
            "POST",
            "/api/collections/patients/batch",
            Some(json!({ "writes": [
                { "op": "create", "data": patient("Mariam") },
                { "op": "update", "id": keep.id, "patch": { "phone": "1" } },
            ]})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 2);
        assert_eq!(core.store().count(Collection::Patients).unwrap(), 2);

        let (status, _) = send(
            &core,
            "POST",
            "/api/collections/patients/batch",
            Some(json!({ "writes": [
                { "op": "create", "data": patient("Nadia") },
                { "op": "delete", "id": "missing" },
            ]})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(core.store().count(Collection::Patients).unwrap(), 2);
    }

    // ─── Waiting list ───────────────────────────────────────

    fn new_entry(name: &str, priority: &str) -> Value {
        json!({ "patientId": format!("p-{name}"), "patientName": name, "priority": priority })
    }

    async fn queue_ids(core: &Arc<CoreState>) -> Vec<String> {
        let (_, body) = send(core, "GET", "/api/waiting-list", None).await;
        body["entries"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["id"].as_str().unwrap().to_string())
            .collect()
    }

    #[tokio::test]
    async fn waiting_list_add_and_list() {
        let core = empty_core();
        let (status, entry) = send(&core, "POST", "/api/waiting-list", Some(new_entry("Ali", "high"))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(entry["position"], 1);
        assert_eq!(entry["status"], "waiting");
        assert_eq!(entry["priorityBadge"]["label"], "High");

        send(&core, "POST", "/api/waiting-list", Some(new_entry("Mariam", "urgent"))).await;
        let (status, body) = send(&core, "GET", "/api/waiting-list?sort=priority", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["entries"][0]["patientName"], "Mariam");
        assert_eq!(body["stats"]["waiting"], 2);
        assert_eq!(body["stats"]["urgentWaiting"], 1);
    }

    #[tokio::test]
    async fn waiting_list_rejects_bad_filters() {
        let core = empty_core();
        let (status, body) = send(&core, "GET", "/api/waiting-list?status=gone", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "BAD_REQUEST");
        let (status, _) = send(&core, "GET", "/api/waiting-list?sort=alphabetical", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = send(&core, "GET", "/api/waiting-list?status=all", None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn waiting_list_move_and_remove() {
        let core = empty_core();
        for name in ["Ali", "Mariam", "Youssef"] {
            send(&core, "POST", "/api/waiting-list", Some(new_entry(name, "medium"))).await;
        }
        let ids = queue_ids(&core).await;

        let (status, body) = send(
            &core,
            "POST",
            &format!("/api/waiting-list/{}/move", ids[2]),
            Some(json!({ "direction": "up" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["moved"], true);
        assert_eq!(body["entries"][1]["id"], ids[2].as_str());
        assert_eq!(body["entries"][1]["position"], 2);

        let (_, body) = send(
            &core,
            "POST",
            &format!("/api/waiting-list/{}/move", ids[0]),
            Some(json!({ "direction": "up" })),
        )
        .await;
        assert_eq!(body["moved"], false);

        let (status, _) = send(&core, "DELETE", &format!("/api/waiting-list/{}", ids[0]), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (_, body) = send(&core, "GET", "/api/waiting-list", None).await;
        let positions: Vec<u64> = body["entries"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["position"].as_u64().unwrap())
            .collect();
        assert_eq!(positions, [1, 2]);
    }

    #[tokio::test]
    async fn waiting_list_status_actions() {
        let core = empty_core();
        send(&core, "POST", "/api/waiting-list", Some(new_entry("Ali", "low"))).await;
        let id = queue_ids(&core).await.remove(0);

        let (status, body) = send(&core, "POST", &format!("/api/waiting-list/{id}/call"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "called");
        assert!(body["calledAt"].is_string());

        let (_, body) = send(&core, "POST", &format!("/api/waiting-list/{id}/no-response"), None).await;
        assert_eq!(body["status"], "no-response");
        let (_, body) = send(&core, "POST", &format!("/api/waiting-list/{id}/recall"), None).await;
        assert_eq!(body["status"], "called");
        let (_, body) = send(&core, "POST", &format!("/api/waiting-list/{id}/remind"), None).await;
        assert_eq!(body["remindersSent"], 1);

        let (status, body) = send(
            &core,
            "PUT",
            &format!("/api/waiting-list/{id}/status"),
            Some(json!({ "status": "seen" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "seen");

        let (status, _) = send(
            &core,
            "PUT",
            &format!("/api/waiting-list/{id}/status"),
            Some(json!({ "status": "teleported" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(&core, "POST", "/api/waiting-list/nobody/call", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn waiting_list_estimates_use_config_default() {
        let core = empty_core();
        for name in ["Ali", "Mariam"] {
            send(&core, "POST", "/api/waiting-list", Some(new_entry(name, "medium"))).await;
        }
        let (status, body) = send(&core, "POST", "/api/waiting-list/estimate", Some(json!({}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["entries"][0]["estimatedWaitTime"], 15);
        assert_eq!(body["entries"][1]["estimatedWaitTime"], 30);

        let (_, body) = send(
            &core,
            "POST",
            "/api/waiting-list/estimate",
            Some(json!({ "minutesPerPatient": 10 })),
        )
        .await;
        assert_eq!(body["entries"][1]["estimatedWaitTime"], 20);

        let (status, stats) = send(&core, "GET", "/api/waiting-list/stats", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(stats["averageEstimatedWait"], 15);
    }

    // ─── Appointments, pharmacy, billing, staff ─────────────

    #[tokio::test]
    async fn appointments_list_and_status() {
        let core = seeded_core();
        let today = Utc::now().date_naive().format("%Y-%m-%d").to_string();
        let (status, body) = send(&core, "GET", &format!("/api/appointments?date={today}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["stats"]["total"], 4);

        let scheduled = body["appointments"]
            .as_array()
            .unwrap()
            .iter()
            .find(|a| a["status"] == "scheduled")
            .unwrap();
        let id = scheduled["id"].as_str().unwrap();
        let (status, body) = send(
            &core,
            "PUT",
            &format!("/api/appointments/{id}/status"),
            Some(json!({ "status": "in-progress" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "in-progress");

        let (status, _) = send(&core, "GET", "/api/appointments?date=yesterday", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn pharmacy_alerts_and_dispense() {
        let core = seeded_core();
        let (status, body) = send(&core, "GET", "/api/pharmacy/alerts?days=30", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["outOfStock"].as_array().unwrap().len(), 1);

        let (_, pending) = send(
            &core,
            "POST",
            "/api/collections/prescriptions/query",
            Some(json!({ "filters": [{ "field": "status", "op": "==", "value": "pending" }] })),
        )
        .await;
        let id = pending[0]["id"].as_str().unwrap().to_string();

        let (status, body) = send(&core, "POST", &format!("/api/prescriptions/{id}/dispense"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "dispensed");

        let (status, body) = send(&core, "POST", &format!("/api/prescriptions/{id}/dispense"), None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "CONFLICT");
    }

    #[tokio::test]
    async fn invoice_payment_and_summary() {
        let core = empty_core();
        let (status, invoice) = send(
            &core,
            "POST",
            "/api/invoices",
            Some(json!({
                "patientId": "p-1",
                "patientName": "Ali Ahmed",
                "items": [{ "description": "Consultation", "quantity": 1, "unitPrice": 100.0 }],
                "taxRate": 0.1
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(invoice["total"], 110.0);
        let id = invoice["id"].as_str().unwrap().to_string();

        let (status, body) = send(
            &core,
            "POST",
            &format!("/api/invoices/{id}/payments"),
            Some(json!({ "amount": 110.0, "method": "cash" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["invoice"]["status"], "paid");
        assert_eq!(body["payment"]["amount"], 110.0);

        let (status, summary) = send(&core, "GET", "/api/billing/summary", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(summary["collected"], 110.0);
        assert_eq!(summary["outstanding"], 0.0);

        let (status, body) = send(&core, "POST", "/api/invoices/mark-overdue", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["markedOverdue"].as_array().unwrap().is_empty());

        let (status, _) = send(
            &core,
            "POST",
            "/api/invoices",
            Some(json!({ "patientId": "p-1", "patientName": "Ali", "items": [] })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn claim_submit_then_decide() {
        let core = seeded_core();
        let (_, claims) = send(&core, "GET", "/api/collections/insuranceClaims", None).await;
        let id = claims[0]["id"].as_str().unwrap().to_string();

        let (status, _) = send(
            &core,
            "POST",
            &format!("/api/claims/{id}/decision"),
            Some(json!({ "approved": true })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, body) = send(&core, "POST", &format!("/api/claims/{id}/submit"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "submitted");

        let (status, body) = send(
            &core,
            "POST",
            &format!("/api/claims/{id}/decision"),
            Some(json!({ "approved": true, "approvedAmount": 40.0 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["approvedAmount"], 40.0);
    }

    #[tokio::test]
    async fn staff_directory_filters() {
        let core = seeded_core();
        let (status, body) = send(&core, "GET", "/api/staff?role=doctor", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["members"].as_array().unwrap().len(), 2);
        assert_eq!(body["byDepartment"]["Cardiology"], 1);

        let (status, _) = send(&core, "GET", "/api/staff?role=wizard", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(&core, "GET", "/api/staff/on-duty?day=sun", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.as_array().unwrap().is_empty());
        let (_, body) = send(&core, "GET", "/api/staff/on-duty?day=mon", None).await;
        assert_eq!(body.as_array().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn listener_admin_with_no_listeners() {
        let core = empty_core();
        let (status, body) = send(&core, "GET", "/api/listeners", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["activeListeners"], 0);

        let _held = core.store().subscribe(Collection::Patients);
        let (_, body) = send(&core, "POST", "/api/listeners/unsubscribe-all", None).await;
        assert_eq!(body["cancelled"], 1);
    }

    // ─── Rejected input ─────────────────────────────────────

    #[tokio::test]
    async fn bodies_that_do_not_deserialize_get_the_error_body() {
        let core = empty_core();
        send(&core, "POST", "/api/waiting-list", Some(new_entry("Ali", "low"))).await;
        let id = queue_ids(&core).await.remove(0);

        let (status, body) = send(
            &core,
            "POST",
            &format!("/api/waiting-list/{id}/move"),
            Some(json!({ "direction": "sideways" })),
        )
        .await;
        assert_bad_request(status, &body);

        let (status, body) = send(&core, "POST", "/api/waiting-list", Some(json!({ "patientName": "A" }))).await;
        assert_bad_request(status, &body);
        assert_eq!(queue_ids(&core).await.len(), 1);

        let (status, body) = send_raw(&core, "POST", "/api/waiting-list", Some("application/json"), "{not json").await;
        assert_bad_request(status, &body);

        let (status, body) = send_raw(&core, "POST", "/api/waiting-list", None, "{}").await;
        assert_bad_request(status, &body);
    }

    #[tokio::test]
    async fn query_strings_that_do_not_deserialize_get_the_error_body() {
        let core = empty_core();
        let (_, created) = send(&core, "POST", "/api/collections/patients", Some(patient("Ali"))).await;
        let id = created["id"].as_str().unwrap();

        let (status, body) = send(
            &core,
            "PATCH",
            &format!("/api/collections/patients/{id}?expectedVersion=abc"),
            Some(json!({ "phone": "555" })),
        )
        .await;
        assert_bad_request(status, &body);

        let (status, body) = send(&core, "GET", "/api/pharmacy/alerts?days=soon", None).await;
        assert_bad_request(status, &body);
    }

    #[tokio::test]
    async fn expiry_window_is_bounded() {
        let core = seeded_core();
        let (status, body) = send(&core, "GET", "/api/pharmacy/alerts?days=1000000000000", None).await;
        assert_bad_request(status, &body);
        let (status, body) = send(&core, "GET", "/api/pharmacy/alerts?days=-1", None).await;
        assert_bad_request(status, &body);
        let (status, _) = send(&core, "GET", "/api/pharmacy/alerts?days=3650", None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn huge_minutes_per_patient_is_refused() {
        let core = empty_core();
        for name in ["Ali", "Mariam"] {
            send(&core, "POST", "/api/waiting-list", Some(new_entry(name, "medium"))).await;
        }
        let (status, body) = send(
            &core,
            "POST",
            "/api/waiting-list/estimate",
            Some(json!({ "minutesPerPatient": 4294967295u32 })),
        )
        .await;
        assert_bad_request(status, &body);

        let (status, body) = send(
            &core,
            "POST",
            "/api/waiting-list/estimate",
            Some(json!({ "minutesPerPatient": 1440 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["entries"][1]["estimatedWaitTime"], 2880);
    }

    #[tokio::test]
    async fn add_after_maxed_position_is_a_conflict_not_a_crash() {
        let core = empty_core();
        send(&core, "POST", "/api/waiting-list", Some(new_entry("Ali", "low"))).await;
        let id = queue_ids(&core).await.remove(0);
        let (status, _) = send(
            &core,
            "PATCH",
            &format!("/api/collections/waitingList/{id}"),
            Some(json!({ "position": 4294967295u32 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(&core, "POST", "/api/waiting-list", Some(new_entry("Mariam", "low"))).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "CONFLICT");
    }

    #[tokio::test]
    async fn overflowing_prescription_is_refused() {
        let core = empty_core();
        let (_, med) = send(
            &core,
            "POST",
            "/api/collections/medications",
            Some(json!({
                "name": "Amoxicillin",
                "dosageForm": "capsule",
                "strength": "500mg",
                "stockQuantity": 40,
                "reorderLevel": 10,
                "unitPrice": 0.4
            })),
        )
        .await;
        let med_id = med["id"].as_str().unwrap();
        let line = |quantity: u32| {
            json!({
                "medicationId": med_id,
                "name": "Amoxicillin",
                "dosage": "500mg",
                "frequency": "3x daily",
                "duration": "7 days",
                "quantity": quantity
            })
        };
        let (status, rx) = send(
            &core,
            "POST",
            "/api/collections/prescriptions",
            Some(json!({
                "patientId": "p-1",
                "patientName": "Ali Ahmed",
                "doctorId": "d-1",
                "doctorName": "Dr. Sami",
                "medications": [line(u32::MAX), line(1)],
                "status": "pending",
                "issuedDate": "2026-06-01"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let rx_id = rx["id"].as_str().unwrap();

        let (status, body) = send(&core, "POST", &format!("/api/prescriptions/{rx_id}/dispense"), None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "CONFLICT");
        let (_, med) = send(&core, "GET", &format!("/api/collections/medications/{med_id}"), None).await;
        assert_eq!(med["stockQuantity"], 40);
    }
}
