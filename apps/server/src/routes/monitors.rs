//! Read-only monitor endpoints: current status, windowed uptime and
//! response time, detail summary, and per-owner lists.

use actix_web::{HttpResponse, get, web};
use pulsewatch::{Monitor, Window};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

macros_utils::routes! {
    route monitor_status,
    route monitor_uptime,
    route monitor_response_time,
    route monitor_summary,
    route owner_monitors,
}

#[derive(Debug, Deserialize)]
pub struct WindowQuery {
    window: Option<String>,
}

impl WindowQuery {
    fn window(&self) -> Result<Window, ApiError> {
        match self.window.as_deref() {
            None => Ok(Window::Day),
            Some(raw) => raw.parse().map_err(ApiError::BadRequest),
        }
    }
}

#[derive(Debug, Serialize)]
struct UptimeResponse {
    window: Window,
    uptime: Option<f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ResponseTimeResponse {
    window: Window,
    average_response_time: Option<f64>,
}

async fn find_monitor(state: &AppState, id: Uuid) -> Result<Monitor, ApiError> {
    state.store.get_monitor(id).await?.ok_or(ApiError::MonitorNotFound(id))
}

#[get("/api/v1/monitors/{id}/status")]
pub async fn monitor_status(state: web::Data<AppState>, id: web::Path<Uuid>) -> Result<HttpResponse, ApiError> {
    let monitor = find_monitor(&state, id.into_inner()).await?;
    let current = state.status.get_current_status(monitor.id).await?;
    Ok(HttpResponse::Ok().json(current))
}

#[get("/api/v1/monitors/{id}/uptime")]
pub async fn monitor_uptime(
    state: web::Data<AppState>,
    id: web::Path<Uuid>,
    query: web::Query<WindowQuery>,
) -> Result<HttpResponse, ApiError> {
    let window = query.window()?;
    let monitor = find_monitor(&state, id.into_inner()).await?;
    let uptime = state.status.get_uptime(monitor.id, window).await?;

    Ok(HttpResponse::Ok().json(UptimeResponse { window, uptime }))
}

#[get("/api/v1/monitors/{id}/response-time")]
pub async fn monitor_response_time(
    state: web::Data<AppState>,
    id: web::Path<Uuid>,
    query: web::Query<WindowQuery>,
) -> Result<HttpResponse, ApiError> {
    let window = query.window()?;
    let monitor = find_monitor(&state, id.into_inner()).await?;
    let average = state.status.get_average_response_time(monitor.id, window).await?;

    Ok(HttpResponse::Ok().json(ResponseTimeResponse { window, average_response_time: average }))
}

#[get("/api/v1/monitors/{id}")]
pub async fn monitor_summary(state: web::Data<AppState>, id: web::Path<Uuid>) -> Result<HttpResponse, ApiError> {
    let monitor = find_monitor(&state, id.into_inner()).await?;
    let summary = state.status.summary(&monitor).await?;
    Ok(HttpResponse::Ok().json(summary))
}

#[get("/api/v1/owners/{owner_id}/monitors")]
pub async fn owner_monitors(state: web::Data<AppState>, owner_id: web::Path<Uuid>) -> Result<HttpResponse, ApiError> {
    let monitors = state.store.list_monitors_for_owner(owner_id.into_inner()).await?;
    let rows = state.status.overview(&monitors).await?;
    Ok(HttpResponse::Ok().json(json!(rows)))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::{App, test, web};
    use pulsewatch::{HeartbeatStore, LibsqlStore, NewHeartbeat};
    use serde_json::Value;
    use tempfile::TempDir;

    use super::*;

    async fn create_state() -> (web::Data<AppState>, TempDir) {
        let temp_dir = tempfile::tempdir().unwrap();
        let db_path = temp_dir.path().join("api.db");
        let store = LibsqlStore::open(&db_path.to_string_lossy(), 2).await.unwrap();
        (web::Data::new(AppState::new(Arc::new(store))), temp_dir)
    }

    #[actix_web::test]
    async fn test_status_and_uptime_endpoints() {
        let (state, _dir) = create_state().await;
        let monitor = Monitor::new(Uuid::new_v4(), "api", "https://api.example.com").unwrap();
        state.store.create_monitor(&monitor).await.unwrap();

        let app = test::init_service(App::new().app_data(state.clone()).configure(routes)).await;

        // No heartbeats yet
        let req = test::TestRequest::get().uri(&format!("/api/v1/monitors/{}/status", monitor.id)).to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "unknown");
        assert!(body["responseCode"].is_null());

        let req = test::TestRequest::get().uri(&format!("/api/v1/monitors/{}/uptime", monitor.id)).to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["window"], "24h");
        assert!(body["uptime"].is_null());

        state.store.append(NewHeartbeat::up(monitor.id, 120, 200)).await.unwrap();
        state.store.append(NewHeartbeat::down(monitor.id, 504, "Request timed out")).await.unwrap();

        let req = test::TestRequest::get()
            .uri(&format!("/api/v1/monitors/{}/uptime?window=7d", monitor.id))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["window"], "7d");
        assert_eq!(body["uptime"], 50.0);

        let req = test::TestRequest::get()
            .uri(&format!("/api/v1/monitors/{}/response-time?window=30d", monitor.id))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["window"], "30d");
        assert_eq!(body["averageResponseTime"], 120.0);
        assert!(body.get("uptime").is_none());

        let req = test::TestRequest::get().uri(&format!("/api/v1/monitors/{}/status", monitor.id)).to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "down");
        assert_eq!(body["responseCode"], 504);
        assert!(body["responseTime"].is_null());
    }

    #[actix_web::test]
    async fn test_unknown_monitor_and_bad_window() {
        let (state, _dir) = create_state().await;
        let monitor = Monitor::new(Uuid::new_v4(), "api", "https://api.example.com").unwrap();
        state.store.create_monitor(&monitor).await.unwrap();

        let app = test::init_service(App::new().app_data(state.clone()).configure(routes)).await;

        let req = test::TestRequest::get().uri(&format!("/api/v1/monitors/{}", Uuid::new_v4())).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 404);

        let req = test::TestRequest::get()
            .uri(&format!("/api/v1/monitors/{}/uptime?window=1y", monitor.id))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);
    }

    #[actix_web::test]
    async fn test_owner_list_and_summary() {
        let (state, _dir) = create_state().await;
        let owner = Uuid::new_v4();
        let monitor = Monitor::new(owner, "web", "https://web.example.com").unwrap();
        state.store.create_monitor(&monitor).await.unwrap();
        state.store.append(NewHeartbeat::up(monitor.id, 80, 200)).await.unwrap();

        let app = test::init_service(App::new().app_data(state.clone()).configure(routes)).await;

        let req = test::TestRequest::get().uri(&format!("/api/v1/owners/{owner}/monitors")).to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body.as_array().map(Vec::len), Some(1));
        assert_eq!(body[0]["latestStatus"], "up");
        assert_eq!(body[0]["uptime"], 100.0);

        let req = test::TestRequest::get().uri(&format!("/api/v1/monitors/{}", monitor.id)).to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["name"], "web");
        assert_eq!(body["uptime"]["last24h"], 100.0);
        assert_eq!(body["responseTimes"]["last24h"], 80.0);
        assert_eq!(body["heartbeats"].as_array().map(Vec::len), Some(1));
    }
}
