use actix_web::{HttpResponse, Responder, get};
use serde_json::json;

macros_utils::routes! {
    route health_route,
    route api_health_route,
}

/// Health check route
/// This route returns no content, the response status is enough.
#[get("/")]
pub async fn health_route() -> impl Responder {
    HttpResponse::Ok()
}

#[get("/api/v1/health")]
pub async fn api_health_route() -> impl Responder {
    HttpResponse::Ok().json(json!({ "message": "Server is running" }))
}
