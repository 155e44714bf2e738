use actix_web::HttpResponse;
use serde::Serialize;
use serde_json::json;

pub mod leave;
pub mod stats;

/// Success envelope: `{"data": ...}`.
pub fn success<T: Serialize>(data: &T) -> HttpResponse {
    HttpResponse::Ok().json(json!({ "data": data }))
}

/// Success envelope with a human-readable message.
pub fn success_with<T: Serialize>(data: &T, message: &str) -> HttpResponse {
    HttpResponse::Ok().json(json!({ "data": data, "message": message }))
}
