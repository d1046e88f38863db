pub mod availability;
pub mod bookings;
pub mod customers;
pub mod deliveries;
pub mod health;
pub mod valentine;

use axum::http::HeaderMap;
use axum::Json;
use serde::Serialize;

use crate::errors::AppError;

pub(crate) fn success<T: Serialize>(data: T) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "success": true, "data": data }))
}

pub(crate) fn check_auth(headers: &HeaderMap, expected_token: &str) -> Result<(), AppError> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let token = auth.strip_prefix("Bearer ").unwrap_or("");
    if token != expected_token {
        return Err(AppError::Unauthorized);
    }
    Ok(())
}
