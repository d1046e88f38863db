use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;

use crate::db::queries;
use crate::errors::AppError;
use crate::state::AppState;

use super::{check_auth, success};

#[derive(Deserialize)]
pub struct CustomersQuery {
    pub limit: Option<i64>,
}

// GET /api/customers
pub async fn get_customers(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<CustomersQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let customers = {
        let db = state.db.lock().unwrap();
        queries::get_customers(&db, query.limit.unwrap_or(100))?
    };
    Ok(success(customers))
}
