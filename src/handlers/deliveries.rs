use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use chrono::{NaiveDate, Utc};
use serde::Deserialize;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::slot::parse_date;
use crate::models::{Delivery, DeliveryStatus};
use crate::state::AppState;

use super::{check_auth, success};

// GET /api/deliveries
#[derive(Deserialize)]
pub struct DeliveriesQuery {
    pub status: Option<String>,
    pub limit: Option<i64>,
}

pub async fn get_deliveries(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<DeliveriesQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let today = Utc::now().date_naive();
    // "overdue" is a view over pending rows, not a stored status
    let (filter, overdue_only) = match query.status.as_deref() {
        None => (None, false),
        Some("overdue") => (Some(DeliveryStatus::Pending), true),
        Some(s) => {
            let status = DeliveryStatus::parse(s).ok_or_else(|| {
                AppError::Validation(format!("estado de entrega desconocido: {s}"))
            })?;
            (Some(status), false)
        }
    };

    let deliveries = {
        let db = state.db.lock().unwrap();
        queries::get_deliveries(&db, filter, query.limit.unwrap_or(100))?
    };

    let rows = deliveries
        .iter()
        .filter(|d| !overdue_only || d.effective_status(today) == "overdue")
        .map(|d| delivery_json(d, today))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(success(rows))
}

// POST /api/deliveries
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDeliveryRequest {
    pub customer_email: String,
    pub description: String,
    pub scheduled_date: String,
    #[serde(default)]
    pub photos: Vec<String>,
}

pub async fn create_delivery(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<CreateDeliveryRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    if !body.customer_email.contains('@') {
        return Err(AppError::Validation("el email no es válido".to_string()));
    }
    if body.description.trim().is_empty() {
        return Err(AppError::Validation(
            "la descripción es obligatoria".to_string(),
        ));
    }
    parse_date(&body.scheduled_date).map_err(|e| AppError::Validation(e.to_string()))?;

    let delivery = Delivery {
        id: uuid::Uuid::new_v4().to_string(),
        customer_email: body.customer_email,
        description: body.description,
        scheduled_date: body.scheduled_date,
        status: DeliveryStatus::Pending,
        photos: body.photos,
        created_at: Utc::now().naive_utc(),
        ready_at: None,
        completed_at: None,
        delivered_at: None,
    };

    {
        let db = state.db.lock().unwrap();
        queries::create_delivery(&db, &delivery)?;
    }

    Ok(success(delivery_json(&delivery, Utc::now().date_naive())?))
}

// GET /api/deliveries/:id
pub async fn get_delivery(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let delivery = {
        let db = state.db.lock().unwrap();
        queries::get_delivery_by_id(&db, &id)?
    }
    .ok_or_else(|| AppError::NotFound(format!("entrega {id}")))?;

    Ok(success(delivery_json(&delivery, Utc::now().date_naive())?))
}

// POST /api/deliveries/:id/status
#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

pub async fn update_status(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<UpdateStatusRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let to = DeliveryStatus::parse(&body.status).ok_or_else(|| {
        AppError::Validation(format!("estado de entrega desconocido: {}", body.status))
    })?;

    let delivery = {
        let db = state.db.lock().unwrap();
        let mut delivery = queries::get_delivery_by_id(&db, &id)?
            .ok_or_else(|| AppError::NotFound(format!("entrega {id}")))?;

        delivery.transition(to, Utc::now().naive_utc())?;
        queries::update_delivery(&db, &delivery)?;
        delivery
    };

    Ok(success(delivery_json(&delivery, Utc::now().date_naive())?))
}

fn delivery_json(delivery: &Delivery, today: NaiveDate) -> Result<serde_json::Value, AppError> {
    let mut value = serde_json::to_value(delivery).map_err(anyhow::Error::from)?;
    value["status"] = delivery.effective_status(today).into();
    Ok(value)
}
