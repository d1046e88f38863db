use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::slot::{parse_date, parse_time};
use crate::services::capacity::{day_availability, slot_availability};
use crate::state::AppState;

use super::success;

#[derive(Deserialize)]
pub struct AvailabilityQuery {
    pub date: String,
    pub time: Option<String>,
}

pub async fn get_availability(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    parse_date(&query.date).map_err(|e| AppError::Validation(e.to_string()))?;
    if let Some(time) = &query.time {
        parse_time(time).map_err(|e| AppError::Validation(e.to_string()))?;
    }

    let bookings = {
        let db = state.db.lock().unwrap();
        // expired unpaid holds stop blocking seats right here
        if let Ok(freed) = queries::delete_expired_holds(&db, &Utc::now().naive_utc()) {
            if freed > 0 {
                tracing::info!(freed, "expired unpaid holds removed");
            }
        }
        queries::get_bookings_for_date(&db, &query.date)?
    };

    match &query.time {
        Some(time) => Ok(success(slot_availability(
            &query.date,
            time,
            &bookings,
            &state.capacity,
        ))),
        None => {
            // no fixed timetable: the day view covers every hour that has
            // at least one booking
            let mut times: Vec<String> = bookings
                .iter()
                .flat_map(|b| b.slots.iter())
                .filter(|s| s.date == query.date)
                .map(|s| s.time.clone())
                .collect();
            times.sort();
            times.dedup();

            Ok(success(day_availability(
                &query.date,
                &times,
                &bookings,
                &state.capacity,
            )))
        }
    }
}
