use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::Json;
use chrono::Utc;
use rusqlite::Connection;
use serde::Deserialize;

use crate::db::queries;
use crate::errors::{AppError, CapacityCode};
use crate::models::{
    generate_registration_id, RegistrationStatus, ValentineConfig, ValentineRegistration,
    ValentineWorkshop,
};
use crate::services::campaign::send_last_chance;
use crate::state::AppState;

use super::{check_auth, success};

// The whole seasonal API lives on one route with an `action` query
// parameter, exactly like the campaign frontend expects.
#[derive(Deserialize)]
pub struct ValentineParams {
    pub action: Option<String>,
    pub id: Option<String>,
}

fn unknown_action(action: Option<&str>) -> AppError {
    match action {
        Some(a) => AppError::Validation(format!("acción desconocida: {a}")),
        None => AppError::Validation("falta el parámetro action".to_string()),
    }
}

// GET /api/valentine?action=list|stats|availability|topProspects|get
pub async fn get_actions(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(params): Query<ValentineParams>,
) -> Result<Json<serde_json::Value>, AppError> {
    match params.action.as_deref() {
        Some("availability") => {
            let db = state.db.lock().unwrap();
            Ok(success(workshop_availability(&db, &state.valentine)?))
        }
        Some("list") => {
            check_auth(&headers, &state.config.admin_token)?;
            let db = state.db.lock().unwrap();
            Ok(success(queries::get_registrations(&db)?))
        }
        Some("stats") => {
            check_auth(&headers, &state.config.admin_token)?;
            let db = state.db.lock().unwrap();
            Ok(success(stats(&db, &state.valentine)?))
        }
        Some("topProspects") => {
            check_auth(&headers, &state.config.admin_token)?;
            let db = state.db.lock().unwrap();
            let prospects = queries::get_valentine_prospects(&db, 50)?;
            let rows: Vec<serde_json::Value> = prospects
                .iter()
                .map(|p| {
                    serde_json::json!({
                        "name": p.name,
                        "email": p.email,
                        "totalBookings": p.total_bookings,
                        "lastBooking": p.last_booking,
                    })
                })
                .collect();
            Ok(success(rows))
        }
        Some("get") => {
            check_auth(&headers, &state.config.admin_token)?;
            let id = params
                .id
                .ok_or_else(|| AppError::Validation("falta el parámetro id".to_string()))?;
            let registration = {
                let db = state.db.lock().unwrap();
                queries::get_registration_by_id(&db, &id)?
            }
            .ok_or_else(|| AppError::NotFound(format!("inscripción {id}")))?;
            Ok(success(registration))
        }
        other => Err(unknown_action(other)),
    }
}

// POST /api/valentine?action=register|sendLastChanceCampaign
pub async fn post_actions(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(params): Query<ValentineParams>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<serde_json::Value>, AppError> {
    match params.action.as_deref() {
        Some("register") => register(state, body).await,
        Some("sendLastChanceCampaign") => {
            check_auth(&headers, &state.config.admin_token)?;
            campaign(state).await
        }
        other => Err(unknown_action(other)),
    }
}

// PUT /api/valentine?action=updateStatus
#[derive(Deserialize)]
struct UpdateStatusRequest {
    id: String,
    status: String,
}

pub async fn put_actions(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(params): Query<ValentineParams>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<serde_json::Value>, AppError> {
    match params.action.as_deref() {
        Some("updateStatus") => {
            check_auth(&headers, &state.config.admin_token)?;
            let req: UpdateStatusRequest = serde_json::from_value(body)
                .map_err(|e| AppError::Validation(format!("solicitud inválida: {e}")))?;
            let status = RegistrationStatus::parse(&req.status).ok_or_else(|| {
                AppError::Validation(format!("estado desconocido: {}", req.status))
            })?;

            let updated = {
                let db = state.db.lock().unwrap();
                queries::update_registration_status(&db, &req.id, status)?
            };
            if !updated {
                return Err(AppError::NotFound(format!("inscripción {}", req.id)));
            }
            Ok(success(serde_json::json!({
                "id": req.id,
                "status": status.as_str(),
            })))
        }
        other => Err(unknown_action(other)),
    }
}

// DELETE /api/valentine?action=delete&id=...
pub async fn delete_actions(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(params): Query<ValentineParams>,
) -> Result<Json<serde_json::Value>, AppError> {
    match params.action.as_deref() {
        Some("delete") => {
            check_auth(&headers, &state.config.admin_token)?;
            let id = params
                .id
                .ok_or_else(|| AppError::Validation("falta el parámetro id".to_string()))?;
            let deleted = {
                let db = state.db.lock().unwrap();
                queries::delete_registration(&db, &id)?
            };
            if !deleted {
                return Err(AppError::NotFound(format!("inscripción {id}")));
            }
            Ok(success(serde_json::json!({ "deleted": true })))
        }
        other => Err(unknown_action(other)),
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegisterRequest {
    full_name: String,
    birth_date: String,
    phone: String,
    email: String,
    workshop: String,
    #[serde(default = "default_participants")]
    participants: u32,
    #[serde(default)]
    payment_proof_url: Option<String>,
}

fn default_participants() -> u32 {
    1
}

async fn register(
    state: Arc<AppState>,
    body: serde_json::Value,
) -> Result<Json<serde_json::Value>, AppError> {
    let req: RegisterRequest = serde_json::from_value(body)
        .map_err(|e| AppError::Validation(format!("solicitud inválida: {e}")))?;

    if req.full_name.trim().is_empty() {
        return Err(AppError::Validation("el nombre es obligatorio".to_string()));
    }
    if !req.email.contains('@') {
        return Err(AppError::Validation("el email no es válido".to_string()));
    }
    if req.phone.trim().is_empty() {
        return Err(AppError::Validation("el teléfono es obligatorio".to_string()));
    }
    if req.birth_date.trim().is_empty() {
        return Err(AppError::Validation(
            "la fecha de nacimiento es obligatoria".to_string(),
        ));
    }
    let payment_proof_url = req
        .payment_proof_url
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| {
            AppError::Validation("el comprobante de pago es obligatorio".to_string())
        })?
        .to_string();
    if req.participants == 0 || req.participants > 2 {
        return Err(AppError::Validation(
            "solo se admiten 1 o 2 participantes por inscripción".to_string(),
        ));
    }
    let workshop = ValentineWorkshop::parse(&req.workshop)
        .ok_or_else(|| AppError::Validation(format!("taller desconocido: {}", req.workshop)))?;

    let registration = {
        let db = state.db.lock().unwrap();

        let used = queries::count_workshop_participants(&db, workshop)?;
        let max = state.valentine.capacity_for(workshop) as i64;
        if used + req.participants as i64 > max {
            return Err(AppError::Capacity {
                code: CapacityCode::InsufficientCapacity,
                message: format!("no quedan plazas suficientes en {}", workshop.label()),
            });
        }

        let registration = ValentineRegistration {
            id: generate_registration_id(),
            full_name: req.full_name.trim().to_string(),
            birth_date: req.birth_date.trim().to_string(),
            phone: req.phone.trim().to_string(),
            email: req.email.trim().to_string(),
            workshop,
            participants: req.participants,
            payment_proof_url,
            status: RegistrationStatus::Pending,
            created_at: Utc::now().naive_utc(),
        };
        queries::create_registration(&db, &registration)?;
        registration
    };

    // The registration is saved; the confirmation email is best-effort.
    let html = confirmation_html(&registration);
    if let Err(e) = state
        .email
        .send(
            &registration.email,
            "Inscripción recibida — San Valentín en Alma",
            &html,
        )
        .await
    {
        tracing::error!(error = %e, id = %registration.id, "registration confirmation email failed");
    }

    tracing::info!(id = %registration.id, workshop = %workshop.as_str(), "valentine registration created");
    Ok(success(registration))
}

async fn campaign(state: Arc<AppState>) -> Result<Json<serde_json::Value>, AppError> {
    let prospects = {
        let db = state.db.lock().unwrap();
        queries::get_valentine_prospects(&db, 500)?
    };

    let throttle = Duration::from_millis(state.config.campaign_throttle_ms);
    let outcome = send_last_chance(&prospects, state.email.as_ref(), throttle).await;

    tracing::info!(sent = outcome.sent, failed = outcome.failed, "last-chance campaign finished");
    Ok(success(outcome))
}

fn workshop_availability(
    db: &Connection,
    config: &ValentineConfig,
) -> Result<Vec<serde_json::Value>, AppError> {
    let mut rows = vec![];
    for workshop in ValentineWorkshop::ALL {
        let used = queries::count_workshop_participants(db, workshop)?;
        let max = config.capacity_for(workshop) as i64;
        let available = max - used;
        rows.push(serde_json::json!({
            "workshop": workshop.as_str(),
            "label": workshop.label(),
            "maxCapacity": max,
            "usedCapacity": used,
            "available": available.max(0),
            "isAvailable": available > 0,
        }));
    }
    Ok(rows)
}

fn stats(db: &Connection, config: &ValentineConfig) -> Result<serde_json::Value, AppError> {
    let registrations = queries::get_registrations(db)?;

    let mut by_status = serde_json::Map::new();
    for status in [
        RegistrationStatus::Pending,
        RegistrationStatus::Confirmed,
        RegistrationStatus::Cancelled,
        RegistrationStatus::Attended,
    ] {
        let count = registrations.iter().filter(|r| r.status == status).count();
        by_status.insert(status.as_str().to_string(), count.into());
    }

    let total_participants: u32 = registrations
        .iter()
        .filter(|r| r.status != RegistrationStatus::Cancelled)
        .map(|r| r.participants)
        .sum();

    Ok(serde_json::json!({
        "total": registrations.len(),
        "byStatus": by_status,
        "totalParticipants": total_participants,
        "workshops": workshop_availability(db, config)?,
    }))
}

fn confirmation_html(registration: &ValentineRegistration) -> String {
    format!(
        "<p>Hola {},</p>\
         <p>Hemos recibido tu inscripción <strong>{}</strong> al taller \
         «{}» ({} {}).</p>\
         <p>Revisaremos el comprobante de pago y te confirmaremos la plaza \
         muy pronto.</p>\
         <p>— Alma Estudio</p>",
        registration.full_name,
        registration.id,
        registration.workshop.label(),
        registration.participants,
        if registration.participants == 1 {
            "persona"
        } else {
            "personas"
        },
    )
}
