use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use chrono::{NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::db::queries;
use crate::errors::{AppError, CapacityCode};
use crate::models::money::format_eur;
use crate::models::{
    generate_booking_code, Booking, ParticipantAssignment, PaymentDetail, PaymentMethod,
    ProductSnapshot, Technique, TimeSlot, UserInfo,
};
use crate::services::capacity::{requested_seats, slot_availability, SlotAvailability};
use crate::services::group::validate_group;
use crate::services::payments::{merge_payments, reconcile, PaymentSummary};
use crate::services::slots::{self, SlotMutation};
use crate::state::AppState;

use super::{check_auth, success};

// POST /api/bookings
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    pub product: ProductSnapshot,
    pub user_info: UserInfo,
    pub slots: Vec<TimeSlot>,
    #[serde(default)]
    pub participants: Option<u32>,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub payment_details: Vec<PaymentDetail>,
    #[serde(default)]
    pub group_assignments: Option<Vec<ParticipantAssignment>>,
    #[serde(default)]
    pub client_note: Option<String>,
    #[serde(default)]
    pub expires_at: Option<NaiveDateTime>,
}

pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateBookingRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let now = Utc::now().naive_utc();

    if body.user_info.name.trim().is_empty() {
        return Err(AppError::Validation("el nombre es obligatorio".to_string()));
    }
    if !body.user_info.email.contains('@') {
        return Err(AppError::Validation("el email no es válido".to_string()));
    }
    if body.slots.is_empty() {
        return Err(AppError::Validation(
            "la reserva necesita al menos una clase".to_string(),
        ));
    }
    for slot in &body.slots {
        slot.validate().map_err(|e| AppError::Validation(e.to_string()))?;
    }

    let participants = body.participants.unwrap_or(1);
    if participants < 1 {
        return Err(AppError::Validation(
            "se necesita al menos un participante".to_string(),
        ));
    }

    if body.product.product_type.is_group() {
        let assignments = body.group_assignments.as_deref().unwrap_or(&[]);
        validate_group(participants, assignments, &state.group, &state.capacity)?;
    }

    let price = body.price.unwrap_or(body.product.price);
    let summary = reconcile(price, &body.payment_details);

    let mut booking = Booking {
        id: uuid::Uuid::new_v4().to_string(),
        booking_code: generate_booking_code(),
        product_type: body.product.product_type,
        product: body.product,
        user_info: body.user_info,
        slots: body.slots,
        participants,
        price,
        is_paid: summary.is_paid,
        payment_details: body.payment_details,
        group_assignments: body.group_assignments,
        booking_date: None,
        expires_at: body.expires_at,
        client_note: body.client_note,
        accepted_no_refund: false,
        created_at: now,
    };
    booking.accepted_no_refund = slots::flag_no_refund_slots(&mut booking.slots, now);
    booking.booking_date = booking.slots.first().map(|s| s.date.clone());

    {
        let db = state.db.lock().unwrap();
        let _ = queries::delete_expired_holds(&db, &now);

        for slot in &booking.slots {
            let existing = queries::get_bookings_for_date(&db, &slot.date)?;
            let availability = slot_availability(&slot.date, &slot.time, &existing, &state.capacity);
            check_seats(&availability, &booking, slot)?;
        }

        queries::create_booking(&db, &booking)?;
    }

    tracing::info!(code = %booking.booking_code, "booking created");
    Ok(success(booking))
}

fn check_seats(
    availability: &SlotAvailability,
    booking: &Booking,
    slot: &TimeSlot,
) -> Result<(), AppError> {
    let requested = requested_seats(booking, slot);
    for technique in Technique::ALL {
        let needed = requested.get(technique);
        if needed == 0 {
            continue;
        }
        let available = availability
            .for_technique(technique)
            .map(|t| t.available)
            .unwrap_or(0);
        if available < needed as i64 {
            return Err(AppError::Capacity {
                code: CapacityCode::CapacityFull,
                message: format!(
                    "sin plazas de {} el {} a las {}",
                    technique.label(),
                    slot.date,
                    slot.time
                ),
            });
        }
    }
    Ok(())
}

// GET /api/bookings
#[derive(Deserialize)]
pub struct BookingsQuery {
    pub date: Option<String>,
    pub limit: Option<i64>,
}

pub async fn get_bookings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<BookingsQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let bookings = {
        let db = state.db.lock().unwrap();
        queries::get_all_bookings(&db, query.date.as_deref(), query.limit.unwrap_or(50))?
    };
    Ok(success(bookings))
}

// GET /api/bookings/:id
pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let booking = {
        let db = state.db.lock().unwrap();
        queries::get_booking_by_id(&db, &id)?
    }
    .ok_or_else(|| AppError::NotFound(format!("reserva {id}")))?;

    Ok(success(booking))
}

// POST /api/bookings/:id/payments
pub async fn add_payment(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(mut payment): Json<PaymentDetail>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    if payment.method == PaymentMethod::Giftcard && payment.giftcard_id.is_none() {
        return Err(AppError::Validation(
            "falta el identificador de la tarjeta regalo".to_string(),
        ));
    }
    if payment.received_at.is_none() {
        payment.received_at = Some(Utc::now().naive_utc());
    }

    let (booking, summary, just_paid) = {
        let db = state.db.lock().unwrap();
        let mut booking = queries::get_booking_by_id(&db, &id)?
            .ok_or_else(|| AppError::NotFound(format!("reserva {id}")))?;

        let was_paid = booking.is_paid;
        booking.payment_details =
            merge_payments(std::mem::take(&mut booking.payment_details), vec![payment]);
        let summary = reconcile(booking.price, &booking.payment_details);
        booking.is_paid = summary.is_paid;

        queries::update_booking_payments(&db, &id, &booking.payment_details, booking.is_paid)?;
        let just_paid = !was_paid && summary.is_paid;
        (booking, summary, just_paid)
    };

    // The payment is saved; a broken mail server must not undo it.
    if just_paid {
        let html = payment_confirmation_html(&booking, &summary);
        if let Err(e) = state
            .email
            .send(&booking.user_info.email, "Pago recibido — Alma Estudio", &html)
            .await
        {
            tracing::error!(error = %e, code = %booking.booking_code, "payment confirmation email failed");
        }
    }

    Ok(success(serde_json::json!({
        "booking": booking,
        "summary": summary,
    })))
}

// DELETE /api/bookings/:id/payments/:index
pub async fn delete_payment(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path((id, index)): Path<(String, usize)>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let (booking, summary) = {
        let db = state.db.lock().unwrap();
        let mut booking = queries::get_booking_by_id(&db, &id)?
            .ok_or_else(|| AppError::NotFound(format!("reserva {id}")))?;

        if index >= booking.payment_details.len() {
            return Err(AppError::NotFound(format!("pago {index} de la reserva {id}")));
        }
        booking.payment_details.remove(index);

        let summary = reconcile(booking.price, &booking.payment_details);
        booking.is_paid = summary.is_paid;

        queries::update_booking_payments(&db, &id, &booking.payment_details, booking.is_paid)?;
        (booking, summary)
    };

    Ok(success(serde_json::json!({
        "booking": booking,
        "summary": summary,
    })))
}

// POST /api/bookings/:id/reschedule
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RescheduleRequest {
    pub old_date: String,
    pub old_time: String,
    pub new_slot: TimeSlot,
    #[serde(default)]
    pub force_admin_reschedule: bool,
}

pub async fn reschedule_slot(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<RescheduleRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let now = Utc::now().naive_utc();

    let booking = {
        let db = state.db.lock().unwrap();
        let mut booking = queries::get_booking_by_id(&db, &id)?
            .ok_or_else(|| AppError::NotFound(format!("reserva {id}")))?;

        // the destination hour must have room, counting everyone but us
        let others: Vec<Booking> = queries::get_bookings_for_date(&db, &body.new_slot.date)?
            .into_iter()
            .filter(|b| b.id != booking.id)
            .collect();
        let availability = slot_availability(
            &body.new_slot.date,
            &body.new_slot.time,
            &others,
            &state.capacity,
        );
        check_seats(&availability, &booking, &body.new_slot)?;

        slots::reschedule_slot(
            &mut booking,
            &body.old_date,
            &body.old_time,
            body.new_slot,
            now,
            body.force_admin_reschedule,
        )?;

        queries::update_booking_slots(&db, &id, &booking.slots)?;
        booking.booking_date = booking.slots.first().map(|s| s.date.clone());
        booking
    };

    tracing::info!(code = %booking.booking_code, "slot rescheduled");
    Ok(success(booking))
}

// POST /api/bookings/:id/slots/delete
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteSlotRequest {
    pub date: String,
    pub time: String,
    #[serde(default)]
    pub force_admin_reschedule: bool,
}

pub async fn delete_slot(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<DeleteSlotRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let now = Utc::now().naive_utc();

    let (booking, emptied) = {
        let db = state.db.lock().unwrap();
        let mut booking = queries::get_booking_by_id(&db, &id)?
            .ok_or_else(|| AppError::NotFound(format!("reserva {id}")))?;

        let mutation = slots::delete_slot(
            &mut booking,
            &body.date,
            &body.time,
            now,
            body.force_admin_reschedule,
        )?;

        queries::update_booking_slots(&db, &id, &booking.slots)?;

        let emptied = mutation == SlotMutation::BookingEmptied;
        if emptied {
            // keep the person on file even though no classes remain
            queries::ensure_standalone_customer(&db, &booking.user_info)?;
        }
        (booking, emptied)
    };

    Ok(success(serde_json::json!({
        "booking": booking,
        "standaloneCustomer": emptied,
    })))
}

fn payment_confirmation_html(booking: &Booking, summary: &PaymentSummary) -> String {
    format!(
        "<p>Hola {},</p>\
         <p>Hemos recibido tu pago. La reserva <strong>{}</strong> queda \
         abonada por completo ({}).</p>\
         <p>¡Nos vemos en el estudio!</p>\
         <p>— Alma Estudio</p>",
        booking.user_info.name,
        booking.booking_code,
        format_eur(summary.total_paid),
    )
}
