use chrono::NaiveDateTime;

use crate::models::{Booking, TimeSlot};

// Clients may move a class up to 72 hours before it starts; admins can always.
const RESCHEDULE_WINDOW_HOURS: i64 = 72;
// A slot booked under 48 hours before its own start is locked for good.
const NO_REFUND_WINDOW_HOURS: i64 = 48;

#[derive(Debug, PartialEq)]
pub enum SlotError {
    TooLate { hours_remaining: i64 },
    NoRefund,
    SlotNotFound { date: String, time: String },
    InvalidSlot { reason: String },
}

impl std::fmt::Display for SlotError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SlotError::TooLate { .. } => write!(
                f,
                "los cambios requieren al menos {RESCHEDULE_WINDOW_HOURS} horas de antelación"
            ),
            SlotError::NoRefund => {
                write!(f, "esta reserva ya no admite cambios ni reembolsos")
            }
            SlotError::SlotNotFound { date, time } => {
                write!(f, "no existe una clase el {date} a las {time}")
            }
            SlotError::InvalidSlot { reason } => write!(f, "{reason}"),
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum SlotMutation {
    Replaced,
    Removed,
    // Last slot gone; the caller keeps the booking and records a standalone
    // customer so the person stays in the system.
    BookingEmptied,
}

pub fn is_no_refund(slot: &TimeSlot, created_at: NaiveDateTime) -> bool {
    match slot.datetime() {
        Some(start) => (start - created_at).num_hours() < NO_REFUND_WINDOW_HOURS,
        None => false,
    }
}

// Flagged once at creation; the flag never changes afterwards.
pub fn flag_no_refund_slots(slots: &mut [TimeSlot], created_at: NaiveDateTime) -> bool {
    let mut any = false;
    for slot in slots.iter_mut() {
        slot.no_refund = is_no_refund(slot, created_at);
        any |= slot.no_refund;
    }
    any
}

fn check_eligibility(slot: &TimeSlot, now: NaiveDateTime, force_admin: bool) -> Result<(), SlotError> {
    if force_admin {
        return Ok(());
    }
    if slot.no_refund {
        return Err(SlotError::NoRefund);
    }
    let start = slot.datetime().ok_or_else(|| SlotError::InvalidSlot {
        reason: format!("la clase {} {} tiene una fecha inválida", slot.date, slot.time),
    })?;
    let hours_remaining = (start - now).num_hours();
    if hours_remaining < RESCHEDULE_WINDOW_HOURS {
        return Err(SlotError::TooLate { hours_remaining });
    }
    Ok(())
}

// Replaces exactly one slot, in place, keeping its position in the list.
pub fn reschedule_slot(
    booking: &mut Booking,
    old_date: &str,
    old_time: &str,
    new_slot: TimeSlot,
    now: NaiveDateTime,
    force_admin: bool,
) -> Result<SlotMutation, SlotError> {
    new_slot.validate().map_err(|e| SlotError::InvalidSlot {
        reason: e.to_string(),
    })?;

    let index = booking
        .slots
        .iter()
        .position(|s| s.matches(old_date, old_time))
        .ok_or_else(|| SlotError::SlotNotFound {
            date: old_date.to_string(),
            time: old_time.to_string(),
        })?;

    check_eligibility(&booking.slots[index], now, force_admin)?;

    booking.slots[index] = new_slot;
    Ok(SlotMutation::Replaced)
}

pub fn delete_slot(
    booking: &mut Booking,
    date: &str,
    time: &str,
    now: NaiveDateTime,
    force_admin: bool,
) -> Result<SlotMutation, SlotError> {
    let index = booking
        .slots
        .iter()
        .position(|s| s.matches(date, time))
        .ok_or_else(|| SlotError::SlotNotFound {
            date: date.to_string(),
            time: time.to_string(),
        })?;

    check_eligibility(&booking.slots[index], now, force_admin)?;

    booking.slots.remove(index);
    if booking.slots.is_empty() {
        Ok(SlotMutation::BookingEmptied)
    } else {
        Ok(SlotMutation::Removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        generate_booking_code, ProductSnapshot, ProductType, Technique, UserInfo,
    };
    use rust_decimal::Decimal;

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    fn slot(date: &str, time: &str) -> TimeSlot {
        TimeSlot {
            date: date.to_string(),
            time: time.to_string(),
            instructor_id: Some("marta".to_string()),
            technique: Some(Technique::PottersWheel),
            no_refund: false,
        }
    }

    fn booking_with_slots(slots: Vec<TimeSlot>, created_at: NaiveDateTime) -> Booking {
        Booking {
            id: "b1".to_string(),
            booking_code: generate_booking_code(),
            product_type: ProductType::ClassPackage,
            product: ProductSnapshot {
                id: "bono-4".to_string(),
                name: "Bono 4 clases".to_string(),
                product_type: ProductType::ClassPackage,
                price: Decimal::from(120),
                technique: Some(Technique::PottersWheel),
                sessions: Some(4),
            },
            user_info: UserInfo {
                name: "Ana".to_string(),
                email: "ana@example.com".to_string(),
                phone: None,
            },
            slots,
            participants: 1,
            price: Decimal::from(120),
            is_paid: true,
            payment_details: vec![],
            group_assignments: None,
            booking_date: None,
            expires_at: None,
            client_note: None,
            accepted_no_refund: false,
            created_at,
        }
    }

    #[test]
    fn test_no_refund_window() {
        // created 25h before the class
        let slot = slot("2024-06-10", "10:00");
        assert!(is_no_refund(&slot, dt("2024-06-09 09:00")));
        // created a week ahead
        assert!(!is_no_refund(&slot, dt("2024-06-03 09:00")));
        // exactly 48h is outside the window
        assert!(!is_no_refund(&slot, dt("2024-06-08 10:00")));
    }

    #[test]
    fn test_flag_no_refund_slots() {
        let mut slots = vec![slot("2024-06-10", "10:00"), slot("2024-07-01", "10:00")];
        let any = flag_no_refund_slots(&mut slots, dt("2024-06-09 09:00"));
        assert!(any);
        assert!(slots[0].no_refund);
        assert!(!slots[1].no_refund);
    }

    #[test]
    fn test_client_reschedule_within_window() {
        let mut booking = booking_with_slots(vec![slot("2026-06-10", "10:00")], dt("2026-05-01 10:00"));
        // 5 days ahead of the class
        let result = reschedule_slot(
            &mut booking,
            "2026-06-10",
            "10:00",
            slot("2026-06-12", "17:00"),
            dt("2026-06-05 10:00"),
            false,
        );
        assert_eq!(result, Ok(SlotMutation::Replaced));
        assert_eq!(booking.slots[0].date, "2026-06-12");
        assert_eq!(booking.slots[0].time, "17:00");
    }

    #[test]
    fn test_client_reschedule_too_late() {
        let mut booking = booking_with_slots(vec![slot("2026-06-10", "10:00")], dt("2026-05-01 10:00"));
        // 48h before the class: under the 72h window
        let result = reschedule_slot(
            &mut booking,
            "2026-06-10",
            "10:00",
            slot("2026-06-12", "17:00"),
            dt("2026-06-08 10:00"),
            false,
        );
        assert_eq!(result, Err(SlotError::TooLate { hours_remaining: 48 }));
        assert_eq!(booking.slots[0].date, "2026-06-10");
    }

    #[test]
    fn test_no_refund_slot_locked_for_client_but_not_admin() {
        let created = dt("2024-06-09 09:00");
        let mut slots = vec![slot("2024-06-10", "10:00")];
        flag_no_refund_slots(&mut slots, created);
        let mut booking = booking_with_slots(slots, created);

        let result = reschedule_slot(
            &mut booking,
            "2024-06-10",
            "10:00",
            slot("2024-06-20", "10:00"),
            dt("2024-06-09 10:00"),
            false,
        );
        assert_eq!(result, Err(SlotError::NoRefund));

        // forced admin reschedule bypasses the lock and the 72h window
        let result = reschedule_slot(
            &mut booking,
            "2024-06-10",
            "10:00",
            slot("2024-06-20", "10:00"),
            dt("2024-06-09 10:00"),
            true,
        );
        assert_eq!(result, Ok(SlotMutation::Replaced));
        assert_eq!(booking.slots[0].date, "2024-06-20");
    }

    #[test]
    fn test_reschedule_round_trip_restores_slots() {
        let original = vec![slot("2026-06-10", "10:00"), slot("2026-06-17", "10:00")];
        let mut booking = booking_with_slots(original.clone(), dt("2026-05-01 10:00"));
        let now = dt("2026-05-20 10:00");

        reschedule_slot(&mut booking, "2026-06-10", "10:00", slot("2026-06-11", "12:00"), now, false)
            .unwrap();
        reschedule_slot(&mut booking, "2026-06-11", "12:00", slot("2026-06-10", "10:00"), now, false)
            .unwrap();

        assert_eq!(booking.slots, original);
    }

    #[test]
    fn test_reschedule_unknown_slot() {
        let mut booking = booking_with_slots(vec![slot("2026-06-10", "10:00")], dt("2026-05-01 10:00"));
        let result = reschedule_slot(
            &mut booking,
            "2026-06-10",
            "12:00",
            slot("2026-06-12", "17:00"),
            dt("2026-05-20 10:00"),
            false,
        );
        assert!(matches!(result, Err(SlotError::SlotNotFound { .. })));
    }

    #[test]
    fn test_reschedule_rejects_invalid_destination() {
        let mut booking = booking_with_slots(vec![slot("2026-06-10", "10:00")], dt("2026-05-01 10:00"));
        let result = reschedule_slot(
            &mut booking,
            "2026-06-10",
            "10:00",
            slot("mañana", "10:00"),
            dt("2026-05-20 10:00"),
            false,
        );
        assert!(matches!(result, Err(SlotError::InvalidSlot { .. })));
    }

    #[test]
    fn test_delete_slot_keeps_others() {
        let mut booking = booking_with_slots(
            vec![slot("2026-06-10", "10:00"), slot("2026-06-17", "10:00")],
            dt("2026-05-01 10:00"),
        );
        let result = delete_slot(&mut booking, "2026-06-10", "10:00", dt("2026-05-20 10:00"), false);
        assert_eq!(result, Ok(SlotMutation::Removed));
        assert_eq!(booking.slots.len(), 1);
        assert_eq!(booking.slots[0].date, "2026-06-17");
    }

    #[test]
    fn test_delete_last_slot_reports_emptied() {
        let mut booking =
            booking_with_slots(vec![slot("2026-06-10", "10:00")], dt("2026-05-01 10:00"));
        let result = delete_slot(&mut booking, "2026-06-10", "10:00", dt("2026-05-20 10:00"), false);
        assert_eq!(result, Ok(SlotMutation::BookingEmptied));
        assert!(booking.slots.is_empty());
    }
}
