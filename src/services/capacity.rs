use serde::Serialize;

use crate::models::{Booking, Technique, TimeSlot};

// Seats per technique for a single class hour. Injected so tests and the
// seasonal schedule can vary them.
#[derive(Debug, Clone, Copy)]
pub struct CapacityLimits {
    pub potters_wheel: u32,
    pub hand_modeling: u32,
    pub painting: u32,
}

impl Default for CapacityLimits {
    fn default() -> Self {
        Self {
            potters_wheel: 8,
            hand_modeling: 14,
            painting: 8,
        }
    }
}

impl CapacityLimits {
    pub fn for_technique(&self, technique: Technique) -> u32 {
        match technique {
            Technique::PottersWheel => self.potters_wheel,
            Technique::HandModeling => self.hand_modeling,
            Technique::Painting => self.painting,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TechniqueAvailability {
    pub technique: Technique,
    pub total: u32,
    pub occupied: u32,
    pub available: i64,
    pub is_available: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotSummary {
    pub total_bookings: u32,
    pub paid: u32,
    pub unpaid: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotAvailability {
    pub date: String,
    pub time: String,
    pub techniques: Vec<TechniqueAvailability>,
    pub summary: SlotSummary,
}

impl SlotAvailability {
    pub fn for_technique(&self, technique: Technique) -> Option<&TechniqueAvailability> {
        self.techniques.iter().find(|t| t.technique == technique)
    }
}

// Occupancy for one (date, time) cell. Unpaid bookings hold their seats —
// they show up in the unpaid counter so staff can chase the payment.
pub fn slot_availability(
    date: &str,
    time: &str,
    bookings: &[Booking],
    limits: &CapacityLimits,
) -> SlotAvailability {
    let mut occupied = TechniqueCounts::default();
    let mut summary = SlotSummary {
        total_bookings: 0,
        paid: 0,
        unpaid: 0,
    };

    for booking in bookings {
        let matching: Vec<_> = booking
            .slots
            .iter()
            .filter(|s| s.matches(date, time))
            .collect();
        if matching.is_empty() {
            continue;
        }

        summary.total_bookings += 1;
        if booking.is_paid {
            summary.paid += 1;
        } else {
            summary.unpaid += 1;
        }

        for slot in matching {
            match booking.group_assignments.as_deref() {
                Some(assignments) if !assignments.is_empty() => {
                    for assignment in assignments {
                        occupied.add(assignment.technique, 1);
                    }
                }
                _ => {
                    // A slot without its own technique falls back to the
                    // technique the product was sold with.
                    if let Some(technique) = slot.technique.or(booking.product.technique) {
                        occupied.add(technique, booking.participants);
                    }
                }
            }
        }
    }

    let techniques = Technique::ALL
        .iter()
        .map(|&technique| {
            let total = limits.for_technique(technique);
            let used = occupied.get(technique);
            let available = total as i64 - used as i64;
            TechniqueAvailability {
                technique,
                total,
                occupied: used,
                available,
                is_available: available > 0,
            }
        })
        .collect();

    SlotAvailability {
        date: date.to_string(),
        time: time.to_string(),
        techniques,
        summary,
    }
}

pub fn day_availability(
    date: &str,
    times: &[String],
    bookings: &[Booking],
    limits: &CapacityLimits,
) -> Vec<SlotAvailability> {
    times
        .iter()
        .map(|time| slot_availability(date, time, bookings, limits))
        .collect()
}

// Seats a booking needs at one slot, in the same shape the occupancy
// counting uses.
pub fn requested_seats(booking: &Booking, slot: &TimeSlot) -> TechniqueCounts {
    let mut counts = TechniqueCounts::default();
    match booking.group_assignments.as_deref() {
        Some(assignments) if !assignments.is_empty() => {
            for assignment in assignments {
                counts.add(assignment.technique, 1);
            }
        }
        _ => {
            if let Some(technique) = slot.technique.or(booking.product.technique) {
                counts.add(technique, booking.participants);
            }
        }
    }
    counts
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TechniqueCounts {
    wheel: u32,
    modeling: u32,
    painting: u32,
}

impl TechniqueCounts {
    pub fn add(&mut self, technique: Technique, count: u32) {
        match technique {
            Technique::PottersWheel => self.wheel += count,
            Technique::HandModeling => self.modeling += count,
            Technique::Painting => self.painting += count,
        }
    }

    pub fn get(&self, technique: Technique) -> u32 {
        match technique {
            Technique::PottersWheel => self.wheel,
            Technique::HandModeling => self.modeling,
            Technique::Painting => self.painting,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.wheel == 0 && self.modeling == 0 && self.painting == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        generate_booking_code, Booking, ParticipantAssignment, ProductSnapshot, ProductType,
        TimeSlot, UserInfo,
    };
    use chrono::NaiveDateTime;
    use rust_decimal::Decimal;

    fn slot(date: &str, time: &str, technique: Option<Technique>) -> TimeSlot {
        TimeSlot {
            date: date.to_string(),
            time: time.to_string(),
            instructor_id: None,
            technique,
            no_refund: false,
        }
    }

    fn booking(slots: Vec<TimeSlot>, participants: u32, is_paid: bool) -> Booking {
        Booking {
            id: uuid::Uuid::new_v4().to_string(),
            booking_code: generate_booking_code(),
            product_type: ProductType::SingleClass,
            product: ProductSnapshot {
                id: "clase-suelta".to_string(),
                name: "Clase suelta".to_string(),
                product_type: ProductType::SingleClass,
                price: Decimal::from(35),
                technique: Some(Technique::PottersWheel),
                sessions: Some(1),
            },
            user_info: UserInfo {
                name: "Ana".to_string(),
                email: "ana@example.com".to_string(),
                phone: None,
            },
            slots,
            participants,
            price: Decimal::from(35),
            is_paid,
            payment_details: vec![],
            group_assignments: None,
            booking_date: None,
            expires_at: None,
            client_note: None,
            accepted_no_refund: false,
            created_at: NaiveDateTime::parse_from_str("2026-01-01 10:00:00", "%Y-%m-%d %H:%M:%S")
                .unwrap(),
        }
    }

    #[test]
    fn test_empty_slot_is_fully_available() {
        let limits = CapacityLimits::default();
        let availability = slot_availability("2026-06-10", "10:00", &[], &limits);

        let wheel = availability.for_technique(Technique::PottersWheel).unwrap();
        assert_eq!(wheel.occupied, 0);
        assert_eq!(wheel.available, 8);
        assert!(wheel.is_available);
        assert_eq!(availability.summary.total_bookings, 0);
    }

    #[test]
    fn test_occupancy_counts_participants() {
        let limits = CapacityLimits::default();
        let bookings = vec![
            booking(vec![slot("2026-06-10", "10:00", Some(Technique::PottersWheel))], 2, true),
            booking(vec![slot("2026-06-10", "10:00", Some(Technique::PottersWheel))], 3, false),
            // different time, must not count
            booking(vec![slot("2026-06-10", "12:00", Some(Technique::PottersWheel))], 4, true),
        ];

        let availability = slot_availability("2026-06-10", "10:00", &bookings, &limits);
        let wheel = availability.for_technique(Technique::PottersWheel).unwrap();
        assert_eq!(wheel.occupied, 5);
        assert_eq!(wheel.available, 3);
        assert!(wheel.is_available);
    }

    #[test]
    fn test_unpaid_bookings_hold_seats_but_are_flagged() {
        let limits = CapacityLimits::default();
        let bookings = vec![
            booking(vec![slot("2026-06-10", "10:00", Some(Technique::Painting))], 1, true),
            booking(vec![slot("2026-06-10", "10:00", Some(Technique::Painting))], 1, false),
        ];

        let availability = slot_availability("2026-06-10", "10:00", &bookings, &limits);
        let painting = availability.for_technique(Technique::Painting).unwrap();
        assert_eq!(painting.occupied, 2);
        assert_eq!(availability.summary.paid, 1);
        assert_eq!(availability.summary.unpaid, 1);
        assert_eq!(availability.summary.total_bookings, 2);
    }

    #[test]
    fn test_full_technique_is_unavailable() {
        let limits = CapacityLimits::default();
        let bookings =
            vec![booking(vec![slot("2026-06-10", "10:00", Some(Technique::PottersWheel))], 8, true)];

        let availability = slot_availability("2026-06-10", "10:00", &bookings, &limits);
        let wheel = availability.for_technique(Technique::PottersWheel).unwrap();
        assert_eq!(wheel.available, 0);
        assert!(!wheel.is_available);

        // other pools are untouched
        let modeling = availability.for_technique(Technique::HandModeling).unwrap();
        assert_eq!(modeling.available, 14);
    }

    #[test]
    fn test_group_assignments_count_per_technique() {
        let limits = CapacityLimits::default();
        let mut group = booking(vec![slot("2026-06-10", "10:00", None)], 5, true);
        group.product_type = ProductType::GroupClass;
        group.group_assignments = Some(vec![
            ParticipantAssignment { participant_number: 1, technique: Technique::PottersWheel, selected_piece_id: None },
            ParticipantAssignment { participant_number: 2, technique: Technique::PottersWheel, selected_piece_id: None },
            ParticipantAssignment { participant_number: 3, technique: Technique::HandModeling, selected_piece_id: None },
            ParticipantAssignment { participant_number: 4, technique: Technique::Painting, selected_piece_id: Some("taza-01".to_string()) },
            ParticipantAssignment { participant_number: 5, technique: Technique::Painting, selected_piece_id: Some("plato-02".to_string()) },
        ]);

        let availability = slot_availability("2026-06-10", "10:00", &[group], &limits);
        assert_eq!(availability.for_technique(Technique::PottersWheel).unwrap().occupied, 2);
        assert_eq!(availability.for_technique(Technique::HandModeling).unwrap().occupied, 1);
        assert_eq!(availability.for_technique(Technique::Painting).unwrap().occupied, 2);
    }

    #[test]
    fn test_slot_without_technique_falls_back_to_product() {
        let limits = CapacityLimits::default();
        // slot technique is None, product says potters_wheel
        let bookings = vec![booking(vec![slot("2026-06-10", "10:00", None)], 2, true)];

        let availability = slot_availability("2026-06-10", "10:00", &bookings, &limits);
        assert_eq!(availability.for_technique(Technique::PottersWheel).unwrap().occupied, 2);
    }

    #[test]
    fn test_overbooked_slot_reports_negative_available() {
        let limits = CapacityLimits {
            potters_wheel: 4,
            hand_modeling: 10,
            painting: 8,
        };
        let bookings =
            vec![booking(vec![slot("2026-06-10", "10:00", Some(Technique::PottersWheel))], 6, true)];

        let availability = slot_availability("2026-06-10", "10:00", &bookings, &limits);
        let wheel = availability.for_technique(Technique::PottersWheel).unwrap();
        assert_eq!(wheel.available, -2);
        assert!(!wheel.is_available);
    }

    #[test]
    fn test_day_availability() {
        let limits = CapacityLimits::default();
        let bookings =
            vec![booking(vec![slot("2026-06-10", "10:00", Some(Technique::PottersWheel))], 1, true)];
        let times = vec!["10:00".to_string(), "17:00".to_string()];

        let day = day_availability("2026-06-10", &times, &bookings, &limits);
        assert_eq!(day.len(), 2);
        assert_eq!(day[0].for_technique(Technique::PottersWheel).unwrap().occupied, 1);
        assert_eq!(day[1].for_technique(Technique::PottersWheel).unwrap().occupied, 0);
    }
}
