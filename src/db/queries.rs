use chrono::{NaiveDateTime, Utc};
use rust_decimal::Decimal;
use rusqlite::{params, Connection};

use crate::models::{
    Booking, Customer, Delivery, DeliveryStatus, PaymentDetail, ProductType, RegistrationStatus,
    TimeSlot, UserInfo, ValentineRegistration, ValentineWorkshop,
};

const DT_FMT: &str = "%Y-%m-%d %H:%M:%S";

fn format_dt(dt: &NaiveDateTime) -> String {
    dt.format(DT_FMT).to_string()
}

fn parse_dt(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, DT_FMT).unwrap_or_else(|_| Utc::now().naive_utc())
}

// ── Bookings ──

const BOOKING_COLUMNS: &str = "id, booking_code, product_type, product, user_info, slots, \
     payment_details, group_assignments, participants, price, is_paid, booking_date, \
     expires_at, client_note, accepted_no_refund, created_at";

pub fn create_booking(conn: &Connection, booking: &Booking) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO bookings (id, booking_code, product_type, product, user_info, slots, \
         payment_details, group_assignments, participants, price, is_paid, booking_date, \
         expires_at, client_note, accepted_no_refund, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
        params![
            booking.id,
            booking.booking_code,
            booking.product_type.as_str(),
            serde_json::to_string(&booking.product)?,
            serde_json::to_string(&booking.user_info)?,
            serde_json::to_string(&booking.slots)?,
            serde_json::to_string(&booking.payment_details)?,
            booking
                .group_assignments
                .as_ref()
                .map(serde_json::to_string)
                .transpose()?,
            booking.participants,
            booking.price.to_string(),
            booking.is_paid as i32,
            booking.booking_date,
            booking.expires_at.as_ref().map(format_dt),
            booking.client_note,
            booking.accepted_no_refund as i32,
            format_dt(&booking.created_at),
        ],
    )?;
    Ok(())
}

pub fn get_booking_by_id(conn: &Connection, id: &str) -> anyhow::Result<Option<Booking>> {
    let sql = format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?1");
    let result = conn.query_row(&sql, params![id], |row| Ok(parse_booking_row(row)));

    match result {
        Ok(booking) => Ok(Some(booking?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn get_booking_by_code(conn: &Connection, code: &str) -> anyhow::Result<Option<Booking>> {
    let sql = format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE booking_code = ?1");
    let result = conn.query_row(&sql, params![code], |row| Ok(parse_booking_row(row)));

    match result {
        Ok(booking) => Ok(Some(booking?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn get_all_bookings(
    conn: &Connection,
    date_filter: Option<&str>,
    limit: i64,
) -> anyhow::Result<Vec<Booking>> {
    let (sql, params_vec): (String, Vec<Box<dyn rusqlite::types::ToSql>>) = match date_filter {
        Some(date) => (
            format!(
                "SELECT {BOOKING_COLUMNS} FROM bookings WHERE booking_date = ?1 \
                 ORDER BY created_at DESC LIMIT ?2"
            ),
            vec![
                Box::new(date.to_string()) as Box<dyn rusqlite::types::ToSql>,
                Box::new(limit),
            ],
        ),
        None => (
            format!("SELECT {BOOKING_COLUMNS} FROM bookings ORDER BY created_at DESC LIMIT ?1"),
            vec![Box::new(limit) as Box<dyn rusqlite::types::ToSql>],
        ),
    };

    let mut stmt = conn.prepare(&sql)?;
    let params_refs: Vec<&dyn rusqlite::types::ToSql> =
        params_vec.iter().map(|p| p.as_ref()).collect();
    let rows = stmt.query_map(params_refs.as_slice(), |row| Ok(parse_booking_row(row)))?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

// The slot list is a denormalized JSON column, so "any class on this date"
// is a substring scan over it.
pub fn get_bookings_for_date(conn: &Connection, date: &str) -> anyhow::Result<Vec<Booking>> {
    let needle = format!("%\"date\":\"{date}\"%");
    let sql = format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE slots LIKE ?1");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![needle], |row| Ok(parse_booking_row(row)))?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

pub fn update_booking_slots(
    conn: &Connection,
    id: &str,
    slots: &[TimeSlot],
) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE bookings SET slots = ?1, booking_date = ?2 WHERE id = ?3",
        params![
            serde_json::to_string(slots)?,
            slots.first().map(|s| s.date.clone()),
            id
        ],
    )?;
    Ok(count > 0)
}

pub fn update_booking_payments(
    conn: &Connection,
    id: &str,
    payments: &[PaymentDetail],
    is_paid: bool,
) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE bookings SET payment_details = ?1, is_paid = ?2 WHERE id = ?3",
        params![serde_json::to_string(payments)?, is_paid as i32, id],
    )?;
    Ok(count > 0)
}

// Unpaid holds free their seats once the hold expires.
pub fn delete_expired_holds(conn: &Connection, now: &NaiveDateTime) -> anyhow::Result<usize> {
    let count = conn.execute(
        "DELETE FROM bookings WHERE is_paid = 0 AND expires_at IS NOT NULL AND expires_at <= ?1",
        params![format_dt(now)],
    )?;
    Ok(count)
}

fn parse_booking_row(row: &rusqlite::Row) -> anyhow::Result<Booking> {
    let id: String = row.get(0)?;
    let booking_code: String = row.get(1)?;
    let product_type_str: String = row.get(2)?;
    let product_json: String = row.get(3)?;
    let user_info_json: String = row.get(4)?;
    let slots_json: String = row.get(5)?;
    let payments_json: String = row.get(6)?;
    let assignments_json: Option<String> = row.get(7)?;
    let participants: u32 = row.get(8)?;
    let price_str: String = row.get(9)?;
    let is_paid: bool = row.get::<_, i32>(10)? != 0;
    let booking_date: Option<String> = row.get(11)?;
    let expires_at_str: Option<String> = row.get(12)?;
    let client_note: Option<String> = row.get(13)?;
    let accepted_no_refund: bool = row.get::<_, i32>(14)? != 0;
    let created_at_str: String = row.get(15)?;

    let product_type = ProductType::parse(&product_type_str)
        .ok_or_else(|| anyhow::anyhow!("unknown product type in row {id}: {product_type_str}"))?;

    Ok(Booking {
        id,
        booking_code,
        product_type,
        product: serde_json::from_str(&product_json)?,
        user_info: serde_json::from_str(&user_info_json)?,
        slots: serde_json::from_str(&slots_json).unwrap_or_default(),
        participants,
        price: price_str.parse().unwrap_or(Decimal::ZERO),
        is_paid,
        payment_details: serde_json::from_str(&payments_json).unwrap_or_default(),
        group_assignments: assignments_json
            .as_deref()
            .and_then(|json| serde_json::from_str(json).ok()),
        booking_date,
        expires_at: expires_at_str.as_deref().map(parse_dt),
        client_note,
        accepted_no_refund,
        created_at: parse_dt(&created_at_str),
    })
}

// ── Customers ──

// Upsert keyed by email: removing someone's last slot must never lose their
// contact record.
pub fn ensure_standalone_customer(conn: &Connection, info: &UserInfo) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO customers (id, name, email, phone, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(email) DO UPDATE SET
           name = excluded.name,
           phone = excluded.phone",
        params![
            uuid::Uuid::new_v4().to_string(),
            info.name,
            info.email,
            info.phone,
            format_dt(&Utc::now().naive_utc()),
        ],
    )?;
    Ok(())
}

pub fn get_customers(conn: &Connection, limit: i64) -> anyhow::Result<Vec<Customer>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, email, phone, created_at FROM customers \
         ORDER BY created_at DESC LIMIT ?1",
    )?;
    let rows = stmt.query_map(params![limit], |row| {
        let created_at_str: String = row.get(4)?;
        Ok(Customer {
            id: row.get(0)?,
            name: row.get(1)?,
            email: row.get(2)?,
            phone: row.get(3)?,
            created_at: parse_dt(&created_at_str),
        })
    })?;

    let mut customers = vec![];
    for row in rows {
        customers.push(row?);
    }
    Ok(customers)
}

// ── Deliveries ──

const DELIVERY_COLUMNS: &str = "id, customer_email, description, scheduled_date, status, photos, \
     created_at, ready_at, completed_at, delivered_at";

pub fn create_delivery(conn: &Connection, delivery: &Delivery) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO deliveries (id, customer_email, description, scheduled_date, status, \
         photos, created_at, ready_at, completed_at, delivered_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            delivery.id,
            delivery.customer_email,
            delivery.description,
            delivery.scheduled_date,
            delivery.status.as_str(),
            serde_json::to_string(&delivery.photos)?,
            format_dt(&delivery.created_at),
            delivery.ready_at.as_ref().map(format_dt),
            delivery.completed_at.as_ref().map(format_dt),
            delivery.delivered_at.as_ref().map(format_dt),
        ],
    )?;
    Ok(())
}

pub fn get_delivery_by_id(conn: &Connection, id: &str) -> anyhow::Result<Option<Delivery>> {
    let sql = format!("SELECT {DELIVERY_COLUMNS} FROM deliveries WHERE id = ?1");
    let result = conn.query_row(&sql, params![id], |row| Ok(parse_delivery_row(row)));

    match result {
        Ok(delivery) => Ok(Some(delivery?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn get_deliveries(
    conn: &Connection,
    status_filter: Option<DeliveryStatus>,
    limit: i64,
) -> anyhow::Result<Vec<Delivery>> {
    let (sql, params_vec): (String, Vec<Box<dyn rusqlite::types::ToSql>>) = match status_filter {
        Some(status) => (
            format!(
                "SELECT {DELIVERY_COLUMNS} FROM deliveries WHERE status = ?1 \
                 ORDER BY scheduled_date ASC LIMIT ?2"
            ),
            vec![
                Box::new(status.as_str().to_string()) as Box<dyn rusqlite::types::ToSql>,
                Box::new(limit),
            ],
        ),
        None => (
            format!("SELECT {DELIVERY_COLUMNS} FROM deliveries ORDER BY scheduled_date ASC LIMIT ?1"),
            vec![Box::new(limit) as Box<dyn rusqlite::types::ToSql>],
        ),
    };

    let mut stmt = conn.prepare(&sql)?;
    let params_refs: Vec<&dyn rusqlite::types::ToSql> =
        params_vec.iter().map(|p| p.as_ref()).collect();
    let rows = stmt.query_map(params_refs.as_slice(), |row| Ok(parse_delivery_row(row)))?;

    let mut deliveries = vec![];
    for row in rows {
        deliveries.push(row??);
    }
    Ok(deliveries)
}

pub fn update_delivery(conn: &Connection, delivery: &Delivery) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE deliveries SET status = ?1, ready_at = ?2, completed_at = ?3, delivered_at = ?4 \
         WHERE id = ?5",
        params![
            delivery.status.as_str(),
            delivery.ready_at.as_ref().map(format_dt),
            delivery.completed_at.as_ref().map(format_dt),
            delivery.delivered_at.as_ref().map(format_dt),
            delivery.id,
        ],
    )?;
    Ok(count > 0)
}

fn parse_delivery_row(row: &rusqlite::Row) -> anyhow::Result<Delivery> {
    let id: String = row.get(0)?;
    let status_str: String = row.get(4)?;
    let photos_json: String = row.get(5)?;
    let created_at_str: String = row.get(6)?;
    let ready_at_str: Option<String> = row.get(7)?;
    let completed_at_str: Option<String> = row.get(8)?;
    let delivered_at_str: Option<String> = row.get(9)?;

    let status = DeliveryStatus::parse(&status_str)
        .ok_or_else(|| anyhow::anyhow!("unknown delivery status in row {id}: {status_str}"))?;

    Ok(Delivery {
        id,
        customer_email: row.get(1)?,
        description: row.get(2)?,
        scheduled_date: row.get(3)?,
        status,
        photos: serde_json::from_str(&photos_json).unwrap_or_default(),
        created_at: parse_dt(&created_at_str),
        ready_at: ready_at_str.as_deref().map(parse_dt),
        completed_at: completed_at_str.as_deref().map(parse_dt),
        delivered_at: delivered_at_str.as_deref().map(parse_dt),
    })
}

// ── Valentine registrations ──

const REGISTRATION_COLUMNS: &str =
    "id, full_name, birth_date, phone, email, workshop, participants, payment_proof_url, \
     status, created_at";

pub fn create_registration(
    conn: &Connection,
    registration: &ValentineRegistration,
) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO valentine_registrations (id, full_name, birth_date, phone, email, \
         workshop, participants, payment_proof_url, status, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            registration.id,
            registration.full_name,
            registration.birth_date,
            registration.phone,
            registration.email,
            registration.workshop.as_str(),
            registration.participants,
            registration.payment_proof_url,
            registration.status.as_str(),
            format_dt(&registration.created_at),
        ],
    )?;
    Ok(())
}

pub fn get_registration_by_id(
    conn: &Connection,
    id: &str,
) -> anyhow::Result<Option<ValentineRegistration>> {
    let sql = format!("SELECT {REGISTRATION_COLUMNS} FROM valentine_registrations WHERE id = ?1");
    let result = conn.query_row(&sql, params![id], |row| Ok(parse_registration_row(row)));

    match result {
        Ok(registration) => Ok(Some(registration?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn get_registrations(conn: &Connection) -> anyhow::Result<Vec<ValentineRegistration>> {
    let sql = format!(
        "SELECT {REGISTRATION_COLUMNS} FROM valentine_registrations ORDER BY created_at DESC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], |row| Ok(parse_registration_row(row)))?;

    let mut registrations = vec![];
    for row in rows {
        registrations.push(row??);
    }
    Ok(registrations)
}

// Cancelled registrations give their seats back.
pub fn count_workshop_participants(
    conn: &Connection,
    workshop: ValentineWorkshop,
) -> anyhow::Result<i64> {
    let count: i64 = conn.query_row(
        "SELECT COALESCE(SUM(participants), 0) FROM valentine_registrations \
         WHERE workshop = ?1 AND status != 'cancelled'",
        params![workshop.as_str()],
        |row| row.get(0),
    )?;
    Ok(count)
}

pub fn update_registration_status(
    conn: &Connection,
    id: &str,
    status: RegistrationStatus,
) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE valentine_registrations SET status = ?1 WHERE id = ?2",
        params![status.as_str(), id],
    )?;
    Ok(count > 0)
}

pub fn delete_registration(conn: &Connection, id: &str) -> anyhow::Result<bool> {
    let count = conn.execute(
        "DELETE FROM valentine_registrations WHERE id = ?1",
        params![id],
    )?;
    Ok(count > 0)
}

fn parse_registration_row(row: &rusqlite::Row) -> anyhow::Result<ValentineRegistration> {
    let id: String = row.get(0)?;
    let workshop_str: String = row.get(5)?;
    let status_str: String = row.get(8)?;
    let created_at_str: String = row.get(9)?;

    let workshop = ValentineWorkshop::parse(&workshop_str)
        .ok_or_else(|| anyhow::anyhow!("unknown workshop in row {id}: {workshop_str}"))?;
    let status = RegistrationStatus::parse(&status_str)
        .ok_or_else(|| anyhow::anyhow!("unknown registration status in row {id}: {status_str}"))?;

    Ok(ValentineRegistration {
        id,
        full_name: row.get(1)?,
        birth_date: row.get(2)?,
        phone: row.get(3)?,
        email: row.get(4)?,
        workshop,
        participants: row.get(6)?,
        payment_proof_url: row.get(7)?,
        status,
        created_at: parse_dt(&created_at_str),
    })
}

// ── Campaign prospects ──

pub struct Prospect {
    pub name: Option<String>,
    pub email: String,
    pub total_bookings: i64,
    pub last_booking: Option<String>,
}

// Past customers who have not registered for the seasonal workshops yet.
pub fn get_valentine_prospects(conn: &Connection, limit: i64) -> anyhow::Result<Vec<Prospect>> {
    let mut stmt = conn.prepare(
        "SELECT
            json_extract(user_info, '$.email') AS email,
            MAX(json_extract(user_info, '$.name')) AS name,
            COUNT(*) AS total_bookings,
            MAX(booking_date) AS last_booking
         FROM bookings
         WHERE json_extract(user_info, '$.email') IS NOT NULL
           AND json_extract(user_info, '$.email') NOT IN
               (SELECT email FROM valentine_registrations)
         GROUP BY json_extract(user_info, '$.email')
         ORDER BY total_bookings DESC, last_booking DESC
         LIMIT ?1",
    )?;

    let rows = stmt.query_map(params![limit], |row| {
        Ok(Prospect {
            email: row.get(0)?,
            name: row.get(1)?,
            total_bookings: row.get(2)?,
            last_booking: row.get(3)?,
        })
    })?;

    let mut prospects = vec![];
    for row in rows {
        prospects.push(row?);
    }
    Ok(prospects)
}
