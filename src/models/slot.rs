use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use super::Technique;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TimeSlot {
    pub date: String,
    pub time: String,
    #[serde(default)]
    pub instructor_id: Option<String>,
    #[serde(default)]
    pub technique: Option<Technique>,
    #[serde(default)]
    pub no_refund: bool,
}

impl TimeSlot {
    pub fn validate(&self) -> anyhow::Result<()> {
        parse_date(&self.date)?;
        parse_time(&self.time)?;
        Ok(())
    }

    pub fn datetime(&self) -> Option<NaiveDateTime> {
        let date = NaiveDate::parse_from_str(&self.date, "%Y-%m-%d").ok()?;
        let time = NaiveTime::parse_from_str(&self.time, "%H:%M").ok()?;
        Some(date.and_time(time))
    }

    pub fn matches(&self, date: &str, time: &str) -> bool {
        self.date == date && self.time == time
    }
}

pub fn parse_date(s: &str) -> anyhow::Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| anyhow::anyhow!("fecha inválida: {s} (se espera AAAA-MM-DD)"))
}

pub fn parse_time(s: &str) -> anyhow::Result<NaiveTime> {
    NaiveTime::parse_from_str(s, "%H:%M")
        .map_err(|_| anyhow::anyhow!("hora inválida: {s} (se espera HH:MM)"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(date: &str, time: &str) -> TimeSlot {
        TimeSlot {
            date: date.to_string(),
            time: time.to_string(),
            instructor_id: Some("marta".to_string()),
            technique: None,
            no_refund: false,
        }
    }

    #[test]
    fn test_validate_ok() {
        assert!(slot("2026-06-10", "10:00").validate().is_ok());
    }

    #[test]
    fn test_validate_bad_date() {
        assert!(slot("10/06/2026", "10:00").validate().is_err());
        assert!(slot("2026-13-01", "10:00").validate().is_err());
    }

    #[test]
    fn test_validate_bad_time() {
        assert!(slot("2026-06-10", "25:00").validate().is_err());
        assert!(slot("2026-06-10", "10h").validate().is_err());
    }

    #[test]
    fn test_datetime() {
        let dt = slot("2026-06-10", "10:30").datetime().unwrap();
        assert_eq!(dt.to_string(), "2026-06-10 10:30:00");
        assert!(slot("bad", "10:30").datetime().is_none());
    }

    #[test]
    fn test_serde_camel_case() {
        let json = serde_json::to_value(slot("2026-06-10", "10:00")).unwrap();
        assert_eq!(json["instructorId"], "marta");
        assert_eq!(json["noRefund"], false);
    }
}
