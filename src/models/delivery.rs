use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Pending,
    Ready,
    Completed,
}

impl DeliveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStatus::Pending => "pending",
            DeliveryStatus::Ready => "ready",
            DeliveryStatus::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(DeliveryStatus::Pending),
            "ready" => Some(DeliveryStatus::Ready),
            "completed" => Some(DeliveryStatus::Completed),
            _ => None,
        }
    }
}

#[derive(Debug, PartialEq)]
pub struct InvalidTransition {
    pub from: DeliveryStatus,
    pub to: DeliveryStatus,
}

impl std::fmt::Display for InvalidTransition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "transición de entrega inválida: {} → {}",
            self.from.as_str(),
            self.to.as_str()
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Delivery {
    pub id: String,
    pub customer_email: String,
    pub description: String,
    pub scheduled_date: String,
    pub status: DeliveryStatus,
    #[serde(default)]
    pub photos: Vec<String>,
    pub created_at: NaiveDateTime,
    #[serde(default)]
    pub ready_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub completed_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub delivered_at: Option<NaiveDateTime>,
}

impl Delivery {
    // "overdue" is never stored; it is how a pending delivery past its date
    // reads on screen.
    pub fn effective_status(&self, today: NaiveDate) -> &'static str {
        if self.status == DeliveryStatus::Pending {
            if let Ok(scheduled) = NaiveDate::parse_from_str(&self.scheduled_date, "%Y-%m-%d") {
                if scheduled < today {
                    return "overdue";
                }
            }
        }
        self.status.as_str()
    }

    pub fn transition(
        &mut self,
        to: DeliveryStatus,
        now: NaiveDateTime,
    ) -> Result<(), InvalidTransition> {
        match (self.status, to) {
            (DeliveryStatus::Pending, DeliveryStatus::Ready) => {
                self.status = DeliveryStatus::Ready;
                self.ready_at = Some(now);
                Ok(())
            }
            (DeliveryStatus::Ready, DeliveryStatus::Completed) => {
                self.status = DeliveryStatus::Completed;
                self.completed_at = Some(now);
                self.delivered_at = Some(now);
                Ok(())
            }
            (from, to) => Err(InvalidTransition { from, to }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delivery(status: DeliveryStatus, scheduled: &str) -> Delivery {
        Delivery {
            id: "d1".to_string(),
            customer_email: "ana@example.com".to_string(),
            description: "cuenco de torno".to_string(),
            scheduled_date: scheduled.to_string(),
            status,
            photos: vec![],
            created_at: NaiveDateTime::parse_from_str("2026-01-10 12:00:00", "%Y-%m-%d %H:%M:%S")
                .unwrap(),
            ready_at: None,
            completed_at: None,
            delivered_at: None,
        }
    }

    fn now() -> NaiveDateTime {
        NaiveDateTime::parse_from_str("2026-02-01 09:00:00", "%Y-%m-%d %H:%M:%S").unwrap()
    }

    #[test]
    fn test_linear_lifecycle() {
        let mut d = delivery(DeliveryStatus::Pending, "2026-02-10");
        d.transition(DeliveryStatus::Ready, now()).unwrap();
        assert_eq!(d.status, DeliveryStatus::Ready);
        assert!(d.ready_at.is_some());

        d.transition(DeliveryStatus::Completed, now()).unwrap();
        assert_eq!(d.status, DeliveryStatus::Completed);
        assert!(d.completed_at.is_some());
        assert!(d.delivered_at.is_some());
    }

    #[test]
    fn test_illegal_transitions() {
        let mut d = delivery(DeliveryStatus::Pending, "2026-02-10");
        let err = d.transition(DeliveryStatus::Completed, now()).unwrap_err();
        assert_eq!(err.from, DeliveryStatus::Pending);
        assert_eq!(err.to, DeliveryStatus::Completed);

        let mut d = delivery(DeliveryStatus::Completed, "2026-02-10");
        assert!(d.transition(DeliveryStatus::Ready, now()).is_err());
        assert!(d.transition(DeliveryStatus::Completed, now()).is_err());
    }

    #[test]
    fn test_overdue_is_derived() {
        let today = NaiveDate::parse_from_str("2026-02-01", "%Y-%m-%d").unwrap();

        let d = delivery(DeliveryStatus::Pending, "2026-01-20");
        assert_eq!(d.effective_status(today), "overdue");

        let d = delivery(DeliveryStatus::Pending, "2026-02-05");
        assert_eq!(d.effective_status(today), "pending");

        // ready/completed never become overdue
        let d = delivery(DeliveryStatus::Ready, "2026-01-20");
        assert_eq!(d.effective_status(today), "ready");
    }
}
