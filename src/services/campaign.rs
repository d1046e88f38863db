use std::time::Duration;

use serde::Serialize;

use crate::db::queries::Prospect;

use super::email::EmailProvider;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignOutcome {
    pub sent: u32,
    pub failed: u32,
}

// Sequential on purpose: the pause between sends keeps the email provider's
// rate limiter happy, nothing more.
pub async fn send_last_chance(
    prospects: &[Prospect],
    email: &dyn EmailProvider,
    throttle: Duration,
) -> CampaignOutcome {
    let mut outcome = CampaignOutcome { sent: 0, failed: 0 };

    for (i, prospect) in prospects.iter().enumerate() {
        if i > 0 && !throttle.is_zero() {
            tokio::time::sleep(throttle).await;
        }

        let subject = "Última oportunidad: talleres de San Valentín en Alma";
        let html = last_chance_html(prospect);

        match email.send(&prospect.email, subject, &html).await {
            Ok(()) => {
                outcome.sent += 1;
                tracing::info!(to = %prospect.email, "campaign email sent");
            }
            Err(e) => {
                outcome.failed += 1;
                tracing::error!(error = %e, to = %prospect.email, "campaign email failed");
            }
        }
    }

    outcome
}

fn last_chance_html(prospect: &Prospect) -> String {
    let greeting = match prospect.name.as_deref() {
        Some(name) if !name.is_empty() => format!("Hola {name},"),
        _ => "Hola,".to_string(),
    };
    format!(
        "<p>{greeting}</p>\
         <p>Quedan las últimas plazas para los talleres de San Valentín del \
         estudio. Torno, modelado o pintura en pareja: una tarde de barro y \
         buena compañía.</p>\
         <p>Reserva la tuya antes de que se agoten.</p>\
         <p>— El equipo de Alma</p>"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    struct RecordingEmail {
        sent: Arc<Mutex<Vec<String>>>,
        fail_for: Option<String>,
    }

    #[async_trait]
    impl crate::services::email::EmailProvider for RecordingEmail {
        async fn send(&self, to: &str, _subject: &str, _html: &str) -> anyhow::Result<()> {
            if self.fail_for.as_deref() == Some(to) {
                anyhow::bail!("provider rejected {to}");
            }
            self.sent.lock().unwrap().push(to.to_string());
            Ok(())
        }
    }

    fn prospect(email: &str) -> Prospect {
        Prospect {
            name: Some("Ana".to_string()),
            email: email.to_string(),
            total_bookings: 2,
            last_booking: Some("2025-11-02".to_string()),
        }
    }

    #[tokio::test]
    async fn test_sends_to_every_prospect() {
        let sent = Arc::new(Mutex::new(vec![]));
        let email = RecordingEmail {
            sent: Arc::clone(&sent),
            fail_for: None,
        };
        let prospects = vec![prospect("a@example.com"), prospect("b@example.com")];

        let outcome = send_last_chance(&prospects, &email, Duration::ZERO).await;
        assert_eq!(outcome, CampaignOutcome { sent: 2, failed: 0 });
        assert_eq!(*sent.lock().unwrap(), vec!["a@example.com", "b@example.com"]);
    }

    #[tokio::test]
    async fn test_failures_are_counted_not_fatal() {
        let sent = Arc::new(Mutex::new(vec![]));
        let email = RecordingEmail {
            sent: Arc::clone(&sent),
            fail_for: Some("b@example.com".to_string()),
        };
        let prospects = vec![
            prospect("a@example.com"),
            prospect("b@example.com"),
            prospect("c@example.com"),
        ];

        let outcome = send_last_chance(&prospects, &email, Duration::ZERO).await;
        assert_eq!(outcome, CampaignOutcome { sent: 2, failed: 1 });
    }

    #[tokio::test]
    async fn test_empty_prospect_list() {
        let email = RecordingEmail {
            sent: Arc::new(Mutex::new(vec![])),
            fail_for: None,
        };
        let outcome = send_last_chance(&[], &email, Duration::ZERO).await;
        assert_eq!(outcome, CampaignOutcome { sent: 0, failed: 0 });
    }
}
