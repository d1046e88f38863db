use std::time::Duration;

use tracing_subscriber::EnvFilter;

use alma_studio::config::AppConfig;
use alma_studio::db::{self, queries};
use alma_studio::services::campaign::send_last_chance;
use alma_studio::services::email::console::ConsoleProvider;
use alma_studio::services::email::resend::ResendProvider;
use alma_studio::services::email::EmailProvider;

// One-shot last-chance campaign, run by hand from a terminal. Exits 0 when
// at least one email went out.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let email: Box<dyn EmailProvider> = match config.email_provider.as_str() {
        "resend" => {
            anyhow::ensure!(
                !config.resend_api_key.is_empty(),
                "RESEND_API_KEY must be set when EMAIL_PROVIDER=resend"
            );
            Box::new(ResendProvider::new(
                config.resend_api_key.clone(),
                config.email_from.clone(),
            ))
        }
        _ => {
            tracing::warn!("EMAIL_PROVIDER is not 'resend'; emails go to the log only");
            Box::new(ConsoleProvider)
        }
    };

    let prospects = {
        let conn = db::init_db(&config.database_url)?;
        queries::get_valentine_prospects(&conn, 500)?
    };
    tracing::info!(count = prospects.len(), "prospects loaded");

    let throttle = Duration::from_millis(config.campaign_throttle_ms);
    let outcome = send_last_chance(&prospects, email.as_ref(), throttle).await;

    tracing::info!(sent = outcome.sent, failed = outcome.failed, "campaign finished");

    if outcome.sent == 0 {
        std::process::exit(1);
    }
    Ok(())
}
