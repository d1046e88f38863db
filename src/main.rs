use std::sync::{Arc, Mutex};

use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::EnvFilter;

use alma_studio::config::AppConfig;
use alma_studio::db;
use alma_studio::handlers;
use alma_studio::models::ValentineConfig;
use alma_studio::services::capacity::CapacityLimits;
use alma_studio::services::email::console::ConsoleProvider;
use alma_studio::services::email::resend::ResendProvider;
use alma_studio::services::email::EmailProvider;
use alma_studio::services::group::GroupConfig;
use alma_studio::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let conn = db::init_db(&config.database_url)?;

    let email: Box<dyn EmailProvider> = match config.email_provider.as_str() {
        "resend" => {
            anyhow::ensure!(
                !config.resend_api_key.is_empty(),
                "RESEND_API_KEY must be set when EMAIL_PROVIDER=resend"
            );
            tracing::info!("using Resend email provider (from: {})", config.email_from);
            Box::new(ResendProvider::new(
                config.resend_api_key.clone(),
                config.email_from.clone(),
            ))
        }
        _ => {
            tracing::info!("using console email provider");
            Box::new(ConsoleProvider)
        }
    };

    let state = Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        config: config.clone(),
        email,
        capacity: CapacityLimits::default(),
        group: GroupConfig::default(),
        valentine: ValentineConfig::default(),
    });

    // The old dashboard is served from another origin, so the API stays open.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(handlers::health::health))
        .route(
            "/api/availability",
            get(handlers::availability::get_availability),
        )
        .route(
            "/api/bookings",
            post(handlers::bookings::create_booking).get(handlers::bookings::get_bookings),
        )
        .route("/api/bookings/:id", get(handlers::bookings::get_booking))
        .route(
            "/api/bookings/:id/payments",
            post(handlers::bookings::add_payment),
        )
        .route(
            "/api/bookings/:id/payments/:index",
            delete(handlers::bookings::delete_payment),
        )
        .route(
            "/api/bookings/:id/reschedule",
            post(handlers::bookings::reschedule_slot),
        )
        .route(
            "/api/bookings/:id/slots/delete",
            post(handlers::bookings::delete_slot),
        )
        .route("/api/customers", get(handlers::customers::get_customers))
        .route(
            "/api/deliveries",
            get(handlers::deliveries::get_deliveries).post(handlers::deliveries::create_delivery),
        )
        .route(
            "/api/deliveries/:id",
            get(handlers::deliveries::get_delivery),
        )
        .route(
            "/api/deliveries/:id/status",
            post(handlers::deliveries::update_status),
        )
        .route(
            "/api/valentine",
            get(handlers::valentine::get_actions)
                .post(handlers::valentine::post_actions)
                .put(handlers::valentine::put_actions)
                .delete(handlers::valentine::delete_actions),
        )
        .layer(cors)
        .with_state(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
