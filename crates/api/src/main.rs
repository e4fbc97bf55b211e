use std::sync::Arc;

use doorsign_api::{build_router, state::AppState};
use doorsign_config::Settings;
use doorsign_db::{connect, indexes::ensure_indexes};
use doorsign_services::background::{AutoResetService, start_auto_reset};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file (silently ignore if missing)
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "doorsign_api=debug,doorsign_services=debug,doorsign_db=debug,tower_http=debug".into()
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load config
    let settings = Settings::load()?;
    info!(
        "Starting Doorsign API on {}:{}",
        settings.app.host, settings.app.port
    );

    // Connect to MongoDB
    let db = connect(&settings).await?;

    // Ensure indexes
    ensure_indexes(&db).await?;

    // Daily status auto-reset sweep; disabled in tests.
    let _scheduler = if settings.scheduler.auto_reset_enabled {
        let service = Arc::new(AutoResetService::new(&db));
        Some(start_auto_reset(service).await?)
    } else {
        None
    };

    // Build app state and router
    let app_state = AppState::new(db, settings.clone());
    let app = build_router(app_state);

    // Start server
    let addr = format!("{}:{}", settings.app.host, settings.app.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
