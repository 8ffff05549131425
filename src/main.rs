use std::net::SocketAddr;

use anyhow::Context;
use harvestpay::{config::Config, create_app, db, AppState};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env (if present) before reading configuration
    let _ = dotenvy::dotenv();

    // Logging first, so configuration notices are not lost
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Config::log_level_from_env()?)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    let config = Config::from_env()?;

    let db = db::connect(&config.database_url)
        .await
        .context("failed to open database")?;
    let state = AppState::from_config(db, &config).context("failed to set up mail transport")?;

    let app = create_app(state);
    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    tracing::info!("Server running on http://{}", config.bind_addr);

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;
    Ok(())
}
