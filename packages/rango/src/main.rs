use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use rango::config::AppConfig;
use rango::state::AppState;
use rango::{database, seed, session, templates};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rango=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;

    let db = database::init_db(&config.database.url)
        .await
        .context("Failed to initialize database")?;

    let cleared = session::clear_expired(&db).await?;
    if cleared > 0 {
        info!("Removed {} expired sessions", cleared);
    }

    if config.seed.enabled {
        seed::seed_sample_data(&db)
            .await
            .context("Failed to seed sample data")?;
    }

    let templates = templates::load().context("Failed to load templates")?;

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;

    let state = AppState {
        db,
        config,
        templates: Arc::new(templates),
    };
    let app = rango::build_router(state);

    info!("Rango listening on http://{}/rango/", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
