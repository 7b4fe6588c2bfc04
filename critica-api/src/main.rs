//! # Critica API Server
//!
//! HTTP entry point for the Critica content-review platform: catalog
//! management, reviews and comments, role-based authorization, and the
//! email registration/activation flow.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p critica-api
//! ```

use critica_api::{
    app::{build_router, AppState},
    config::Config,
    mailer::{LogMailer, Mailer, SmtpMailer},
};
use critica_shared::db::{migrations, pool};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "critica_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "Critica API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;

    let db = pool::create_pool(pool::DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        ..Default::default()
    })
    .await?;

    migrations::run_migrations(&db).await?;

    let mailer: Arc<dyn Mailer> = match &config.smtp {
        Some(smtp) => Arc::new(SmtpMailer::new(smtp)?),
        None => {
            tracing::warn!("SMTP_HOST not set; confirmation codes will be logged, not mailed");
            Arc::new(LogMailer)
        }
    };

    let bind_address = config.bind_address();
    let state = AppState::new(db, config, mailer);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}
