//! # TalentGrid API Server
//!
//! Serves the membership registry (identities, organizations, memberships)
//! and the records hanging off it: profiles, job postings, applications,
//! gigs and conversations.
//!
//! ## Usage
//!
//! ```bash
//! DATABASE_URL=postgresql://localhost/talentgrid cargo run -p talentgrid-api
//! ```

use talentgrid_api::{
    app::{build_router, AppState},
    config::{Config, LogFormat},
};
use talentgrid_shared::db::{
    migrations::{get_migration_status, run_migrations},
    pool::{close_pool, create_pool},
};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "talentgrid_api=debug,talentgrid_shared=info,tower_http=debug".into()
    });

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    init_tracing(config.log_format);

    info!(
        "TalentGrid API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let pool = create_pool(config.database.pool_config()).await?;
    if config.database.run_migrations {
        run_migrations(&pool).await?;
    }

    let migrations = get_migration_status(&pool).await?;
    if migrations.is_up_to_date() {
        info!(
            applied = migrations.applied_migrations,
            latest = ?migrations.latest_version,
            "Schema up to date"
        );
    } else {
        warn!(
            applied = migrations.applied_migrations,
            "Schema has pending migrations; set RUN_MIGRATIONS=true or apply them manually"
        );
    }

    let bind_address = config.bind_address();
    let state = AppState::new(pool.clone(), config)?;
    if let Some(client) = &state.enrichment {
        info!(url = client.base_url(), "Enrichment enabled");
    }

    let app = build_router(state);
    let listener = TcpListener::bind(&bind_address).await?;
    info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    close_pool(pool).await;
    info!("Server stopped");

    Ok(())
}
