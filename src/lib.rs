pub mod api;
pub mod config;
pub mod logic;
pub mod model;
pub mod seed;
pub mod services;
pub mod store;

// Export API types
pub use api::handlers;
pub use api::routes;

pub use model::*;

// Export store types
pub use store::{CityInfoRepository, CityInfoStore, InMemoryStore, PostgresStore};

use std::sync::Arc;

use crate::api::{create_router, AppState};
use crate::config::{AppConfig, StoreBackend};
use crate::services::{mail_service_from_config, MailService};

/// Build the application router around an already constructed store
pub fn create_app<S: CityInfoStore + 'static>(
    store: Arc<S>,
    mail: Arc<dyn MailService>,
) -> axum::Router {
    create_router().with_state(AppState::new(store, mail))
}

/// Load configuration, build the configured store and serve until shutdown
pub async fn run_server() -> anyhow::Result<()> {
    // Load environment variables from .env file if it exists
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;
    log::info!(
        "Configuration loaded: server={}, store={:?}, mail={:?}",
        config.server_address(),
        config.database.backend,
        config.mail.provider
    );

    let mail = mail_service_from_config(&config.mail);

    match config.database.backend {
        StoreBackend::Memory => {
            let store = Arc::new(InMemoryStore::new());
            serve_with_store(store, mail, &config).await
        }
        StoreBackend::Postgres => {
            log::info!("Connecting to PostgreSQL...");
            let database_url = config.database_url()?;
            let store = PostgresStore::new(&database_url, config.database.max_connections).await?;
            store.migrate().await?;
            serve_with_store(Arc::new(store), mail, &config).await
        }
    }
}

async fn serve_with_store<S: CityInfoStore + 'static>(
    store: Arc<S>,
    mail: Arc<dyn MailService>,
    config: &AppConfig,
) -> anyhow::Result<()> {
    if config.database.seed {
        let inserted = seed::ensure_seed_data(&*store).await?;
        if inserted > 0 {
            log::info!("Seeded {} cities", inserted);
        }
    }

    let app = create_app(store, mail);

    let bind_address = config.server_address();
    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    log::info!("City info API running on http://{}", bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}
