//! Foundation entry-point: loads settings, opens the store and serves HTTP.

use actix_web::web;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use foundation::inbound::http::health::HealthState;
use foundation::outbound::persistence::{DbPool, PoolConfig};
use foundation::server::{ServerConfig, create_server, install_error_registry};
use foundation::settings::FoundationSettings;

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let health_state = web::Data::new(HealthState::new());
    install_error_registry(&health_state);

    let settings =
        FoundationSettings::load().map_err(|err| std::io::Error::other(err.to_string()))?;
    if !settings.has_session_secret() {
        warn!("FOUNDATION_SESSION_SECRET unset; signing sessions with the built-in secret");
    }
    let mut config = ServerConfig::from_settings(&settings).map_err(std::io::Error::other)?;
    if let Some(pool_config) = PoolConfig::from_settings(&settings) {
        let pool = DbPool::new(pool_config)
            .await
            .map_err(std::io::Error::other)?;
        config = config.with_db_pool(pool);
    }

    let server = create_server(health_state.clone(), config)?;
    let outcome = server.await;
    health_state.mark_unhealthy();
    info!("foundation stopped");
    outcome
}
