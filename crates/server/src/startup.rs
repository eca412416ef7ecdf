use std::{env, net::SocketAddr};

use axum::Router;
use common::utils::logging::init_logging_from_env;
use dotenvy::dotenv;
use migration::MigratorTrait;
use service::auth::service::AuthConfig;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::errors::StartupError;
use crate::routes;
use crate::state::ServerState;

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// Load host/port from configs or env vars, with sensible fallbacks
fn load_bind_addr(cfg: Option<&configs::AppConfig>) -> anyhow::Result<SocketAddr> {
    let (host, port) = match cfg {
        Some(cfg) => (cfg.server.host.clone(), cfg.server.port),
        None => {
            let host = env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
            let port = env::var("SERVER_PORT")
                .ok()
                .and_then(|p| p.parse::<u16>().ok())
                .unwrap_or(8081);
            (host, port)
        }
    };
    Ok(format!("{}:{}", host, port).parse()?)
}

fn auth_config(cfg: Option<&configs::AppConfig>) -> Result<AuthConfig, StartupError> {
    if let Some(cfg) = cfg {
        return Ok(AuthConfig::from(&cfg.auth));
    }
    let secret = env::var("JWT_SECRET")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| StartupError::InvalidConfig("JWT_SECRET is required when config.toml is absent".into()))?;
    let ttl = env::var("TOKEN_TTL_HOURS").ok().and_then(|v| v.parse().ok()).unwrap_or(12);
    Ok(AuthConfig::new(secret, ttl))
}

/// Wire Postgres-backed services and apply pending migrations.
async fn build_state(cfg: Option<&configs::AppConfig>) -> Result<ServerState, StartupError> {
    let auth = auth_config(cfg)?;
    let db_cfg = match cfg {
        Some(cfg) => models::db::DatabaseConfig::from(cfg.database.clone()),
        None => models::db::DatabaseConfig::from_env(),
    };
    let db = models::db::connect_with_config(&db_cfg).await?;
    migration::Migrator::up(&db, None).await.map_err(anyhow::Error::from)?;
    info!("database ready, migrations applied");
    Ok(ServerState::with_db(db, auth))
}

pub fn app(state: ServerState) -> Router {
    routes::build_router(build_cors(), state)
}

/// Public entry: build the app and run the HTTP server
pub async fn run() -> anyhow::Result<()> {
    dotenv().ok();
    init_logging_from_env();

    let cfg = match configs::AppConfig::load_and_validate() {
        Ok(cfg) => Some(cfg),
        Err(e) if e.downcast_ref::<std::io::Error>().is_some_and(|io| io.kind() == std::io::ErrorKind::NotFound) => {
            tracing::warn!("config.toml not found, falling back to environment");
            None
        }
        Err(e) => return Err(e),
    };

    let state = build_state(cfg.as_ref()).await?;
    let app = app(state);

    let addr = load_bind_addr(cfg.as_ref())?;
    info!(%addr, "starting storage api");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
        })
        .await?;
    Ok(())
}
