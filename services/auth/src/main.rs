use std::sync::Arc;

use anyhow::Result;
use tracing::{Level, info};
use tracing_subscriber::EnvFilter;

mod error;
mod models;
mod password;
mod rate_limiter;
mod routes;
mod service;
mod store;
mod token;
mod validation;

use common::database::{DatabaseConfig, health_check, init_pool};

use crate::rate_limiter::{LoginThrottle, ThrottleConfig};
use crate::service::AuthService;
use crate::store::PgCredentialStore;
use crate::token::{TokenConfig, TokenService};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub auth_service: AuthService,
    pub login_throttle: LoginThrottle,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_max_level(Level::INFO)
        .init();

    info!("Starting authentication service");

    // Initialize database connection pool
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;

    // Check database connectivity
    if health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    // Initialize token service
    let token_config = TokenConfig::from_env()?;
    let token_service = TokenService::new(&token_config);

    let store = Arc::new(PgCredentialStore::new(pool));
    let auth_service = AuthService::new(store, token_service);
    let login_throttle = LoginThrottle::new(ThrottleConfig::default());

    let app_state = AppState {
        auth_service,
        login_throttle,
    };

    // Start the web server
    let app = routes::create_router(app_state);

    let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
    info!("Authentication service listening on 0.0.0.0:3000");

    axum::serve(listener, app).await?;

    Ok(())
}
