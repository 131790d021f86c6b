use std::env;
use std::sync::Arc;

use anyhow::Result;
use aws_config::BehaviorVersion;
use tracing::{Level, info};
use tracing_subscriber::EnvFilter;

mod assets;
mod error;
mod guard;
mod locks;
mod models;
mod routes;
mod service;
mod state;
mod store;

use common::database::{DatabaseConfig, health_check, init_pool};

use crate::assets::{S3AssetBackend, S3Config, TransformPolicy};
use crate::guard::TokenVerifier;
use crate::service::PhotoLifecycle;
use crate::state::AppState;
use crate::store::PgPhotoStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_max_level(Level::INFO)
        .init();

    info!("Starting photos service");

    // Initialize database connection pool
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;

    // Check database connectivity
    if health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    // Initialize AWS S3 client
    let aws_config = aws_config::load_defaults(BehaviorVersion::latest()).await;
    let s3_client = aws_sdk_s3::Client::new(&aws_config);
    let s3_config = S3Config::from_env();
    let assets = Arc::new(S3AssetBackend::new(s3_client, s3_config));

    // The token secret is shared with the auth service.
    let token_secret = env::var("TOKEN_SECRET")
        .map_err(|_| anyhow::anyhow!("TOKEN_SECRET environment variable not set"))?;
    let token_verifier = TokenVerifier::new(&token_secret);

    let store = Arc::new(PgPhotoStore::new(pool));
    let lifecycle = PhotoLifecycle::new(store, assets, TransformPolicy::from_env());

    let app_state = AppState {
        lifecycle,
        token_verifier,
    };

    // Start the web server
    let app = routes::create_router(app_state);

    let listener = tokio::net::TcpListener::bind("0.0.0.0:3001").await?;
    info!("Photos service listening on 0.0.0.0:3001");

    axum::serve(listener, app).await?;

    Ok(())
}
