use crate::model::{
    CrudRepository, DbConnection, ModelManager,
    entity::{UserEntity, UserEntityCreateUpdate},
};
use crate::utils::signal::shutdown_signal;
use crate::web::{AuthenticatedUser, UserRole};
use crate::{error::AppResult, web::AppState};
use axum::Router;
use tokio::net::TcpListener;

pub mod config;
pub use config::{Config, ConfigError, ConfigResult};

pub mod auth;
pub mod error;
pub mod grading;
pub mod model;
pub mod utils;
pub mod web;

pub static APPLICATION_NAME: &str = "skillnest";

pub async fn build_server() -> AppResult<(AppState, Router)> {
    let use_local = cfg!(debug_assertions);
    let config = config::Config::get_or_init(use_local).await;

    let db = DbConnection::connect(config.app().database_uri())?;
    db.migrate().await?;

    let mm = ModelManager::new(db);
    seed_admin(&mm, config).await?;

    let state = AppState::new(mm, config);
    let app = web::routes::build_app(state.clone());
    Ok((state, app))
}

/// Router over an existing pool. Migrations and seeding are left to the caller.
pub async fn build_server_with_pool(db: DbConnection) -> AppResult<(AppState, Router)> {
    let config = config::Config::get_or_init(true).await;

    let mm = ModelManager::new(db);
    let state = AppState::new(mm, config);
    let app = web::routes::build_app(state.clone());
    Ok((state, app))
}

/// Creates the configured admin account unless a user with that name exists.
#[tracing::instrument(skip_all)]
pub async fn seed_admin(mm: &ModelManager, config: &Config) -> AppResult<()> {
    let actor = AuthenticatedUser::admin();
    let admin = config.admin();

    if UserEntity::find_by_username(mm, &actor, admin.username())
        .await?
        .is_some()
    {
        return Ok(());
    }

    let hash = auth::hash_password(admin.password())?;
    let created = UserEntity::create(
        mm,
        &actor,
        UserEntityCreateUpdate {
            username: admin.username().to_string(),
            password_hash: hash,
            role: UserRole::Admin,
        },
    )
    .await?;

    tracing::info!(user_id = %created.id(), "admin account created");
    Ok(())
}

#[tracing::instrument]
pub async fn setup_workers() -> AppResult<()> {
    let (state, app) = build_server().await?;
    let config = state.config();
    let listener = TcpListener::bind(config.host().bindto()).await?;

    tracing::info!("{} is listening at: {}", APPLICATION_NAME, config.host().bindto());
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn setup_trace() {
    use tracing_error::ErrorLayer;
    use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

    // load .env file for RUST_LOG etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .with(ErrorLayer::default())
        .init();

    tracing::debug!("tracing initialized.");
}

#[tracing::instrument]
pub async fn run() -> AppResult<()> {
    setup_trace();
    setup_workers().await?;
    Ok(())
}
