//! Server initialization and routing

use crate::api;
use crate::config::Config;
use crate::engine::HttpSearchEngine;
use crate::jwt::JwtManager;
use crate::policy::AuthzEngine;
use crate::repository::{
    lead::LeadRepositoryImpl, rbac::RbacRepositoryImpl, search::SearchQueryRepositoryImpl,
    stats::StatsRepositoryImpl, user::UserRepositoryImpl,
};
use crate::service::{
    bootstrap, AuthService, DashboardService, LeadService, RbacAdminService, SearchService,
    UserService,
};
use anyhow::{Context, Result};
use axum::{
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db_pool: PgPool,
    pub authz: Arc<AuthzEngine<UserRepositoryImpl>>,
    pub auth_service: Arc<AuthService<UserRepositoryImpl>>,
    pub user_service: Arc<UserService<UserRepositoryImpl, RbacRepositoryImpl>>,
    pub rbac_service: Arc<RbacAdminService<RbacRepositoryImpl>>,
    pub search_service:
        Arc<SearchService<SearchQueryRepositoryImpl, LeadRepositoryImpl, HttpSearchEngine>>,
    pub lead_service: Arc<LeadService<LeadRepositoryImpl>>,
    pub dashboard_service: Arc<DashboardService<StatsRepositoryImpl>>,
}

/// Build the application state from a connected pool
pub fn build_state(config: Config, db_pool: PgPool) -> Result<AppState> {
    let jwt_manager = JwtManager::new(config.jwt.clone());

    let user_repo = Arc::new(UserRepositoryImpl::new(db_pool.clone()));
    let rbac_repo = Arc::new(RbacRepositoryImpl::new(db_pool.clone()));
    let search_repo = Arc::new(SearchQueryRepositoryImpl::new(db_pool.clone()));
    let lead_repo = Arc::new(LeadRepositoryImpl::new(db_pool.clone()));
    let stats_repo = Arc::new(StatsRepositoryImpl::new(db_pool.clone()));
    let engine = Arc::new(HttpSearchEngine::new(&config.engine)?);

    Ok(AppState {
        authz: Arc::new(AuthzEngine::new(user_repo.clone(), jwt_manager.clone())),
        auth_service: Arc::new(AuthService::new(user_repo.clone(), jwt_manager)),
        user_service: Arc::new(UserService::new(user_repo.clone(), rbac_repo.clone())),
        rbac_service: Arc::new(RbacAdminService::new(rbac_repo)),
        search_service: Arc::new(SearchService::new(search_repo, lead_repo.clone(), engine)),
        lead_service: Arc::new(LeadService::new(lead_repo)),
        dashboard_service: Arc::new(DashboardService::new(stats_repo)),
        config: Arc::new(config),
        db_pool,
    })
}

/// Build the HTTP router
pub fn router(state: AppState) -> Router {
    let cors = cors_layer(&state.config);

    Router::new()
        .route("/health", get(api::health::health))
        // Authentication
        .route("/api/auth/login", post(api::auth::login))
        .route("/api/auth/register", post(api::auth::register))
        .route("/api/auth/refresh", post(api::auth::refresh))
        .route("/api/auth/me", get(api::auth::me))
        // Searches
        .route("/api/search/start", post(api::search::start_search))
        .route("/api/search/execute/{id}", post(api::search::execute_search))
        .route("/api/search/list", get(api::search::list_searches))
        .route("/api/search/{id}", get(api::search::get_search))
        // Leads
        .route("/api/leads/list", get(api::lead::list_leads))
        .route("/api/leads/export", get(api::lead::export_leads))
        .route("/api/leads/{id}", get(api::lead::get_lead))
        // Users
        .route("/api/users/list", get(api::user::list_users))
        .route("/api/users/pending", get(api::user::list_pending_users))
        .route(
            "/api/users/{id}",
            get(api::user::get_user)
                .put(api::user::update_user)
                .delete(api::user::delete_user),
        )
        .route("/api/users/{id}/approve", post(api::user::approve_user))
        // Roles
        .route("/api/roles/list", get(api::role::list_roles))
        .route("/api/roles/permissions", get(api::role::list_permissions))
        .route("/api/roles/create", post(api::role::create_role))
        .route(
            "/api/roles/{id}",
            get(api::role::get_role)
                .put(api::role::update_role)
                .delete(api::role::delete_role),
        )
        // Dashboard
        .route("/api/dashboard/stats", get(api::dashboard::stats))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Connect, migrate, bootstrap, then serve HTTP until shutdown
pub async fn run(config: Config) -> Result<()> {
    let db_pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect(&config.database.url)
        .await
        .context("Failed to connect to PostgreSQL")?;

    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await
        .context("Failed to run database migrations")?;

    let user_repo = UserRepositoryImpl::new(db_pool.clone());
    let rbac_repo = RbacRepositoryImpl::new(db_pool.clone());
    bootstrap::run(&user_repo, &rbac_repo, &config.superadmin)
        .await
        .context("Bootstrap failed")?;

    let addr = config.http_addr();
    let state = build_state(config, db_pool)?;
    let app = router(state);

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("HTTP server listening on {}", addr);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
