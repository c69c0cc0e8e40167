//! Redressa API composition root.

#![forbid(unsafe_code)]

mod auth;
mod dto;
mod error;
mod handlers;
mod middleware;
mod state;

use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::sync::Arc;

use axum::Router;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, Method};
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{get, post};
use redressa_application::{
    AccountService, FormattingService, GrievanceService, OAuthStateService, RateLimitRule,
    RateLimitService, RoleDirectory,
};
use redressa_core::AppError;
use redressa_infrastructure::{
    Argon2PasswordHasher, FsBlobStore, HttpTextFormatter, PostgresGrievanceRepository,
    PostgresRateLimitRepository, PostgresRoleDirectory, PostgresUserRepository,
};
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tower_sessions::cookie::SameSite;
use tower_sessions::cookie::time::Duration;
use tower_sessions::{Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::PostgresStore;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::state::{AppState, OAuthProviderConfig};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let migrate_only = env::args().nth(1).as_deref() == Some("migrate");

    let database_url = required_env("DATABASE_URL")?;
    let frontend_url =
        env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:3000".to_owned());
    let oauth_state_secret = required_env("OAUTH_STATE_SECRET")?;

    if oauth_state_secret.len() < 32 {
        return Err(AppError::Validation(
            "OAUTH_STATE_SECRET must be at least 32 characters".to_owned(),
        ));
    }

    let api_host = env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());
    let api_port = env::var("API_PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(3001);

    let cookie_secure = env::var("SESSION_COOKIE_SECURE")
        .unwrap_or_else(|_| "false".to_owned())
        .eq_ignore_ascii_case("true");

    let public_base_url = env::var("PUBLIC_BASE_URL")
        .unwrap_or_else(|_| format!("http://localhost:{api_port}"))
        .trim_end_matches('/')
        .to_owned();
    let upload_dir = env::var("UPLOAD_DIR").unwrap_or_else(|_| "./uploads".to_owned());

    let formatter_url = env::var("FORMATTER_API_URL")
        .unwrap_or_else(|_| "https://router.huggingface.co/v1/chat/completions".to_owned());
    let formatter_api_key = env::var("FORMATTER_API_KEY").unwrap_or_default();
    let formatter_model = env::var("FORMATTER_MODEL")
        .unwrap_or_else(|_| "CohereLabs/c4ai-command-r-plus".to_owned());

    let oauth = oauth_config_from_env(&public_base_url);
    if oauth.is_none() {
        info!("oauth login disabled: OAUTH_GOOGLE_CLIENT_ID / OAUTH_GOOGLE_CLIENT_SECRET not set");
    }

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await
        .map_err(|error| AppError::Internal(format!("failed to connect to database: {error}")))?;

    sqlx::migrate!("../../crates/infrastructure/migrations")
        .run(&pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to run migrations: {error}")))?;

    if migrate_only {
        info!("database migrations applied successfully");
        return Ok(());
    }

    let session_store = PostgresStore::new(pool.clone())
        .with_table_name("tower_sessions")
        .map_err(|error| {
            AppError::Validation(format!("invalid session table name configuration: {error}"))
        })?;
    session_store.migrate().await.map_err(|error| {
        AppError::Internal(format!("failed to initialize session store: {error}"))
    })?;

    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(cookie_secure)
        .with_same_site(SameSite::Lax)
        .with_http_only(true)
        .with_expiry(Expiry::OnInactivity(Duration::minutes(30)));

    let http_client = reqwest::Client::new();

    let grievance_repository = Arc::new(PostgresGrievanceRepository::new(pool.clone()));
    let role_directory: Arc<dyn RoleDirectory> = Arc::new(PostgresRoleDirectory::new(pool.clone()));
    let blob_store = Arc::new(FsBlobStore::new(
        upload_dir.clone(),
        format!("{public_base_url}/files"),
    ));
    let user_repository = Arc::new(PostgresUserRepository::new(pool.clone()));
    let password_hasher = Arc::new(Argon2PasswordHasher::new());
    let text_formatter = Arc::new(HttpTextFormatter::new(
        http_client.clone(),
        formatter_url,
        formatter_api_key,
        formatter_model,
    ));
    let rate_limit_repository = Arc::new(PostgresRateLimitRepository::new(pool.clone()));

    let app_state = AppState {
        grievance_service: GrievanceService::new(
            grievance_repository,
            blob_store,
            role_directory.clone(),
        ),
        formatting_service: FormattingService::new(text_formatter),
        account_service: AccountService::new(
            user_repository,
            password_hasher,
            role_directory.clone(),
        ),
        oauth_state_service: OAuthStateService::new(oauth_state_secret.into_bytes()),
        rate_limit_service: RateLimitService::new(rate_limit_repository),
        role_directory,
        http_client,
        oauth,
        frontend_url: frontend_url.clone(),
    };

    let protected_routes = Router::new()
        .route(
            "/api/grievances",
            get(handlers::grievances::list_grievances_handler)
                .post(handlers::grievances::submit_grievance_handler),
        )
        .route(
            "/api/grievances/dashboard",
            get(handlers::grievances::dashboard_handler),
        )
        .route(
            "/api/grievances/format",
            post(handlers::grievances::format_proposal_handler),
        )
        .route(
            "/api/grievances/{grievance_id}",
            get(handlers::grievances::get_grievance_handler),
        )
        .route(
            "/api/grievances/{grievance_id}/status",
            post(handlers::grievances::transition_grievance_handler),
        )
        .route("/auth/me", get(auth::me_handler))
        .route_layer(from_fn(middleware::require_auth));

    let cors_layer = CorsLayer::new()
        .allow_origin(
            HeaderValue::from_str(&frontend_url)
                .map_err(|error| AppError::Internal(format!("invalid FRONTEND_URL: {error}")))?,
        )
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE]);

    // Rate limit rules (OWASP Credential Stuffing Prevention).
    // Login: 10 attempts per IP per 15 minutes.
    let login_rate_rule = RateLimitRule::new("login", 10, 15 * 60);
    // Registration: 5 attempts per IP per hour.
    let register_rate_rule = RateLimitRule::new("register", 5, 60 * 60);

    let login_routes = Router::new()
        .route("/auth/login", post(auth::login_handler))
        .route_layer(from_fn_with_state(app_state.clone(), middleware::rate_limit))
        .layer(axum::Extension(login_rate_rule));

    let register_routes = Router::new()
        .route("/auth/register", post(auth::register_handler))
        .route_layer(from_fn_with_state(app_state.clone(), middleware::rate_limit))
        .layer(axum::Extension(register_rate_rule));

    let app = Router::new()
        .route("/health", get(handlers::health::health_handler))
        .merge(login_routes)
        .merge(register_routes)
        .route("/auth/logout", post(auth::logout_handler))
        .route("/auth/oauth/{provider}/start", get(auth::oauth_start_handler))
        .route("/auth/oauth/callback", get(auth::oauth_callback_handler))
        .merge(protected_routes)
        .nest_service("/files", ServeDir::new(upload_dir))
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::require_same_origin_for_mutations,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .layer(session_layer)
        .with_state(app_state);

    let host = IpAddr::from_str(&api_host)
        .map_err(|error| AppError::Internal(format!("invalid API_HOST '{api_host}': {error}")))?;
    let address = SocketAddr::from((host, api_port));

    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind listener: {error}")))?;

    info!(%address, "redressa-api listening");

    axum::serve(listener, app)
        .await
        .map_err(|error| AppError::Internal(format!("api server error: {error}")))
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required_env(name: &str) -> Result<String, AppError> {
    env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))
}

fn oauth_config_from_env(public_base_url: &str) -> Option<OAuthProviderConfig> {
    let client_id = env::var("OAUTH_GOOGLE_CLIENT_ID").ok()?;
    let client_secret = env::var("OAUTH_GOOGLE_CLIENT_SECRET").ok()?;

    if client_id.trim().is_empty() || client_secret.trim().is_empty() {
        return None;
    }

    Some(OAuthProviderConfig {
        client_id,
        client_secret,
        authorize_url: env::var("OAUTH_GOOGLE_AUTHORIZE_URL")
            .unwrap_or_else(|_| "https://accounts.google.com/o/oauth2/v2/auth".to_owned()),
        token_url: env::var("OAUTH_GOOGLE_TOKEN_URL")
            .unwrap_or_else(|_| "https://oauth2.googleapis.com/token".to_owned()),
        userinfo_url: env::var("OAUTH_GOOGLE_USERINFO_URL")
            .unwrap_or_else(|_| "https://openidconnect.googleapis.com/v1/userinfo".to_owned()),
        redirect_url: format!("{public_base_url}/auth/oauth/callback"),
    })
}
