/// Application state and router builder
///
/// Defines the shared application state and assembles the Axum router with
/// all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use jobtrack_api::{app::AppState, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config)?;
/// let app = jobtrack_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{
    config::Config, error::ApiError, middleware::security::SecurityHeadersLayer,
    response::ApiResponse,
};
use axum::{
    extract::{DefaultBodyLimit, Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Router,
};
use jobtrack_shared::{
    auth::{jwt::{JwtError, TokenIssuer}, session::SessionManager},
    storage::{FileStorage, LocalFileStorage, MAX_RESUME_BYTES},
    store::{postgres::PgCredentialStore, CredentialStore},
};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    services::ServeDir,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Request body cap on the upload routes; above the largest accepted file
/// so oversize uploads reach the size check and get its message
pub const UPLOAD_BODY_LIMIT: usize = 2 * MAX_RESUME_BYTES;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool (job applications, schedules, health)
    pub db: PgPool,

    /// Users and sessions
    pub credentials: Arc<dyn CredentialStore>,

    /// Token issuing and the session registry
    pub sessions: Arc<SessionManager>,

    /// Resume and profile picture files
    pub storage: Arc<dyn FileStorage>,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Production wiring: PostgreSQL credential store and local file storage
    ///
    /// # Errors
    ///
    /// Fails if a signing secret is empty.
    pub fn new(db: PgPool, config: Config) -> Result<Self, JwtError> {
        let credentials: Arc<dyn CredentialStore> = Arc::new(PgCredentialStore::new(db.clone()));
        let storage: Arc<dyn FileStorage> = Arc::new(LocalFileStorage::new(
            config.storage.upload_dir.clone(),
            config.storage.public_url.clone(),
        ));

        Self::with_components(db, credentials, storage, config)
    }

    /// Builds state from explicit components
    pub fn with_components(
        db: PgPool,
        credentials: Arc<dyn CredentialStore>,
        storage: Arc<dyn FileStorage>,
        config: Config,
    ) -> Result<Self, JwtError> {
        let tokens = TokenIssuer::new(config.token_config()?);
        let sessions = Arc::new(SessionManager::new(credentials.clone(), tokens));

        Ok(Self {
            db,
            credentials,
            sessions,
            storage,
            config: Arc::new(config),
        })
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── GET  /                        # Liveness message (public)
/// ├── GET  /health                  # Health check (public)
/// ├── /auth/
/// │   ├── POST /register            # public
/// │   ├── POST /login               # public
/// │   ├── POST /refresh-token       # public
/// │   └── POST /logout              # authenticated
/// ├── /users/                       # authenticated
/// │   ├── GET    /profile-data
/// │   ├── PUT    /update-profile-data
/// │   ├── PUT    /update-password
/// │   ├── PUT    /profile-picture
/// │   ├── DELETE /profile-picture
/// │   ├── POST   /post-resume
/// │   ├── DELETE /delete-resume
/// │   └── GET    /get-resume
/// ├── /job-applications/            # authenticated
/// │   ├── GET    /statuses
/// │   ├── GET    /group-by-status
/// │   ├── GET|POST|DELETE /
/// │   └── GET|PUT|DELETE  /:id
/// ├── /schedules/                   # authenticated
/// │   ├── GET|POST /my-schedules
/// │   └── GET|PUT|DELETE /:id
/// └── <PUBLIC_FILES_URL>/           # uploaded files (static)
/// ```
///
/// # Middleware Stack
///
/// Applied in order (outermost last):
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
/// 3. Security headers
///
/// Authentication is layered per route group with [`require_auth`].
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let auth_gate = || axum::middleware::from_fn_with_state(state.clone(), require_auth);

    // Service routes (public)
    let service_routes = Router::new()
        .route("/", get(routes::health::root))
        .route("/health", get(routes::health::health_check));

    // Auth routes: logout needs a session, the rest are public
    let auth_routes = Router::new()
        .route("/logout", post(routes::auth::logout))
        .layer(auth_gate())
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/refresh-token", post(routes::auth::refresh_token));

    let upload_routes = Router::new()
        .route(
            "/profile-picture",
            put(routes::users::upload_profile_picture).delete(routes::users::delete_profile_picture),
        )
        .route("/post-resume", post(routes::users::upload_resume))
        .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT));

    let user_routes = Router::new()
        .route("/profile-data", get(routes::users::profile))
        .route("/update-profile-data", put(routes::users::update_profile))
        .route("/update-password", put(routes::users::update_password))
        .route("/delete-resume", axum::routing::delete(routes::users::delete_resume))
        .route("/get-resume", get(routes::users::get_resume))
        .merge(upload_routes)
        .layer(auth_gate());

    let job_application_routes = Router::new()
        .route("/statuses", get(routes::job_applications::list_statuses))
        .route("/group-by-status", get(routes::job_applications::group_by_status))
        .route(
            "/",
            get(routes::job_applications::list)
                .post(routes::job_applications::create)
                .delete(routes::job_applications::delete_all),
        )
        .route(
            "/:id",
            get(routes::job_applications::get)
                .put(routes::job_applications::update)
                .delete(routes::job_applications::delete),
        )
        .layer(auth_gate());

    // `/my-shedules` is the path existing clients call
    let schedule_routes = Router::new()
        .route(
            "/my-schedules",
            get(routes::schedules::list).post(routes::schedules::create),
        )
        .route(
            "/my-shedules",
            get(routes::schedules::list).post(routes::schedules::create),
        )
        .route(
            "/:id",
            get(routes::schedules::get)
                .put(routes::schedules::update)
                .delete(routes::schedules::delete),
        )
        .layer(auth_gate());

    // Configure CORS based on environment
    let cors = if state.config.api.cors_origins.iter().any(|origin| origin == "*") {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    let mut router = Router::new()
        .merge(service_routes)
        .nest("/auth", auth_routes)
        .nest("/users", user_routes)
        .nest("/job-applications", job_application_routes)
        .nest("/schedules", schedule_routes);

    // Uploads are served only when the public URL is a local path
    let public_url = state.config.storage.public_url.trim_end_matches('/');
    if public_url.starts_with('/') && public_url.len() > 1 {
        router = router.nest_service(
            public_url,
            ServeDir::new(state.config.storage.upload_dir.clone()),
        );
    }

    router
        .fallback(route_not_found)
        .layer(axum::middleware::map_response(method_not_allowed_envelope))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

async fn route_not_found() -> ApiError {
    ApiError::NotFound("Route not found".to_string())
}

/// Gives the router's bare 405 responses the error envelope
async fn method_not_allowed_envelope(response: Response) -> Response {
    let bare = response.status() == StatusCode::METHOD_NOT_ALLOWED
        && !response.headers().contains_key(header::CONTENT_TYPE);
    if !bare {
        return response;
    }

    let allow = response.headers().get(header::ALLOW).cloned();
    let mut enveloped =
        ApiResponse::<()>::error(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed", None)
            .into_response();
    if let Some(allow) = allow {
        enveloped.headers_mut().insert(header::ALLOW, allow);
    }
    enveloped
}

/// Session-backed authentication gate
///
/// Resolves the `Authorization` header through the session registry and
/// inserts the resulting [`UserClaims`](jobtrack_shared::auth::context::UserClaims)
/// into request extensions.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);

    let claims = state.sessions.authenticate(auth_header.as_deref()).await?;
    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}
