/// Application state, auth middleware and router builder
///
/// This module defines the shared application state, the optional-bearer
/// subject middleware, and the function that assembles the Axum router with
/// all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use critica_api::{app::AppState, config::Config, mailer::LogMailer};
/// use sqlx::PgPool;
/// use std::sync::Arc;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config, Arc::new(LogMailer));
/// let app = critica_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```
use crate::{config::Config, error::ApiError, mailer::Mailer};
use axum::{
    extract::Request,
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{delete, get, post},
    Router,
};
use critica_shared::{auth::jwt, models::user::User};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Uses Arc internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Outbound email collaborator
    pub mailer: Arc<dyn Mailer>,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: PgPool, config: Config, mailer: Arc<dyn Mailer>) -> Self {
        Self {
            db,
            config: Arc::new(config),
            mailer,
        }
    }

    /// Gets JWT secret for token and confirmation code operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// The authenticated identity of a request, if any
///
/// Inserted into request extensions by [`subject_layer`]. `None` means the
/// request carried no Authorization header; requests with a present but
/// invalid header never reach a handler.
#[derive(Clone)]
pub struct Subject(pub Option<User>);

impl Subject {
    /// The resolved user, or None for anonymous requests
    pub fn user(&self) -> Option<&User> {
        self.0.as_ref()
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                                  # Liveness (public)
/// ├── /v1/
/// │   ├── /auth/                               # Public
/// │   │   ├── POST /register
/// │   │   ├── POST /activate
/// │   │   └── POST /refresh
/// │   ├── /categories[/:slug]                  # Admin-or-read-only
/// │   ├── /genres[/:slug]                      # Admin-or-read-only
/// │   ├── /titles[/:title_id]                  # Admin-or-read-only
/// │   │   └── /reviews[/:review_id]            # Owner-or-staff-or-read-only
/// │   │       └── /comments[/:comment_id]      # Owner-or-staff-or-read-only
/// │   └── /users[/:username], /users/me        # Admin-only / authenticated
/// ```
///
/// Everything except `/health` and `/v1/auth` runs behind [`subject_layer`],
/// which resolves the optional bearer token into a [`Subject`]; the policy
/// checks inside each handler decide between 401 and 403.
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    // Health check (public, no auth)
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    // Auth routes (public)
    let auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/activate", post(routes::auth::activate))
        .route("/refresh", post(routes::auth::refresh));

    // Catalog and discussion routes; reads are public, so the subject layer
    // only resolves identity and the handlers authorize per action
    let catalog_routes = Router::new()
        .route(
            "/categories",
            get(routes::categories::list).post(routes::categories::create),
        )
        .route("/categories/:slug", delete(routes::categories::remove))
        .route(
            "/genres",
            get(routes::genres::list).post(routes::genres::create),
        )
        .route("/genres/:slug", delete(routes::genres::remove))
        .route(
            "/titles",
            get(routes::titles::list).post(routes::titles::create),
        )
        .route(
            "/titles/:title_id",
            get(routes::titles::retrieve)
                .patch(routes::titles::update)
                .delete(routes::titles::remove),
        )
        .route(
            "/titles/:title_id/reviews",
            get(routes::reviews::list).post(routes::reviews::create),
        )
        .route(
            "/titles/:title_id/reviews/:review_id",
            get(routes::reviews::retrieve)
                .patch(routes::reviews::update)
                .delete(routes::reviews::remove),
        )
        .route(
            "/titles/:title_id/reviews/:review_id/comments",
            get(routes::comments::list).post(routes::comments::create),
        )
        .route(
            "/titles/:title_id/reviews/:review_id/comments/:comment_id",
            get(routes::comments::retrieve)
                .patch(routes::comments::update)
                .delete(routes::comments::remove),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            subject_layer,
        ));

    // User management; /me is matched before /:username by the router
    let user_routes = Router::new()
        .route(
            "/me",
            get(routes::users::me).patch(routes::users::update_me),
        )
        .route("/", get(routes::users::list).post(routes::users::create))
        .route(
            "/:username",
            get(routes::users::retrieve)
                .patch(routes::users::update)
                .delete(routes::users::remove),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            subject_layer,
        ));

    let v1_routes = Router::new()
        .nest("/auth", auth_routes)
        .merge(catalog_routes)
        .nest("/users", user_routes);

    // Configure CORS based on environment
    let cors = if state.config.api.cors_origins.contains(&"*".to_string()) {
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
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}

/// Optional-bearer subject middleware
///
/// Resolves the `Authorization` header into a [`Subject`] extension:
/// - no header: anonymous subject, the request proceeds
/// - valid access token: the user row is reloaded so role and active-state
///   changes apply immediately
/// - present but malformed or invalid header: 401, the handler never runs
async fn subject_layer(
    state: axum::extract::State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .map(|v| v.to_str().map(str::to_owned))
        .transpose()
        .map_err(|_| ApiError::Unauthorized("Malformed authorization header".to_string()))?;

    let subject = match auth_header {
        None => Subject(None),
        Some(header_value) => {
            let token = header_value
                .strip_prefix("Bearer ")
                .ok_or_else(|| ApiError::Unauthorized("Expected Bearer token".to_string()))?;

            let claims = jwt::validate_access_token(token, state.jwt_secret())?;

            let user = User::find_by_id(&state.db, claims.sub)
                .await?
                .filter(|u| u.is_active)
                .ok_or_else(|| ApiError::Unauthorized("Unknown or inactive account".to_string()))?;

            Subject(Some(user))
        }
    };

    req.extensions_mut().insert(subject);

    Ok(next.run(req).await)
}
