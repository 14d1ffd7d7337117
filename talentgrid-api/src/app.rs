/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use talentgrid_api::{app::AppState, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config)?;
/// let app = talentgrid_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, middleware::security::security_headers};
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post, put},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use talentgrid_shared::{
    enrichment::EnrichmentClient,
    registry::{MembershipRegistry, PgRegistry},
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool (satellite records)
    pub db: PgPool,

    /// Identities, organizations and memberships
    pub registry: Arc<dyn MembershipRegistry>,

    /// Enrichment client, if configured
    pub enrichment: Option<Arc<EnrichmentClient>>,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// State backed by PostgreSQL, with enrichment if configured
    pub fn new(db: PgPool, config: Config) -> anyhow::Result<Self> {
        let enrichment = match &config.enrichment {
            Some(settings) => Some(Arc::new(EnrichmentClient::new(
                &settings.url,
                settings.timeout(),
            )?)),
            None => None,
        };

        Ok(Self {
            registry: Arc::new(PgRegistry::new(db.clone())),
            db,
            enrichment,
            config: Arc::new(config),
        })
    }

    /// State with an explicit registry store and no enrichment
    pub fn with_registry(db: PgPool, registry: Arc<dyn MembershipRegistry>, config: Config) -> Self {
        Self {
            db,
            registry,
            enrichment: None,
            config: Arc::new(config),
        }
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health
/// └── /v1/
///     ├── /identities                 POST
///     │   └── /:id                    GET PATCH DELETE
///     │       ├── /memberships        GET
///     │       ├── /profile            GET PUT
///     │       │   └── /resume-details PUT
///     │       └── /gigs               GET
///     ├── /organizations              POST
///     │   └── /:id                    GET PATCH DELETE
///     │       ├── /memberships        GET POST DELETE
///     │       │   ├── /status         PUT
///     │       │   └── /:identity_id/:role GET
///     │       └── /job-postings       GET
///     ├── /job-postings               POST
///     │   └── /:id                    GET
///     │       ├── /close              POST
///     │       ├── /applications       GET POST
///     │       └── /matches            GET
///     ├── /applications/:id/status    PUT
///     ├── /gigs                       POST
///     │   └── /:id                    GET
///     └── /conversations              POST
///         └── /:id/messages           GET POST
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
/// 3. Security headers
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let identity_routes = Router::new()
        .route("/", post(routes::identities::create_identity))
        .route(
            "/:id",
            get(routes::identities::get_identity)
                .patch(routes::identities::update_identity)
                .delete(routes::identities::delete_identity),
        )
        .route(
            "/:id/memberships",
            get(routes::memberships::list_by_identity),
        )
        .route(
            "/:id/profile",
            get(routes::profiles::get_profile).put(routes::profiles::upsert_profile),
        )
        .route(
            "/:id/profile/resume-details",
            put(routes::profiles::apply_resume_details),
        )
        .route("/:id/gigs", get(routes::gigs::list_by_owner));

    let organization_routes = Router::new()
        .route("/", post(routes::organizations::create_organization))
        .route(
            "/:id",
            get(routes::organizations::get_organization)
                .patch(routes::organizations::update_organization)
                .delete(routes::organizations::delete_organization),
        )
        .route(
            "/:id/memberships",
            get(routes::memberships::list_by_organization)
                .post(routes::memberships::grant)
                .delete(routes::memberships::revoke),
        )
        .route(
            "/:id/memberships/status",
            put(routes::memberships::transition),
        )
        .route(
            "/:id/memberships/:identity_id/:role",
            get(routes::memberships::get_membership),
        )
        .route(
            "/:id/job-postings",
            get(routes::job_postings::list_by_organization),
        );

    let job_posting_routes = Router::new()
        .route("/", post(routes::job_postings::create_job_posting))
        .route("/:id", get(routes::job_postings::get_job_posting))
        .route("/:id/close", post(routes::job_postings::close_job_posting))
        .route(
            "/:id/applications",
            get(routes::applications::list_by_job).post(routes::applications::apply),
        )
        .route("/:id/matches", get(routes::job_postings::match_candidates));

    let application_routes =
        Router::new().route("/:id/status", put(routes::applications::update_status));

    let gig_routes = Router::new()
        .route("/", post(routes::gigs::create_gig))
        .route("/:id", get(routes::gigs::get_gig));

    let conversation_routes = Router::new()
        .route("/", post(routes::conversations::create_conversation))
        .route(
            "/:id/messages",
            get(routes::conversations::list_messages).post(routes::conversations::post_message),
        );

    let v1_routes = Router::new()
        .nest("/identities", identity_routes)
        .nest("/organizations", organization_routes)
        .nest("/job-postings", job_posting_routes)
        .nest("/applications", application_routes)
        .nest("/gigs", gig_routes)
        .nest("/conversations", conversation_routes);

    let cors = if state.config.cors_allows_any() {
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
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    let production = state.config.api.production;

    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(axum::middleware::from_fn_with_state(production, security_headers))
        .with_state(state)
}
