use axum::{
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_governor::{
    governor::GovernorConfigBuilder,
    key_extractor::SmartIpKeyExtractor,
    GovernorLayer,
};
use tower_http::cors::{Any, CorsLayer};
use utoipa::{
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

pub mod accounts;
pub mod auth;
pub mod config;
pub mod db;
pub mod emi;
pub mod entities;
pub mod error;
pub mod feedback;
pub mod loans;
pub mod routes;

use crate::auth::SessionStore;
use crate::config::{Config, FeedbackAddresses, RateLimit};
use crate::feedback::{MailError, Mailer, SmtpMailer, UnconfiguredMailer};

/// Shared handler state: the store, open sessions and the feedback transport.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub sessions: Arc<SessionStore>,
    pub mailer: Arc<dyn Mailer>,
    pub feedback: FeedbackAddresses,
    pub rate_limit: Option<RateLimit>,
}

impl AppState {
    /// State without rate limiting, for embedding and tests.
    pub fn new(db: DatabaseConnection, mailer: Arc<dyn Mailer>, feedback: FeedbackAddresses) -> Self {
        Self {
            db,
            sessions: Arc::new(SessionStore::new()),
            mailer,
            feedback,
            rate_limit: None,
        }
    }

    pub fn from_config(db: DatabaseConnection, config: &Config) -> Result<Self, MailError> {
        let mailer: Arc<dyn Mailer> = match &config.smtp {
            Some(smtp) => Arc::new(SmtpMailer::new(smtp)?),
            None => Arc::new(UnconfiguredMailer),
        };

        Ok(Self {
            rate_limit: config.rate_limit,
            ..Self::new(db, mailer, config.feedback.clone())
        })
    }
}

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = String)
    )
)]
async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "Service is healthy")
}

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme("bearer", SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)));
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "HarvestPay API",
        version = "0.1.0",
        description = "Tenant farmer loan registration, applications and approval"
    ),
    paths(
        health_check,
        routes::register,
        routes::login,
        routes::logout,
        routes::emi,
        routes::list_contributors,
        routes::apply,
        routes::loan_history,
        routes::list_pending,
        routes::decide,
        routes::submit_feedback
    ),
    components(schemas(
        accounts::Registration,
        accounts::RoleDetails,
        accounts::ContributorRegistration,
        accounts::Profile,
        accounts::FarmerProfile,
        accounts::ContributorProfile,
        accounts::AdminProfile,
        accounts::Gender,
        accounts::PublicUser,
        entities::Role,
        entities::LoanStatus,
        emi::RepaymentPeriod,
        loans::LoanRequest,
        loans::LoanRecord,
        loans::LoanSubmission,
        loans::ContributorOffer,
        loans::Decision,
        routes::LoginRequest,
        routes::LoginResponse,
        routes::EmiRequest,
        routes::EmiResponse,
        routes::DecisionRequest,
        routes::FeedbackRequest,
        routes::FeedbackResponse
    )),
    modifiers(&BearerAuth)
)]
pub struct ApiDoc;

/// Create the application with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    let rate_limit = state.rate_limit;

    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/register", post(routes::register))
        .route("/login", post(routes::login))
        .route("/logout", post(routes::logout))
        .route("/emi", post(routes::emi))
        .route("/contributors", get(routes::list_contributors))
        .route("/loans", get(routes::loan_history).post(routes::apply))
        .route("/loans/pending", get(routes::list_pending))
        .route("/loans/{id}/decision", post(routes::decide))
        .route("/feedback", post(routes::submit_feedback))
        .with_state(state);

    // Apply the per-IP governor to the API routes only
    let api_routes = match rate_limit {
        Some(limit) => {
            let governor_conf = GovernorConfigBuilder::default()
                .key_extractor(SmartIpKeyExtractor)
                .period(limit.period)
                .burst_size(limit.burst)
                .finish();
            match governor_conf {
                Some(config) => api_routes.layer(GovernorLayer { config: Arc::new(config) }),
                None => {
                    tracing::warn!(?limit, "invalid rate limit, serving without one");
                    api_routes
                }
            }
        }
        None => api_routes,
    };

    let docs_router = SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi());

    Router::new()
        .merge(api_routes)
        .merge(docs_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}
