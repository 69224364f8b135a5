pub mod cli;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod handlers;
pub mod health;
pub mod middleware;
pub mod providers;
pub mod services;

use axum::http::HeaderValue;
use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Json, Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;

use db::DonationStore;
use providers::{Epaymently, Paystack, PaymentProvider};
use services::{CallbackService, ReconciliationService};

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health,
        handlers::donations::get_donation,
        handlers::callback::donation_callback,
    ),
    components(schemas(health::HealthResponse, health::DependencyStatus)),
    tags(
        (name = "Donations", description = "Donation intake and verification"),
        (name = "Health", description = "Service health")
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub store: Arc<dyn DonationStore>,
    pub paystack: Arc<Paystack>,
    pub epaymently: Arc<Epaymently>,
    pub callback: Arc<CallbackService>,
    pub reconciliation: Arc<ReconciliationService>,
    pub health_checker: Arc<health::HealthChecker>,
}

impl AppState {
    /// Wires the adapters, services, and health checks around one store.
    /// Tests pass an in-memory store and adapter configs pointed at a mock
    /// server; `serve` passes the Postgres store and real configuration.
    pub fn build(
        db: PgPool,
        store: Arc<dyn DonationStore>,
        paystack_config: providers::PaystackConfig,
        epaymently_config: providers::EpaymentlyConfig,
    ) -> Self {
        let paystack_configured = paystack_config.secret_key.is_some();
        let epaymently_configured =
            epaymently_config.api_key.is_some() && epaymently_config.merchant_id.is_some();

        let paystack = Arc::new(Paystack::new(paystack_config, store.clone()));
        let epaymently = Arc::new(Epaymently::new(epaymently_config, store.clone()));

        let callback = Arc::new(CallbackService::new(vec![
            paystack.clone() as Arc<dyn PaymentProvider>,
            epaymently.clone() as Arc<dyn PaymentProvider>,
        ]));
        let reconciliation = Arc::new(ReconciliationService::new(store.clone()));

        let health_checker = Arc::new(
            health::HealthChecker::new()
                .add_checker(Box::new(health::PostgresChecker::new(db.clone())))
                .add_checker(Box::new(health::ProviderConfigChecker::new(
                    "paystack",
                    paystack_configured,
                )))
                .add_checker(Box::new(health::ProviderConfigChecker::new(
                    "epaymently",
                    epaymently_configured,
                ))),
        );

        Self {
            db,
            store,
            paystack,
            epaymently,
            callback,
            reconciliation,
            health_checker,
        }
    }
}

pub fn create_app(state: AppState, cors_allowed_origins: Option<&str>) -> Router {
    let cors = match cors_allowed_origins {
        Some(origins) => {
            let origins: Vec<HeaderValue> = origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .filter_map(|o| o.parse().ok())
                .collect();
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods(Any)
                .allow_headers(Any)
        }
        None => CorsLayer::permissive(),
    };

    Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/donations",
            post(handlers::donations::initiate_donation).get(handlers::donations::list_donations),
        )
        .route(
            "/donations/inline",
            post(handlers::donations::inline_checkout),
        )
        .route(
            "/donations/inline/complete",
            post(handlers::donations::complete_inline),
        )
        .route(
            "/donations/callback",
            get(handlers::callback::donation_callback),
        )
        .route("/donations/:reference", get(handlers::donations::get_donation))
        .route(
            "/reports/stale-donations",
            get(handlers::reports::stale_donations),
        )
        .route(
            "/api-docs/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        )
        .layer(axum_middleware::from_fn(
            middleware::request_logger::request_logger_middleware,
        ))
        .layer(cors)
        .with_state(state)
}
