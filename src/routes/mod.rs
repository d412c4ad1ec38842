pub mod assistant;
pub mod clients;
pub mod conditions;
pub mod devis;
pub mod factures;
pub mod health;
pub mod metrics;
pub mod rdv;
pub mod relances;

use axum::{
    extract::DefaultBodyLimit,
    handler::Handler,
    http::{Method, Uri},
    routing::{get, post, MethodRouter},
    Extension, Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::{error::ApiError, middleware::auth::TokenPolicy, AppState};

/// `POST` runs the operation, `OPTIONS` answers the preflight, anything else
/// is a 405 in the usual error envelope.
fn endpoint<H, T>(handler: H) -> MethodRouter<AppState>
where
    H: Handler<T, AppState>,
    T: 'static,
{
    post(handler).options(preflight).fallback(method_not_allowed)
}

async fn preflight() -> &'static str {
    "ok"
}

async fn method_not_allowed(method: Method) -> ApiError {
    ApiError::MethodNotAllowed(method.to_string())
}

async fn unknown_endpoint(uri: Uri) -> ApiError {
    ApiError::not_found("NOT_FOUND", format!("Endpoint {} introuvable", uri.path()))
}

pub fn router(state: AppState) -> Router {
    let token_policy = TokenPolicy {
        jwt_secret: state.config.jwt_secret.clone(),
    };

    let api = Router::new()
        // Clients
        .route("/create-client", endpoint(clients::create_client))
        .route("/search-client", endpoint(clients::search_client))
        // Devis
        .route("/create-devis", endpoint(devis::create_devis))
        .route("/add-ligne-devis", endpoint(devis::add_ligne_devis))
        .route("/get-devis", endpoint(devis::get_devis))
        // Factures
        .route("/create-facture-from-devis", endpoint(factures::create_facture_from_devis))
        .route("/list-factures", endpoint(factures::list_factures))
        .route("/update-facture-statut", endpoint(factures::update_facture_statut))
        // Conditions de paiement
        .route("/list-conditions-paiement", endpoint(conditions::list_conditions))
        .route("/create-condition-paiement", endpoint(conditions::create_condition))
        // Relances
        .route("/list-relances", endpoint(relances::list_relances))
        // RDV
        .route("/create-rdv", endpoint(rdv::create_rdv))
        .route("/list-rdv", endpoint(rdv::list_rdv))
        // Assistants
        .route("/charlie", endpoint(assistant::charlie))
        .route("/leo", endpoint(assistant::leo))
        .fallback(unknown_endpoint);

    Router::new()
        .route("/health", get(health::health_check))
        .route("/metrics", get(metrics::metrics_handler))
        .nest("/api", api)
        .layer(Extension(token_policy))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(DefaultBodyLimit::max(2 * 1024 * 1024))
        .with_state(state)
}
