//! Route table.
//!
//! Every route is declared here with its access class so the full surface
//! can be audited in one place. Access classes map to middleware stacks:
//! admin routes run JWT validation plus the role gate, authenticated routes
//! JWT only, intake routes the rate limiter, capability and public routes
//! nothing.

use axum::{
    http::{header, HeaderValue, Method, StatusCode},
    middleware,
    routing::{delete, get, post, put, MethodRouter},
    Json, Router,
};
use serde_json::json;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config;
use crate::handlers::{applications, files, health, storage_events, submissions};
use crate::middleware::{jwt_auth_middleware, rate_limit_middleware, require_admin};
use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Access {
    /// No authentication.
    Public,
    /// No authentication, per-caller rate limit.
    Intake,
    /// Valid JWT required.
    Authenticated,
    /// Valid JWT with the admin role required.
    Admin,
}

fn route_table() -> Vec<(Access, &'static str, MethodRouter<AppState>)> {
    use Access::*;
    vec![
        // Applications (owner-only surface)
        (Admin, "/applications", post(applications::create)),
        (Admin, "/applications", get(applications::list)),
        (Admin, "/applications/:id", get(applications::get)),
        (Admin, "/applications/:id", put(applications::update)),
        (Admin, "/applications/:id", delete(applications::delete)),
        (Admin, "/applications/:id/cv-upload-url", post(applications::cv_upload_url)),
        // Recruiter submissions (public intake, admin management)
        (Intake, "/recruiter-submissions", post(submissions::create)),
        (Admin, "/recruiter-submissions", get(submissions::list)),
        (Authenticated, "/recruiter-submissions/:id", get(submissions::get)),
        (Admin, "/recruiter-submissions/:id", delete(submissions::delete)),
        (Admin, "/recruiter-submissions/:id/status", put(submissions::update_status)),
        (Admin, "/recruiter-submissions/:id/notes", put(submissions::update_notes)),
        (Admin, "/recruiter-submissions/:id/cv-upload", post(submissions::upload_url)),
        // Store integration
        (Admin, "/storage/events", post(storage_events::process)),
        // Capability-URL file access; the signature is the authorization
        (Public, "/files/*key", get(files::download)),
        (Public, "/files/*key", put(files::upload)),
        // Operational
        (Public, "/health", get(health::health)),
    ]
}

pub fn app(state: AppState) -> Router {
    let mut public = Router::new();
    let mut intake = Router::new();
    let mut authenticated = Router::new();
    let mut admin = Router::new();

    for (access, path, handler) in route_table() {
        match access {
            Access::Public => public = public.route(path, handler),
            Access::Intake => intake = intake.route(path, handler),
            Access::Authenticated => authenticated = authenticated.route(path, handler),
            Access::Admin => admin = admin.route(path, handler),
        }
    }

    // route_layer ordering: the layer added last runs first
    let admin = admin
        .route_layer(middleware::from_fn(require_admin))
        .route_layer(middleware::from_fn(jwt_auth_middleware));
    let authenticated = authenticated.route_layer(middleware::from_fn(jwt_auth_middleware));
    let intake =
        intake.route_layer(middleware::from_fn_with_state(state.clone(), rate_limit_middleware));

    Router::new()
        .merge(public)
        .merge(intake)
        .merge(authenticated)
        .merge(admin)
        .fallback(not_found)
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer() -> CorsLayer {
    let origins: Vec<HeaderValue> = config::config()
        .security
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

async fn not_found() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "NotFound", "message": "Route not found" })),
    )
}
