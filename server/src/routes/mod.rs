use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::config::{create_cors_layer, create_security_headers_layer, HttpConfig};
use crate::handlers::{current_user, events, guests, health_check, public, scan, uploads};
use crate::state::AppState;

const UPLOAD_BODY_LIMIT: usize = 10 * 1024 * 1024;

pub fn create_routes(state: AppState, http: &HttpConfig) -> Router {
    let dashboard = Router::new()
        .route("/me", get(current_user))
        .route("/slugs", post(events::preview_slug))
        .route("/events", get(events::list_events).post(events::create_event))
        .route(
            "/events/:id",
            get(events::get_event)
                .put(events::update_event)
                .delete(events::delete_event),
        )
        .route("/events/:id/stats", get(events::event_stats))
        .route("/events/:id/registrations", get(guests::list_guests))
        .route(
            "/events/:id/registrations/:registration_id/ticket",
            get(guests::guest_ticket),
        )
        .route("/events/:id/guest-list.csv", get(guests::export_guests))
        .route("/events/:id/scan", post(scan::scan_ticket))
        .route("/admin/events", get(events::list_all_events))
        .route(
            "/uploads",
            post(uploads::upload_image).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        );

    let public = Router::new()
        .route("/events/:slug", get(public::get_public_event))
        .route("/events/:slug/registrations", post(public::register))
        .route("/events/:slug/visits", post(public::record_visit))
        .route("/tickets/:registration_id", get(public::download_ticket));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", dashboard)
        .nest("/api/public", public)
        .layer(TraceLayer::new_for_http())
        .layer(create_security_headers_layer(http.is_production))
        .layer(create_cors_layer(&http.allowed_origins))
        .with_state(state)
}
