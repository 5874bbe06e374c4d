use axum::middleware;
use axum::routing::{get, patch, post, put};
use axum::Router;

use crate::handlers::{bookings, catalog, stores, timeslots, webhooks};
use crate::state::AppState;

/// The §6 HTTP surface, built on the five cells (registry/catalog/timeslot/
/// reservation/webhook). Every route below the health check runs behind
/// `shared_utils::middleware::auth_middleware`, which inserts the caller's
/// `RequestContext` before any handler sees the request.
pub fn create_router(state: AppState) -> Router {
    let auth_config = state.config.clone();
    let rate_limiter = state.rate_limiter.clone();

    let store_routes = Router::new()
        .route("/stores", post(stores::create_store))
        .route("/stores/{store_id}", get(stores::get_store))
        .route("/stores/{store_id}/settings", put(stores::update_settings));

    let catalog_routes = Router::new()
        .route("/stores/{store_id}/treatments", get(catalog::list_treatments).post(catalog::create_treatment))
        .route("/treatments/{treatment_id}", get(catalog::get_treatment).put(catalog::update_treatment))
        .route("/treatments/{treatment_id}/deactivate", post(catalog::deactivate_treatment))
        .route("/stores/{store_id}/resources", get(catalog::list_resources).post(catalog::create_resource))
        .route("/staff", post(catalog::create_staff))
        .route("/staff/{staff_id}", get(catalog::get_staff));

    let timeslot_routes = Router::new()
        .route("/stores/{store_id}/timeslots/generate", post(timeslots::generate_slots))
        .route("/stores/{store_id}/timeslots/generate-range", post(timeslots::generate_slots_range))
        .route("/stores/{store_id}/availability", get(timeslots::availability));

    let booking_routes = Router::new()
        .route("/bookings", post(bookings::create_booking))
        .route("/bookings/{booking_id}", get(bookings::get_booking))
        .route("/bookings/{booking_id}/reschedule", patch(bookings::reschedule_booking))
        .route("/bookings/{booking_id}/cancel", post(bookings::cancel_booking))
        .route("/bookings/{booking_id}/transition", post(bookings::transition_booking));

    let webhook_routes = Router::new()
        .route("/webhooks", get(webhooks::list_subscriptions).post(webhooks::create_subscription))
        .route(
            "/webhooks/{id}",
            get(webhooks::get_subscription)
                .put(webhooks::update_subscription)
                .delete(webhooks::delete_subscription),
        )
        .route("/webhooks/{id}/health", get(webhooks::subscription_health));

    let api = Router::new()
        .merge(store_routes)
        .merge(catalog_routes)
        .merge(timeslot_routes)
        .merge(booking_routes)
        .merge(webhook_routes)
        .layer(middleware::from_fn_with_state(auth_config, shared_utils::middleware::auth_middleware));

    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api)
        .layer(middleware::from_fn_with_state(rate_limiter, shared_utils::rate_limit::rate_limit_middleware))
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}
