use axum::{middleware, routing::get, Router};
use tower_http::trace::TraceLayer;

use crate::auth::trusted_header_identity;
use crate::config::{create_cors_layer, create_security_headers_layer};
use crate::handlers::{
    create_event, delete_event, get_event, health_check, list_events, update_event,
};
use crate::state::AppState;

pub fn create_routes(state: AppState) -> Router {
    let cors = create_cors_layer(&state.config.cors_allowed_origins);
    let security = create_security_headers_layer(state.config.production);

    Router::new()
        .route("/events", get(list_events).post(create_event))
        .route(
            "/events/:id",
            get(get_event)
                .patch(update_event)
                .put(update_event)
                .delete(delete_event),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            trusted_header_identity,
        ))
        .route("/health", get(health_check))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(security)
        .layer(cors)
}
