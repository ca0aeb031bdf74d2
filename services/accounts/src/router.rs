use axum::{
    Router,
    routing::{get, post},
};

use phonepass_core::health::healthz;
use phonepass_core::middleware::{propagate_request_id_layer, request_id_layer, trace_layer};

use crate::handlers::{
    health::readyz,
    login::login,
    user::{get_user, update_user},
    verify::verify,
};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // OTP
        .route("/login", post(login))
        .route("/verify", post(verify))
        // Profile
        .route("/user", get(get_user).patch(update_user))
        .with_state(state)
        // Layers run bottom-up: the request id must exist before the trace span is made.
        .layer(propagate_request_id_layer())
        .layer(trace_layer())
        .layer(request_id_layer())
}
