use axum::http::StatusCode;

/// Liveness check for `GET /healthz`.
///
/// Readiness depends on each service's backing stores, so `/readyz` lives
/// with the service.
pub async fn healthz() -> StatusCode {
    StatusCode::OK
}
