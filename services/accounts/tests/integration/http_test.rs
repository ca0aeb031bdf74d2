use axum::http::StatusCode;
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderValue;
use axum_test::TestServer;
use sea_orm::{DatabaseBackend, DatabaseConnection, DbErr, MockDatabase};
use serde_json::json;

use phonepass_accounts::router::build_router;
use phonepass_accounts::state::AppState;

fn server_with(db: DatabaseConnection) -> TestServer {
    let state = AppState {
        db,
        code_expire_time: 600,
    };
    TestServer::new(build_router(state)).unwrap()
}

/// Router with no database behind it. Only paths that reject before a query
/// is built can be exercised; `ping` reports the connection as down.
fn server() -> TestServer {
    server_with(DatabaseConnection::Disconnected)
}

#[tokio::test]
async fn should_answer_healthz() {
    let response = server().get("/healthz").await;
    response.assert_status(StatusCode::OK);
}

#[tokio::test]
async fn should_report_not_ready_without_database() {
    let response = server().get("/readyz").await;
    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn should_echo_request_id() {
    let response = server().get("/healthz").await;
    let request_id = response.header("x-request-id");
    assert!(uuid::Uuid::parse_str(request_id.to_str().unwrap()).is_ok());
}

#[tokio::test]
async fn should_reject_invalid_phone_on_login() {
    let response = server()
        .post("/login")
        .json(&json!({ "phone_number": "not a phone" }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(body["kind"], "INVALID_PHONE_NUMBER");
}

#[tokio::test]
async fn should_reject_malformed_code_on_verify() {
    let response = server()
        .post("/verify")
        .json(&json!({ "phone_number": "+15551234567", "code": "abc" }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(body["kind"], "INVALID_CODE_FORMAT");
}

#[tokio::test]
async fn should_require_bearer_token_for_profile() {
    let response = server().get("/user").await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = response.json();
    assert_eq!(body["kind"], "INVALID_TOKEN");
}

#[tokio::test]
async fn should_reject_malformed_bearer_token() {
    let response = server()
        .patch("/user")
        .add_header(AUTHORIZATION, HeaderValue::from_static("Bearer not-a-token"))
        .json(&json!({ "first_name": "Ada" }))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn should_fail_closed_when_token_store_unreachable() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_errors([DbErr::Custom("connection reset".to_owned())])
        .into_connection();
    let bearer = phonepass_testing::auth::MockBearer::random();
    let response = server_with(db)
        .get("/user")
        .add_header(AUTHORIZATION, bearer.header_value())
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: serde_json::Value = response.json();
    assert_eq!(body["kind"], "INTERNAL");
}
