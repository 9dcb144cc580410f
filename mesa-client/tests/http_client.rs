// mesa-client/tests/http_client.rs
// 集成测试：NetworkHttpClient + SessionManager 对接进程内 axum 服务

use std::sync::Arc;

use axum::extract::Json;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;
use mesa_client::{
    AuthApi, ClientConfig, ClientError, FileSessionStore, LoginRequest, NetworkHttpClient,
    NotificationApi, Role, SessionManager,
};
use serde_json::{Value, json};
use tempfile::TempDir;

const TOKEN: &str = "tok-valid";

fn user_json() -> Value {
    json!({ "id": 7, "username": "lea", "email": "lea@resto.fr", "role": "directeur" })
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

async fn login(Json(body): Json<Value>) -> impl IntoResponse {
    let identity = body["username"].as_str().or(body["email"].as_str());
    match (identity, body["password"].as_str()) {
        (Some("lea") | Some("lea@resto.fr"), Some("secret")) => (
            StatusCode::OK,
            Json(json!({
                "code": "E0000",
                "message": "Success",
                "data": { "token": TOKEN, "user": user_json() }
            })),
        ),
        (Some("boom"), _) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "code": "E9001", "message": "Internal server error" })),
        ),
        (None, _) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "code": "E0002", "message": "username or email required" })),
        ),
        _ => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "code": "E1002", "message": "Invalid credentials" })),
        ),
    }
}

async fn me(headers: HeaderMap) -> impl IntoResponse {
    match bearer(&headers) {
        // bare payload, no envelope
        Some(TOKEN) => (StatusCode::OK, Json(user_json())),
        Some("tok-expired") => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "code": "E1003", "message": "Token expired" })),
        ),
        _ => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "code": "E1001", "message": "Authentication required" })),
        ),
    }
}

async fn logout() -> StatusCode {
    StatusCode::SERVICE_UNAVAILABLE
}

async fn counts(headers: HeaderMap) -> impl IntoResponse {
    if bearer(&headers) != Some(TOKEN) {
        return (StatusCode::UNAUTHORIZED, Json(json!({}))).into_response();
    }
    Json(json!({
        "code": "E0000",
        "message": "Success",
        "data": { "pendingReservations": 2, "pending_orders": 5, "newMessages": -3 }
    }))
    .into_response()
}

async fn spawn_server() -> String {
    let app = Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/me", get(me))
        .route("/api/auth/logout", post(logout))
        .route("/api/admin/notifications/count", get(counts));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

async fn client() -> NetworkHttpClient {
    let base = spawn_server().await;
    NetworkHttpClient::new(&ClientConfig::new(base).with_timeout(5)).unwrap()
}

#[tokio::test]
async fn test_login_unwraps_envelope() {
    let http = client().await;
    let resp = http
        .login(&LoginRequest::with_email("lea@resto.fr", "secret"))
        .await
        .unwrap();
    assert_eq!(resp.token, TOKEN);
    assert_eq!(resp.user.id, "7");
    assert_eq!(resp.user.role(), Some(Role::Director));
}

#[tokio::test]
async fn test_login_client_errors_are_invalid_credentials() {
    let http = client().await;

    let err = http
        .login(&LoginRequest::with_username("lea", "nope"))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::InvalidCredentials));
    assert_eq!(err.to_string(), "Invalid credentials");

    let err = http
        .login(&LoginRequest {
            username: None,
            email: None,
            password: "x".into(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::InvalidCredentials));
}

#[tokio::test]
async fn test_login_server_error_is_not_auth_error() {
    let http = client().await;
    let err = http
        .login(&LoginRequest::with_username("boom", "secret"))
        .await
        .unwrap_err();
    assert!(!err.is_auth_failure());
}

#[tokio::test]
async fn test_me_accepts_bare_payload_and_maps_expiry() {
    let http = client().await;
    assert_eq!(http.me(TOKEN).await.unwrap().username, "lea");
    assert!(matches!(
        http.me("tok-expired").await.unwrap_err(),
        ClientError::TokenExpired
    ));
    assert!(http.me("garbage").await.unwrap_err().is_auth_failure());
}

#[tokio::test]
async fn test_notification_counts_clamped() {
    let http = client().await;
    let counts = http.notification_counts(TOKEN).await.unwrap();
    assert_eq!(counts.pending_reservations, 2);
    assert_eq!(counts.pending_orders, 5);
    assert_eq!(counts.new_messages, 0);
    assert_eq!(counts.total(), 7);
}

#[tokio::test]
async fn test_connection_refused_is_network_error() {
    let http = NetworkHttpClient::new(&ClientConfig::new("http://127.0.0.1:1").with_timeout(2))
        .unwrap();
    let err = http.me(TOKEN).await.unwrap_err();
    assert!(err.is_network());
}

#[tokio::test]
async fn test_session_round_trip_over_http() {
    let base = spawn_server().await;
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("session.json");
    let config = ClientConfig::new(base).with_session_file(&path);
    let http = Arc::new(NetworkHttpClient::new(&config).unwrap());

    let sm = SessionManager::new(http.clone(), Arc::new(FileSessionStore::new(&path)));
    sm.login(LoginRequest::with_username("lea", "secret"))
        .await
        .unwrap();

    // 新进程读取同一条记录
    let reloaded = SessionManager::new(http, Arc::new(FileSessionStore::new(&path)));
    let session = reloaded.restore_session().await.unwrap().unwrap();
    assert_eq!(session.user.username, "lea");
    assert!(reloaded.state().is_authenticated());

    // 服务端登出失败不影响本地清理
    reloaded.logout().await;
    assert!(reloaded.state().user().is_none());
    assert!(!path.exists());
}
