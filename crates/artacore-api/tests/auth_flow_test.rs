//! Integration tests for login, the request gate and the admin endpoints

use artacore_api::{AppState, create_router};
use artacore_auth::{
    Authenticator, CredentialStore, GateConfig, JwtManager, RequestGate, RolePolicy,
    TOKEN_TTL_SECS, hash_password,
};
use artacore_db::{Database, NewUser, UserRole};
use artacore_storage::LocalStorage;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use chrono::{Duration, Utc};
use serde_json::{Value, json};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt; // For `oneshot` method

const SECRET: &str = "integration-test-secret-0123456789abcdef";
const BOUNDARY: &str = "artacore-test-boundary";

struct TestApp {
    router: Router,
    db: Database,
    jwt: Arc<JwtManager>,
    _uploads: TempDir,
}

/// Build the full router over an in-memory database seeded with
/// `a@b.com`/`correct` (admin) and `viewer@b.com`/`viewerpass` (viewer)
async fn create_test_app(allow_registration: bool) -> TestApp {
    let db = Database::in_memory().await.unwrap();
    for (email, password, role) in [
        ("a@b.com", "correct", UserRole::Admin),
        ("viewer@b.com", "viewerpass", UserRole::Viewer),
    ] {
        db.insert_user(NewUser {
            email: email.to_string(),
            password_hash: hash_password(password).unwrap(),
            role,
        })
        .await
        .unwrap();
    }

    let jwt = Arc::new(JwtManager::new(SECRET));
    let store: Arc<dyn CredentialStore> = Arc::new(db.clone());
    let authenticator = Arc::new(Authenticator::new(store, jwt.clone()).unwrap());
    let gate = Arc::new(RequestGate::new(jwt.clone(), GateConfig::default()));

    let uploads = TempDir::new().unwrap();
    let storage = Arc::new(LocalStorage::new(uploads.path(), "/uploads").await.unwrap());

    let state = AppState::new(
        db.clone(),
        authenticator,
        gate,
        Arc::new(RolePolicy),
        storage,
        "/uploads".to_string(),
        10 * 1024 * 1024,
        allow_registration,
    );

    TestApp {
        router: create_router(state, None),
        db,
        jwt,
        _uploads: uploads,
    }
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get_request(uri: &str, authorization: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(value) = authorization {
        builder = builder.header(header::AUTHORIZATION, value);
    }
    builder.body(Body::empty()).unwrap()
}

fn multipart_request(uri: &str, token: &str, field: &str, file_name: &str, data: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::from(body))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

async fn login(app: &TestApp, email: &str, password: &str) -> String {
    let response = app
        .router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth",
            None,
            json!({ "email": email, "password": password }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await["token"]
        .as_str()
        .unwrap()
        .to_string()
}

// ==================== Login and Gate ====================

#[tokio::test]
async fn test_login_then_protected_call_then_expired_token() {
    let app = create_test_app(false).await;

    let response = app
        .router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth",
            None,
            json!({ "email": "a@b.com", "password": "correct" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["expires_in"], TOKEN_TTL_SECS);
    let token = json["token"].as_str().unwrap().to_string();

    let response = app
        .router
        .clone()
        .oneshot(get_request("/api/posts", Some(&format!("Bearer {}", token))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Same identity, issued two hours ago
    let expired = app
        .jwt
        .generate_token_at(1, "a@b.com", "admin", Utc::now() - Duration::hours(2))
        .unwrap();
    let response = app
        .router
        .clone()
        .oneshot(get_request("/api/posts", Some(&format!("Bearer {}", expired.token))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["error"], "Invalid or expired token");
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let app = create_test_app(false).await;

    let mut bodies = Vec::new();
    for (email, password) in [("a@b.com", "wrong"), ("nobody@b.com", "correct"), ("", "")] {
        let response = app
            .router
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/auth",
                None,
                json!({ "email": email, "password": password }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        bodies.push(body_json(response).await);
    }

    assert_eq!(bodies[0]["error"], "Invalid credentials");
    assert_eq!(bodies[0], bodies[1]);
    assert_eq!(bodies[1], bodies[2]);
}

#[tokio::test]
async fn test_login_accepts_identity_field() {
    let app = create_test_app(false).await;

    let response = app
        .router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth",
            None,
            json!({ "identity": "a@b.com", "password": "correct" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_login_with_missing_field_is_bad_request() {
    let app = create_test_app(false).await;

    let response = app
        .router
        .clone()
        .oneshot(json_request("POST", "/api/auth", None, json!({ "email": "a@b.com" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/json"
    );
    let json = body_json(response).await;
    assert!(json["error"].is_string());
    assert_eq!(json["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_malformed_json_body_is_bad_request() {
    let app = create_test_app(false).await;
    let token = login(&app, "a@b.com", "correct").await;

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/posts")
                .header(header::CONTENT_TYPE, "application/json")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::from("{\"title\":"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(response).await["error"].is_string());
}

#[tokio::test]
async fn test_gate_rejections() {
    let app = create_test_app(false).await;

    for value in [None, Some("Token abc"), Some("bearer abc"), Some("Bearer ")] {
        let response = app
            .router
            .clone()
            .oneshot(get_request("/api/media", value))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "header {:?}", value);
    }

    let forged = JwtManager::new("some-other-secret")
        .generate_token(1, "a@b.com", "admin")
        .unwrap();
    for value in ["Bearer garbage".to_string(), format!("Bearer {}", forged.token)] {
        let response = app
            .router
            .clone()
            .oneshot(get_request("/api/media", Some(&value)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    // Unknown API routes are gated before routing
    let response = app
        .router
        .clone()
        .oneshot(get_request("/api/does-not-exist", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_non_api_routes_skip_the_gate() {
    let app = create_test_app(false).await;

    let response = app
        .router
        .clone()
        .oneshot(get_request("/health", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "healthy");

    let response = app
        .router
        .clone()
        .oneshot(get_request("/nothing-here", Some("Token abc")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_me_returns_current_user() {
    let app = create_test_app(false).await;
    let token = login(&app, "viewer@b.com", "viewerpass").await;

    let response = app
        .router
        .clone()
        .oneshot(get_request("/api/me", Some(&format!("Bearer {}", token))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["email"], "viewer@b.com");
    assert_eq!(json["role"], "viewer");
    assert!(json.get("password_hash").is_none());
}

// ==================== Registration ====================

#[tokio::test]
async fn test_registration_disabled_by_default() {
    let app = create_test_app(false).await;

    let response = app
        .router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/register",
            None,
            json!({ "email": "new@b.com", "password": "password123" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(app.db.get_user_by_email("new@b.com").await.unwrap().is_none());
}

#[tokio::test]
async fn test_registration_creates_author() {
    let app = create_test_app(true).await;
    let register = || {
        json_request(
            "POST",
            "/api/register",
            None,
            json!({ "email": "new@b.com", "password": "password123" }),
        )
    };

    let response = app.router.clone().oneshot(register()).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_json(response).await["role"], "author");

    let response = app.router.clone().oneshot(register()).await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app
        .router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/register",
            None,
            json!({ "email": "short@b.com", "password": "short" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    login(&app, "new@b.com", "password123").await;
}

#[tokio::test]
async fn test_registered_email_is_trimmed_for_login() {
    let app = create_test_app(true).await;

    let response = app
        .router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/register",
            None,
            json!({ "email": " padded@b.com ", "password": "password123" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_json(response).await["email"], "padded@b.com");

    login(&app, " padded@b.com ", "password123").await;
    login(&app, "padded@b.com", "password123").await;
}

// ==================== Posts ====================

#[tokio::test]
async fn test_post_lifecycle() {
    let app = create_test_app(false).await;
    let token = login(&app, "a@b.com", "correct").await;

    let response = app
        .router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/posts",
            Some(&token),
            json!({ "title": "Hello", "content": "<p>hi</p>", "categoryID": null }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    assert_eq!(created["author"], "a@b.com");
    assert_eq!(created["status"], "draft");
    let id = created["id"].as_i64().unwrap();

    let response = app
        .router
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/api/posts/{}", id),
            Some(&token),
            json!({ "title": "Hello again", "status": "published" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "published");

    let response = app
        .router
        .clone()
        .oneshot(get_request("/api/posts", Some(&format!("Bearer {}", token))))
        .await
        .unwrap();
    let list = body_json(response).await;
    assert_eq!(list[0]["title"], "Hello again");
    assert!(list[0]["createdDate"].is_string());

    let response = app
        .router
        .clone()
        .oneshot(get_request("/api/posts/status", Some(&format!("Bearer {}", token))))
        .await
        .unwrap();
    assert_eq!(body_json(response).await, json!(["published"]));

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/posts/{}", id))
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .router
        .clone()
        .oneshot(get_request(&format!("/api/posts/{}", id), Some(&format!("Bearer {}", token))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_viewer_can_read_but_not_write() {
    let app = create_test_app(false).await;
    let token = login(&app, "viewer@b.com", "viewerpass").await;

    let response = app
        .router
        .clone()
        .oneshot(get_request("/api/posts", Some(&format!("Bearer {}", token))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/posts",
            Some(&token),
            json!({ "title": "Nope" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_empty_title_is_rejected() {
    let app = create_test_app(false).await;
    let token = login(&app, "a@b.com", "correct").await;

    let response = app
        .router
        .clone()
        .oneshot(json_request("POST", "/api/posts", Some(&token), json!({ "title": "  " })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_categories() {
    let app = create_test_app(false).await;
    let token = login(&app, "a@b.com", "correct").await;

    for (name, expected) in [
        ("News", StatusCode::CREATED),
        ("News", StatusCode::CONFLICT),
        (" ", StatusCode::BAD_REQUEST),
    ] {
        let response = app
            .router
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/posts/categories",
                Some(&token),
                json!({ "name": name }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), expected, "category {:?}", name);
    }

    let response = app
        .router
        .clone()
        .oneshot(get_request("/api/posts/categories", Some(&format!("Bearer {}", token))))
        .await
        .unwrap();
    let categories = body_json(response).await;
    assert_eq!(categories.as_array().unwrap().len(), 1);
    assert_eq!(categories[0]["name"], "News");
}

// ==================== Media and Uploads ====================

#[tokio::test]
async fn test_upload_is_stored_listed_and_served() {
    let app = create_test_app(false).await;
    let token = login(&app, "a@b.com", "correct").await;

    let response = app
        .router
        .clone()
        .oneshot(multipart_request("/api/upload", &token, "file", "../cat.png", b"not-really-a-png"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let uploaded = body_json(response).await;
    assert_eq!(uploaded["success"], true);
    assert_eq!(uploaded["fileType"], "image");
    let url = uploaded["fileUrl"].as_str().unwrap().to_string();
    assert!(url.starts_with("/uploads/image/"));
    assert!(url.ends_with("-cat.png"));

    let response = app
        .router
        .clone()
        .oneshot(get_request("/api/media", Some(&format!("Bearer {}", token))))
        .await
        .unwrap();
    let media = body_json(response).await;
    assert_eq!(media[0]["url"], url);
    assert_eq!(media[0]["fileExtension"], "png");
    assert_eq!(media[0]["fileSize"], 16);
    assert_eq!(media[0]["altImage"], "");

    // Served outside the API prefix, no token needed
    let response = app
        .router
        .clone()
        .oneshot(get_request(&url, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&body[..], b"not-really-a-png");

    let id = uploaded["id"].as_i64().unwrap();
    let response = app
        .router
        .clone()
        .oneshot(json_request(
            "PUT",
            "/api/media",
            Some(&token),
            json!({ "id": id, "altImage": "A cat" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .router
        .clone()
        .oneshot(json_request("DELETE", "/api/media", Some(&token), json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .router
        .clone()
        .oneshot(json_request("DELETE", "/api/media", Some(&token), json!({ "id": id })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(app.db.list_media().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_upload_accepts_editor_field() {
    let app = create_test_app(false).await;
    let token = login(&app, "a@b.com", "correct").await;

    let response = app
        .router
        .clone()
        .oneshot(multipart_request("/api/upload", &token, "upload", "pasted.png", b"png"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let uploaded = body_json(response).await;
    let url = uploaded["url"].as_str().unwrap();
    assert!(url.starts_with("/uploads/image/"));
    assert!(url.ends_with("-pasted.png"));
    assert_eq!(uploaded["fileUrl"], uploaded["url"]);
}

#[tokio::test]
async fn test_thumbnail_upload() {
    let app = create_test_app(false).await;
    let token = login(&app, "a@b.com", "correct").await;

    let response = app
        .router
        .clone()
        .oneshot(multipart_request("/api/upload/thumbnail", &token, "upload", "thumb.jpg", b"jpg"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let url = body_json(response).await["url"].as_str().unwrap().to_string();
    assert!(url.starts_with("/uploads/thumbnail/"));
}

#[tokio::test]
async fn test_upload_without_file_is_bad_request() {
    let app = create_test_app(false).await;
    let token = login(&app, "a@b.com", "correct").await;

    let response = app
        .router
        .clone()
        .oneshot(multipart_request("/api/upload", &token, "other", "cat.png", b"x"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_upload_requires_token() {
    let app = create_test_app(false).await;

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/upload")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
