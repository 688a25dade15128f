//! Authentication middleware for Axum

use artacore_db::UserRole;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;

use crate::error::AuthError;
use crate::gate::{GateDecision, RequestGate};
use crate::jwt::Claims;

/// Authenticated user information
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthUser {
    pub id: i64,
    pub email: String,
    pub role: UserRole,
}

impl AuthUser {
    /// Create from JWT claims
    pub fn from_claims(claims: &Claims) -> Self {
        Self {
            id: claims.sub,
            email: claims.email.clone(),
            role: UserRole::from_str(&claims.role).unwrap_or(UserRole::Viewer),
        }
    }
}

/// Gate middleware
///
/// Runs [`RequestGate::authorize`] on every request. Admitted requests carry
/// both the verified [`Claims`] and an [`AuthUser`] in their extensions.
pub async fn gate_middleware(
    State(gate): State<Arc<RequestGate>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let decision = gate.authorize(request.uri().path(), request.headers());

    match decision {
        GateDecision::Bypass => {}
        GateDecision::Admit(claims) => {
            let user = AuthUser::from_claims(&claims);
            debug!("Authenticated user: {} ({})", user.email, user.role.as_str());
            request.extensions_mut().insert(claims);
            request.extensions_mut().insert(user);
        }
        GateDecision::Reject(err) => {
            let reason = match err {
                AuthError::MissingOrMalformedHeader => "unauthorized",
                _ => "forbidden",
            };
            metrics::counter!("artacore_gate_rejections_total", "reason" => reason).increment(1);
            debug!("Rejected {} {}: {}", request.method(), request.uri().path(), err);
            return Err(err);
        }
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::GateConfig;
    use crate::jwt::JwtManager;
    use axum::{
        Extension, Json, Router,
        body::Body,
        http::{Request, StatusCode},
        middleware,
        routing::{get, post},
    };
    use tower::ServiceExt;

    async fn whoami(Extension(user): Extension<AuthUser>) -> Json<AuthUser> {
        Json(user)
    }

    async fn login() -> &'static str {
        "login"
    }

    async fn health() -> &'static str {
        "ok"
    }

    fn create_test_app(jwt: Arc<JwtManager>) -> Router {
        let gate = Arc::new(RequestGate::new(jwt, GateConfig::default()));
        Router::new()
            .route("/api/me", get(whoami))
            .route("/api/auth", post(login))
            .route("/health", get(health))
            .layer(middleware::from_fn_with_state(gate, gate_middleware))
    }

    #[tokio::test]
    async fn test_valid_token_reaches_handler_with_user() {
        let jwt = Arc::new(JwtManager::new("test-secret-key"));
        let issued = jwt.generate_token(3, "a@b.com", "editor").unwrap();
        let app = create_test_app(jwt);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/me")
                    .header("Authorization", format!("Bearer {}", issued.token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let user: AuthUser = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            user,
            AuthUser {
                id: 3,
                email: "a@b.com".to_string(),
                role: UserRole::Editor,
            }
        );
    }

    #[tokio::test]
    async fn test_missing_header_returns_401_json() {
        let app = create_test_app(Arc::new(JwtManager::new("test-secret-key")));

        let response = app
            .oneshot(Request::builder().uri("/api/me").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "Unauthorized");
    }

    #[tokio::test]
    async fn test_bad_token_returns_403() {
        let app = create_test_app(Arc::new(JwtManager::new("test-secret-key")));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/me")
                    .header("Authorization", "Bearer forged")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_public_and_non_api_routes_skip_the_gate() {
        let app = create_test_app(Arc::new(JwtManager::new("test-secret-key")));

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/auth")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn test_unknown_role_maps_to_viewer() {
        let claims = Claims {
            sub: 1,
            email: "a@b.com".to_string(),
            role: "superuser".to_string(),
            iat: 0,
            exp: 1,
        };
        assert_eq!(AuthUser::from_claims(&claims).role, UserRole::Viewer);
    }
}
